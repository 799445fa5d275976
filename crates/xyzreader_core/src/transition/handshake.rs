//! Values exchanged by the open/close handshake and return reconciliation.
//!
//! # Responsibility
//! - Carry the open request from the collection to the navigator.
//! - Carry the one-shot close report back from the navigator.
//! - Decide which collection item a return transition lands on.
//!
//! # Invariants
//! - The close report is produced exactly once per navigation session.
//! - Reported ids win over reported positions; positions are only hints and
//!   are trusted only inside the collection's snapshot bounds.

use crate::dataset::snapshot::Snapshot;
use crate::error::RecoveredError;
use crate::model::article::ArticleId;
use crate::transition::anchor::{anchor_name, AnchorName};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of one navigator open/close cycle, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl SessionId {
    /// Allocates a process-unique session id.
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// "Open detail" event emitted by the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenRequest {
    pub id: ArticleId,
    /// Position in the collection's snapshot at tap time.
    pub position: usize,
    pub anchor: AnchorName,
}

/// "Closed" event emitted by the navigator.
///
/// Positions are in the navigator's own index space. `None` means the
/// navigator never resolved a position (its snapshot never arrived).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosedEvent {
    pub session: SessionId,
    pub start_position: Option<usize>,
    pub end_position: Option<usize>,
    pub start_id: ArticleId,
    pub end_id: Option<ArticleId>,
}

impl ClosedEvent {
    /// True when the navigator ended on a different article than it opened.
    pub fn swiped(&self) -> bool {
        match (self.end_id, self.start_position, self.end_position) {
            (Some(end_id), _, _) => end_id != self.start_id,
            (None, Some(start), Some(end)) => start != end,
            _ => false,
        }
    }
}

/// The collection item a detail screen was opened from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickedItem {
    pub id: ArticleId,
    /// Collection position at tap time; absent when rebuilt from a report.
    pub position: Option<usize>,
}

/// Collection item selected for a return transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnTarget {
    pub position: usize,
    pub id: ArticleId,
    pub anchor: AnchorName,
}

/// Result of reconciling a close report against the collection snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// `None` degrades the return to a non-anchored transition.
    pub target: Option<ReturnTarget>,
    /// Failures recovered on the way to `target`, in the order they were hit.
    pub recovered: Vec<RecoveredError>,
}

/// Picks the collection item the return transition should land on.
///
/// The swiped-to article wins when it is still in `snapshot`; otherwise the
/// clicked article is used; when neither is present there is no anchor.
/// Without a reported end id the end position is used as a hint, valid only
/// inside `snapshot` bounds.
pub fn reconcile_return(
    clicked: ClickedItem,
    report: &ClosedEvent,
    snapshot: &Snapshot,
) -> Reconciliation {
    let mut recovered = Vec::new();

    let swiped = match (report.end_id, report.end_position, clicked.position) {
        (Some(end_id), _, _) => end_id != clicked.id,
        (None, Some(end), Some(clicked_position)) => end != clicked_position,
        (None, Some(_), None) => report.swiped(),
        (None, None, _) => false,
    };

    if swiped {
        if let Some(end_id) = report.end_id {
            match snapshot.position_of(end_id) {
                Some(position) => return resolved(position, end_id, Vec::new()),
                None => recovered.push(RecoveredError::AnchorNotFound(end_id)),
            }
        } else if let Some(end) = report.end_position {
            match snapshot.id_at(end) {
                Some(id) => return resolved(end, id, Vec::new()),
                None => {
                    recovered.push(RecoveredError::StalePositionReport {
                        position: end,
                        len: snapshot.len(),
                    })
                }
            }
        }
    }

    match snapshot.position_of(clicked.id) {
        Some(position) => resolved(position, clicked.id, recovered),
        None => {
            recovered.push(RecoveredError::AnchorNotFound(clicked.id));
            Reconciliation {
                target: None,
                recovered,
            }
        }
    }
}

fn resolved(position: usize, id: ArticleId, recovered: Vec<RecoveredError>) -> Reconciliation {
    Reconciliation {
        target: Some(ReturnTarget {
            position,
            id,
            anchor: anchor_name(id),
        }),
        recovered,
    }
}

#[cfg(test)]
mod tests {
    use super::{reconcile_return, ClickedItem, ClosedEvent, SessionId};
    use crate::dataset::snapshot::Snapshot;
    use crate::error::RecoveredError;
    use crate::model::article::{Article, ArticleId};
    use crate::transition::anchor::anchor_name;

    fn snapshot(ids: &[i64]) -> Snapshot {
        Snapshot::new(
            ids.iter()
                .map(|id| Article::new(ArticleId(*id), format!("article {id}"), "author"))
                .collect(),
        )
        .unwrap()
    }

    fn report(start: Option<usize>, end: Option<usize>, start_id: i64, end_id: Option<i64>) -> ClosedEvent {
        ClosedEvent {
            session: SessionId(1),
            start_position: start,
            end_position: end,
            start_id: ArticleId(start_id),
            end_id: end_id.map(ArticleId),
        }
    }

    fn clicked(id: i64, position: usize) -> ClickedItem {
        ClickedItem {
            id: ArticleId(id),
            position: Some(position),
        }
    }

    #[test]
    fn swiped_id_is_resolved_through_collection_order() {
        // Collection reloaded with a new article in front: indices shifted.
        let collection = snapshot(&[9, 1, 2, 3]);
        let result = reconcile_return(
            clicked(2, 1),
            &report(Some(1), Some(2), 2, Some(3)),
            &collection,
        );

        let target = result.target.unwrap();
        assert_eq!(target.position, 3);
        assert_eq!(target.anchor, anchor_name(ArticleId(3)));
        assert!(result.recovered.is_empty());
    }

    #[test]
    fn position_hint_outside_bounds_falls_back_to_clicked() {
        let collection = snapshot(&[1, 2]);
        let result = reconcile_return(clicked(2, 1), &report(Some(1), Some(5), 2, None), &collection);

        assert_eq!(result.target.unwrap().id, ArticleId(2));
        assert_eq!(
            result.recovered,
            vec![RecoveredError::StalePositionReport { position: 5, len: 2 }]
        );
    }

    #[test]
    fn stale_hint_and_missing_clicked_article_are_both_reported() {
        let collection = snapshot(&[1]);
        let result = reconcile_return(clicked(2, 1), &report(Some(1), Some(4), 2, None), &collection);

        assert_eq!(result.target, None);
        assert_eq!(
            result.recovered,
            vec![
                RecoveredError::StalePositionReport { position: 4, len: 1 },
                RecoveredError::AnchorNotFound(ArticleId(2)),
            ]
        );
    }

    #[test]
    fn position_hint_inside_bounds_is_used_without_ids() {
        let collection = snapshot(&[1, 2, 3]);
        let result = reconcile_return(clicked(2, 1), &report(Some(1), Some(2), 2, None), &collection);
        assert_eq!(result.target.unwrap().id, ArticleId(3));
    }

    #[test]
    fn removed_swipe_target_falls_back_to_clicked() {
        let collection = snapshot(&[1, 2]);
        let result = reconcile_return(
            clicked(2, 1),
            &report(Some(1), Some(2), 2, Some(3)),
            &collection,
        );

        assert_eq!(result.target.unwrap().id, ArticleId(2));
        assert_eq!(result.recovered, vec![RecoveredError::AnchorNotFound(ArticleId(3))]);
    }

    #[test]
    fn missing_clicked_article_yields_no_target() {
        let collection = snapshot(&[1, 3]);
        let result = reconcile_return(
            clicked(2, 1),
            &report(Some(1), Some(1), 2, Some(2)),
            &collection,
        );

        assert_eq!(result.target, None);
        assert_eq!(result.recovered, vec![RecoveredError::AnchorNotFound(ArticleId(2))]);
    }

    #[test]
    fn end_position_equal_to_one_is_not_special() {
        let collection = snapshot(&[1, 2, 3]);
        let result = reconcile_return(clicked(1, 0), &report(Some(0), Some(1), 1, None), &collection);
        assert_eq!(result.target.unwrap().position, 1);
    }

    #[test]
    fn close_report_serializes_missing_positions_as_null() {
        let json = serde_json::to_value(report(Some(0), None, 4, None)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "session": 1,
                "start_position": 0,
                "end_position": null,
                "start_id": 4,
                "end_id": null,
            })
        );
    }

    #[test]
    fn report_without_positions_keeps_clicked_item() {
        let collection = snapshot(&[1, 2, 3]);
        let result = reconcile_return(clicked(3, 2), &report(None, None, 3, None), &collection);
        assert_eq!(result.target.unwrap().id, ArticleId(3));
        assert!(!report(None, None, 3, None).swiped());
    }
}
