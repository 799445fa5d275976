//! Collection (grid/list) screen controller.
//!
//! # Responsibility
//! - Emit open-detail requests keyed by stable article ids.
//! - Hold the pending return until the collection snapshot is ready.
//! - Resolve the return transition anchor against the current snapshot.
//!
//! # Invariants
//! - `resolve_return_anchor` consumes the pending return at most once.
//! - Item ids are read from the current snapshot at call time.
//! - Out-of-bounds or vanished targets degrade to no anchor; never a panic.

use crate::dataset::provider::ProviderResult;
use crate::dataset::slot::{LoadOutcome, LoadTicket, ReadySignal, Screen, SnapshotSlot};
use crate::dataset::snapshot::Snapshot;
use crate::error::{ReaderError, ReaderResult, RecoveredError};
use crate::model::article::{Article, ArticleId};
use crate::transition::anchor::{anchor_name, confirm_anchor, AnchorName, AnchorTargets};
use crate::transition::handshake::{
    reconcile_return, ClickedItem, ClosedEvent, OpenRequest, SessionId,
};
use log::{debug, info, warn};

/// Explicit collection state; replaces "is returning" / "clicked" flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionState {
    Idle,
    /// An open request was emitted; the detail screen is not shown yet.
    AwaitingOpen { clicked: ClickedItem },
    /// The detail screen is showing.
    Open { clicked: ClickedItem },
    /// The detail screen closed; reconciliation waits for a ready snapshot.
    AwaitingReturn {
        clicked: ClickedItem,
        report: ClosedEvent,
    },
}

impl CollectionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingOpen { .. } => "awaiting_open",
            Self::Open { .. } => "open",
            Self::AwaitingReturn { .. } => "awaiting_return",
        }
    }
}

/// Resolved return transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnTransition {
    /// Position to scroll to before matching the anchor.
    pub scroll_to: Option<usize>,
    /// `None` means a non-anchored (fade) return.
    pub anchor: Option<AnchorName>,
    /// Recovered failures, in the order they were hit.
    pub recovered: Vec<RecoveredError>,
}

impl ReturnTransition {
    pub fn is_anchored(&self) -> bool {
        self.anchor.is_some()
    }

    /// Drops the anchor when no materialized element carries it.
    pub fn confirm<T>(self, targets: &T) -> Self
    where
        T: AnchorTargets + ?Sized,
    {
        let Self {
            scroll_to,
            anchor,
            mut recovered,
        } = self;
        let Some(anchor) = anchor else {
            return Self {
                scroll_to,
                anchor: None,
                recovered,
            };
        };

        match confirm_anchor(anchor, targets) {
            Ok(anchor) => Self {
                scroll_to,
                anchor: Some(anchor),
                recovered,
            },
            Err(missing) => {
                warn!(
                    "event=return_anchor module=collection status=degraded reason={}",
                    missing
                );
                recovered.push(missing);
                Self {
                    scroll_to,
                    anchor: None,
                    recovered,
                }
            }
        }
    }
}

/// Outcome of `resolve_return_anchor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnResolution {
    /// No close event is pending (already resolved, or never closed).
    NotReturning,
    /// The collection snapshot is not ready; the pending return is kept.
    Pending,
    Resolved(ReturnTransition),
}

impl ReturnResolution {
    pub fn anchor(&self) -> Option<&AnchorName> {
        match self {
            Self::Resolved(transition) => transition.anchor.as_ref(),
            Self::NotReturning | Self::Pending => None,
        }
    }
}

/// Controller for the article collection screen.
#[derive(Debug)]
pub struct CollectionController {
    slot: SnapshotSlot,
    state: CollectionState,
    /// Session whose return was last resolved; redeliveries are ignored.
    last_resolved: Option<SessionId>,
}

impl Default for CollectionController {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionController {
    pub fn new() -> Self {
        Self {
            slot: SnapshotSlot::new(Screen::Collection),
            state: CollectionState::Idle,
            last_resolved: None,
        }
    }

    pub fn state(&self) -> &CollectionState {
        &self.state
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.slot.snapshot()
    }

    pub fn ready_signal(&self) -> ReadySignal {
        self.slot.ready_signal()
    }

    pub fn is_ready(&self) -> bool {
        self.slot.is_ready()
    }

    pub fn item_count(&self) -> usize {
        self.slot.snapshot().map_or(0, Snapshot::len)
    }

    pub fn article_at(&self, position: usize) -> Option<&Article> {
        self.slot.snapshot()?.get(position)
    }

    /// Stable id of the item at `position` in the current snapshot.
    pub fn resolve_item_id(&self, position: usize) -> Option<ArticleId> {
        self.slot.snapshot()?.id_at(position)
    }

    /// Anchor name an item at `position` must carry when bound on screen.
    pub fn item_anchor(&self, position: usize) -> Option<AnchorName> {
        self.resolve_item_id(position).map(anchor_name)
    }

    /// Starts a collection reload.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.slot.begin_load()
    }

    /// Feeds a load completion.
    ///
    /// # Errors
    /// - `SnapshotLoadFailed` when the current load failed; surface a retry UI.
    pub fn on_load_finished(
        &mut self,
        ticket: LoadTicket,
        result: ProviderResult<Snapshot>,
    ) -> ReaderResult<LoadOutcome> {
        self.slot.complete(ticket, result)
    }

    /// Handles a tap on the item at `position`.
    ///
    /// # Errors
    /// - `NotReady` before the first snapshot is installed.
    /// - `PositionOutOfBounds` when `position` is outside the snapshot.
    /// - `InvalidState` while a detail screen is open or returning.
    pub fn on_item_activated(&mut self, position: usize) -> ReaderResult<OpenRequest> {
        self.ensure_alive()?;
        match self.state {
            CollectionState::Idle | CollectionState::AwaitingOpen { .. } => {}
            _ => {
                return Err(ReaderError::InvalidState {
                    operation: "on_item_activated",
                    state: self.state.name(),
                })
            }
        }

        let snapshot = self
            .slot
            .snapshot()
            .ok_or(ReaderError::NotReady(Screen::Collection))?;
        let id = snapshot
            .id_at(position)
            .ok_or(ReaderError::PositionOutOfBounds {
                screen: Screen::Collection,
                position,
                len: snapshot.len(),
            })?;

        self.state = CollectionState::AwaitingOpen {
            clicked: ClickedItem {
                id,
                position: Some(position),
            },
        };
        info!(
            "event=item_activated module=collection status=ok position={} article_id={}",
            position, id
        );
        Ok(OpenRequest {
            id,
            position,
            anchor: anchor_name(id),
        })
    }

    /// Marks the detail screen as shown.
    pub fn on_detail_opened(&mut self) -> ReaderResult<()> {
        self.ensure_alive()?;
        match self.state {
            CollectionState::AwaitingOpen { clicked } => {
                self.state = CollectionState::Open { clicked };
                Ok(())
            }
            _ => Err(ReaderError::InvalidState {
                operation: "on_detail_opened",
                state: self.state.name(),
            }),
        }
    }

    /// Records the navigator's close report; reconciliation is deferred to
    /// `resolve_return_anchor`.
    ///
    /// When no click is recorded (the collection was recreated while the
    /// detail screen was showing) the reported start item stands in for it.
    /// A report for a session that is already pending or resolved is ignored.
    pub fn on_detail_closed(&mut self, report: ClosedEvent) -> ReaderResult<()> {
        self.ensure_alive()?;
        let pending = match &self.state {
            CollectionState::AwaitingReturn { report: pending, .. } => Some(pending.session),
            _ => None,
        };
        if self.last_resolved == Some(report.session) || pending == Some(report.session) {
            warn!(
                "event=detail_closed module=collection status=duplicate session={}",
                report.session
            );
            return Ok(());
        }

        let clicked = match &self.state {
            CollectionState::AwaitingOpen { clicked } | CollectionState::Open { clicked } => {
                *clicked
            }
            CollectionState::AwaitingReturn { clicked, report: previous } => {
                warn!(
                    "event=detail_closed module=collection status=replaced previous_session={} session={}",
                    previous.session, report.session
                );
                *clicked
            }
            CollectionState::Idle => ClickedItem {
                id: report.start_id,
                position: report.start_position,
            },
        };

        info!(
            "event=detail_closed module=collection status=ok session={} start_position={:?} end_position={:?}",
            report.session, report.start_position, report.end_position
        );
        self.state = CollectionState::AwaitingReturn { clicked, report };
        Ok(())
    }

    /// Resolves the return transition anchor.
    ///
    /// Returns `Pending` without consuming anything while the collection
    /// snapshot is missing or reloading. Once resolved, later calls return
    /// `NotReturning` until the next close report.
    pub fn resolve_return_anchor(&mut self) -> ReturnResolution {
        if self.slot.is_torn_down() {
            return ReturnResolution::NotReturning;
        }
        let CollectionState::AwaitingReturn { clicked, report } = &self.state else {
            debug!(
                "event=return_anchor module=collection status=skipped state={}",
                self.state.name()
            );
            return ReturnResolution::NotReturning;
        };
        let Some(snapshot) = self.slot.snapshot().filter(|_| self.slot.is_ready()) else {
            debug!("event=return_anchor module=collection status=pending");
            return ReturnResolution::Pending;
        };

        let reconciled = reconcile_return(*clicked, report, snapshot);
        for recovered in &reconciled.recovered {
            warn!(
                "event=return_anchor module=collection status=recovered session={} reason={}",
                report.session, recovered
            );
        }
        let transition = match reconciled.target {
            Some(target) => {
                info!(
                    "event=return_anchor module=collection status=ok session={} position={} anchor={}",
                    report.session, target.position, target.anchor
                );
                ReturnTransition {
                    scroll_to: Some(target.position),
                    anchor: Some(target.anchor),
                    recovered: reconciled.recovered,
                }
            }
            None => {
                info!(
                    "event=return_anchor module=collection status=unanchored session={}",
                    report.session
                );
                ReturnTransition {
                    scroll_to: None,
                    anchor: None,
                    recovered: reconciled.recovered,
                }
            }
        };

        self.last_resolved = Some(report.session);
        self.state = CollectionState::Idle;
        ReturnResolution::Resolved(transition)
    }

    /// Tears the screen down; pending loads and returns become no-ops.
    pub fn tear_down(&mut self) {
        self.slot.tear_down();
        self.state = CollectionState::Idle;
    }

    fn ensure_alive(&self) -> ReaderResult<()> {
        if self.slot.is_torn_down() {
            return Err(ReaderError::ControllerTornDown(Screen::Collection));
        }
        Ok(())
    }
}
