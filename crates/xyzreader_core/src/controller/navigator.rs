//! Detail pager (navigator) screen controller.
//!
//! # Responsibility
//! - Open a navigation session on a stable article id, deferring until the
//!   navigator's own snapshot is loaded.
//! - Track the current page across swipes and reloads.
//! - Emit the one-shot close report and the exit anchor mapping.
//!
//! # Invariants
//! - State moves `Closed -> Opening -> Open -> Closing -> Closed`; closing
//!   never skips `Closing`.
//! - Exactly one `ClosedEvent` is produced per session; a repeated close is
//!   reported as `DoubleClose`.
//! - The pager never shows a page for the wrong article while opening.
//! - A page the user did not choose (a reload displaced the viewed article)
//!   is never reported as a swipe target.
//! - Article positions are resolved through the dataset provider's
//!   `find_index` when one is attached.

use crate::dataset::provider::{DatasetProvider, ProviderResult};
use crate::dataset::slot::{LoadOutcome, LoadTicket, ReadySignal, Screen, SnapshotSlot};
use crate::dataset::snapshot::Snapshot;
use crate::error::{ReaderError, ReaderResult, RecoveredError};
use crate::model::article::{Article, ArticleId};
use crate::transition::anchor::{anchor_name, confirm_anchor, AnchorName, AnchorTargets};
use crate::transition::handshake::{ClosedEvent, SessionId};
use log::{debug, error, info, warn};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// State of one open/close cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationSession {
    pub id: SessionId,
    pub start_id: ArticleId,
    /// Start index in the navigator's snapshot; `None` until resolved.
    pub start_position: Option<usize>,
    pub current_position: Option<usize>,
    /// Article on the page currently shown.
    pub current_id: Option<ArticleId>,
    /// Article the user last chose to view: the start article or a swipe
    /// target. Differs from `current_id` only after a reload displaced it.
    pub viewed_id: Option<ArticleId>,
}

impl NavigationSession {
    fn new(id: SessionId, start_id: ArticleId) -> Self {
        Self {
            id,
            start_id,
            start_position: None,
            current_position: None,
            current_id: None,
            viewed_id: None,
        }
    }

    /// True when a reload replaced the viewed article with another page.
    pub fn is_displaced(&self) -> bool {
        self.current_id != self.viewed_id
    }

    fn closed_event(&self) -> ClosedEvent {
        let (end_position, end_id) = if self.is_displaced() {
            (None, None)
        } else {
            (self.current_position, self.current_id)
        };
        ClosedEvent {
            session: self.id,
            start_position: self.start_position,
            end_position,
            start_id: self.start_id,
            end_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigatorState {
    Closed,
    /// Session created; waiting for the navigator snapshot.
    Opening(NavigationSession),
    /// Tracking the current page.
    Open(NavigationSession),
    /// Close report emitted; waiting for the exit anchor mapping.
    Closing(NavigationSession),
}

impl NavigatorState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Opening(_) => "opening",
            Self::Open(_) => "open",
            Self::Closing(_) => "closing",
        }
    }

    pub fn session(&self) -> Option<&NavigationSession> {
        match self {
            Self::Closed => None,
            Self::Opening(session) | Self::Open(session) | Self::Closing(session) => Some(session),
        }
    }
}

/// What the pager should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerState {
    /// No session.
    Hidden,
    /// Session open but the snapshot is not there yet; render a placeholder.
    Loading,
    Showing {
        position: usize,
        id: ArticleId,
        count: usize,
    },
    /// The snapshot emptied under an open session.
    Empty,
}

/// Effect of an `open` call or a load completion on the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigatorUpdate {
    /// Nothing changed for the session.
    Unchanged,
    /// Open is deferred until the navigator snapshot loads.
    AwaitingSnapshot,
    /// The session resolved its start article and is showing it.
    Opened { position: usize, anchor: AnchorName },
    /// A reload moved the current page. `displaced` is set when the viewed
    /// article vanished and another page is shown in its place.
    Reanchored {
        position: Option<usize>,
        displaced: bool,
    },
    /// The start article is absent; the session moved to `Closing` with this
    /// report. `resolve_exit_anchor` finishes it.
    Aborted(ClosedEvent),
}

/// Exit-side anchor mapping for the return transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitMapping {
    /// Anchor carried by the page being left; `None` means fade.
    pub anchor: Option<AnchorName>,
    /// Enter anchor replaced by `anchor` after a swipe.
    pub replaces: Option<AnchorName>,
    pub recovered: Option<RecoveredError>,
}

impl ExitMapping {
    /// Drops the anchor when the current page has no element carrying it.
    pub fn confirm<T>(self, targets: &T) -> Self
    where
        T: AnchorTargets + ?Sized,
    {
        let Self {
            anchor,
            replaces,
            recovered,
        } = self;
        let Some(anchor) = anchor else {
            return Self {
                anchor: None,
                replaces,
                recovered,
            };
        };

        match confirm_anchor(anchor, targets) {
            Ok(anchor) => Self {
                anchor: Some(anchor),
                replaces,
                recovered,
            },
            Err(missing) => {
                warn!(
                    "event=exit_anchor module=navigator status=degraded reason={}",
                    missing
                );
                Self {
                    anchor: None,
                    replaces: None,
                    recovered: Some(missing),
                }
            }
        }
    }
}

/// Controller for the swipeable detail screen.
pub struct NavigatorController {
    slot: SnapshotSlot,
    state: NavigatorState,
    last_closed: Option<SessionId>,
    index: Option<Arc<dyn DatasetProvider>>,
}

impl Debug for NavigatorController {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigatorController")
            .field("slot", &self.slot)
            .field("state", &self.state)
            .field("last_closed", &self.last_closed)
            .field("provider_index", &self.index.is_some())
            .finish()
    }
}

impl Default for NavigatorController {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigatorController {
    /// Navigator resolving positions directly against its snapshots.
    pub fn new() -> Self {
        Self {
            slot: SnapshotSlot::new(Screen::Navigator),
            state: NavigatorState::Closed,
            last_closed: None,
            index: None,
        }
    }

    /// Navigator resolving start and reanchor positions through
    /// `provider.find_index`.
    pub fn with_provider(provider: Arc<dyn DatasetProvider>) -> Self {
        Self {
            index: Some(provider),
            ..Self::new()
        }
    }

    pub fn state(&self) -> &NavigatorState {
        &self.state
    }

    pub fn session(&self) -> Option<&NavigationSession> {
        self.state.session()
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.slot.snapshot()
    }

    pub fn ready_signal(&self) -> ReadySignal {
        self.slot.ready_signal()
    }

    /// Number of pages; zero until the snapshot is installed.
    pub fn page_count(&self) -> usize {
        self.slot.snapshot().map_or(0, Snapshot::len)
    }

    pub fn article_at(&self, position: usize) -> Option<&Article> {
        self.slot.snapshot()?.get(position)
    }

    pub fn pager(&self) -> PagerState {
        match &self.state {
            NavigatorState::Closed => PagerState::Hidden,
            NavigatorState::Opening(_) => PagerState::Loading,
            NavigatorState::Open(session) | NavigatorState::Closing(session) => {
                match (session.current_position, session.current_id) {
                    (Some(position), Some(id)) => PagerState::Showing {
                        position,
                        id,
                        count: self.page_count(),
                    },
                    _ => PagerState::Empty,
                }
            }
        }
    }

    /// Report of the session in `Closing`, exactly as it was emitted by
    /// `close` or by an aborted open.
    pub fn closing_report(&self) -> Option<ClosedEvent> {
        match &self.state {
            NavigatorState::Closing(session) => Some(session.closed_event()),
            _ => None,
        }
    }

    /// Starts a navigator reload.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.slot.begin_load()
    }

    /// Feeds a load completion and advances a deferred open.
    ///
    /// # Errors
    /// - `SnapshotLoadFailed` when the current load failed. When an earlier
    ///   snapshot stays installed, an opening session is first resolved
    ///   against it (check `state()`; an abort leaves its report in
    ///   `closing_report()`). Without one the session stays in `Opening`.
    pub fn on_load_finished(
        &mut self,
        ticket: LoadTicket,
        result: ProviderResult<Snapshot>,
    ) -> ReaderResult<NavigatorUpdate> {
        match self.slot.complete(ticket, result) {
            Ok(LoadOutcome::Installed { .. }) => Ok(self.apply_snapshot()),
            Ok(LoadOutcome::Superseded | LoadOutcome::Discarded) => Ok(NavigatorUpdate::Unchanged),
            Err(err) => {
                if matches!(self.state, NavigatorState::Opening(_)) && self.slot.is_ready() {
                    let update = self.apply_snapshot();
                    warn!(
                        "event=navigator_open module=navigator status=fallback state={} update={:?}",
                        self.state.name(),
                        update
                    );
                }
                Err(err)
            }
        }
    }

    /// Opens a session on `start_id`.
    ///
    /// Resolves immediately when the navigator snapshot is ready, otherwise
    /// returns `AwaitingSnapshot` and resolves on the next installed load.
    pub fn open(&mut self, start_id: ArticleId) -> ReaderResult<NavigatorUpdate> {
        if self.slot.is_torn_down() {
            return Err(ReaderError::ControllerTornDown(Screen::Navigator));
        }
        if !matches!(self.state, NavigatorState::Closed) {
            return Err(ReaderError::InvalidState {
                operation: "open",
                state: self.state.name(),
            });
        }

        let session_id = SessionId::next();
        self.state = NavigatorState::Opening(NavigationSession::new(session_id, start_id));
        info!(
            "event=navigator_open module=navigator status=start session={} start_id={}",
            session_id, start_id
        );

        if self.slot.is_ready() {
            Ok(self.apply_snapshot())
        } else {
            debug!(
                "event=navigator_open module=navigator status=deferred session={}",
                session_id
            );
            Ok(NavigatorUpdate::AwaitingSnapshot)
        }
    }

    /// Records a swipe to `new_position`.
    pub fn on_page_changed(&mut self, new_position: usize) -> ReaderResult<()> {
        let len = self.page_count();
        let id = self.slot.snapshot().and_then(|snapshot| snapshot.id_at(new_position));
        let state_name = self.state.name();
        let NavigatorState::Open(session) = &mut self.state else {
            return Err(ReaderError::InvalidState {
                operation: "on_page_changed",
                state: state_name,
            });
        };
        let Some(id) = id else {
            return Err(ReaderError::PositionOutOfBounds {
                screen: Screen::Navigator,
                position: new_position,
                len,
            });
        };

        session.current_position = Some(new_position);
        session.current_id = Some(id);
        session.viewed_id = Some(id);
        debug!(
            "event=page_changed module=navigator status=ok session={} position={} article_id={}",
            session.id, new_position, id
        );
        Ok(())
    }

    /// Emits the close report and moves to `Closing`.
    ///
    /// # Errors
    /// - `DoubleClose` when the session already reported; nothing is emitted.
    /// - `InvalidState` when no session was ever opened.
    pub fn close(&mut self) -> ReaderResult<ClosedEvent> {
        let state = std::mem::replace(&mut self.state, NavigatorState::Closed);
        match state {
            NavigatorState::Opening(session) | NavigatorState::Open(session) => {
                let event = session.closed_event();
                info!(
                    "event=navigator_close module=navigator status=ok session={} start_position={:?} end_position={:?} displaced={}",
                    session.id,
                    event.start_position,
                    event.end_position,
                    session.is_displaced()
                );
                self.state = NavigatorState::Closing(session);
                Ok(event)
            }
            NavigatorState::Closing(session) => {
                let session_id = session.id;
                self.state = NavigatorState::Closing(session);
                Err(self.double_close(session_id))
            }
            NavigatorState::Closed => match self.last_closed {
                Some(session_id) => Err(self.double_close(session_id)),
                None => Err(ReaderError::InvalidState {
                    operation: "close",
                    state: NavigatorState::Closed.name(),
                }),
            },
        }
    }

    /// Anchor for the entering page; identical to the collection's anchor for
    /// the same article.
    pub fn resolve_enter_anchor(&self, target_id: ArticleId) -> AnchorName {
        if let Some(session) = self.session() {
            if session.start_id != target_id {
                warn!(
                    "event=enter_anchor module=navigator status=mismatch session={} start_id={} target_id={}",
                    session.id, session.start_id, target_id
                );
            }
        }
        anchor_name(target_id)
    }

    /// Anchor for the page being left.
    ///
    /// In `Open` this only reads state. In `Closing` it finishes the session
    /// and moves to `Closed`.
    pub fn resolve_exit_anchor(&mut self) -> ReaderResult<ExitMapping> {
        let mapping = match &self.state {
            NavigatorState::Open(session) | NavigatorState::Closing(session) => {
                self.exit_mapping(session)
            }
            other => {
                return Err(ReaderError::InvalidState {
                    operation: "resolve_exit_anchor",
                    state: other.name(),
                })
            }
        };

        if let NavigatorState::Closing(session) = &self.state {
            let session_id = session.id;
            self.finish(session_id);
        }
        Ok(mapping)
    }

    /// Tears the screen down; an open session is dropped without a report.
    pub fn tear_down(&mut self) {
        if let Some(session) = self.state.session() {
            warn!(
                "event=navigator_teardown module=navigator status=dropped session={} state={}",
                session.id,
                self.state.name()
            );
        }
        self.slot.tear_down();
        self.state = NavigatorState::Closed;
    }

    fn exit_mapping(&self, session: &NavigationSession) -> ExitMapping {
        let start_anchor = anchor_name(session.start_id);
        let viewed = session.viewed_id.unwrap_or(session.start_id);
        let current = session.current_position.and_then(|position| {
            self.slot
                .snapshot()
                .and_then(|snapshot| snapshot.id_at(position))
        });

        match current {
            Some(id) if id == viewed => {
                let anchor = anchor_name(id);
                let replaces = (anchor != start_anchor).then_some(start_anchor);
                info!(
                    "event=exit_anchor module=navigator status=ok session={} anchor={} swiped={}",
                    session.id,
                    anchor,
                    replaces.is_some()
                );
                ExitMapping {
                    anchor: Some(anchor),
                    replaces,
                    recovered: None,
                }
            }
            _ => {
                warn!(
                    "event=exit_anchor module=navigator status=unanchored session={} article_id={}",
                    session.id, viewed
                );
                ExitMapping {
                    anchor: None,
                    replaces: None,
                    recovered: Some(RecoveredError::AnchorNotFound(viewed)),
                }
            }
        }
    }

    /// Re-resolves the session against the installed snapshot.
    fn apply_snapshot(&mut self) -> NavigatorUpdate {
        let Some(snapshot) = self.slot.snapshot() else {
            return NavigatorUpdate::Unchanged;
        };
        let index = self.index.as_deref();

        match &mut self.state {
            NavigatorState::Opening(session) => match locate(index, snapshot, session.start_id) {
                Some(position) => {
                    session.start_position = Some(position);
                    session.current_position = Some(position);
                    session.current_id = Some(session.start_id);
                    session.viewed_id = Some(session.start_id);
                    let anchor = anchor_name(session.start_id);
                    info!(
                        "event=navigator_open module=navigator status=ok session={} position={} anchor={}",
                        session.id, position, anchor
                    );
                    let opened = session.clone();
                    self.state = NavigatorState::Open(opened);
                    NavigatorUpdate::Opened { position, anchor }
                }
                None => {
                    let event = session.closed_event();
                    warn!(
                        "event=navigator_open module=navigator status=aborted session={} reason={}",
                        session.id,
                        RecoveredError::AnchorNotFound(session.start_id)
                    );
                    let aborted = session.clone();
                    self.state = NavigatorState::Closing(aborted);
                    NavigatorUpdate::Aborted(event)
                }
            },
            NavigatorState::Open(session) => {
                let previous = session.current_position;
                let start_id = session.start_id;
                let viewed_id = session.viewed_id;
                let current_id = session.current_id;

                // Viewed article first, then the start article, then the page
                // already shown, then the nearest valid page.
                let located = viewed_id
                    .and_then(|id| locate(index, snapshot, id).map(|position| (position, viewed_id)))
                    .or_else(|| {
                        locate(index, snapshot, start_id).map(|position| (position, Some(start_id)))
                    })
                    .or_else(|| {
                        current_id.and_then(|id| {
                            locate(index, snapshot, id).map(|position| (position, viewed_id))
                        })
                    })
                    .or_else(|| {
                        previous
                            .and_then(|position| {
                                snapshot.len().checked_sub(1).map(|last| position.min(last))
                            })
                            .map(|position| (position, viewed_id))
                    });
                let (position, viewed_id) = match located {
                    Some((position, viewed)) => (Some(position), viewed),
                    None => (None, viewed_id),
                };

                session.start_position = locate(index, snapshot, start_id);
                session.current_position = position;
                session.current_id = position.and_then(|position| snapshot.id_at(position));
                session.viewed_id = viewed_id;
                let displaced = session.is_displaced();
                if displaced {
                    warn!(
                        "event=navigator_reanchor module=navigator status=displaced session={} viewed_id={:?} shown_id={:?}",
                        session.id, session.viewed_id, session.current_id
                    );
                } else if position != previous {
                    info!(
                        "event=navigator_reanchor module=navigator status=ok session={} from={:?} to={:?}",
                        session.id, previous, position
                    );
                }
                NavigatorUpdate::Reanchored {
                    position,
                    displaced,
                }
            }
            NavigatorState::Closed | NavigatorState::Closing(_) => NavigatorUpdate::Unchanged,
        }
    }

    fn finish(&mut self, session_id: SessionId) {
        self.state = NavigatorState::Closed;
        self.last_closed = Some(session_id);
        debug!(
            "event=navigator_finish module=navigator status=ok session={}",
            session_id
        );
    }

    fn double_close(&self, session_id: SessionId) -> ReaderError {
        error!(
            "event=navigator_close module=navigator status=error error_code=double_close session={}",
            session_id
        );
        ReaderError::DoubleClose(session_id)
    }
}

/// Position of `id`, through the provider's index when one is attached.
///
/// A provider answer pointing at another article is discarded.
fn locate(
    index: Option<&dyn DatasetProvider>,
    snapshot: &Snapshot,
    id: ArticleId,
) -> Option<usize> {
    let position = match index {
        Some(provider) => provider.find_index(snapshot, id),
        None => snapshot.position_of(id),
    };
    position.filter(|position| snapshot.id_at(*position) == Some(id))
}
