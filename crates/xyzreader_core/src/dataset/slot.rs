//! Per-screen snapshot ownership, load tickets and ready signals.
//!
//! # Responsibility
//! - Hold one screen's private snapshot reference.
//! - Match load completions to the load that produced them.
//! - Publish a deterministic "snapshot ready" signal per screen.
//!
//! # Invariants
//! - Only the most recent ticket of a slot may install a snapshot.
//! - Completions arriving after `tear_down` are no-ops.
//! - The slot is ready only when a snapshot is installed and no load is in
//!   flight.

use crate::dataset::provider::ProviderResult;
use crate::dataset::snapshot::Snapshot;
use crate::error::{ReaderError, ReaderResult};
use log::{debug, info, warn};
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tokio::sync::watch;

/// The two reader screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Collection,
    Navigator,
}

impl Screen {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Navigator => "navigator",
        }
    }
}

impl Display for Screen {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle of one in-flight load on one screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    screen: Screen,
    generation: u64,
}

impl LoadTicket {
    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Published readiness of one screen's snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Unloaded,
    Loading,
    Ready { generation: u64 },
    TornDown,
}

/// Outcome of feeding a successful or ignored completion into a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The completion installed a new snapshot.
    Installed { generation: u64 },
    /// A newer load was started after this ticket; the result was dropped.
    Superseded,
    /// The screen was torn down; the result was dropped.
    Discarded,
}

/// Receiver side of a screen's ready signal.
#[derive(Debug, Clone)]
pub struct ReadySignal {
    screen: Screen,
    rx: watch::Receiver<Readiness>,
}

impl ReadySignal {
    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn current(&self) -> Readiness {
        *self.rx.borrow()
    }

    /// Waits until the screen's snapshot is ready, bounded by `timeout`.
    ///
    /// Returns the ready snapshot generation. Resolves immediately when the
    /// screen is already ready.
    ///
    /// # Errors
    /// - `ReadyTimeout` when the bound expires first.
    /// - `ControllerTornDown` when the screen is torn down or dropped.
    pub async fn wait(&mut self, timeout: Duration) -> ReaderResult<u64> {
        let screen = self.screen;
        let waited = tokio::time::timeout(
            timeout,
            self.rx
                .wait_for(|readiness| matches!(readiness, Readiness::Ready { .. } | Readiness::TornDown)),
        )
        .await;

        match waited {
            Ok(Ok(readiness)) => match *readiness {
                Readiness::Ready { generation } => Ok(generation),
                _ => Err(ReaderError::ControllerTornDown(screen)),
            },
            Ok(Err(_)) => Err(ReaderError::ControllerTornDown(screen)),
            Err(_) => Err(ReaderError::ReadyTimeout {
                screen,
                after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

/// One screen's private snapshot reference and load bookkeeping.
#[derive(Debug)]
pub struct SnapshotSlot {
    screen: Screen,
    current: Option<(u64, Snapshot)>,
    next_generation: u64,
    in_flight: Option<LoadTicket>,
    torn_down: bool,
    readiness: watch::Sender<Readiness>,
}

impl SnapshotSlot {
    pub fn new(screen: Screen) -> Self {
        let (readiness, _) = watch::channel(Readiness::Unloaded);
        Self {
            screen,
            current: None,
            next_generation: 1,
            in_flight: None,
            torn_down: false,
            readiness,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Starts a load; any earlier in-flight ticket becomes superseded.
    pub fn begin_load(&mut self) -> LoadTicket {
        let ticket = LoadTicket {
            screen: self.screen,
            generation: self.next_generation,
        };
        self.next_generation += 1;

        if self.torn_down {
            debug!(
                "event=snapshot_load module=dataset status=skipped screen={} generation={} reason=torn_down",
                self.screen, ticket.generation
            );
            return ticket;
        }

        if let Some(previous) = self.in_flight.replace(ticket) {
            debug!(
                "event=snapshot_load module=dataset status=superseded screen={} generation={}",
                self.screen, previous.generation
            );
        }
        self.publish(Readiness::Loading);
        debug!(
            "event=snapshot_load module=dataset status=start screen={} generation={}",
            self.screen, ticket.generation
        );
        ticket
    }

    /// Feeds one load completion into the slot.
    ///
    /// # Errors
    /// - `SnapshotLoadFailed` when the current ticket's load failed. The
    ///   previous snapshot, if any, stays installed.
    pub fn complete(
        &mut self,
        ticket: LoadTicket,
        result: ProviderResult<Snapshot>,
    ) -> ReaderResult<LoadOutcome> {
        if self.torn_down {
            debug!(
                "event=snapshot_load module=dataset status=discarded screen={} generation={}",
                self.screen, ticket.generation
            );
            return Ok(LoadOutcome::Discarded);
        }
        if self.in_flight != Some(ticket) {
            debug!(
                "event=snapshot_load module=dataset status=stale screen={} generation={}",
                self.screen, ticket.generation
            );
            return Ok(LoadOutcome::Superseded);
        }
        self.in_flight = None;

        match result {
            Ok(snapshot) => {
                info!(
                    "event=snapshot_load module=dataset status=ok screen={} generation={} count={}",
                    self.screen,
                    ticket.generation,
                    snapshot.len()
                );
                self.current = Some((ticket.generation, snapshot));
                self.publish(Readiness::Ready {
                    generation: ticket.generation,
                });
                Ok(LoadOutcome::Installed {
                    generation: ticket.generation,
                })
            }
            Err(err) => {
                warn!(
                    "event=snapshot_load module=dataset status=error screen={} generation={} error={}",
                    self.screen, ticket.generation, err
                );
                let fallback = match &self.current {
                    Some((generation, _)) => Readiness::Ready {
                        generation: *generation,
                    },
                    None => Readiness::Unloaded,
                };
                self.publish(fallback);
                Err(ReaderError::SnapshotLoadFailed {
                    screen: self.screen,
                    source: err,
                })
            }
        }
    }

    /// Currently installed snapshot, even while a newer load is in flight.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.current.as_ref().map(|(_, snapshot)| snapshot)
    }

    pub fn generation(&self) -> Option<u64> {
        self.current.as_ref().map(|(generation, _)| *generation)
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// True when a snapshot is installed and no newer load is pending.
    pub fn is_ready(&self) -> bool {
        !self.torn_down && self.current.is_some() && self.in_flight.is_none()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn ready_signal(&self) -> ReadySignal {
        ReadySignal {
            screen: self.screen,
            rx: self.readiness.subscribe(),
        }
    }

    /// Drops the snapshot and makes every later completion a no-op.
    pub fn tear_down(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.in_flight = None;
        self.current = None;
        self.publish(Readiness::TornDown);
        info!(
            "event=screen_teardown module=dataset status=ok screen={}",
            self.screen
        );
    }

    fn publish(&self, readiness: Readiness) {
        self.readiness.send_replace(readiness);
    }
}
