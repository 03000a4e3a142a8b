//! Reconnecting change streams.

use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::watch::watch;
use crate::database::{DatabaseRef, QueryOption};
use crate::sse::{Event, EventType};

/// Tuning for [`listen_with_config`].
#[derive(Debug, Clone, Default)]
pub struct ListenConfig {
    /// Pause between a session ending and the next one starting
    /// (default: none).
    pub reconnect_delay: Duration,
}

impl ListenConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

/// Keep a change stream open across disconnects, forwarding wanted events.
///
/// Events whose type is not in `wanted` are dropped. Terminal events are
/// never forwarded: when a session ends a new one is started and the
/// consumer sees an uninterrupted stream. The channel closes when `cancel`
/// fires, when the receiver is dropped, or when any connection attempt
/// fails outright (transport error or rejected request).
pub fn listen(
    db: DatabaseRef,
    cancel: CancellationToken,
    wanted: impl IntoIterator<Item = EventType>,
    options: Vec<QueryOption>,
) -> mpsc::Receiver<Event> {
    listen_with_config(db, cancel, wanted, options, ListenConfig::default())
}

/// [`listen`] with explicit reconnect tuning.
pub fn listen_with_config(
    db: DatabaseRef,
    cancel: CancellationToken,
    wanted: impl IntoIterator<Item = EventType>,
    options: Vec<QueryOption>,
    config: ListenConfig,
) -> mpsc::Receiver<Event> {
    let (tx, rx) = mpsc::channel(db.watch_buffer_len());
    let supervisor = Supervisor {
        db,
        cancel,
        wanted: wanted.into_iter().collect(),
        options,
        config,
        tx,
    };
    tokio::spawn(supervisor.run());
    rx
}

struct Supervisor {
    db: DatabaseRef,
    cancel: CancellationToken,
    wanted: HashSet<EventType>,
    options: Vec<QueryOption>,
    config: ListenConfig,
    tx: mpsc::Sender<Event>,
}

impl Supervisor {
    async fn run(self) {
        let mut sessions: u64 = 0;

        loop {
            // Dropped at the end of each pass, which stops that session.
            let session = self.cancel.child_token();
            let _guard = session.clone().drop_guard();

            let established = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = self.tx.closed() => break,
                result = watch(&self.db, session, &self.options) => result,
            };

            match established {
                Ok(events) => {
                    sessions += 1;
                    if sessions > 1 {
                        info!("Listen reconnected (session {})", sessions);
                    }
                    if !self.forward(events).await {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Listen could not connect after {} sessions: {}", sessions, e);
                    break;
                }
            }

            if !self.pause().await {
                break;
            }
        }

        debug!("Listen stopped after {} sessions", sessions);
    }

    /// Relay one session. Returns false once listening should stop.
    async fn forward(&self, mut events: mpsc::Receiver<Event>) -> bool {
        loop {
            let event = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return false,
                _ = self.tx.closed() => return false,
                event = events.recv() => event,
            };

            match event {
                None => return true,
                Some(event) if event.is_terminal() => {
                    debug!("Listen session ended: {}", event);
                }
                Some(event) if self.wanted.contains(&event.event_type) => {
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return false,
                        sent = self.tx.send(event) => {
                            if sent.is_err() {
                                return false;
                            }
                        }
                    }
                }
                Some(_) => {}
            }
        }
    }

    /// Wait out the reconnect delay. Returns false if cancelled meanwhile.
    async fn pause(&self) -> bool {
        if self.config.reconnect_delay.is_zero() {
            tokio::task::yield_now().await;
            return !self.cancel.is_cancelled();
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(self.config.reconnect_delay) => true,
        }
    }
}
