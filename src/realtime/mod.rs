//! Realtime change streams.
//!
//! - [`watch`]: one streaming connection, ending with a terminal event
//! - [`listen`]: a supervisor that re-watches whenever a session ends
//!
//! Both are also available as methods on [`DatabaseRef`].
//!
//! # Example
//!
//! ```ignore
//! use firebase_rtdb::sse::EventType;
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let mut events = db.child("rooms/lobby").listen(cancel.clone(), [EventType::Put, EventType::Patch], vec![]);
//! while let Some(event) = events.recv().await {
//!     let change = event.payload()?;
//!     println!("{} changed: {}", change.path, change.data);
//! }
//! ```

mod listen;
mod watch;

pub use listen::{listen, listen_with_config, ListenConfig};
pub use watch::watch;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::database::{DatabaseRef, QueryOption};
use crate::error::FirebaseResult;
use crate::sse::{Event, EventType};

impl DatabaseRef {
    /// See [`watch`].
    pub async fn watch(
        &self,
        cancel: CancellationToken,
        options: &[QueryOption],
    ) -> FirebaseResult<mpsc::Receiver<Event>> {
        watch(self, cancel, options).await
    }

    /// See [`listen`].
    pub fn listen(
        &self,
        cancel: CancellationToken,
        wanted: impl IntoIterator<Item = EventType>,
        options: Vec<QueryOption>,
    ) -> mpsc::Receiver<Event> {
        listen(self.clone(), cancel, wanted, options)
    }
}
