//! Server-sent event parsing for the database change stream.
//!
//! The database streams changes as strict three-line frames:
//!
//! ```text
//! event: <event-type>
//! data: <json-or-text-payload>
//!
//! ```
//!
//! # Module structure
//! - `events` - Event type definitions (`EventType`, `Event`, `ChangePayload`)
//! - `reader` - Frame parsing over a buffered byte source (`FrameReader`, `FrameError`)

mod events;
mod reader;

pub use events::{ChangePayload, Event, EventType};
pub use reader::{FrameError, FrameReader, DEFAULT_MAX_LINE_LEN};
