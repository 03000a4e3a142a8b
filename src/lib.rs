//! firebase-rtdb - A client for the Firebase Realtime Database REST API
//!
//! Reads and writes JSON over REST, streams changes over server-sent events,
//! and generates sortable push ids.

pub mod adapters;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod push_id;
pub mod realtime;
pub mod sse;
pub mod time;
pub mod traits;

pub use config::DatabaseConfig;
pub use database::{DatabaseRef, QueryOption};
pub use error::{FirebaseError, FirebaseResult};
pub use push_id::{generate_push_id, PushIdGenerator};
pub use realtime::{listen, watch, ListenConfig};
pub use sse::{Event, EventType};
