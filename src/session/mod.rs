//! Session module for the portal client
//!
//! This module holds the authentication token, refresh token, expiry and
//! user profile, persists them under fixed keys and runs the background
//! expiry and inactivity watchers.

pub mod models;
pub mod storage;
pub mod store;
pub mod token;
pub mod watch;

pub use models::{Role, SessionState, UserProfile};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use store::{SessionStore, SharedSession};
pub use token::{decode_claims, encode_claims, Claims, TokenError};
pub use watch::{spawn_expiry_watcher, spawn_idle_watcher, IdleTracker};
