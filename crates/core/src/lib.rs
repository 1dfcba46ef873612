//! Shared domain model for the SyncAvatar client.
//!
//! Holds the job lifecycle types, the backend wire payloads, media
//! categories for the upload slots, and the pure view-selection logic
//! used by the application controller.

pub mod error;
pub mod job;
pub mod media;
pub mod types;
pub mod view;
