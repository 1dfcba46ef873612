//! SyncAvatar client application library.
//!
//! Exposes the building blocks (config, upload pickers, preview handles,
//! the application controller with its embedded job poller, the result
//! viewer, and terminal rendering) so integration tests and the binary
//! entrypoint can both access them.

pub mod config;
pub mod controller;
pub mod picker;
pub mod poller;
pub mod preview;
pub mod render;
pub mod viewer;
