//! HTTP transport for the SyncAvatar generation backend.
//!
//! [`api::SyncAvatarApi`] wraps the two backend endpoints (`POST /upload`
//! and `GET /status/{job_id}`) using [`reqwest`] and normalizes failures
//! into [`api::ClientError`]. The [`backend::JobBackend`] trait is the seam
//! the application controller is written against.

pub mod api;
pub mod backend;
