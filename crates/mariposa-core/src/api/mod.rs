//! Wire types and HTTP/SSE plumbing for the media-download service.

pub mod client;
pub mod sse;
pub mod types;

pub use client::{ApiClient, Backend, ProgressStream};
pub use types::{AudioQuality, MediaInfo, ProgressEvent, ProgressStatus, VideoQuality};
