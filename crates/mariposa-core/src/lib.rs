//! Mariposa core — client library for the media-download web service.
//!
//! Drives the multi-step download wizard (platform → mode → URL entry →
//! progress → completion) against the service's HTTP+SSE API and keeps all
//! per-attempt state in an explicit session object.
//!
//! # Module Structure
//!
//! - `config`: environment-driven configuration and tuning constants
//! - `error`: centralized error types
//! - `session`: session state, platforms, quality selection, download modes
//! - `wizard`: the pure step-transition state machine
//! - `api`: wire types, SSE framing, and the reqwest-backed API client
//! - `controller`: the wizard controller tying state machine, backend, and
//!   view together

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod session;
pub mod wizard;

// Re-export commonly used types for convenience
pub use api::{ApiClient, Backend, MediaInfo, ProgressEvent, ProgressStatus, ProgressStream};
pub use controller::{NullView, Wizard, WizardView};
pub use error::{AppError, AppResult};
pub use session::{DownloadMode, Mode, Platform, Quality, QualityChoice, QualityKind, SessionState};
pub use wizard::{Flow, Step};
