use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the client.

/// Base URL of the media-download service.
/// Read once at startup from the MARIPOSA_SERVER environment variable,
/// defaults to a local development server.
pub static SERVER_URL: Lazy<String> = Lazy::new(|| {
    env::var("MARIPOSA_SERVER").unwrap_or_else(|_| "http://127.0.0.1:5000".to_string())
});

/// Download folder path.
/// Read from the DOWNLOAD_FOLDER environment variable, defaults to
/// ~/downloads. Supports tilde (~) expansion for the home directory.
pub static DOWNLOAD_FOLDER: Lazy<String> =
    Lazy::new(|| env::var("DOWNLOAD_FOLDER").unwrap_or_else(|_| "~/downloads".to_string()));

/// Resolved download directory with tilde expansion applied.
pub fn download_dir() -> PathBuf {
    PathBuf::from(shellexpand::tilde(DOWNLOAD_FOLDER.as_str()).into_owned())
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Timeout for plain JSON requests (info, download start), in seconds.
    /// The progress stream and the file retrieval are long-lived and are
    /// deliberately not bounded by this.
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Timeout for establishing a connection, in seconds.
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }

    /// Connect timeout duration
    pub fn connect_timeout() -> Duration {
        Duration::from_secs(CONNECT_TIMEOUT_SECS)
    }
}

/// Progress-stream reconnect configuration
pub mod retry {
    use super::Duration;

    /// Maximum number of reconnect attempts after the progress stream
    /// drops without a terminal status.
    pub const MAX_STREAM_RECONNECTS: u32 = 3;

    /// Delay between reconnect attempts, in seconds.
    pub const RECONNECT_DELAY_SECS: u64 = 2;

    /// Reconnect delay duration
    pub fn reconnect_delay() -> Duration {
        Duration::from_secs(RECONNECT_DELAY_SECS)
    }
}

/// Validation configuration
pub mod validation {
    /// Maximum URL length (RFC 7230 recommends 8000, but we use 2048 for safety)
    pub const MAX_URL_LENGTH: usize = 2048;
}
