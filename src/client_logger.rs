//! Logging trait for Aurum client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! and log all API interactions passing through the [`AurumClient`].
//!
//! [`AurumClient`]: crate::AurumClient

use serde_json::Value;

/// A trait for logging Aurum client operations.
///
/// Implement this trait to capture and record every request body the client
/// sends and every response body it receives.
///
/// # Example
///
/// ```rust,ignore
/// use aurum::ClientLogger;
/// use serde_json::Value;
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_request(&self, endpoint: &str, body: &Value) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "-> {endpoint}: {body}").unwrap();
///     }
///
///     fn log_response(&self, endpoint: &str, status: u16, body: &str) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "<- {endpoint} {status}: {body}").unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log an outgoing request body.
    ///
    /// Called once per request, before it is sent. Login and signup bodies
    /// are passed with the password replaced.
    fn log_request(&self, endpoint: &str, body: &Value);

    /// Log a raw response body together with its HTTP status.
    ///
    /// Called once per request that produced a response, whether or not the
    /// status indicates success.
    fn log_response(&self, endpoint: &str, status: u16, body: &str);
}
