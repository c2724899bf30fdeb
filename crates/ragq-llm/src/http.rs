//! Shared HTTP client construction for the remote generation backend.

use std::time::Duration;

/// Fixed end-to-end timeout for one generation request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Create the HTTP client used for remote generation.
///
/// Config: 30s request timeout (connect included), rustls TLS,
/// `ragq/{version}` user-agent, redirect limit 10.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn default_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(REQUEST_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("ragq/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
}
