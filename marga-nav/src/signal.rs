//! Signal handling for graceful shutdown.

use marga_map::CancelToken;

use crate::error::{NavError, Result};

/// Install a Ctrl-C handler that cancels the returned token.
///
/// The same token stops the session loop and any search in flight.
///
/// # Example
/// ```ignore
/// let shutdown = setup_shutdown_handler()?;
/// while !shutdown.is_cancelled() {
///     // ... do work ...
/// }
/// ```
pub fn setup_shutdown_handler() -> Result<CancelToken> {
    let shutdown = CancelToken::new();
    let token = shutdown.clone();
    ctrlc::set_handler(move || {
        token.cancel();
    })
    .map_err(|e| NavError::Io(std::io::Error::other(e.to_string())))?;
    Ok(shutdown)
}
