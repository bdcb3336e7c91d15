//! Formatting for panic payloads caught from transforms and session tasks.

use std::{any::Any, fmt};

/// Wrapper that renders a panic payload for logs and error messages.
///
/// `String` and `&'static str` payloads print verbatim; anything else falls
/// back to `Debug`.
///
/// ```
/// use chunkframe::panic::format_panic;
///
/// assert_eq!(format_panic(Box::new("boom")).to_string(), "boom");
/// assert!(format_panic(Box::new(5_u32)).to_string().contains("Any"));
/// ```
#[derive(Debug)]
#[must_use]
pub struct PanicMessage(Box<dyn Any + Send>);

impl fmt::Display for PanicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(message) = self.0.downcast_ref::<String>() {
            f.write_str(message)
        } else if let Some(message) = self.0.downcast_ref::<&'static str>() {
            f.write_str(message)
        } else {
            write!(f, "{:?}", self.0)
        }
    }
}

/// Create a [`PanicMessage`] for the given payload.
pub fn format_panic(panic: Box<dyn Any + Send>) -> PanicMessage { PanicMessage(panic) }
