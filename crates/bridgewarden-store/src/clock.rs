//! Injected time source shared by the stores.

use chrono::Utc;

/// Timestamp source producing RFC 3339 strings. Injectable so tests pin
/// `created_at` and decision times.
pub type Clock = Box<dyn Fn() -> String + Send + Sync>;

/// The production clock: UTC now.
pub(crate) fn system_clock() -> Clock {
    Box::new(|| Utc::now().to_rfc3339())
}
