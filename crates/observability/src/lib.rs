//! Tracing/logging setup shared by every storefront process.

/// Initialize process-wide logging from `RUST_LOG` (fallback `info`), JSON output.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, formats).
pub mod tracing;

pub use self::tracing::{LogFormat, LogSettings, init_with};
