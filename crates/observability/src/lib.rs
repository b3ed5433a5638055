//! Tracing/logging setup shared by hosts and tests.

/// Initialize process-wide tracing with the default filter.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, layers).
pub mod tracing;
