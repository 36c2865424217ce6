/*!
 * Core Module
 * Error handling, timekeeping and the synchronization primitives
 */

pub mod errors;
pub mod last_error;
pub mod sync;
pub mod time;

// Re-export for convenience
pub use errors::*;
