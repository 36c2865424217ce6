/*!
 * Monitoring
 * Tracing setup for hosts and the probe binary
 */

mod tracer;

pub use tracer::{init_tracing, TRACE_JSON_ENV};
