//! Storage operation metrics.

use std::time::Instant;

/// Records a counter and a latency histogram for one store operation.
///
/// * `operation` - Store method name (e.g., `save_submission`)
/// * `start` - Operation start time from `Instant::now()`
/// * `ok` - Whether the operation succeeded
pub fn record_operation_metrics(operation: &'static str, start: Instant, ok: bool) {
    let status = if ok { "success" } else { "error" };
    metrics::counter!(
        "storage_operations_total",
        "backend" => "sqlite",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "storage_operation_duration_ms",
        "backend" => "sqlite",
        "operation" => operation,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
}
