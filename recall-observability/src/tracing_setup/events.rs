//! Named events shared across crates so log queries can match on `event`.

/// A subsystem fell back to a lower-quality mode.
pub fn degradation_triggered(component: &str, failure: &str, fallback: &str) {
    tracing::warn!(
        event = "degradation_triggered",
        component,
        failure,
        fallback,
        "degradation triggered"
    );
}

/// A degraded component succeeded again.
pub fn degradation_recovered(component: &str) {
    tracing::info!(event = "degradation_recovered", component, "degradation recovered");
}

/// A batch of nodes was written.
pub fn batch_flushed(size: usize, indexed: usize, skipped: usize) {
    tracing::info!(event = "batch_flushed", size, indexed, skipped, "batch flushed");
}

/// A node failed mid-flush; the nodes after it went back to the buffer.
pub fn batch_failed(node_id: &str, error: &str, requeued: usize) {
    tracing::error!(event = "batch_failed", node_id, error, requeued, "batch flush failed");
}
