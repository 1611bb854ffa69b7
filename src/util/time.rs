//! Time utilities for the repeat tick and uptime reporting

use std::time::{Duration, Instant};

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Default interval of the editor repeat tick (previews, inspect, highlight)
pub const TICK_REPEAT_MS: u64 = 100;

/// Repeat interval as seconds, used as the lifetime of debug beams
pub fn repeat_interval_secs(interval: Duration) -> f32 {
    interval.as_secs_f32()
}
