// SPDX-License-Identifier: MIT

//! In-process storefront counters exposed as `GET /metrics` in Prometheus
//! text format. No external library needed — all counters are `AtomicU64`
//! incremented inline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Counters shared across all request handlers.
#[derive(Debug)]
pub struct StoreMetrics {
    /// Total HTTP requests dispatched since server start.
    pub http_requests_total: AtomicU64,
    /// Successful registrations since server start.
    pub users_registered: AtomicU64,
    /// Successful logins (password + OAuth) since server start.
    pub logins: AtomicU64,
    /// Orders placed since server start.
    pub orders_placed: AtomicU64,
    /// Orders cancelled (user + admin) since server start.
    pub orders_cancelled: AtomicU64,
    /// Server start time — used to calculate uptime in the metrics response.
    pub started_at: Instant,
}

impl StoreMetrics {
    pub fn new() -> Self {
        Self {
            http_requests_total: AtomicU64::new(0),
            users_registered: AtomicU64::new(0),
            logins: AtomicU64::new(0),
            orders_placed: AtomicU64::new(0),
            orders_cancelled: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    pub fn inc_http_requests(&self) {
        self.http_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_users_registered(&self) {
        self.users_registered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_logins(&self) {
        self.logins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_orders_placed(&self) {
        self.orders_placed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_orders_cancelled(&self) {
        self.orders_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Render counters in Prometheus text format.
    pub fn render_prometheus(&self) -> String {
        let uptime = self.started_at.elapsed().as_secs();
        let http_requests_total = self.http_requests_total.load(Ordering::Relaxed);
        let users_registered = self.users_registered.load(Ordering::Relaxed);
        let logins = self.logins.load(Ordering::Relaxed);
        let orders_placed = self.orders_placed.load(Ordering::Relaxed);
        let orders_cancelled = self.orders_cancelled.load(Ordering::Relaxed);

        format!(
            "# HELP stitchd_uptime_seconds Seconds since server start\n\
             # TYPE stitchd_uptime_seconds gauge\n\
             stitchd_uptime_seconds {uptime}\n\
             # HELP stitchd_http_requests_total HTTP requests dispatched\n\
             # TYPE stitchd_http_requests_total counter\n\
             stitchd_http_requests_total {http_requests_total}\n\
             # HELP stitchd_users_registered_total Successful registrations\n\
             # TYPE stitchd_users_registered_total counter\n\
             stitchd_users_registered_total {users_registered}\n\
             # HELP stitchd_logins_total Successful logins\n\
             # TYPE stitchd_logins_total counter\n\
             stitchd_logins_total {logins}\n\
             # HELP stitchd_orders_placed_total Orders placed\n\
             # TYPE stitchd_orders_placed_total counter\n\
             stitchd_orders_placed_total {orders_placed}\n\
             # HELP stitchd_orders_cancelled_total Orders cancelled\n\
             # TYPE stitchd_orders_cancelled_total counter\n\
             stitchd_orders_cancelled_total {orders_cancelled}\n"
        )
    }
}

impl Default for StoreMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe shared metrics handle.
pub type SharedMetrics = Arc<StoreMetrics>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_render_in_prometheus_format() {
        let m = StoreMetrics::new();
        m.inc_http_requests();
        m.inc_http_requests();
        m.inc_orders_placed();

        let text = m.render_prometheus();
        assert!(text.contains("stitchd_http_requests_total 2"));
        assert!(text.contains("stitchd_orders_placed_total 1"));
        assert!(text.contains("stitchd_orders_cancelled_total 0"));
        assert!(text.contains("# TYPE stitchd_uptime_seconds gauge"));
    }
}
