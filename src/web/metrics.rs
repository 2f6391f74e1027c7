use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use once_cell::sync::Lazy;

static STARTED_AT: Lazy<Instant> = Lazy::new(Instant::now);

static SCANS_RECEIVED: AtomicU64 = AtomicU64::new(0);
static SCANS_SUCCESS: AtomicU64 = AtomicU64::new(0);
static SCANS_FAILED: AtomicU64 = AtomicU64::new(0);
static ASSESSMENTS_RECEIVED: AtomicU64 = AtomicU64::new(0);
static ASSESSMENTS_FAILED: AtomicU64 = AtomicU64::new(0);
static CHATS_RECEIVED: AtomicU64 = AtomicU64::new(0);
static CHATS_FAILED: AtomicU64 = AtomicU64::new(0);

pub struct Metrics;

impl Metrics {
    /// Pins the uptime origin; call once at startup.
    pub fn start_clock() {
        Lazy::force(&STARTED_AT);
    }

    pub fn scan_received() {
        SCANS_RECEIVED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn scan_success() {
        SCANS_SUCCESS.fetch_add(1, Ordering::Relaxed);
    }

    pub fn scan_failed() {
        SCANS_FAILED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn assessment_received() {
        ASSESSMENTS_RECEIVED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn assessment_failed() {
        ASSESSMENTS_FAILED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn chat_received() {
        CHATS_RECEIVED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn chat_failed() {
        CHATS_FAILED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_seconds() -> u64 {
        STARTED_AT.elapsed().as_secs()
    }
}

pub fn format_prometheus(stored_scans: Option<i64>) -> String {
    let mut output = format!(
        r#"# HELP gateway_uptime_seconds Number of seconds the gateway has been running
# TYPE gateway_uptime_seconds gauge
gateway_uptime_seconds {}

# HELP scans_received_total Scan submissions received
# TYPE scans_received_total counter
scans_received_total {}

# HELP scans_success_total Scan submissions processed and stored
# TYPE scans_success_total counter
scans_success_total {}

# HELP scans_failed_total Scan submissions that failed
# TYPE scans_failed_total counter
scans_failed_total {}

# HELP risk_assessments_received_total Risk assessment requests received
# TYPE risk_assessments_received_total counter
risk_assessments_received_total {}

# HELP risk_assessments_failed_total Risk assessment requests that failed
# TYPE risk_assessments_failed_total counter
risk_assessments_failed_total {}

# HELP chat_messages_received_total Chat messages received
# TYPE chat_messages_received_total counter
chat_messages_received_total {}

# HELP chat_messages_failed_total Chat messages that failed
# TYPE chat_messages_failed_total counter
chat_messages_failed_total {}
"#,
        Metrics::uptime_seconds(),
        SCANS_RECEIVED.load(Ordering::Relaxed),
        SCANS_SUCCESS.load(Ordering::Relaxed),
        SCANS_FAILED.load(Ordering::Relaxed),
        ASSESSMENTS_RECEIVED.load(Ordering::Relaxed),
        ASSESSMENTS_FAILED.load(Ordering::Relaxed),
        CHATS_RECEIVED.load(Ordering::Relaxed),
        CHATS_FAILED.load(Ordering::Relaxed),
    );

    if let Some(count) = stored_scans {
        output.push_str(&format!(
            r#"
# HELP scans_stored Rows in the scans table
# TYPE scans_stored gauge
scans_stored {}
"#,
            count
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    // Counters are process-wide and other tests bump them concurrently.
    #[test]
    fn metrics_increments_counters() {
        let scans_before = SCANS_RECEIVED.load(Ordering::Relaxed);
        let chats_before = CHATS_FAILED.load(Ordering::Relaxed);

        Metrics::scan_received();
        Metrics::chat_failed();

        assert!(SCANS_RECEIVED.load(Ordering::Relaxed) > scans_before);
        assert!(CHATS_FAILED.load(Ordering::Relaxed) > chats_before);
    }

    #[test]
    fn format_prometheus_includes_all_metrics() {
        let output = format_prometheus(Some(7));
        assert!(output.contains("gateway_uptime_seconds"));
        assert!(output.contains("scans_received_total"));
        assert!(output.contains("risk_assessments_failed_total"));
        assert!(output.contains("chat_messages_received_total"));
        assert!(output.contains("scans_stored 7"));
    }

    #[test]
    fn format_prometheus_omits_gauge_without_store() {
        assert!(!format_prometheus(None).contains("scans_stored"));
    }
}
