use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::services::payload::EventPayload;

/// Default suppression window for repeated identical dispatches.
pub const DEFAULT_SUPPRESSION_WINDOW: Duration = Duration::from_secs(5);

/// Dedup signature for a payload: sub-order id, event kind, and the
/// timestamp pair with `"null"` placeholders for absent times.
pub fn dispatch_signature(payload: &EventPayload) -> String {
    format!(
        "{}_{}_{}_{}",
        payload.sub_mo_id,
        payload.status,
        payload.start_time.time.as_deref().unwrap_or("null"),
        payload.end_time.time.as_deref().unwrap_or("null"),
    )
}

/// Time-windowed duplicate suppression. Entries older than the window are
/// pruned on each check, and the per-key check-then-record is atomic, so a
/// burst of identical dispatches lets exactly one through per window.
pub struct DispatchGuard {
    window: Duration,
    entries: DashMap<String, Instant>,
}

impl DispatchGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: DashMap::new(),
        }
    }

    /// True when an identical signature was recorded within the window.
    /// Otherwise records the signature and returns false; the record happens
    /// here, before any transport attempt, so failed attempts are suppressed
    /// to the same window as successful ones.
    pub fn check_and_record(&self, signature: &str) -> bool {
        let now = Instant::now();
        self.entries
            .retain(|_, sent_at| now.duration_since(*sent_at) < self.window);

        match self.entries.entry(signature.to_string()) {
            Entry::Occupied(mut entry) => {
                if now.duration_since(*entry.get()) < self.window {
                    true
                } else {
                    entry.insert(now);
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                false
            }
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.entries.len()
    }
}

impl Default for DispatchGuard {
    fn default() -> Self {
        Self::new(DEFAULT_SUPPRESSION_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::payload::{OperationEventKind, TimeStamp};
    use std::thread::sleep;

    #[test]
    fn suppresses_repeat_within_window() {
        let guard = DispatchGuard::new(Duration::from_millis(200));

        assert!(!guard.check_and_record("9_started_2024-03-01 08:00:00_null"));
        assert!(guard.check_and_record("9_started_2024-03-01 08:00:00_null"));
    }

    #[test]
    fn distinct_signatures_pass() {
        let guard = DispatchGuard::new(Duration::from_millis(200));

        assert!(!guard.check_and_record("9_started_a_null"));
        assert!(!guard.check_and_record("9_completed_a_b"));
    }

    #[test]
    fn window_expiry_allows_resend() {
        let guard = DispatchGuard::new(Duration::from_millis(20));

        assert!(!guard.check_and_record("sig"));
        sleep(Duration::from_millis(30));
        assert!(!guard.check_and_record("sig"));
    }

    #[test]
    fn stale_entries_are_pruned() {
        let guard = DispatchGuard::new(Duration::from_millis(20));

        guard.check_and_record("a");
        guard.check_and_record("b");
        assert_eq!(guard.tracked(), 2);

        sleep(Duration::from_millis(30));
        guard.check_and_record("c");
        assert_eq!(guard.tracked(), 1);
    }

    #[test]
    fn signature_uses_null_placeholders() {
        let payload = EventPayload {
            knockdown_no: "SO-001".to_string(),
            station_name: "ST-5".to_string(),
            start_time: TimeStamp {
                time: Some("2024-03-01 08:00:00".to_string()),
                status: true,
            },
            end_time: TimeStamp::absent(),
            status: OperationEventKind::Started,
            mo_id: 7,
            sub_mo_id: 9,
            sub_mo_name: "SO-001-1".to_string(),
        };

        assert_eq!(
            dispatch_signature(&payload),
            "9_started_2024-03-01 08:00:00_null"
        );
    }
}
