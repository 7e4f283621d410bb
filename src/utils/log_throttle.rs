//! Rate limiting for log lines that could otherwise repeat once per request.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Window {
    opened_at: Instant,
    suppressed: u64,
}

static WINDOWS: OnceLock<Mutex<HashMap<String, Window>>> = OnceLock::new();

/// Decides whether a log line for `key` may be written now.
///
/// The first event for a key is emitted and opens a window of length
/// `interval`; further events inside the window are suppressed and counted.
/// The first event after the window closes is emitted again and returns how
/// many were suppressed in between.
pub fn should_emit(key: &str, interval: Duration) -> Option<u64> {
    // A panic while holding the lock leaves the counts usable.
    let mut windows = WINDOWS
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let now = Instant::now();

    let Some(window) = windows.get_mut(key) else {
        windows.insert(
            key.to_string(),
            Window {
                opened_at: now,
                suppressed: 0,
            },
        );
        return Some(0);
    };

    if now.duration_since(window.opened_at) < interval {
        window.suppressed += 1;
        return None;
    }
    let suppressed = std::mem::take(&mut window.suppressed);
    window.opened_at = now;
    Some(suppressed)
}

#[cfg(test)]
mod tests {
    use super::should_emit;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn reports_suppressed_count_when_window_reopens() {
        let key = "log_throttle.reports_suppressed_count_when_window_reopens";
        let interval = Duration::from_millis(20);

        assert_eq!(should_emit(key, interval), Some(0));
        assert_eq!(should_emit(key, interval), None);
        assert_eq!(should_emit(key, interval), None);
        assert_eq!(should_emit(key, interval), None);

        sleep(Duration::from_millis(30));
        assert_eq!(should_emit(key, interval), Some(3));
        assert_eq!(should_emit(key, interval), None);
    }

    #[test]
    fn keys_are_throttled_independently() {
        let interval = Duration::from_secs(60);

        assert_eq!(should_emit("log_throttle.independent.a", interval), Some(0));
        assert_eq!(should_emit("log_throttle.independent.b", interval), Some(0));
        assert_eq!(should_emit("log_throttle.independent.a", interval), None);
    }
}
