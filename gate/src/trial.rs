use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of the free trial in days.
pub const DEFAULT_TRIAL_DAYS: i64 = 14;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Trial progress derived from an account's signup time and the current time.
/// Never stored; recompute it whenever it is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialState {
    pub days_elapsed: i64,
    pub days_left: i64,
    pub is_expired: bool,
}

impl TrialState {
    /// Trial state for the default 14-day window.
    pub fn compute(created_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        TrialWindow::default().state(Some(created_at), now)
    }
}

/// Trial length policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialWindow {
    days: i64,
}

impl Default for TrialWindow {
    fn default() -> Self {
        Self {
            days: DEFAULT_TRIAL_DAYS,
        }
    }
}

impl TrialWindow {
    /// Negative lengths are clamped to zero.
    pub fn new(days: i64) -> Self {
        Self { days: days.max(0) }
    }

    pub fn days(&self) -> i64 {
        self.days
    }

    /// Computes the trial state at `now`.
    ///
    /// A missing `created_at`, or one in the future, counts as day zero so
    /// that bad data never locks out an account.
    pub fn state(&self, created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> TrialState {
        let days_elapsed = created_at.map_or(0, |created| elapsed_days(created, now));
        self.from_elapsed(days_elapsed)
    }

    /// Trial state for a known number of elapsed days.
    pub fn from_elapsed(&self, days_elapsed: i64) -> TrialState {
        let days_elapsed = days_elapsed.max(0);
        TrialState {
            days_elapsed,
            days_left: (self.days - days_elapsed).max(0),
            is_expired: days_elapsed > self.days,
        }
    }

    /// State used while nothing is known about the account yet.
    pub fn fresh(&self) -> TrialState {
        self.from_elapsed(0)
    }
}

/// Whole days since `created_at`, rounded up. Any started day counts.
fn elapsed_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = now.signed_duration_since(created_at).num_milliseconds();
    if ms <= 0 {
        return 0;
    }
    ms / DAY_MS + i64::from(ms % DAY_MS != 0)
}

/// Parses a signup timestamp as it comes out of the account store or a client
/// payload. Returns `None` for anything unreadable.
pub fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn five_days_in() {
        let state = TrialState::compute(now() - Duration::days(5), now());
        assert_eq!(state.days_elapsed, 5);
        assert_eq!(state.days_left, 9);
        assert!(!state.is_expired);
    }

    #[test]
    fn partial_day_rounds_up() {
        let state = TrialState::compute(now() - Duration::hours(1), now());
        assert_eq!(state.days_elapsed, 1);

        let state = TrialState::compute(now() - Duration::days(3) - Duration::milliseconds(1), now());
        assert_eq!(state.days_elapsed, 4);
    }

    #[test]
    fn same_instant_is_day_zero() {
        let state = TrialState::compute(now(), now());
        assert_eq!(state.days_elapsed, 0);
        assert_eq!(state.days_left, DEFAULT_TRIAL_DAYS);
        assert!(!state.is_expired);
    }

    #[test]
    fn expiry_starts_after_the_last_day() {
        let last_day = TrialState::compute(now() - Duration::days(14), now());
        assert_eq!(last_day.days_left, 0);
        assert!(!last_day.is_expired);

        let over = TrialState::compute(now() - Duration::days(14) - Duration::seconds(1), now());
        assert_eq!(over.days_elapsed, 15);
        assert!(over.is_expired);

        let long_gone = TrialState::compute(now() - Duration::days(20), now());
        assert_eq!(long_gone.days_left, 0);
        assert!(long_gone.is_expired);
    }

    #[test]
    fn future_signup_is_clamped() {
        let state = TrialState::compute(now() + Duration::days(3), now());
        assert_eq!(state.days_elapsed, 0);
        assert_eq!(state.days_left, DEFAULT_TRIAL_DAYS);
    }

    #[test]
    fn missing_signup_is_not_expired() {
        let state = TrialWindow::default().state(None, now());
        assert_eq!(state, TrialWindow::default().fresh());
        assert!(!state.is_expired);
    }

    #[test]
    fn days_left_stays_in_range() {
        let window = TrialWindow::default();
        for elapsed in -3..60 {
            let state = window.from_elapsed(elapsed);
            assert!(state.days_elapsed >= 0);
            assert!((0..=DEFAULT_TRIAL_DAYS).contains(&state.days_left));
            assert_eq!(state.days_left, (DEFAULT_TRIAL_DAYS - state.days_elapsed).max(0));
            assert_eq!(state.is_expired, state.days_elapsed > DEFAULT_TRIAL_DAYS);
        }
    }

    #[test]
    fn custom_window() {
        let window = TrialWindow::new(30);
        let state = window.state(Some(now() - Duration::days(20)), now());
        assert_eq!(state.days_left, 10);
        assert!(!state.is_expired);
    }

    #[test]
    fn negative_window_is_clamped() {
        let window = TrialWindow::new(-3);
        assert_eq!(window.days(), 0);
        let state = window.state(Some(now() - Duration::hours(1)), now());
        assert_eq!(state.days_left, 0);
        assert!(state.is_expired);
    }

    #[test]
    fn parses_store_timestamps() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap();
        assert_eq!(parse_created_at("2025-03-01T08:30:00Z"), Some(expected));
        assert_eq!(parse_created_at("2025-03-01T10:30:00+02:00"), Some(expected));
        assert_eq!(parse_created_at("2025-03-01 08:30:00"), Some(expected));
        assert_eq!(parse_created_at("2025-03-01T08:30:00.000"), Some(expected));
    }

    #[test]
    fn malformed_timestamps_fall_back_to_day_zero() {
        for raw in ["", "   ", "yesterday", "2025-13-45", "NaN"] {
            let created = parse_created_at(raw);
            assert_eq!(created, None, "{raw:?} should not parse");
            let state = TrialWindow::default().state(created, now());
            assert_eq!(state.days_elapsed, 0);
        }
    }
}
