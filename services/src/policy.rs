use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};
use util::config::AppConfig;

/// Tunables of the verification flows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresencePolicy {
    /// Tolerance around scheduled start and end.
    pub grace: Duration,
    /// Campus clock. Calendar dates and schedule clock times are read in it.
    pub campus_offset: FixedOffset,
    pub default_session_ttl: Duration,
    pub max_session_ttl: Duration,
}

impl Default for PresencePolicy {
    fn default() -> Self {
        Self {
            grace: Duration::minutes(15),
            campus_offset: Utc.fix(),
            default_session_ttl: Duration::seconds(300),
            max_session_ttl: Duration::seconds(3600),
        }
    }
}

impl PresencePolicy {
    /// Reads the configured tunables. Values too large for a `Duration` keep
    /// their defaults.
    pub fn from_config() -> Self {
        let cfg = AppConfig::global();
        let defaults = Self::default();
        Self {
            grace: Duration::try_minutes(cfg.schedule_grace_minutes.max(0))
                .unwrap_or(defaults.grace),
            campus_offset: cfg.campus_offset(),
            default_session_ttl: Duration::try_seconds(cfg.session_ttl_seconds.max(1))
                .unwrap_or(defaults.default_session_ttl),
            max_session_ttl: Duration::try_seconds(cfg.max_session_ttl_seconds.max(1))
                .unwrap_or(defaults.max_session_ttl),
        }
    }

    pub fn local(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.campus_offset)
    }

    /// Campus calendar date of `instant`.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.local(instant).date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serial_test::serial;

    #[test]
    fn local_date_follows_campus_offset() {
        let policy = PresencePolicy {
            campus_offset: FixedOffset::east_opt(7 * 3600).unwrap(),
            ..Default::default()
        };
        let late_utc = Utc.with_ymd_and_hms(2025, 10, 6, 20, 0, 0).unwrap();
        assert_eq!(
            policy.local_date(late_utc),
            NaiveDate::from_ymd_opt(2025, 10, 7).unwrap()
        );
    }

    #[test]
    #[serial]
    fn from_config_reads_overrides() {
        AppConfig::set_schedule_grace_minutes(5);
        AppConfig::set_campus_utc_offset_minutes(-180);
        let policy = PresencePolicy::from_config();
        assert_eq!(policy.grace, Duration::minutes(5));
        assert_eq!(policy.campus_offset.local_minus_utc(), -180 * 60);
        AppConfig::reset();
    }

    #[test]
    #[serial]
    fn oversized_config_values_keep_defaults() {
        AppConfig::set_schedule_grace_minutes(i64::MAX);
        AppConfig::set_session_ttl_seconds(i64::MAX);
        let policy = PresencePolicy::from_config();
        assert_eq!(policy.grace, Duration::minutes(15));
        assert_eq!(policy.default_session_ttl, Duration::seconds(300));
        AppConfig::reset();
    }
}
