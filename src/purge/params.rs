use crate::core::{PurgeError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Which root entities are eligible this run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Retention {
    /// Everything with a history timestamp older than now minus N days.
    OlderThanDays(i64),
    /// Explicit half-open window [from, to).
    Window {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
}

impl Retention {
    /// Builds a retention from raw scheduler inputs. Supplying only one of
    /// the two explicit bounds is an input error; with neither bound nor a
    /// day count, the configured default applies.
    pub fn from_bounds(
        older_than_days: Option<i64>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        default_days: i64,
    ) -> Result<Self> {
        match (older_than_days, from, to) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(PurgeError::InvalidParameter(
                "retention days and an explicit window are mutually exclusive".into(),
            )),
            (None, Some(_), None) | (None, None, Some(_)) => Err(PurgeError::InvalidParameter(
                "an explicit window requires both bounds".into(),
            )),
            (Some(days), None, None) => Ok(Self::OlderThanDays(days)),
            (None, Some(from), Some(to)) => Ok(Self::Window { from, to }),
            (None, None, None) => Ok(Self::OlderThanDays(default_days)),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::OlderThanDays(days) if *days <= 0 => Err(PurgeError::InvalidParameter(format!(
                "retention period must be positive, got {} days",
                days
            ))),
            Self::Window { from, to } if from >= to => Err(PurgeError::InvalidParameter(format!(
                "window is inverted or empty: [{}, {})",
                from, to
            ))),
            _ => Ok(()),
        }
    }

    /// The upper cutoff (exclusive) for eligible history timestamps.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::OlderThanDays(days) => now - Duration::days(*days),
            Self::Window { to, .. } => *to,
        }
    }

    /// The explicit lower bound, if one was supplied.
    pub fn lower_bound(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::OlderThanDays(_) => None,
            Self::Window { from, .. } => Some(*from),
        }
    }
}

/// Invocation parameters for one purge run. Repeated invocations with the
/// same parameters are idempotent: a completed backlog yields zero counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeParams {
    pub retention: Retention,

    /// Maximum rows removed by one block-delete.
    pub block_size: usize,

    /// Cap on root rows removed by this invocation.
    pub max_total: u64,

    /// Cap on secondary-stream rows removed by this invocation.
    pub audit_max_total: u64,

    /// Width of each sub-range the chunk driver walks.
    pub chunk_days: i64,

    /// Optional pause between sub-ranges to yield to live traffic.
    pub chunk_pause: Option<std::time::Duration>,

    /// Hard cap on passes per sub-range; tripping it is fatal.
    pub max_passes_per_chunk: u32,
}

impl PurgeParams {
    pub fn new(retention: Retention) -> Self {
        Self {
            retention,
            block_size: 500,
            max_total: 50_000,
            audit_max_total: 50_000,
            chunk_days: 30,
            chunk_pause: None,
            max_passes_per_chunk: 1_000,
        }
    }

    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn max_total(mut self, max_total: u64) -> Self {
        self.max_total = max_total;
        self
    }

    pub fn audit_max_total(mut self, audit_max_total: u64) -> Self {
        self.audit_max_total = audit_max_total;
        self
    }

    pub fn chunk_days(mut self, chunk_days: i64) -> Self {
        self.chunk_days = chunk_days;
        self
    }

    pub fn chunk_pause(mut self, pause: std::time::Duration) -> Self {
        self.chunk_pause = Some(pause);
        self
    }

    pub fn max_passes_per_chunk(mut self, cap: u32) -> Self {
        self.max_passes_per_chunk = cap;
        self
    }

    /// Fails fast before any deletion happens.
    pub fn validate(&self) -> Result<()> {
        self.retention.validate()?;
        if self.block_size == 0 {
            return Err(PurgeError::InvalidParameter(
                "block size must be positive".into(),
            ));
        }
        if self.chunk_days <= 0 {
            return Err(PurgeError::InvalidParameter(
                "chunk width must be a positive number of days".into(),
            ));
        }
        if self.max_passes_per_chunk == 0 {
            return Err(PurgeError::InvalidParameter(
                "pass guard must allow at least one pass per chunk".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration supplied by the scheduler. The retention default is passed
/// in at invocation time; the engine never reads ambient state mid-run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    pub retention_days: i64,
    pub enabled: bool,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            retention_days: 365,
            enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(year: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_non_positive_retention_rejected() {
        assert!(Retention::OlderThanDays(0).validate().is_err());
        assert!(Retention::OlderThanDays(-5).validate().is_err());
        assert!(Retention::OlderThanDays(30).validate().is_ok());
    }

    #[test]
    fn test_inverted_window_rejected() {
        let bad = Retention::Window {
            from: date(2025),
            to: date(2024),
        };
        assert!(bad.validate().is_err());
        let empty = Retention::Window {
            from: date(2024),
            to: date(2024),
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_partial_window_is_input_error() {
        assert!(Retention::from_bounds(None, Some(date(2024)), None, 365).is_err());
        assert!(Retention::from_bounds(None, None, Some(date(2024)), 365).is_err());
    }

    #[test]
    fn test_days_and_window_mutually_exclusive() {
        assert!(Retention::from_bounds(Some(30), Some(date(2024)), Some(date(2025)), 365).is_err());
    }

    #[test]
    fn test_default_days_applied() {
        let retention = Retention::from_bounds(None, None, None, 400).unwrap();
        assert_eq!(retention, Retention::OlderThanDays(400));
    }

    #[test]
    fn test_params_validation() {
        let ok = PurgeParams::new(Retention::OlderThanDays(30));
        assert!(ok.validate().is_ok());
        assert!(ok.clone().block_size(0).validate().is_err());
        assert!(ok.clone().chunk_days(0).validate().is_err());
        assert!(ok.clone().max_passes_per_chunk(0).validate().is_err());
    }
}
