use std::{fmt, str::FromStr};

use super::validation::ValidationError;

/// Row cap applied when the client sends no filter.
pub const DEFAULT_LIMIT: usize = 100;

/// Row count selected by the `top10` token.
pub const TOP_N: usize = 10;

/// Filter tokens a client may send on `GET /data`.
pub const RECOGNIZED_FILTERS: [&str; 8] = ["top10", "1h", "2h", "4h", "8h", "12h", "24h", "*"];

const MS_PER_HOUR: i64 = 60 * 60 * 1000;

// ---------------------------------------------------------------------------
// FilterToken
// ---------------------------------------------------------------------------

/// Parsed form of the token grammar: `top10`, `*`, or `<positive integer>h`.
///
/// Parsing accepts the whole grammar; which windows are actually offered is
/// decided by [`RECOGNIZED_FILTERS`] in the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterToken {
    Top10,
    Hours(u32),
    All,
}

impl FromStr for FilterToken {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top10" => Ok(Self::Top10),
            "*" => Ok(Self::All),
            other => {
                let digits = other
                    .strip_suffix('h')
                    .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
                    .ok_or(ValidationError::InvalidFilter)?;
                match digits.parse::<u32>() {
                    Ok(hours) if hours > 0 => Ok(Self::Hours(hours)),
                    _ => Err(ValidationError::InvalidFilter),
                }
            }
        }
    }
}

impl fmt::Display for FilterToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top10 => f.write_str("top10"),
            Self::Hours(h) => write!(f, "{h}h"),
            Self::All => f.write_str("*"),
        }
    }
}

// ---------------------------------------------------------------------------
// FilterPolicy
// ---------------------------------------------------------------------------

/// Retrieval policy for one query. Results are always ordered by `date`
/// descending; the variant only decides the bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPolicy {
    /// No token supplied: newest `limit` readings.
    Unbounded { limit: usize },
    /// Newest `n` readings.
    TopN(usize),
    /// Readings with `date >= threshold_ms`, where the threshold was computed
    /// once as `now - hours`.
    SinceDuration { hours: u32, threshold_ms: i64 },
    /// Every reading.
    All,
}

impl FilterPolicy {
    /// Resolve `token` against the current wall clock.
    pub fn resolve(token: Option<FilterToken>) -> Self {
        Self::resolve_at(token, crate::db::now_ms())
    }

    /// Resolve `token` with `now_ms` as the snapshot instant.
    pub fn resolve_at(token: Option<FilterToken>, now_ms: i64) -> Self {
        match token {
            None => Self::Unbounded { limit: DEFAULT_LIMIT },
            Some(FilterToken::Top10) => Self::TopN(TOP_N),
            Some(FilterToken::All) => Self::All,
            Some(FilterToken::Hours(hours)) => Self::SinceDuration {
                hours,
                threshold_ms: now_ms.saturating_sub(i64::from(hours) * MS_PER_HOUR),
            },
        }
    }

    pub fn limit(&self) -> Option<usize> {
        match self {
            Self::Unbounded { limit } => Some(*limit),
            Self::TopN(n) => Some(*n),
            Self::SinceDuration { .. } | Self::All => None,
        }
    }

    /// Inclusive lower bound on `date`, if any.
    pub fn since_ms(&self) -> Option<i64> {
        match self {
            Self::SinceDuration { threshold_ms, .. } => Some(*threshold_ms),
            _ => None,
        }
    }

    pub fn admits(&self, date: i64) -> bool {
        self.since_ms().map_or(true, |threshold| date >= threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn parse_literal_tokens() {
        assert_eq!("top10".parse::<FilterToken>().unwrap(), FilterToken::Top10);
        assert_eq!("*".parse::<FilterToken>().unwrap(), FilterToken::All);
    }

    #[test]
    fn parse_hour_windows() {
        assert_eq!("4h".parse::<FilterToken>().unwrap(), FilterToken::Hours(4));
        assert_eq!("24h".parse::<FilterToken>().unwrap(), FilterToken::Hours(24));
        assert_eq!("36h".parse::<FilterToken>().unwrap(), FilterToken::Hours(36));
    }

    #[test]
    fn parse_rejects_malformed_tokens() {
        for raw in ["5x", "0h", "h", "-1h", "+4h", "1hour", "top5", "", "4H", " 4h"] {
            assert_eq!(
                raw.parse::<FilterToken>().unwrap_err(),
                ValidationError::InvalidFilter,
                "token {raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn every_recognized_filter_parses_and_displays_back() {
        for raw in RECOGNIZED_FILTERS {
            let token: FilterToken = raw.parse().unwrap();
            assert_eq!(token.to_string(), raw);
        }
    }

    #[test]
    fn absent_token_caps_at_default_limit() {
        let policy = FilterPolicy::resolve_at(None, NOW);
        assert_eq!(policy, FilterPolicy::Unbounded { limit: 100 });
        assert_eq!(policy.limit(), Some(100));
        assert_eq!(policy.since_ms(), None);
    }

    #[test]
    fn top10_limits_to_ten() {
        let policy = FilterPolicy::resolve_at(Some(FilterToken::Top10), NOW);
        assert_eq!(policy, FilterPolicy::TopN(10));
        assert_eq!(policy.limit(), Some(10));
        assert!(policy.admits(0));
    }

    #[test]
    fn star_is_unbounded() {
        let policy = FilterPolicy::resolve_at(Some(FilterToken::All), NOW);
        assert_eq!(policy, FilterPolicy::All);
        assert_eq!(policy.limit(), None);
        assert_eq!(policy.since_ms(), None);
    }

    #[test]
    fn hour_window_threshold_is_fixed_at_resolution() {
        let policy = FilterPolicy::resolve_at(Some(FilterToken::Hours(4)), NOW);
        let threshold = NOW - 4 * 3_600_000;
        assert_eq!(
            policy,
            FilterPolicy::SinceDuration { hours: 4, threshold_ms: threshold }
        );
        assert_eq!(policy.limit(), None);
        assert!(policy.admits(threshold));
        assert!(policy.admits(NOW));
        assert!(!policy.admits(threshold - 1));
    }
}
