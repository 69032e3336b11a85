//! Expiry and renewal calculation
//!
//! - [`to_instant`] turns a timestamp-like value into a UTC instant, never
//!   failing loudly: empty or unparsable input yields `None`.
//! - [`compute_renewal_at`] extends from the current expiry while it is still
//!   in the future, otherwise starts a fresh window from `now`.
//! - [`is_active_at`] is the authoritative "is this subscription valid right
//!   now" predicate. The stored `active` flag is a cached signal maintained by
//!   the reconciliation sweeps and may lag behind it.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::Clock;

/// Offset-carrying string formats accepted besides RFC 3339 / RFC 2822
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];

/// Offset-less formats, interpreted as UTC
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Positive, bounded renewal length in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct RenewalDuration(i64);

impl RenewalDuration {
    /// Upper bound (100 years) keeping instant arithmetic in range
    pub const MAX_SECS: i64 = 100 * 365 * 24 * 60 * 60;

    /// `None` for zero, negative or absurdly large values
    pub const fn from_secs(secs: i64) -> Option<Self> {
        if secs > 0 && secs <= Self::MAX_SECS {
            Some(Self(secs))
        } else {
            None
        }
    }

    pub const fn as_secs(self) -> i64 {
        self.0
    }

    pub fn as_delta(self) -> Duration {
        Duration::seconds(self.0)
    }
}

impl TryFrom<i64> for RenewalDuration {
    type Error = String;

    fn try_from(secs: i64) -> Result<Self, Self::Error> {
        Self::from_secs(secs).ok_or_else(|| format!("renewal duration must be 1..={} seconds", Self::MAX_SECS))
    }
}

impl From<RenewalDuration> for i64 {
    fn from(duration: RenewalDuration) -> Self {
        duration.0
    }
}

/// Anything that may denote an instant
pub trait IntoInstant {
    fn into_instant(self) -> Option<DateTime<Utc>>;
}

impl IntoInstant for DateTime<Utc> {
    fn into_instant(self) -> Option<DateTime<Utc>> {
        Some(self)
    }
}

impl IntoInstant for &DateTime<Utc> {
    fn into_instant(self) -> Option<DateTime<Utc>> {
        Some(*self)
    }
}

impl IntoInstant for DateTime<FixedOffset> {
    fn into_instant(self) -> Option<DateTime<Utc>> {
        Some(self.with_timezone(&Utc))
    }
}

impl IntoInstant for NaiveDateTime {
    fn into_instant(self) -> Option<DateTime<Utc>> {
        Some(Utc.from_utc_datetime(&self))
    }
}

/// Unix timestamp in seconds
impl IntoInstant for i64 {
    fn into_instant(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self, 0).single()
    }
}

impl IntoInstant for &str {
    fn into_instant(self) -> Option<DateTime<Utc>> {
        parse_instant(self)
    }
}

impl IntoInstant for &String {
    fn into_instant(self) -> Option<DateTime<Utc>> {
        parse_instant(self)
    }
}

impl IntoInstant for String {
    fn into_instant(self) -> Option<DateTime<Utc>> {
        parse_instant(&self)
    }
}

impl<T: IntoInstant> IntoInstant for Option<T> {
    fn into_instant(self) -> Option<DateTime<Utc>> {
        self.and_then(IntoInstant::into_instant)
    }
}

/// Canonicalize a timestamp-like value; `None` when empty or unparsable
pub fn to_instant(value: impl IntoInstant) -> Option<DateTime<Utc>> {
    value.into_instant()
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// New expiry for a renewal evaluated at `now`.
///
/// The base is the current expiry when it is strictly later than `now`, so a
/// still-active subscription loses no time; otherwise the window restarts
/// from `now`.
pub fn compute_renewal_at(
    current_expiry: impl IntoInstant,
    duration: RenewalDuration,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let base = match current_expiry.into_instant() {
        Some(current) if current > now => current,
        _ => now,
    };

    base.checked_add_signed(duration.as_delta())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// [`compute_renewal_at`] against the given clock
pub fn compute_renewal(
    current_expiry: impl IntoInstant,
    duration: RenewalDuration,
    clock: &dyn Clock,
) -> DateTime<Utc> {
    compute_renewal_at(current_expiry, duration, clock.now())
}

/// True iff `expires` is present and strictly later than `now`
pub fn is_active_at(expires: impl IntoInstant, now: DateTime<Utc>) -> bool {
    matches!(expires.into_instant(), Some(expires) if expires > now)
}

/// [`is_active_at`] against the given clock
pub fn is_active(expires: impl IntoInstant, clock: &dyn Clock) -> bool {
    is_active_at(expires, clock.now())
}
