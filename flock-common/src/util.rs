use thiserror::Error;
use time::UtcDateTime;

const NANOS_PER_MILLI: i128 = 1_000_000;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The unix timestamp is out of range: {0}ms")]
pub struct TimestampOutOfRangeError(i64);

#[must_use]
pub fn to_unix_millis(time: UtcDateTime) -> i64 {
    let millis = time.unix_timestamp_nanos() / NANOS_PER_MILLI;
    // UtcDateTime spans at most +-9999 years, which fits easily
    i64::try_from(millis).unwrap_or(if millis < 0 { i64::MIN } else { i64::MAX })
}

pub fn from_unix_millis(millis: i64) -> Result<UtcDateTime, TimestampOutOfRangeError> {
    UtcDateTime::from_unix_timestamp_nanos(i128::from(millis) * NANOS_PER_MILLI)
        .map_err(|_| TimestampOutOfRangeError(millis))
}

#[must_use]
pub fn now() -> UtcDateTime {
    let now = UtcDateTime::now();
    let nanos = now.nanosecond() / 1_000_000 * 1_000_000;
    now.replace_nanosecond(nanos).unwrap_or(now)
}

/// Applies a signed delta to a counter, flooring the result at zero.
#[must_use]
pub fn apply_delta(count: u64, delta: i64) -> u64 {
    if delta.is_negative() {
        count.saturating_sub(delta.unsigned_abs())
    } else {
        count.saturating_add(delta.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use crate::util::{apply_delta, from_unix_millis, now, to_unix_millis};
    use time::macros::utc_datetime;

    #[test]
    fn millis_conversion() {
        let time = utc_datetime!(2025-03-01 12:00:00.250);
        let millis = to_unix_millis(time);

        assert_eq!(millis, 1_740_830_400_250);
        assert_eq!(from_unix_millis(millis), Ok(time));
        assert!(from_unix_millis(i64::MAX).is_err());

        let now = now();
        assert_eq!(from_unix_millis(to_unix_millis(now)), Ok(now));
    }

    #[test]
    fn delta_is_floored() {
        assert_eq!(apply_delta(3, 1), 4);
        assert_eq!(apply_delta(3, -1), 2);
        assert_eq!(apply_delta(0, -1), 0);
        assert_eq!(apply_delta(1, -5), 0);
        assert_eq!(apply_delta(u64::MAX, 1), u64::MAX);
    }
}
