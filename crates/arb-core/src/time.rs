//! Time helpers shared by the evaluator and scanner loops.

/// Threshold above which a raw funding timestamp is interpreted as
/// milliseconds rather than seconds (spec.md §8 boundary behaviours).
const MS_THRESHOLD: i64 = 1_000_000_000_000;

/// Minutes from `now_ms` until `funding_time`, where `funding_time` is in
/// milliseconds if `> 10^12`, otherwise seconds. Returns `None` for a
/// timestamp in the past (never negative) and is never synthesized when the
/// venue reports no schedule (callers pass `None` through without calling
/// this function).
pub fn minutes_until_funding(funding_time: i64, now_ms: i64) -> Option<i64> {
    let funding_ms = if funding_time > MS_THRESHOLD {
        funding_time
    } else {
        funding_time * 1000
    };
    let delta_ms = funding_ms - now_ms;
    if delta_ms < 0 {
        return None;
    }
    Some(delta_ms / 60_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn past_timestamp_returns_none() {
        assert_eq!(minutes_until_funding(1_000, 2_000_000), None);
    }

    #[test]
    fn seconds_timestamp_is_interpreted_as_seconds() {
        let now_ms = 0;
        let funding_time_s = 600; // 10 minutes in seconds
        assert_eq!(minutes_until_funding(funding_time_s, now_ms), Some(10));
    }

    #[test]
    fn large_timestamp_is_interpreted_as_milliseconds() {
        let now_ms = 0;
        let funding_time_ms = 1_500_000_000_000i64; // well above 10^12
        let minutes = minutes_until_funding(funding_time_ms, now_ms).unwrap();
        assert_eq!(minutes, funding_time_ms / 60_000);
    }

    #[test]
    fn zero_delta_returns_zero_minutes_not_none() {
        assert_eq!(minutes_until_funding(0, 0), Some(0));
    }
}
