use chrono::{DateTime, Duration, Utc};

use crate::constants::{COOL_WITHIN_HOURS, HOT_WITHIN_HOURS, WARM_WITHIN_HOURS};
use crate::models::Temperature;

/// Activity-recency label shown next to a connection.
pub fn from_last_activity(last_activity: DateTime<Utc>, now: DateTime<Utc>) -> Temperature {
    let idle = now.signed_duration_since(last_activity);

    if idle < Duration::hours(HOT_WITHIN_HOURS) {
        Temperature::Hot
    } else if idle < Duration::hours(WARM_WITHIN_HOURS) {
        Temperature::Warm
    } else if idle < Duration::hours(COOL_WITHIN_HOURS) {
        Temperature::Cool
    } else {
        Temperature::Cold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_bands() {
        let now = Utc::now();
        assert_eq!(from_last_activity(now, now), Temperature::Hot);
        assert_eq!(from_last_activity(now - Duration::hours(23), now), Temperature::Hot);
        assert_eq!(from_last_activity(now - Duration::hours(24), now), Temperature::Warm);
        assert_eq!(from_last_activity(now - Duration::days(4), now), Temperature::Cool);
        assert_eq!(from_last_activity(now - Duration::days(7), now), Temperature::Cold);
    }

    #[test]
    fn test_future_timestamp_is_hot() {
        let now = Utc::now();
        assert_eq!(from_last_activity(now + Duration::minutes(5), now), Temperature::Hot);
    }
}
