//! Catalog service models

pub mod movie;
pub mod user;

// Re-export for convenience
pub use movie::{Movie, MovieFields, MoviePayload};
pub use user::{
    AccountUpdate, Credentials, LoginRequest, NewUser, Signup, SignupRequest, UpdateUserRequest,
    User, UserChanges, UserResponse,
};

/// Timestamp wire format: UTC, millisecond precision, `Z` suffix
pub(crate) mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

    pub fn format(value: &DateTime<Utc>) -> String {
        value.format(FORMAT).to_string()
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn serialize_option<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serialize(value, serializer),
            None => serializer.serialize_none(),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::TimeZone;

        #[test]
        fn test_millisecond_precision() {
            let value = Utc.with_ymd_and_hms(2021, 9, 25, 14, 3, 9).unwrap()
                + chrono::Duration::microseconds(123_456);
            assert_eq!(format(&value), "2021-09-25T14:03:09.123Z");
        }
    }
}
