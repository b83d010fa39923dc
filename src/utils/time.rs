use serde::{Deserialize, Deserializer};
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Deserialize an optional RFC 3339 timestamp.
///
/// The backend is not strict about timestamps, so anything that is missing, not a string, or not
/// RFC 3339 becomes `None` instead of failing the whole payload.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => OffsetDateTime::parse(&s, &Rfc3339).ok(),
        _ => None,
    })
}

/// Format a timestamp as a short wall-clock time for display.
pub fn clock(timestamp: &OffsetDateTime) -> String {
    format!("{:02}:{:02}", timestamp.hour(), timestamp.minute())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use time::macros::datetime;

    #[derive(Deserialize)]
    struct Stamped {
        #[serde(default, deserialize_with = "deserialize_lenient")]
        at: Option<OffsetDateTime>,
    }

    #[test]
    fn parses_rfc3339() {
        let s: Stamped = serde_json::from_str(r#"{"at":"2025-02-19T10:30:00Z"}"#).unwrap();
        assert_eq!(s.at, Some(datetime!(2025-02-19 10:30:00 UTC)));
    }

    #[test]
    fn tolerates_garbage() {
        let s: Stamped = serde_json::from_str(r#"{"at":"yesterday"}"#).unwrap();
        assert_eq!(s.at, None);
        let s: Stamped = serde_json::from_str(r#"{"at":1739960000}"#).unwrap();
        assert_eq!(s.at, None);
        let s: Stamped = serde_json::from_str(r#"{"at":null}"#).unwrap();
        assert_eq!(s.at, None);
        let s: Stamped = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(s.at, None);
    }

    #[test]
    fn clock_format() {
        assert_eq!(clock(&datetime!(2025-02-19 09:05:00 UTC)), "09:05");
    }
}
