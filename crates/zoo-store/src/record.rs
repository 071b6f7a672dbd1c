//! Record model and audit stamps
//!
//! A record is a plain JSON object. The only cross-entity shape is the audit
//! stamp stored under `created` and `modified`:
//!
//! ```json
//! {"at": "2026-01-01T00:00:00.000Z", "by": {"userId": "u1", "email": "a@b", "displayName": "A"}}
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stored entity record
pub type Record = Map<String, Value>;

/// Field holding the creation stamp
pub const CREATED_FIELD: &str = "created";

/// Field holding the last-modification stamp
pub const MODIFIED_FIELD: &str = "modified";

/// Format a timestamp the way every stamp stores it
#[inline]
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Who performed a write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    /// Acting user id (`system` for unattended writes)
    pub user_id: String,
    /// Email, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Reason for system-driven writes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Actor {
    /// Actor id used when no user is attached to a write
    pub const SYSTEM_USER_ID: &'static str = "system";

    /// Create actor for a user id
    #[inline]
    #[must_use]
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            display_name: None,
            reason: None,
        }
    }

    /// Unattended system actor
    #[inline]
    #[must_use]
    pub fn system() -> Self {
        Self::user(Self::SYSTEM_USER_ID)
    }

    /// With email
    #[inline]
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// With display name
    #[inline]
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// With reason
    #[inline]
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl Default for Actor {
    fn default() -> Self {
        Self::system()
    }
}

/// Audit stamp (`{at, by}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    /// ISO-8601 UTC timestamp
    pub at: String,
    /// Acting user
    pub by: Actor,
}

impl Stamp {
    /// Create stamp for an actor at a point in time
    #[inline]
    #[must_use]
    pub fn new(by: &Actor, at: DateTime<Utc>) -> Self {
        Self {
            at: format_timestamp(at),
            by: by.clone(),
        }
    }

    /// Encode as a record value
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "at": self.at, "by": self.by })
    }
}

/// Convenience accessors on records
pub trait RecordExt {
    /// String value of a field
    fn str_field(&self, field: &str) -> Option<&str>;

    /// Whether a boolean flag field is set to true
    fn flag(&self, field: &str) -> bool;

    /// Integer value of a field
    fn i64_field(&self, field: &str) -> Option<i64>;

    /// Parsed stamp stored under a field
    fn stamp(&self, field: &str) -> Option<Stamp>;
}

impl RecordExt for Record {
    fn str_field(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    fn flag(&self, field: &str) -> bool {
        self.get(field).and_then(Value::as_bool).unwrap_or(false)
    }

    fn i64_field(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    fn stamp(&self, field: &str) -> Option<Stamp> {
        self.get(field)
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn stamp_shape_matches_stored_format() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
        let actor = Actor::user("u1")
            .with_email("keeper@zoo.org")
            .with_display_name("Keeper");

        let value = Stamp::new(&actor, at).to_value();
        assert_eq!(
            value,
            json!({
                "at": "2026-03-01T12:30:00.000Z",
                "by": {"userId": "u1", "email": "keeper@zoo.org", "displayName": "Keeper"}
            })
        );
    }

    #[test]
    fn system_stamp_with_reason() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let value = Stamp::new(&Actor::system().with_reason("cascade_delete"), at).to_value();
        assert_eq!(value["by"], json!({"userId": "system", "reason": "cascade_delete"}));
    }

    #[test]
    fn stamp_roundtrips_through_record() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let stamp = Stamp::new(&Actor::user("u2"), at);

        let mut record = Record::new();
        record.insert(MODIFIED_FIELD.into(), stamp.to_value());

        assert_eq!(record.stamp(MODIFIED_FIELD), Some(stamp));
    }

    #[test]
    fn record_accessors() {
        let record: Record = serde_json::from_value(json!({
            "name": "Leo",
            "softDelete": true,
            "ttl": 42
        }))
        .unwrap();

        assert_eq!(record.str_field("name"), Some("Leo"));
        assert!(record.flag("softDelete"));
        assert!(!record.flag("missing"));
        assert_eq!(record.i64_field("ttl"), Some(42));
    }
}
