//! Opaque pagination cursors
//!
//! A cursor is a versioned JSON payload, base64url-encoded: the sort key it
//! was issued for, the stringified sort value and id of the last row, and an
//! issue timestamp. Decoding is total: anything malformed, mismatched or
//! expired yields `None`, and callers treat that as "start from beginning".

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{SortKey, SortOrder};
use crate::store::{Predicate, SortField, SortValue};

pub const CURSOR_VERSION: u8 = 1;
pub const MAX_CURSOR_AGE_HOURS: i64 = 24;

/// Wire shape of the cursor payload. Field names are kept short; the version
/// field lets future sort-key additions invalidate old in-flight cursors
/// instead of misreading them.
#[derive(Debug, Serialize, Deserialize)]
struct CursorPayload {
    v: u8,
    s: String,
    lv: String,
    li: Uuid,
    ts: i64,
}

/// A decoded, structurally valid cursor
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    pub sort_key: SortKey,
    pub last_value: String,
    pub last_id: Uuid,
    pub issued_at: DateTime<Utc>,
}

impl Cursor {
    /// Parse the carried sort value for the store-level sort field.
    pub fn sort_value(&self, field: SortField) -> Option<SortValue> {
        SortValue::from_cursor_string(field, &self.last_value)
    }

    /// Continuation predicate: strict inequality on the sort field, anchored
    /// at the cursor id to total-order ties.
    pub fn to_predicate(&self, field: SortField, order: SortOrder) -> Option<Predicate> {
        Some(Predicate::After {
            field,
            value: self.sort_value(field)?,
            id: self.last_id,
            order,
        })
    }
}

/// Encode a cursor for the given sort position.
pub fn encode(sort_key: SortKey, value: &SortValue, id: Uuid) -> String {
    let payload = CursorPayload {
        v: CURSOR_VERSION,
        s: sort_key.as_str().to_string(),
        lv: value.to_cursor_string(),
        li: id,
        ts: Utc::now().timestamp(),
    };
    // Serializing a plain struct of scalars cannot fail.
    let json = serde_json::to_vec(&payload).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Decode and validate a cursor token. Returns `None` on malformed input,
/// unknown version or sort key, or a token older than 24 hours.
pub fn decode(token: &str) -> Option<Cursor> {
    decode_at(token, Utc::now())
}

fn decode_at(token: &str, now: DateTime<Utc>) -> Option<Cursor> {
    let bytes = URL_SAFE_NO_PAD.decode(token).ok()?;
    let payload: CursorPayload = serde_json::from_slice(&bytes).ok()?;

    if payload.v != CURSOR_VERSION {
        return None;
    }
    let sort_key = SortKey::parse(&payload.s)?;
    let issued_at = DateTime::from_timestamp(payload.ts, 0)?;

    if now - issued_at > Duration::hours(MAX_CURSOR_AGE_HOURS) {
        return None;
    }

    Some(Cursor {
        sort_key,
        last_value: payload.lv,
        last_id: payload.li,
        issued_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let id = Uuid::new_v4();
        let token = encode(SortKey::Price, &SortValue::Float(250000.0), id);

        let cursor = decode(&token).unwrap();
        assert_eq!(cursor.sort_key, SortKey::Price);
        assert_eq!(cursor.last_value, "250000");
        assert_eq!(cursor.last_id, id);
        assert_eq!(
            cursor.sort_value(SortField::Price),
            Some(SortValue::Float(250000.0))
        );
    }

    #[test]
    fn test_round_trip_created_at() {
        let id = Uuid::new_v4();
        let at = DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let token = encode(SortKey::CreatedAt, &SortValue::Time(at), id);

        let cursor = decode(&token).unwrap();
        assert_eq!(cursor.sort_value(SortField::CreatedAt), Some(SortValue::Time(at)));
    }

    #[test]
    fn test_expired_cursor_is_rejected() {
        let token = encode(SortKey::CreatedAt, &SortValue::Int(42), Uuid::new_v4());
        let later = Utc::now() + Duration::hours(25);
        assert!(decode_at(&token, later).is_none());
    }

    #[test]
    fn test_fresh_cursor_survives_decode_at() {
        let token = encode(SortKey::CreatedAt, &SortValue::Int(42), Uuid::new_v4());
        let later = Utc::now() + Duration::hours(23);
        assert!(decode_at(&token, later).is_some());
    }

    #[test]
    fn test_malformed_tokens_decode_to_none() {
        assert!(decode("").is_none());
        assert!(decode("not base64 at all!!!").is_none());
        assert!(decode(&URL_SAFE_NO_PAD.encode(b"{\"v\":1}")).is_none());
        assert!(decode(&URL_SAFE_NO_PAD.encode(b"garbage")).is_none());
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let json = format!(
            "{{\"v\":9,\"s\":\"price\",\"lv\":\"1\",\"li\":\"{}\",\"ts\":{}}}",
            Uuid::new_v4(),
            Utc::now().timestamp()
        );
        let token = URL_SAFE_NO_PAD.encode(json.as_bytes());
        assert!(decode(&token).is_none());
    }

    #[test]
    fn test_unknown_sort_key_is_rejected() {
        let json = format!(
            "{{\"v\":1,\"s\":\"rating\",\"lv\":\"1\",\"li\":\"{}\",\"ts\":{}}}",
            Uuid::new_v4(),
            Utc::now().timestamp()
        );
        let token = URL_SAFE_NO_PAD.encode(json.as_bytes());
        assert!(decode(&token).is_none());
    }
}
