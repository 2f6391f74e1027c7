use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One stored scan. Rows are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: i64,
    pub full_name: String,
    pub age: i64,
    pub gender: String,
    pub contact: Option<String>,
    pub scanned_at: DateTime<Utc>,
    pub result_json: String,
    pub primary_class: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewScan {
    pub full_name: String,
    pub age: i64,
    pub gender: String,
    pub contact: Option<String>,
    pub scanned_at: DateTime<Utc>,
    pub result_json: String,
    pub primary_class: Option<String>,
}

/// Fixed-width ISO-8601 UTC so that text ordering matches time ordering.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Empty or whitespace-only contacts are stored as NULL and never matched.
pub fn normalize_contact(contact: Option<&str>) -> Option<String> {
    contact
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn format_timestamp_uses_z_suffix_and_micros() {
        let dt = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(format_timestamp(&dt), "2025-03-04T05:06:07.000000Z");
    }

    #[test]
    fn normalize_contact_drops_blank_values() {
        assert_eq!(normalize_contact(None), None);
        assert_eq!(normalize_contact(Some("   ")), None);
        assert_eq!(
            normalize_contact(Some(" jane@example.org ")),
            Some("jane@example.org".to_string())
        );
    }
}
