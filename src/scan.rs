//! Scan payload embedded in a card's QR symbol.
//!
//! The payload is the whole record, so a scanner can rebuild the student's
//! data without any network lookup.

use qrcode::{EcLevel, QrCode};

use crate::record::StudentRecord;

/// Error correction level of the printed scan code.
pub(crate) const SCAN_EC_LEVEL: EcLevel = EcLevel::M;

/// Compact JSON of every record field in declaration order.
///
/// Equal records always produce byte-identical payloads.
pub fn encode_for_scan(record: &StudentRecord) -> String {
    // StudentRecord only holds strings, so serialization cannot fail.
    serde_json::to_string(record).unwrap_or_default()
}

/// Whether `payload` fits in a single scan code symbol.
pub fn fits_scan_code(payload: &str) -> bool {
    QrCode::with_error_correction_level(payload.as_bytes(), SCAN_EC_LEVEL).is_ok()
}

/// Rebuild a record from a scanned payload.
pub fn decode_scan(payload: &str) -> serde_json::Result<StudentRecord> {
    serde_json::from_str(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record() -> StudentRecord {
        StudentRecord {
            name: "Jane Doe".into(),
            roll_number: "U2022001".into(),
            class_division: "Class 1-A".into(),
            allergies: vec!["Nuts".into(), "Eggs".into()],
            photo: None,
            rack_number: "R-42".into(),
            bus_route: "Route 1".into(),
            created_at: "2024-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn payload_has_fixed_key_order() {
        assert_eq!(
            encode_for_scan(&record()),
            r#"{"name":"Jane Doe","rollNumber":"U2022001","classDivision":"Class 1-A","allergies":["Nuts","Eggs"],"rackNumber":"R-42","busRoute":"Route 1","createdAt":"2024-01-01T00:00:00Z"}"#
        );
    }

    #[test]
    fn payload_carries_photo_when_present() {
        let mut rec = record();
        rec.photo = Some("data:image/png;base64,AAAA".into());
        let payload = encode_for_scan(&rec);
        assert!(payload.contains(r#""photo":"data:image/png;base64,AAAA""#));
        assert_eq!(decode_scan(&payload).unwrap(), rec);
    }

    #[test]
    fn symbol_capacity_bounds_the_payload() {
        assert!(fits_scan_code(&encode_for_scan(&record())));
        assert!(!fits_scan_code(&"x".repeat(2400)));
    }
}
