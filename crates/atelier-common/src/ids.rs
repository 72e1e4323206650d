//! ID generation.
//!
//! All rows are keyed by UUID v7 — globally unique, time-sortable, generated
//! without coordination. Chronological ordering of IDs matches insertion
//! order, which the activity ledger and message feed rely on as a tiebreaker.

use uuid::Uuid;

/// Generate a new time-sortable ID using UUID v7.
pub fn generate_id() -> Uuid {
    Uuid::now_v7()
}

/// Extract the approximate creation timestamp from a UUID v7.
pub fn extract_timestamp(id: Uuid) -> Option<chrono::DateTime<chrono::Utc>> {
    let bytes = id.as_bytes();
    // UUID v7: first 48 bits are millisecond timestamp
    let ms = ((bytes[0] as u64) << 40)
        | ((bytes[1] as u64) << 32)
        | ((bytes[2] as u64) << 24)
        | ((bytes[3] as u64) << 16)
        | ((bytes[4] as u64) << 8)
        | (bytes[5] as u64);

    chrono::DateTime::from_timestamp_millis(ms as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique_ids() {
        let id1 = generate_id();
        let id2 = generate_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_ids_are_time_sortable() {
        let id1 = generate_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = generate_id();
        // UUID v7 IDs should sort chronologically
        assert!(id1 < id2);
    }

    #[test]
    fn test_extract_timestamp() {
        let before = chrono::Utc::now();
        let id = generate_id();
        let after = chrono::Utc::now();

        let extracted = extract_timestamp(id).expect("should extract timestamp");
        assert!(extracted >= before - chrono::Duration::milliseconds(1));
        assert!(extracted <= after + chrono::Duration::milliseconds(1));
    }
}
