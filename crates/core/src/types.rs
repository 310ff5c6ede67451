/// Petition and signature identifiers are opaque strings.
pub type EntityId = String;

/// All timestamps are milliseconds since the Unix epoch (UTC).
pub type EpochMillis = i64;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> EpochMillis {
    chrono::Utc::now().timestamp_millis()
}
