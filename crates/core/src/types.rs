/// All API identifiers are integers.
pub type DbId = i64;

/// All instants are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
