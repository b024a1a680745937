/// Backend primary keys (lecturers, catalog entries, evidence rows).
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
