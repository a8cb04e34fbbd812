/// Widget identifiers are opaque strings assigned by the persistence layer.
pub type WidgetId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
