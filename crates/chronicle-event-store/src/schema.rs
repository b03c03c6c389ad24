//! SQL statements over the `domain_events` and `readmodels` tables.
//!
//! The tables themselves are created by the workspace `migrations/`.

/// Appends one event record.
pub const INSERT_EVENT: &str = r"
INSERT INTO domain_events (aggregate_id, event_type, event_data, occurred_on)
VALUES ($1, $2, $3, $4)
";

/// Selects the stream of one aggregate. Records written at the same instant
/// keep their insertion order.
pub const SELECT_STREAM: &str = r"
SELECT event_type, event_data
FROM domain_events
WHERE aggregate_id = $1
ORDER BY occurred_on ASC, id ASC
";

/// Inserts a readmodel, or replaces the one stored under the same key.
pub const UPSERT_READMODEL: &str = r"
INSERT INTO readmodels (aggregate_id, readmodel_type, readmodel_data)
VALUES ($1, $2, $3)
ON CONFLICT (aggregate_id) DO UPDATE
SET readmodel_type = EXCLUDED.readmodel_type,
    readmodel_data = EXCLUDED.readmodel_data
";

/// Selects one readmodel.
pub const SELECT_READMODEL: &str = r"
SELECT readmodel_type, readmodel_data
FROM readmodels
WHERE aggregate_id = $1
";

/// Deletes one readmodel.
pub const DELETE_READMODEL: &str = r"
DELETE FROM readmodels
WHERE aggregate_id = $1
";
