use serde::{Deserialize, Serialize};

use crate::driver::{QueryResult, Row};

fn affected(result: &QueryResult) -> u64 {
    result
        .num_affected_rows
        .unwrap_or(result.rows.len() as u64)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsertResult {
    /// Id of the last inserted row. Only MySQL and SQLite report one.
    pub insert_id: Option<i64>,
    /// Inserted rows, plus rows touched by `on conflict` / `on duplicate key`.
    pub num_inserted_or_updated_rows: Option<u64>,
    /// Rows of the `returning` clause.
    pub rows: Vec<Row>,
}

impl From<QueryResult> for InsertResult {
    fn from(result: QueryResult) -> Self {
        Self {
            insert_id: result.insert_id,
            num_inserted_or_updated_rows: result.num_affected_rows,
            rows: result.rows,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateResult {
    pub num_updated_rows: u64,
    /// Rows whose values actually changed, where the driver reports it.
    pub num_changed_rows: Option<u64>,
    pub rows: Vec<Row>,
}

impl From<QueryResult> for UpdateResult {
    fn from(result: QueryResult) -> Self {
        Self {
            num_updated_rows: affected(&result),
            num_changed_rows: result.num_changed_rows,
            rows: result.rows,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteResult {
    pub num_deleted_rows: u64,
    pub rows: Vec<Row>,
}

impl From<QueryResult> for DeleteResult {
    fn from(result: QueryResult) -> Self {
        Self {
            num_deleted_rows: affected(&result),
            rows: result.rows,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeResult {
    pub num_changed_rows: Option<u64>,
}

impl From<QueryResult> for MergeResult {
    fn from(result: QueryResult) -> Self {
        Self {
            num_changed_rows: result.num_affected_rows,
        }
    }
}
