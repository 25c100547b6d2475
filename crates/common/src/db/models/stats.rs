//! Aggregate query rows

use sea_orm::FromQueryResult;
use serde::Serialize;

/// One `GROUP BY` bucket: a label (sentiment or stakeholder type) and its size
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct LabelCount {
    pub label: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, FromQueryResult)]
pub(crate) struct CountRow {
    pub count: i64,
}
