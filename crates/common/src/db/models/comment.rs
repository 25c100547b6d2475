//! Comment rows
//!
//! The three per-bill comment tables share one layout, so rows are read
//! through raw statements instead of one entity per table.

use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::FromQueryResult;
use serde::Serialize;

/// Column list selected for full comment rows. The supporting document
/// payload is never returned in listings.
pub const COMMENT_COLUMNS: &str = "comments_id, document_id, section, comment_data, sentiment, \
     summary, confidence_score, stakeholder_type, commenter_name, commenter_email, \
     commenter_phone, commenter_address, id_type, id_number, supported_doc_filename, \
     created_at, updated_at";

/// A stored comment
#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize)]
pub struct CommentRecord {
    pub comments_id: i32,
    pub document_id: i32,
    pub section: Option<String>,
    pub comment_data: String,
    pub sentiment: String,
    pub summary: Option<String>,
    pub confidence_score: Option<f64>,
    pub stakeholder_type: Option<String>,
    pub commenter_name: Option<String>,
    pub commenter_email: Option<String>,
    pub commenter_phone: Option<String>,
    pub commenter_address: Option<String>,
    pub id_type: Option<String>,
    pub id_number: Option<String>,
    pub supported_doc_filename: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

/// Values for a new comment row
#[derive(Debug, Clone, Default)]
pub struct NewComment {
    pub section: Option<String>,
    pub comment_data: String,
    pub sentiment: String,
    pub summary: Option<String>,
    pub confidence_score: f64,
    pub stakeholder_type: String,
    pub commenter_name: Option<String>,
    pub commenter_email: Option<String>,
    pub commenter_phone: Option<String>,
    pub commenter_address: Option<String>,
    pub id_type: Option<String>,
    pub id_number: Option<String>,
    /// Base64 payload of the supporting document
    pub supported_doc: Option<String>,
    pub supported_doc_filename: Option<String>,
}

/// Editable fields of an existing comment
#[derive(Debug, Clone)]
pub struct CommentUpdate {
    pub comment_data: String,
    pub sentiment: String,
    pub summary: Option<String>,
}

/// Row of the cross-bill activity feed
#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize)]
pub struct ActivityRecord {
    pub bill: String,
    pub id: i32,
    pub commenter_name: Option<String>,
    pub comment_data: String,
    pub sentiment: String,
    pub stakeholder_type: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

/// Comment ranked on the Minister view
#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize)]
pub struct TopComment {
    pub comments_id: i32,
    pub commenter_name: Option<String>,
    pub comment_data: String,
    pub sentiment: String,
    pub stakeholder_type: Option<String>,
    pub confidence_score: Option<f64>,
    pub summary: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub bill_key: String,
}

/// The fields overview generation reads from each comment
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct OverviewSource {
    pub comment_data: Option<String>,
    pub summary: Option<String>,
    pub sentiment: Option<String>,
}
