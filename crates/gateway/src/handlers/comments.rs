//! Comment handlers
//!
//! Listing, the analyst-side add endpoint, the public submission form and
//! comment edits.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use econsult_common::{
    db::CommentRecord,
    errors::{ApiResponse, AppError, Result},
    intake::{Channel, CommentDraft, Commenter},
    Bill,
};
use serde::Deserialize;
use validator::Validate;

use super::{json_body, non_empty, parse_bill, LimitQuery};
use crate::AppState;

const DEFAULT_LIST_LIMIT: u64 = 1000;

/// Body of `POST /api/comments/{bill}`
#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub commenter_name: Option<String>,
    pub comment_data: Option<String>,
    pub stakeholder_type: Option<String>,
}

/// Body of `POST /api/submit-comment`
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitCommentRequest {
    pub document_id: Option<DocumentId>,
    pub section: Option<String>,
    pub comment_data: Option<String>,
    pub sentiment: Option<String>,
    pub summary: Option<String>,
    pub commenter_name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub commenter_email: Option<String>,
    pub commenter_phone: Option<String>,
    pub commenter_address: Option<String>,
    pub id_type: Option<String>,
    pub id_number: Option<String>,
    pub stakeholder_type: Option<String>,
    pub supported_doc_filename: Option<String>,
    /// Base64 encoded supporting document
    pub supported_doc_data: Option<String>,
}

/// Forms send the document id either as a number or as a string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    Number(i64),
    Text(String),
}

impl DocumentId {
    fn bill(&self) -> Option<Bill> {
        let id = match self {
            DocumentId::Number(id) => *id,
            DocumentId::Text(raw) => raw.trim().parse().ok()?,
        };
        Bill::from_document_id(id)
    }
}

/// Body of `PUT /api/comments/{bill}/{id}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentRequest {
    #[serde(alias = "comment_data")]
    pub comment_data: Option<String>,
    pub sentiment: Option<String>,
    pub summary: Option<String>,
}

/// List a bill's comments, newest first
pub async fn list_comments(
    State(state): State<AppState>,
    Path(bill): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<ApiResponse<Vec<CommentRecord>>> {
    let bill = parse_bill(&bill)?;
    let comments = state
        .repo()
        .list_comments(bill, query.limit_or(DEFAULT_LIST_LIMIT))
        .await?;

    Ok(ApiResponse::success(comments))
}

/// Add a comment from the analyst dashboard
pub async fn add_comment(
    State(state): State<AppState>,
    Path(bill): Path<String>,
    payload: std::result::Result<Json<AddCommentRequest>, JsonRejection>,
) -> Result<(StatusCode, ApiResponse<CommentRecord>)> {
    let bill = parse_bill(&bill)?;
    let request = json_body(payload)?;

    let commenter_name = non_empty(request.commenter_name);
    let comment_data = request.comment_data.unwrap_or_default();

    let mut missing = Vec::new();
    if commenter_name.is_none() {
        missing.push("commenter_name".to_string());
    }
    if comment_data.is_empty() {
        missing.push("comment_data".to_string());
    }
    if !missing.is_empty() {
        return Err(AppError::MissingFields { fields: missing });
    }

    let draft = CommentDraft {
        comment_data,
        stakeholder_type: request.stakeholder_type,
        commenter: Commenter {
            name: commenter_name,
            ..Default::default()
        },
        ..Default::default()
    };

    let record = state.intake().submit(bill, Channel::Analyst, draft).await?;
    Ok((StatusCode::CREATED, ApiResponse::success(record)))
}

/// Public submission from the citizen-facing form
pub async fn submit_comment(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SubmitCommentRequest>, JsonRejection>,
) -> Result<(StatusCode, ApiResponse<CommentRecord>)> {
    let mut request = json_body(payload)?;

    let comment_data = request.comment_data.take().unwrap_or_default();
    let mut missing = Vec::new();
    if request.document_id.is_none() {
        missing.push("documentId".to_string());
    }
    if comment_data.is_empty() {
        missing.push("commentData".to_string());
    }
    if !missing.is_empty() {
        return Err(AppError::MissingFields { fields: missing });
    }

    let bill = request
        .document_id
        .as_ref()
        .and_then(DocumentId::bill)
        .ok_or_else(|| AppError::Validation {
            message: "Invalid Document ID".to_string(),
            field: Some("documentId".to_string()),
        })?;

    request.commenter_email = non_empty(request.commenter_email.take());
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("commenterEmail".to_string()),
    })?;

    let draft = CommentDraft {
        comment_data,
        section: request.section,
        sentiment: request.sentiment,
        summary: request.summary,
        stakeholder_type: request.stakeholder_type,
        commenter: Commenter {
            name: request.commenter_name,
            email: request.commenter_email,
            phone: request.commenter_phone,
            address: request.commenter_address,
            id_type: request.id_type,
            id_number: request.id_number,
        },
        supported_doc: request.supported_doc_data,
        supported_doc_filename: request.supported_doc_filename,
    };

    let record = state.intake().submit(bill, Channel::Public, draft).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::success(record).with_message("Comment submitted successfully"),
    ))
}

/// Edit a stored comment
pub async fn update_comment(
    State(state): State<AppState>,
    Path((bill, id)): Path<(String, String)>,
    payload: std::result::Result<Json<UpdateCommentRequest>, JsonRejection>,
) -> Result<ApiResponse<CommentRecord>> {
    let bill = parse_bill(&bill)?;
    let id: i32 = id.parse().map_err(|_| AppError::InvalidFormat {
        message: "comment id must be an integer".to_string(),
    })?;
    let request = json_body(payload)?;

    let comment_data = request.comment_data.unwrap_or_default();
    if comment_data.is_empty() {
        return Err(AppError::MissingFields {
            fields: vec!["commentData".to_string()],
        });
    }

    let record = state
        .intake()
        .update(bill, id, comment_data, request.sentiment, request.summary)
        .await?;

    Ok(ApiResponse::success(record).with_message("Comment updated successfully"))
}
