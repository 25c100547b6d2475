//! Overview regeneration handler

use axum::{
    body::Bytes,
    extract::{Path, State},
};
use econsult_common::{
    errors::{ApiResponse, AppError, Result},
    overview::{GeneratedOverview, OverviewKind, OverviewOutcome},
    Section,
};
use serde::Deserialize;

use super::{non_empty, parse_bill};
use crate::AppState;

/// Body of `POST /api/generate-overview/{bill}`; both fields optional
#[derive(Debug, Default, Deserialize)]
pub struct GenerateOverviewRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub section: Option<String>,
}

impl GenerateOverviewRequest {
    /// An empty body means "everything, bill-wide"
    fn from_body(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| AppError::InvalidFormat {
            message: e.to_string(),
        })
    }
}

/// Regenerate cached summaries for a bill or one of its sections
pub async fn generate_overview(
    State(state): State<AppState>,
    Path(bill): Path<String>,
    body: Bytes,
) -> Result<ApiResponse<GeneratedOverview>> {
    let bill = parse_bill(&bill)?;
    let request = GenerateOverviewRequest::from_body(&body)?;

    // Validate everything before any ML call is made
    let kind = non_empty(request.kind)
        .map(|kind| kind.parse::<OverviewKind>())
        .transpose()?;
    let section = non_empty(request.section)
        .map(|section| section.parse::<Section>())
        .transpose()?;

    match state.overview().generate(bill, kind, section).await? {
        OverviewOutcome::NoComments => Ok(ApiResponse::message("No comments to summarize.")),
        OverviewOutcome::Generated(generated) => Ok(ApiResponse::success(generated)),
    }
}
