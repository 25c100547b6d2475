//! Analyst dashboard handlers: per-bill aggregates, cached summaries and
//! the cross-bill activity feed

use axum::extract::{Path, Query, State};
use econsult_common::{
    db::models::ActivityRecord,
    errors::{ApiResponse, Result},
};
use serde::Serialize;

use super::{parse_bill, LimitQuery};
use crate::AppState;

const DEFAULT_ACTIVITY_LIMIT: u64 = 10;

#[derive(Debug, Serialize)]
pub struct SentimentCount {
    pub sentiment: Option<String>,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct StakeholderCount {
    pub stakeholder_type: Option<String>,
    pub count: i64,
}

#[derive(Debug, Default, Serialize)]
pub struct SummariesResponse {
    pub overall_summary: Option<String>,
    pub positive_summary: Option<String>,
    pub negative_summary: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct SectionsResponse {
    pub section_1: Option<String>,
    pub section_2: Option<String>,
    pub section_3: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SentimentPair {
    pub positive: Option<String>,
    pub negative: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SectionSentimentsResponse {
    pub section1: SentimentPair,
    pub section2: SentimentPair,
    pub section3: SentimentPair,
}

/// Latest comments across every bill
pub async fn recent_activity(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<ApiResponse<Vec<ActivityRecord>>> {
    let rows = state
        .repo()
        .recent_activity(query.limit_or(DEFAULT_ACTIVITY_LIMIT))
        .await?;
    Ok(ApiResponse::success(rows))
}

/// Comment count per stored sentiment label
pub async fn sentiment(
    State(state): State<AppState>,
    Path(bill): Path<String>,
) -> Result<ApiResponse<Vec<SentimentCount>>> {
    let bill = parse_bill(&bill)?;
    let counts = state
        .repo()
        .sentiment_counts(bill)
        .await?
        .into_iter()
        .map(|row| SentimentCount {
            sentiment: row.label,
            count: row.count,
        })
        .collect();

    Ok(ApiResponse::success(counts))
}

/// Comment count per stakeholder type
pub async fn stakeholders(
    State(state): State<AppState>,
    Path(bill): Path<String>,
) -> Result<ApiResponse<Vec<StakeholderCount>>> {
    let bill = parse_bill(&bill)?;
    let counts = state
        .repo()
        .stakeholder_counts(bill)
        .await?
        .into_iter()
        .map(|row| StakeholderCount {
            stakeholder_type: row.label,
            count: row.count,
        })
        .collect();

    Ok(ApiResponse::success(counts))
}

/// Cached bill-wide overview
pub async fn summaries(
    State(state): State<AppState>,
    Path(bill): Path<String>,
) -> Result<ApiResponse<SummariesResponse>> {
    let bill = parse_bill(&bill)?;
    let response = match state.repo().find_document(bill).await? {
        Some(document) => {
            let (overall, positive, negative) = document.overview();
            SummariesResponse {
                overall_summary: overall,
                positive_summary: positive,
                negative_summary: negative,
            }
        }
        None => SummariesResponse::default(),
    };

    Ok(ApiResponse::success(response))
}

/// Cached overall summary of each section
pub async fn sections(
    State(state): State<AppState>,
    Path(bill): Path<String>,
) -> Result<ApiResponse<SectionsResponse>> {
    let bill = parse_bill(&bill)?;
    let response = match state.repo().find_document(bill).await? {
        Some(document) => {
            let [section_1, section_2, section_3] = document.section_summaries();
            SectionsResponse {
                section_1,
                section_2,
                section_3,
            }
        }
        None => SectionsResponse::default(),
    };

    Ok(ApiResponse::success(response))
}

/// Cached positive/negative summaries of each section; `null` when the
/// bill has no document row
pub async fn section_sentiments(
    State(state): State<AppState>,
    Path(bill): Path<String>,
) -> Result<ApiResponse<Option<SectionSentimentsResponse>>> {
    let bill = parse_bill(&bill)?;
    let response = state.repo().find_document(bill).await?.map(|document| {
        let [s1, s2, s3] = document.section_sentiments().map(|(positive, negative)| SentimentPair {
            positive,
            negative,
        });
        SectionSentimentsResponse {
            section1: s1,
            section2: s2,
            section3: s3,
        }
    });

    Ok(ApiResponse::success(response))
}
