//! Minister executive view
//!
//! Cross-bill totals, the highest-confidence comments and a per-consultation
//! digest. Aggregation itself lives in `econsult_common::analytics`.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use econsult_common::{
    analytics::{
        executive_summary, rank_top_comments, stakeholder_breakdown, Sentiment,
        SentimentDistribution, SentimentPercentages,
    },
    catalog::ConsultationStatus,
    db::{models::TopComment, LabelCount},
    errors::{ApiResponse, Result},
    Bill,
};
use futures::future::try_join_all;
use serde::Serialize;

use super::{parse_bill, LimitQuery};
use crate::AppState;

const DEFAULT_TOP_COMMENTS: u64 = 5;

#[derive(Debug, Serialize)]
pub struct ConsultationRef {
    pub id: i32,
    pub title: &'static str,
    pub status: ConsultationStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_submissions: i64,
    pub active_consultations: usize,
    pub completed_consultations: usize,
    pub overall_sentiment: SentimentDistribution,
    pub sentiment_percentages: SentimentPercentages,
    pub stakeholder_breakdown: BTreeMap<String, i64>,
    pub executive_summary: String,
    pub consultations: Vec<ConsultationRef>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationDigest {
    pub submission_count: i64,
    pub sentiment_distribution: SentimentDistribution,
    pub dominant_sentiment: Sentiment,
    pub dominant_percentage: f64,
    pub overall_summary: Option<String>,
}

/// Totals and sentiment across every consultation
pub async fn dashboard_summary(State(state): State<AppState>) -> Result<ApiResponse<DashboardSummary>> {
    let repo = state.repo();

    let mut total_submissions = 0;
    let mut overall = SentimentDistribution::default();
    let mut stakeholder_rows: Vec<LabelCount> = Vec::new();

    for bill in Bill::ALL {
        total_submissions += repo.count_comments(bill).await?;
        overall.absorb(&repo.sentiment_counts(bill).await?);
        stakeholder_rows.extend(repo.stakeholder_counts(bill).await?);
    }

    let active = Bill::ALL
        .iter()
        .filter(|bill| bill.info().status == ConsultationStatus::InProgress)
        .count();

    let consultations = Bill::ALL
        .into_iter()
        .map(|bill| {
            let info = bill.info();
            ConsultationRef {
                id: bill.document_id(),
                title: info.title,
                status: info.status,
            }
        })
        .collect();

    Ok(ApiResponse::success(DashboardSummary {
        total_submissions,
        active_consultations: active,
        completed_consultations: Bill::ALL.len() - active,
        overall_sentiment: overall,
        sentiment_percentages: overall.percentages(),
        stakeholder_breakdown: stakeholder_breakdown(&stakeholder_rows),
        executive_summary: executive_summary(active, total_submissions, &overall),
        consultations,
    }))
}

/// Highest-confidence comments across all bills
pub async fn top_comments(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<ApiResponse<Vec<TopComment>>> {
    let limit = query.limit_or(DEFAULT_TOP_COMMENTS);
    let per_bill = limit.div_ceil(Bill::ALL.len() as u64);
    let repo = state.repo();

    let lists = try_join_all(Bill::ALL.map(|bill| repo.top_comments(bill, per_bill))).await?;

    Ok(ApiResponse::success(rank_top_comments(
        lists,
        usize::try_from(limit).unwrap_or(usize::MAX),
    )))
}

/// Digest of a single consultation
pub async fn consultation(
    State(state): State<AppState>,
    Path(bill): Path<String>,
) -> Result<ApiResponse<ConsultationDigest>> {
    let bill = parse_bill(&bill)?;
    let repo = state.repo();

    let submission_count = repo.count_comments(bill).await?;
    let distribution = SentimentDistribution::from_counts(&repo.sentiment_counts(bill).await?);
    let overall_summary = repo
        .find_document(bill)
        .await?
        .and_then(|document| document.overview().0);

    let dominant = distribution.dominant();
    Ok(ApiResponse::success(ConsultationDigest {
        submission_count,
        sentiment_distribution: distribution,
        dominant_sentiment: dominant,
        dominant_percentage: distribution.percentage(dominant),
        overall_summary,
    }))
}
