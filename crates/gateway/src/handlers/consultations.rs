//! Consultation catalog handler

use axum::extract::State;
use econsult_common::{
    catalog::ConsultationStatus,
    errors::{ApiResponse, Result},
    Bill,
};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationSummary {
    pub id: i32,
    pub bill: &'static str,
    pub title: &'static str,
    pub status: ConsultationStatus,
    pub submissions: i64,
    pub end_date: &'static str,
    pub description: &'static str,
    pub publish_date: &'static str,
}

/// Every consultation with its submission count. A bill whose count cannot
/// be read is reported with zero submissions.
pub async fn list_consultations(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<ConsultationSummary>>> {
    let repo = state.repo();
    let mut consultations = Vec::with_capacity(Bill::ALL.len());

    for bill in Bill::ALL {
        let submissions = match repo.count_comments(bill).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(bill = %bill, error = %e, "Could not count submissions");
                0
            }
        };

        let info = bill.info();
        consultations.push(ConsultationSummary {
            id: bill.document_id(),
            bill: bill.key(),
            title: info.title,
            status: info.status,
            submissions,
            end_date: info.end_date,
            description: info.description,
            publish_date: info.publish_date,
        });
    }

    Ok(ApiResponse::success(consultations))
}
