//! API handlers module

pub mod analytics;
pub mod comments;
pub mod consultations;
pub mod health;
pub mod minister;
pub mod overview;

use axum::{extract::rejection::JsonRejection, Json};
use econsult_common::{
    errors::{AppError, Result},
    Bill,
};
use serde::Deserialize;

/// `?limit=N` query. Missing, zero or unparsable values fall back to the
/// endpoint's default.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<String>,
}

impl LimitQuery {
    pub fn limit_or(&self, default: u64) -> u64 {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(default)
    }
}

/// Resolve the `{bill}` path segment
pub fn parse_bill(raw: &str) -> Result<Bill> {
    raw.parse()
}

/// Unwrap a JSON body, turning extractor rejections into envelope errors
pub fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload.map(|Json(body)| body).map_err(|rejection| AppError::InvalidFormat {
        message: rejection.body_text(),
    })
}

/// Treat blank strings like absent ones
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(limit: Option<&str>) -> LimitQuery {
        LimitQuery {
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn test_limit_defaults() {
        assert_eq!(query(None).limit_or(10), 10);
        assert_eq!(query(Some("25")).limit_or(10), 25);
        assert_eq!(query(Some("0")).limit_or(10), 10);
        assert_eq!(query(Some("ten")).limit_or(10), 10);
        assert_eq!(query(Some("-3")).limit_or(5), 5);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(Some("NGO".into())).as_deref(), Some("NGO"));
    }
}
