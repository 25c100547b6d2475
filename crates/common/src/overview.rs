//! Overview generation
//!
//! Regenerates the cached overall/positive/negative summaries of a bill,
//! or of one section of it:
//! 1. fetch the matching comments
//! 2. partition their text into sentiment buckets
//! 3. ask the ML service for one group summary per requested bucket
//! 4. write the generated text back to `documents`
//!
//! A bucket whose summary call fails keeps its stored value.

use crate::catalog::{Bill, Section};
use crate::db::models::OverviewSource;
use crate::db::Repository;
use crate::errors::{AppError, Result};
use crate::metrics::record_overview;
use crate::ml::MlClient;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

/// Which cached summary to regenerate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverviewKind {
    Overall,
    Positive,
    Negative,
}

impl FromStr for OverviewKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "overall" => Ok(OverviewKind::Overall),
            "positive" => Ok(OverviewKind::Positive),
            "negative" => Ok(OverviewKind::Negative),
            other => Err(AppError::Validation {
                message: "Invalid overview type".to_string(),
                field: Some(format!("type={}", other)),
            }),
        }
    }
}

/// Comment texts partitioned for summarization
#[derive(Debug, Default, PartialEq)]
pub struct Buckets {
    pub overall: Vec<String>,
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

impl Buckets {
    /// Every comment contributes its summary, or its raw text when it has
    /// none, to `overall`; positive and negative comments also land in their
    /// own bucket. Comments without any text are skipped.
    pub fn partition(sources: &[OverviewSource]) -> Self {
        let mut buckets = Self::default();

        for source in sources {
            let text = [&source.summary, &source.comment_data]
                .into_iter()
                .flatten()
                .find(|text| !text.is_empty());

            let Some(text) = text else { continue };

            buckets.overall.push(text.clone());
            match source.sentiment.as_deref().map(str::to_lowercase).as_deref() {
                Some("positive") => buckets.positive.push(text.clone()),
                Some("negative") => buckets.negative.push(text.clone()),
                _ => {}
            }
        }

        buckets
    }

    fn get(&self, kind: OverviewKind) -> &[String] {
        match kind {
            OverviewKind::Overall => &self.overall,
            OverviewKind::Positive => &self.positive,
            OverviewKind::Negative => &self.negative,
        }
    }
}

/// Newly generated summaries; `None` where nothing was generated
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeneratedOverview {
    pub overall: Option<String>,
    pub positive: Option<String>,
    pub negative: Option<String>,
}

impl GeneratedOverview {
    fn set(&mut self, kind: OverviewKind, text: Option<String>) {
        match kind {
            OverviewKind::Overall => self.overall = text,
            OverviewKind::Positive => self.positive = text,
            OverviewKind::Negative => self.negative = text,
        }
    }
}

/// Result of a regeneration request
#[derive(Debug, PartialEq)]
pub enum OverviewOutcome {
    /// No comment matched; nothing was written
    NoComments,
    Generated(GeneratedOverview),
}

/// Serializes regenerations of the same bill and section within this
/// process, so concurrent requests cannot interleave their writes.
#[derive(Default)]
pub struct OverviewLocks {
    locks: Mutex<HashMap<(Bill, Option<Section>), Arc<Mutex<()>>>>,
}

impl OverviewLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one bill/section target
    pub async fn acquire(&self, bill: Bill, section: Option<Section>) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry((bill, section)).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// Overview regeneration service
#[derive(Clone)]
pub struct OverviewGenerator {
    repo: Repository,
    ml: Arc<dyn MlClient>,
    locks: Arc<OverviewLocks>,
}

impl OverviewGenerator {
    pub fn new(repo: Repository, ml: Arc<dyn MlClient>, locks: Arc<OverviewLocks>) -> Self {
        Self { repo, ml, locks }
    }

    /// Regenerate the requested summaries (all three when `kind` is `None`)
    pub async fn generate(
        &self,
        bill: Bill,
        kind: Option<OverviewKind>,
        section: Option<Section>,
    ) -> Result<OverviewOutcome> {
        let start = Instant::now();
        let _guard = self.locks.acquire(bill, section).await;

        let sources = self.repo.overview_sources(bill, section).await?;
        if sources.is_empty() {
            info!(bill = %bill, section = ?section, "No comments to summarize");
            return Ok(OverviewOutcome::NoComments);
        }

        let buckets = Buckets::partition(&sources);
        let kinds = match kind {
            Some(kind) => vec![kind],
            None => vec![OverviewKind::Overall, OverviewKind::Positive, OverviewKind::Negative],
        };

        let mut generated = GeneratedOverview::default();
        for kind in kinds {
            let text = self.summarize_bucket(bill, kind, buckets.get(kind)).await;
            generated.set(kind, text);
        }

        let scope = match section {
            Some(section) => {
                let written = self
                    .repo
                    .update_section_overview(bill, section, &generated)
                    .await?;
                if !written {
                    warn!(bill = %bill, section = %section, "No section summary generated, nothing stored");
                }
                section.label()
            }
            None => {
                self.repo.update_global_overview(bill, &generated).await?;
                "global"
            }
        };

        record_overview(bill.key(), scope, start.elapsed().as_secs_f64());
        info!(
            bill = %bill,
            scope = scope,
            comments = sources.len(),
            overall = generated.overall.is_some(),
            positive = generated.positive.is_some(),
            negative = generated.negative.is_some(),
            "Overview regenerated"
        );

        Ok(OverviewOutcome::Generated(generated))
    }

    async fn summarize_bucket(&self, bill: Bill, kind: OverviewKind, texts: &[String]) -> Option<String> {
        if texts.is_empty() {
            return None;
        }

        match self.ml.summarize_group(texts).await {
            Ok(summary) => summary.filter(|text| !text.is_empty()),
            Err(e) => {
                warn!(bill = %bill, kind = ?kind, error = %e, "Group summary failed, keeping stored value");
                None
            }
        }
    }
}
