//! Document entity
//!
//! One row per bill holding the cached overview text.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub document_id: i32,

    /// Overall summary of every comment on the bill
    #[sea_orm(column_type = "Text", nullable)]
    pub summary: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub positive_summary: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub negative_summary: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub section_1_summary: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub section_2_summary: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub section_3_summary: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub section1_positive: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub section1_negative: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub section2_positive: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub section2_negative: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub section3_positive: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub section3_negative: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Stored text counts as absent when empty
fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|text| !text.is_empty()).cloned()
}

impl Model {
    /// Overall, positive and negative summary of the whole bill
    pub fn overview(&self) -> (Option<String>, Option<String>, Option<String>) {
        (
            non_empty(&self.summary),
            non_empty(&self.positive_summary),
            non_empty(&self.negative_summary),
        )
    }

    /// Overall summary of each section, in section order
    pub fn section_summaries(&self) -> [Option<String>; 3] {
        [
            non_empty(&self.section_1_summary),
            non_empty(&self.section_2_summary),
            non_empty(&self.section_3_summary),
        ]
    }

    /// Positive and negative summary of each section, in section order
    pub fn section_sentiments(&self) -> [(Option<String>, Option<String>); 3] {
        [
            (non_empty(&self.section1_positive), non_empty(&self.section1_negative)),
            (non_empty(&self.section2_positive), non_empty(&self.section2_negative)),
            (non_empty(&self.section3_positive), non_empty(&self.section3_negative)),
        ]
    }
}
