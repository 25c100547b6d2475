//! Bill and section catalog
//!
//! The platform hosts a closed set of three consultations. Every table and
//! column name interpolated into SQL comes from this module, never from
//! request input.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;

/// A draft bill open (or closed) for consultation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Bill {
    #[serde(rename = "bill_1")]
    Bill1,
    #[serde(rename = "bill_2")]
    Bill2,
    #[serde(rename = "bill_3")]
    Bill3,
}

/// Consultation lifecycle as shown on the dashboards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsultationStatus {
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

/// Static metadata of a consultation
#[derive(Debug, Clone, Copy)]
pub struct ConsultationInfo {
    pub title: &'static str,
    pub status: ConsultationStatus,
    pub description: &'static str,
    pub publish_date: &'static str,
    pub end_date: &'static str,
}

impl Bill {
    pub const ALL: [Bill; 3] = [Bill::Bill1, Bill::Bill2, Bill::Bill3];

    /// Route key, e.g. `bill_1`
    pub fn key(self) -> &'static str {
        match self {
            Bill::Bill1 => "bill_1",
            Bill::Bill2 => "bill_2",
            Bill::Bill3 => "bill_3",
        }
    }

    /// Row id in the `documents` table
    pub fn document_id(self) -> i32 {
        match self {
            Bill::Bill1 => 1,
            Bill::Bill2 => 2,
            Bill::Bill3 => 3,
        }
    }

    /// Comment table holding this bill's submissions
    pub fn comments_table(self) -> &'static str {
        match self {
            Bill::Bill1 => "bill_1_comments",
            Bill::Bill2 => "bill_2_comments",
            Bill::Bill3 => "bill_3_comments",
        }
    }

    /// Resolve a bill from the `documentId` of a public submission
    pub fn from_document_id(id: i64) -> Option<Bill> {
        match id {
            1 => Some(Bill::Bill1),
            2 => Some(Bill::Bill2),
            3 => Some(Bill::Bill3),
            _ => None,
        }
    }

    pub fn info(self) -> ConsultationInfo {
        match self {
            Bill::Bill1 => ConsultationInfo {
                title: "Establishment of Indian Multi-Disciplinary Partnership (MDP) firms by the Govt. of India",
                status: ConsultationStatus::InProgress,
                description: "New guidelines for CSR implementation and reporting",
                publish_date: "2025-09-01",
                end_date: "2025-10-10",
            },
            Bill::Bill2 => ConsultationInfo {
                title: "Digital Competition Bill, 2025",
                status: ConsultationStatus::Completed,
                description: "Proposed amendments to strengthen corporate governance and transparency",
                publish_date: "2025-07-15",
                end_date: "2025-08-31",
            },
            Bill::Bill3 => ConsultationInfo {
                title: "Companies Amendment Bill, 2025",
                status: ConsultationStatus::Completed,
                description: "Amendments to improve the insolvency resolution process",
                publish_date: "2025-06-01",
                end_date: "2025-07-15",
            },
        }
    }
}

impl fmt::Display for Bill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Bill {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Bill::ALL
            .into_iter()
            .find(|bill| bill.key() == s)
            .ok_or_else(|| AppError::InvalidBill { bill: s.to_string() })
    }
}

/// A section of a bill that has its own cached overview columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    Section1,
    Section2,
    Section3,
}

/// Column names in `documents` holding a section's overview
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionColumns {
    pub overall: &'static str,
    pub positive: &'static str,
    pub negative: &'static str,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Section1, Section::Section2, Section::Section3];

    /// Label stored in the comment's `section` column
    pub fn label(self) -> &'static str {
        match self {
            Section::Section1 => "Section 1",
            Section::Section2 => "Section 2",
            Section::Section3 => "Section 3",
        }
    }

    pub fn columns(self) -> SectionColumns {
        match self {
            Section::Section1 => SectionColumns {
                overall: "section_1_summary",
                positive: "section1_positive",
                negative: "section1_negative",
            },
            Section::Section2 => SectionColumns {
                overall: "section_2_summary",
                positive: "section2_positive",
                negative: "section2_negative",
            },
            Section::Section3 => SectionColumns {
                overall: "section_3_summary",
                positive: "section3_positive",
                negative: "section3_negative",
            },
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Section {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.label() == s)
            .ok_or_else(|| AppError::InvalidSection { section: s.to_string() })
    }
}
