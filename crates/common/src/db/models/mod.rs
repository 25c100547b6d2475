//! Database models
//!
//! The `documents` table is a SeaORM entity; comment and aggregate rows are
//! read with raw statements.

mod comment;
mod document;
mod stats;

pub use comment::{
    ActivityRecord, CommentRecord, CommentUpdate, NewComment, OverviewSource, TopComment,
    COMMENT_COLUMNS,
};

pub use document::{Entity as DocumentEntity, Model as Document};

pub use stats::LabelCount;
pub(crate) use stats::CountRow;
