//! Repository pattern for database operations
//!
//! Every statement is parameterized. Table and column names are
//! interpolated only from the closed `Bill`/`Section` catalog.

use crate::catalog::{Bill, Section};
use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::overview::GeneratedOverview;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, FromQueryResult, Statement,
    Value,
};

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    fn statement(sql: &str, values: Vec<Value>) -> Statement {
        Statement::from_sql_and_values(DbBackend::Postgres, sql, values)
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Comment Operations
    // ========================================================================

    /// Comments of one bill, newest first
    pub async fn list_comments(&self, bill: Bill, limit: u64) -> Result<Vec<CommentRecord>> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY created_at DESC LIMIT $1",
            COMMENT_COLUMNS,
            bill.comments_table()
        );

        CommentRecord::find_by_statement(Self::statement(&sql, vec![limit_value(limit)]))
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Insert a comment and return the stored row
    pub async fn insert_comment(&self, bill: Bill, comment: &NewComment) -> Result<CommentRecord> {
        let sql = format!(
            r#"
            INSERT INTO {} (
                document_id, section, comment_data, sentiment, summary, confidence_score,
                supported_doc, supported_doc_filename,
                commenter_name, commenter_email, commenter_phone, commenter_address,
                id_type, id_number, stakeholder_type
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {}
            "#,
            bill.comments_table(),
            COMMENT_COLUMNS
        );

        let values: Vec<Value> = vec![
            bill.document_id().into(),
            comment.section.clone().into(),
            comment.comment_data.clone().into(),
            comment.sentiment.clone().into(),
            comment.summary.clone().into(),
            comment.confidence_score.into(),
            comment.supported_doc.clone().into(),
            comment.supported_doc_filename.clone().into(),
            comment.commenter_name.clone().into(),
            comment.commenter_email.clone().into(),
            comment.commenter_phone.clone().into(),
            comment.commenter_address.clone().into(),
            comment.id_type.clone().into(),
            comment.id_number.clone().into(),
            comment.stakeholder_type.clone().into(),
        ];

        CommentRecord::find_by_statement(Self::statement(&sql, values))
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::Internal {
                message: format!("Insert into {} returned no row", bill.comments_table()),
            })
    }

    /// Edit a comment's text, sentiment and summary. `None` when the id
    /// does not exist.
    pub async fn update_comment(
        &self,
        bill: Bill,
        id: i32,
        update: &CommentUpdate,
    ) -> Result<Option<CommentRecord>> {
        let sql = format!(
            r#"
            UPDATE {}
            SET comment_data = $1, sentiment = $2, summary = $3, updated_at = NOW()
            WHERE comments_id = $4
            RETURNING {}
            "#,
            bill.comments_table(),
            COMMENT_COLUMNS
        );

        let values: Vec<Value> = vec![
            update.comment_data.clone().into(),
            update.sentiment.clone().into(),
            update.summary.clone().into(),
            id.into(),
        ];

        CommentRecord::find_by_statement(Self::statement(&sql, values))
            .one(self.write_conn())
            .await
            .map_err(Into::into)
    }

    /// Latest comments across all bills, tagged with their bill key
    pub async fn recent_activity(&self, limit: u64) -> Result<Vec<ActivityRecord>> {
        let selects: Vec<String> = Bill::ALL
            .iter()
            .map(|bill| {
                format!(
                    "SELECT '{}' AS bill, comments_id AS id, commenter_name, comment_data, \
                     sentiment, stakeholder_type, created_at FROM {}",
                    bill.key(),
                    bill.comments_table()
                )
            })
            .collect();

        let sql = format!(
            "{} ORDER BY created_at DESC LIMIT $1",
            selects.join(" UNION ALL ")
        );

        ActivityRecord::find_by_statement(Self::statement(&sql, vec![limit_value(limit)]))
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Highest-confidence comments of one bill, most recent first on ties
    pub async fn top_comments(&self, bill: Bill, limit: u64) -> Result<Vec<TopComment>> {
        let sql = format!(
            r#"
            SELECT comments_id, commenter_name, comment_data, sentiment, stakeholder_type,
                   confidence_score, summary, created_at, '{}' AS bill_key
            FROM {}
            WHERE confidence_score IS NOT NULL
            ORDER BY confidence_score DESC, created_at DESC
            LIMIT $1
            "#,
            bill.key(),
            bill.comments_table()
        );

        TopComment::find_by_statement(Self::statement(&sql, vec![limit_value(limit)]))
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Text and sentiment of every comment, optionally limited to one section
    pub async fn overview_sources(
        &self,
        bill: Bill,
        section: Option<Section>,
    ) -> Result<Vec<OverviewSource>> {
        let mut sql = format!(
            "SELECT comment_data, summary, sentiment FROM {}",
            bill.comments_table()
        );
        let mut values: Vec<Value> = Vec::new();

        if let Some(section) = section {
            sql.push_str(" WHERE section = $1");
            values.push(section.label().into());
        }

        OverviewSource::find_by_statement(Self::statement(&sql, values))
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Aggregates
    // ========================================================================

    /// Number of comments stored for a bill
    pub async fn count_comments(&self, bill: Bill) -> Result<i64> {
        let sql = format!("SELECT COUNT(*)::bigint AS count FROM {}", bill.comments_table());

        let row = CountRow::find_by_statement(Self::statement(&sql, vec![]))
            .one(self.read_conn())
            .await?;

        Ok(row.map(|r| r.count).unwrap_or(0))
    }

    /// Comment count per raw sentiment label, largest first
    pub async fn sentiment_counts(&self, bill: Bill) -> Result<Vec<LabelCount>> {
        self.label_counts(bill, "sentiment").await
    }

    /// Comment count per stakeholder type, largest first
    pub async fn stakeholder_counts(&self, bill: Bill) -> Result<Vec<LabelCount>> {
        self.label_counts(bill, "stakeholder_type").await
    }

    async fn label_counts(&self, bill: Bill, column: &'static str) -> Result<Vec<LabelCount>> {
        let sql = format!(
            "SELECT {column} AS label, COUNT(*)::bigint AS count FROM {} \
             GROUP BY {column} ORDER BY count DESC",
            bill.comments_table()
        );

        LabelCount::find_by_statement(Self::statement(&sql, vec![]))
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Document Operations
    // ========================================================================

    /// The cached overview row of a bill
    pub async fn find_document(&self, bill: Bill) -> Result<Option<Document>> {
        DocumentEntity::find_by_id(bill.document_id())
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Store a bill-wide overview. Buckets without generated text keep
    /// their previous value.
    pub async fn update_global_overview(&self, bill: Bill, overview: &GeneratedOverview) -> Result<()> {
        let sql = r#"
            UPDATE documents
            SET summary = COALESCE($1, summary),
                positive_summary = COALESCE($2, positive_summary),
                negative_summary = COALESCE($3, negative_summary),
                updated_at = NOW()
            WHERE document_id = $4
        "#;

        let values: Vec<Value> = vec![
            overview.overall.clone().into(),
            overview.positive.clone().into(),
            overview.negative.clone().into(),
            bill.document_id().into(),
        ];

        self.write_conn().execute(Self::statement(sql, values)).await?;
        Ok(())
    }

    /// Store a section overview, touching only the columns that received
    /// text. Returns `false` when there was nothing to write.
    pub async fn update_section_overview(
        &self,
        bill: Bill,
        section: Section,
        overview: &GeneratedOverview,
    ) -> Result<bool> {
        let columns = section.columns();
        let mut assignments = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        for (column, text) in [
            (columns.overall, &overview.overall),
            (columns.positive, &overview.positive),
            (columns.negative, &overview.negative),
        ] {
            if let Some(text) = text {
                values.push(text.clone().into());
                assignments.push(format!("{} = ${}", column, values.len()));
            }
        }

        if assignments.is_empty() {
            return Ok(false);
        }

        values.push(bill.document_id().into());
        let sql = format!(
            "UPDATE documents SET {}, updated_at = NOW() WHERE document_id = ${}",
            assignments.join(", "),
            values.len()
        );

        self.write_conn().execute(Self::statement(&sql, values)).await?;
        Ok(true)
    }
}

fn limit_value(limit: u64) -> Value {
    i64::try_from(limit).unwrap_or(i64::MAX).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::transaction_log;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn repository(db: MockDatabase) -> Repository {
        Repository::new(DbPool::from_connection(Arc::new(db.into_connection())))
    }

    fn count_row(label: Option<&str>, count: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([
            ("label", Value::String(label.map(|l| Box::new(l.to_string())))),
            ("count", Value::BigInt(Some(count))),
        ])
    }

    fn exec_ok() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    #[tokio::test]
    async fn test_count_comments_reads_bill_table() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![
            BTreeMap::from([("count", Value::BigInt(Some(42)))]),
        ]]);
        let conn = Arc::new(db.into_connection());
        let repo = Repository::new(DbPool::from_connection(conn.clone()));

        assert_eq!(repo.count_comments(Bill::Bill2).await.unwrap(), 42);

        drop(repo);
        let log = transaction_log(conn);
        let sql = &log[0].statements()[0].sql;
        assert!(sql.contains("FROM bill_2_comments"), "{sql}");
    }

    #[tokio::test]
    async fn test_sentiment_counts() {
        let repo = repository(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([
            vec![count_row(Some("Positive"), 3), count_row(None, 1)],
        ]));

        let rows = repo.sentiment_counts(Bill::Bill1).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label.as_deref(), Some("Positive"));
        assert_eq!(rows[0].count, 3);
        assert_eq!(rows[1].label, None);
    }

    #[tokio::test]
    async fn test_global_overview_uses_coalesce() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([exec_ok()]);
        let conn = Arc::new(db.into_connection());
        let repo = Repository::new(DbPool::from_connection(conn.clone()));

        let overview = GeneratedOverview {
            overall: Some("Broad support".into()),
            positive: None,
            negative: None,
        };
        repo.update_global_overview(Bill::Bill3, &overview).await.unwrap();

        drop(repo);
        let log = transaction_log(conn);
        let stmt = &log[0].statements()[0];
        assert!(stmt.sql.contains("positive_summary = COALESCE($2, positive_summary)"));
        let values = stmt.values.as_ref().unwrap().0.clone();
        assert_eq!(values[0], Value::String(Some(Box::new("Broad support".into()))));
        assert_eq!(values[1], Value::String(None));
        assert_eq!(values[3], Value::Int(Some(3)));
    }

    #[tokio::test]
    async fn test_section_overview_sets_only_generated_columns() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([exec_ok()]);
        let conn = Arc::new(db.into_connection());
        let repo = Repository::new(DbPool::from_connection(conn.clone()));

        let overview = GeneratedOverview {
            overall: None,
            positive: Some("Welcomed".into()),
            negative: None,
        };
        let written = repo
            .update_section_overview(Bill::Bill1, Section::Section2, &overview)
            .await
            .unwrap();
        assert!(written);

        drop(repo);
        let log = transaction_log(conn);
        let stmt = &log[0].statements()[0];
        assert_eq!(
            stmt.sql,
            "UPDATE documents SET section2_positive = $1, updated_at = NOW() WHERE document_id = $2"
        );
    }

    #[tokio::test]
    async fn test_section_overview_skips_empty_update() {
        let conn = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let repo = Repository::new(DbPool::from_connection(conn.clone()));

        let written = repo
            .update_section_overview(Bill::Bill1, Section::Section1, &GeneratedOverview::default())
            .await
            .unwrap();
        assert!(!written);
        drop(repo);
        assert!(transaction_log(conn).is_empty());
    }

    #[tokio::test]
    async fn test_overview_sources_filters_by_section_label() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<BTreeMap<&str, Value>>::new()]);
        let conn = Arc::new(db.into_connection());
        let repo = Repository::new(DbPool::from_connection(conn.clone()));

        let rows = repo
            .overview_sources(Bill::Bill1, Some(Section::Section3))
            .await
            .unwrap();
        assert!(rows.is_empty());

        drop(repo);
        let log = transaction_log(conn);
        let stmt = &log[0].statements()[0];
        assert!(stmt.sql.ends_with("FROM bill_1_comments WHERE section = $1"));
        let values = stmt.values.as_ref().unwrap().0.clone();
        assert_eq!(values[0], Value::String(Some(Box::new("Section 3".into()))));
    }

    #[tokio::test]
    async fn test_recent_activity_unions_all_bills() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<BTreeMap<&str, Value>>::new()]);
        let conn = Arc::new(db.into_connection());
        let repo = Repository::new(DbPool::from_connection(conn.clone()));

        repo.recent_activity(10).await.unwrap();

        drop(repo);
        let log = transaction_log(conn);
        let sql = &log[0].statements()[0].sql;
        assert_eq!(sql.matches("UNION ALL").count(), 2);
        for bill in Bill::ALL {
            assert!(sql.contains(bill.comments_table()));
        }
        assert!(sql.ends_with("ORDER BY created_at DESC LIMIT $1"));
    }
}
