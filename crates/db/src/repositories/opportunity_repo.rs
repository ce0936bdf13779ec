//! Repository for the `opportunities` table.

use salesdesk_core::opportunity::{EndDateEffect, OpportunityValues, TransitionPlan};
use salesdesk_core::types::DbId;
use sqlx::postgres::PgExecutor;
use sqlx::PgPool;

use crate::models::opportunity::{Opportunity, TerminalOutcome};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "\
    id, description, start_date, end_date, party_id, address_id, \
    comment, state, created_at, updated_at";

/// Provides CRUD and workflow operations for opportunities.
pub struct OpportunityRepo;

impl OpportunityRepo {
    /// Insert a new opportunity in the `draft` state.
    ///
    /// `values` must already be validated; the state column takes its
    /// database default.
    pub async fn create<'e, E>(
        executor: E,
        values: &OpportunityValues,
    ) -> Result<Opportunity, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO opportunities \
                (description, start_date, end_date, party_id, address_id, comment) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Opportunity>(&query)
            .bind(&values.description)
            .bind(values.start_date)
            .bind(values.end_date)
            .bind(values.party_id)
            .bind(values.address_id)
            .bind(&values.comment)
            .fetch_one(executor)
            .await
    }

    /// Find an opportunity by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Opportunity>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM opportunities WHERE id = $1");
        sqlx::query_as::<_, Opportunity>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find every opportunity whose id is in `ids`, ordered by id.
    ///
    /// Missing ids are silently absent from the result.
    pub async fn find_by_ids(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<Vec<Opportunity>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM opportunities WHERE id = ANY($1) ORDER BY id");
        sqlx::query_as::<_, Opportunity>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Lock the rows of a batch for the rest of the transaction.
    ///
    /// Rows are locked in id order so concurrent batches cannot deadlock.
    pub async fn lock_by_ids<'e, E>(
        executor: E,
        ids: &[DbId],
    ) -> Result<Vec<Opportunity>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM opportunities WHERE id = ANY($1) ORDER BY id FOR UPDATE"
        );
        sqlx::query_as::<_, Opportunity>(&query)
            .bind(ids)
            .fetch_all(executor)
            .await
    }

    /// List opportunities with optional filters for state and party.
    ///
    /// Results are ordered by start date, newest first.
    pub async fn list_filtered(
        pool: &PgPool,
        state: Option<&str>,
        party_id: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Opportunity>, sqlx::Error> {
        let mut conditions: Vec<String> = Vec::new();
        let mut param_idx: usize = 1;

        if state.is_some() {
            conditions.push(format!("state = ${param_idx}"));
            param_idx += 1;
        }
        if party_id.is_some() {
            conditions.push(format!("party_id = ${param_idx}"));
            param_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM opportunities {where_clause} \
             ORDER BY start_date DESC, id DESC \
             LIMIT ${param_idx} OFFSET ${}",
            param_idx + 1
        );

        let mut q = sqlx::query_as::<_, Opportunity>(&query);

        if let Some(s) = state {
            q = q.bind(s);
        }
        if let Some(pid) = party_id {
            q = q.bind(pid);
        }
        q = q.bind(limit).bind(offset);

        q.fetch_all(pool).await
    }

    /// All opportunities referencing a party.
    pub async fn list_by_party(
        pool: &PgPool,
        party_id: DbId,
    ) -> Result<Vec<Opportunity>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM opportunities WHERE party_id = $1 \
             ORDER BY start_date DESC, id DESC"
        );
        sqlx::query_as::<_, Opportunity>(&query)
            .bind(party_id)
            .fetch_all(pool)
            .await
    }

    /// Write every editable column of an opportunity.
    ///
    /// The caller merges and validates the values first. The state column
    /// is never touched here; it only changes through [`Self::apply_transition`].
    pub async fn update<'e, E>(
        executor: E,
        id: DbId,
        values: &OpportunityValues,
    ) -> Result<Option<Opportunity>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE opportunities SET \
                description = $2, \
                start_date = $3, \
                end_date = $4, \
                party_id = $5, \
                address_id = $6, \
                comment = $7 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Opportunity>(&query)
            .bind(id)
            .bind(&values.description)
            .bind(values.start_date)
            .bind(values.end_date)
            .bind(values.party_id)
            .bind(values.address_id)
            .bind(&values.comment)
            .fetch_optional(executor)
            .await
    }

    /// Move every row of a batch to the planned state and apply the
    /// planned end-date effect, returning the updated rows ordered by id.
    pub async fn apply_transition<'e, E>(
        executor: E,
        ids: &[DbId],
        plan: &TransitionPlan,
    ) -> Result<Vec<Opportunity>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (touch_end_date, end_date) = match plan.end_date {
            EndDateEffect::Keep => (false, None),
            EndDateEffect::Set(date) => (true, Some(date)),
            EndDateEffect::Clear => (true, None),
        };

        let query = format!(
            "WITH updated AS ( \
                UPDATE opportunities SET \
                    state = $2, \
                    end_date = CASE WHEN $3 THEN $4::DATE ELSE end_date END \
                WHERE id = ANY($1) \
                RETURNING {COLUMNS} \
             ) \
             SELECT {COLUMNS} FROM updated ORDER BY id"
        );
        let rows = sqlx::query_as::<_, Opportunity>(&query)
            .bind(ids)
            .bind(plan.target.as_str())
            .bind(touch_end_date)
            .bind(end_date)
            .fetch_all(executor)
            .await?;

        tracing::debug!(
            count = rows.len(),
            state = %plan.target,
            "Applied opportunity transition"
        );
        Ok(rows)
    }

    /// Delete an opportunity. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM opportunities WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// State and end date of every converted or lost opportunity.
    ///
    /// Feeds the monthly outcome view, which is aggregated on each read.
    pub async fn terminal_outcomes(pool: &PgPool) -> Result<Vec<TerminalOutcome>, sqlx::Error> {
        sqlx::query_as::<_, TerminalOutcome>(
            "SELECT state, end_date FROM opportunities \
             WHERE state IN ('converted', 'lost')",
        )
        .fetch_all(pool)
        .await
    }
}
