//! PostgreSQL audit store.
//!
//! Insert-only persistence via SQLx. Each verdict row carries the SHA-256
//! content digest computed before the write, so an audit reviewer can detect
//! any after-the-fact modification of a row.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use veritrade_core::{CreditRating, InvoiceSnapshot, VerificationVerdict};

use crate::{AuditError, AuditStore, VerificationStats};

/// SQLx-backed audit store.
pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    /// Connect, then run embedded migrations.
    pub async fn connect(database_url: &str) -> Result<Self, AuditError> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(std::time::Duration::from_secs(5))
            .connect(database_url)
            .await?;
        tracing::info!("connected to PostgreSQL audit store");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AuditError::Database(sqlx::Error::Migrate(Box::new(e))))?;
        tracing::info!("audit store migrations applied");

        Ok(Self { pool })
    }

    /// Wrap an existing pool (tests, shared pools).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AuditStore for PgAuditStore {
    async fn save_snapshot(&self, snapshot: &InvoiceSnapshot) -> Result<(), AuditError> {
        let metadata = serde_json::to_value(&snapshot.metadata)?;
        sqlx::query(
            "INSERT INTO invoice_snapshots
                (invoice_id, document_hash, commodity, amount, supplier_country,
                 buyer_country, exporter_name, buyer_name, metadata, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(&snapshot.invoice_id)
        .bind(&snapshot.document_hash)
        .bind(&snapshot.commodity)
        .bind(&snapshot.amount)
        .bind(&snapshot.supplier_country)
        .bind(&snapshot.buyer_country)
        .bind(&snapshot.exporter_name)
        .bind(&snapshot.buyer_name)
        .bind(&metadata)
        .bind(snapshot.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_verdict(&self, verdict: &VerificationVerdict) -> Result<(), AuditError> {
        let checks = serde_json::to_value(verdict.checks)?;
        let details = serde_json::to_value(&verdict.details)?;
        let recommendations = serde_json::to_value(&verdict.recommendations)?;
        let digest = verdict.content_digest()?;

        let result = sqlx::query(
            "INSERT INTO verification_verdicts
                (verification_id, invoice_id, document_hash, is_valid, risk_score,
                 credit_rating, checks, details, recommendations,
                 processing_time_ms, verified_at, content_digest)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             ON CONFLICT (verification_id) DO NOTHING",
        )
        .bind(verdict.verification_id)
        .bind(&verdict.invoice_id)
        .bind(&verdict.document_hash)
        .bind(verdict.is_valid)
        .bind(i64::from(verdict.risk_score))
        .bind(verdict.credit_rating.as_str())
        .bind(&checks)
        .bind(&details)
        .bind(&recommendations)
        .bind(i64::try_from(verdict.processing_time_ms).unwrap_or(i64::MAX))
        .bind(verdict.verified_at)
        .bind(&digest)
        .execute(&self.pool)
        .await?;

        // ON CONFLICT DO NOTHING reports zero affected rows on a duplicate;
        // surface that as the append-only violation it is.
        if result.rows_affected() == 0 {
            return Err(AuditError::DuplicateVerdict(verdict.verification_id));
        }
        Ok(())
    }

    async fn find_verdict(
        &self,
        verification_id: Uuid,
    ) -> Result<Option<VerificationVerdict>, AuditError> {
        let row = sqlx::query_as::<_, VerdictRow>(
            "SELECT verification_id, invoice_id, document_hash, is_valid, risk_score,
                    credit_rating, checks, details, recommendations,
                    processing_time_ms, verified_at
             FROM verification_verdicts WHERE verification_id = $1",
        )
        .bind(verification_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(VerificationVerdict::try_from).transpose()
    }

    async fn find_history(&self, invoice_id: &str) -> Result<Vec<VerificationVerdict>, AuditError> {
        let rows = sqlx::query_as::<_, VerdictRow>(
            "SELECT verification_id, invoice_id, document_hash, is_valid, risk_score,
                    credit_rating, checks, details, recommendations,
                    processing_time_ms, verified_at
             FROM verification_verdicts WHERE invoice_id = $1
             ORDER BY verified_at DESC",
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(VerificationVerdict::try_from)
            .collect()
    }

    async fn stats(&self) -> Result<VerificationStats, AuditError> {
        let totals = sqlx::query_as::<_, TotalsRow>(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE is_valid) AS valid_count,
                    COALESCE(AVG(risk_score), 0)::float8 AS average_risk_score
             FROM verification_verdicts",
        )
        .fetch_one(&self.pool)
        .await?;

        let distribution = sqlx::query_as::<_, RatingCountRow>(
            "SELECT credit_rating, COUNT(*) AS count
             FROM verification_verdicts GROUP BY credit_rating ORDER BY credit_rating",
        )
        .fetch_all(&self.pool)
        .await?;

        let total = u64::try_from(totals.total).unwrap_or(0);
        let valid_count = u64::try_from(totals.valid_count).unwrap_or(0);
        let rating_distribution: BTreeMap<String, u64> = distribution
            .into_iter()
            .map(|r| (r.credit_rating, u64::try_from(r.count).unwrap_or(0)))
            .collect();

        Ok(VerificationStats {
            total,
            valid_count,
            invalid_count: total.saturating_sub(valid_count),
            validation_rate: if total > 0 {
                valid_count as f64 * 100.0 / total as f64
            } else {
                0.0
            },
            average_risk_score: totals.average_risk_score,
            rating_distribution,
        })
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(sqlx::FromRow)]
struct VerdictRow {
    verification_id: Uuid,
    invoice_id: String,
    document_hash: String,
    is_valid: bool,
    risk_score: i64,
    credit_rating: String,
    checks: serde_json::Value,
    details: serde_json::Value,
    recommendations: serde_json::Value,
    processing_time_ms: i64,
    verified_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct TotalsRow {
    total: i64,
    valid_count: i64,
    average_risk_score: f64,
}

#[derive(sqlx::FromRow)]
struct RatingCountRow {
    credit_rating: String,
    count: i64,
}

impl TryFrom<VerdictRow> for VerificationVerdict {
    type Error = AuditError;

    fn try_from(row: VerdictRow) -> Result<Self, AuditError> {
        let checks = serde_json::from_value(row.checks)?;
        let details = serde_json::from_value(row.details)?;
        let recommendations = serde_json::from_value(row.recommendations)?;
        Ok(VerificationVerdict {
            verification_id: row.verification_id,
            invoice_id: row.invoice_id,
            document_hash: row.document_hash,
            is_valid: row.is_valid,
            risk_score: u32::try_from(row.risk_score).unwrap_or(0),
            credit_rating: parse_rating(&row.credit_rating),
            checks,
            details,
            recommendations,
            processing_time_ms: u64::try_from(row.processing_time_ms).unwrap_or(0),
            verified_at: row.verified_at,
        })
    }
}

fn parse_rating(s: &str) -> CreditRating {
    match s {
        "AAA" => CreditRating::Aaa,
        "AA" => CreditRating::Aa,
        "A" => CreditRating::A,
        "BBB" => CreditRating::Bbb,
        "BB" => CreditRating::Bb,
        "B" => CreditRating::B,
        "D" => CreditRating::D,
        "ERROR" => CreditRating::Error,
        other => {
            tracing::warn!(value = other, "unrecognized credit rating in database, mapping to ERROR");
            CreditRating::Error
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_parse_round_trip() {
        for rating in [
            CreditRating::Aaa,
            CreditRating::Aa,
            CreditRating::A,
            CreditRating::Bbb,
            CreditRating::Bb,
            CreditRating::B,
            CreditRating::D,
            CreditRating::Error,
        ] {
            assert_eq!(parse_rating(rating.as_str()), rating);
        }
    }

    #[test]
    fn unknown_rating_maps_to_error() {
        assert_eq!(parse_rating("CC"), CreditRating::Error);
    }
}
