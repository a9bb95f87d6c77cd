//! Payment log persistence.

use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use super::types::PaymentRecord;

/// Record a verified payment.
///
/// # Errors
/// Returns an error if the insert fails.
#[instrument(skip(pool, signature))]
pub async fn insert_payment(
    pool: &PgPool,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO payments (id, gateway_order_id, gateway_payment_id, gateway_signature) VALUES ($1, $2, $3, $4)",
    )
    .bind(id)
    .bind(order_id)
    .bind(payment_id)
    .bind(signature)
    .execute(pool)
    .await?;
    Ok(id)
}

/// One page of payments, newest first, plus the total count.
///
/// # Errors
/// Returns an error if either query fails.
#[instrument(skip(pool))]
pub async fn list_payments(
    pool: &PgPool,
    page: i64,
    limit: i64,
) -> Result<(i64, Vec<PaymentRecord>), sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments")
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query(
        r#"
        SELECT
            id::text AS id,
            gateway_order_id,
            gateway_payment_id,
            gateway_signature,
            to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
        FROM payments
        ORDER BY created_at DESC, id DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind((page - 1).saturating_mul(limit))
    .fetch_all(pool)
    .await?;

    let records = rows
        .into_iter()
        .map(|row| PaymentRecord {
            id: row.get("id"),
            razorpay_order_id: row.get("gateway_order_id"),
            razorpay_payment_id: row.get("gateway_payment_id"),
            razorpay_signature: row.get("gateway_signature"),
            created_at: row.get("created_at"),
        })
        .collect();

    Ok((total, records))
}
