//! Database access for auth records.

use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::instrument;
use uuid::Uuid;

use super::token::Role;
use crate::api::handlers::is_unique_violation;

#[derive(Debug, Clone)]
pub struct AuthUserRecord {
    pub id: Uuid,
    pub userid: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RegisterOutcome {
    Created { user_id: Uuid, profile_id: Uuid },
    Conflict,
}

/// Create the auth record and its empty profile in one transaction.
///
/// # Errors
/// Returns database errors other than unique violations on the auth record.
#[instrument(skip(pool, password_hash))]
pub async fn insert_user_with_profile(
    pool: &PgPool,
    userid: &str,
    email: &str,
    password_hash: &str,
) -> Result<RegisterOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let exists = sqlx::query("SELECT 1 FROM auth_users WHERE email = $1 OR userid = $2 LIMIT 1")
        .bind(email)
        .bind(userid)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_some() {
        return Ok(RegisterOutcome::Conflict);
    }

    let user_id = Uuid::new_v4();
    let insert_user = sqlx::query(
        "INSERT INTO auth_users (id, userid, email, password_hash, role) VALUES ($1, $2, $3, $4, 'user')",
    )
    .bind(user_id)
    .bind(userid)
    .bind(email)
    .bind(password_hash)
    .execute(&mut *tx)
    .await;
    match insert_user {
        Ok(_) => {}
        Err(err) if is_unique_violation(&err) => return Ok(RegisterOutcome::Conflict),
        Err(err) => return Err(err),
    }

    let profile_id = Uuid::new_v4();
    sqlx::query("INSERT INTO user_profiles (id, auth_user_id, email) VALUES ($1, $2, $3)")
        .bind(profile_id)
        .bind(user_id)
        .bind(email)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(RegisterOutcome::Created {
        user_id,
        profile_id,
    })
}

/// Look up an auth record by login handle.
///
/// # Errors
/// Returns an error if the query fails.
#[instrument(skip(pool))]
pub async fn find_by_userid(
    pool: &PgPool,
    userid: &str,
) -> Result<Option<AuthUserRecord>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT id, userid, email, password_hash, role FROM auth_users WHERE userid = $1 LIMIT 1",
    )
    .bind(userid)
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(auth_user_from_row))
}

/// Look up an auth record by normalized email.
///
/// # Errors
/// Returns an error if the query fails.
#[instrument(skip(pool))]
pub async fn find_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<AuthUserRecord>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT id, userid, email, password_hash, role FROM auth_users WHERE email = $1 LIMIT 1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(auth_user_from_row))
}

fn auth_user_from_row(row: &PgRow) -> AuthUserRecord {
    let role: String = row.get("role");
    AuthUserRecord {
        id: row.get("id"),
        userid: row.get("userid"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: Role::parse(&role).unwrap_or(Role::User),
    }
}
