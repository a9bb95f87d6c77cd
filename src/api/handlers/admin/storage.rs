//! Admin queries: filtered listing, deletes, export rows and user creation.

use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::instrument;
use uuid::Uuid;

use super::list::ListQuery;
use crate::api::handlers::{
    auth::Role,
    is_unique_violation,
    profile::{
        storage::{PROFILE_COLUMNS, profile_from_row},
        types::Profile,
    },
    violated_constraint,
};

const PROFILE_FROM: &str = " FROM user_profiles p JOIN auth_users u ON u.id = p.auth_user_id";

fn push_filters(builder: &mut QueryBuilder<'static, Postgres>, query: &ListQuery) {
    builder.push(" WHERE TRUE");
    if let Some(user) = query.user {
        builder.push(" AND p.auth_user_id = ");
        builder.push_bind(user);
    }
    if let Some(pattern) = query.pattern() {
        builder.push(" AND (p.name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR p.email ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR p.phone ILIKE ");
        builder.push_bind(pattern);
        builder.push(" ESCAPE '\\')");
    }
}

pub(crate) fn count_query(query: &ListQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*)");
    builder.push(PROFILE_FROM);
    push_filters(&mut builder, query);
    builder
}

pub(crate) fn page_query(query: &ListQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {PROFILE_COLUMNS}"));
    builder.push(PROFILE_FROM);
    push_filters(&mut builder, query);
    builder.push(format!(
        " ORDER BY {} {}, p.id {}",
        query.sort.expression(),
        query.order.sql(),
        query.order.keyword()
    ));
    builder.push(" LIMIT ");
    builder.push_bind(query.limit);
    builder.push(" OFFSET ");
    builder.push_bind(query.offset());
    builder
}

/// Total matching profiles and the requested page.
///
/// # Errors
/// Returns an error if either query fails.
#[instrument(skip(pool))]
pub async fn list_profiles(
    pool: &PgPool,
    query: &ListQuery,
) -> Result<(i64, Vec<Profile>), sqlx::Error> {
    let total = count_query(query)
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await?;
    let rows = page_query(query).build().fetch_all(pool).await?;
    Ok((total, rows.iter().map(profile_from_row).collect()))
}

/// Delete one profile; the auth record is kept. Returns whether a row went away.
///
/// # Errors
/// Returns an error if the delete fails.
#[instrument(skip(pool))]
pub async fn delete_profile(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM user_profiles WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// # Errors
/// Returns an error if the delete fails.
#[instrument(skip(pool, ids), fields(requested = ids.len()))]
pub async fn delete_profiles(pool: &PgPool, ids: &[Uuid]) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM user_profiles WHERE id = ANY($1)")
        .bind(ids)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub age: Option<i32>,
    pub father_number: Option<String>,
}

/// Rows for the selected profiles, newest first. Unknown ids are skipped.
///
/// # Errors
/// Returns an error if the query fails.
#[instrument(skip(pool, ids), fields(requested = ids.len()))]
pub async fn export_rows(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<ExportRow>, sqlx::Error> {
    let rows = sqlx::query(
        r"
        SELECT p.name,
               COALESCE(NULLIF(u.email, ''), p.email) AS email,
               p.phone,
               p.age,
               p.father_number
        FROM user_profiles p
        JOIN auth_users u ON u.id = p.auth_user_id
        WHERE p.id = ANY($1)
        ORDER BY p.created_at DESC, p.id DESC
        ",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| ExportRow {
            name: row.get("name"),
            email: row.get("email"),
            phone: row.get("phone"),
            age: row.get("age"),
            father_number: row.get("father_number"),
        })
        .collect())
}

#[derive(Debug)]
pub struct NewUser<'a> {
    pub userid: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub name: &'a str,
    pub phone: &'a str,
    pub age: Option<i32>,
    pub father_number: Option<&'a str>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created { profile_id: Uuid },
    EmailExists,
    PhoneExists,
    /// The generated login handle collided; callers may retry with a new one.
    UseridTaken,
}

/// Create an auth record and a filled-in profile in one transaction.
///
/// # Errors
/// Returns database errors other than the uniqueness outcomes above.
#[instrument(skip(pool, user), fields(userid = user.userid))]
pub async fn create_user_with_profile(
    pool: &PgPool,
    user: &NewUser<'_>,
) -> Result<CreateOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let email_taken = sqlx::query("SELECT 1 FROM auth_users WHERE email = $1 LIMIT 1")
        .bind(user.email)
        .fetch_optional(&mut *tx)
        .await?;
    if email_taken.is_some() {
        return Ok(CreateOutcome::EmailExists);
    }

    let phone_taken = sqlx::query("SELECT 1 FROM user_profiles WHERE phone = $1 LIMIT 1")
        .bind(user.phone)
        .fetch_optional(&mut *tx)
        .await?;
    if phone_taken.is_some() {
        return Ok(CreateOutcome::PhoneExists);
    }

    let user_id = Uuid::new_v4();
    let inserted = sqlx::query(
        "INSERT INTO auth_users (id, userid, email, password_hash, role) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(user_id)
    .bind(user.userid)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.role.as_str())
    .execute(&mut *tx)
    .await;
    match inserted {
        Ok(_) => {}
        Err(err) if is_unique_violation(&err) => {
            return Ok(match violated_constraint(&err) {
                Some("auth_users_userid_key") => CreateOutcome::UseridTaken,
                _ => CreateOutcome::EmailExists,
            });
        }
        Err(err) => return Err(err),
    }

    let profile_id = Uuid::new_v4();
    sqlx::query(
        r"
        INSERT INTO user_profiles (id, auth_user_id, name, email, phone, age, father_number)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ",
    )
    .bind(profile_id)
    .bind(user_id)
    .bind(user.name)
    .bind(user.email)
    .bind(user.phone)
    .bind(user.age)
    .bind(user.father_number)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(CreateOutcome::Created { profile_id })
}
