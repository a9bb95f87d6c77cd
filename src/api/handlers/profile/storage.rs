//! Profile reads and the transactional update with email sync.

use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use tracing::instrument;
use uuid::Uuid;

use super::{
    types::{Profile, UserRegisterRef},
    update::{FieldChange, ProfileUpdate},
};
use crate::api::handlers::{ApiError, auth::Role, is_unique_violation};

/// Columns shared by every profile read; join `auth_users u` on `p.auth_user_id`.
pub(crate) const PROFILE_COLUMNS: &str = r#"
    p.id::text AS id,
    p.name,
    p.email,
    p.phone,
    p.age,
    p.father_number,
    to_char(p.created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
    to_char(p.updated_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at,
    u.id::text AS user_id,
    u.userid AS user_userid,
    u.email AS user_email,
    u.role AS user_role
"#;

/// How to locate a profile.
#[derive(Debug, Clone, Copy)]
pub enum ProfileKey {
    /// Profile primary key (admin routes).
    Id(Uuid),
    /// Owning auth record (self-service routes).
    Owner(Uuid),
}

impl ProfileKey {
    fn column(self) -> &'static str {
        match self {
            Self::Id(_) => "p.id",
            Self::Owner(_) => "p.auth_user_id",
        }
    }

    fn value(self) -> Uuid {
        match self {
            Self::Id(id) | Self::Owner(id) => id,
        }
    }
}

#[derive(Debug)]
pub enum UpdateError {
    EmailInUse,
    Database(sqlx::Error),
}

impl From<sqlx::Error> for UpdateError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

impl From<UpdateError> for ApiError {
    fn from(err: UpdateError) -> Self {
        match err {
            UpdateError::EmailInUse => Self::BadRequest("Email already in use"),
            UpdateError::Database(err) => Self::Database(err),
        }
    }
}

pub(crate) fn profile_from_row(row: &PgRow) -> Profile {
    let role: String = row.get("user_role");
    Profile {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        age: row.get("age"),
        father_number: row.get("father_number"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        user_register: UserRegisterRef {
            id: row.get("user_id"),
            userid: row.get("user_userid"),
            email: row.get("user_email"),
            role: Role::parse(&role).unwrap_or(Role::User),
        },
    }
}

/// Fetch one profile with its auth summary.
///
/// # Errors
/// Returns an error if the query fails.
#[instrument(skip(pool))]
pub async fn fetch_profile(pool: &PgPool, key: ProfileKey) -> Result<Option<Profile>, sqlx::Error> {
    let query = format!(
        "SELECT {PROFILE_COLUMNS} FROM user_profiles p JOIN auth_users u ON u.id = p.auth_user_id WHERE {} = $1 LIMIT 1",
        key.column()
    );
    let row = sqlx::query(&query)
        .bind(key.value())
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(profile_from_row))
}

/// Apply a whitelisted update, syncing a new email to the auth record first.
///
/// Returns `Ok(None)` when the profile does not exist. Nothing is committed
/// when any statement fails.
///
/// # Errors
/// [`UpdateError::EmailInUse`] when the email belongs to another auth record.
#[instrument(skip(pool, update))]
pub async fn update_profile(
    pool: &PgPool,
    key: ProfileKey,
    update: &ProfileUpdate,
) -> Result<Option<Profile>, UpdateError> {
    let mut tx = pool.begin().await?;

    let lookup = format!(
        "SELECT p.id, p.auth_user_id FROM user_profiles p WHERE {} = $1 FOR UPDATE",
        key.column()
    );
    let Some(row) = sqlx::query(&lookup)
        .bind(key.value())
        .fetch_optional(&mut *tx)
        .await?
    else {
        return Ok(None);
    };
    let profile_id: Uuid = row.get("id");
    let auth_user_id: Uuid = row.get("auth_user_id");

    if let FieldChange::Set(email) = &update.email {
        let synced = sqlx::query("UPDATE auth_users SET email = $1, updated_at = NOW() WHERE id = $2")
            .bind(email)
            .bind(auth_user_id)
            .execute(&mut *tx)
            .await;
        match synced {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => return Err(UpdateError::EmailInUse),
            Err(err) => return Err(UpdateError::Database(err)),
        }
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE user_profiles SET ");
    {
        let mut assignments = builder.separated(", ");
        push_text(&mut assignments, "name", &update.name);
        push_text(&mut assignments, "email", &update.email);
        push_text(&mut assignments, "phone", &update.phone);
        match &update.age {
            FieldChange::Keep => {}
            FieldChange::Clear => {
                assignments.push("age = NULL");
            }
            FieldChange::Set(age) => {
                assignments.push("age = ");
                assignments.push_bind_unseparated(*age);
            }
        }
        push_text(&mut assignments, "father_number", &update.father_number);
        assignments.push("updated_at = NOW()");
    }
    builder.push(" WHERE id = ");
    builder.push_bind(profile_id);
    builder.build().execute(&mut *tx).await?;

    tx.commit().await?;

    fetch_profile(pool, ProfileKey::Id(profile_id))
        .await
        .map_err(UpdateError::from)
}

fn push_text<'args>(
    assignments: &mut sqlx::query_builder::Separated<'_, 'args, Postgres, &'static str>,
    column: &'static str,
    change: &'args FieldChange<String>,
) {
    match change {
        FieldChange::Keep => {}
        FieldChange::Clear => {
            assignments.push(format!("{column} = NULL"));
        }
        FieldChange::Set(value) => {
            assignments.push(format!("{column} = "));
            assignments.push_bind_unseparated(value.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_key_columns() {
        let id = Uuid::new_v4();
        assert_eq!(ProfileKey::Id(id).column(), "p.id");
        assert_eq!(ProfileKey::Owner(id).column(), "p.auth_user_id");
        assert_eq!(ProfileKey::Owner(id).value(), id);
    }

    #[test]
    fn update_error_maps_to_bad_request() {
        let err: ApiError = UpdateError::EmailInUse.into();
        assert!(matches!(err, ApiError::BadRequest("Email already in use")));
    }
}
