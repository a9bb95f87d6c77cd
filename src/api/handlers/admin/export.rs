use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::{borrow::Cow, sync::Arc};
use tracing::info;

use super::{
    storage::{ExportRow, export_rows},
    types::IdsRequest,
    valid_ids,
};
use crate::api::handlers::{
    ApiError, ErrorBody,
    auth::{AuthState, principal::require_admin},
};

const BOM: &str = "\u{feff}";
const HEADER: [&str; 5] = ["Name", "Email", "Phone", "Age", "Father's Number"];

/// Quote a cell when it holds a delimiter, quote or line break.
pub(crate) fn csv_cell(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn csv_line<'a>(cells: impl IntoIterator<Item = &'a str>) -> String {
    cells
        .into_iter()
        .map(csv_cell)
        .collect::<Vec<_>>()
        .join(",")
}

pub(crate) fn render_csv(rows: &[ExportRow]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(csv_line(HEADER));
    for row in rows {
        let age = row.age.map(|age| age.to_string()).unwrap_or_default();
        lines.push(csv_line([
            row.name.as_deref().unwrap_or_default(),
            row.email.as_deref().unwrap_or_default(),
            row.phone.as_deref().unwrap_or_default(),
            age.as_str(),
            row.father_number.as_deref().unwrap_or_default(),
        ]));
    }
    format!("{BOM}{}", lines.join("\n"))
}

pub(crate) fn export_filename(now: DateTime<Utc>) -> String {
    format!("profiles_selected_{}.csv", now.format("%Y-%m-%d-%H-%M-%S"))
}

#[utoipa::path(
    post,
    path = "/admin/profiles/export",
    request_body = IdsRequest,
    responses(
        (status = 200, description = "CSV of the selected profiles", content_type = "text/csv", body = String),
        (status = 400, description = "Select one or more rows to export", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Admin access required", body = ErrorBody)
    ),
    tag = "admin"
)]
pub async fn export_profiles(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
    payload: Result<Json<IdsRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let admin = require_admin(&headers, &auth_state)?;

    let request = payload.map(|Json(body)| body).unwrap_or_default();
    let ids = valid_ids(&request.ids.unwrap_or_default());
    if ids.is_empty() {
        return Err(ApiError::BadRequest("Select one or more rows to export"));
    }

    let rows = export_rows(&pool, &ids).await?;
    let body = render_csv(&rows);
    let disposition = format!("attachment; filename=\"{}\"", export_filename(Utc::now()));
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|_| ApiError::Internal("Failed to build export"))?;

    info!(rows = rows.len(), admin = %admin.userid, "profiles exported");

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn cells_are_quoted_only_when_needed() {
        assert_eq!(csv_cell("plain"), "plain");
        assert_eq!(csv_cell("a,b"), "\"a,b\"");
        assert_eq!(csv_cell("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_cell("two\nlines"), "\"two\nlines\"");
        assert_eq!(csv_cell("cr\rhere"), "\"cr\rhere\"");
    }

    #[test]
    fn render_starts_with_bom_and_header() {
        let csv = render_csv(&[]);
        assert_eq!(csv, "\u{feff}Name,Email,Phone,Age,Father's Number");
    }

    #[test]
    fn render_rows_with_missing_values() {
        let rows = vec![
            ExportRow {
                name: Some("Doe, Jane".to_string()),
                email: Some("jane@example.com".to_string()),
                phone: Some("9876543210".to_string()),
                age: Some(30),
                father_number: None,
            },
            ExportRow {
                name: None,
                email: None,
                phone: None,
                age: None,
                father_number: Some("9123456780".to_string()),
            },
        ];
        let csv = render_csv(&rows);
        let lines: Vec<&str> = csv.trim_start_matches(BOM).split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "\"Doe, Jane\",jane@example.com,9876543210,30,");
        assert_eq!(lines[2], ",,,,9123456780");
    }

    #[test]
    fn filename_uses_utc_timestamp() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).single();
        assert_eq!(
            now.map(export_filename),
            Some("profiles_selected_2024-03-09-07-05-01.csv".to_string())
        );
    }
}
