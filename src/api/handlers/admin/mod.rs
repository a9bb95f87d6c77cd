//! Admin panel API.
//!
//! Every route resolves the caller with `require_admin` before touching the
//! database: no token is 401, a non-admin token is 403.

pub(crate) mod create_user;
pub(crate) mod export;
pub(crate) mod list;
pub(crate) mod profiles;
pub(crate) mod storage;
pub(crate) mod types;


use serde_json::Value;
use uuid::Uuid;

/// Keep the entries of an `ids` array that parse as UUIDs, dropping the rest.
pub(crate) fn valid_ids(ids: &[Value]) -> Vec<Uuid> {
    ids.iter()
        .filter_map(Value::as_str)
        .filter_map(|id| Uuid::parse_str(id.trim()).ok())
        .collect()
}
