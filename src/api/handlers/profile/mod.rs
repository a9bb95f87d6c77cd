//! Profile records and the self-service dashboard.
//!
//! Profile edits go through [`update::ProfileUpdate`], which only looks at
//! `name`, `email`, `phone`, `age` and `fatherNumber`. When the email changes
//! it is written to the auth record first and the profile second, in the same
//! transaction, so login-by-email always matches what the profile shows.

pub(crate) mod me;
pub(crate) mod storage;
pub(crate) mod types;
pub(crate) mod update;
