//! Registration, login and the session token.
//!
//! A successful login signs an HS256 JWT (`sub`, `userid`, `role`, `iat`,
//! `exp`) and hands it to the browser in the `token` cookie. Every protected
//! handler resolves the caller through [`principal::require_auth`] or
//! [`principal::require_admin`], which accept the cookie or an
//! `Authorization: Bearer` header (the header wins).
//!
//! Passwords are stored as Argon2id PHC strings. Unknown handles and wrong
//! passwords produce the same 401 so the endpoint does not reveal which
//! accounts exist.

pub(crate) mod login;
pub(crate) mod password;
pub(crate) mod principal;
pub(crate) mod register;
pub(crate) mod session;
mod state;
pub(crate) mod storage;
pub(crate) mod token;
pub(crate) mod types;

pub use state::{AuthConfig, AuthState};
pub use token::Role;

#[cfg(test)]
mod tests;
