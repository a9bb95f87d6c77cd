//! # Userdesk (accounts, profile administration and checkout)
//!
//! `userdesk` is a small HTTP service that owns user accounts and their
//! demographic profiles, and fronts a third-party payment gateway.
//!
//! ## Records
//!
//! Every account is split in two linked rows:
//!
//! - **Auth record** (`auth_users`): login handle, email, Argon2id password
//!   hash and role (`user` or `admin`).
//! - **Profile record** (`user_profiles`): name, email, phone, age and a
//!   guardian phone, one-to-one with the auth record.
//!
//! The profile email is mirrored into the auth record whenever it changes, in
//! the same transaction, so login-by-email keeps working after an edit.
//!
//! ## Sessions
//!
//! Login issues an HS256 JWT carrying the subject id, login handle and role.
//! It travels in the `token` cookie (or an `Authorization: Bearer` header) and
//! is verified on every request; admin routes additionally require the `admin`
//! role.
//!
//! ## Payments
//!
//! Checkout creates an order at the gateway and the gateway callback is
//! accepted only after its HMAC-SHA256 signature is verified.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
