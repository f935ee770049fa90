//! Certificate domain model.
//!
//! # Responsibility
//! - Define the credential record shared by the file and relational stores.
//! - Own the legacy text encoding of secret-question answers.
//!
//! # Invariants
//! - `email` is the natural key across both stores.
//! - Records are never mutated after creation; there is no update path.

pub mod certificate;
pub mod questions;
