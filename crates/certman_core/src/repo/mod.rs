//! Persistence backends for certificate records.
//!
//! # Responsibility
//! - `file_store`: one directory plus credentials document per record.
//! - `certificate_repo`: one row per record in the `certificates` table.
//!
//! # Invariants
//! - Both backends key records by email.
//! - Neither backend knows about the other; keeping them in lockstep is the
//!   service layer's job.

pub mod certificate_repo;
pub mod file_store;
