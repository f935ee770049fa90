//! Command services consumed by the shell.
//!
//! # Responsibility
//! - Orchestrate the file store and the relational repository into the
//!   add/delete commands.
//! - Keep shells decoupled from storage details.

pub mod certificate_service;
