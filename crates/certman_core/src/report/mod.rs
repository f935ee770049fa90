//! Weekly reporting over the relational store.
//!
//! # Responsibility
//! - Compute the Monday..Sunday window containing "today".
//! - Turn the window's certificates into display-ready rows plus a total.
//!
//! # Invariants
//! - Reports read only from the relational store.
//! - Row order follows the store's ascending `when_added` order.

pub mod weekly;
