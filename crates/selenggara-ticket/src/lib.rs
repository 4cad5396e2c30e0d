// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Equipment ticket service for the Selenggara maintenance tracker.
//!
//! Owns the rules around tickets: field validation and duplicate detection,
//! per-year BIL allocation (delegated to storage inside one transaction),
//! the permissive status lifecycle, the dropdown option registry and the
//! dashboard summary. Every mutation takes an explicit [`ActorContext`] and
//! is recorded through the audit sink after it succeeds.
//!
//! [`ActorContext`]: selenggara_core::ActorContext

pub mod dropdown;
pub mod service;
pub mod summary;
pub mod validation;

pub use dropdown::{DropdownService, OptionDraft};
pub use service::{StatusChange, TicketRef, TicketService};
pub use summary::TicketSummary;
pub use validation::TicketDraft;

/// `module` column of every audit row written by this crate.
pub const AUDIT_MODULE: &str = "Equipment Management";
