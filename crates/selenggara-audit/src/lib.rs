// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort audit trail for the Selenggara maintenance tracker.
//!
//! Services call [`AuditSink::record`] after a mutation succeeds. The entry is
//! stamped and handed to a bounded queue; a background [`AuditWriter`] task
//! appends it to storage. Nothing on this path can fail the caller: a full or
//! closed queue drops the entry, a failed insert is logged, and both are
//! reported with `warn!`.

pub mod clock;
pub mod sink;
pub mod writer;

pub use clock::AuditClock;
pub use sink::AuditSink;
pub use writer::AuditWriter;

use selenggara_core::types::AuditEntry;
use tokio::sync::oneshot;

/// Messages carried from [`AuditSink`] to [`AuditWriter`].
#[derive(Debug)]
pub enum AuditCommand {
    /// Append one entry.
    Record(AuditEntry),
    /// Reply once every command queued before this one has been handled.
    Flush(oneshot::Sender<()>),
}

/// Create a connected sink/writer pair.
///
/// `capacity` bounds the number of queued commands; `utc_offset_minutes`
/// sets the local time used for `created_at`.
pub fn audit_channel(capacity: usize, utc_offset_minutes: i32) -> (AuditSink, AuditWriter) {
    let (tx, rx) = tokio::sync::mpsc::channel(capacity.max(1));
    (
        AuditSink::new(tx, AuditClock::from_offset_minutes(utc_offset_minutes)),
        AuditWriter::new(rx),
    )
}
