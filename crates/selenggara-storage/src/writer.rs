// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-writer transactions.
//!
//! All writes in selenggara-storage are serialized through `tokio-rusqlite`'s
//! single background thread. Multi-statement operations additionally run in
//! a `BEGIN IMMEDIATE` transaction so that an external process sharing the
//! file (the `repair` subcommand, for instance) cannot interleave between the
//! read of `MAX(bil)` and the insert that uses it.
//!
//! **Do NOT create additional Connection instances for writes.**

use rusqlite::{Connection, Transaction, TransactionBehavior};
use selenggara_core::SelenggaraError;

use crate::database::{Database, map_tr_err};

/// Outcome of a closure run inside a write transaction.
///
/// The outer `Result` carries SQL failures; the inner one carries domain
/// rejections (conflict, not-found). Returning an inner `Err` drops the
/// transaction uncommitted, which rolls it back.
pub(crate) type TxOutcome<T> = Result<Result<T, SelenggaraError>, rusqlite::Error>;

/// Run `f` inside an IMMEDIATE transaction on the writer thread, committing
/// only when `f` returns `Ok(Ok(_))`.
pub(crate) async fn write_tx<T, F>(db: &Database, f: F) -> Result<T, SelenggaraError>
where
    T: Send + 'static,
    F: FnOnce(&Transaction<'_>) -> TxOutcome<T> + Send + 'static,
{
    db.connection()
        .call(move |conn: &mut Connection| -> TxOutcome<T> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            match f(&tx)? {
                Ok(value) => {
                    tx.commit()?;
                    Ok(Ok(value))
                }
                Err(rejection) => Ok(Err(rejection)),
            }
        })
        .await
        .map_err(map_tr_err)?
}
