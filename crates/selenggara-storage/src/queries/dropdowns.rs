// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dropdown option registry queries.

use rusqlite::params;
use selenggara_core::SelenggaraError;

use crate::database::{Database, map_tr_err};
use crate::models::DropdownOption;
use crate::writer::{TxOutcome, write_tx};

/// All options ordered by type, then value.
pub async fn list_options(db: &Database) -> Result<Vec<DropdownOption>, SelenggaraError> {
    db.connection()
        .call(|conn| -> Result<Vec<DropdownOption>, rusqlite::Error> {
            let mut stmt =
                conn.prepare("SELECT type, value FROM dropdown_options ORDER BY type ASC, value ASC")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(DropdownOption {
                        kind: row.get(0)?,
                        value: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)
}

/// Insert an option unless one with the same type and value exists,
/// ignoring ASCII case.
pub async fn add_option(db: &Database, option: &DropdownOption) -> Result<(), SelenggaraError> {
    let option = option.clone();
    write_tx(db, move |tx| -> TxOutcome<()> {
        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM dropdown_options
                 WHERE lower(type) = lower(?1) AND lower(value) = lower(?2))",
            params![option.kind, option.value],
            |row| row.get(0),
        )?;
        if exists {
            return Ok(Err(SelenggaraError::conflict("This option already exists.")));
        }
        tx.execute(
            "INSERT INTO dropdown_options (type, value) VALUES (?1, ?2)",
            params![option.kind, option.value],
        )?;
        Ok(Ok(()))
    })
    .await
}

/// Delete the option matching type and value exactly. Returns whether a row was removed.
pub async fn delete_option(db: &Database, option: &DropdownOption) -> Result<bool, SelenggaraError> {
    let option = option.clone();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let removed = conn.execute(
                "DELETE FROM dropdown_options WHERE type = ?1 AND value = ?2",
                params![option.kind, option.value],
            )?;
            Ok(removed > 0)
        })
        .await
        .map_err(map_tr_err)
}
