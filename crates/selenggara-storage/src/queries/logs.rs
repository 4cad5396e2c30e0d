// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit log persistence. Append-only.

use rusqlite::params;
use selenggara_core::types::AuditEntry;
use selenggara_core::SelenggaraError;

use crate::database::{Database, map_tr_err};
use crate::models::{LogPage, row_to_log};

pub async fn append(db: &Database, entry: &AuditEntry) -> Result<(), SelenggaraError> {
    let entry = entry.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO logs (user_id, user_name, user_noBadan, action, module, description, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    entry.user_id,
                    entry.user_name,
                    entry.user_no_badan,
                    entry.action.to_string(),
                    entry.module,
                    entry.description,
                    entry.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// One page of log rows, newest first. `page` is 1-based; an offset past
/// `i64::MAX` saturates and yields an empty page.
pub async fn list(db: &Database, page: i64, limit: i64) -> Result<LogPage, SelenggaraError> {
    let offset = page.saturating_sub(1).max(0).saturating_mul(limit.max(0));
    db.connection()
        .call(move |conn| -> Result<LogPage, rusqlite::Error> {
            let total: i64 = conn.query_row("SELECT COUNT(*) FROM logs", [], |row| row.get(0))?;
            let mut stmt = conn.prepare(
                "SELECT id, user_id, user_name, user_noBadan, action, module, description, created_at
                 FROM logs ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
            )?;
            let logs = stmt
                .query_map(params![limit, offset], row_to_log)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(LogPage {
                logs,
                total,
                page,
                limit,
            })
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use selenggara_core::types::AuditAction;

    fn entry(n: u32) -> AuditEntry {
        AuditEntry {
            user_id: 7,
            user_name: "Sjn. Lim".into(),
            user_no_badan: "RF12345".into(),
            action: AuditAction::Update,
            module: "Equipment Management".into(),
            description: format!("entry {n}"),
            created_at: format!("2026-01-01 08:00:{n:02}"),
        }
    }

    #[tokio::test]
    async fn pages_are_newest_first() {
        let db = Database::open_in_memory().await.unwrap();
        for n in 1..=12 {
            append(&db, &entry(n)).await.unwrap();
        }

        let first = list(&db, 1, 5).await.unwrap();
        assert_eq!(first.total, 12);
        assert_eq!(first.total_pages(), 3);
        let descriptions: Vec<_> = first.logs.iter().map(|l| l.description.as_str()).collect();
        assert_eq!(descriptions, ["entry 12", "entry 11", "entry 10", "entry 9", "entry 8"]);
        assert_eq!(first.logs[0].action, "UPDATE");
        assert_eq!(first.logs[0].user_no_badan, "RF12345");

        let last = list(&db, 3, 5).await.unwrap();
        assert_eq!(last.logs.len(), 2);
        assert_eq!(last.logs[1].description, "entry 1");

        let beyond = list(&db, 9, 5).await.unwrap();
        assert!(beyond.logs.is_empty());
        assert_eq!(beyond.total, 12);
    }

    #[tokio::test]
    async fn huge_page_number_is_an_empty_page() {
        let db = Database::open_in_memory().await.unwrap();
        append(&db, &entry(1)).await.unwrap();

        let page = list(&db, i64::MAX, 100).await.unwrap();
        assert!(page.logs.is_empty());
        assert_eq!(page.total, 1);
        assert_eq!(page.page, i64::MAX);
    }
}
