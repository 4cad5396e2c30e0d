// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `selenggara repair` command implementation.
//!
//! Renumbers BIL values to 1..N in `(bil, id)` order. Existing data written
//! before deletes were transactional can carry gaps or duplicate BILs.

use selenggara_config::SelenggaraConfig;
use selenggara_core::{SelenggaraError, StorageAdapter};
use selenggara_storage::SqliteStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairTarget {
    Year(i64),
    /// Every year that is not already dense.
    All,
}

/// Outcome for one repaired year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearRepair {
    pub year: i64,
    pub changed: usize,
}

pub async fn run_repair(config: &SelenggaraConfig, target: RepairTarget) -> Result<(), SelenggaraError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;

    let repaired = repair(&storage, target).await?;
    if repaired.is_empty() {
        println!("  Nothing to repair: every BIL sequence is already 1..N.");
    }
    for YearRepair { year, changed } in &repaired {
        let word = if *changed == 1 { "ticket" } else { "tickets" };
        println!("  {year}: renumbered {changed} {word}");
    }

    storage.close().await
}

pub async fn repair(
    storage: &dyn StorageAdapter,
    target: RepairTarget,
) -> Result<Vec<YearRepair>, SelenggaraError> {
    let years: Vec<i64> = match target {
        RepairTarget::Year(year) => vec![year],
        RepairTarget::All => storage
            .year_density()
            .await?
            .into_iter()
            .filter(|d| !d.is_dense())
            .map(|d| d.year)
            .collect(),
    };

    let mut repaired = Vec::new();
    for year in years {
        let changed = storage.renumber_year(year).await?;
        tracing::info!(year, changed, "renumbered BIL sequence");
        if changed > 0 {
            repaired.push(YearRepair { year, changed });
        }
    }
    Ok(repaired)
}
