// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;

use crate::error::SelenggaraError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    AuditEntry, DropdownOption, EquipmentTicket, LogPage, TicketFields, TicketFilter, TicketKey,
    YearDensity,
};

/// Adapter for storage and persistence backends.
///
/// Multi-statement ticket operations (`create_ticket`, `update_ticket`,
/// `delete_ticket`, `renumber_year`) must be atomic: either every statement
/// is applied or none is.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), SelenggaraError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), SelenggaraError>;

    // --- Equipment tickets ---

    /// Checks uniqueness, allocates `bil` and `id`, and inserts the ticket.
    ///
    /// Returns [`SelenggaraError::Conflict`] tagged with the first colliding
    /// unique column.
    async fn create_ticket(
        &self,
        year: i64,
        fields: &TicketFields,
    ) -> Result<EquipmentTicket, SelenggaraError>;

    /// Replaces every mutable field of the ticket at `key`.
    ///
    /// Uniqueness is checked against every other ticket first, then the
    /// existing row is loaded (`NotFound` when missing). Returns the row as
    /// it was before and after the update.
    async fn update_ticket(
        &self,
        key: TicketKey,
        fields: &TicketFields,
    ) -> Result<(EquipmentTicket, EquipmentTicket), SelenggaraError>;

    /// Overwrites only `status`. Returns the row before and after.
    async fn update_ticket_status(
        &self,
        key: TicketKey,
        status: &str,
    ) -> Result<(EquipmentTicket, EquipmentTicket), SelenggaraError>;

    /// Deletes the ticket and closes the BIL gap it leaves in its year.
    ///
    /// Returns the deleted row, or `NotFound` without touching any other row.
    async fn delete_ticket(&self, key: TicketKey) -> Result<EquipmentTicket, SelenggaraError>;

    /// Fetches one ticket by its composite key.
    async fn get_ticket(&self, key: TicketKey) -> Result<Option<EquipmentTicket>, SelenggaraError>;

    /// Lists tickets matching the filter, ordered by `(year, bil)`.
    async fn list_tickets(
        &self,
        filter: &TicketFilter,
    ) -> Result<Vec<EquipmentTicket>, SelenggaraError>;

    /// The BIL the next ticket created for `year` would receive.
    async fn next_bil(&self, year: i64) -> Result<i64, SelenggaraError>;

    /// The id the next created ticket would receive.
    async fn next_id(&self) -> Result<i64, SelenggaraError>;

    /// BIL sequence statistics for every year that has tickets.
    async fn year_density(&self) -> Result<Vec<YearDensity>, SelenggaraError>;

    /// Reassigns `bil = 1..N` for the year in current `(bil, id)` order.
    /// Returns the number of rows whose BIL changed.
    async fn renumber_year(&self, year: i64) -> Result<usize, SelenggaraError>;

    // --- Dropdown registry ---

    /// All options ordered by type then value.
    async fn list_dropdown_options(&self) -> Result<Vec<DropdownOption>, SelenggaraError>;

    /// Inserts an option; `Conflict` on a case-insensitive duplicate.
    async fn add_dropdown_option(&self, option: &DropdownOption) -> Result<(), SelenggaraError>;

    /// Deletes an exact (case-sensitive) match. Returns whether a row was removed.
    async fn delete_dropdown_option(&self, option: &DropdownOption)
    -> Result<bool, SelenggaraError>;

    // --- Audit log ---

    /// Appends one audit row.
    async fn append_log(&self, entry: &AuditEntry) -> Result<(), SelenggaraError>;

    /// One page of audit rows, newest first. `page` is 1-based.
    async fn list_logs(&self, page: i64, limit: i64) -> Result<LogPage, SelenggaraError>;
}
