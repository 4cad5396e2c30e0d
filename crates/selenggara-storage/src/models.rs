// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mapping between the `equipment` table and [`EquipmentTicket`].
//!
//! The canonical types live in `selenggara-core::types`; this module only
//! knows how they are laid out in SQL.

pub use selenggara_core::types::{
    DropdownOption, EquipmentTicket, LogPage, LogRecord, TicketFields, YearDensity,
};

/// Column list shared by every `SELECT` that builds a ticket with [`row_to_ticket`].
pub(crate) const TICKET_COLUMNS: &str = "year, id, bil, noResit, noSiri, noKewPA, noReport, \
     name, location, branch, device, deviceName, problem, actionTaken, technician, status, \
     tarikhDiresit, tempohWarranty, submissionDate, exitDate";

/// Build a ticket from a row selected with [`TICKET_COLUMNS`].
pub(crate) fn row_to_ticket(row: &rusqlite::Row<'_>) -> Result<EquipmentTicket, rusqlite::Error> {
    Ok(EquipmentTicket {
        year: row.get(0)?,
        id: row.get(1)?,
        bil: row.get(2)?,
        fields: TicketFields {
            no_resit: row.get(3)?,
            no_siri: row.get(4)?,
            no_kew_pa: row.get(5)?,
            no_report: row.get(6)?,
            name: row.get(7)?,
            location: row.get(8)?,
            branch: row.get(9)?,
            device: row.get(10)?,
            device_name: row.get(11)?,
            problem: row.get(12)?,
            action_taken: row.get(13)?,
            technician: row.get(14)?,
            status: row.get(15)?,
            tarikh_diresit: row.get(16)?,
            tempoh_warranty: row.get(17)?,
            submission_date: row.get(18)?,
            exit_date: row.get(19)?,
        },
    })
}

pub(crate) fn row_to_log(row: &rusqlite::Row<'_>) -> Result<LogRecord, rusqlite::Error> {
    Ok(LogRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        user_name: row.get(2)?,
        user_no_badan: row.get(3)?,
        action: row.get(4)?,
        module: row.get(5)?,
        description: row.get(6)?,
        created_at: row.get(7)?,
    })
}
