// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the storage, ticket, audit and gateway crates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

// --- Equipment tickets ---

/// Composite identity of an equipment ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketKey {
    pub year: i64,
    pub id: i64,
}

impl std::fmt::Display for TicketKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.year, self.id)
    }
}

/// Every mutable attribute of a ticket, i.e. everything except `year`, `id`
/// and `bil`.
///
/// Optional text fields hold the empty string when unset. Date fields hold a
/// normalized `YYYY-MM-DD` string or `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketFields {
    pub no_resit: String,
    pub no_siri: String,
    #[serde(rename = "noKewPA")]
    pub no_kew_pa: String,
    pub no_report: String,
    pub name: String,
    pub location: String,
    pub branch: String,
    pub device: String,
    pub device_name: String,
    pub problem: String,
    pub action_taken: String,
    pub technician: String,
    pub status: String,
    pub tarikh_diresit: Option<String>,
    pub tempoh_warranty: Option<String>,
    pub submission_date: Option<String>,
    pub exit_date: Option<String>,
}

impl TicketFields {
    /// The value held in one of the globally unique columns.
    pub fn unique_value(&self, field: UniqueField) -> &str {
        match field {
            UniqueField::NoResit => &self.no_resit,
            UniqueField::NoSiri => &self.no_siri,
            UniqueField::NoKewPa => &self.no_kew_pa,
            UniqueField::NoReport => &self.no_report,
        }
    }
}

/// One equipment repair/maintenance record as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentTicket {
    pub year: i64,
    pub id: i64,
    /// Per-year display sequence, dense from 1.
    pub bil: i64,
    #[serde(flatten)]
    pub fields: TicketFields,
}

impl EquipmentTicket {
    pub fn key(&self) -> TicketKey {
        TicketKey {
            year: self.year,
            id: self.id,
        }
    }
}

/// Columns that must be unique across the whole table when non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueField {
    NoResit,
    NoSiri,
    NoKewPa,
    NoReport,
}

impl UniqueField {
    /// All unique columns, in the order they are checked.
    pub const CHECK_ORDER: [UniqueField; 4] = [
        UniqueField::NoResit,
        UniqueField::NoSiri,
        UniqueField::NoKewPa,
        UniqueField::NoReport,
    ];

    /// Column name in the `equipment` table (also the JSON field name).
    pub fn column(self) -> &'static str {
        match self {
            UniqueField::NoResit => "noResit",
            UniqueField::NoSiri => "noSiri",
            UniqueField::NoKewPa => "noKewPA",
            UniqueField::NoReport => "noReport",
        }
    }

    /// Label used in user-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            UniqueField::NoResit => "No. Resit",
            UniqueField::NoSiri => "No. Siri",
            UniqueField::NoKewPa => "No. Kew PA",
            UniqueField::NoReport => "No. Report",
        }
    }
}

/// Known ticket status values.
///
/// Status is stored as free text and any value may replace any other; this
/// enum only classifies stored values for summaries and seeding.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum TicketStatus {
    #[strum(serialize = "Belum Selesai")]
    #[serde(rename = "Belum Selesai")]
    BelumSelesai,
    #[strum(serialize = "KIV")]
    #[serde(rename = "KIV")]
    Kiv,
    #[strum(serialize = "Dilupuskan")]
    #[serde(rename = "Dilupuskan")]
    Dilupuskan,
    #[strum(serialize = "Selesai")]
    #[serde(rename = "Selesai")]
    Selesai,
    #[strum(serialize = "Berada di User")]
    #[serde(rename = "Berada di User")]
    BeradaDiUser,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 5] = [
        TicketStatus::BelumSelesai,
        TicketStatus::Kiv,
        TicketStatus::Dilupuskan,
        TicketStatus::Selesai,
        TicketStatus::BeradaDiUser,
    ];

    /// Classify a stored status string. Matching is exact.
    pub fn classify(value: &str) -> Option<TicketStatus> {
        value.parse().ok()
    }
}

/// Optional filters for listing tickets. All present filters are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub year: Option<i64>,
    pub status: Option<String>,
    /// Case-sensitive substring matched against the receipt, serial, asset,
    /// report numbers and the BIL.
    pub search: Option<String>,
}

/// Sequence health of one year, used by `doctor` and `repair`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearDensity {
    pub year: i64,
    pub count: i64,
    pub distinct_bils: i64,
    pub min_bil: i64,
    pub max_bil: i64,
}

impl YearDensity {
    /// True when the BIL values of the year are exactly `1..=count`.
    pub fn is_dense(&self) -> bool {
        self.count == 0
            || (self.distinct_bils == self.count && self.min_bil == 1 && self.max_bil == self.count)
    }
}

// --- Dropdown registry ---

/// A selectable value for one of the ticket's dropdown-backed fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownOption {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

// --- Actor & audit ---

/// Identity of whoever issued a request, passed explicitly to every service call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub user_id: i64,
    pub user_name: String,
    pub user_role: Option<String>,
    pub no_badan: String,
}

impl ActorContext {
    /// The actor used when no session identity is available.
    pub fn anonymous() -> Self {
        Self {
            user_id: 0,
            user_name: "System".to_string(),
            user_role: None,
            no_badan: "-".to_string(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id == 0
    }
}

impl Default for ActorContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// The kind of mutation an audit entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

/// One append-only audit log row, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub user_id: i64,
    pub user_name: String,
    pub user_no_badan: String,
    pub action: AuditAction,
    pub module: String,
    pub description: String,
    /// `YYYY-MM-DD HH:MM:SS` in the configured local offset.
    pub created_at: String,
}

/// An audit log row as read back for the admin log listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    #[serde(rename = "user_noBadan")]
    pub user_no_badan: String,
    pub action: String,
    pub module: String,
    pub description: String,
    pub created_at: String,
}

/// One page of audit log rows, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPage {
    pub logs: Vec<LogRecord>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl LogPage {
    pub fn total_pages(&self) -> i64 {
        if self.limit <= 0 {
            return 0;
        }
        (self.total + self.limit - 1) / self.limit
    }
}
