// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dashboard counts.

use std::collections::BTreeMap;

use serde::Serialize;

use selenggara_core::types::{EquipmentTicket, TicketStatus};

/// Bucket for statuses outside [`TicketStatus`].
pub const OTHER_STATUS: &str = "other";

/// Ticket counts for one year, or for every year when `year` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSummary {
    pub year: Option<i64>,
    pub total: usize,
    /// Every known status is present, with zero when unused.
    pub by_status: BTreeMap<String, usize>,
    pub by_device: BTreeMap<String, usize>,
}

impl TicketSummary {
    pub fn from_tickets(year: Option<i64>, tickets: &[EquipmentTicket]) -> Self {
        let mut by_status: BTreeMap<String, usize> = TicketStatus::ALL
            .iter()
            .map(|s| (s.to_string(), 0))
            .collect();
        by_status.insert(OTHER_STATUS.to_string(), 0);
        let mut by_device = BTreeMap::new();

        for ticket in tickets {
            let bucket = match TicketStatus::classify(&ticket.fields.status) {
                Some(status) => status.to_string(),
                None => OTHER_STATUS.to_string(),
            };
            *by_status.entry(bucket).or_default() += 1;
            *by_device.entry(ticket.fields.device.clone()).or_default() += 1;
        }

        Self {
            year,
            total: tickets.len(),
            by_status,
            by_device,
        }
    }
}
