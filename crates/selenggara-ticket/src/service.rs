// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket lifecycle orchestration.
//!
//! Status is a flat label: any value may replace any other, and no
//! transition is rejected. [`TicketStatus`] only classifies stored values.
//!
//! [`TicketStatus`]: selenggara_core::TicketStatus

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use selenggara_audit::AuditSink;
use selenggara_core::types::{
    ActorContext, AuditAction, EquipmentTicket, TicketFields, TicketFilter, TicketKey,
};
use selenggara_core::{SelenggaraError, StorageAdapter};

use crate::AUDIT_MODULE;
use crate::summary::TicketSummary;
use crate::validation::{TicketDraft, check_present, is_missing, lenient_string, parse_key_part};

/// `{year, id}` naming an existing ticket.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketRef {
    #[serde(default, deserialize_with = "lenient_string")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
}

impl TicketRef {
    pub fn key(&self) -> Result<TicketKey, SelenggaraError> {
        if is_missing(self.year.as_deref()) || is_missing(self.id.as_deref()) {
            return Err(SelenggaraError::invalid("Missing year or id"));
        }
        Ok(TicketKey {
            year: parse_key_part("year", self.year.as_deref())?,
            id: parse_key_part("id", self.id.as_deref())?,
        })
    }
}

/// Payload of a status-only update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusChange {
    #[serde(default, deserialize_with = "lenient_string")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
}

/// The equipment ticket service.
#[derive(Clone)]
pub struct TicketService {
    storage: Arc<dyn StorageAdapter>,
    audit: AuditSink,
    lenient_required_dates: bool,
}

impl TicketService {
    pub fn new(storage: Arc<dyn StorageAdapter>, audit: AuditSink, lenient_required_dates: bool) -> Self {
        Self {
            storage,
            audit,
            lenient_required_dates,
        }
    }

    /// Validate, allocate `bil`/`id`, insert, then audit.
    pub async fn create(
        &self,
        actor: &ActorContext,
        draft: &TicketDraft,
    ) -> Result<EquipmentTicket, SelenggaraError> {
        let (year, fields) = draft.validate_for_create(self.lenient_required_dates)?;
        let ticket = self.storage.create_ticket(year, &fields).await?;
        info!(year, id = ticket.id, bil = ticket.bil, user = %actor.user_name, "equipment created");
        self.audit.record(
            actor,
            AuditAction::Create,
            AUDIT_MODULE,
            format!("Create equipment: {}", describe(&ticket.fields)),
        );
        Ok(ticket)
    }

    /// Replace every mutable field of an existing ticket.
    pub async fn update(
        &self,
        actor: &ActorContext,
        draft: &TicketDraft,
    ) -> Result<EquipmentTicket, SelenggaraError> {
        let (key, fields) = draft.validate_for_update(self.lenient_required_dates)?;
        let (before, after) = self.storage.update_ticket(key, &fields).await?;
        info!(%key, user = %actor.user_name, "equipment updated");
        let description = if before.fields.device_name == after.fields.device_name {
            format!("Updated equipment: {}", describe(&after.fields))
        } else {
            format!(
                "Updated equipment: {} -> {}",
                before.fields.device_name,
                describe(&after.fields)
            )
        };
        self.audit
            .record(actor, AuditAction::Update, AUDIT_MODULE, description);
        Ok(after)
    }

    /// Overwrite only the status. No other field is re-validated.
    pub async fn update_status(
        &self,
        actor: &ActorContext,
        change: &StatusChange,
    ) -> Result<EquipmentTicket, SelenggaraError> {
        check_present(&[
            ("year", change.year.as_deref()),
            ("id", change.id.as_deref()),
            ("status", change.status.as_deref()),
        ])?;
        let key = TicketKey {
            year: parse_key_part("year", change.year.as_deref())?,
            id: parse_key_part("id", change.id.as_deref())?,
        };
        let status = change.status.clone().unwrap_or_default();
        let (before, after) = self.storage.update_ticket_status(key, &status).await?;
        info!(%key, from = %before.fields.status, to = %after.fields.status, "equipment status changed");
        self.audit.record(
            actor,
            AuditAction::Update,
            AUDIT_MODULE,
            format!(
                "Updated equipment status: {} (No. Resit: {}, Status: {} -> {})",
                after.fields.device_name,
                after.fields.no_resit,
                before.fields.status,
                after.fields.status
            ),
        );
        Ok(after)
    }

    /// Delete a ticket and close the BIL gap it leaves.
    pub async fn delete(
        &self,
        actor: &ActorContext,
        target: &TicketRef,
    ) -> Result<EquipmentTicket, SelenggaraError> {
        let key = target.key()?;
        let removed = self.storage.delete_ticket(key).await?;
        info!(%key, bil = removed.bil, user = %actor.user_name, "equipment deleted");
        self.audit.record(
            actor,
            AuditAction::Delete,
            AUDIT_MODULE,
            format!("Deleted equipment: {}", describe(&removed.fields)),
        );
        Ok(removed)
    }

    pub async fn list(&self, filter: &TicketFilter) -> Result<Vec<EquipmentTicket>, SelenggaraError> {
        self.storage.list_tickets(filter).await
    }

    pub async fn get(&self, target: &TicketRef) -> Result<EquipmentTicket, SelenggaraError> {
        let key = target.key()?;
        self.storage
            .get_ticket(key)
            .await?
            .ok_or_else(|| SelenggaraError::NotFound("Equipment not found".into()))
    }

    /// The BIL the next ticket of `year` would receive. Nothing is reserved.
    pub async fn next_bil(&self, year: Option<&str>) -> Result<i64, SelenggaraError> {
        let year = year
            .map(str::trim)
            .and_then(|y| y.parse::<i64>().ok())
            .ok_or_else(|| SelenggaraError::invalid_field("year", "Year parameter is required"))?;
        self.storage.next_bil(year).await
    }

    pub async fn summary(&self, year: Option<i64>) -> Result<TicketSummary, SelenggaraError> {
        let filter = TicketFilter {
            year,
            ..TicketFilter::default()
        };
        let tickets = self.storage.list_tickets(&filter).await?;
        Ok(TicketSummary::from_tickets(year, &tickets))
    }
}

fn describe(fields: &TicketFields) -> String {
    format!(
        "{} (No. Resit: {}, Status: {})",
        fields.device_name, fields.no_resit, fields.status
    )
}
