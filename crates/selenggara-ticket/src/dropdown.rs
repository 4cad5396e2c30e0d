// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dropdown option registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use selenggara_audit::AuditSink;
use selenggara_core::types::{ActorContext, AuditAction, DropdownOption};
use selenggara_core::{SelenggaraError, StorageAdapter};

use crate::AUDIT_MODULE;
use crate::validation::{is_missing, lenient_string};

/// `{type, value}` as submitted by the settings screen.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptionDraft {
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: Option<String>,
}

impl OptionDraft {
    fn option(&self) -> Result<DropdownOption, SelenggaraError> {
        if is_missing(self.kind.as_deref()) || is_missing(self.value.as_deref()) {
            return Err(SelenggaraError::invalid("Missing 'type' or 'value'"));
        }
        Ok(DropdownOption {
            kind: self.kind.clone().unwrap_or_default(),
            value: self.value.clone().unwrap_or_default(),
        })
    }
}

#[derive(Clone)]
pub struct DropdownService {
    storage: Arc<dyn StorageAdapter>,
    audit: AuditSink,
}

impl DropdownService {
    pub fn new(storage: Arc<dyn StorageAdapter>, audit: AuditSink) -> Self {
        Self { storage, audit }
    }

    /// Every option grouped by type. Values keep storage order (sorted).
    pub async fn fetch(&self) -> Result<BTreeMap<String, Vec<String>>, SelenggaraError> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for option in self.storage.list_dropdown_options().await? {
            grouped.entry(option.kind).or_default().push(option.value);
        }
        Ok(grouped)
    }

    pub async fn add(&self, actor: &ActorContext, draft: &OptionDraft) -> Result<(), SelenggaraError> {
        let option = draft.option()?;
        self.storage.add_dropdown_option(&option).await?;
        info!(kind = %option.kind, value = %option.value, "dropdown option added");
        self.audit.record(
            actor,
            AuditAction::Create,
            AUDIT_MODULE,
            format!(
                "Added dropdown option: Type '{}', Value '{}'",
                option.kind, option.value
            ),
        );
        Ok(())
    }

    /// Exact, case-sensitive removal.
    pub async fn delete(&self, actor: &ActorContext, draft: &OptionDraft) -> Result<(), SelenggaraError> {
        let option = draft.option()?;
        if !self.storage.delete_dropdown_option(&option).await? {
            return Err(SelenggaraError::NotFound("Option not found".into()));
        }
        info!(kind = %option.kind, value = %option.value, "dropdown option deleted");
        self.audit.record(
            actor,
            AuditAction::Delete,
            AUDIT_MODULE,
            format!(
                "Deleted dropdown option: Type '{}', Value '{}'",
                option.kind, option.value
            ),
        );
        Ok(())
    }
}
