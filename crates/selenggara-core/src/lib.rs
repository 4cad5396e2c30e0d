// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Selenggara equipment maintenance tracker.
//!
//! This crate provides the error type, the domain types shared across the
//! workspace (tickets, dropdown options, actors, audit entries), and the
//! storage adapter trait that persistence backends implement.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::SelenggaraError;
pub use types::{
    ActorContext, AuditAction, AuditEntry, DropdownOption, EquipmentTicket, HealthStatus,
    LogPage, LogRecord, TicketFields, TicketFilter, TicketKey, TicketStatus, UniqueField,
    YearDensity,
};

pub use traits::{PluginAdapter, StorageAdapter};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn selenggara_error_has_all_variants() {
        let _config = SelenggaraError::Config("test".into());
        let _storage = SelenggaraError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _validation = SelenggaraError::invalid_field("noResit", "bad");
        let _conflict = SelenggaraError::conflict_field("noSiri", "taken");
        let _not_found = SelenggaraError::NotFound("Equipment not found".into());
        let _internal = SelenggaraError::Internal("test".into());
    }

    #[test]
    fn error_field_and_client_classification() {
        let err = SelenggaraError::invalid_field("noResit", "No. Resit must be exactly 4 digits");
        assert_eq!(err.field(), Some("noResit"));
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "No. Resit must be exactly 4 digits");

        let err = SelenggaraError::conflict("This option already exists.");
        assert_eq!(err.field(), None);
        assert!(err.is_client_error());

        let err = SelenggaraError::Storage {
            source: "disk I/O error".into(),
        };
        assert!(!err.is_client_error());
    }

    #[test]
    fn ticket_serializes_with_frontend_field_names() {
        let ticket = EquipmentTicket {
            year: 2025,
            id: 7,
            bil: 3,
            fields: TicketFields {
                no_resit: "1234".into(),
                no_kew_pa: "KEW-1".into(),
                device_name: "Dell Latitude".into(),
                tarikh_diresit: Some("2025-01-02".into()),
                ..TicketFields::default()
            },
        };
        let json = serde_json::to_value(&ticket).unwrap();
        assert_eq!(json["year"], 2025);
        assert_eq!(json["bil"], 3);
        assert_eq!(json["noResit"], "1234");
        assert_eq!(json["noKewPA"], "KEW-1");
        assert_eq!(json["deviceName"], "Dell Latitude");
        assert_eq!(json["tarikhDiresit"], "2025-01-02");
        assert!(json["exitDate"].is_null());
        assert_eq!(json["noSiri"], "");

        let back: EquipmentTicket = serde_json::from_value(json).unwrap();
        assert_eq!(back, ticket);
    }

    #[test]
    fn ticket_status_display_and_classify() {
        for status in TicketStatus::ALL {
            assert_eq!(TicketStatus::classify(&status.to_string()), Some(status));
        }
        assert_eq!(TicketStatus::BeradaDiUser.to_string(), "Berada di User");
        assert_eq!(TicketStatus::classify("kiv"), None);
        assert_eq!(TicketStatus::classify("Menunggu Alat Ganti"), None);
    }

    #[test]
    fn unique_fields_check_in_declared_order() {
        let columns: Vec<_> = UniqueField::CHECK_ORDER.iter().map(|f| f.column()).collect();
        assert_eq!(columns, ["noResit", "noSiri", "noKewPA", "noReport"]);
        assert_eq!(UniqueField::NoKewPa.label(), "No. Kew PA");
    }

    #[test]
    fn anonymous_actor_is_system() {
        let actor = ActorContext::default();
        assert!(actor.is_anonymous());
        assert_eq!(actor.user_name, "System");
        assert_eq!(actor.no_badan, "-");
    }

    #[test]
    fn audit_action_uppercase() {
        assert_eq!(AuditAction::Create.to_string(), "CREATE");
        assert_eq!("DELETE".parse::<AuditAction>().unwrap(), AuditAction::Delete);
    }

    #[test]
    fn year_density_detects_gaps_and_duplicates() {
        let dense = YearDensity {
            year: 2024,
            count: 3,
            distinct_bils: 3,
            min_bil: 1,
            max_bil: 3,
        };
        assert!(dense.is_dense());

        let gap = YearDensity { max_bil: 4, ..dense.clone() };
        assert!(!gap.is_dense());

        let duplicate = YearDensity {
            distinct_bils: 2,
            ..dense
        };
        assert!(!duplicate.is_dense());
    }

    proptest! {
        #[test]
        fn log_page_total_pages_is_ceiling(total in 0i64..10_000, limit in 1i64..200) {
            let page = LogPage { logs: vec![], total, page: 1, limit };
            let pages = page.total_pages();
            prop_assert!(pages * limit >= total);
            prop_assert!(pages == 0 || (pages - 1) * limit < total);
        }
    }
}
