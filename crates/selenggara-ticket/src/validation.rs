// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shape validation for ticket payloads.
//!
//! Checks run in a fixed order and stop at the first failure: presence of
//! required fields, the receipt number format, integer keys, then dates.
//! Uniqueness is checked later by storage, inside the write transaction.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use selenggara_core::SelenggaraError;
use selenggara_core::types::{TicketFields, TicketKey};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Ticket payload as submitted by the frontend.
///
/// Every field is optional at this stage. Numbers are accepted where text is
/// expected, since some forms send `year` and `id` unquoted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDraft {
    #[serde(default, deserialize_with = "lenient_string")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub no_resit: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub no_siri: Option<String>,
    #[serde(default, rename = "noKewPA", deserialize_with = "lenient_string")]
    pub no_kew_pa: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub no_report: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub branch: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub device: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub device_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub problem: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub action_taken: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub technician: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tarikh_diresit: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tempoh_warranty: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub submission_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub exit_date: Option<String>,
}

/// Accept a JSON string, number or boolean as text; anything else is absent.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Whether required fields are checked for a new ticket or an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Create,
    Update,
}

impl TicketDraft {
    /// Required fields in the order they are checked, as (JSON name, value).
    fn required(&self, mode: Mode) -> Vec<(&'static str, Option<&str>)> {
        let mut fields = vec![("year", self.year.as_deref())];
        if mode == Mode::Update {
            fields.push(("id", self.id.as_deref()));
        }
        fields.extend([
            ("device", self.device.as_deref()),
            ("noResit", self.no_resit.as_deref()),
            ("name", self.name.as_deref()),
            ("location", self.location.as_deref()),
            ("branch", self.branch.as_deref()),
            ("deviceName", self.device_name.as_deref()),
            ("problem", self.problem.as_deref()),
            ("technician", self.technician.as_deref()),
            ("status", self.status.as_deref()),
            ("tarikhDiresit", self.tarikh_diresit.as_deref()),
        ]);
        fields
    }

    /// Validate a creation payload. Returns the target year and the fields to store.
    pub fn validate_for_create(
        &self,
        lenient_required_dates: bool,
    ) -> Result<(i64, TicketFields), SelenggaraError> {
        check_present(&self.required(Mode::Create))?;
        self.check_receipt()?;
        let year = parse_key_part("year", self.year.as_deref())?;
        let fields = self.checked_fields(lenient_required_dates)?;
        Ok((year, fields))
    }

    /// Validate an update payload. Returns the key of the ticket and its new fields.
    pub fn validate_for_update(
        &self,
        lenient_required_dates: bool,
    ) -> Result<(TicketKey, TicketFields), SelenggaraError> {
        check_present(&self.required(Mode::Update))?;
        self.check_receipt()?;
        let key = TicketKey {
            year: parse_key_part("year", self.year.as_deref())?,
            id: parse_key_part("id", self.id.as_deref())?,
        };
        let fields = self.checked_fields(lenient_required_dates)?;
        Ok((key, fields))
    }

    fn check_receipt(&self) -> Result<(), SelenggaraError> {
        if is_receipt_number(self.no_resit.as_deref().unwrap_or_default()) {
            Ok(())
        } else {
            Err(SelenggaraError::invalid_field(
                "noResit",
                "No. Resit must be exactly 4 digits",
            ))
        }
    }

    /// Normalizes dates and fills unset text with `""`.
    fn checked_fields(&self, lenient_required_dates: bool) -> Result<TicketFields, SelenggaraError> {
        let tarikh_diresit = match normalize_date(self.tarikh_diresit.as_deref()) {
            Some(date) => Some(date),
            None if lenient_required_dates => None,
            None => {
                return Err(SelenggaraError::invalid_field(
                    "tarikhDiresit",
                    "TarikhDiresit must be a valid date (YYYY-MM-DD)",
                ));
            }
        };

        Ok(TicketFields {
            no_resit: text(&self.no_resit),
            no_siri: text(&self.no_siri),
            no_kew_pa: text(&self.no_kew_pa),
            no_report: text(&self.no_report),
            name: text(&self.name),
            location: text(&self.location),
            branch: text(&self.branch),
            device: text(&self.device),
            device_name: text(&self.device_name),
            problem: text(&self.problem),
            action_taken: text(&self.action_taken),
            technician: text(&self.technician),
            status: text(&self.status),
            tarikh_diresit,
            tempoh_warranty: normalize_date(self.tempoh_warranty.as_deref()),
            submission_date: normalize_date(self.submission_date.as_deref()),
            exit_date: normalize_date(self.exit_date.as_deref()),
        })
    }
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Absent or blank after trimming.
pub fn is_missing(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// Fail on the first missing field with `"<Field> is required"`.
pub fn check_present(fields: &[(&'static str, Option<&str>)]) -> Result<(), SelenggaraError> {
    match fields.iter().find(|(_, value)| is_missing(*value)) {
        Some((name, _)) => Err(SelenggaraError::invalid_field(
            *name,
            format!("{} is required", capitalize(name)),
        )),
        None => Ok(()),
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Exactly four ASCII digits.
pub fn is_receipt_number(value: &str) -> bool {
    value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit())
}

/// Parse `year` or `id` as an integer, tagging the failure with the field name.
pub fn parse_key_part(field: &'static str, value: Option<&str>) -> Result<i64, SelenggaraError> {
    value
        .map(str::trim)
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or_else(|| SelenggaraError::invalid_field(field, "Invalid year or id format"))
}

/// Returns the date unchanged when it is a real calendar date written exactly
/// as `YYYY-MM-DD`; otherwise `None`.
pub fn normalize_date(value: Option<&str>) -> Option<String> {
    let value = value?;
    let parsed = NaiveDate::parse_from_str(value, DATE_FORMAT).ok()?;
    let canonical = parsed.format(DATE_FORMAT).to_string();
    (canonical == value).then_some(canonical)
}
