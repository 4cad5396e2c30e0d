// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./selenggara.toml` > `~/.config/selenggara/selenggara.toml`
//! > `/etc/selenggara/selenggara.toml` with environment variable overrides via
//! the `SELENGGARA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::SelenggaraConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/selenggara/selenggara.toml` (system-wide)
/// 3. `~/.config/selenggara/selenggara.toml` (user XDG config)
/// 4. `./selenggara.toml` (local directory)
/// 5. `SELENGGARA_*` environment variables
pub fn load_config() -> Result<SelenggaraConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<SelenggaraConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SelenggaraConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SelenggaraConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SelenggaraConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SelenggaraConfig::default()))
        .merge(Toml::file("/etc/selenggara/selenggara.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("selenggara/selenggara.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("selenggara.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `SELENGGARA_STORAGE_DATABASE_PATH` must map to
/// `storage.database_path`, not `storage.database.path`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("SELENGGARA_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a prefix-stripped env var name to its dotted config path.
///
/// figment hands the key over with its original case, so matching is done
/// on the lowercased name.
pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 5] = ["server", "storage", "gateway", "audit", "tickets"];
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_section_prefix_only() {
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("gateway_bearer_token"), "gateway.bearer_token");
        assert_eq!(
            map_env_key("tickets_lenient_required_dates"),
            "tickets.lenient_required_dates"
        );
        assert_eq!(map_env_key("server_port"), "server.port");
    }

    #[test]
    fn env_keys_are_matched_case_insensitively() {
        assert_eq!(map_env_key("SERVER_PORT"), "server.port");
        assert_eq!(map_env_key("STORAGE_DATABASE_PATH"), "storage.database_path");
        assert_eq!(map_env_key("Audit_Utc_Offset_Minutes"), "audit.utc_offset_minutes");
    }

    #[test]
    fn unknown_env_keys_pass_through() {
        assert_eq!(map_env_key("something_else"), "something_else");
    }
}
