// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Selenggara configuration system.

use selenggara_config::diagnostic::{ConfigError, suggest_key};
use selenggara_config::model::SelenggaraConfig;
use selenggara_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 9090
log_level = "debug"
cors_origins = ["http://localhost:3000"]

[storage]
database_path = "/tmp/test.db"
wal_mode = false

[gateway]
bearer_token = "s3cret"

[audit]
channel_capacity = 16
utc_offset_minutes = 0

[tickets]
lenient_required_dates = true
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.server.log_level, "debug");
    assert_eq!(config.server.cors_origins, vec!["http://localhost:3000"]);
    assert_eq!(config.storage.database_path, "/tmp/test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.gateway.bearer_token.as_deref(), Some("s3cret"));
    assert_eq!(config.audit.channel_capacity, 16);
    assert_eq!(config.audit.utc_offset_minutes, 0);
    assert!(config.tickets.lenient_required_dates);
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.log_level, "info");
    assert!(config.server.cors_origins.is_empty());
    assert!(config.storage.database_path.ends_with("selenggara.db"));
    assert!(config.storage.wal_mode);
    assert!(config.gateway.bearer_token.is_none());
    assert_eq!(config.audit.channel_capacity, 256);
    assert_eq!(config.audit.utc_offset_minutes, 480);
    assert!(!config.tickets.lenient_required_dates);
}

/// Unknown field in [server] produces an error mentioning the key.
#[test]
fn unknown_field_in_server_produces_error() {
    let toml = r#"
[server]
prot = 80
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("prot"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[logging]
level = "debug"
"#;

    let err = load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("logging"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Dotted overrides (what the env provider produces) win over TOML values.
#[test]
fn dotted_override_wins_over_toml() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let toml_content = r#"
[storage]
database_path = "from-toml.db"
"#;

    let config: SelenggaraConfig = Figment::new()
        .merge(Serialized::defaults(SelenggaraConfig::default()))
        .merge(Toml::string(toml_content))
        .merge(("storage.database_path", "from-env.db"))
        .extract()
        .expect("should merge override");

    assert_eq!(config.storage.database_path, "from-env.db");
}

/// `SELENGGARA_*` variables map onto underscore-bearing keys and beat local files.
#[test]
fn env_vars_override_local_file() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "selenggara.toml",
            r#"
[server]
port = 7000

[gateway]
bearer_token = "from-file"
"#,
        )?;
        jail.set_env("SELENGGARA_SERVER_PORT", "9191");
        jail.set_env("SELENGGARA_STORAGE_DATABASE_PATH", "/var/lib/selenggara/x.db");
        jail.set_env("SELENGGARA_TICKETS_LENIENT_REQUIRED_DATES", "true");

        let config = selenggara_config::load_config()?;
        assert_eq!(config.server.port, 9191);
        assert_eq!(config.storage.database_path, "/var/lib/selenggara/x.db");
        assert_eq!(config.gateway.bearer_token.as_deref(), Some("from-file"));
        assert!(config.tickets.lenient_required_dates);
        Ok(())
    });
}

/// Missing config files are silently skipped (Figment's Toml::file() behavior).
#[test]
fn missing_config_files_silently_skipped() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: SelenggaraConfig = Figment::new()
        .merge(Serialized::defaults(SelenggaraConfig::default()))
        .merge(Toml::file("/nonexistent/path/selenggara.toml"))
        .extract()
        .expect("missing file should be silently skipped");

    assert_eq!(config.server.port, 8080);
}

/// An explicit config file is loaded and validated.
#[test]
fn load_and_validate_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[server]\nport = 8181\n").unwrap();

    let config = load_and_validate_path(&path).expect("explicit file should validate");
    assert_eq!(config.server.port, 8181);
}

/// A typo in an explicit file is reported against that file.
#[test]
fn explicit_path_typo_points_into_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("typo.toml");
    std::fs::write(&path, "[storage]\ndatabse_path = \"x.db\"\n").unwrap();

    let errors = load_and_validate_path(&path).expect_err("typo should fail");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, .. }
            if key == "databse_path" && suggestion.as_deref() == Some("database_path"))
    });
    assert!(found, "expected UnknownKey with suggestion, got: {errors:?}");
}

// ============================================================================
// Diagnostic tests
// ============================================================================

#[test]
fn diagnostic_prot_suggests_port() {
    let valid_keys = &["host", "port", "log_level", "cors_origins"];
    assert_eq!(suggest_key("prot", valid_keys), Some("port".to_string()));
}

#[test]
fn diagnostic_no_suggestion_for_distant_typo() {
    let valid_keys = &["channel_capacity", "utc_offset_minutes"];
    assert!(suggest_key("zzzzzz", valid_keys).is_none());
}

/// Error output from load_and_validate_str includes the key, a suggestion,
/// the valid keys and a span into the inline source.
#[test]
fn diagnostic_error_includes_unknown_key() {
    let toml = r#"
[server]
prot = 80
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    assert!(!errors.is_empty(), "should have at least one error");

    let has_unknown_key = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "prot"
                && suggestion.as_deref() == Some("port")
                && valid_keys.contains("host")
                && valid_keys.contains("cors_origins")
        })
    });
    assert!(
        has_unknown_key,
        "should have UnknownKey error for 'prot' with suggestion 'port', got: {errors:?}"
    );
}

/// Invalid type (string where number expected) produces clear message.
#[test]
fn diagnostic_invalid_type_message() {
    let toml = r#"
[server]
port = "eighty"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject invalid type");
    let has_invalid_type = errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("port")));
    assert!(has_invalid_type, "expected InvalidType for port, got: {errors:?}");
}

/// ConfigError implements miette::Diagnostic (can be rendered).
#[test]
fn config_error_implements_diagnostic() {
    use miette::Diagnostic;

    let error = ConfigError::UnknownKey {
        key: "prot".to_string(),
        suggestion: Some("port".to_string()),
        valid_keys: "host, port, log_level, cors_origins".to_string(),
        span: None,
        src: None,
    };

    assert!(error.code().is_some(), "should have diagnostic code");
    let help_str = error.help().expect("should have help text").to_string();
    assert!(
        help_str.contains("did you mean `port`"),
        "help should contain suggestion, got: {help_str}"
    );
}

/// ConfigError can be rendered using miette's graphical handler.
#[test]
fn config_error_renders_with_miette() {
    use miette::GraphicalReportHandler;

    let error = ConfigError::Validation {
        message: "audit.channel_capacity must be at least 1".to_string(),
    };

    let handler = GraphicalReportHandler::new();
    let mut buf = String::new();
    handler
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("channel_capacity"));
}

/// Validation errors surface through load_and_validate_str.
#[test]
fn validation_catches_out_of_range_offset() {
    let toml = r#"
[audit]
utc_offset_minutes = 2000
"#;

    let errors = load_and_validate_str(toml).expect_err("offset out of range should fail");
    let has_validation_error = errors.iter().any(|e| {
        matches!(e, ConfigError::Validation { message } if message.contains("utc_offset_minutes"))
    });
    assert!(has_validation_error, "should have validation error for offset");
}
