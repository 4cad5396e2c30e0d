// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Selenggara maintenance tracker.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed queries for equipment
//! tickets, dropdown options and the audit log.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;
pub(crate) mod writer;

pub use adapter::SqliteStorage;
pub use database::Database;
