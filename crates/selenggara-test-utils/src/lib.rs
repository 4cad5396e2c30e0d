// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Selenggara integration tests.
//!
//! [`TestHarness`] wires real storage, the audit writer, the services and the
//! router over a temp-dir database, so end-to-end tests run without a
//! listening socket or any external service.

pub mod harness;

pub use harness::{TestHarness, TestHarnessBuilder};
