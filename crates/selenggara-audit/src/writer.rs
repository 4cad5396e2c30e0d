// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The consumer half of the audit queue.

use std::sync::Arc;

use selenggara_core::StorageAdapter;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::AuditCommand;

/// Drains the audit queue into storage. Runs until every [`crate::AuditSink`]
/// clone is dropped.
pub struct AuditWriter {
    rx: mpsc::Receiver<AuditCommand>,
}

impl AuditWriter {
    pub(crate) fn new(rx: mpsc::Receiver<AuditCommand>) -> Self {
        Self { rx }
    }

    /// Spawn the writer loop on the current runtime.
    pub fn spawn(self, storage: Arc<dyn StorageAdapter>) -> JoinHandle<()> {
        tokio::spawn(self.run(storage))
    }

    pub async fn run(mut self, storage: Arc<dyn StorageAdapter>) {
        let mut written: u64 = 0;
        while let Some(command) = self.rx.recv().await {
            match command {
                AuditCommand::Record(entry) => match storage.append_log(&entry).await {
                    Ok(()) => written += 1,
                    Err(e) => warn!(
                        error = %e,
                        action = %entry.action,
                        description = %entry.description,
                        "failed to write audit entry"
                    ),
                },
                AuditCommand::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        debug!(written, "audit writer stopped");
    }
}
