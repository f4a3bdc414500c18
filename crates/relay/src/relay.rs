use std::collections::BTreeMap;

use tracing::info;

use crate::{
    Result,
    check::{CheckReport, Checker},
    forward::{FlushReport, Forwarder},
};

/// One check followed by one flush.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub check: CheckReport,
    pub flush: FlushReport,
}

/// The configured pipeline: which channels to watch and where their posts go.
pub struct Relay {
    checker: Checker,
    forwarder: Forwarder,
    destination: i64,
    routes: BTreeMap<String, i32>,
}

impl Relay {
    /// `routes` maps each watched handle to its thread in `destination`.
    pub fn new(
        checker: Checker,
        forwarder: Forwarder,
        destination: i64,
        routes: BTreeMap<String, i32>,
    ) -> Self {
        Self {
            checker,
            forwarder,
            destination,
            routes,
        }
    }

    pub fn handles(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub async fn check(&self) -> Result<CheckReport> {
        self.checker.check_all(self.handles()).await
    }

    pub async fn flush(&self) -> Result<FlushReport> {
        self.forwarder.flush(self.destination, &self.routes).await
    }

    /// Check every channel, then forward everything still undelivered,
    /// including backlog left by earlier runs.
    pub async fn run(&self) -> Result<RunReport> {
        let check = self.check().await?;
        let flush = self.flush().await?;
        info!(
            new_items = check.new_items(),
            skipped = check.skipped.len(),
            delivered = flush.delivered.len(),
            failed = flush.failed.len(),
            "relay run finished"
        );
        Ok(RunReport { check, flush })
    }
}
