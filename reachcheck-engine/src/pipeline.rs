//! Pipeline orchestration
//!
//! Runs all provider adapters concurrently under one bounded wait-all
//! deadline, normalizes whatever arrived, computes verdicts, assembles the
//! immutable report, and persists the whole run as an append-only snapshot.
//! Individual adapter failures only reduce the available evidence; the run
//! fails outright only when every adapter fails.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use uuid::Uuid;

use reachcheck_common::types::BusinessIdentity;
use reachcheck_common::{Error, Result};

use crate::models::{DiagnosticReport, NormalizedRecord, Snapshot};
use crate::normalize::normalize_record;
use crate::providers::{ProviderAdapter, ProviderError};
use crate::snapshot::SnapshotStore;
use crate::{compare, report};

pub struct Pipeline {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
    store: SnapshotStore,
    deadline: Duration,
}

impl Pipeline {
    pub fn new(
        adapters: Vec<Arc<dyn ProviderAdapter>>,
        store: SnapshotStore,
        deadline: Duration,
    ) -> Self {
        Self { adapters, store, deadline }
    }

    /// Run one diagnostic request end to end.
    ///
    /// The identity hint is validated once here; adapters may assume it is
    /// well-formed. Every adapter call is wrapped in the collection
    /// deadline: a call still pending when it expires becomes a `Timeout`
    /// failure rather than being awaited indefinitely.
    pub async fn run(&self, identity: &BusinessIdentity) -> Result<DiagnosticReport> {
        identity.validate()?;
        let request_id = Uuid::new_v4();
        tracing::info!(
            %request_id,
            adapters = self.adapters.len(),
            deadline = ?self.deadline,
            "Starting collection"
        );

        let deadline = self.deadline;
        let collections = join_all(self.adapters.iter().map(|adapter| {
            let adapter = Arc::clone(adapter);
            async move {
                let provider = adapter.provider();
                let outcome = match tokio::time::timeout(deadline, adapter.collect(identity)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Timeout),
                };
                (provider, outcome)
            }
        }))
        .await;

        let mut raw_records = Vec::new();
        let mut collection_errors = BTreeMap::new();
        for (provider, outcome) in collections {
            match outcome {
                Ok(record) => {
                    tracing::debug!(%provider, "Collected raw record");
                    raw_records.push(record);
                }
                Err(err) => {
                    tracing::warn!(%provider, error = %err, "Provider collection failed");
                    collection_errors.insert(provider, err.code().to_string());
                }
            }
        }

        if raw_records.is_empty() {
            return Err(Error::NoProviderData(format!(
                "all {} adapters failed",
                self.adapters.len()
            )));
        }

        let normalized_records: Vec<NormalizedRecord> =
            raw_records.iter().map(normalize_record).collect();
        let verdicts = compare::compare(&raw_records, &normalized_records);
        let report =
            report::assemble(request_id, identity, &raw_records, verdicts, collection_errors);

        let snapshot = Snapshot {
            request_id,
            saved_at: Utc::now(),
            identity: identity.clone(),
            raw_records,
            normalized_records,
            report: report.clone(),
        };
        self.store.save(&snapshot)?;

        Ok(report)
    }
}
