//! Asynchronous batch processing of merchant validations.
//!
//! A submitted batch returns immediately with a PENDING job handle while a
//! spawned worker drives the item loop out-of-band; callers poll job state
//! by identifier. One batch's loop is strictly sequential (the upstream
//! lookups are rate-limited); independent batches run concurrently, each
//! owning its own job entry.

use crate::config::Config;
use crate::errors::{AuditError, ResultExt};
use crate::models::{BatchJob, BatchStatus, MerchantValidationRequest, ValidationResult};
use crate::validation::MerchantValidator;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

// ============ Rate Pacer ============

/// Fixed inter-item pause applied after each validation to stay under the
/// upstream lookup rate limits.
#[derive(Debug, Clone)]
pub struct RatePacer {
    delay: Duration,
}

impl RatePacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

// ============ Job Store ============

/// Keyed store of batch jobs.
///
/// Each job is mutated only by its own processing loop and read by any
/// number of concurrent status queries; readers may observe a snapshot an
/// increment behind the worker. Terminal jobs are immutable.
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<Uuid, BatchJob>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, job: BatchJob) {
        self.jobs.write().await.insert(job.batch_id, job);
    }

    /// Returns a snapshot of the current job state, or `None` for an
    /// unknown identifier.
    pub async fn get(&self, batch_id: &Uuid) -> Option<BatchJob> {
        self.jobs.read().await.get(batch_id).cloned()
    }

    async fn mark_processing(&self, batch_id: &Uuid) -> Result<(), AuditError> {
        self.mutate(batch_id, |job| {
            job.status = BatchStatus::Processing;
        })
        .await
    }

    /// Appends an item result and advances the processed count.
    async fn record_result(
        &self,
        batch_id: &Uuid,
        result: ValidationResult,
    ) -> Result<(), AuditError> {
        self.mutate(batch_id, |job| {
            job.results.push(result);
            job.processed_merchants += 1;
        })
        .await
    }

    async fn mark_completed(&self, batch_id: &Uuid) -> Result<(), AuditError> {
        self.mutate(batch_id, |job| {
            job.status = BatchStatus::Completed;
            job.completed_at = Some(Utc::now());
        })
        .await
    }

    /// Marks the job failed, preserving whatever results were already
    /// recorded. Best-effort: an unknown or already-terminal job is left
    /// alone.
    pub(crate) async fn mark_failed(&self, batch_id: &Uuid) {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(batch_id) {
            Some(job) if !job.status.is_terminal() => {
                job.status = BatchStatus::Failed;
                job.completed_at = Some(Utc::now());
            }
            Some(_) => {}
            None => {
                tracing::error!("Cannot mark unknown batch {} as failed", batch_id);
            }
        }
    }

    async fn mutate(
        &self,
        batch_id: &Uuid,
        apply: impl FnOnce(&mut BatchJob),
    ) -> Result<(), AuditError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(batch_id)
            .ok_or_else(|| AuditError::NotFound(format!("Batch job {} not found", batch_id)))?;

        if job.status.is_terminal() {
            return Err(AuditError::Internal(format!(
                "Batch job {} is already terminal",
                batch_id
            )));
        }

        apply(job);
        Ok(())
    }
}

// ============ Batch Processor ============

pub struct BatchProcessor {
    validator: Arc<MerchantValidator>,
    store: JobStore,
    pacer: RatePacer,
}

impl BatchProcessor {
    pub fn new(validator: Arc<MerchantValidator>, config: &Config) -> Self {
        Self {
            validator,
            store: JobStore::new(),
            pacer: RatePacer::new(Duration::from_millis(config.batch_item_delay_ms)),
        }
    }

    /// Submits a batch and returns its PENDING handle immediately; the item
    /// loop runs on a spawned task.
    ///
    /// Requests missing the merchant name are rejected here, before any
    /// processing — a malformed request never enters a batch.
    pub async fn submit(
        &self,
        requests: Vec<MerchantValidationRequest>,
    ) -> Result<BatchJob, AuditError> {
        for (index, request) in requests.iter().enumerate() {
            if request.merchant_name.trim().is_empty() {
                return Err(AuditError::BadRequest(format!(
                    "Request {} is missing the merchant name",
                    index
                )));
            }
        }

        let job = BatchJob::new(requests.len());
        self.store.insert(job.clone()).await;

        let batch_id = job.batch_id;
        let total = job.total_merchants;
        let validator = Arc::clone(&self.validator);
        let store = self.store.clone();
        let pacer = self.pacer.clone();

        tokio::spawn(async move {
            tracing::info!(
                "Starting batch processing for batch_id={} ({} merchants)",
                batch_id,
                total
            );

            match run_batch(&validator, &store, &pacer, batch_id, requests).await {
                Ok(()) => {
                    tracing::info!("Batch {} completed", batch_id);
                }
                Err(e) => {
                    tracing::error!("Batch {} failed: {}", batch_id, e);
                    store.mark_failed(&batch_id).await;
                }
            }
        });

        Ok(job)
    }

    /// Returns the current state of a batch job, or `None` if unknown.
    pub async fn status(&self, batch_id: &Uuid) -> Option<BatchJob> {
        self.store.get(batch_id).await
    }
}

/// Sequential item loop for one batch.
///
/// Per-item faults are absorbed inside `MerchantValidator::validate` and
/// surface as ERROR-status results; an error here is an orchestration-level
/// fault and fails the whole job.
async fn run_batch(
    validator: &MerchantValidator,
    store: &JobStore,
    pacer: &RatePacer,
    batch_id: Uuid,
    requests: Vec<MerchantValidationRequest>,
) -> Result<(), AuditError> {
    store.mark_processing(&batch_id).await?;

    let total = requests.len();
    for (index, request) in requests.iter().enumerate() {
        tracing::debug!(
            "Batch {}: validating merchant {}/{} ('{}')",
            batch_id,
            index + 1,
            total,
            request.merchant_name
        );

        let result = validator.validate(request).await;

        store
            .record_result(&batch_id, result)
            .await
            .context(format!("Recording result {} for batch {}", index, batch_id))?;

        pacer.pause().await;
    }

    store.mark_completed(&batch_id).await?;
    Ok(())
}
