use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::{
    filter::FilterPolicy,
    models::{QueryFields, SubmissionFields},
    validation::{self, ValidationError},
};
use crate::{
    db::{models::SensorReading, ReadingStore, StoreError},
    identity::{IdentityError, IdentityProvider},
};

/// Per-endpoint behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceOptions {
    /// `POST /data` must carry `ORP` and `TUR`.
    pub require_extended_fields: bool,
    /// `GET /data` runs the identity check before querying.
    pub verify_reads: bool,
    /// An empty query result is reported as `NoReadings` instead of `Ok(vec![])`.
    pub empty_result_not_found: bool,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            require_extended_fields: false,
            verify_reads: true,
            empty_result_not_found: false,
        }
    }
}

/// Terminal failure of one request. Display strings are safe to return to
/// clients; the underlying cause is only logged.
#[derive(Debug, Error)]
pub enum ReadingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("UID does not exist.")]
    UnknownUid,
    #[error("Error verifying UID.")]
    IdentityLookup(#[source] anyhow::Error),
    #[error("Error inserting values.")]
    Insert(#[source] StoreError),
    #[error("Internal server error.")]
    Fetch(#[source] StoreError),
    #[error("No readings found.")]
    NoReadings,
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Submit,
    Query,
}

impl Operation {
    fn as_str(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Query => "query",
        }
    }
}

/// Wires validation, the identity gate, filter resolution and the store for
/// each request. Cheap to clone; all collaborators are shared.
#[derive(Clone)]
pub struct ReadingService {
    store: Arc<dyn ReadingStore>,
    identity: Arc<dyn IdentityProvider>,
    options: ServiceOptions,
}

impl ReadingService {
    pub fn new(
        store: Arc<dyn ReadingStore>,
        identity: Arc<dyn IdentityProvider>,
        options: ServiceOptions,
    ) -> Self {
        Self { store, identity, options }
    }

    /// Validate, verify and persist one submission. Returns the stored reading
    /// with its server-assigned `id` and `date`.
    pub async fn submit(&self, fields: &SubmissionFields) -> Result<SensorReading, ReadingError> {
        let op = Operation::Submit;
        let valid = validation::validate_submission(fields, self.options.require_extended_fields)
            .map_err(|e| rejected(op, fields.raw_uid(), e))?;

        self.verify(op, &valid.uid).await?;

        let stored = self
            .store
            .append(&valid.uid, valid.reading)
            .await
            .map_err(|e| {
                error!(uid = %valid.uid, operation = op.as_str(), error = %e, "Failed to insert reading");
                ReadingError::Insert(e)
            })?;

        info!(uid = %valid.uid, id = %stored.id, date = stored.date, "Reading inserted");
        Ok(stored)
    }

    /// Validate, optionally verify, and fetch readings newest first.
    pub async fn query(&self, fields: &QueryFields) -> Result<Vec<SensorReading>, ReadingError> {
        let op = Operation::Query;
        let valid = validation::validate_query(fields)
            .map_err(|e| rejected(op, fields.raw_uid(), e))?;

        if self.options.verify_reads {
            self.verify(op, &valid.uid).await?;
        }

        let policy = FilterPolicy::resolve(valid.filter);
        let rows = self.store.query(&valid.uid, &policy).await.map_err(|e| {
            error!(uid = %valid.uid, operation = op.as_str(), ?policy, error = %e, "Failed to fetch readings");
            ReadingError::Fetch(e)
        })?;

        debug!(uid = %valid.uid, ?policy, count = rows.len(), "Readings fetched");

        if rows.is_empty() && self.options.empty_result_not_found {
            return Err(ReadingError::NoReadings);
        }
        Ok(rows)
    }

    async fn verify(&self, op: Operation, uid: &str) -> Result<(), ReadingError> {
        match self.identity.verify(uid).await {
            Ok(()) => Ok(()),
            Err(IdentityError::NotFound(_)) => {
                warn!(uid = %uid, operation = op.as_str(), "UID does not exist");
                Err(ReadingError::UnknownUid)
            }
            Err(IdentityError::LookupFailure(e)) => {
                error!(uid = %uid, operation = op.as_str(), error = %format!("{e:#}"), "Error verifying UID");
                Err(ReadingError::IdentityLookup(e))
            }
        }
    }
}

fn rejected(op: Operation, raw_uid: Option<&str>, e: ValidationError) -> ReadingError {
    debug!(uid = raw_uid, operation = op.as_str(), error = ?e, "Request rejected by validation");
    ReadingError::Validation(e)
}
