//! Request workflow engine
//!
//! Owns the certificate-request lifecycle: validates status transitions,
//! plans the column mutations and audit rows they entail, and drives the
//! store and file-storage collaborators through injected handles.
//!
//! The two `plan_*` functions are pure; every store implementation routes
//! its atomic writes through them so that the transition table in
//! [`status`] is the only place legality is decided.

pub mod status;

pub use status::RequestStatus;

use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use sea_orm::prelude::DateTimeWithTimeZone;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::db::models::{
    CertificateRequest, CertificateType, Document, StatusHistory, Urgency, UserRole,
};
use crate::db::store::{NewDocument, NewRequest, RequestStore};
use crate::errors::{AppError, Result};
use crate::storage::{FileStore, NewFile, StoredFile};

/// Audit comment recorded on the self-referencing intake entry
pub const INTAKE_COMMENT: &str = "Solicitud recibida";

/// Audit comment recorded when the submitting user cancels
pub const CANCELLED_BY_USER_COMMENT: &str = "Solicitud cancelada por el usuario";

/// Validated payload for a new certificate request
#[derive(Debug, Clone, Validate)]
pub struct CreateRequestInput {
    pub certificate_type: CertificateType,

    #[validate(length(min = 1, max = 2000))]
    pub reason: String,

    pub urgency: Urgency,
}

/// Audit row to be inserted alongside a status mutation
#[derive(Debug, Clone)]
pub struct NewStatusHistory {
    pub old_status: RequestStatus,
    pub new_status: RequestStatus,
    pub comment: Option<String>,
    pub actor_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

/// Column values a legal transition writes, plus its audit row.
/// Produced by [`plan_transition`]; applied by the store in one transaction.
#[derive(Debug, Clone)]
pub struct TransitionPlan {
    pub status: RequestStatus,
    pub updated_at: DateTimeWithTimeZone,
    pub processed_at: Option<DateTimeWithTimeZone>,
    pub completed_at: Option<DateTimeWithTimeZone>,
    pub history: NewStatusHistory,
}

/// Rows a request submission inserts, all in one transaction
#[derive(Debug, Clone)]
pub struct CreatePlan {
    pub request: CertificateRequest,
    pub documents: Vec<Document>,
    pub history: StatusHistory,
}

/// Validate a transition and compute the resulting column values.
///
/// Timestamp rules:
/// - `updated_at` is always bumped
/// - `processed_at` is set on first arrival at APROBADO, then preserved
/// - `completed_at` is set on EMITIDO
pub fn plan_transition(
    current: &CertificateRequest,
    target: RequestStatus,
    actor_id: Uuid,
    comment: Option<String>,
    now: DateTime<Utc>,
) -> Result<TransitionPlan> {
    let from = current.request_status()?;
    status::check_transition(from, target)?;

    let now: DateTimeWithTimeZone = now.into();

    let processed_at = match target {
        RequestStatus::Aprobado if current.processed_at.is_none() => Some(now),
        _ => current.processed_at,
    };

    let completed_at = match target {
        RequestStatus::Emitido => Some(now),
        _ => current.completed_at,
    };

    Ok(TransitionPlan {
        status: target,
        updated_at: now,
        processed_at,
        completed_at,
        history: NewStatusHistory {
            old_status: from,
            new_status: target,
            comment,
            actor_id,
            created_at: now,
        },
    })
}

/// Compute the full row set for a new submission: the request in RECIBIDO,
/// one document row per stored file, and the self-recording intake entry.
pub fn plan_create(
    request: NewRequest,
    documents: Vec<NewDocument>,
    now: DateTime<Utc>,
) -> CreatePlan {
    let now: DateTimeWithTimeZone = now.into();
    let initial = RequestStatus::Recibido;

    let request = CertificateRequest {
        id: request.id,
        request_number: request.request_number,
        user_id: request.user_id,
        certificate_type: request.certificate_type.as_str().to_string(),
        reason: request.reason,
        urgency: request.urgency.as_str().to_string(),
        status: initial.as_str().to_string(),
        created_at: now,
        updated_at: now,
        processed_at: None,
        completed_at: None,
    };

    let documents = documents
        .into_iter()
        .map(|doc| Document {
            id: Uuid::new_v4(),
            request_id: request.id,
            stored_name: doc.stored_name,
            original_name: doc.original_name,
            storage_path: doc.storage_path,
            size_bytes: doc.size_bytes,
            content_type: doc.content_type,
            uploaded_at: now,
        })
        .collect();

    let history = StatusHistory {
        id: Uuid::new_v4(),
        request_id: request.id,
        actor_id: request.user_id,
        old_status: initial.as_str().to_string(),
        new_status: initial.as_str().to_string(),
        comment: Some(INTAKE_COMMENT.to_string()),
        created_at: now,
    };

    CreatePlan {
        request,
        documents,
        history,
    }
}

/// Generate a unique request number: `DOC-<unix millis>-<8 chars>`
pub fn generate_request_number() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect::<String>()
        .to_uppercase();
    format!(
        "{}-{}-{}",
        crate::REQUEST_NUMBER_PREFIX,
        Utc::now().timestamp_millis(),
        suffix
    )
}

/// Workflow engine over injected store and file-storage handles
pub struct WorkflowService<S, F> {
    store: Arc<S>,
    files: Arc<F>,
}

impl<S, F> WorkflowService<S, F>
where
    S: RequestStore,
    F: FileStore,
{
    pub fn new(store: Arc<S>, files: Arc<F>) -> Self {
        Self { store, files }
    }

    /// Submit a new certificate request with its supporting documents.
    ///
    /// Fails with ValidationError when no document is attached. If the
    /// database insert fails after files were written, the files are
    /// removed best-effort so no orphans reference a non-existent request.
    pub async fn create(
        &self,
        user_id: Uuid,
        input: CreateRequestInput,
        uploads: Vec<NewFile>,
    ) -> Result<CertificateRequest> {
        input.validate().map_err(|e| AppError::Validation {
            message: e.to_string(),
            field: None,
        })?;

        if uploads.is_empty() {
            return Err(AppError::Validation {
                message: "at least one document required".to_string(),
                field: Some("documents".to_string()),
            });
        }

        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound {
                id: user_id.to_string(),
            })?;

        if !user.is_active {
            return Err(AppError::Forbidden {
                message: "account is inactive".to_string(),
            });
        }

        let mut stored: Vec<StoredFile> = Vec::with_capacity(uploads.len());
        for upload in &uploads {
            match self.files.save(upload).await {
                Ok(file) => stored.push(file),
                Err(err) => {
                    self.cleanup_files(&stored).await;
                    return Err(err);
                }
            }
        }

        let request = NewRequest {
            id: Uuid::new_v4(),
            request_number: generate_request_number(),
            user_id,
            certificate_type: input.certificate_type,
            reason: input.reason,
            urgency: input.urgency,
        };

        let documents = stored
            .iter()
            .map(|file| NewDocument {
                stored_name: file.stored_name.clone(),
                original_name: file.original_name.clone(),
                storage_path: file.path.clone(),
                size_bytes: file.size_bytes,
                content_type: file.content_type.clone(),
            })
            .collect();

        match self.store.create_request(request, documents).await {
            Ok(created) => {
                tracing::info!(
                    request_id = %created.id,
                    request_number = %created.request_number,
                    user_id = %user_id,
                    "Certificate request created"
                );
                Ok(created)
            }
            Err(err) => {
                self.cleanup_files(&stored).await;
                Err(err)
            }
        }
    }

    /// Move a request to `target`, recording the transition atomically.
    ///
    /// The actor must be an administrator; user-initiated cancellation
    /// goes through [`WorkflowService::cancel`] instead.
    pub async fn transition(
        &self,
        request_id: Uuid,
        actor_id: Uuid,
        target: RequestStatus,
        comment: Option<String>,
    ) -> Result<CertificateRequest> {
        let actor = self
            .store
            .find_user(actor_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound {
                id: actor_id.to_string(),
            })?;

        if actor.user_role()? != UserRole::Admin {
            return Err(AppError::Forbidden {
                message: "status updates require an administrator".to_string(),
            });
        }

        let updated = self
            .store
            .apply_transition(request_id, actor_id, target, comment)
            .await?;

        tracing::info!(
            request_id = %request_id,
            status = %target,
            actor_id = %actor_id,
            "Request status updated"
        );

        Ok(updated)
    }

    /// Cancel a request the caller owns. Allowed only while the request
    /// is still in RECIBIDO; modeled as a transition to RECHAZADO.
    pub async fn cancel(&self, request_id: Uuid, user_id: Uuid) -> Result<CertificateRequest> {
        let request = self.get(request_id).await?;

        if request.user_id != user_id {
            return Err(AppError::Forbidden {
                message: "only the submitting user may cancel a request".to_string(),
            });
        }

        let current = request.request_status()?;
        if current != RequestStatus::Recibido {
            return Err(AppError::InvalidState {
                expected: RequestStatus::Recibido,
                actual: current,
            });
        }

        let updated = self
            .store
            .apply_transition(
                request_id,
                user_id,
                RequestStatus::Rechazado,
                Some(CANCELLED_BY_USER_COMMENT.to_string()),
            )
            .await?;

        tracing::info!(
            request_id = %request_id,
            user_id = %user_id,
            "Request cancelled by user"
        );

        Ok(updated)
    }

    /// Fetch a request, failing with NotFound when absent
    pub async fn get(&self, request_id: Uuid) -> Result<CertificateRequest> {
        self.store
            .find_request(request_id)
            .await?
            .ok_or_else(|| AppError::RequestNotFound {
                id: request_id.to_string(),
            })
    }

    /// Audit trail for a request, in creation order
    pub async fn history(&self, request_id: Uuid) -> Result<Vec<StatusHistory>> {
        self.get(request_id).await?;
        self.store.history_for(request_id).await
    }

    /// Documents attached to a request
    pub async fn documents(&self, request_id: Uuid) -> Result<Vec<Document>> {
        self.get(request_id).await?;
        self.store.documents_for(request_id).await
    }

    /// Requests submitted by a user, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<CertificateRequest>> {
        self.store.list_requests_for_user(user_id).await
    }

    async fn cleanup_files(&self, stored: &[StoredFile]) {
        for file in stored {
            if let Err(err) = self.files.delete(&file.path).await {
                tracing::warn!(
                    path = %file.path,
                    error = %err,
                    "Failed to remove uploaded file after aborted submission"
                );
            }
        }
    }
}
