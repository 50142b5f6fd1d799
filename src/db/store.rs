//! Store abstraction for the workflow engine
//!
//! The engine is written against this trait rather than a process-wide
//! client, so it runs identically over Postgres ([`super::Repository`])
//! and the in-memory store used in tests ([`super::MemoryStore`]).
//!
//! The two compound operations are atomic: either every row they describe
//! is committed, or none is. `apply_transition` re-reads the request
//! inside its transaction before evaluating legality, so a racing
//! transition is never judged against a stale status.

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::models::{
    CertificateRequest, CertificateType, Document, StatusHistory, Urgency, User,
};
use crate::errors::Result;
use crate::workflow::RequestStatus;

/// A certificate request ready for insertion (status is implied RECIBIDO)
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub id: Uuid,
    pub request_number: String,
    pub user_id: Uuid,
    pub certificate_type: CertificateType,
    pub reason: String,
    pub urgency: Urgency,
}

/// A document row ready for insertion alongside its request
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub stored_name: String,
    pub original_name: String,
    pub storage_path: String,
    pub size_bytes: i64,
    pub content_type: String,
}

/// Persistence operations required by the workflow engine
#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_request(&self, id: Uuid) -> Result<Option<CertificateRequest>>;

    /// Documents attached to a request, in upload order
    async fn documents_for(&self, request_id: Uuid) -> Result<Vec<Document>>;

    /// Audit trail for a request, in creation order
    async fn history_for(&self, request_id: Uuid) -> Result<Vec<StatusHistory>>;

    /// Requests submitted by a user, newest first
    async fn list_requests_for_user(&self, user_id: Uuid) -> Result<Vec<CertificateRequest>>;

    /// Atomically insert the request, its documents, and the intake
    /// history entry
    async fn create_request(
        &self,
        request: NewRequest,
        documents: Vec<NewDocument>,
    ) -> Result<CertificateRequest>;

    /// Atomically validate and apply a status transition, appending its
    /// audit entry. Fails with NotFound when the request is absent and
    /// InvalidTransition when `(current, target)` is not a legal edge;
    /// on failure nothing is written.
    async fn apply_transition(
        &self,
        request_id: Uuid,
        actor_id: Uuid,
        target: RequestStatus,
        comment: Option<String>,
    ) -> Result<CertificateRequest>;
}
