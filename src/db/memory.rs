//! In-memory implementation of the request store
//!
//! Backs the workflow engine in tests and small tooling without a
//! database. The whole store sits behind one mutex, so each compound
//! operation is atomic and a racing transition always sees the committed
//! status, matching the transactional guarantees of the Postgres
//! repository.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::db::models::{CertificateRequest, Document, StatusHistory, User};
use crate::db::store::{NewDocument, NewRequest, RequestStore};
use crate::errors::{AppError, Result};
use crate::workflow::{self, RequestStatus};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    requests: HashMap<Uuid, CertificateRequest>,
    documents: Vec<Document>,
    history: Vec<StatusHistory>,
}

/// Mutex-guarded in-memory store
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user account
    pub fn add_user(&self, user: User) {
        self.lock().users.insert(user.id, user);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store lock poisoned")
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<CertificateRequest>> {
        Ok(self.lock().requests.get(&id).cloned())
    }

    async fn documents_for(&self, request_id: Uuid) -> Result<Vec<Document>> {
        let mut documents: Vec<Document> = self
            .lock()
            .documents
            .iter()
            .filter(|doc| doc.request_id == request_id)
            .cloned()
            .collect();
        documents.sort_by_key(|doc| doc.uploaded_at);
        Ok(documents)
    }

    async fn history_for(&self, request_id: Uuid) -> Result<Vec<StatusHistory>> {
        let mut entries: Vec<StatusHistory> = self
            .lock()
            .history
            .iter()
            .filter(|entry| entry.request_id == request_id)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for same-millisecond entries
        entries.sort_by_key(|entry| entry.created_at);
        Ok(entries)
    }

    async fn list_requests_for_user(&self, user_id: Uuid) -> Result<Vec<CertificateRequest>> {
        let mut requests: Vec<CertificateRequest> = self
            .lock()
            .requests
            .values()
            .filter(|request| request.user_id == user_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn create_request(
        &self,
        request: NewRequest,
        documents: Vec<NewDocument>,
    ) -> Result<CertificateRequest> {
        let plan = workflow::plan_create(request, documents, Utc::now());

        let mut inner = self.lock();
        if inner.requests.contains_key(&plan.request.id) {
            return Err(AppError::Internal {
                message: format!("duplicate request id: {}", plan.request.id),
            });
        }

        inner.requests.insert(plan.request.id, plan.request.clone());
        inner.documents.extend(plan.documents);
        inner.history.push(plan.history);

        Ok(plan.request)
    }

    async fn apply_transition(
        &self,
        request_id: Uuid,
        actor_id: Uuid,
        target: RequestStatus,
        comment: Option<String>,
    ) -> Result<CertificateRequest> {
        let mut inner = self.lock();

        let request = inner
            .requests
            .get(&request_id)
            .ok_or_else(|| AppError::RequestNotFound {
                id: request_id.to_string(),
            })?
            .clone();

        let plan = workflow::plan_transition(&request, target, actor_id, comment, Utc::now())?;

        let mut updated = request;
        updated.status = plan.status.as_str().to_string();
        updated.updated_at = plan.updated_at;
        updated.processed_at = plan.processed_at;
        updated.completed_at = plan.completed_at;

        inner.requests.insert(request_id, updated.clone());
        inner.history.push(StatusHistory {
            id: Uuid::new_v4(),
            request_id,
            actor_id: plan.history.actor_id,
            old_status: plan.history.old_status.as_str().to_string(),
            new_status: plan.history.new_status.as_str().to_string(),
            comment: plan.history.comment,
            created_at: plan.history.created_at,
        });

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{CertificateType, Urgency};

    fn new_request(user_id: Uuid) -> NewRequest {
        NewRequest {
            id: Uuid::new_v4(),
            request_number: workflow::generate_request_number(),
            user_id,
            certificate_type: CertificateType::Estudios,
            reason: "Constancia de estudios".to_string(),
            urgency: Urgency::Normal,
        }
    }

    fn new_document() -> NewDocument {
        NewDocument {
            stored_name: "stored.pdf".to_string(),
            original_name: "certificado.pdf".to_string(),
            storage_path: "stored.pdf".to_string(),
            size_bytes: 12,
            content_type: "application/pdf".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_inserts_request_documents_and_history() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();

        let created = store
            .create_request(new_request(user_id), vec![new_document()])
            .await
            .expect("create");

        assert_eq!(created.status, "RECIBIDO");
        assert_eq!(store.documents_for(created.id).await.unwrap().len(), 1);
        let history = store.history_for(created.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].old_status, "RECIBIDO");
        assert_eq!(history[0].new_status, "RECIBIDO");
    }

    #[tokio::test]
    async fn test_rejected_transition_writes_nothing() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let created = store
            .create_request(new_request(user_id), vec![new_document()])
            .await
            .expect("create");

        let err = store
            .apply_transition(created.id, user_id, RequestStatus::Emitido, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));

        let current = store.find_request(created.id).await.unwrap().unwrap();
        assert_eq!(current, created);
        assert_eq!(store.history_for(created.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transition_missing_request_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .apply_transition(
                Uuid::new_v4(),
                Uuid::new_v4(),
                RequestStatus::EnValidacion,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RequestNotFound { .. }));
    }
}
