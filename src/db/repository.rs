//! Postgres implementation of the request store
//!
//! Both compound operations run inside a database transaction. The
//! transition path locks the request row (`SELECT ... FOR UPDATE`) before
//! evaluating legality, so concurrent transitions on the same request
//! serialize and the loser is judged against the committed status.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::db::models::{
    CertificateRequest, CertificateRequestColumn, CertificateRequestEntity, Document,
    DocumentColumn, DocumentEntity, StatusHistory, StatusHistoryActiveModel, StatusHistoryColumn,
    StatusHistoryEntity, User, UserEntity,
};
use crate::db::store::{NewDocument, NewRequest, RequestStore};
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::workflow::{self, RequestStatus};

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }
}

#[async_trait]
impl RequestStore for Repository {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.pool.read())
            .await
            .map_err(Into::into)
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<CertificateRequest>> {
        CertificateRequestEntity::find_by_id(id)
            .one(self.pool.read())
            .await
            .map_err(Into::into)
    }

    async fn documents_for(&self, request_id: Uuid) -> Result<Vec<Document>> {
        DocumentEntity::find()
            .filter(DocumentColumn::RequestId.eq(request_id))
            .order_by_asc(DocumentColumn::UploadedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    async fn history_for(&self, request_id: Uuid) -> Result<Vec<StatusHistory>> {
        StatusHistoryEntity::find()
            .filter(StatusHistoryColumn::RequestId.eq(request_id))
            .order_by_asc(StatusHistoryColumn::CreatedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    async fn list_requests_for_user(&self, user_id: Uuid) -> Result<Vec<CertificateRequest>> {
        CertificateRequestEntity::find()
            .filter(CertificateRequestColumn::UserId.eq(user_id))
            .order_by_desc(CertificateRequestColumn::CreatedAt)
            .all(self.pool.read())
            .await
            .map_err(Into::into)
    }

    async fn create_request(
        &self,
        request: NewRequest,
        documents: Vec<NewDocument>,
    ) -> Result<CertificateRequest> {
        let plan = workflow::plan_create(request, documents, Utc::now());

        let created = self
            .pool
            .write()
            .transaction::<_, CertificateRequest, AppError>(move |txn| {
                Box::pin(async move {
                    let created = plan.request.into_active_model().insert(txn).await?;

                    for document in plan.documents {
                        document.into_active_model().insert(txn).await?;
                    }

                    plan.history.into_active_model().insert(txn).await?;

                    Ok(created)
                })
            })
            .await
            .map_err(AppError::from)?;

        Ok(created)
    }

    async fn apply_transition(
        &self,
        request_id: Uuid,
        actor_id: Uuid,
        target: RequestStatus,
        comment: Option<String>,
    ) -> Result<CertificateRequest> {
        let updated = self
            .pool
            .write()
            .transaction::<_, CertificateRequest, AppError>(move |txn| {
                Box::pin(async move {
                    let request = CertificateRequestEntity::find_by_id(request_id)
                        .lock_exclusive()
                        .one(txn)
                        .await?
                        .ok_or_else(|| AppError::RequestNotFound {
                            id: request_id.to_string(),
                        })?;

                    let plan =
                        workflow::plan_transition(&request, target, actor_id, comment, Utc::now())?;

                    let mut active = request.into_active_model();
                    active.status = Set(plan.status.as_str().to_string());
                    active.updated_at = Set(plan.updated_at);
                    active.processed_at = Set(plan.processed_at);
                    active.completed_at = Set(plan.completed_at);
                    let updated = active.update(txn).await?;

                    StatusHistoryActiveModel {
                        id: Set(Uuid::new_v4()),
                        request_id: Set(updated.id),
                        actor_id: Set(plan.history.actor_id),
                        old_status: Set(plan.history.old_status.as_str().to_string()),
                        new_status: Set(plan.history.new_status.as_str().to_string()),
                        comment: Set(plan.history.comment),
                        created_at: Set(plan.history.created_at),
                    }
                    .insert(txn)
                    .await?;

                    Ok(updated)
                })
            })
            .await
            .map_err(AppError::from)?;

        Ok(updated)
    }
}
