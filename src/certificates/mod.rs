//! Certificate generation coordination
//!
//! Once a request reaches EMITIDO it becomes eligible for a PDF
//! certificate. Generation is lazy (first fetch renders) and idempotent
//! (later fetches reuse the stored file); `regenerate` forces a fresh
//! render. The PDF layout itself lives behind [`CertificateRenderer`].

use std::sync::Arc;

use crate::db::models::{CertificateRequest, User};
use crate::errors::{AppError, Result};
use crate::storage::FileStore;
use crate::workflow::RequestStatus;

/// Renders the certificate document for an issued request.
/// Pure with respect to the request: no side effects of its own.
pub trait CertificateRenderer: Send + Sync {
    fn render(&self, request: &CertificateRequest, user: &User) -> Result<Vec<u8>>;
}

/// Coordinates rendering and storage of issued certificates
pub struct CertificateService<R, F> {
    renderer: Arc<R>,
    files: Arc<F>,
    certificate_dir: String,
}

impl<R, F> CertificateService<R, F>
where
    R: CertificateRenderer,
    F: FileStore,
{
    pub fn new(renderer: Arc<R>, files: Arc<F>, certificate_dir: impl Into<String>) -> Self {
        Self {
            renderer,
            files,
            certificate_dir: certificate_dir.into(),
        }
    }

    /// Storage path of the certificate for a request
    pub fn certificate_path(&self, request: &CertificateRequest) -> String {
        format!(
            "{}/certificado-{}.pdf",
            self.certificate_dir, request.request_number
        )
    }

    /// Fetch the certificate, rendering it on first access
    pub async fn fetch(&self, request: &CertificateRequest, user: &User) -> Result<Vec<u8>> {
        self.require_issued(request)?;

        let path = self.certificate_path(request);
        if self.files.exists(&path).await? {
            return self.files.read(&path).await;
        }

        let bytes = self.renderer.render(request, user)?;
        self.files.put(&path, &bytes).await?;

        tracing::info!(
            request_number = %request.request_number,
            size_bytes = bytes.len(),
            "Certificate rendered"
        );

        Ok(bytes)
    }

    /// Force a fresh render, replacing any stored certificate
    pub async fn regenerate(&self, request: &CertificateRequest, user: &User) -> Result<Vec<u8>> {
        self.require_issued(request)?;

        let bytes = self.renderer.render(request, user)?;
        self.files.put(&self.certificate_path(request), &bytes).await?;

        tracing::info!(
            request_number = %request.request_number,
            "Certificate regenerated"
        );

        Ok(bytes)
    }

    fn require_issued(&self, request: &CertificateRequest) -> Result<()> {
        let status = request.request_status()?;
        if status != RequestStatus::Emitido {
            return Err(AppError::InvalidState {
                expected: RequestStatus::Emitido,
                actual: status,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{CertificateType, Urgency, UserRole};
    use crate::storage::MemoryFileStore;
    use chrono::Utc;
    use sea_orm::prelude::DateTimeWithTimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct CountingRenderer {
        calls: AtomicUsize,
    }

    impl CountingRenderer {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl CertificateRenderer for CountingRenderer {
        fn render(&self, request: &CertificateRequest, _user: &User) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("PDF for {}", request.request_number).into_bytes())
        }
    }

    fn fixtures(status: RequestStatus) -> (CertificateRequest, User) {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let user = User {
            id: Uuid::new_v4(),
            email: "maria@example.com".to_string(),
            password_hash: "x".to_string(),
            first_name: "Maria".to_string(),
            last_name: "Quispe".to_string(),
            national_id: "45781236".to_string(),
            phone: None,
            role: UserRole::User.as_str().to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let request = CertificateRequest {
            id: Uuid::new_v4(),
            request_number: "DOC-1700000000000-AB12CD34".to_string(),
            user_id: user.id,
            certificate_type: CertificateType::Nacimiento.as_str().to_string(),
            reason: "Partida de nacimiento".to_string(),
            urgency: Urgency::Normal.as_str().to_string(),
            status: status.as_str().to_string(),
            created_at: now,
            updated_at: now,
            processed_at: None,
            completed_at: None,
        };
        (request, user)
    }

    #[tokio::test]
    async fn test_fetch_renders_once_and_reuses_stored_file() {
        let renderer = Arc::new(CountingRenderer::new());
        let files = Arc::new(MemoryFileStore::new());
        let service = CertificateService::new(renderer.clone(), files, "certificados");

        let (request, user) = fixtures(RequestStatus::Emitido);

        let first = service.fetch(&request, &user).await.expect("first fetch");
        let second = service.fetch(&request, &user).await.expect("second fetch");

        assert_eq!(first, second);
        assert_eq!(renderer.calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_requires_emitido() {
        let renderer = Arc::new(CountingRenderer::new());
        let files = Arc::new(MemoryFileStore::new());
        let service = CertificateService::new(renderer.clone(), files, "certificados");

        let (request, user) = fixtures(RequestStatus::Aprobado);

        let err = service.fetch(&request, &user).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidState {
                expected: RequestStatus::Emitido,
                actual: RequestStatus::Aprobado,
            }
        ));
        assert_eq!(renderer.calls(), 0);
    }

    #[tokio::test]
    async fn test_regenerate_renders_again() {
        let renderer = Arc::new(CountingRenderer::new());
        let files = Arc::new(MemoryFileStore::new());
        let service = CertificateService::new(renderer.clone(), files, "certificados");

        let (request, user) = fixtures(RequestStatus::Emitido);

        service.fetch(&request, &user).await.expect("fetch");
        service
            .regenerate(&request, &user)
            .await
            .expect("regenerate");

        assert_eq!(renderer.calls(), 2);
    }
}
