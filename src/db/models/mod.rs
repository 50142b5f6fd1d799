//! SeaORM entity models
//!
//! Database entities for the certificate-request service

mod certificate_request;
mod document;
mod status_history;
mod user;

pub use user::{
    ActiveModel as UserActiveModel, Column as UserColumn, Entity as UserEntity, Model as User,
    UserRole,
};

pub use certificate_request::{
    ActiveModel as CertificateRequestActiveModel, CertificateType,
    Column as CertificateRequestColumn, Entity as CertificateRequestEntity,
    Model as CertificateRequest, Urgency,
};

pub use document::{
    ActiveModel as DocumentActiveModel, Column as DocumentColumn, Entity as DocumentEntity,
    Model as Document,
};

pub use status_history::{
    ActiveModel as StatusHistoryActiveModel, Column as StatusHistoryColumn,
    Entity as StatusHistoryEntity, Model as StatusHistory,
};
