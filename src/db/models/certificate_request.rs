//! Certificate request entity
//!
//! The request number is generated at creation and immutable; the status
//! column holds the canonical string form of [`RequestStatus`] and is only
//! ever written through the workflow transition path.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::workflow::RequestStatus;

/// Kind of certificate being requested
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateType {
    Nacimiento,
    Estudios,
    Residencia,
    Antecedentes,
}

impl CertificateType {
    pub fn as_str(self) -> &'static str {
        match self {
            CertificateType::Nacimiento => "NACIMIENTO",
            CertificateType::Estudios => "ESTUDIOS",
            CertificateType::Residencia => "RESIDENCIA",
            CertificateType::Antecedentes => "ANTECEDENTES",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "NACIMIENTO" => Some(CertificateType::Nacimiento),
            "ESTUDIOS" => Some(CertificateType::Estudios),
            "RESIDENCIA" => Some(CertificateType::Residencia),
            "ANTECEDENTES" => Some(CertificateType::Antecedentes),
            _ => None,
        }
    }
}

/// Processing urgency
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    #[default]
    Normal,
    Urgente,
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Normal => "NORMAL",
            Urgency::Urgente => "URGENTE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "NORMAL" => Some(Urgency::Normal),
            "URGENTE" => Some(Urgency::Urgente),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "certificate_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub request_number: String,

    pub user_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub certificate_type: String,

    #[sea_orm(column_type = "Text")]
    pub reason: String,

    #[sea_orm(column_type = "Text")]
    pub urgency: String,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,

    /// Set once, when the request first reaches APROBADO
    pub processed_at: Option<DateTimeWithTimeZone>,

    /// Set when the request reaches EMITIDO
    pub completed_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Get the status as an enum; unknown values are a data fault
    pub fn request_status(&self) -> Result<RequestStatus, AppError> {
        RequestStatus::parse(&self.status).ok_or_else(|| AppError::Internal {
            message: format!("unknown request status in database: {}", self.status),
        })
    }

    /// Get the certificate type as an enum; unknown values are a data fault
    pub fn certificate_kind(&self) -> Result<CertificateType, AppError> {
        CertificateType::parse(&self.certificate_type).ok_or_else(|| AppError::Internal {
            message: format!(
                "unknown certificate type in database: {}",
                self.certificate_type
            ),
        })
    }

    /// Check if the request is in a terminal state
    pub fn is_terminal(&self) -> Result<bool, AppError> {
        Ok(self.request_status()?.is_terminal())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,

    #[sea_orm(has_many = "super::document::Entity")]
    Document,

    #[sea_orm(has_many = "super::status_history::Entity")]
    StatusHistory,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Document.def()
    }
}

impl Related<super::status_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certificate_type_parse() {
        assert_eq!(
            CertificateType::parse("NACIMIENTO"),
            Some(CertificateType::Nacimiento)
        );
        assert_eq!(
            CertificateType::parse("ANTECEDENTES"),
            Some(CertificateType::Antecedentes)
        );
        assert_eq!(CertificateType::parse("MATRIMONIO"), None);
    }

    #[test]
    fn test_urgency_defaults_to_normal() {
        assert_eq!(Urgency::default(), Urgency::Normal);
        assert_eq!(Urgency::parse("URGENTE"), Some(Urgency::Urgente));
        assert_eq!(Urgency::parse("ASAP"), None);
    }
}
