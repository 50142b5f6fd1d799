//! Uploaded document entity
//!
//! One row per file attached to a request at submission time.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub request_id: Uuid,

    pub stored_name: String,

    pub original_name: String,

    #[sea_orm(column_type = "Text")]
    pub storage_path: String,

    pub size_bytes: i64,

    pub content_type: String,

    pub uploaded_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::certificate_request::Entity",
        from = "Column::RequestId",
        to = "super::certificate_request::Column::Id"
    )]
    CertificateRequest,
}

impl Related<super::certificate_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CertificateRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
