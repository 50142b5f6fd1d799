//! Status history entity
//!
//! Append-only audit trail: one row per transition, written in the same
//! transaction as the status mutation it records. No update or delete
//! path exists anywhere in the crate.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "status_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub request_id: Uuid,

    /// User or administrator attributed with the transition
    pub actor_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub old_status: String,

    #[sea_orm(column_type = "Text")]
    pub new_status: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub comment: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::certificate_request::Entity",
        from = "Column::RequestId",
        to = "super::certificate_request::Column::Id"
    )]
    CertificateRequest,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ActorId",
        to = "super::user::Column::Id"
    )]
    Actor,
}

impl Related<super::certificate_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CertificateRequest.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Actor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
