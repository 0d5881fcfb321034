//! Photo identity-verification attempts.
//!
//! Only `approved` rows take part in expiry handling. `expiry_date` is written
//! once by the backfill job; `expiry_email_date` records the last expiry
//! notification and is rewritten after each resend window.

use sea_orm::entity::prelude::*;
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(100))")]
pub enum VerificationStatus {
    #[sea_orm(string_value = "created")]
    Created,
    #[sea_orm(string_value = "ready")]
    Ready,
    #[sea_orm(string_value = "submitted")]
    Submitted,
    #[sea_orm(string_value = "must_retry")]
    MustRetry,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "denied")]
    Denied,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "verification")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub status: VerificationStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub expiry_date: Option<OffsetDateTime>,
    pub expiry_email_date: Option<OffsetDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
