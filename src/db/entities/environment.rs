use sea_orm::entity::prelude::*;

use crate::db::dao::base_traits::base_entity;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "environments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub created_at: DateTimeWithTimeZone,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub updated_at: DateTimeWithTimeZone,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(indexed)]
    pub name_unaccent: String,
    pub creator_admin_id: Uuid,
    pub last_accessed_by_user_id: Option<Uuid>,
    pub last_access_time: Option<DateTimeWithTimeZone>,
    #[sea_orm(has_many)]
    pub user_links: HasMany<super::user_environment::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}

base_entity!();
