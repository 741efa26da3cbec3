use sea_orm::entity::prelude::*;

use crate::db::dao::base_traits::base_entity;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub created_at: DateTimeWithTimeZone,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub updated_at: DateTimeWithTimeZone,
    pub name: String,
    #[sea_orm(indexed)]
    pub name_unaccent: String,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub cpf: String,
    #[sea_orm(unique)]
    pub phone_number: String,
    pub date_of_birth: Date,
    pub status: String,
    #[sea_orm(indexed)]
    pub registered_by_admin_id: Uuid,
    pub last_accessed_environment_id: Option<Uuid>,
    pub last_access_time: Option<DateTimeWithTimeZone>,
    #[sea_orm(has_many)]
    pub environment_links: HasMany<super::user_environment::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}

base_entity!();

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
        }
    }
}

impl TryFrom<&str> for UserStatus {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(UserStatus::Active),
            "inactive" => Ok(UserStatus::Inactive),
            _ => Err(()),
        }
    }
}
