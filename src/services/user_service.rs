use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use sea_orm::{Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::{
        dao::{ColumnFilter, DaoBase, DaoLayerError, PaginatedResponse, UserDao},
        entities::{
            admin,
            user::{self, UserStatus},
        },
    },
    error::{AppError, ConflictError, NotFoundError, UniqueField, ValidationError},
    services::{
        SortOrder,
        access_service::{AccessService, AttachOutcome},
        not_found_as, validation,
    },
    text::{self, LIKE_ESCAPE},
};

/// Client-facing view of a user; the folded search column stays internal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserPublic {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub cpf: String,
    pub phone_number: String,
    pub date_of_birth: NaiveDate,
    pub status: String,
    pub registered_by_admin_id: Uuid,
    pub last_accessed_environment_id: Option<Uuid>,
    pub last_access_time: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<user::Model> for UserPublic {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            cpf: model.cpf,
            phone_number: model.phone_number,
            date_of_birth: model.date_of_birth,
            status: model.status,
            registered_by_admin_id: model.registered_by_admin_id,
            last_accessed_environment_id: model.last_accessed_environment_id,
            last_access_time: model.last_access_time,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueFields {
    pub email: String,
    pub cpf: String,
    pub phone_number: String,
}

impl UniqueFields {
    pub fn of(model: &user::Model) -> Self {
        Self {
            email: model.email.clone(),
            cpf: model.cpf.clone(),
            phone_number: model.phone_number.clone(),
        }
    }

    fn shares(&self, field: UniqueField, other: &user::Model) -> bool {
        match field {
            UniqueField::Email => self.email == other.email,
            UniqueField::Cpf => self.cpf == other.cpf,
            UniqueField::PhoneNumber => self.phone_number == other.phone_number,
        }
    }
}

const PRECEDENCE: [UniqueField; 3] = [UniqueField::Email, UniqueField::Cpf, UniqueField::PhoneNumber];

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub cpf: String,
    pub phone_number: String,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub status: Option<UserStatus>,
    #[serde(default)]
    pub environment_ids: Option<Vec<Uuid>>,
}

/// Partial update; only the listed fields can change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub cpf: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub status: Option<UserStatus>,
    pub environment_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct UserFields {
    name: String,
    email: String,
    cpf: String,
    phone_number: String,
    date_of_birth: NaiveDate,
    status: UserStatus,
}

impl UserFields {
    fn validated(self, today: NaiveDate) -> Result<Self, AppError> {
        Ok(Self {
            name: validation::required_name("name", &self.name)?,
            email: validation::email(&self.email)?,
            cpf: validation::cpf(&self.cpf)?,
            phone_number: validation::phone_number(&self.phone_number)?,
            date_of_birth: validation::date_of_birth(self.date_of_birth, today)?,
            status: self.status,
        })
    }

    fn unique(&self) -> UniqueFields {
        UniqueFields {
            email: self.email.clone(),
            cpf: self.cpf.clone(),
            phone_number: self.phone_number.clone(),
        }
    }

    fn write_to(self, active: &mut user::ActiveModel) {
        active.name_unaccent = Set(text::fold(&self.name));
        active.name = Set(self.name);
        active.email = Set(self.email);
        active.cpf = Set(self.cpf);
        active.phone_number = Set(self.phone_number);
        active.date_of_birth = Set(self.date_of_birth);
        active.status = Set(self.status.as_str().to_string());
    }
}

impl UserPatch {
    /// A stored status outside the known set must be replaced explicitly.
    fn merge(self, current: &user::Model) -> Result<UserFields, ValidationError> {
        let status = match self.status {
            Some(status) => status,
            None => UserStatus::try_from(current.status.as_str()).map_err(|()| {
                ValidationError::new(format!(
                    "Stored status '{}' is not recognised; set status explicitly",
                    current.status
                ))
            })?,
        };

        Ok(UserFields {
            name: self.name.unwrap_or_else(|| current.name.clone()),
            email: self.email.unwrap_or_else(|| current.email.clone()),
            cpf: self.cpf.unwrap_or_else(|| current.cpf.clone()),
            phone_number: self
                .phone_number
                .unwrap_or_else(|| current.phone_number.clone()),
            date_of_birth: self.date_of_birth.unwrap_or(current.date_of_birth),
            status,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSortField {
    Name,
    Email,
    DateOfBirth,
    CreatedAt,
}

impl UserSortField {
    fn column(self) -> user::Column {
        match self {
            UserSortField::Name => user::Column::Name,
            UserSortField::Email => user::Column::Email,
            UserSortField::DateOfBirth => user::Column::DateOfBirth,
            UserSortField::CreatedAt => user::Column::CreatedAt,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub name: Option<String>,
    pub status: Option<UserStatus>,
    pub sort_by: Option<UserSortField>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserWithEnvironments {
    pub user: user::Model,
    pub environments: AttachOutcome,
}

#[derive(Clone)]
pub struct UserService {
    user_dao: UserDao,
    access: AccessService,
}

impl UserService {
    pub fn new(user_dao: UserDao, access: AccessService) -> Self {
        Self { user_dao, access }
    }

    /// Rejects `candidate` if another user already holds one of its unique
    /// fields, naming the first clash in email, cpf, phone order.
    pub async fn check_conflict(
        &self,
        candidate: &UniqueFields,
        exclude_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let matches = self
            .user_dao
            .find_conflicting(
                &candidate.email,
                &candidate.cpf,
                &candidate.phone_number,
                exclude_id,
            )
            .await?;

        for field in PRECEDENCE {
            if let Some(existing) = matches.iter().find(|row| candidate.shares(field, row)) {
                return Err(ConflictError::Field {
                    field,
                    existing: Box::new(existing.clone()),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Maps a store-level unique violation back onto the field that caused it.
    async fn explain_write_error(
        &self,
        err: DaoLayerError,
        candidate: &UniqueFields,
        exclude_id: Option<Uuid>,
    ) -> AppError {
        match err {
            DaoLayerError::UniqueViolation(detail) => {
                tracing::debug!(%detail, "user write hit a unique constraint");
                match self.check_conflict(candidate, exclude_id).await {
                    Err(conflict) => conflict,
                    Ok(()) => ConflictError::Duplicate.into(),
                }
            }
            other => other.into(),
        }
    }

    pub async fn create_user(
        &self,
        actor: &admin::Model,
        input: NewUser,
    ) -> Result<UserWithEnvironments, AppError> {
        let fields = UserFields {
            name: input.name,
            email: input.email,
            cpf: input.cpf,
            phone_number: input.phone_number,
            date_of_birth: input.date_of_birth,
            status: input.status.unwrap_or(UserStatus::Active),
        }
        .validated(Utc::now().date_naive())?;

        let candidate = fields.unique();
        self.check_conflict(&candidate, None).await?;

        let mut active = user::ActiveModel {
            registered_by_admin_id: Set(actor.id),
            last_accessed_environment_id: Set(None),
            last_access_time: Set(None),
            ..Default::default()
        };
        fields.write_to(&mut active);

        let txn = self
            .user_dao
            .db()
            .begin()
            .await
            .map_err(DaoLayerError::Db)?;
        let user = match self.user_dao.create_in(&txn, active).await {
            Ok(user) => user,
            Err(err) => {
                drop(txn);
                return Err(self.explain_write_error(err, &candidate, None).await);
            }
        };
        let environments = self
            .access
            .attach(&txn, user.id, input.environment_ids)
            .await?;
        txn.commit().await.map_err(DaoLayerError::Db)?;

        tracing::info!(user_id = %user.id, admin = %actor.email, "user created");
        Ok(UserWithEnvironments { user, environments })
    }

    pub async fn get_user(&self, id: Uuid) -> Result<user::Model, AppError> {
        self.user_dao
            .find_by_id(id)
            .await
            .map_err(not_found_as(NotFoundError::User))
    }

    pub async fn list_users(
        &self,
        filter: UserFilter,
        page: u64,
        page_size: u64,
    ) -> Result<PaginatedResponse<user::Model>, AppError> {
        let mut filters = Vec::new();
        if let Some(name) = filter.name.as_deref().filter(|name| !name.trim().is_empty()) {
            filters.push(ColumnFilter::like(
                user::Column::NameUnaccent,
                text::contains_pattern(name),
                LIKE_ESCAPE,
            ));
        }
        if let Some(status) = filter.status {
            filters.push(ColumnFilter::eq(user::Column::Status, status.as_str()));
        }

        let column = filter.sort_by.unwrap_or(UserSortField::Name).column();
        let order = filter.sort_order.unwrap_or_default().into();

        Ok(self
            .user_dao
            .find_with_filters(page, page_size, Some((column, order)), &filters)
            .await?)
    }

    pub async fn update_user(
        &self,
        id: Uuid,
        patch: UserPatch,
    ) -> Result<UserWithEnvironments, AppError> {
        let current = self.get_user(id).await?;
        let environment_ids = patch.environment_ids.clone();
        let fields = patch
            .merge(&current)?
            .validated(Utc::now().date_naive())?;

        let candidate = fields.unique();
        self.check_conflict(&candidate, Some(id)).await?;

        let txn = self
            .user_dao
            .db()
            .begin()
            .await
            .map_err(DaoLayerError::Db)?;
        let user = match self
            .user_dao
            .update_in(&txn, id, move |active| fields.write_to(active))
            .await
        {
            Ok(user) => user,
            Err(DaoLayerError::NotFound { .. }) => return Err(NotFoundError::User.into()),
            Err(err) => {
                drop(txn);
                return Err(self.explain_write_error(err, &candidate, Some(id)).await);
            }
        };
        let environments = self.access.replace(&txn, id, environment_ids).await?;
        txn.commit().await.map_err(DaoLayerError::Db)?;

        tracing::info!(user_id = %id, "user updated");
        Ok(UserWithEnvironments { user, environments })
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<(), AppError> {
        self.user_dao
            .delete(id)
            .await
            .map_err(not_found_as(NotFoundError::User))?;
        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use super::{NewUser, UniqueFields, UserPatch};
    use crate::{
        db::entities::user::{self, UserStatus},
        error::{AppError, ConflictError, NotFoundError, UniqueField},
        services::ServiceContext,
        test_helpers::{admin_model, user_model},
    };

    fn candidate(email: &str, cpf: &str, phone_number: &str) -> UniqueFields {
        UniqueFields {
            email: email.to_string(),
            cpf: cpf.to_string(),
            phone_number: phone_number.to_string(),
        }
    }

    fn conflict_field(err: AppError) -> (UniqueField, Uuid) {
        match err {
            AppError::Conflict(ConflictError::Field { field, existing }) => (field, existing.id),
            other => panic!("expected field conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn email_wins_over_cpf_and_phone() {
        let cpf_owner = user_model("cpf@example.com");
        let email_owner = user_model("ana@example.com");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[cpf_owner.clone(), email_owner.clone()]])
            .into_connection();
        let service = ServiceContext::new(&db).user();

        let err = service
            .check_conflict(
                &candidate("ana@example.com", &cpf_owner.cpf, &cpf_owner.phone_number),
                None,
            )
            .await
            .expect_err("conflict expected");

        assert_eq!(conflict_field(err), (UniqueField::Email, email_owner.id));
    }

    #[tokio::test]
    async fn cpf_wins_over_phone() {
        let phone_owner = user_model("phone@example.com");
        let cpf_owner = user_model("cpf@example.com");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[phone_owner.clone(), cpf_owner.clone()]])
            .into_connection();
        let service = ServiceContext::new(&db).user();

        let err = service
            .check_conflict(
                &candidate("new@example.com", &cpf_owner.cpf, &phone_owner.phone_number),
                None,
            )
            .await
            .expect_err("conflict expected");

        assert_eq!(conflict_field(err), (UniqueField::Cpf, cpf_owner.id));
    }

    #[tokio::test]
    async fn phone_alone_is_reported() {
        let owner = user_model("phone@example.com");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[owner.clone()]])
            .into_connection();
        let service = ServiceContext::new(&db).user();

        let err = service
            .check_conflict(
                &candidate("new@example.com", "000.000.000-00", &owner.phone_number),
                None,
            )
            .await
            .expect_err("conflict expected");

        assert_eq!(conflict_field(err), (UniqueField::PhoneNumber, owner.id));
    }

    #[tokio::test]
    async fn excluded_self_match_is_ok() {
        let me = user_model("ana@example.com");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let service = ServiceContext::new(&db).user();

        service
            .check_conflict(&UniqueFields::of(&me), Some(me.id))
            .await
            .expect("own record must not conflict");

        let statements = format!("{:?}", db.into_transaction_log());
        assert!(statements.contains("<>"));
    }

    #[tokio::test]
    async fn create_rejects_invalid_cpf_before_querying() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = ServiceContext::new(&db).user();

        let err = service
            .create_user(
                &admin_model("root@example.com", true),
                NewUser {
                    name: "Ana".to_string(),
                    email: "ana@example.com".to_string(),
                    cpf: "12345678900".to_string(),
                    phone_number: "(11) 91234-5678".to_string(),
                    date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 1).expect("valid date"),
                    status: None,
                    environment_ids: None,
                },
            )
            .await
            .expect_err("invalid cpf should fail");

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn create_stores_folded_name_and_default_status() {
        let admin = admin_model("root@example.com", true);
        let mut stored = user_model("joao@example.com");
        stored.name = "João".to_string();
        stored.name_unaccent = "joao".to_string();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([[stored.clone()]])
            .into_connection();
        let service = ServiceContext::new(&db).user();

        let created = service
            .create_user(
                &admin,
                NewUser {
                    name: " João ".to_string(),
                    email: stored.email.clone(),
                    cpf: stored.cpf.clone(),
                    phone_number: stored.phone_number.clone(),
                    date_of_birth: stored.date_of_birth,
                    status: None,
                    environment_ids: None,
                },
            )
            .await
            .expect("create should succeed");

        assert_eq!(created.user.id, stored.id);
        assert!(created.environments.existing_ids.is_empty());
        let statements = format!("{:?}", db.into_transaction_log());
        assert!(statements.contains("joao"));
        assert!(statements.contains(UserStatus::Active.as_str()));
    }

    #[tokio::test]
    async fn failed_permission_step_rolls_back_user_insert() {
        let admin = admin_model("root@example.com", true);
        let stored = user_model("ana@example.com");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([[stored.clone()]])
            .into_connection();
        let service = ServiceContext::new(&db).user();

        let err = service
            .create_user(
                &admin,
                NewUser {
                    name: stored.name.clone(),
                    email: stored.email.clone(),
                    cpf: stored.cpf.clone(),
                    phone_number: stored.phone_number.clone(),
                    date_of_birth: stored.date_of_birth,
                    status: None,
                    environment_ids: Some(vec![Uuid::new_v4()]),
                },
            )
            .await
            .expect_err("environment lookup failure should abort the create");

        assert!(matches!(err, AppError::Internal(_)));
        let statements = format!("{:?}", db.into_transaction_log());
        assert!(statements.contains("INSERT INTO"));
        assert!(statements.contains("ROLLBACK"));
        assert!(!statements.contains("COMMIT"));
    }

    #[tokio::test]
    async fn update_of_missing_user_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let service = ServiceContext::new(&db).user();

        let err = service
            .update_user(Uuid::new_v4(), UserPatch::default())
            .await
            .expect_err("missing user should fail");

        assert!(matches!(err, AppError::NotFound(NotFoundError::User)));
    }

    #[tokio::test]
    async fn update_checks_merged_record_against_others() {
        let me = user_model("ana@example.com");
        let other = user_model("bia@example.com");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[me.clone()]])
            .append_query_results([[other.clone()]])
            .into_connection();
        let service = ServiceContext::new(&db).user();

        let err = service
            .update_user(
                me.id,
                UserPatch {
                    cpf: Some(other.cpf.clone()),
                    ..Default::default()
                },
            )
            .await
            .expect_err("taken cpf should conflict");

        assert_eq!(conflict_field(err), (UniqueField::Cpf, other.id));
    }

    #[test]
    fn patch_merge_keeps_untouched_fields() {
        let current = user_model("ana@example.com");
        let merged = UserPatch {
            name: Some("Ana Maria".to_string()),
            status: Some(UserStatus::Inactive),
            ..Default::default()
        }
        .merge(&current)
        .expect("known status should merge");

        assert_eq!(merged.name, "Ana Maria");
        assert_eq!(merged.email, current.email);
        assert_eq!(merged.cpf, current.cpf);
        assert_eq!(merged.status, UserStatus::Inactive);
    }

    #[test]
    fn unknown_stored_status_is_reported_not_rewritten() {
        let mut current = user_model("ana@example.com");
        current.status = "suspended".to_string();

        let err = UserPatch {
            name: Some("Ana Maria".to_string()),
            ..Default::default()
        }
        .merge(&current)
        .expect_err("unknown stored status should surface");
        assert!(err.0.contains("suspended"));

        let merged = UserPatch {
            status: Some(UserStatus::Inactive),
            ..Default::default()
        }
        .merge(&current)
        .expect("explicit status replaces the bad value");
        assert_eq!(merged.status, UserStatus::Inactive);
    }
}
