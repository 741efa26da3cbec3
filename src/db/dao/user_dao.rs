use sea_orm::sea_query::Query;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult, PaginatedResponse};
use crate::db::entities::{prelude::User, user, user_environment};

#[derive(Clone)]
pub struct UserDao {
    db: DatabaseConnection,
}

impl DaoBase for UserDao {
    type Entity = User;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl UserDao {
    /// Every user sharing at least one of the unique fields, minus `exclude_id`.
    pub async fn find_conflicting(
        &self,
        email: &str,
        cpf: &str,
        phone_number: &str,
        exclude_id: Option<Uuid>,
    ) -> DaoResult<Vec<user::Model>> {
        let mut query = User::find().filter(
            Condition::any()
                .add(user::Column::Email.eq(email))
                .add(user::Column::Cpf.eq(cpf))
                .add(user::Column::PhoneNumber.eq(phone_number)),
        );
        if let Some(id) = exclude_id {
            query = query.filter(user::Column::Id.ne(id));
        }

        query
            .order_by_asc(user::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn list_for_environment(
        &self,
        environment_id: Uuid,
        page: u64,
        page_size: u64,
    ) -> DaoResult<PaginatedResponse<user::Model>> {
        let linked = Query::select()
            .column(user_environment::Column::UserId)
            .from(user_environment::Entity)
            .and_where(user_environment::Column::EnvironmentId.eq(environment_id))
            .to_owned();

        self.find(
            page,
            page_size,
            Some((user::Column::Name, Order::Asc)),
            move |query| query.filter(user::Column::Id.in_subquery(linked)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use super::UserDao;
    use crate::db::dao::{DaoBase, DaoLayerError};
    use crate::db::entities::user;
    use crate::test_helpers::user_model;

    #[tokio::test]
    async fn find_conflicting_returns_every_match() {
        let first = user_model("ana@example.com");
        let second = user_model("bia@example.com");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[first.clone(), second.clone()]])
            .into_connection();
        let dao = UserDao::new(&db);

        let found = dao
            .find_conflicting("ana@example.com", &second.cpf, "(11) 91111-1111", None)
            .await
            .expect("query should succeed");
        assert_eq!(found, vec![first, second]);
    }

    #[tokio::test]
    async fn list_for_environment_flags_next_page() {
        let rows = vec![
            user_model("a@example.com"),
            user_model("b@example.com"),
            user_model("c@example.com"),
        ];
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([rows])
            .into_connection();
        let dao = UserDao::new(&db);

        let page = dao
            .list_for_environment(Uuid::new_v4(), 1, 2)
            .await
            .expect("query should succeed");
        assert_eq!(page.data.len(), 2);
        assert!(page.has_next);
    }

    #[tokio::test]
    async fn zero_page_is_rejected_before_querying() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let dao = UserDao::new(&db);

        let err = dao
            .find(0, 10, None, |query| query)
            .await
            .expect_err("page 0 should be rejected");
        assert!(matches!(err, DaoLayerError::InvalidPagination { page: 0, .. }));
    }

    #[tokio::test]
    async fn update_propagates_not_found() {
        let missing_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let dao = UserDao::new(&db);

        let err = dao
            .update(missing_id, |_| {})
            .await
            .expect_err("update should fail");
        assert!(matches!(
            err,
            DaoLayerError::NotFound { id, .. } if id == missing_id
        ));
    }
}
