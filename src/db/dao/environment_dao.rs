use std::collections::HashSet;

use sea_orm::sea_query::Query;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult, PaginatedResponse};
use crate::db::entities::{environment, prelude::Environment, user_environment};

#[derive(Clone)]
pub struct EnvironmentDao {
    db: DatabaseConnection,
}

impl DaoBase for EnvironmentDao {
    type Entity = Environment;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl EnvironmentDao {
    pub async fn find_by_name(&self, name: &str) -> DaoResult<Option<environment::Model>> {
        Environment::find()
            .filter(environment::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    /// The subset of `ids` naming stored environments, in input order.
    pub async fn existing_ids(
        &self,
        conn: &impl ConnectionTrait,
        ids: &[Uuid],
    ) -> DaoResult<Vec<Uuid>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found: HashSet<Uuid> = Environment::find()
            .filter(environment::Column::Id.is_in(ids.iter().copied()))
            .all(conn)
            .await
            .map_err(DaoLayerError::Db)?
            .into_iter()
            .map(|env| env.id)
            .collect();

        Ok(ids.iter().copied().filter(|id| found.contains(id)).collect())
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        page: u64,
        page_size: u64,
    ) -> DaoResult<PaginatedResponse<environment::Model>> {
        let linked = Query::select()
            .column(user_environment::Column::EnvironmentId)
            .from(user_environment::Entity)
            .and_where(user_environment::Column::UserId.eq(user_id))
            .to_owned();

        self.find(
            page,
            page_size,
            Some((environment::Column::Name, Order::Asc)),
            move |query| query.filter(environment::Column::Id.in_subquery(linked)),
        )
        .await
    }
}
