use serde_json::{json, Value};
use sqlx::{self, postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::Table;
use crate::database::query_builder::QueryBuilder;
use crate::filter::error::FilterError;
use crate::filter::FilterData;

/// Error from a repository read: either the filter was rejected or the query failed
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub struct Repository<T> {
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: Table + for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, RepositoryError> {
        self.select_scoped(filter_data, Value::Null).await
    }

    /// Select with caller-supplied filters narrowed by a fixed scope
    pub async fn select_scoped(&self, filter_data: FilterData, scope: Value) -> Result<Vec<T>, RepositoryError> {
        Ok(QueryBuilder::<T>::new()?
            .filter(filter_data)?
            .scope(scope)?
            .select_all(&self.pool)
            .await?)
    }

    pub async fn select_one(&self, filter_data: FilterData) -> Result<Option<T>, RepositoryError> {
        Ok(QueryBuilder::<T>::new()?
            .filter(filter_data)?
            .select_optional(&self.pool)
            .await?)
    }

    pub async fn select_id(&self, id: Uuid) -> Result<Option<T>, RepositoryError> {
        self.select_one(FilterData {
            where_clause: Some(json!({ "id": id })),
            ..Default::default()
        })
        .await
    }

    pub async fn count_scoped(&self, scope: Value) -> Result<i64, RepositoryError> {
        Ok(QueryBuilder::<T>::new()?
            .scope(scope)?
            .count(&self.pool)
            .await?)
    }
}
