use async_trait::async_trait;
use sqlx::QueryBuilder;

use crate::application::pagination::PageWindow;
use crate::application::repos::{PostFilter, PostsRepo, RepoError};
use crate::domain::entities::PostEntry;
use crate::infra::db::map_sqlx_error;
use crate::infra::db::util::convert_count;

use super::PostgresRepositories;
use super::types::PostEntryRow;

fn to_i64(value: u64) -> Result<i64, RepoError> {
    i64::try_from(value).map_err(|_| RepoError::InvalidInput {
        message: format!("page bound {value} is out of range"),
    })
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn count_posts(&self, filter: PostFilter) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM posts p ");
        Self::apply_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        convert_count(count)
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        window: PageWindow,
    ) -> Result<Vec<PostEntry>, RepoError> {
        let mut qb = QueryBuilder::new("");
        Self::push_entry_select(&mut qb);
        Self::apply_filter(&mut qb, filter);
        qb.push(" ORDER BY p.pub_date DESC, p.id DESC LIMIT ");
        qb.push_bind(to_i64(window.limit)?);
        qb.push(" OFFSET ");
        qb.push_bind(to_i64(window.offset)?);

        let rows = qb
            .build_query_as::<PostEntryRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostEntry::from).collect())
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostEntry>, RepoError> {
        let mut qb = QueryBuilder::new("");
        Self::push_entry_select(&mut qb);
        qb.push(" WHERE p.id = ");
        qb.push_bind(id);

        let row = qb
            .build_query_as::<PostEntryRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostEntry::from))
    }
}
