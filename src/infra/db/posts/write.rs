use async_trait::async_trait;

use crate::application::repos::{CreatePostParams, PostsWriteRepo, RepoError, UpdatePostParams};
use crate::domain::entities::PostRecord;
use crate::infra::db::map_sqlx_error;

use super::PostgresRepositories;
use super::types::PostRow;

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(
            "INSERT INTO posts (author_id, text, group_id, image) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, text, pub_date, author_id, group_id, image",
        )
        .bind(params.author_id)
        .bind(&params.text)
        .bind(params.group_id)
        .bind(params.image.as_deref())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(
            "UPDATE posts SET text = $2, group_id = $3, image = COALESCE($4, image) \
             WHERE id = $1 \
             RETURNING id, text, pub_date, author_id, group_id, image",
        )
        .bind(params.id)
        .bind(&params.text)
        .bind(params.group_id)
        .bind(params.image.as_deref())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(PostRecord::from).ok_or(RepoError::NotFound)
    }
}
