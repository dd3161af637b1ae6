use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{CommentsRepo, CreateCommentParams, RepoError};
use crate::domain::entities::{AuthorRef, CommentRecord, full_name};

use super::{AUTHOR_COLUMNS, PostgresRepositories, map_sqlx_error};

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: i64,
    post_id: i64,
    text: String,
    created: OffsetDateTime,
    author_id: i64,
    author_username: String,
    author_first_name: String,
    author_last_name: String,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            author: AuthorRef {
                id: row.author_id,
                username: row.author_username,
                full_name: full_name(&row.author_first_name, &row.author_last_name),
            },
            text: row.text,
            created: row.created,
        }
    }
}

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "SELECT c.id, c.post_id, c.text, c.created, {AUTHOR_COLUMNS} \
             FROM comments c JOIN users u ON u.id = c.author_id \
             WHERE c.post_id = $1 \
             ORDER BY c.created DESC, c.id DESC"
        ))
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }

    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "WITH inserted AS ( \
                 INSERT INTO comments (post_id, author_id, text) VALUES ($1, $2, $3) \
                 RETURNING id, post_id, author_id, text, created \
             ) \
             SELECT c.id, c.post_id, c.text, c.created, {AUTHOR_COLUMNS} \
             FROM inserted c JOIN users u ON u.id = c.author_id"
        ))
        .bind(params.post_id)
        .bind(params.author_id)
        .bind(&params.text)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }
}
