//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::pagination::PageWindow;
use crate::domain::entities::{
    CommentRecord, GroupRecord, PostEntry, PostRecord, UserCredentials, UserRecord,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Which posts a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
    /// Posts by authors the given user follows.
    FollowedBy(i64),
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct CreateGroupParams {
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub author_id: i64,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: i64,
    pub text: String,
    pub group_id: Option<i64>,
    /// `None` keeps the current image.
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct CreateSessionParams {
    pub token_hash: String,
    pub user_id: i64,
    pub expires_at: OffsetDateTime,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_user_by_username(&self, username: &str)
    -> Result<Option<UserRecord>, RepoError>;

    async fn find_credentials(&self, username: &str)
    -> Result<Option<UserCredentials>, RepoError>;

    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError>;
}

#[async_trait]
pub trait SessionsRepo: Send + Sync {
    async fn create_session(&self, params: CreateSessionParams) -> Result<(), RepoError>;

    /// Resolve an unexpired session to its user.
    async fn find_session_user(
        &self,
        token_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<UserRecord>, RepoError>;

    async fn delete_session(&self, token_hash: &str) -> Result<(), RepoError>;

    async fn purge_expired_sessions(&self, now: OffsetDateTime) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait GroupsRepo: Send + Sync {
    async fn list_groups(&self) -> Result<Vec<GroupRecord>, RepoError>;

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError>;

    async fn find_group_by_id(&self, id: i64) -> Result<Option<GroupRecord>, RepoError>;

    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError>;
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn count_posts(&self, filter: PostFilter) -> Result<u64, RepoError>;

    /// Posts newest first, restricted to `window.offset .. window.offset + window.limit`.
    async fn list_posts(
        &self,
        filter: PostFilter,
        window: PageWindow,
    ) -> Result<Vec<PostEntry>, RepoError>;

    async fn find_post(&self, id: i64) -> Result<Option<PostEntry>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Comments on a post, newest first.
    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentRecord>, RepoError>;

    async fn create_comment(&self, params: CreateCommentParams)
    -> Result<CommentRecord, RepoError>;
}

#[async_trait]
pub trait FollowsRepo: Send + Sync {
    async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError>;

    /// Insert the follow row unless it already exists. Returns whether a row was created.
    async fn follow(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError>;

    /// Returns whether a row was removed.
    async fn unfollow(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError>;

    async fn count_followers(&self, author_id: i64) -> Result<u64, RepoError>;

    async fn count_following(&self, user_id: i64) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
