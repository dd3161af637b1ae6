//! Subscribing to and unsubscribing from authors.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{FollowsRepo, RepoError, UsersRepo};
use crate::domain::entities::UserRecord;

#[derive(Debug, Error)]
pub enum FollowError {
    #[error("user `{0}` does not exist")]
    UnknownAuthor(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    AlreadyFollowing,
    Unfollowed,
    NotFollowing,
    /// Users cannot subscribe to themselves; nothing was changed.
    SelfFollow,
}

#[derive(Clone)]
pub struct FollowService {
    users: Arc<dyn UsersRepo>,
    follows: Arc<dyn FollowsRepo>,
}

impl FollowService {
    pub fn new(users: Arc<dyn UsersRepo>, follows: Arc<dyn FollowsRepo>) -> Self {
        Self { users, follows }
    }

    pub async fn follow(
        &self,
        viewer: &UserRecord,
        username: &str,
    ) -> Result<FollowOutcome, FollowError> {
        let author = self.author(username).await?;
        if author.id == viewer.id {
            return Ok(FollowOutcome::SelfFollow);
        }

        let created = self.follows.follow(viewer.id, author.id).await?;
        if !created {
            return Ok(FollowOutcome::AlreadyFollowing);
        }

        info!(
            target = "yatube::application::follows",
            user = %viewer.username,
            author = %author.username,
            "follow created"
        );
        Ok(FollowOutcome::Followed)
    }

    pub async fn unfollow(
        &self,
        viewer: &UserRecord,
        username: &str,
    ) -> Result<FollowOutcome, FollowError> {
        let author = self.author(username).await?;
        if author.id == viewer.id {
            return Ok(FollowOutcome::SelfFollow);
        }

        if !self.follows.unfollow(viewer.id, author.id).await? {
            return Ok(FollowOutcome::NotFollowing);
        }

        info!(
            target = "yatube::application::follows",
            user = %viewer.username,
            author = %author.username,
            "follow removed"
        );
        Ok(FollowOutcome::Unfollowed)
    }

    async fn author(&self, username: &str) -> Result<UserRecord, FollowError> {
        self.users
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| FollowError::UnknownAuthor(username.to_string()))
    }
}
