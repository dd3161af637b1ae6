use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{CreateGroupParams, GroupsRepo, RepoError};
use crate::domain::entities::{GROUP_TITLE_MAX_CHARS, GroupRecord};
use crate::domain::slug::{SlugAsyncError, SlugError, generate_unique_slug, validate_slug};

#[derive(Debug, Error)]
pub enum GroupError {
    #[error("group title must not be empty")]
    EmptyTitle,
    #[error("group title must be at most {GROUP_TITLE_MAX_CHARS} characters")]
    TitleTooLong,
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error("slug `{0}` is already in use")]
    SlugTaken(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub title: String,
    /// Derived from the title when absent.
    pub slug: Option<String>,
    pub description: String,
}

#[derive(Clone)]
pub struct GroupService {
    groups: Arc<dyn GroupsRepo>,
}

impl GroupService {
    pub fn new(groups: Arc<dyn GroupsRepo>) -> Self {
        Self { groups }
    }

    pub async fn create(&self, new_group: NewGroup) -> Result<GroupRecord, GroupError> {
        let title = new_group.title.trim().to_string();
        if title.is_empty() {
            return Err(GroupError::EmptyTitle);
        }
        if title.chars().count() > GROUP_TITLE_MAX_CHARS {
            return Err(GroupError::TitleTooLong);
        }

        let slug = match new_group.slug {
            Some(slug) => {
                validate_slug(&slug)?;
                slug
            }
            None => {
                let groups = self.groups.clone();
                generate_unique_slug(&title, |candidate| {
                    let groups = groups.clone();
                    let candidate = candidate.to_string();
                    async move {
                        groups
                            .find_group_by_slug(&candidate)
                            .await
                            .map(|found| found.is_none())
                    }
                })
                .await
                .map_err(|err| match err {
                    SlugAsyncError::Slug(err) => GroupError::Slug(err),
                    SlugAsyncError::Predicate(err) => GroupError::Repo(err),
                })?
            }
        };

        let group = self
            .groups
            .create_group(CreateGroupParams {
                title,
                slug: slug.clone(),
                description: new_group.description.trim().to_string(),
            })
            .await
            .map_err(|err| match err {
                RepoError::Duplicate { .. } => GroupError::SlugTaken(slug),
                other => GroupError::Repo(other),
            })?;

        info!(
            target = "yatube::application::groups",
            group_id = group.id,
            slug = %group.slug,
            "group created"
        );
        Ok(group)
    }
}
