//! Feed assembly: paginated post listings and the post detail page.

use std::sync::Arc;

use thiserror::Error;

use crate::application::pagination::{Page, PageNumber, Paginator};
use crate::application::repos::{
    CommentsRepo, FollowsRepo, GroupsRepo, PostFilter, PostsRepo, RepoError, UsersRepo,
};
use crate::domain::entities::UserRecord;
use crate::presentation::views::{
    AuthorView, CommentView, GroupListContext, IndexContext, PostCard, PostDetailContext,
    ProfileContext,
};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    groups: Arc<dyn GroupsRepo>,
    users: Arc<dyn UsersRepo>,
    follows: Arc<dyn FollowsRepo>,
    comments: Arc<dyn CommentsRepo>,
    paginator: Paginator,
    preview_chars: usize,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        groups: Arc<dyn GroupsRepo>,
        users: Arc<dyn UsersRepo>,
        follows: Arc<dyn FollowsRepo>,
        comments: Arc<dyn CommentsRepo>,
        paginator: Paginator,
        preview_chars: usize,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
            follows,
            comments,
            paginator,
            preview_chars,
        }
    }

    pub async fn index(&self, page: PageNumber) -> Result<IndexContext, FeedError> {
        let page = self.page_of(PostFilter::All, page).await?;
        Ok(IndexContext { page })
    }

    pub async fn group_list(
        &self,
        slug: &str,
        page: PageNumber,
    ) -> Result<Option<GroupListContext>, FeedError> {
        let Some(group) = self.groups.find_group_by_slug(slug).await? else {
            return Ok(None);
        };
        let page = self.page_of(PostFilter::Group(group.id), page).await?;
        Ok(Some(GroupListContext { group, page }))
    }

    pub async fn profile(
        &self,
        username: &str,
        page: PageNumber,
        viewer: Option<&UserRecord>,
    ) -> Result<Option<ProfileContext>, FeedError> {
        let Some(author) = self.users.find_user_by_username(username).await? else {
            return Ok(None);
        };

        let page = self.page_of(PostFilter::Author(author.id), page).await?;
        let followers = self.follows.count_followers(author.id).await?;
        let following_count = self.follows.count_following(author.id).await?;

        let (following, can_follow) = match viewer {
            Some(viewer) if viewer.id != author.id => {
                (self.follows.is_following(viewer.id, author.id).await?, true)
            }
            _ => (false, false),
        };

        Ok(Some(ProfileContext {
            author: AuthorView::from(&author),
            post_count: page.total,
            followers,
            following_count,
            following,
            can_follow,
            page,
        }))
    }

    /// Posts by the authors `viewer` follows.
    pub async fn follow_index(
        &self,
        viewer: &UserRecord,
        page: PageNumber,
    ) -> Result<IndexContext, FeedError> {
        let page = self.page_of(PostFilter::FollowedBy(viewer.id), page).await?;
        Ok(IndexContext { page })
    }

    pub async fn post_detail(
        &self,
        post_id: i64,
        viewer: Option<&UserRecord>,
    ) -> Result<Option<PostDetailContext>, FeedError> {
        let Some(post) = self.posts.find_post(post_id).await? else {
            return Ok(None);
        };

        let author_post_count = self
            .posts
            .count_posts(PostFilter::Author(post.author.id))
            .await?;
        let comments = self
            .comments
            .list_comments(post.id)
            .await?
            .iter()
            .map(CommentView::from)
            .collect();

        let can_edit = viewer.is_some_and(|viewer| viewer.id == post.author.id);
        let can_comment = viewer.is_some();

        Ok(Some(PostDetailContext {
            title: post.preview(self.preview_chars).to_string(),
            post: PostCard::from_entry(&post, self.preview_chars),
            author_post_count,
            comments,
            can_edit,
            can_comment,
        }))
    }

    async fn page_of(
        &self,
        filter: PostFilter,
        requested: PageNumber,
    ) -> Result<Page<PostCard>, FeedError> {
        let total = self.posts.count_posts(filter).await?;
        let window = self.paginator.window(total, requested);
        let entries = if window.limit == 0 {
            Vec::new()
        } else {
            self.posts.list_posts(filter, window).await?
        };

        Ok(Page::new(entries, window).map(|entry| PostCard::from_entry(&entry, self.preview_chars)))
    }
}
