//! Post authoring: create, edit and comment.

use std::sync::Arc;

use bytes::Bytes;
use metrics::{counter, histogram};
use thiserror::Error;
use tracing::{info, warn};

use crate::application::repos::{
    CommentsRepo, CreateCommentParams, CreatePostParams, GroupsRepo, PostsRepo, PostsWriteRepo,
    RepoError, UpdatePostParams,
};
use crate::domain::entities::{CommentRecord, GroupRecord, PostEntry, PostRecord, UserRecord};
use crate::domain::posts::{
    inspect_image, parse_group_choice, validate_comment_text, validate_post_text,
};
use crate::infra::uploads::{UploadStorage, UploadStorageError};

/// An image file as received from a form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub data: Bytes,
}

/// Raw values submitted through the post form.
#[derive(Debug, Clone, Default)]
pub struct PostInput {
    pub text: String,
    pub group: String,
    pub image: Option<ImageUpload>,
}

/// Per-field validation messages for the post form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFormErrors {
    pub text: Option<String>,
    pub group: Option<String>,
    pub image: Option<String>,
}

impl PostFormErrors {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.group.is_none() && self.image.is_none()
    }
}

#[derive(Debug, Error)]
pub enum PostServiceError {
    #[error("post {0} does not exist")]
    PostNotFound(i64),
    #[error("`{editor}` is not the author of post {post_id}")]
    NotAuthor { post_id: i64, editor: String },
    #[error("post form is invalid")]
    InvalidForm(PostFormErrors),
    #[error("comment is invalid: {0}")]
    InvalidComment(String),
    #[error(transparent)]
    Storage(#[from] UploadStorageError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

struct ValidatedPost {
    text: String,
    group_id: Option<i64>,
    image: Option<(ImageUpload, &'static str)>,
}

#[derive(Clone)]
pub struct PostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    groups: Arc<dyn GroupsRepo>,
    comments: Arc<dyn CommentsRepo>,
    storage: Arc<UploadStorage>,
}

impl PostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        groups: Arc<dyn GroupsRepo>,
        comments: Arc<dyn CommentsRepo>,
        storage: Arc<UploadStorage>,
    ) -> Self {
        Self {
            reader,
            writer,
            groups,
            comments,
            storage,
        }
    }

    /// Groups offered by the form's select box.
    pub async fn group_choices(&self) -> Result<Vec<GroupRecord>, PostServiceError> {
        Ok(self.groups.list_groups().await?)
    }

    pub async fn create(
        &self,
        author: &UserRecord,
        input: PostInput,
    ) -> Result<PostRecord, PostServiceError> {
        let validated = self.validate(input).await?;
        let image = self.store_image(validated.image).await?;

        let params = CreatePostParams {
            author_id: author.id,
            text: validated.text,
            group_id: validated.group_id,
            image: image.clone(),
        };
        let post = match self.writer.create_post(params).await {
            Ok(post) => post,
            Err(err) => {
                self.discard_image(image.as_deref()).await;
                return Err(err.into());
            }
        };

        counter!("yatube_posts_created_total").increment(1);
        info!(
            target = "yatube::application::posts",
            post_id = post.id,
            author = %author.username,
            has_image = post.image.is_some(),
            "post created"
        );
        Ok(post)
    }

    /// Load a post for its edit form; only the author may edit.
    pub async fn load_for_edit(
        &self,
        post_id: i64,
        editor: &UserRecord,
    ) -> Result<PostEntry, PostServiceError> {
        let post = self
            .reader
            .find_post(post_id)
            .await?
            .ok_or(PostServiceError::PostNotFound(post_id))?;
        if post.author.id != editor.id {
            return Err(PostServiceError::NotAuthor {
                post_id,
                editor: editor.username.clone(),
            });
        }
        Ok(post)
    }

    pub async fn edit(
        &self,
        post_id: i64,
        editor: &UserRecord,
        input: PostInput,
    ) -> Result<PostRecord, PostServiceError> {
        self.load_for_edit(post_id, editor).await?;

        let validated = self.validate(input).await?;
        let image = self.store_image(validated.image).await?;

        let params = UpdatePostParams {
            id: post_id,
            text: validated.text,
            group_id: validated.group_id,
            image: image.clone(),
        };
        let post = match self.writer.update_post(params).await {
            Ok(post) => post,
            Err(RepoError::NotFound) => {
                self.discard_image(image.as_deref()).await;
                return Err(PostServiceError::PostNotFound(post_id));
            }
            Err(err) => {
                self.discard_image(image.as_deref()).await;
                return Err(err.into());
            }
        };

        info!(
            target = "yatube::application::posts",
            post_id,
            editor = %editor.username,
            image_replaced = image.is_some(),
            "post updated"
        );
        Ok(post)
    }

    pub async fn add_comment(
        &self,
        post_id: i64,
        author: &UserRecord,
        text: &str,
    ) -> Result<CommentRecord, PostServiceError> {
        if self.reader.find_post(post_id).await?.is_none() {
            return Err(PostServiceError::PostNotFound(post_id));
        }
        validate_comment_text(text)
            .map_err(|err| PostServiceError::InvalidComment(err.field_message()))?;

        let comment = self
            .comments
            .create_comment(CreateCommentParams {
                post_id,
                author_id: author.id,
                text: text.to_string(),
            })
            .await?;

        counter!("yatube_comments_created_total").increment(1);
        info!(
            target = "yatube::application::posts",
            post_id,
            comment_id = comment.id,
            author = %author.username,
            "comment added"
        );
        Ok(comment)
    }

    async fn validate(&self, input: PostInput) -> Result<ValidatedPost, PostServiceError> {
        let mut errors = PostFormErrors::default();

        if let Err(err) = validate_post_text(&input.text) {
            errors.text = Some(err.field_message());
        }

        let group_id = match parse_group_choice(&input.group) {
            Ok(Some(id)) => {
                if self.groups.find_group_by_id(id).await?.is_none() {
                    errors.group = Some("select a valid choice".to_string());
                }
                Some(id)
            }
            Ok(None) => None,
            Err(err) => {
                errors.group = Some(err.field_message());
                None
            }
        };

        let image = match input.image {
            Some(upload) => match inspect_image(&upload.data) {
                Ok(info) => Some((upload, info.extension)),
                Err(err) => {
                    errors.image = Some(err.field_message());
                    None
                }
            },
            None => None,
        };

        if !errors.is_empty() {
            return Err(PostServiceError::InvalidForm(errors));
        }

        Ok(ValidatedPost {
            text: input.text,
            group_id,
            image,
        })
    }

    async fn store_image(
        &self,
        image: Option<(ImageUpload, &'static str)>,
    ) -> Result<Option<String>, PostServiceError> {
        let Some((upload, extension)) = image else {
            return Ok(None);
        };
        let stored = self
            .storage
            .store_post_image(&upload.filename, extension, upload.data)
            .await?;
        histogram!("yatube_image_upload_bytes").record(stored.size_bytes as f64);
        info!(
            target = "yatube::application::posts",
            path = %stored.stored_path,
            size_bytes = stored.size_bytes,
            checksum = %stored.checksum,
            "image stored"
        );
        Ok(Some(stored.stored_path))
    }

    async fn discard_image(&self, stored_path: Option<&str>) {
        let Some(path) = stored_path else {
            return;
        };
        if let Err(err) = self.storage.delete(path).await {
            warn!(
                target = "yatube::application::posts",
                path,
                error = %err,
                "failed to remove orphaned image"
            );
        }
    }
}
