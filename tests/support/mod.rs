//! In-memory repositories and a router harness for the HTTP tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tower::ServiceExt;

use yatube::application::auth::{AuthService, NewUser};
use yatube::application::feed::FeedService;
use yatube::application::follows::FollowService;
use yatube::application::pagination::{PageWindow, Paginator};
use yatube::application::posts::PostService;
use yatube::application::repos::{
    CommentsRepo, CreateCommentParams, CreateGroupParams, CreatePostParams, CreateSessionParams,
    CreateUserParams, FollowsRepo, GroupsRepo, HealthRepo, PostFilter, PostsRepo, PostsWriteRepo,
    RepoError, SessionsRepo, UpdatePostParams, UsersRepo,
};
use yatube::cache::{CacheConfig, CacheState};
use yatube::domain::entities::{
    CommentRecord, GroupRecord, GroupRef, PostEntry, PostRecord, UserCredentials, UserRecord,
};
use yatube::infra::http::{self, HttpState, SessionCookie};
use yatube::infra::uploads::UploadStorage;

pub const PASSWORD: &str = "correct-horse-42";
pub const COOKIE_NAME: &str = "yatube_session";

pub const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00, 0x00, 0x00,
    0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
];

#[derive(Default)]
struct Inner {
    next_id: i64,
    users: Vec<(UserRecord, String)>,
    sessions: HashMap<String, (i64, OffsetDateTime)>,
    groups: Vec<GroupRecord>,
    posts: Vec<PostRecord>,
    comments: Vec<CommentRecord>,
    follows: HashSet<(i64, i64)>,
}

impl Inner {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: i64) -> Option<&UserRecord> {
        self.users
            .iter()
            .map(|(user, _)| user)
            .find(|user| user.id == id)
    }

    fn entry(&self, post: &PostRecord) -> Result<PostEntry, RepoError> {
        let author = self.user(post.author_id).ok_or(RepoError::NotFound)?;
        let group = post.group_id.and_then(|id| {
            self.groups.iter().find(|g| g.id == id).map(|g| GroupRef {
                id: g.id,
                slug: g.slug.clone(),
                title: g.title.clone(),
            })
        });
        Ok(PostEntry {
            id: post.id,
            text: post.text.clone(),
            pub_date: post.pub_date,
            image: post.image.clone(),
            author: author.author_ref(),
            group,
        })
    }

    fn matches(&self, filter: PostFilter, post: &PostRecord) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(id) => post.group_id == Some(id),
            PostFilter::Author(id) => post.author_id == id,
            PostFilter::FollowedBy(user_id) => self.follows.contains(&(user_id, post.author_id)),
        }
    }
}

/// Every repository trait backed by one set of in-memory tables.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub async fn insert_group(&self, title: &str, slug: &str) -> GroupRecord {
        self.create_group(CreateGroupParams {
            title: title.to_string(),
            slug: slug.to_string(),
            description: format!("All about {title}"),
        })
        .await
        .expect("group created")
    }

    pub async fn insert_post(&self, author: &UserRecord, text: &str, group_id: Option<i64>) -> i64 {
        self.create_post(CreatePostParams {
            author_id: author.id,
            text: text.to_string(),
            group_id,
            image: None,
        })
        .await
        .expect("post created")
        .id
    }

    pub async fn post(&self, id: i64) -> Option<PostRecord> {
        self.inner
            .lock()
            .await
            .posts
            .iter()
            .find(|post| post.id == id)
            .cloned()
    }

    pub async fn latest_post(&self) -> Option<PostRecord> {
        self.inner
            .lock()
            .await
            .posts
            .iter()
            .max_by_key(|post| post.id)
            .cloned()
    }

    pub async fn post_count(&self) -> usize {
        self.inner.lock().await.posts.len()
    }

    pub async fn comment_count(&self, post_id: i64) -> usize {
        self.inner
            .lock()
            .await
            .comments
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .count()
    }

    pub async fn follows(&self, user_id: i64, author_id: i64) -> bool {
        self.inner.lock().await.follows.contains(&(user_id, author_id))
    }
}

#[async_trait]
impl UsersRepo for MemoryStore {
    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, RepoError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .users
            .iter()
            .map(|(user, _)| user)
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, RepoError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .users
            .iter()
            .find(|(user, _)| user.username == username)
            .map(|(user, hash)| UserCredentials {
                user: user.clone(),
                password_hash: hash.clone(),
            }))
    }

    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let mut inner = self.inner.lock().await;
        if inner
            .users
            .iter()
            .any(|(user, _)| user.username == params.username)
        {
            return Err(RepoError::Duplicate {
                constraint: "users_username_key".to_string(),
            });
        }
        let user = UserRecord {
            id: inner.id(),
            username: params.username,
            first_name: params.first_name,
            last_name: params.last_name,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.users.push((user.clone(), params.password_hash));
        Ok(user)
    }
}

#[async_trait]
impl SessionsRepo for MemoryStore {
    async fn create_session(&self, params: CreateSessionParams) -> Result<(), RepoError> {
        self.inner
            .lock()
            .await
            .sessions
            .insert(params.token_hash, (params.user_id, params.expires_at));
        Ok(())
    }

    async fn find_session_user(
        &self,
        token_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<UserRecord>, RepoError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .sessions
            .get(token_hash)
            .filter(|(_, expires_at)| *expires_at > now)
            .and_then(|(user_id, _)| inner.user(*user_id).cloned()))
    }

    async fn delete_session(&self, token_hash: &str) -> Result<(), RepoError> {
        self.inner.lock().await.sessions.remove(token_hash);
        Ok(())
    }

    async fn purge_expired_sessions(&self, now: OffsetDateTime) -> Result<u64, RepoError> {
        let mut inner = self.inner.lock().await;
        let before = inner.sessions.len();
        inner
            .sessions
            .retain(|_, (_, expires_at)| *expires_at > now);
        Ok((before - inner.sessions.len()) as u64)
    }
}

#[async_trait]
impl GroupsRepo for MemoryStore {
    async fn list_groups(&self) -> Result<Vec<GroupRecord>, RepoError> {
        let mut groups = self.inner.lock().await.groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError> {
        let inner = self.inner.lock().await;
        Ok(inner.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn find_group_by_id(&self, id: i64) -> Result<Option<GroupRecord>, RepoError> {
        let inner = self.inner.lock().await;
        Ok(inner.groups.iter().find(|g| g.id == id).cloned())
    }

    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError> {
        let mut inner = self.inner.lock().await;
        if inner.groups.iter().any(|g| g.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "post_groups_slug_key".to_string(),
            });
        }
        let group = GroupRecord {
            id: inner.id(),
            title: params.title,
            slug: params.slug,
            description: params.description,
        };
        inner.groups.push(group.clone());
        Ok(group)
    }
}

#[async_trait]
impl PostsRepo for MemoryStore {
    async fn count_posts(&self, filter: PostFilter) -> Result<u64, RepoError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .posts
            .iter()
            .filter(|post| inner.matches(filter, post))
            .count() as u64)
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        window: PageWindow,
    ) -> Result<Vec<PostEntry>, RepoError> {
        let inner = self.inner.lock().await;
        let mut posts: Vec<&PostRecord> = inner
            .posts
            .iter()
            .filter(|post| inner.matches(filter, post))
            .collect();
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
        posts
            .into_iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .map(|post| inner.entry(post))
            .collect()
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostEntry>, RepoError> {
        let inner = self.inner.lock().await;
        inner
            .posts
            .iter()
            .find(|post| post.id == id)
            .map(|post| inner.entry(post))
            .transpose()
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryStore {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut inner = self.inner.lock().await;
        let post = PostRecord {
            id: inner.id(),
            text: params.text,
            pub_date: OffsetDateTime::now_utc(),
            author_id: params.author_id,
            group_id: params.group_id,
            image: params.image,
        };
        inner.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut inner = self.inner.lock().await;
        let post = inner
            .posts
            .iter_mut()
            .find(|post| post.id == params.id)
            .ok_or(RepoError::NotFound)?;
        post.text = params.text;
        post.group_id = params.group_id;
        if params.image.is_some() {
            post.image = params.image;
        }
        Ok(post.clone())
    }
}

#[async_trait]
impl CommentsRepo for MemoryStore {
    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentRecord>, RepoError> {
        let inner = self.inner.lock().await;
        let mut comments: Vec<CommentRecord> = inner
            .comments
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
        Ok(comments)
    }

    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let mut inner = self.inner.lock().await;
        let author = inner
            .user(params.author_id)
            .ok_or(RepoError::NotFound)?
            .author_ref();
        let comment = CommentRecord {
            id: inner.id(),
            post_id: params.post_id,
            author,
            text: params.text,
            created: OffsetDateTime::now_utc(),
        };
        inner.comments.push(comment.clone());
        Ok(comment)
    }
}

#[async_trait]
impl FollowsRepo for MemoryStore {
    async fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError> {
        Ok(self.follows(user_id, author_id).await)
    }

    async fn follow(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError> {
        Ok(self.inner.lock().await.follows.insert((user_id, author_id)))
    }

    async fn unfollow(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError> {
        Ok(self.inner.lock().await.follows.remove(&(user_id, author_id)))
    }

    async fn count_followers(&self, author_id: i64) -> Result<u64, RepoError> {
        let inner = self.inner.lock().await;
        Ok(inner.follows.iter().filter(|(_, a)| *a == author_id).count() as u64)
    }

    async fn count_following(&self, user_id: i64) -> Result<u64, RepoError> {
        let inner = self.inner.lock().await;
        Ok(inner.follows.iter().filter(|(u, _)| *u == user_id).count() as u64)
    }
}

#[async_trait]
impl HealthRepo for MemoryStore {
    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

/// A router wired to a [`MemoryStore`] and a temporary media directory.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub state: HttpState,
    pub media: tempfile::TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_cache(config: CacheConfig) -> Self {
        Self::build(Some(CacheState::new(config)))
    }

    fn build(cache: Option<CacheState>) -> Self {
        let store = Arc::new(MemoryStore::default());
        let media = tempfile::tempdir().expect("media dir");
        let storage =
            Arc::new(UploadStorage::new(media.path().to_path_buf()).expect("upload storage"));

        let posts_repo: Arc<dyn PostsRepo> = store.clone();
        let posts_write_repo: Arc<dyn PostsWriteRepo> = store.clone();
        let groups_repo: Arc<dyn GroupsRepo> = store.clone();
        let users_repo: Arc<dyn UsersRepo> = store.clone();
        let sessions_repo: Arc<dyn SessionsRepo> = store.clone();
        let comments_repo: Arc<dyn CommentsRepo> = store.clone();
        let follows_repo: Arc<dyn FollowsRepo> = store.clone();
        let health_repo: Arc<dyn HealthRepo> = store.clone();

        let feed = FeedService::new(
            posts_repo.clone(),
            groups_repo.clone(),
            users_repo.clone(),
            follows_repo.clone(),
            comments_repo.clone(),
            Paginator::new(NonZeroU32::new(10).expect("non-zero")),
            15,
        );
        let posts = PostService::new(
            posts_repo,
            posts_write_repo,
            groups_repo,
            comments_repo,
            storage.clone(),
        );
        let follows = FollowService::new(users_repo.clone(), follows_repo);
        let auth = AuthService::new(
            users_repo,
            sessions_repo,
            Duration::from_secs(14 * 24 * 60 * 60),
        );

        let state = HttpState {
            feed: Arc::new(feed),
            posts: Arc::new(posts),
            follows: Arc::new(follows),
            auth: Arc::new(auth),
            health: health_repo,
            upload_storage: storage,
            session_cookie: SessionCookie {
                name: COOKIE_NAME.to_string(),
                secure: false,
            },
            max_request_bytes: 2 * 1024 * 1024,
            cache,
        };

        Self {
            router: http::build_router(state.clone()),
            store,
            state,
            media,
        }
    }

    /// Register `username` and log in. Returns the user and a `Cookie` header value.
    pub async fn sign_up(&self, username: &str) -> (UserRecord, String) {
        let user = self
            .state
            .auth
            .create_user(NewUser {
                username: username.to_string(),
                first_name: String::new(),
                last_name: String::new(),
                password: PASSWORD.to_string(),
            })
            .await
            .expect("user created");
        let session = self
            .state
            .auth
            .login(username, PASSWORD)
            .await
            .expect("logged in");
        (user, format!("{COOKIE_NAME}={}", session.token))
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).expect("request"))
            .await
    }

    pub async fn post_form(&self, uri: &str, cookie: Option<&str>, body: &str) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).expect("request"))
            .await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        cookie: &str,
        fields: &[(&str, &str)],
        image: Option<(&str, &[u8])>,
    ) -> Response<Body> {
        let (content_type, body) = multipart_body(fields, image);
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::COOKIE, cookie)
            .body(Body::from(body))
            .expect("request");
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }
}

const BOUNDARY: &str = "yatube-test-boundary";

fn multipart_body(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, data)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

/// The template name rendered into `<main data-page="...">`.
pub fn page_name(html: &str) -> Option<&str> {
    let start = html.find("data-page=\"")? + "data-page=\"".len();
    let end = html[start..].find('"')?;
    Some(&html[start..start + end])
}

/// Number of post cards on a listing page.
pub fn card_count(html: &str) -> usize {
    html.matches("<article class=\"post\" data-post-id=").count()
}
