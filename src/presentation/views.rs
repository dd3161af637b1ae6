use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::application::auth::SignupFormErrors;
use crate::application::chrome::build_chrome;
use crate::application::error::{ErrorReport, HttpError};
use crate::application::pagination::Page;
use crate::application::posts::PostFormErrors;
use crate::domain::entities::{CommentRecord, GroupRecord, PostEntry, UserRecord};
use crate::domain::fields::{COMMENT_TEXT, FieldMeta, POST_GROUP, POST_IMAGE, POST_TEXT};
use crate::domain::posts::HUMAN_DATE_FORMAT;

/// URL prefix uploaded files are served under.
pub const MEDIA_URL: &str = "/media/";

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Render the error page for `status`: `core/404.html` for 404, `core/500.html`
/// for everything else. Falls back to plain text if the template itself fails.
pub fn render_error_page(status: StatusCode, message: &str) -> Response {
    let chrome = build_chrome(None, "").with_title(message);
    let content = ErrorPageView {
        status: status.as_u16(),
        message: message.to_string(),
    };
    let view = LayoutContext::new(chrome, content);

    let rendered = if status == StatusCode::NOT_FOUND {
        NotFoundTemplate { view }.render()
    } else {
        ServerErrorTemplate { view }.render()
    };

    match rendered {
        Ok(html) => (status, Html(html)).into_response(),
        Err(_) => (status, message.to_string()).into_response(),
    }
}

pub fn render_not_found_response(chrome: LayoutChrome) -> Response {
    let content = ErrorPageView {
        status: StatusCode::NOT_FOUND.as_u16(),
        message: "Page not found".to_string(),
    };
    let view = LayoutContext::new(chrome.with_title("Page not found"), content);
    let mut response = render_template_response(NotFoundTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

#[derive(Clone)]
pub struct NavigationView {
    pub entries: Vec<NavigationLinkView>,
}

#[derive(Clone)]
pub struct BrandView {
    pub title: String,
    pub href: String,
}

#[derive(Clone)]
pub struct NavigationLinkView {
    pub label: String,
    pub href: String,
    pub active: bool,
}

#[derive(Clone)]
pub struct ViewerView {
    pub username: String,
    pub display_name: String,
}

#[derive(Clone)]
pub struct PageMetaView {
    pub title: String,
}

#[derive(Clone)]
pub struct LayoutChrome {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub viewer: Option<ViewerView>,
    pub meta: PageMetaView,
}

impl LayoutChrome {
    pub fn with_title(self, title: &str) -> Self {
        let title = format!("{title} | {}", self.brand.title);
        Self {
            meta: PageMetaView { title },
            ..self
        }
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub brand: BrandView,
    pub navigation: NavigationView,
    pub viewer: Option<ViewerView>,
    pub meta: PageMetaView,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            brand: chrome.brand,
            navigation: chrome.navigation,
            viewer: chrome.viewer,
            meta: chrome.meta,
            content,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GroupBadge {
    pub slug: String,
    pub title: String,
    pub href: String,
}

#[derive(Debug, Clone)]
pub struct PostCard {
    pub id: i64,
    pub text: String,
    pub preview: String,
    pub pub_date: String,
    pub pub_date_iso: String,
    pub author_username: String,
    pub author_name: String,
    pub author_href: String,
    pub group: Option<GroupBadge>,
    pub image_url: Option<String>,
    pub detail_href: String,
}

impl PostCard {
    pub fn from_entry(entry: &PostEntry, preview_chars: usize) -> Self {
        Self {
            id: entry.id,
            text: entry.text.clone(),
            preview: entry.preview(preview_chars).to_string(),
            pub_date: human_date(entry.pub_date),
            pub_date_iso: entry.pub_date.format(&Rfc3339).unwrap_or_default(),
            author_username: entry.author.username.clone(),
            author_name: entry.author.display_name(),
            author_href: profile_href(&entry.author.username),
            group: entry.group.as_ref().map(|group| GroupBadge {
                slug: group.slug.clone(),
                title: group.title.clone(),
                href: group_href(&group.slug),
            }),
            image_url: entry.image.as_deref().map(media_url),
            detail_href: post_href(entry.id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthorView {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub href: String,
}

impl From<&UserRecord> for AuthorView {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.to_string(),
            href: profile_href(&user.username),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommentView {
    pub id: i64,
    pub author_username: String,
    pub author_name: String,
    pub author_href: String,
    pub text: String,
    pub created: String,
}

impl From<&CommentRecord> for CommentView {
    fn from(comment: &CommentRecord) -> Self {
        Self {
            id: comment.id,
            author_username: comment.author.username.clone(),
            author_name: comment.author.display_name(),
            author_href: profile_href(&comment.author.username),
            text: comment.text.clone(),
            created: human_date(comment.created),
        }
    }
}

pub struct IndexContext {
    pub page: Page<PostCard>,
}

pub struct GroupListContext {
    pub group: GroupRecord,
    pub page: Page<PostCard>,
}

pub struct ProfileContext {
    pub author: AuthorView,
    pub post_count: u64,
    pub followers: u64,
    pub following_count: u64,
    /// Whether the viewer follows this author.
    pub following: bool,
    /// False for guests and for the author's own profile.
    pub can_follow: bool,
    pub page: Page<PostCard>,
}

pub struct PostDetailContext {
    pub title: String,
    pub post: PostCard,
    pub author_post_count: u64,
    pub comments: Vec<CommentView>,
    pub can_edit: bool,
    pub can_comment: bool,
}

/// Wraps a feed page with the path its paginator links point at.
pub struct FeedView<T> {
    pub context: T,
    pub base_path: String,
}

#[derive(Debug, Clone)]
pub struct GroupOption {
    pub id: i64,
    pub title: String,
    pub selected: bool,
}

pub struct PostFormView {
    pub is_edit: bool,
    pub action: String,
    pub text: String,
    pub groups: Vec<GroupOption>,
    pub errors: PostFormErrors,
    pub current_image: Option<String>,
    pub text_field: FieldMeta,
    pub group_field: FieldMeta,
    pub image_field: FieldMeta,
}

impl PostFormView {
    pub fn new(
        action: String,
        is_edit: bool,
        text: String,
        selected_group: Option<i64>,
        groups: &[GroupRecord],
    ) -> Self {
        Self {
            is_edit,
            action,
            text,
            groups: groups
                .iter()
                .map(|group| GroupOption {
                    id: group.id,
                    title: group.title.clone(),
                    selected: Some(group.id) == selected_group,
                })
                .collect(),
            errors: PostFormErrors::default(),
            current_image: None,
            text_field: POST_TEXT,
            group_field: POST_GROUP,
            image_field: POST_IMAGE,
        }
    }

    pub fn with_errors(self, errors: PostFormErrors) -> Self {
        Self { errors, ..self }
    }

    pub fn with_current_image(self, stored_path: Option<&str>) -> Self {
        Self {
            current_image: stored_path.map(media_url),
            ..self
        }
    }
}

pub struct CommentFormView {
    pub action: String,
    pub field: FieldMeta,
}

impl CommentFormView {
    pub fn for_post(post_id: i64) -> Self {
        Self {
            action: format!("/posts/{post_id}/comment/"),
            field: COMMENT_TEXT,
        }
    }
}

pub struct PostDetailView {
    pub detail: PostDetailContext,
    pub comment_form: CommentFormView,
}

#[derive(Default)]
pub struct LoginFormView {
    pub username: String,
    pub next: String,
    pub error: Option<String>,
}

#[derive(Default)]
pub struct SignupFormView {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub errors: SignupFormErrors,
}

pub struct ErrorPageView {
    pub status: u16,
    pub message: String,
}

#[derive(Template)]
#[template(path = "posts/index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<FeedView<IndexContext>>,
}

#[derive(Template)]
#[template(path = "posts/group_list.html")]
pub struct GroupListTemplate {
    pub view: LayoutContext<FeedView<GroupListContext>>,
}

#[derive(Template)]
#[template(path = "posts/profile.html")]
pub struct ProfileTemplate {
    pub view: LayoutContext<FeedView<ProfileContext>>,
}

#[derive(Template)]
#[template(path = "posts/follow.html")]
pub struct FollowTemplate {
    pub view: LayoutContext<FeedView<IndexContext>>,
}

#[derive(Template)]
#[template(path = "posts/post_detail.html")]
pub struct PostDetailTemplate {
    pub view: LayoutContext<PostDetailView>,
}

#[derive(Template)]
#[template(path = "posts/create_post.html")]
pub struct PostFormTemplate {
    pub view: LayoutContext<PostFormView>,
}

#[derive(Template)]
#[template(path = "users/login.html")]
pub struct LoginTemplate {
    pub view: LayoutContext<LoginFormView>,
}

#[derive(Template)]
#[template(path = "users/signup.html")]
pub struct SignupTemplate {
    pub view: LayoutContext<SignupFormView>,
}

#[derive(Template)]
#[template(path = "core/404.html")]
pub struct NotFoundTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

#[derive(Template)]
#[template(path = "core/500.html")]
pub struct ServerErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}

pub fn profile_href(username: &str) -> String {
    format!("/profile/{username}/")
}

pub fn group_href(slug: &str) -> String {
    format!("/group/{slug}/")
}

pub fn post_href(post_id: i64) -> String {
    format!("/posts/{post_id}/")
}

pub fn media_url(stored_path: &str) -> String {
    format!("{MEDIA_URL}{stored_path}")
}

fn human_date(value: OffsetDateTime) -> String {
    value.format(HUMAN_DATE_FORMAT).unwrap_or_default()
}
