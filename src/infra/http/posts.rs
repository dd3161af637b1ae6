//! Feed pages, post authoring and follow handlers.

use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};

use crate::application::{
    chrome::build_chrome,
    error::HttpError,
    pagination::PageNumber,
    posts::PostServiceError,
};
use crate::domain::entities::{GroupRecord, UserRecord};
use crate::domain::posts::parse_group_choice;
use crate::presentation::views::{
    CommentFormView, FeedView, FollowTemplate, GroupListTemplate, IndexTemplate, LayoutContext,
    PostDetailTemplate, PostDetailView, PostFormTemplate, PostFormView, ProfileTemplate,
    group_href, post_href, profile_href, render_not_found_response, render_template_response,
};

use super::forms::{CommentForm, PageQuery, PostForm};
use super::{CurrentUser, HttpState, MaybeUser, found};

pub(super) async fn index(
    State(state): State<HttpState>,
    MaybeUser(viewer): MaybeUser,
    Query(query): Query<PageQuery>,
) -> Result<Response, HttpError> {
    let context = state
        .feed
        .index(PageNumber::parse(query.page.as_deref()))
        .await?;

    let chrome = build_chrome(viewer.as_ref(), "/").with_title("Latest posts");
    let view = LayoutContext::new(
        chrome,
        FeedView {
            context,
            base_path: "/".to_string(),
        },
    );
    Ok(render_template_response(IndexTemplate { view }, StatusCode::OK))
}

pub(super) async fn group_list(
    State(state): State<HttpState>,
    MaybeUser(viewer): MaybeUser,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, HttpError> {
    let base_path = group_href(&slug);
    let chrome = build_chrome(viewer.as_ref(), &base_path);

    let Some(context) = state
        .feed
        .group_list(&slug, PageNumber::parse(query.page.as_deref()))
        .await?
    else {
        return Ok(render_not_found_response(chrome));
    };

    let chrome = chrome.with_title(&format!("Posts of the group {}", context.group));
    let view = LayoutContext::new(chrome, FeedView { context, base_path });
    Ok(render_template_response(
        GroupListTemplate { view },
        StatusCode::OK,
    ))
}

pub(super) async fn profile(
    State(state): State<HttpState>,
    MaybeUser(viewer): MaybeUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, HttpError> {
    let base_path = profile_href(&username);
    let chrome = build_chrome(viewer.as_ref(), &base_path);

    let Some(context) = state
        .feed
        .profile(
            &username,
            PageNumber::parse(query.page.as_deref()),
            viewer.as_ref(),
        )
        .await?
    else {
        return Ok(render_not_found_response(chrome));
    };

    let chrome = chrome.with_title(&format!("Profile of {}", context.author.display_name));
    let view = LayoutContext::new(chrome, FeedView { context, base_path });
    Ok(render_template_response(ProfileTemplate { view }, StatusCode::OK))
}

pub(super) async fn post_detail(
    State(state): State<HttpState>,
    MaybeUser(viewer): MaybeUser,
    Path(raw_id): Path<String>,
) -> Result<Response, HttpError> {
    let chrome = build_chrome(viewer.as_ref(), &format!("/posts/{raw_id}/"));
    let Some(post_id) = parse_post_id(&raw_id) else {
        return Ok(render_not_found_response(chrome));
    };

    let Some(detail) = state.feed.post_detail(post_id, viewer.as_ref()).await? else {
        return Ok(render_not_found_response(chrome));
    };

    let chrome = chrome.with_title(&format!("Post {}", detail.title));
    let view = LayoutContext::new(
        chrome,
        PostDetailView {
            detail,
            comment_form: CommentFormView::for_post(post_id),
        },
    );
    Ok(render_template_response(
        PostDetailTemplate { view },
        StatusCode::OK,
    ))
}

pub(super) async fn follow_index(
    State(state): State<HttpState>,
    CurrentUser(viewer): CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Response, HttpError> {
    let context = state
        .feed
        .follow_index(&viewer, PageNumber::parse(query.page.as_deref()))
        .await?;

    let chrome = build_chrome(Some(&viewer), "/follow/").with_title("Subscriptions");
    let view = LayoutContext::new(
        chrome,
        FeedView {
            context,
            base_path: "/follow/".to_string(),
        },
    );
    Ok(render_template_response(FollowTemplate { view }, StatusCode::OK))
}

pub(super) async fn create_form(
    State(state): State<HttpState>,
    CurrentUser(author): CurrentUser,
) -> Result<Response, HttpError> {
    let groups = state.posts.group_choices().await?;
    let form = PostFormView::new("/create/".to_string(), false, String::new(), None, &groups);
    Ok(render_post_form(&author, "/create/", form))
}

pub(super) async fn create_submit(
    State(state): State<HttpState>,
    CurrentUser(author): CurrentUser,
    PostForm(input): PostForm,
) -> Result<Response, HttpError> {
    let (text, group) = (input.text.clone(), input.group.clone());

    match state.posts.create(&author, input).await {
        Ok(_) => Ok(found(&profile_href(&author.username))),
        Err(PostServiceError::InvalidForm(errors)) => {
            let groups = state.posts.group_choices().await?;
            let form = refill_form("/create/".to_string(), false, text, &group, &groups)
                .with_errors(errors);
            Ok(render_post_form(&author, "/create/", form))
        }
        Err(err) => Err(err.into()),
    }
}

pub(super) async fn edit_form(
    State(state): State<HttpState>,
    CurrentUser(editor): CurrentUser,
    Path(raw_id): Path<String>,
) -> Result<Response, HttpError> {
    let Some(post_id) = parse_post_id(&raw_id) else {
        return Ok(not_found(&editor, &format!("/posts/{raw_id}/edit/")));
    };

    let post = match state.posts.load_for_edit(post_id, &editor).await {
        Ok(post) => post,
        Err(PostServiceError::NotAuthor { .. }) => return Ok(found(&post_href(post_id))),
        Err(err) => return Err(err.into()),
    };

    let groups = state.posts.group_choices().await?;
    let action = edit_href(post_id);
    let form = PostFormView::new(
        action.clone(),
        true,
        post.text.clone(),
        post.group.as_ref().map(|group| group.id),
        &groups,
    )
    .with_current_image(post.image.as_deref());
    Ok(render_post_form(&editor, &action, form))
}

pub(super) async fn edit_submit(
    State(state): State<HttpState>,
    CurrentUser(editor): CurrentUser,
    Path(raw_id): Path<String>,
    PostForm(input): PostForm,
) -> Result<Response, HttpError> {
    let Some(post_id) = parse_post_id(&raw_id) else {
        return Ok(not_found(&editor, &format!("/posts/{raw_id}/edit/")));
    };
    let (text, group) = (input.text.clone(), input.group.clone());

    match state.posts.edit(post_id, &editor, input).await {
        Ok(_) => Ok(found(&post_href(post_id))),
        Err(PostServiceError::NotAuthor { .. }) => Ok(found(&post_href(post_id))),
        Err(PostServiceError::InvalidForm(errors)) => {
            let current = state.posts.load_for_edit(post_id, &editor).await?;
            let groups = state.posts.group_choices().await?;
            let action = edit_href(post_id);
            let form = refill_form(action.clone(), true, text, &group, &groups)
                .with_errors(errors)
                .with_current_image(current.image.as_deref());
            Ok(render_post_form(&editor, &action, form))
        }
        Err(err) => Err(err.into()),
    }
}

pub(super) async fn comment_redirect(
    CurrentUser(_viewer): CurrentUser,
    Path(raw_id): Path<String>,
) -> Response {
    found(&format!("/posts/{raw_id}/"))
}

pub(super) async fn add_comment(
    State(state): State<HttpState>,
    CurrentUser(author): CurrentUser,
    Path(raw_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Response, HttpError> {
    let Some(post_id) = parse_post_id(&raw_id) else {
        return Ok(not_found(&author, &format!("/posts/{raw_id}/comment/")));
    };

    match state.posts.add_comment(post_id, &author, &form.text).await {
        Ok(_) | Err(PostServiceError::InvalidComment(_)) => Ok(found(&post_href(post_id))),
        Err(err) => Err(err.into()),
    }
}

pub(super) async fn profile_follow(
    State(state): State<HttpState>,
    CurrentUser(viewer): CurrentUser,
    Path(username): Path<String>,
) -> Result<Response, HttpError> {
    state.follows.follow(&viewer, &username).await?;
    Ok(found(&profile_href(&username)))
}

pub(super) async fn profile_unfollow(
    State(state): State<HttpState>,
    CurrentUser(viewer): CurrentUser,
    Path(username): Path<String>,
) -> Result<Response, HttpError> {
    state.follows.unfollow(&viewer, &username).await?;
    Ok(found(&profile_href(&username)))
}

fn render_post_form(user: &UserRecord, path: &str, form: PostFormView) -> Response {
    let title = if form.is_edit { "Edit post" } else { "New post" };
    let chrome = build_chrome(Some(user), path).with_title(title);
    render_template_response(
        PostFormTemplate {
            view: LayoutContext::new(chrome, form),
        },
        StatusCode::OK,
    )
}

/// Rebuild the form from submitted values after validation failed.
fn refill_form(
    action: String,
    is_edit: bool,
    text: String,
    group: &str,
    groups: &[GroupRecord],
) -> PostFormView {
    let selected = parse_group_choice(group).ok().flatten();
    PostFormView::new(action, is_edit, text, selected, groups)
}

fn not_found(user: &UserRecord, path: &str) -> Response {
    render_not_found_response(build_chrome(Some(user), path))
}

fn edit_href(post_id: i64) -> String {
    format!("/posts/{post_id}/edit/")
}

fn parse_post_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|id| *id > 0)
}
