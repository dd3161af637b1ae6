//! Repository tests against a real database. Run with
//! `DATABASE_URL=postgres://... cargo test -- --ignored`.

use std::collections::HashSet;
use std::num::NonZeroU32;

use sqlx::PgPool;
use time::{Duration, OffsetDateTime};

use yatube::application::pagination::{PageNumber, Paginator};
use yatube::application::repos::{
    CommentsRepo, CreateCommentParams, CreateGroupParams, CreatePostParams, CreateSessionParams,
    CreateUserParams, FollowsRepo, GroupsRepo, PostFilter, PostsRepo, PostsWriteRepo, RepoError,
    SessionsRepo, UpdatePostParams, UsersRepo,
};
use yatube::domain::entities::UserRecord;
use yatube::infra::db::PostgresRepositories;

async fn user(repos: &PostgresRepositories, username: &str) -> UserRecord {
    repos
        .create_user(CreateUserParams {
            username: username.to_string(),
            first_name: "First".to_string(),
            last_name: "Last".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        })
        .await
        .expect("user created")
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn posts_filter_and_page_newest_first(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let leo = user(&repos, "leo").await;
    let anna = user(&repos, "anna").await;
    let cats = repos
        .create_group(CreateGroupParams {
            title: "Cats".to_string(),
            slug: "cats".to_string(),
            description: String::new(),
        })
        .await
        .expect("group created");

    for n in 0..12 {
        repos
            .create_post(CreatePostParams {
                author_id: leo.id,
                text: format!("Post {n}"),
                group_id: (n % 2 == 0).then_some(cats.id),
                image: None,
            })
            .await
            .expect("post created");
    }

    assert_eq!(repos.count_posts(PostFilter::All).await.expect("count"), 12);
    assert_eq!(
        repos
            .count_posts(PostFilter::Group(cats.id))
            .await
            .expect("count"),
        6
    );
    assert_eq!(
        repos
            .count_posts(PostFilter::FollowedBy(anna.id))
            .await
            .expect("count"),
        0
    );

    let paginator = Paginator::new(NonZeroU32::new(10).expect("non-zero"));
    let window = paginator.window(12, PageNumber::Number(2));
    let second = repos
        .list_posts(PostFilter::All, window)
        .await
        .expect("second page");
    assert_eq!(second.len(), 2);
    assert_eq!(second[0].text, "Post 1");
    assert_eq!(second[1].text, "Post 0");
    assert_eq!(second[1].group.as_ref().map(|g| g.slug.as_str()), Some("cats"));
    assert_eq!(second[1].author.full_name, "First Last");

    assert!(repos.follow(anna.id, leo.id).await.expect("follow"));
    assert!(!repos.follow(anna.id, leo.id).await.expect("idempotent"));
    assert_eq!(
        repos
            .count_posts(PostFilter::FollowedBy(anna.id))
            .await
            .expect("count"),
        12
    );
    assert_eq!(repos.count_followers(leo.id).await.expect("followers"), 1);
    assert!(repos.unfollow(anna.id, leo.id).await.expect("unfollow"));
    assert!(!repos.is_following(anna.id, leo.id).await.expect("following"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn update_keeps_image_unless_replaced(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let leo = user(&repos, "leo").await;

    let post = repos
        .create_post(CreatePostParams {
            author_id: leo.id,
            text: "With image".to_string(),
            group_id: None,
            image: Some("posts/cat-1234abcd.gif".to_string()),
        })
        .await
        .expect("post created");

    let updated = repos
        .update_post(UpdatePostParams {
            id: post.id,
            text: "Edited".to_string(),
            group_id: None,
            image: None,
        })
        .await
        .expect("post updated");
    assert_eq!(updated.text, "Edited");
    assert_eq!(updated.image.as_deref(), Some("posts/cat-1234abcd.gif"));

    let missing = repos
        .update_post(UpdatePostParams {
            id: post.id + 1000,
            text: "Nope".to_string(),
            group_id: None,
            image: None,
        })
        .await;
    assert!(matches!(missing, Err(RepoError::NotFound)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn comments_list_newest_first(pool: PgPool) {
    let repos = PostgresRepositories::new(pool);
    let leo = user(&repos, "leo").await;
    let post = repos
        .create_post(CreatePostParams {
            author_id: leo.id,
            text: "Discuss".to_string(),
            group_id: None,
            image: None,
        })
        .await
        .expect("post created");

    for text in ["first", "second"] {
        repos
            .create_comment(CreateCommentParams {
                post_id: post.id,
                author_id: leo.id,
                text: text.to_string(),
            })
            .await
            .expect("comment created");
    }

    let comments = repos.list_comments(post.id).await.expect("comments");
    let texts: Vec<&str> = comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, ["second", "first"]);
    assert_eq!(comments[0].author.username, "leo");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_username_and_expired_sessions(pool: PgPool) {
    let repos = PostgresRepositories::new(pool.clone());
    let leo = user(&repos, "leo").await;

    let duplicate = repos
        .create_user(CreateUserParams {
            username: "leo".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: "x".to_string(),
        })
        .await;
    assert!(matches!(duplicate, Err(RepoError::Duplicate { .. })));

    let now = OffsetDateTime::now_utc();
    for (hash, expires_at) in [("a", now + Duration::hours(1)), ("b", now - Duration::hours(1))] {
        repos
            .create_session(CreateSessionParams {
                token_hash: hash.repeat(64),
                user_id: leo.id,
                expires_at,
            })
            .await
            .expect("session created");
    }

    let live = repos
        .find_session_user(&"a".repeat(64), now)
        .await
        .expect("lookup");
    assert_eq!(live.map(|u| u.id), Some(leo.id));
    assert!(
        repos
            .find_session_user(&"b".repeat(64), now)
            .await
            .expect("lookup")
            .is_none()
    );
    assert_eq!(repos.purge_expired_sessions(now).await.expect("purge"), 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn listing_indexes_exist(pool: PgPool) {
    let rows: Vec<String> = sqlx::query_scalar(
        "SELECT indexname FROM pg_indexes WHERE schemaname = 'public' AND tablename = 'posts'",
    )
    .fetch_all(&pool)
    .await
    .expect("fetch post indexes");

    let indexes: HashSet<String> = rows.into_iter().collect();
    for name in [
        "posts_pub_date_idx",
        "posts_author_pub_date_idx",
        "posts_group_pub_date_idx",
    ] {
        assert!(indexes.contains(name), "missing {name}");
    }
}
