//! Domain entities mirrored from persistent storage.

use std::fmt;

use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::posts::{POST_PREVIEW_CHARS, preview};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: OffsetDateTime,
}

impl UserRecord {
    pub fn author_ref(&self) -> AuthorRef {
        AuthorRef {
            id: self.id,
            username: self.username.clone(),
            full_name: full_name(&self.first_name, &self.last_name),
        }
    }
}

impl fmt::Display for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.author_ref().display_name())
    }
}

/// Stored credentials for a user, kept apart from [`UserRecord`] so the hash
/// never reaches templates.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: UserRecord,
    pub password_hash: String,
}

pub const GROUP_TITLE_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRecord {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl fmt::Display for GroupRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostRecord {
    pub id: i64,
    pub text: String,
    pub pub_date: OffsetDateTime,
    pub author_id: i64,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

impl fmt::Display for PostRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(preview(&self.text, POST_PREVIEW_CHARS))
    }
}

/// Author columns carried alongside posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorRef {
    pub id: i64,
    pub username: String,
    pub full_name: String,
}

impl AuthorRef {
    pub fn display_name(&self) -> String {
        if self.full_name.is_empty() {
            self.username.clone()
        } else {
            self.full_name.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRef {
    pub id: i64,
    pub slug: String,
    pub title: String,
}

/// A post joined with its author and group, as listed in feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostEntry {
    pub id: i64,
    pub text: String,
    pub pub_date: OffsetDateTime,
    pub image: Option<String>,
    pub author: AuthorRef,
    pub group: Option<GroupRef>,
}

impl PostEntry {
    pub fn preview(&self, limit: usize) -> &str {
        preview(&self.text, limit)
    }
}

impl fmt::Display for PostEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.preview(POST_PREVIEW_CHARS))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRecord {
    pub id: i64,
    pub post_id: i64,
    pub author: AuthorRef,
    pub text: String,
    pub created: OffsetDateTime,
}

pub fn full_name(first_name: &str, last_name: &str) -> String {
    let first = first_name.trim();
    let last = last_name.trim();
    match (first.is_empty(), last.is_empty()) {
        (true, true) => String::new(),
        (false, true) => first.to_string(),
        (true, false) => last.to_string(),
        (false, false) => format!("{first} {last}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn user(first: &str, last: &str) -> UserRecord {
        UserRecord {
            id: 1,
            username: "leo".to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            created_at: datetime!(2024-01-01 0:00 UTC),
        }
    }

    #[test]
    fn user_displays_full_name_when_present() {
        assert_eq!(user("Leo", "Tolstoy").to_string(), "Leo Tolstoy");
        assert_eq!(user("", "Tolstoy").to_string(), "Tolstoy");
        assert_eq!(user("", "").to_string(), "leo");
    }

    #[test]
    fn group_displays_title() {
        let group = GroupRecord {
            id: 1,
            title: "Cats".to_string(),
            slug: "cats".to_string(),
            description: "All about cats".to_string(),
        };
        assert_eq!(group.to_string(), "Cats");
    }

    #[test]
    fn post_displays_first_fifteen_characters() {
        let post = PostRecord {
            id: 1,
            text: "Очень длинный пост для проверки".to_string(),
            pub_date: datetime!(2024-01-01 0:00 UTC),
            author_id: 1,
            group_id: None,
            image: None,
        };
        assert_eq!(post.to_string(), "Очень длинный п");
    }
}
