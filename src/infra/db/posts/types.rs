use time::OffsetDateTime;

use crate::domain::entities::{AuthorRef, GroupRef, PostEntry, PostRecord, full_name};

#[derive(Debug, sqlx::FromRow)]
pub(super) struct PostRow {
    pub id: i64,
    pub text: String,
    pub pub_date: OffsetDateTime,
    pub author_id: i64,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            text: row.text,
            pub_date: row.pub_date,
            author_id: row.author_id,
            group_id: row.group_id,
            image: row.image,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct PostEntryRow {
    pub id: i64,
    pub text: String,
    pub pub_date: OffsetDateTime,
    pub image: Option<String>,
    pub author_id: i64,
    pub author_username: String,
    pub author_first_name: String,
    pub author_last_name: String,
    pub group_id: Option<i64>,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
}

impl From<PostEntryRow> for PostEntry {
    fn from(row: PostEntryRow) -> Self {
        let group = match (row.group_id, row.group_slug, row.group_title) {
            (Some(id), Some(slug), Some(title)) => Some(GroupRef { id, slug, title }),
            _ => None,
        };

        Self {
            id: row.id,
            text: row.text,
            pub_date: row.pub_date,
            image: row.image,
            author: AuthorRef {
                id: row.author_id,
                username: row.author_username,
                full_name: full_name(&row.author_first_name, &row.author_last_name),
            },
            group,
        }
    }
}
