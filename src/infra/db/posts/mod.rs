mod read;
mod types;
mod write;

use sqlx::{Postgres, QueryBuilder};

use crate::application::repos::PostFilter;

use super::{AUTHOR_COLUMNS, PostgresRepositories};

impl PostgresRepositories {
    fn push_entry_select(qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push("SELECT p.id, p.text, p.pub_date, p.image, ");
        qb.push(AUTHOR_COLUMNS);
        qb.push(
            ", g.id AS group_id, g.slug AS group_slug, g.title AS group_title \
             FROM posts p \
             JOIN users u ON u.id = p.author_id \
             LEFT JOIN post_groups g ON g.id = p.group_id ",
        );
    }

    fn apply_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: PostFilter) {
        match filter {
            PostFilter::All => {
                qb.push(" WHERE TRUE ");
            }
            PostFilter::Group(group_id) => {
                qb.push(" WHERE p.group_id = ");
                qb.push_bind(group_id);
            }
            PostFilter::Author(author_id) => {
                qb.push(" WHERE p.author_id = ");
                qb.push_bind(author_id);
            }
            PostFilter::FollowedBy(user_id) => {
                qb.push(" WHERE p.author_id IN (SELECT author_id FROM follows WHERE user_id = ");
                qb.push_bind(user_id);
                qb.push(")");
            }
        }
    }
}
