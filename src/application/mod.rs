//! Application services: feeds, authoring, follows and accounts.

pub mod auth;
pub mod chrome;
pub mod error;
pub mod feed;
pub mod follows;
pub mod groups;
pub mod pagination;
pub mod posts;
pub mod repos;
