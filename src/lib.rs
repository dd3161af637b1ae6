//! Yatube: a small community blog.
//!
//! Users publish posts, optionally filed under a group and carrying an image,
//! comment on each other's posts and follow authors to get a personal feed.
//! Pages are rendered on the server; the index page is served from a
//! short-lived whole-page cache.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
