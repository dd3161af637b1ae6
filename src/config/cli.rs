use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the yatube binary.
#[derive(Debug, Parser)]
#[command(name = "yatube", version, about = "Yatube community blog server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config", env = "YATUBE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP server.
    Serve(Box<ServeArgs>),
    /// Apply pending database migrations.
    Migrate(MigrateArgs),
    /// Manage post groups.
    Groups(GroupsArgs),
    /// Manage user accounts.
    Users(UsersArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override the number of posts per listing page.
    #[arg(long = "feed-posts-per-page", value_name = "COUNT")]
    pub feed_posts_per_page: Option<u32>,

    /// Toggle the index page cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override how long the index page stays cached.
    #[arg(long = "cache-index-ttl-seconds", value_name = "SECONDS")]
    pub cache_index_ttl_seconds: Option<u64>,

    /// Override the media root.
    #[arg(long = "uploads-directory", value_name = "PATH")]
    pub uploads_directory: Option<PathBuf>,

    /// Override the maximum request size for uploads in bytes.
    #[arg(long = "uploads-max-request-bytes", value_name = "BYTES")]
    pub uploads_max_request_bytes: Option<u64>,

    /// Mark the session cookie `Secure`.
    #[arg(
        long = "auth-secure-cookie",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub auth_secure_cookie: Option<bool>,
}

#[derive(Debug, Args, Clone)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,
}

#[derive(Debug, Args, Clone)]
pub struct GroupsArgs {
    #[command(subcommand)]
    pub command: GroupsCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum GroupsCommand {
    /// Create a group. The slug is derived from the title when omitted.
    Create(CreateGroupArgs),
}

#[derive(Debug, Args, Clone)]
pub struct CreateGroupArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    #[arg(long, value_name = "TITLE")]
    pub title: String,

    #[arg(long, value_name = "SLUG")]
    pub slug: Option<String>,

    #[arg(long, value_name = "TEXT", default_value = "")]
    pub description: String,
}

#[derive(Debug, Args, Clone)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum UsersCommand {
    /// Create a user account.
    Create(CreateUserArgs),
}

#[derive(Debug, Args, Clone)]
pub struct CreateUserArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    #[arg(long, value_name = "NAME")]
    pub username: String,

    #[arg(long, env = "YATUBE_USER_PASSWORD", value_name = "PASSWORD")]
    pub password: String,

    #[arg(long = "first-name", value_name = "NAME", default_value = "")]
    pub first_name: String,

    #[arg(long = "last-name", value_name = "NAME", default_value = "")]
    pub last_name: String,
}
