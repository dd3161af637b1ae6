use std::{process, sync::Arc, time::Duration};

use tokio::sync::oneshot;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;
use yatube::{
    application::{
        auth::{AuthService, NewUser},
        error::AppError,
        feed::FeedService,
        follows::FollowService,
        groups::{GroupService, NewGroup},
        pagination::Paginator,
        posts::PostService,
        repos::{
            CommentsRepo, FollowsRepo, GroupsRepo, HealthRepo, PostsRepo, PostsWriteRepo,
            SessionsRepo, UsersRepo,
        },
    },
    cache::{self, CacheConfig, CacheState},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState, SessionCookie},
        telemetry,
        uploads::UploadStorage,
    },
};

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
        config::Command::Groups(args) => match args.command {
            config::GroupsCommand::Create(args) => run_create_group(settings, args).await,
        },
        config::Command::Users(args) => match args.command {
            config::UsersCommand::Create(args) => run_create_user(settings, args).await,
        },
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings, true).await?;
    let state = build_http_state(repositories, &settings)?;

    let sweeper = state
        .cache
        .as_ref()
        .map(|cache| cache::spawn_sweeper(cache.store.clone(), &cache.config));
    let purger = spawn_session_purger(state.auth.clone());

    let result = serve_http(&settings, state).await;

    purger.abort();
    let _ = purger.await;
    if let Some(handle) = sweeper {
        handle.abort();
        let _ = handle.await;
    }

    result
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    init_repositories(&settings, true).await?;
    info!(target = "yatube::migrate", "database migrations applied");
    Ok(())
}

async fn run_create_group(
    settings: config::Settings,
    args: config::CreateGroupArgs,
) -> Result<(), AppError> {
    let repositories = init_repositories(&settings, false).await?;
    let groups: Arc<dyn GroupsRepo> = repositories;
    let group = GroupService::new(groups)
        .create(NewGroup {
            title: args.title,
            slug: args.slug,
            description: args.description,
        })
        .await?;

    println!("{}\t{}\t{}", group.id, group.slug, group.title);
    Ok(())
}

async fn run_create_user(
    settings: config::Settings,
    args: config::CreateUserArgs,
) -> Result<(), AppError> {
    let repositories = init_repositories(&settings, false).await?;
    let users: Arc<dyn UsersRepo> = repositories.clone();
    let sessions: Arc<dyn SessionsRepo> = repositories;
    let user = AuthService::new(users, sessions, settings.auth.session_ttl)
        .create_user(NewUser {
            username: args.username,
            first_name: args.first_name,
            last_name: args.last_name,
            password: args.password,
        })
        .await?;

    println!("{}\t{}", user.id, user.username);
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
    migrate: bool,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    if migrate {
        PostgresRepositories::run_migrations(&pool).await?;
    }

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_http_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<HttpState, AppError> {
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let groups_repo: Arc<dyn GroupsRepo> = repositories.clone();
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let sessions_repo: Arc<dyn SessionsRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();
    let follows_repo: Arc<dyn FollowsRepo> = repositories.clone();
    let health_repo: Arc<dyn HealthRepo> = repositories;

    let upload_storage = Arc::new(
        UploadStorage::new(settings.uploads.directory.clone())
            .map_err(|err| AppError::from(InfraError::from(err)))?,
    );

    let feed = FeedService::new(
        posts_repo.clone(),
        groups_repo.clone(),
        users_repo.clone(),
        follows_repo.clone(),
        comments_repo.clone(),
        Paginator::new(settings.feed.posts_per_page),
        settings.feed.post_preview_chars,
    );
    let posts = PostService::new(
        posts_repo,
        posts_write_repo,
        groups_repo,
        comments_repo,
        upload_storage.clone(),
    );
    let follows = FollowService::new(users_repo.clone(), follows_repo);
    let auth = AuthService::new(users_repo, sessions_repo, settings.auth.session_ttl);

    let cache = settings
        .cache
        .enabled
        .then(|| CacheState::new(CacheConfig::from(&settings.cache)));

    let max_request_bytes = usize::try_from(settings.uploads.max_request_bytes.get())
        .map_err(|_| AppError::unexpected("uploads.max_request_bytes exceeds usize"))?;

    Ok(HttpState {
        feed: Arc::new(feed),
        posts: Arc::new(posts),
        follows: Arc::new(follows),
        auth: Arc::new(auth),
        health: health_repo,
        upload_storage,
        session_cookie: SessionCookie {
            name: settings.auth.cookie_name.clone(),
            secure: settings.auth.secure_cookie,
        },
        max_request_bytes,
        cache,
    })
}

fn spawn_session_purger(auth: Arc<AuthService>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            match auth.purge_expired_sessions().await {
                Ok(0) => {}
                Ok(removed) => info!(
                    target = "yatube::sessions",
                    removed, "expired sessions purged"
                ),
                Err(err) => warn!(
                    target = "yatube::sessions",
                    error = %err,
                    "failed to purge expired sessions"
                ),
            }
        }
    })
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "yatube::server",
        addr = %settings.server.addr,
        "listening"
    );

    let (stopping_tx, stopping_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            shutdown_signal().await;
            let _ = stopping_tx.send(());
        },
    );
    let mut server = tokio::spawn(async move { server.await });

    let grace = settings.server.graceful_shutdown;
    tokio::select! {
        joined = &mut server => {
            joined
                .map_err(|err| AppError::unexpected(format!("server task failed: {err}")))?
                .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = async {
            if stopping_rx.await.is_ok() {
                tokio::time::sleep(grace).await;
            } else {
                std::future::pending::<()>().await;
            }
        } => {
            warn!(
                target = "yatube::server",
                grace_seconds = grace.as_secs(),
                "graceful shutdown timed out; aborting open connections"
            );
            server.abort();
        }
    }

    info!(target = "yatube::server", "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(target = "yatube::server", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(target = "yatube::server", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(target = "yatube::server", "shutdown signal received");
}
