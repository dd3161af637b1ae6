use clap::Parser;

use super::*;

#[test]
fn defaults_resolve() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.feed.posts_per_page.get(), 10);
    assert_eq!(settings.feed.post_preview_chars, 15);
    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.index_ttl, Duration::from_secs(20));
    assert_eq!(settings.auth.session_ttl, Duration::from_secs(336 * 3600));
    assert_eq!(settings.auth.cookie_name, "yatube_session");
    assert!(settings.database.url.is_none());
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.feed.posts_per_page = Some(5);

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        feed_posts_per_page: Some(3),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.feed.posts_per_page.get(), 3);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn blank_database_url_is_treated_as_missing() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn zero_values_are_rejected_with_their_key() {
    let mut raw = RawSettings::default();
    raw.feed.posts_per_page = Some(0);
    let err = Settings::from_raw(raw).expect_err("zero page size");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "feed.posts_per_page",
            ..
        }
    ));

    let mut raw = RawSettings::default();
    raw.cache.index_ttl_seconds = Some(0);
    let err = Settings::from_raw(raw).expect_err("zero ttl");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.index_ttl_seconds",
            ..
        }
    ));
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "logging.level",
            ..
        })
    ));
}

#[test]
fn cookie_name_must_be_a_token() {
    let mut raw = RawSettings::default();
    raw.auth.cookie_name = Some("bad name;".to_string());
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "auth.cookie_name",
            ..
        })
    ));
}

#[test]
fn ipv6_hosts_are_bracketed() {
    let mut raw = RawSettings::default();
    raw.server.host = Some("::1".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.server.addr.is_ipv6());
}

#[test]
fn file_and_environment_layers_merge() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("yatube.toml");
    std::fs::write(
        &path,
        "[feed]\nposts_per_page = 7\n\n[cache]\nindex_ttl_seconds = 5\n",
    )
    .expect("write config");

    let raw: RawSettings = Config::builder()
        .add_source(File::from(path.as_path()))
        .add_source(
            Environment::with_prefix("YATUBE_TEST_LAYERS")
                .separator("__")
                .source(Some(
                    [("YATUBE_TEST_LAYERS__CACHE__INDEX_TTL_SECONDS".to_string(), "9".to_string())]
                        .into_iter()
                        .collect(),
                )),
        )
        .build()
        .expect("build")
        .try_deserialize()
        .expect("deserialize");
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.feed.posts_per_page.get(), 7);
    assert_eq!(settings.cache.index_ttl, Duration::from_secs(9));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["yatube"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_group_create_arguments() {
    let args = CliArgs::parse_from([
        "yatube",
        "groups",
        "create",
        "--title",
        "Котики",
        "--database-url",
        "postgres://example",
    ]);

    match args.command.expect("groups command") {
        Command::Groups(groups) => match groups.command {
            GroupsCommand::Create(create) => {
                assert_eq!(create.title, "Котики");
                assert!(create.slug.is_none());
                assert_eq!(create.description, "");
                assert_eq!(
                    create.database.database_url.as_deref(),
                    Some("postgres://example")
                );
            }
        },
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_user_create_arguments() {
    let args = CliArgs::parse_from([
        "yatube",
        "users",
        "create",
        "--username",
        "leo",
        "--password",
        "war-and-peace",
        "--first-name",
        "Leo",
    ]);

    match args.command.expect("users command") {
        Command::Users(users) => match users.command {
            UsersCommand::Create(create) => {
                assert_eq!(create.username, "leo");
                assert_eq!(create.password, "war-and-peace");
                assert_eq!(create.first_name, "Leo");
                assert_eq!(create.last_name, "");
            }
        },
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "yatube",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--cache-enabled",
        "false",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(serve.overrides.cache_enabled, Some(false));
        }
        _ => panic!("wrong command parsed"),
    }
}
