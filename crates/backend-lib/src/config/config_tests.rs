use super::*;
use figment::Jail;

#[test]
fn test_settings_validation() {
    let settings = Settings::default();
    assert!(settings.validate().is_ok());

    // Test invalid log level
    let mut invalid_settings = settings.clone();
    invalid_settings.log_level = "invalid".to_string();
    assert!(invalid_settings.validate().is_err());

    // Test invalid session TTL
    let mut invalid_settings = settings.clone();
    invalid_settings.auth.session_ttl_secs = Some(0);
    assert!(invalid_settings.validate().is_err());

    // Test invalid cookie names
    for name in ["", "has space", "semi;colon"] {
        let mut invalid_settings = settings.clone();
        invalid_settings.auth.session_cookie_name = name.to_string();
        assert!(invalid_settings.validate().is_err(), "accepted {name:?}");
    }

    // Test invalid throttle settings
    let mut invalid_settings = settings.clone();
    invalid_settings.login_throttle.max_attempts = 0;
    assert!(invalid_settings.validate().is_err());

    // Test invalid hashing parameters
    let mut invalid_settings = settings.clone();
    invalid_settings.password_hash.scrypt_log_n = 200;
    assert!(invalid_settings.validate().is_err());

    let mut invalid_settings = settings.clone();
    invalid_settings.auth.hash_timeout_ms = 0;
    assert!(invalid_settings.validate().is_err());
}

#[test]
fn test_defaults() {
    let settings = Settings::default();
    assert_eq!(settings.log_level, "info");
    assert_eq!(settings.bind_addr().unwrap().to_string(), "0.0.0.0:5000");
    assert_eq!(settings.auth.session_cookie_name, "_my_session_id");
    assert_eq!(settings.auth.strategy, StrategyKind::Session);
    assert_eq!(settings.auth.session_ttl_secs, None);
    assert!(settings.auth.excluded_paths.contains(&"/api/v1/status/".to_string()));
    assert_eq!(settings.database.backend, DatabaseBackend::Sqlite);
    assert_eq!(settings.auth_options().session_ttl, None);
}

#[test]
fn test_load_settings() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
            log_level = "debug"

            [server]
            port = 8080

            [auth]
            strategy = "basic"
            session_ttl_secs = 3600

            [password_hash]
            algorithm = "argon2"
            "#,
        )?;
        jail.set_env("ACCOUNT_AUTH_LOG_LEVEL", "warn");
        jail.set_env("ACCOUNT_AUTH_DATABASE__BACKEND", "memory");

        let settings = Settings::load(Some(Path::new("config.toml"))).map_err(|e| e.to_string())?;
        assert_eq!(settings.log_level, "warn"); // Environment variable takes precedence
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.auth.strategy, StrategyKind::Basic);
        assert_eq!(settings.auth_options().session_ttl, Some(Duration::from_secs(3600)));
        assert_eq!(settings.password_hash.algorithm, HashAlgorithm::Argon2);
        assert_eq!(settings.database.backend, DatabaseBackend::Memory);
        Ok(())
    });
}

#[test]
fn test_legacy_environment_variables() {
    Jail::expect_with(|jail| {
        jail.set_env("SESSION_NAME", "sid");
        jail.set_env("AUTH_TYPE", "basic_auth");

        let settings = Settings::load(None).map_err(|e| e.to_string())?;
        assert_eq!(settings.auth.session_cookie_name, "sid");
        assert_eq!(settings.auth.strategy, StrategyKind::Basic);
        Ok(())
    });
}

#[test]
fn test_load_rejects_invalid_sources() {
    Jail::expect_with(|jail| {
        assert!(Settings::load(Some(Path::new("missing.toml"))).is_err());

        jail.set_env("AUTH_TYPE", "oauth");
        assert!(Settings::load(None).is_err());
        jail.clear_env();

        jail.create_file("bad.toml", "[login_throttle]\nmax_attempts = 0\n")?;
        assert!(Settings::load(Some(Path::new("bad.toml"))).is_err());
        Ok(())
    });
}
