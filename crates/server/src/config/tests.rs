use std::collections::HashMap;

use super::*;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn empty_file_gives_module_defaults() {
    let config: MailwireConfig = toml::from_str("").unwrap();

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.shutdown_timeout_seconds, 30);

    assert_eq!(config.mailer.driver, "smtp");
    assert_eq!(config.mailer.smtp.host, "localhost");
    assert_eq!(config.mailer.smtp.port, 2525);
    assert!(!config.mailer.smtp.secure);

    assert!(!config.server_api.enabled);
    assert_eq!(config.server_api.route, "/api/mail/send");

    assert!(!config.security.captcha.enabled);
    assert!(config.security.rate_limiter.enabled);
    assert_eq!(config.security.rate_limiter.tokens_per_interval, 2);
    assert_eq!(config.security.rate_limiter.interval_ms, 3_000_000);
    assert!(config.security.cors.allowed_origins.is_empty());

    assert!(!config.telemetry.json);
    assert_eq!(config.telemetry.filter, "info");
}

#[test]
fn full_config() {
    let toml = r#"
        [server]
        port = 3000

        [mailer]
        driver = "ses"
        edge = false

        [mailer.ses.client]
        region = "eu-west-1"
        access_key_id = "AKID"
        secret_access_key = "env:SES_SECRET"

        [mailer.defaults]
        from = "Site <noreply@example.com>"

        [server_api]
        enabled = true
        route = "/contact"

        [security.captcha]
        enabled = true
        provider = "turnstile"
        secret_key = "env:TURNSTILE_SECRET"

        [security.rate_limiter]
        tokens_per_interval = 10
        interval_ms = 60000

        [security.cors]
        allowed_origins = ["https://example.com"]

        [telemetry]
        json = true
    "#;

    let mut config: MailwireConfig = toml::from_str(toml).unwrap();
    config
        .resolve_secrets_with(lookup(&[
            ("SES_SECRET", "ses-secret"),
            ("TURNSTILE_SECRET", "ts-secret"),
        ]))
        .unwrap();

    assert_eq!(config.server.port, 3000);
    assert_eq!(config.mailer.driver, "ses");
    let ses = config.mailer.ses.as_ref().unwrap();
    assert_eq!(ses.client.secret_access_key.as_deref(), Some("ses-secret"));
    assert_eq!(config.server_api.route, "/contact");
    assert_eq!(config.security.captcha.secret_key.as_deref(), Some("ts-secret"));
    assert_eq!(config.security.rate_limiter.tokens_per_interval, 10);
    assert_eq!(config.security.cors.allowed_origins, vec!["https://example.com"]);
    assert!(config.telemetry.json);
}

#[test]
fn smtp_passwords_resolve_from_env() {
    let toml = r#"
        [mailer.smtp]
        host = "smtp.example.com"
        auth = { user = "u", pass = "env:SMTP_PASS" }
        credentials = { username = "u", password = "literal" }
    "#;
    let mut config: MailwireConfig = toml::from_str(toml).unwrap();
    config
        .resolve_secrets_with(lookup(&[("SMTP_PASS", "from-env")]))
        .unwrap();

    assert_eq!(config.mailer.smtp.auth.as_ref().unwrap().pass, "from-env");
    assert_eq!(
        config.mailer.smtp.credentials.as_ref().unwrap().password,
        "literal"
    );
}

#[test]
fn missing_env_secret_is_an_error() {
    let toml = r#"
        [security.captcha]
        secret_key = "env:NOT_SET_ANYWHERE"
    "#;
    let mut config: MailwireConfig = toml::from_str(toml).unwrap();
    let err = config.resolve_secrets_with(lookup(&[])).unwrap_err();
    assert_eq!(err, "environment variable NOT_SET_ANYWHERE is not set");
}

#[test]
fn captcha_debug_redacts_secret() {
    let config = CaptchaConfig {
        enabled: true,
        provider: Some("hcaptcha".into()),
        secret_key: Some("s3cr3t".into()),
        verify_url: None,
    };
    let debug = format!("{config:?}");
    assert!(!debug.contains("s3cr3t"));
    assert!(debug.contains("[REDACTED]"));
}
