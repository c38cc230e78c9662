//! Production configuration validation
//!
//! Security checks for production deployments.

use super::config::AppConfig;
use super::loader::environment_name;
use tracing::warn;

/// Warnings for settings that are unsafe outside development
pub fn production_warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.server.host == "0.0.0.0" {
        warnings.push(
            "Server is binding to all interfaces (0.0.0.0). \
             Consider binding to 127.0.0.1 behind a reverse proxy."
                .to_string(),
        );
    }

    if config.auth.uses_default_credentials() {
        warnings.push(
            "Default credentials are in use. \
             Set SERVERGUARD_AUTH__TOKEN, SERVERGUARD_AUTH__USERNAME and SERVERGUARD_AUTH__PASSWORD."
                .to_string(),
        );
    }

    if !config.auth.websocket_required {
        warnings.push(
            "WebSocket endpoints accept unauthenticated connections. \
             Set [auth] websocket_required = true."
                .to_string(),
        );
    }

    if config.server.cors_origins.iter().any(|o| o == "*") {
        warnings.push("CORS allows any origin.".to_string());
    }

    warnings
}

/// Log security warnings when running with `SERVERGUARD_ENV=production`
pub fn validate_production_config(config: &AppConfig) {
    if !environment_name().eq_ignore_ascii_case("production") {
        return;
    }

    for warning in production_warnings(config) {
        warn!("SECURITY WARNING: {}", warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_raise_credential_and_websocket_warnings() {
        let warnings = production_warnings(&AppConfig::default());
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("Default credentials"));
    }

    #[test]
    fn test_hardened_config_is_quiet() {
        let mut config = AppConfig::default();
        config.auth.token = "a-long-random-token".into();
        config.auth.password = "correct horse battery staple".into();
        config.auth.websocket_required = true;
        assert!(production_warnings(&config).is_empty());

        config.server.host = "0.0.0.0".into();
        assert_eq!(production_warnings(&config).len(), 1);
    }
}
