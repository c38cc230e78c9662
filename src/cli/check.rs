//! Offline configuration and filter checks

use anyhow::{Context, Result};
use serverguard_core::filter;

use crate::server::{production_warnings, AppConfig};

/// Print the effective configuration as TOML with credentials masked
pub fn print_config(config: &AppConfig) -> Result<()> {
    let text = toml::to_string_pretty(&config.redacted()).context("Failed to serialize config")?;
    println!("{text}");

    for warning in production_warnings(config) {
        eprintln!("warning: {warning}");
    }
    Ok(())
}

/// Human-readable verdict for a command line under both blocklists
pub fn describe_command(command: &str) -> String {
    let terminal = match filter::matched_pattern(command) {
        Some(pattern) => format!("terminal: rejected (matches {pattern})"),
        None => "terminal: allowed".to_string(),
    };
    let http = if filter::is_blocked_for_http(command) {
        "http: rejected"
    } else {
        "http: allowed"
    };
    format!("{terminal}\n{http}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_dangerous_command() {
        let verdict = describe_command("shutdown now");
        assert!(verdict.starts_with("terminal: rejected"));
        assert!(verdict.ends_with("http: rejected"));
    }

    #[test]
    fn test_describe_benign_command() {
        assert_eq!(
            describe_command("ls -la"),
            "terminal: allowed\nhttp: allowed"
        );
    }
}
