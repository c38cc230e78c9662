//! Dangerous-command filtering
//!
//! Two independent blocklists:
//! - [`DANGEROUS_PATTERNS`] guards interactive terminal sessions. Patterns are
//!   regular expressions matched case-insensitively anywhere in the command.
//! - [`HTTP_BLOCKED_SUBSTRINGS`] guards the one-shot HTTP command endpoint.
//!   It is coarser: plain substrings of the lowercased command.
//!
//! Both are pure and evaluated on every command; neither is a sandbox.

use regex::{RegexSet, RegexSetBuilder};
use std::sync::LazyLock;

/// Patterns rejected by terminal sessions
pub const DANGEROUS_PATTERNS: &[&str] = &[
    // destructive filesystem operations
    r"rm\s+-rf",
    r"del\s+/s\s+/q",
    r"format\s+[c-z]:",
    r"mkfs\..*",
    // power state
    r"shutdown",
    r"reboot",
    r"halt",
    r"poweroff",
    // disk tools
    r"fdisk",
    r"parted",
    r"dd\s+if=/dev/zero",
    r"dd\s+if=/dev/urandom",
    // firewall and network configuration
    r"iptables\s+-F",
    r"ipconfig\s+/release",
    r"ipconfig\s+/renew",
    // user accounts
    r"net\s+user\s+add",
    r"net\s+user\s+delete",
    r"useradd",
    r"userdel",
    // services
    r"sc\s+delete",
    r"systemctl\s+disable",
    r"chkconfig\s+--del",
    // windows registry
    r"reg\s+delete",
    r"reg\s+add",
    r"reg\s+export",
    // process killing
    r"taskkill\s+/f",
    r"killall",
    r"pkill\s+-9",
    // package removal
    r"yum\s+remove",
    r"apt\s+remove",
    r"apt\s+purge",
    r"choco\s+uninstall",
    // reconnaissance
    r"nmap",
    r"netstat\s+-an",
    r"arp\s+-a",
    r"wmic\s+process",
    r"wmic\s+service",
    r"wmic\s+startup",
];

/// Substrings rejected by the HTTP command endpoint
pub const HTTP_BLOCKED_SUBSTRINGS: &[&str] = &[
    "rm -rf",
    "shutdown",
    "reboot",
    "halt",
    "poweroff",
    "format",
    "mkfs",
    "dd if=/dev/zero",
];

static DANGEROUS_SET: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSetBuilder::new(DANGEROUS_PATTERNS)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("invalid dangerous-command pattern: {e}"))
});

/// Returns `true` if the command matches any terminal blocklist pattern.
#[must_use]
pub fn is_dangerous(command: &str) -> bool {
    DANGEROUS_SET.is_match(command)
}

/// Returns the first terminal blocklist pattern the command matches.
#[must_use]
pub fn matched_pattern(command: &str) -> Option<&'static str> {
    DANGEROUS_SET
        .matches(command)
        .iter()
        .next()
        .map(|idx| DANGEROUS_PATTERNS[idx])
}

/// Returns `true` if the HTTP endpoint must refuse the command.
#[must_use]
pub fn is_blocked_for_http(command: &str) -> bool {
    let lowered = command.to_lowercase();
    HTTP_BLOCKED_SUBSTRINGS
        .iter()
        .any(|needle| lowered.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_compile() {
        assert_eq!(DANGEROUS_SET.len(), DANGEROUS_PATTERNS.len());
    }

    #[test]
    fn test_destructive_commands_rejected() {
        assert!(is_dangerous("rm -rf /"));
        assert!(is_dangerous("shutdown now"));
        assert!(is_dangerous("mkfs.ext4 /dev/sda1"));
        assert!(is_dangerous("dd if=/dev/zero of=/dev/sda"));
        assert!(is_dangerous("sudo   rm   -rf   ~"));
        assert!(is_dangerous("format d:"));
        assert!(is_dangerous("del /s /q C:\\temp"));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert!(is_dangerous("RM -RF /tmp/x"));
        assert!(is_dangerous("iptables -F"));
        assert!(is_dangerous("IPTABLES -f INPUT"));
        assert!(is_dangerous("Net User Add bob"));
    }

    #[test]
    fn test_reconnaissance_rejected() {
        assert!(is_dangerous("nmap -sS 10.0.0.0/24"));
        assert!(is_dangerous("netstat -an"));
        assert!(is_dangerous("arp -a"));
        assert!(is_dangerous("wmic process list"));
    }

    #[test]
    fn test_benign_commands_allowed() {
        assert!(!is_dangerous("echo hello"));
        assert!(!is_dangerous("ls -la"));
        assert!(!is_dangerous("rm file.txt"));
        assert!(!is_dangerous("netstat -tulpn"));
        assert!(!is_dangerous("apt list --installed"));
        assert!(!is_dangerous("git status"));
    }

    #[test]
    fn test_matched_pattern_reports_first_hit() {
        assert_eq!(matched_pattern("sudo reboot"), Some("reboot"));
        assert_eq!(matched_pattern("killall nginx"), Some("killall"));
        assert_eq!(matched_pattern("uptime"), None);
    }

    #[test]
    fn test_http_filter_is_coarse_substring_match() {
        assert!(is_blocked_for_http("rm -rf /var"));
        assert!(is_blocked_for_http("SHUTDOWN -h now"));
        assert!(is_blocked_for_http("echo formatted"));
        assert!(!is_blocked_for_http("rm  -rf /var"));
        assert!(!is_blocked_for_http("uname -a"));
    }

    #[test]
    fn test_filters_are_independent() {
        // killall only appears in the terminal list
        assert!(is_dangerous("killall node"));
        assert!(!is_blocked_for_http("killall node"));
        // bare "format" only appears in the HTTP list
        assert!(!is_dangerous("clang-format main.c"));
        assert!(is_blocked_for_http("clang-format main.c"));
    }
}
