//! Secret handling for logs: credential access is logged by kind and length, never by value.

/// Placeholder used wherever a secret would otherwise be printed.
pub const REDACTED: &str = "[REDACTED]";

/// Log that a credential was obtained. Never logs the value.
pub fn log_credential_access(kind: &str, value: &str) {
    tracing::debug!(kind = %kind, len = value.len(), "credential obtained");
}

/// `[REDACTED]` for non-empty secrets, empty string otherwise (so a missing value is still visible in Debug output).
#[must_use]
pub fn redact_secret(value: &str) -> &'static str {
    if value.is_empty() { "" } else { REDACTED }
}
