use std::env;
use std::str::FromStr;

/// Read access to environment variables.
///
/// Only [`var`](ReadEnv::var) is required; the helpers cover the two shapes
/// the gateway configuration needs: optional strings where blank means unset,
/// and numbers that fall back to a default when missing or malformed.
pub trait ReadEnv {
    fn var(&self, key: &str) -> Result<String, env::VarError>;

    /// Trimmed value of `key`, or `None` when it is unset or blank.
    fn non_blank(&self, key: &str) -> Option<String> {
        self.var(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Parse `key`, returning `default` when it is unset or does not parse.
    fn parse_or<T: FromStr>(&self, key: &str, default: T) -> T {
        self.var(key)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }
}
