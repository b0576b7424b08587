//! Static endpoint aliases used when reporting the API path.
//!
//! Aliases only change the `X-API-Path` diagnostic header; requests are
//! always forwarded to their inbound URL.

const ENDPOINT_ALIASES: &[(&str, &str)] = &[("/csscolornames/colors", "/css/cores")];

pub fn alias_for(path: &str) -> Option<&'static str> {
    ENDPOINT_ALIASES
        .iter()
        .find(|(from, _)| *from == path)
        .map(|(_, to)| *to)
}

/// Resolve the reported API path: route override over the literal path,
/// then the alias table applied to the result. A whitespace-only override
/// counts as absent.
pub fn resolve_api_path(literal_path: &str, endpoint_override: Option<&str>) -> String {
    let path = endpoint_override
        .filter(|e| !e.trim().is_empty())
        .unwrap_or(literal_path);
    alias_for(path).unwrap_or(path).to_string()
}
