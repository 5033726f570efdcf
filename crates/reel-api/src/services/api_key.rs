//! Gemini API key precedence.

/// Pick the key for a request: a non-blank server key wins, then a
/// non-blank client key.
pub fn resolve_api_key(server: Option<&str>, client: Option<&str>) -> Option<String> {
    server
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .or_else(|| client.map(str::trim).filter(|k| !k.is_empty()))
        .map(str::to_string)
}
