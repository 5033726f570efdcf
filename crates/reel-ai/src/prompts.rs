//! Prompt templates and response cleanup.

/// Default brand hashtag appended to every caption.
pub const DEFAULT_BRAND_HASHTAG: &str = "#bluffinbob";

/// Prompt for a short on-screen overlay line.
pub fn overlay_prompt(description: &str) -> String {
    format!(
        "Create a viral US Gen-Z style overlay text (max 14 words) for a video about: {}.\n\
         No gambling words.\n\
         Return only the text.",
        description.trim()
    )
}

/// Prompt for the social caption.
pub fn caption_prompt(description: &str, brand_hashtag: &str) -> String {
    format!(
        "Write an Instagram caption for: {}\n\
         Requirements:\n\
         - 1 strong hook\n\
         - Hashtag {}\n\
         - 3 viral hashtags + 4 topic hashtags",
        description.trim(),
        brand_hashtag
    )
}

/// Trim model output and drop a surrounding markdown code fence.
pub fn clean_response(text: &str) -> String {
    let text = text.trim();
    let text = match text.strip_prefix("```") {
        // Skip an optional language tag on the opening fence line
        Some(rest) => rest.split_once('\n').map_or(rest, |(_, body)| body),
        None => text,
    };
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim().to_string()
}
