// src/utils/html.rs

/// Sanitizes teacher-authored text before it is stored.
///
/// Whitelist based: harmless markup such as <b> or <p> survives, while
/// <script>, <iframe> and event-handler attributes are stripped. Quiz titles,
/// descriptions, prompts and option texts all pass through here because
/// students' browsers render them.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Like [`clean_html`] for optional fields; blank results collapse to `None`.
pub fn clean_optional(input: Option<&str>) -> Option<String> {
    input
        .map(clean_html)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
