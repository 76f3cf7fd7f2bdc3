//! Prompt assembly for base-image generation and view derivation.
//!
//! A stored base prompt ends with clauses this module itself appended
//! (conversation context, output boilerplate) or with view language from an
//! earlier derivation; `sanitize_base_prompt` trims those back off before a
//! new view prompt is built on top.

use crate::db::queries::MessageRecord;
use crate::models::{AspectRatio, ImageFormat, ViewType};

const STYLE_DIRECTIVE: &str = "Professional jewelry product photography: studio lighting, \
    sharp focus on the piece, neutral seamless backdrop, accurate metal and gemstone \
    reflections.";

const BOILERPLATE_MARKER: &str = "create a high-quality";
const CONTEXT_MARKER: &str = "context from conversation";
// Matched as whole words; "bangle" must not read as "angle".
const VIEW_WORDS: [&str; 7] = [
    "view",
    "views",
    "viewpoint",
    "perspective",
    "perspectives",
    "angle",
    "angles",
];

/// Turns a user context summary into at most this many characters per turn.
const CONTEXT_TURN_LIMIT: usize = 200;

fn format_blurb(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "a crisp PNG on a clean background",
        ImageFormat::Jpeg => "a JPEG with softly lit neutral tones",
        ImageFormat::Webp => "a WebP with a neutral studio background",
    }
}

pub fn format_instruction(format: ImageFormat) -> String {
    format!("Render the final image as {}.", format_blurb(format))
}

pub fn aspect_instruction(aspect: AspectRatio) -> String {
    format!("Compose the shot for a {} aspect ratio.", aspect.as_str())
}

/// Long-form camera directive for one view. Each names the angle and what
/// must be visible from it.
pub fn view_modifier(view: ViewType) -> &'static str {
    match view {
        ViewType::Front => {
            "Front view, eye-level perspective: the camera faces the piece head-on in its \
             natural wearing orientation, with the full face of the design centered and \
             prongs, bezels and center stones clearly visible."
        }
        ViewType::Side => {
            "Side view, strict 90-degree profile: the camera sits level with the piece and \
             perpendicular to its face, showing band or setting thickness, how high the \
             stones rise above the mount and the profile curve of the design."
        }
        ViewType::Top => {
            "Top view, looking straight down from directly above the piece, showing the \
             overall silhouette, the layout and symmetry of every stone and the outline \
             of the setting."
        }
        ViewType::Bottom => {
            "Bottom view, looking up from directly beneath the piece, showing the \
             underside of the band or setting, the gallery work beneath the stones and \
             any openwork detail."
        }
    }
}

/// Strips trailing clauses a stored base prompt may carry: output
/// boilerplate, conversation-context annotations and view/perspective
/// language. Case-insensitive, one pass per pattern.
pub fn sanitize_base_prompt(prompt: &str) -> String {
    let mut cleaned = prompt.trim().to_string();
    cleaned = strip_from_marker(&cleaned, BOILERPLATE_MARKER);
    cleaned = strip_from_marker(&cleaned, CONTEXT_MARKER);
    cleaned = strip_trailing_view_clause(&cleaned);
    cleaned.trim().to_string()
}

fn strip_from_marker(prompt: &str, marker: &str) -> String {
    // Markers are ASCII, so an ASCII-lowercased copy keeps byte offsets valid.
    let lowered = prompt.to_ascii_lowercase();
    match lowered.rfind(marker) {
        Some(idx) => prompt[..idx].trim_end().to_string(),
        None => prompt.to_string(),
    }
}

fn strip_trailing_view_clause(prompt: &str) -> String {
    let trimmed = prompt.trim_end();
    let body = trimmed.strip_suffix('.').unwrap_or(trimmed);

    let (head, tail) = match body.rfind('.') {
        Some(pos) => (&trimmed[..pos + 1], &body[pos + 1..]),
        None => ("", body),
    };

    let is_view_clause = tail
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|word| VIEW_WORDS.iter().any(|m| word.eq_ignore_ascii_case(m)));

    // A prompt that is nothing but a view clause stays as-is; stripping it
    // would leave nothing to generate from.
    if is_view_clause && !head.is_empty() {
        head.trim_end().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Prompt for deriving one view from a base image. The base image itself is
/// sent alongside as the visual reference.
pub fn build_view_prompt(
    base_prompt: &str,
    format: ImageFormat,
    aspect: AspectRatio,
    view: ViewType,
) -> String {
    let cleaned = sanitize_base_prompt(base_prompt);
    format!(
        "{} {} {} {} {} Show the {} view of the exact same piece as in the reference image.",
        cleaned,
        format_instruction(format),
        aspect_instruction(aspect),
        STYLE_DIRECTIVE,
        view_modifier(view),
        view.label(),
    )
}

/// Prompt for a conversational base-image generation. This is also the text
/// stored on the resulting image record, so everything beyond the user's own
/// words lives in the trailing clauses `sanitize_base_prompt` knows how to
/// remove.
pub fn build_generation_prompt(
    user_prompt: &str,
    format: ImageFormat,
    aspect: AspectRatio,
    history: &[MessageRecord],
) -> String {
    let core = user_prompt.trim().trim_end_matches('.');
    let mut prompt = format!("{}.", core);

    if let Some(context) = conversation_context(history) {
        prompt.push_str(" Context from conversation: ");
        prompt.push_str(&context);
    }

    prompt.push_str(&format!(
        " Create a high-quality professional rendering of this jewelry design as {}, \
         composed for a {} aspect ratio, with studio lighting and accurate metal and \
         gemstone reflections.",
        format_blurb(format),
        aspect.as_str(),
    ));
    prompt
}

fn conversation_context(history: &[MessageRecord]) -> Option<String> {
    if history.is_empty() {
        return None;
    }
    let turns: Vec<String> = history
        .iter()
        .map(|m| format!("{}: {}", m.role, truncate(&m.content, CONTEXT_TURN_LIMIT)))
        .collect();
    Some(turns.join(" | "))
}

fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    // Back off to a char boundary.
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn message(role: &str, content: &str) -> MessageRecord {
        MessageRecord {
            id: Uuid::new_v4(),
            role: role.into(),
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn strips_view_and_boilerplate_suffixes() {
        let stored = "A platinum solitaire engagement ring. Front view, eye-level \
                      perspective. Create a high-quality rendering.";
        assert_eq!(
            sanitize_base_prompt(stored),
            "A platinum solitaire engagement ring."
        );
    }

    #[test]
    fn strips_conversation_context_annotation() {
        let stored = "A gold signet ring with an onyx inlay. Context from conversation: \
                      user: make the band wider. Create a high-quality rendering.";
        assert_eq!(
            sanitize_base_prompt(stored),
            "A gold signet ring with an onyx inlay."
        );
    }

    #[test]
    fn sanitize_is_case_insensitive() {
        let stored = "A silver pendant. CREATE A HIGH-QUALITY professional rendering.";
        assert_eq!(sanitize_base_prompt(stored), "A silver pendant.");
    }

    #[test]
    fn leaves_plain_prompts_untouched() {
        let stored = "A rose gold tennis bracelet with round brilliants.";
        assert_eq!(sanitize_base_prompt(stored), stored);
    }

    #[test]
    fn view_words_match_whole_words_only() {
        let stored = "A charm bracelet. A gold bangle.";
        assert_eq!(sanitize_base_prompt(stored), stored);

        let stored = "A charm bracelet. Seen from a low angle.";
        assert_eq!(sanitize_base_prompt(stored), "A charm bracelet.");
    }

    #[test]
    fn keeps_prompt_that_is_only_a_view_clause() {
        let stored = "Front view of the ring";
        assert_eq!(sanitize_base_prompt(stored), stored);
    }

    #[test]
    fn view_prompt_names_its_view_twice() {
        let prompt = build_view_prompt(
            "A sapphire halo ring.",
            ImageFormat::Png,
            AspectRatio::Square,
            ViewType::Side,
        );
        assert!(prompt.starts_with("A sapphire halo ring."));
        assert!(prompt.contains("Side view, strict 90-degree profile"));
        assert!(prompt.ends_with("Show the side view of the exact same piece as in the reference image."));
        assert!(prompt.contains("1:1 aspect ratio"));
        assert!(prompt.contains("PNG"));
    }

    #[test]
    fn each_view_gets_a_distinct_modifier() {
        let modifiers: Vec<&str> = ViewType::ALL.iter().map(|v| view_modifier(*v)).collect();
        for (i, a) in modifiers.iter().enumerate() {
            for b in &modifiers[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn generation_prompt_round_trips_through_sanitizer() {
        let history = vec![
            message("user", "I want something art deco"),
            message("model", "Here is an art deco take on your brief."),
        ];
        let stored = build_generation_prompt(
            "An emerald-cut diamond ring",
            ImageFormat::Png,
            AspectRatio::Portrait,
            &history,
        );
        assert!(stored.contains("Context from conversation: user: I want something art deco"));
        assert!(stored.contains("Create a high-quality professional rendering"));
        assert!(stored.contains("3:4 aspect ratio"));

        // Everything appended beyond the user's words strips back off.
        assert_eq!(sanitize_base_prompt(&stored), "An emerald-cut diamond ring.");
    }

    #[test]
    fn generation_prompt_without_history_has_no_context_clause() {
        let stored = build_generation_prompt(
            "A pearl choker",
            ImageFormat::Jpeg,
            AspectRatio::Square,
            &[],
        );
        assert!(!stored.contains("Context from conversation"));
    }

    #[test]
    fn context_turns_are_truncated() {
        let long = "x".repeat(500);
        let history = vec![message("user", &long)];
        let stored = build_generation_prompt(
            "A bangle",
            ImageFormat::Png,
            AspectRatio::Square,
            &history,
        );
        assert!(!stored.contains(&long));
        assert!(stored.contains(&"x".repeat(CONTEXT_TURN_LIMIT)));
    }
}
