//! Render retrieved context as a prompt section.

use rustedcode_core::context::ContextItem;

const PREVIEW_CHARS: usize = 200;

/// Markdown section listing `items` in the order given, or an empty string
/// when there is nothing to show.
pub fn render_context(items: &[ContextItem]) -> String {
    if items.is_empty() {
        return String::new();
    }

    let mut out = String::from("## Relevant Context\n");
    for item in items {
        let preview = preview(&item.content);
        out.push_str(&format!(
            "- [{} | relevance {:.2}] {}",
            item.tier, item.relevance, preview
        ));
        if let Some(file) = item.metadata.get("file") {
            out.push_str(&format!(" (file: {file})"));
        }
        out.push('\n');
    }
    out
}

/// Content flattened onto one line and cut to a fixed number of characters.
fn preview(content: &str) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > PREVIEW_CHARS {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}…")
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustedcode_core::context::Tier;

    #[test]
    fn empty_renders_nothing() {
        assert_eq!(render_context(&[]), "");
    }

    #[test]
    fn renders_tier_relevance_and_file() {
        let mut item = ContextItem::new(Tier::ShortTerm, "fix the\nretry loop")
            .with_metadata("file", "net/retry.go");
        item.relevance = 0.456;
        let rendered = render_context(&[item]);
        assert!(rendered.starts_with("## Relevant Context\n"));
        assert!(rendered.contains("[short_term | relevance 0.46] fix the retry loop (file: net/retry.go)"));
    }

    #[test]
    fn long_content_is_cut() {
        let item = ContextItem::new(Tier::LongTerm, "word ".repeat(100));
        let rendered = render_context(&[item]);
        assert!(rendered.contains('…'));
    }
}
