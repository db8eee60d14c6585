//! Importance and relevance scoring.
//!
//! Everything here is a pure function of an item's content, metadata and
//! counters. Importance is computed once when an item is stored; relevance
//! is recomputed against every query.
//!
//! ```text
//! importance = clamp(base + keywords + file_type_bonus)
//! base       = 0.4 * complexity + 0.6 * semantic_density
//!
//! relevance  = clamp(overlap * (0.5 + 0.5 * importance)
//!                            * (0.8 + 0.2 * min(1, accesses / 10))
//!                            * exp(-hours_since_creation / 24))
//! ```

use chrono::{DateTime, Utc};
use rustedcode_core::context::{ContextItem, Metadata};

// ── Complexity ────────────────────────────────────────────────────────────

const LINE_SATURATION: f64 = 100.0;
const WORD_SATURATION: f64 = 500.0;
const CHAR_SATURATION: f64 = 2000.0;

/// Size-based complexity in [0, 1]: lines, words and characters, each
/// saturating independently, weighted 0.3 / 0.4 / 0.3.
pub fn content_complexity(content: &str) -> f64 {
    if content.is_empty() {
        return 0.0;
    }
    let lines = content.lines().count() as f64;
    let words = content.split_whitespace().count() as f64;
    let chars = content.chars().count() as f64;

    0.3 * (lines / LINE_SATURATION).min(1.0)
        + 0.4 * (words / WORD_SATURATION).min(1.0)
        + 0.3 * (chars / CHAR_SATURATION).min(1.0)
}

/// Vocabulary that marks content as technical.
const TECHNICAL_TERMS: &[&str] = &[
    "function", "func", "fn", "def", "class", "struct", "interface", "trait", "impl", "enum",
    "method", "variable", "return", "import", "module", "package", "type", "async", "await",
    "error", "exception", "api", "database", "query", "config", "test", "thread", "lock",
    "cache", "memory", "server", "client", "request", "response", "http", "json", "compile",
    "build", "deploy", "debug", "parser", "buffer", "pointer", "const", "static",
];

/// Share of technical tokens plus a scaled share of bracket characters.
pub fn semantic_density(content: &str) -> f64 {
    let words = tokenize(content);
    if words.is_empty() {
        return 0.0;
    }
    let hits = words
        .iter()
        .filter(|w| TECHNICAL_TERMS.contains(&w.as_str()))
        .count();
    let term_ratio = hits as f64 / words.len() as f64;

    let chars = content.chars().count().max(1);
    let brackets = content
        .chars()
        .filter(|c| matches!(c, '(' | ')' | '[' | ']' | '{' | '}'))
        .count();
    let structure_ratio = (brackets as f64 / chars as f64 * 10.0).min(1.0);

    0.7 * term_ratio + 0.3 * structure_ratio
}

// ── Keywords ──────────────────────────────────────────────────────────────

/// (keyword, weight per occurrence). Occurrences count at most twice.
const HIGH_PRIORITY: &[(&str, f64)] = &[
    ("error", 0.15),
    ("security", 0.15),
    ("vulnerability", 0.15),
    ("critical", 0.15),
    ("exception", 0.15),
    ("panic", 0.15),
];

const MID_PRIORITY: &[(&str, f64)] = &[
    ("performance", 0.12),
    ("optimization", 0.12),
    ("important", 0.12),
    ("fix", 0.10),
    ("todo", 0.10),
];

const LOW_PRIORITY: &[(&str, f64)] = &[
    ("function", 0.05),
    ("class", 0.05),
    ("interface", 0.05),
];

const MAX_KEYWORD_OCCURRENCES: usize = 2;

/// Keyword contribution across all three priority tiers.
pub fn keyword_score(content: &str) -> f64 {
    let lower = content.to_lowercase();
    HIGH_PRIORITY
        .iter()
        .chain(MID_PRIORITY)
        .chain(LOW_PRIORITY)
        .map(|(kw, weight)| {
            let hits = lower.matches(kw).count().min(MAX_KEYWORD_OCCURRENCES);
            weight * hits as f64
        })
        .sum()
}

// ── File types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Source,
    Documentation,
    Config,
}

/// Classify a file-type tag (`go`, `md`, `json`, ...).
pub fn file_kind(file_type: &str) -> Option<FileKind> {
    match file_type {
        "go" | "rs" | "py" | "js" | "jsx" | "ts" | "tsx" | "java" | "kt" | "cs" | "c" | "cpp"
        | "cc" | "h" | "hpp" | "rb" | "swift" | "php" | "scala" => Some(FileKind::Source),
        "md" | "markdown" | "txt" | "rst" | "adoc" => Some(FileKind::Documentation),
        "json" | "yaml" | "yml" | "toml" | "xml" | "ini" | "env" => Some(FileKind::Config),
        _ => None,
    }
}

/// The item's file type: `file_type` metadata, else the extension of `file`.
pub fn detect_file_type(metadata: &Metadata) -> Option<String> {
    if let Some(ft) = metadata.get("file_type") {
        let ft = ft.trim().trim_start_matches('.').to_lowercase();
        if !ft.is_empty() {
            return Some(ft);
        }
    }
    metadata
        .get("file")
        .and_then(|f| std::path::Path::new(f).extension())
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Declaration tokens counted toward source-file complexity, per language.
fn declaration_tokens(file_type: &str) -> &'static [&'static str] {
    match file_type {
        "go" => &["func ", "type ", "interface {", "struct {"],
        "rs" => &["fn ", "struct ", "enum ", "trait ", "impl "],
        "py" => &["def ", "class ", "lambda "],
        "js" | "jsx" | "ts" | "tsx" => &["function ", "class ", "interface ", "=> "],
        "java" | "kt" | "cs" | "scala" => &["class ", "interface ", "fun ", "void "],
        "c" | "cpp" | "cc" | "h" | "hpp" => &["struct ", "class ", "typedef ", "template"],
        "rb" => &["def ", "class ", "module "],
        _ => &["function", "class"],
    }
}

const DECLARATION_SATURATION: f64 = 10.0;
const HEADING_SATURATION: f64 = 10.0;
const NESTING_SATURATION: f64 = 50.0;

/// Type-specific complexity in [0, 1].
pub fn file_complexity(kind: FileKind, file_type: &str, content: &str) -> f64 {
    let base = content_complexity(content);
    match kind {
        FileKind::Source => {
            let decls: usize = declaration_tokens(file_type)
                .iter()
                .map(|t| content.matches(t).count())
                .sum();
            0.5 * base + 0.5 * (decls as f64 / DECLARATION_SATURATION).min(1.0)
        }
        FileKind::Documentation => {
            let headings = content
                .lines()
                .filter(|l| l.trim_start().starts_with('#'))
                .count();
            0.7 * base + 0.3 * (headings as f64 / HEADING_SATURATION).min(1.0)
        }
        FileKind::Config => {
            let nesting = content.chars().filter(|c| matches!(c, '{' | '[')).count();
            0.5 * base + 0.5 * (nesting as f64 / NESTING_SATURATION).min(1.0)
        }
    }
}

/// Bonus for recognized file types; zero when the type is unknown or absent.
pub fn file_type_bonus(metadata: &Metadata, content: &str) -> f64 {
    let Some(file_type) = detect_file_type(metadata) else {
        return 0.0;
    };
    let Some(kind) = file_kind(&file_type) else {
        return 0.0;
    };
    let fc = file_complexity(kind, &file_type, content);
    match kind {
        FileKind::Source => 0.1 + 0.2 * fc,
        FileKind::Documentation => 0.05 + 0.1 * fc,
        FileKind::Config => 0.08 + 0.12 * fc,
    }
}

// ── Importance ────────────────────────────────────────────────────────────

/// Intrinsic value of an item in [0, 1].
pub fn importance(item: &ContextItem) -> f64 {
    let base = 0.4 * content_complexity(&item.content) + 0.6 * semantic_density(&item.content);
    let score = base + keyword_score(&item.content) + file_type_bonus(&item.metadata, &item.content);
    score.clamp(0.0, 1.0)
}

// ── Relevance ─────────────────────────────────────────────────────────────

const FREQUENCY_SATURATION: f64 = 10.0;
const DECAY_HOURS: f64 = 24.0;

/// Relevance of `item` to `query` as of `now`, in [0, 1].
///
/// An empty query yields the item's baseline standing value instead of a
/// term-overlap judgement.
pub fn relevance(item: &ContextItem, query: &str, now: DateTime<Utc>) -> f64 {
    if query.trim().is_empty() {
        return baseline_relevance(item);
    }

    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return 0.0;
    }
    let content_tokens = tokenize(&item.content);

    let matches: usize = query_tokens
        .iter()
        .map(|q| {
            content_tokens
                .iter()
                .filter(|c| c.contains(q.as_str()) || q.contains(c.as_str()))
                .count()
        })
        .sum();
    let overlap = matches as f64 / query_tokens.len() as f64;

    let importance_weight = 0.5 + 0.5 * item.importance;
    let frequency_weight =
        0.8 + 0.2 * (item.access_count as f64 / FREQUENCY_SATURATION).min(1.0);
    let age_hours = ((now - item.timestamp).num_milliseconds() as f64 / 3_600_000.0).max(0.0);
    let decay = (-age_hours / DECAY_HOURS).exp();

    (overlap * importance_weight * frequency_weight * decay).clamp(0.0, 1.0)
}

/// Standing value of an item with no query to judge it against.
pub fn baseline_relevance(item: &ContextItem) -> f64 {
    (0.3 + 0.4 * content_complexity(&item.content) + 0.3 * item.importance).clamp(0.0, 1.0)
}

/// Lower-cased alphanumeric tokens (underscores kept).
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rustedcode_core::context::Tier;

    fn item(content: &str) -> ContextItem {
        ContextItem::new(Tier::ShortTerm, content)
    }

    #[test]
    fn complexity_saturates() {
        assert_eq!(content_complexity(""), 0.0);
        let huge = "word ".repeat(1000) + &"\n".repeat(200);
        assert!((content_complexity(&huge) - 1.0).abs() < 1e-9);
        let small = content_complexity("one line");
        assert!(small > 0.0 && small < 0.05);
    }

    #[test]
    fn density_rewards_code() {
        let code = semantic_density("fn parse(input: &str) -> Result<Config> { return parse_config(input) }");
        let prose = semantic_density("the weather was lovely on the walk home today");
        assert!(code > prose);
        assert_eq!(prose, 0.0);
    }

    #[test]
    fn keyword_occurrences_capped_at_two() {
        let once = keyword_score("error");
        let twice = keyword_score("error error");
        let many = keyword_score("error error error error error");
        assert!((once - 0.15).abs() < 1e-9);
        assert!((twice - 0.30).abs() < 1e-9);
        assert!((many - twice).abs() < 1e-9);
    }

    #[test]
    fn keyword_tiers_are_weighted() {
        assert!((keyword_score("TODO") - 0.10).abs() < 1e-9);
        assert!((keyword_score("Performance") - 0.12).abs() < 1e-9);
        assert!((keyword_score("interface") - 0.05).abs() < 1e-9);
        assert_eq!(keyword_score("nothing notable"), 0.0);
    }

    #[test]
    fn file_type_detection() {
        let mut meta = Metadata::new();
        assert_eq!(detect_file_type(&meta), None);
        meta.insert("file".into(), "src/Main.RS".into());
        assert_eq!(detect_file_type(&meta).as_deref(), Some("rs"));
        meta.insert("file_type".into(), ".Go".into());
        assert_eq!(detect_file_type(&meta).as_deref(), Some("go"));
    }

    #[test]
    fn file_type_bonus_ranges() {
        let mut meta = Metadata::new();
        meta.insert("file_type".into(), "go".into());
        let src = file_type_bonus(&meta, "func main() {}");
        assert!((0.1..=0.3).contains(&src));

        meta.insert("file_type".into(), "md".into());
        let doc = file_type_bonus(&meta, "# Title");
        assert!((0.05..=0.15).contains(&doc));

        meta.insert("file_type".into(), "json".into());
        let cfg = file_type_bonus(&meta, "{\"a\": [1]}");
        assert!((0.08..=0.2).contains(&cfg));

        meta.insert("file_type".into(), "exe".into());
        assert_eq!(file_type_bonus(&meta, "MZ"), 0.0);
    }

    #[test]
    fn source_declarations_raise_complexity() {
        let plain = file_complexity(FileKind::Source, "rs", "let x = 1;");
        let decls = file_complexity(
            FileKind::Source,
            "rs",
            "fn a() {}\nfn b() {}\nstruct C;\nenum D {}\ntrait E {}\nimpl E for C {}",
        );
        assert!(decls > plain);
    }

    #[test]
    fn importance_is_clamped() {
        let loud = item(&"critical security vulnerability error exception panic important fix todo performance optimization ".repeat(5))
            .with_metadata("file_type", "rs");
        let score = importance(&loud);
        assert!((0.0..=1.0).contains(&score));
        assert_eq!(score, 1.0);
        assert!(importance(&item("")) >= 0.0);
    }

    #[test]
    fn empty_query_returns_baseline() {
        let it = item("hello there").with_importance(0.1);
        let score = relevance(&it, "", Utc::now());
        assert!(score > 0.3 && score < 0.7);
        assert!((score - baseline_relevance(&it)).abs() < 1e-12);
    }

    #[test]
    fn overlap_counts_substring_matches() {
        let now = Utc::now();
        let mut it = item("the parser returned an error");
        it.timestamp = now;
        it.importance = 1.0;
        // "pars" is contained in "parser", "error" matches "error": 2 hits / 2 tokens.
        let score = relevance(&it, "pars error", now);
        assert!((score - 0.8).abs() < 1e-9);
        assert_eq!(relevance(&it, "kubernetes", now), 0.0);
    }

    #[test]
    fn relevance_decays_with_age() {
        let now = Utc::now();
        let mut fresh = item("database migration failed");
        fresh.timestamp = now;
        let mut stale = fresh.clone();
        stale.timestamp = now - Duration::hours(24);

        let f = relevance(&fresh, "database", now);
        let s = relevance(&stale, "database", now);
        assert!(s < f);
        assert!((s / f - (-1.0f64).exp()).abs() < 1e-6);
    }

    #[test]
    fn frequently_accessed_items_score_higher() {
        let now = Utc::now();
        let mut cold = item("cache invalidation strategy");
        cold.timestamp = now;
        let mut hot = cold.clone();
        hot.access_count = 25;
        assert!(relevance(&hot, "cache", now) > relevance(&cold, "cache", now));
    }

    #[test]
    fn punctuation_only_query_scores_zero() {
        let it = item("anything");
        assert_eq!(relevance(&it, "?!", Utc::now()), 0.0);
    }

    #[test]
    fn tokenize_lowercases_and_splits() {
        assert_eq!(
            tokenize("Fix parse_config() in Main.rs!"),
            vec!["fix", "parse_config", "in", "main", "rs"]
        );
    }
}
