//! `rustedcode score` — Show how the context memory would value a file.

use rustedcode_core::context::{ContextItem, Tier};
use rustedcode_memory::scoring;
use std::path::Path;

pub async fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let item = file_item(path, content);
    let importance = scoring::importance(&item);

    println!("📊 {}", path.display());
    println!(
        "  File type:     {}",
        scoring::detect_file_type(&item.metadata).unwrap_or_else(|| "unknown".into())
    );
    println!("  Complexity:    {:.3}", scoring::content_complexity(&item.content));
    println!("  Density:       {:.3}", scoring::semantic_density(&item.content));
    println!("  Keywords:      {:.3}", scoring::keyword_score(&item.content));
    println!(
        "  Type bonus:    {:.3}",
        scoring::file_type_bonus(&item.metadata, &item.content)
    );
    println!("  Importance:    {importance:.3}");
    println!(
        "  Baseline:      {:.3}",
        scoring::baseline_relevance(&item.with_importance(importance))
    );
    Ok(())
}

fn file_item(path: &Path, content: String) -> ContextItem {
    ContextItem::new(Tier::ShortTerm, content).with_metadata("file", path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_item_tags_path() {
        let item = file_item(Path::new("src/lib.rs"), "fn main() {}".into());
        assert_eq!(item.metadata["file"], "src/lib.rs");
        assert_eq!(scoring::detect_file_type(&item.metadata).as_deref(), Some("rs"));
    }

    #[tokio::test]
    async fn scores_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# TODO\nfix the flaky test").unwrap();
        assert!(run(&path).await.is_ok());
        assert!(run(&dir.path().join("missing.md")).await.is_err());
    }
}
