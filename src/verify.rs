//! Bundle Verifier - Cross-Checks Over Emitted Artifacts
//!
//! Operates on the files re-read from disk, never on the in-memory model,
//! so emission bugs are caught independently of model-construction bugs.
//! Every violation is collected before failing; the report is never
//! truncated to the first finding.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::pipeline::{ArtifactPaths, PipelineError};

fn ftl_entry_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<key>[a-z0-9-]+)\s*=").expect("hardcoded pattern"))
}

fn quoted_field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*(?:- )?(?P<field>[A-Za-z_]+): "(?P<value>[^"]*)""#)
            .expect("hardcoded pattern")
    })
}

fn read(path: &Path) -> Result<String, PipelineError> {
    std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn ftl_keys(text: &str, prefix: &str) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(caps) = ftl_entry_re().captures(line) {
            let key = &caps["key"];
            if key.starts_with(prefix) {
                keys.insert(key.to_string());
            }
        }
    }
    keys
}

/// Document keys and referenced category ids from `documents.yml`.
fn parse_documents(text: &str) -> (BTreeSet<String>, BTreeSet<String>) {
    let mut keys = BTreeSet::new();
    let mut categories = BTreeSet::new();
    for line in text.lines() {
        if let Some(caps) = quoted_field_re().captures(line) {
            match &caps["field"] {
                "key" => {
                    keys.insert(caps["value"].to_string());
                }
                "category" => {
                    categories.insert(caps["value"].to_string());
                }
                _ => {}
            }
        }
    }
    (keys, categories)
}

#[derive(Debug, Default)]
struct RecipeScan {
    ids: BTreeSet<String>,
    document_refs: Vec<(String, String)>,
    category_refs: BTreeSet<String>,
    issues: Vec<String>,
}

fn parse_recipes(text: &str, path: &Path) -> RecipeScan {
    let mut scan = RecipeScan::default();
    let mut current_id: Option<String> = None;
    let mut in_categories = false;

    for line in text.lines() {
        if line.starts_with("- type: latheRecipe") {
            current_id = None;
            in_categories = false;
            continue;
        }
        if let Some(id) = line.strip_prefix("  id: ") {
            let id = id.trim().to_string();
            if !scan.ids.insert(id.clone()) {
                scan.issues
                    .push(format!("duplicate recipe id {} in {}", id, path.display()));
            }
            current_id = Some(id);
            in_categories = false;
            continue;
        }
        if let Some(doc_key) = line.strip_prefix("  document: ") {
            if let Some(id) = &current_id {
                scan.document_refs
                    .push((id.clone(), doc_key.trim().to_string()));
            }
            in_categories = false;
            continue;
        }
        if line.starts_with("  categories:") {
            in_categories = true;
            continue;
        }
        if in_categories {
            if let Some(cat) = line.strip_prefix("    - ") {
                scan.category_refs.insert(cat.trim().to_string());
                continue;
            }
            in_categories = false;
        }
    }
    scan
}

fn parse_pack_recipes(text: &str) -> BTreeSet<String> {
    let mut refs = BTreeSet::new();
    let mut in_recipes = false;
    for line in text.lines() {
        if line.starts_with("  recipes:") {
            in_recipes = true;
            continue;
        }
        if !in_recipes {
            continue;
        }
        let trimmed = line.trim();
        if trimmed.starts_with('#') || trimmed.is_empty() {
            continue;
        }
        if let Some(recipe) = trimmed.strip_prefix("- ") {
            refs.insert(recipe.trim().to_string());
        } else {
            in_recipes = false;
        }
    }
    refs
}

/// Category id -> Fluent label key from `categories.yml`.
fn parse_category_prototypes(text: &str, path: &Path, issues: &mut Vec<String>) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    let mut current_id: Option<String> = None;
    for line in text.lines() {
        if line.starts_with("- type: latheCategory") {
            current_id = None;
            continue;
        }
        if let Some(id) = line.strip_prefix("  id: ") {
            let id = id.trim().to_string();
            if map.contains_key(&id) {
                issues.push(format!(
                    "duplicate latheCategory id {} in {}",
                    id,
                    path.display()
                ));
                current_id = None;
            } else {
                current_id = Some(id);
            }
            continue;
        }
        if let Some(name) = line.strip_prefix("  name: ") {
            if let Some(id) = current_id.take() {
                map.insert(id, name.trim().to_string());
            }
        }
    }
    map
}

/// Verify that the emitted artifacts form a closed reference graph.
///
/// Fails with `DanglingReferences` enumerating every violation found.
pub fn verify_bundle(paths: &ArtifactPaths) -> Result<(), PipelineError> {
    let mut issues: Vec<String> = Vec::new();

    let (doc_keys, doc_categories) = parse_documents(&read(&paths.documents)?);
    if doc_keys.is_empty() {
        issues.push(format!("no documents found in {}", paths.documents.display()));
    }

    let bundle_keys = ftl_keys(&read(&paths.bundle)?, "doc-text-printer-");
    let missing_ftl: Vec<&String> = doc_keys.difference(&bundle_keys).collect();
    if !missing_ftl.is_empty() {
        let joined = missing_ftl
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        issues.push(format!(
            "{} missing entries for: {}",
            paths.bundle.display(),
            joined
        ));
    }

    let recipes = parse_recipes(&read(&paths.recipes)?, &paths.recipes);
    issues.extend(recipes.issues.iter().cloned());
    for (recipe_id, doc_key) in &recipes.document_refs {
        if !doc_keys.contains(doc_key) {
            issues.push(format!(
                "{} references unknown document key '{}'",
                recipe_id, doc_key
            ));
        }
    }

    for pack_ref in parse_pack_recipes(&read(&paths.pack)?) {
        if !recipes.ids.contains(&pack_ref) {
            issues.push(format!("recipe pack references unknown recipe '{pack_ref}'"));
        }
    }

    let category_map = parse_category_prototypes(
        &read(&paths.category_prototypes)?,
        &paths.category_prototypes,
        &mut issues,
    );
    let category_ids: BTreeSet<String> = category_map.keys().cloned().collect();

    let mut referenced: BTreeSet<String> = BTreeSet::new();
    referenced.extend(doc_categories.iter().cloned());
    referenced.extend(recipes.category_refs.iter().cloned());
    let undefined: Vec<String> = referenced.difference(&category_ids).cloned().collect();
    if !undefined.is_empty() {
        issues.push(format!(
            "artifacts reference undefined lathe categories: {}",
            undefined.join(", ")
        ));
    }

    let label_keys = ftl_keys(&read(&paths.category_ftl)?, "lathe-category-");
    let names: BTreeSet<String> = category_map.values().cloned().collect();
    for name in names.difference(&label_keys) {
        issues.push(format!(
            "{} missing definition for: {}",
            paths.category_ftl.display(),
            name
        ));
    }
    for key in label_keys.difference(&names) {
        issues.push(format!(
            "{} defines unused category label: {}",
            paths.category_ftl.display(),
            key
        ));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::DanglingReferences(issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ftl_key_extraction_skips_comments() {
        let text = "# header\n\ndoc-text-printer-identity-card =\n    body\nlathe-category-x = Label\n";
        let keys = ftl_keys(text, "doc-text-printer-");
        assert_eq!(keys.len(), 1);
        assert!(keys.contains("doc-text-printer-identity-card"));
    }

    #[test]
    fn test_recipe_scan_links_ids_to_documents() {
        let text = concat!(
            "- type: latheRecipe\n",
            "  id: PrintedDocumentIdentityCardRecipe\n",
            "  document: doc-text-printer-identity-card\n",
            "  categories:\n",
            "    - Identity\n",
        );
        let scan = parse_recipes(text, Path::new("printer.yml"));
        assert!(scan.ids.contains("PrintedDocumentIdentityCardRecipe"));
        assert_eq!(
            scan.document_refs,
            vec![(
                "PrintedDocumentIdentityCardRecipe".to_string(),
                "doc-text-printer-identity-card".to_string()
            )]
        );
        assert!(scan.category_refs.contains("Identity"));
    }

    #[test]
    fn test_pack_scan_ignores_group_comments() {
        let text = concat!(
            "- type: latheRecipePack\n",
            "  id: PaperworkDocsAuto\n",
            "  recipes:\n",
            "  # Identity\n",
            "  - PrintedDocumentIdentityCardRecipe\n",
        );
        let refs = parse_pack_recipes(text);
        assert_eq!(refs.len(), 1);
        assert!(refs.contains("PrintedDocumentIdentityCardRecipe"));
    }
}
