//! Document Model Builder - Single Source of Truth
//!
//! Traverses the documents root, parses every file, and assembles the
//! record and category collections. Any structural error aborts the whole
//! build; downstream artifacts are only meaningful as a consistent set.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::category::{build_categories, CategoryEntry, CategoryOverrides};
use crate::document::{parse_document, DocumentRecord};
use crate::pipeline::PipelineError;

/// Directory and file name prefix excluded from traversal entirely
/// (templates, private scratch folders).
pub const EXCLUDED_PREFIX: &str = "_";

const DOCUMENT_EXTENSIONS: &[&str] = &["txt", "paper"];

/// Immutable, fully-built model shared read-only by emitters and checkers.
#[derive(Debug, Clone)]
pub struct DocumentModel {
    pub documents: Vec<DocumentRecord>,
    pub categories: Vec<CategoryEntry>,
}

/// Build the complete model for one run.
///
/// Fails fast on the first missing title, duplicate slug, duplicate Fluent
/// key, or unknown override; no partial model escapes.
pub fn build_model(
    root: &Path,
    overrides: &CategoryOverrides,
) -> Result<DocumentModel, PipelineError> {
    let paths = collect_document_paths(root)?;
    if paths.is_empty() {
        return Err(PipelineError::NoDocuments {
            root: root.to_path_buf(),
        });
    }

    let mut documents = Vec::with_capacity(paths.len());
    let mut slugs: HashMap<(Vec<String>, String), PathBuf> = HashMap::new();
    let mut fluent_keys: HashMap<String, PathBuf> = HashMap::new();

    for path in paths {
        let doc = parse_document(&path, root)?;

        let sibling_key = (doc.raw_dirs.clone(), doc.slug.clone());
        if let Some(first) = slugs.get(&sibling_key) {
            return Err(PipelineError::DuplicateSlug {
                slug: doc.slug,
                first: first.clone(),
                second: doc.path,
            });
        }
        slugs.insert(sibling_key, doc.path.clone());

        if let Some(first) = fluent_keys.get(&doc.fluent_key) {
            return Err(PipelineError::DuplicateFluentKey {
                key: doc.fluent_key.clone(),
                first: first.clone(),
                second: doc.path,
            });
        }
        fluent_keys.insert(doc.fluent_key.clone(), doc.path.clone());

        documents.push(doc);
    }

    let categories = build_categories(&documents, overrides)?;

    Ok(DocumentModel {
        documents,
        categories,
    })
}

/// Deterministic traversal: entries sorted by name at every level, excluded
/// prefixes never descended into.
fn collect_document_paths(root: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let mut paths = Vec::new();
    if root.exists() {
        walk(root, &mut paths)?;
    }
    Ok(paths)
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), PipelineError> {
    let read = std::fs::read_dir(dir).map_err(|source| PipelineError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut entries: Vec<PathBuf> = Vec::new();
    for entry in read {
        let entry = entry.map_err(|source| PipelineError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        entries.push(entry.path());
    }
    entries.sort();

    for path in entries {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name.starts_with(EXCLUDED_PREFIX) {
            continue;
        }
        if path.is_dir() {
            walk(&path, out)?;
        } else if path
            .extension()
            .map_or(false, |ext| DOCUMENT_EXTENSIONS.iter().any(|e| ext == *e))
        {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_paper(root: &Path, rel: &str, title: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, format!("# {title}\n{body}")).unwrap();
    }

    #[test]
    fn test_excluded_directories_not_traversed() {
        let tmp = tempfile::tempdir().unwrap();
        write_paper(tmp.path(), "security/incident.paper", "Incident", "Details\n");
        write_paper(tmp.path(), "_partials/footer.paper", "Footer", "Footer body\n");

        let model = build_model(tmp.path(), &CategoryOverrides::new()).unwrap();
        assert_eq!(model.documents.len(), 1);
        assert_eq!(
            model.documents[0].fluent_key,
            "doc-text-printer-security-incident"
        );
    }

    #[test]
    fn test_duplicate_slug_names_both_paths() {
        let tmp = tempfile::tempdir().unwrap();
        write_paper(tmp.path(), "identity/ID_Replacement.txt", "A", "one\n");
        write_paper(tmp.path(), "identity/id-replacement.txt", "B", "two\n");

        let err = build_model(tmp.path(), &CategoryOverrides::new()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("id-replacement"));
        assert!(message.contains("ID_Replacement.txt"));
        assert!(message.contains("id-replacement.txt"));
    }

    #[test]
    fn test_empty_tree_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = build_model(tmp.path(), &CategoryOverrides::new()).unwrap_err();
        assert!(matches!(err, PipelineError::NoDocuments { .. }));
    }

    #[test]
    fn test_fluent_keys_unique_across_categories() {
        let tmp = tempfile::tempdir().unwrap();
        write_paper(tmp.path(), "identity/id-replacement.txt", "ID", "x\n");
        write_paper(tmp.path(), "medical/id-replacement.txt", "ID", "y\n");

        let model = build_model(tmp.path(), &CategoryOverrides::new()).unwrap();
        let keys: Vec<_> = model.documents.iter().map(|d| d.fluent_key.clone()).collect();
        assert!(keys.contains(&"doc-text-printer-identity-id-replacement".to_string()));
        assert!(keys.contains(&"doc-text-printer-medical-id-replacement".to_string()));
    }
}
