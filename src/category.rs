//! Category Registry - Directory Metadata With Override Merge
//!
//! One entry per top-level directory under the documents root. Overrides are
//! explicit partial structs so an unknown directory name or a misspelled
//! field is a configuration error, never a silent no-op.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::{clean_label, slugify, to_pascal_case, DocumentRecord};
use crate::pipeline::PipelineError;

#[derive(Debug, Clone, Serialize)]
pub struct CategoryEntry {
    /// Raw top-level directory name; the registry and override key.
    pub dir_name: String,
    /// PascalCase identifier used as the cross-artifact key.
    pub id: String,
    pub label: String,
    pub order: i64,
    /// Fluent label key override; defaults to the slug of the label.
    pub lathe_key: Option<String>,
    /// Per-category printing cost; the emitter default applies when absent.
    pub material_cost: Option<u32>,
    /// First-seen index; sort tie-break.
    pub discovery_index: usize,
}

impl CategoryEntry {
    /// Fluent key naming this category's label in the localization file.
    pub fn fluent_label_key(&self) -> String {
        let key = self
            .lathe_key
            .clone()
            .unwrap_or_else(|| slugify(&self.label));
        format!("lathe-category-{key}")
    }
}

/// Partial per-category configuration. Every field optional; unspecified
/// fields retain their derived defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryOverride {
    pub id: Option<String>,
    pub label: Option<String>,
    pub order: Option<i64>,
    pub lathe_key: Option<String>,
    pub material_cost: Option<u32>,
}

/// Overrides keyed by top-level directory name.
pub type CategoryOverrides = BTreeMap<String, CategoryOverride>;

/// Read the optional JSON override file.
pub fn load_overrides(path: &Path) -> Result<CategoryOverrides, PipelineError> {
    let raw = std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|err| PipelineError::InvalidOverrideFile {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Build the ordered category list from discovered documents.
///
/// Defaults come from the directory name; overrides merge field-by-field.
/// An override naming a directory that was never discovered aborts the run.
pub fn build_categories(
    documents: &[DocumentRecord],
    overrides: &CategoryOverrides,
) -> Result<Vec<CategoryEntry>, PipelineError> {
    let mut entries: Vec<CategoryEntry> = Vec::new();
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();

    for doc in documents {
        let dir_name = doc.primary_dir().to_string();
        if seen.contains_key(&dir_name) {
            continue;
        }
        let discovery_index = entries.len();
        seen.insert(dir_name.clone(), discovery_index);

        let label = clean_label(&dir_name);
        let mut entry = CategoryEntry {
            id: to_pascal_case(&label),
            label,
            order: discovery_index as i64,
            lathe_key: None,
            material_cost: None,
            dir_name: dir_name.clone(),
            discovery_index,
        };

        if let Some(over) = overrides.get(&dir_name) {
            if let Some(id) = &over.id {
                entry.id = id.clone();
            }
            if let Some(label) = &over.label {
                entry.label = label.clone();
            }
            if let Some(order) = over.order {
                entry.order = order;
            }
            if let Some(key) = &over.lathe_key {
                entry.lathe_key = Some(key.clone());
            }
            if let Some(cost) = over.material_cost {
                entry.material_cost = Some(cost);
            }
        }

        entries.push(entry);
    }

    for name in overrides.keys() {
        if !seen.contains_key(name) {
            return Err(PipelineError::UnknownCategoryOverride { name: name.clone() });
        }
    }

    entries.sort_by(|a, b| {
        a.order
            .cmp(&b.order)
            .then(a.discovery_index.cmp(&b.discovery_index))
    });
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;

    fn record(dir: &str, slug: &str) -> DocumentRecord {
        // Build through the parser to keep identity derivation in one place.
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(dir).join(format!("{slug}.txt"));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "# Title\nbody\n").unwrap();
        parse_document(&path, tmp.path()).unwrap()
    }

    #[test]
    fn test_defaults_follow_discovery_order() {
        let docs = vec![record("Security", "incident"), record("Identity", "card")];
        let entries = build_categories(&docs, &CategoryOverrides::new()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "Security");
        assert_eq!(entries[0].order, 0);
        assert_eq!(entries[1].id, "Identity");
        assert_eq!(entries[1].order, 1);
    }

    #[test]
    fn test_override_merge_is_field_by_field() {
        let docs = vec![record("Identity", "card")];
        let mut overrides = CategoryOverrides::new();
        overrides.insert(
            "Identity".to_string(),
            CategoryOverride {
                order: Some(5),
                lathe_key: Some("document-identity".to_string()),
                ..Default::default()
            },
        );
        let entries = build_categories(&docs, &overrides).unwrap();
        assert_eq!(entries[0].id, "Identity");
        assert_eq!(entries[0].label, "Identity");
        assert_eq!(entries[0].order, 5);
        assert_eq!(
            entries[0].fluent_label_key(),
            "lathe-category-document-identity"
        );
    }

    #[test]
    fn test_unknown_override_rejected() {
        let docs = vec![record("Identity", "card")];
        let mut overrides = CategoryOverrides::new();
        overrides.insert("Medbay".to_string(), CategoryOverride::default());
        let err = build_categories(&docs, &overrides).unwrap_err();
        assert!(err.to_string().contains("Medbay"));
    }

    #[test]
    fn test_fluent_label_key_defaults_to_label_slug() {
        let docs = vec![record("04 Engineering & Logistics (Cargo)", "plan")];
        let entries = build_categories(&docs, &CategoryOverrides::new()).unwrap();
        assert_eq!(entries[0].label, "Engineering & Logistics");
        assert_eq!(
            entries[0].fluent_label_key(),
            "lathe-category-engineering-logistics"
        );
    }
}
