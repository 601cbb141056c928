//! Paperwork Documents - Parsing and Identity
//!
//! One source file becomes one `DocumentRecord`. Identity derivation
//! (slug, category keys, Fluent key) is pure string composition so the
//! verifier can recompute expected keys independently.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::pipeline::PipelineError;

/// Marker for an official-validation stamp area inside a document body.
pub const STAMP_MARKER: &str = "[stamp]";

/// Placeholder-field markers. Informational only; emission never touches them.
pub const FIELD_MARKERS: &[&str] = &["[form]", "[signature]", "[check]"];

/// Everything after `doc-text-printer-` is category keys plus the slug.
pub const FLUENT_KEY_PREFIX: &str = "doc-text-printer-";

#[derive(Debug, Clone, Serialize)]
pub struct DocumentRecord {
    pub path: PathBuf,
    /// Raw directory segments between the documents root and the file.
    pub raw_dirs: Vec<String>,
    /// Cleaned display labels for the directory segments.
    pub categories: Vec<String>,
    /// Slugged counterparts of `categories`; feed the Fluent key.
    pub category_keys: Vec<String>,
    pub slug: String,
    pub title: String,
    /// Body verbatim, title line stripped. Tags are opaque payload.
    pub body_lines: Vec<String>,
    /// Whitespace-collapsed body. Duplicate comparison only, never emitted.
    pub normalized_body: String,
    pub has_stamp_section: bool,
    pub has_placeholder_fields: bool,
    pub fluent_key: String,
}

impl DocumentRecord {
    /// Top-level directory name used as the category registry key.
    pub fn primary_dir(&self) -> &str {
        self.raw_dirs
            .first()
            .map(String::as_str)
            .unwrap_or("Miscellaneous")
    }

    /// Human-readable category path for grouping comments.
    pub fn category_label(&self) -> String {
        if self.categories.is_empty() {
            return "uncategorized".to_string();
        }
        self.categories.join(" / ")
    }
}

fn parenthetical_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\([^()]*\)").expect("hardcoded pattern"))
}

fn ordering_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\s*[-.)]?\s*").expect("hardcoded pattern"))
}

/// Remove parenthetical segments and collapse the surrounding whitespace.
pub fn strip_parenthetical(text: &str) -> String {
    let without = parenthetical_re().replace_all(text, "");
    without.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Human-readable label for a directory segment: no parenthetical notes,
/// no numeric ordering prefix (`04 Engineering & Logistics (...)` becomes
/// `Engineering & Logistics`).
pub fn clean_label(component: &str) -> String {
    let cleaned = strip_parenthetical(component);
    let without_prefix = ordering_prefix_re().replace(&cleaned, "");
    let result = without_prefix.trim();
    if result.is_empty() {
        cleaned
    } else {
        result.to_string()
    }
}

/// Lowercase, non-alphanumeric runs collapsed to a single `-`, trimmed.
pub fn slugify(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_sep = false;
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

/// PascalCase over non-alphanumeric boundaries. Digits are kept in place.
pub fn to_pascal_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for part in value.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = part.chars();
        match chars.next() {
            Some(first) => {
                out.extend(first.to_uppercase());
                out.extend(chars.flat_map(|c| c.to_lowercase()));
            }
            None => continue,
        }
    }
    out
}

/// Collapse all whitespace runs to single spaces and trim. Stable and pure;
/// the duplicate check relies on equality of this value across records.
pub fn normalize_body(lines: &[String]) -> String {
    lines
        .join("\n")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn fluent_key_for(category_keys: &[String], slug: &str) -> String {
    let mut parts: Vec<&str> = category_keys.iter().map(String::as_str).collect();
    if !slug.is_empty() {
        parts.push(slug);
    }
    let suffix = if parts.is_empty() {
        "paper".to_string()
    } else {
        parts.join("-")
    };
    format!("{FLUENT_KEY_PREFIX}{suffix}")
}

/// Parse one paperwork file into a `DocumentRecord`.
///
/// The first line must be a `# Title` declaration; the body is carried
/// verbatim apart from line-ending normalization.
pub fn parse_document(path: &Path, root: &Path) -> Result<DocumentRecord, PipelineError> {
    let raw = std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if raw.trim().is_empty() {
        return Err(PipelineError::EmptyDocument {
            path: path.to_path_buf(),
        });
    }

    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized.split('\n').collect();

    let first = lines.first().map(|l| l.trim_start()).unwrap_or("");
    if !first.starts_with('#') {
        return Err(PipelineError::MissingTitle {
            path: path.to_path_buf(),
        });
    }
    let title = first[1..].trim().to_string();
    if title.is_empty() {
        return Err(PipelineError::MissingTitle {
            path: path.to_path_buf(),
        });
    }

    let body_lines: Vec<String> = lines[1..].iter().map(|l| l.to_string()).collect();

    let relative = path.strip_prefix(root).map_err(|_| PipelineError::Io {
        path: path.to_path_buf(),
        source: std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "document lies outside the documents root",
        ),
    })?;
    let raw_dirs: Vec<String> = relative
        .parent()
        .map(|parent| {
            parent
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();

    let categories: Vec<String> = raw_dirs
        .iter()
        .map(|d| clean_label(d))
        .filter(|l| !l.is_empty())
        .collect();
    let category_keys: Vec<String> = categories
        .iter()
        .map(|l| slugify(l))
        .filter(|k| !k.is_empty())
        .collect();

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut slug = slugify(&stem);
    if slug.is_empty() {
        slug = "document".to_string();
    }

    let normalized_body = normalize_body(&body_lines);
    let body_text = body_lines.join("\n");
    let has_stamp_section = body_text.contains(STAMP_MARKER);
    let has_placeholder_fields = FIELD_MARKERS.iter().any(|m| body_text.contains(m));
    let fluent_key = fluent_key_for(&category_keys, &slug);

    Ok(DocumentRecord {
        path: path.to_path_buf(),
        raw_dirs,
        categories,
        category_keys,
        slug,
        title,
        body_lines,
        normalized_body,
        has_stamp_section,
        has_placeholder_fields,
        fluent_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_collapses_runs() {
        assert_eq!(slugify("ID_Replacement"), "id-replacement");
        assert_eq!(slugify("  Power   Plan!! "), "power-plan");
        assert_eq!(slugify("form_b12"), "form-b12");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_clean_label_strips_notes_and_prefix() {
        assert_eq!(
            clean_label("04 Engineering & Logistics (Engineering, Cargo, Janitorial)"),
            "Engineering & Logistics"
        );
        assert_eq!(clean_label("Identity"), "Identity");
        assert_eq!(clean_label("07"), "07");
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(to_pascal_case("engineering-logistics"), "EngineeringLogistics");
        assert_eq!(to_pascal_case("identity"), "Identity");
        assert_eq!(to_pascal_case("form-b12"), "FormB12");
    }

    #[test]
    fn test_normalize_body_stable() {
        let lines = vec!["  a  b ".to_string(), String::new(), "\tc".to_string()];
        assert_eq!(normalize_body(&lines), "a b c");
        assert_eq!(normalize_body(&lines), normalize_body(&lines.clone()));
    }

    #[test]
    fn test_fluent_key_composition() {
        let key = fluent_key_for(&["identity".to_string()], "card");
        assert_eq!(key, "doc-text-printer-identity-card");
        assert_eq!(fluent_key_for(&[], ""), "doc-text-printer-paper");
    }
}
