//! Consistency Checker - Duplicate Bodies and Missing Stamps
//!
//! Findings are structured like validation violations: the checks produce
//! them, the strict flags decide whether they warn or fail.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::DocumentModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    DuplicateBody,
    MissingStamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckFinding {
    pub kind: FindingKind,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub strict_duplicates: bool,
    pub strict_stamps: bool,
    /// Lowercased substrings marking a document as requiring validation.
    /// The stamp marker itself stays authoritative for presence detection;
    /// these cues only decide which documents *should* carry one. Parsed
    /// placeholder fields count as a cue independently of this list.
    pub validation_cues: Vec<String>,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            strict_duplicates: false,
            strict_stamps: false,
            validation_cues: vec![
                "approved by".to_string(),
                "authorized by".to_string(),
                "authorization".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub warnings: Vec<CheckFinding>,
    pub errors: Vec<CheckFinding>,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(&mut self, strict: bool, finding: CheckFinding) {
        if strict {
            self.errors.push(finding);
        } else {
            self.warnings.push(finding);
        }
    }
}

/// Audit the model. Never mutates it and never touches the file system.
pub fn check_documents(model: &DocumentModel, options: &CheckOptions) -> CheckReport {
    let mut report = CheckReport::default();

    let mut by_body: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for doc in &model.documents {
        if doc.normalized_body.is_empty() {
            continue;
        }
        by_body
            .entry(doc.normalized_body.as_str())
            .or_default()
            .push(doc.fluent_key.as_str());
    }
    for keys in by_body.values() {
        if keys.len() < 2 {
            continue;
        }
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        report.push(
            options.strict_duplicates,
            CheckFinding {
                kind: FindingKind::DuplicateBody,
                message: format!("duplicate body content across: {}", sorted.join(", ")),
            },
        );
    }

    for doc in &model.documents {
        if doc.has_stamp_section {
            continue;
        }
        // A document carrying placeholder fields is a fillable form and
        // needs a stamp area, whatever the body wording says.
        let haystack = doc.normalized_body.to_lowercase();
        if doc.has_placeholder_fields
            || options.validation_cues.iter().any(|cue| haystack.contains(cue))
        {
            report.push(
                options.strict_stamps,
                CheckFinding {
                    kind: FindingKind::MissingStamp,
                    message: format!(
                        "missing stamp section: {} ({})",
                        doc.fluent_key,
                        doc.path.display()
                    ),
                },
            );
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryOverrides;
    use crate::model::build_model;
    use std::fs;
    use std::path::Path;

    fn write_paper(root: &Path, rel: &str, title: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, format!("# {title}\n{body}")).unwrap();
    }

    #[test]
    fn test_identical_bodies_report_one_pair() {
        let tmp = tempfile::tempdir().unwrap();
        write_paper(tmp.path(), "identity/a.txt", "First", "Same body text\n");
        write_paper(tmp.path(), "identity/b.txt", "Second", "Same   body \n text\n");
        let model = build_model(tmp.path(), &CategoryOverrides::new()).unwrap();

        let report = check_documents(&model, &CheckOptions::default());
        let dupes: Vec<_> = report
            .warnings
            .iter()
            .filter(|f| f.kind == FindingKind::DuplicateBody)
            .collect();
        assert_eq!(dupes.len(), 1);
        assert!(dupes[0].message.contains("doc-text-printer-identity-a"));
        assert!(dupes[0].message.contains("doc-text-printer-identity-b"));
        assert!(report.passed());
    }

    #[test]
    fn test_strict_duplicates_escalate() {
        let tmp = tempfile::tempdir().unwrap();
        write_paper(tmp.path(), "identity/a.txt", "First", "Same\n");
        write_paper(tmp.path(), "identity/b.txt", "Second", "Same\n");
        let model = build_model(tmp.path(), &CategoryOverrides::new()).unwrap();

        let options = CheckOptions {
            strict_duplicates: true,
            ..Default::default()
        };
        let report = check_documents(&model, &options);
        assert!(!report.passed());
    }

    #[test]
    fn test_stamp_cue_without_marker_flagged() {
        let tmp = tempfile::tempdir().unwrap();
        write_paper(
            tmp.path(),
            "identity/request.txt",
            "Request",
            "Approved by the Head of Personnel\n[stamp]\n",
        );
        write_paper(
            tmp.path(),
            "identity/unstamped.txt",
            "Unstamped",
            "Approved by the Head of Personnel\n",
        );
        write_paper(tmp.path(), "identity/memo.txt", "Memo", "Just a note\n");
        let model = build_model(tmp.path(), &CategoryOverrides::new()).unwrap();

        let report = check_documents(&model, &CheckOptions::default());
        let stamps: Vec<_> = report
            .warnings
            .iter()
            .filter(|f| f.kind == FindingKind::MissingStamp)
            .collect();
        assert_eq!(stamps.len(), 1);
        assert!(stamps[0].message.contains("doc-text-printer-identity-unstamped"));
    }

    #[test]
    fn test_placeholder_fields_require_stamp() {
        let tmp = tempfile::tempdir().unwrap();
        write_paper(
            tmp.path(),
            "identity/application.txt",
            "Application",
            "Name: [form]\n",
        );
        write_paper(
            tmp.path(),
            "identity/signed.txt",
            "Signed Form",
            "Name: [form]\n[signature]\n[stamp]\n",
        );
        let model = build_model(tmp.path(), &CategoryOverrides::new()).unwrap();

        let unsigned = model
            .documents
            .iter()
            .find(|d| d.slug == "application")
            .unwrap();
        assert!(unsigned.has_placeholder_fields);

        let report = check_documents(&model, &CheckOptions::default());
        let stamps: Vec<_> = report
            .warnings
            .iter()
            .filter(|f| f.kind == FindingKind::MissingStamp)
            .collect();
        assert_eq!(stamps.len(), 1);
        assert!(stamps[0]
            .message
            .contains("doc-text-printer-identity-application"));
    }

    #[test]
    fn test_stamp_flag_truth_table() {
        let tmp = tempfile::tempdir().unwrap();
        write_paper(tmp.path(), "identity/with.txt", "With", "Body\n[stamp]\n");
        write_paper(tmp.path(), "identity/without.txt", "Without", "Body\n");
        let model = build_model(tmp.path(), &CategoryOverrides::new()).unwrap();

        let with = model
            .documents
            .iter()
            .find(|d| d.slug == "with")
            .unwrap();
        let without = model
            .documents
            .iter()
            .find(|d| d.slug == "without")
            .unwrap();
        assert!(with.has_stamp_section);
        assert!(!without.has_stamp_section);
    }
}
