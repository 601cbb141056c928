//! Artifact Emitters - Five Views Of One Model
//!
//! Every emitter is a pure function from the model to one serialized
//! artifact. File writes compare against existing content first so a
//! re-run over unchanged input leaves byte-identical, diff-stable files.

use std::collections::HashMap;
use std::path::Path;

use crate::category::CategoryEntry;
use crate::document::{to_pascal_case, DocumentRecord, FLUENT_KEY_PREFIX};
use crate::pipeline::PipelineError;

/// First line of every generated artifact.
pub const GENERATED_HEADER: &str = "# Auto-generated by paperforge. Do not edit manually.";

/// Zero-width space. Fluent treats lines beginning with '[' as select
/// variants; prefixing them keeps the legacy markup intact in-game.
pub const FTL_PREFIX_MARKER: &str = "\u{200B}";

/// Default lathe material requirement when none is configured.
pub const DEFAULT_MATERIAL: (&str, u32) = ("SheetPrinter", 100);

#[derive(Debug, Clone)]
pub struct EmitOptions {
    pub pack_id: String,
    pub recipe_time: u32,
    /// Material requirements in CLI order.
    pub materials: Vec<(String, u32)>,
    pub apply_material_discount: bool,
    /// Emit documents as visible in spawn menus instead of hidden.
    pub visible: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            pack_id: "PaperworkDocsAuto".to_string(),
            recipe_time: 2,
            materials: vec![(DEFAULT_MATERIAL.0.to_string(), DEFAULT_MATERIAL.1)],
            apply_material_discount: false,
            visible: false,
        }
    }
}

/// Parse material requirements passed as NAME=AMOUNT pairs.
pub fn parse_materials(args: &[String]) -> Result<Vec<(String, u32)>, PipelineError> {
    if args.is_empty() {
        return Ok(vec![(DEFAULT_MATERIAL.0.to_string(), DEFAULT_MATERIAL.1)]);
    }
    let mut materials = Vec::with_capacity(args.len());
    for arg in args {
        let (name, amount) = arg.split_once('=').ok_or_else(|| PipelineError::InvalidOption {
            value: arg.clone(),
            reason: "use '<name>=<amount>'".to_string(),
        })?;
        let name = name.trim();
        let amount = amount.trim();
        if name.is_empty() || amount.is_empty() {
            return Err(PipelineError::InvalidOption {
                value: arg.clone(),
                reason: "empty components are not allowed".to_string(),
            });
        }
        let amount: u32 = amount.parse().map_err(|_| PipelineError::InvalidOption {
            value: arg.clone(),
            reason: "amount must be a non-negative integer".to_string(),
        })?;
        materials.push((name.to_string(), amount));
    }
    Ok(materials)
}

/// Lathe recipe id derived from a document's Fluent key.
pub fn recipe_id_for(doc: &DocumentRecord) -> String {
    let suffix = doc
        .fluent_key
        .strip_prefix(FLUENT_KEY_PREFIX)
        .unwrap_or(&doc.fluent_key);
    format!("PrintedDocument{}Recipe", to_pascal_case(suffix))
}

fn yaml_quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

fn sorted_docs(documents: &[DocumentRecord]) -> Vec<&DocumentRecord> {
    let mut docs: Vec<&DocumentRecord> = documents.iter().collect();
    docs.sort_by(|a, b| (&a.categories, &a.slug).cmp(&(&b.categories, &b.slug)));
    docs
}

/// Documents grouped by top-level directory, each group sorted by
/// case-folded title.
fn group_by_dir(documents: &[DocumentRecord]) -> HashMap<&str, Vec<&DocumentRecord>> {
    let mut groups: HashMap<&str, Vec<&DocumentRecord>> = HashMap::new();
    for doc in documents {
        groups.entry(doc.primary_dir()).or_default().push(doc);
    }
    for docs in groups.values_mut() {
        docs.sort_by_key(|d| d.title.to_lowercase());
    }
    groups
}

fn category_id_by_dir(categories: &[CategoryEntry]) -> HashMap<&str, &CategoryEntry> {
    categories.iter().map(|c| (c.dir_name.as_str(), c)).collect()
}

/// Localization bundle: one Fluent entry per document.
pub fn render_bundle_ftl(documents: &[DocumentRecord]) -> String {
    let docs = sorted_docs(documents);

    let mut lines: Vec<String> = vec![GENERATED_HEADER.to_string()];

    let mut current_category: Option<&Vec<String>> = None;
    for doc in docs {
        if current_category != Some(&doc.categories) {
            lines.push(String::new());
            lines.push(format!("# {}", doc.category_label()));
            current_category = Some(&doc.categories);
        }

        lines.push(String::new());
        lines.push(format!("# title: {}", doc.title));
        lines.push(format!("# slug: {}", doc.slug));
        lines.push(format!("{} =", doc.fluent_key));

        let mut body = doc.body_lines.clone();
        while body.last().map_or(false, |l| l.trim().is_empty()) {
            body.pop();
        }
        for raw_line in &body {
            let formatted = if raw_line.starts_with('[') {
                format!("{FTL_PREFIX_MARKER}{raw_line}")
            } else {
                raw_line.clone()
            };
            lines.push(format!("    {formatted}"));
        }
        // Trailing blank entries give the in-game renderer vertical spacing.
        lines.push(format!("    {FTL_PREFIX_MARKER}"));
        lines.push(format!("    {FTL_PREFIX_MARKER}"));
    }
    lines.push(String::new());
    lines.join("\n")
}

/// Document metadata table: key, display name, category id, visibility.
pub fn render_documents_yaml(
    documents: &[DocumentRecord],
    categories: &[CategoryEntry],
    visible: bool,
) -> String {
    let by_dir = category_id_by_dir(categories);
    let docs = sorted_docs(documents);

    let mut lines: Vec<String> = vec![GENERATED_HEADER.to_string(), "documents:".to_string()];
    for doc in docs {
        lines.push(format!("  - key: {}", yaml_quote(&doc.fluent_key)));
        lines.push(format!("    name: {}", yaml_quote(&doc.title)));
        if let Some(entry) = by_dir.get(doc.primary_dir()) {
            lines.push(format!("    category: {}", yaml_quote(&entry.id)));
        }
        lines.push(format!("    hidden: {}", !visible));
    }
    lines.push(String::new());
    lines.join("\n")
}

/// Printer lathe recipes, grouped by category in registry order.
pub fn render_printer_recipes(
    documents: &[DocumentRecord],
    categories: &[CategoryEntry],
    options: &EmitOptions,
) -> String {
    let groups = group_by_dir(documents);

    let mut lines: Vec<String> = vec![GENERATED_HEADER.to_string()];
    for entry in categories {
        let Some(docs) = groups.get(entry.dir_name.as_str()) else {
            continue;
        };

        lines.push(String::new());
        lines.push(format!("# {}", entry.label));
        lines.push(String::new());

        let materials: Vec<(String, u32)> = match entry.material_cost {
            Some(cost) => options
                .materials
                .iter()
                .map(|(name, _)| (name.clone(), cost))
                .collect(),
            None => options.materials.clone(),
        };

        for doc in docs {
            lines.push("- type: latheRecipe".to_string());
            lines.push(format!("  id: {}", recipe_id_for(doc)));
            lines.push(format!("  document: {}", doc.fluent_key));
            lines.push("  categories:".to_string());
            lines.push(format!("    - {}", entry.id));
            lines.push(format!("  completetime: {}", options.recipe_time));
            lines.push(format!(
                "  applyMaterialDiscount: {}",
                options.apply_material_discount
            ));
            lines.push("  materials:".to_string());
            for (name, amount) in &materials {
                lines.push(format!("    {name}: {amount}"));
            }
            lines.push(String::new());
        }
    }

    format!("{}\n", lines.join("\n").trim_end())
}

/// Recipe pack wiring every generated recipe together.
pub fn render_recipe_pack(
    documents: &[DocumentRecord],
    categories: &[CategoryEntry],
    pack_id: &str,
) -> String {
    let groups = group_by_dir(documents);

    let mut lines: Vec<String> = vec![GENERATED_HEADER.to_string()];
    lines.push("- type: latheRecipePack".to_string());
    lines.push(format!("  id: {pack_id}"));
    lines.push("  recipes:".to_string());

    for entry in categories {
        let Some(docs) = groups.get(entry.dir_name.as_str()) else {
            continue;
        };
        lines.push(format!("  # {}", entry.label));
        for doc in docs {
            lines.push(format!("  - {}", recipe_id_for(doc)));
        }
        lines.push(String::new());
    }

    format!("{}\n", lines.join("\n").trim_end())
}

/// Fluent labels for lathe categories.
pub fn render_category_ftl(categories: &[CategoryEntry]) -> String {
    let mut lines: Vec<String> = vec![GENERATED_HEADER.to_string()];
    for entry in categories {
        lines.push(format!("{} = {}", entry.fluent_label_key(), entry.label));
    }
    lines.push(String::new());
    lines.join("\n")
}

/// latheCategory prototype definitions.
pub fn render_category_prototypes(categories: &[CategoryEntry]) -> String {
    let mut lines: Vec<String> = vec![GENERATED_HEADER.to_string()];
    for entry in categories {
        lines.push(String::new());
        lines.push("- type: latheCategory".to_string());
        lines.push(format!("  id: {}", entry.id));
        lines.push(format!("  name: {}", entry.fluent_label_key()));
        lines.push(format!("  order: {}", entry.order));
    }
    lines.push(String::new());
    lines.join("\n")
}

/// Write `content` to `destination`, creating parent directories.
///
/// Returns false without touching the file when the on-disk content is
/// already identical.
pub fn write_if_changed(content: &str, destination: &Path) -> Result<bool, PipelineError> {
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent).map_err(|source| PipelineError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    if destination.exists() {
        let current = std::fs::read_to_string(destination).map_err(|source| PipelineError::Io {
            path: destination.to_path_buf(),
            source,
        })?;
        if current == content {
            return Ok(false);
        }
    }
    std::fs::write(destination, content).map_err(|source| PipelineError::Io {
        path: destination.to_path_buf(),
        source,
    })?;
    Ok(true)
}
