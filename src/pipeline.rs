//! Generation Pipeline - Single Entry Point
//!
//! The model is built whole or not at all: every structural error aborts
//! before a single artifact byte is written.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::category::{load_overrides, CategoryOverrides};
use crate::emit::{
    render_bundle_ftl, render_category_ftl, render_category_prototypes, render_documents_yaml,
    render_printer_recipes, render_recipe_pack, write_if_changed, EmitOptions,
};
use crate::hashing::ArtifactManifest;
use crate::model::build_model;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("document {} must begin with a title line (e.g. '# Title')", .path.display())]
    MissingTitle { path: PathBuf },

    #[error("document {} is empty", .path.display())]
    EmptyDocument { path: PathBuf },

    #[error("no paperwork documents found under {}", .root.display())]
    NoDocuments { root: PathBuf },

    #[error("duplicate slug '{slug}': {} and {} normalize to the same name", .first.display(), .second.display())]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("duplicate Fluent key '{key}' produced by {} and {}", .first.display(), .second.display())]
    DuplicateFluentKey {
        key: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("category override '{name}' does not match any discovered directory")]
    UnknownCategoryOverride { name: String },

    #[error("invalid category override file {}: {reason}", .path.display())]
    InvalidOverrideFile { path: PathBuf, reason: String },

    #[error("invalid option '{value}': {reason}")]
    InvalidOption { value: String, reason: String },

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("dangling references:\n{}", .0.join("\n"))]
    DanglingReferences(Vec<String>),
}

/// On-disk locations of every emitted artifact.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub bundle: PathBuf,
    pub documents: PathBuf,
    pub recipes: PathBuf,
    pub pack: PathBuf,
    pub category_ftl: PathBuf,
    pub category_prototypes: PathBuf,
    pub manifest: PathBuf,
}

impl ArtifactPaths {
    /// Conventional layout inside one output directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            bundle: dir.join("doc-printer.ftl"),
            documents: dir.join("documents.yml"),
            recipes: dir.join("printer.yml"),
            pack: dir.join("pack_docs.yml"),
            category_ftl: dir.join("lathe-categories.ftl"),
            category_prototypes: dir.join("categories.yml"),
            manifest: dir.join("manifest.json"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub docs_dir: PathBuf,
    pub category_config: Option<PathBuf>,
    pub emit: EmitOptions,
}

#[derive(Debug, Clone)]
pub struct RenderReport {
    pub document_count: usize,
    pub category_count: usize,
    /// Paths actually rewritten this run; empty means everything was
    /// already up to date.
    pub changed: Vec<PathBuf>,
    pub bundle_hash: String,
}

/// Run the full pipeline: model build, emission, manifest.
///
/// The model build always runs to completion before any write, so a fatal
/// condition never leaves partial output behind.
pub fn render(options: &RenderOptions, paths: &ArtifactPaths) -> Result<RenderReport, PipelineError> {
    let overrides = match &options.category_config {
        Some(path) => load_overrides(path)?,
        None => CategoryOverrides::new(),
    };

    let model = build_model(&options.docs_dir, &overrides)?;

    let bundle = render_bundle_ftl(&model.documents);
    let documents = render_documents_yaml(&model.documents, &model.categories, options.emit.visible);
    let recipes = render_printer_recipes(&model.documents, &model.categories, &options.emit);
    let pack = render_recipe_pack(&model.documents, &model.categories, &options.emit.pack_id);
    let category_ftl = render_category_ftl(&model.categories);
    let category_prototypes = render_category_prototypes(&model.categories);

    let mut manifest = ArtifactManifest::new();
    let outputs = [
        (&bundle, &paths.bundle),
        (&documents, &paths.documents),
        (&recipes, &paths.recipes),
        (&pack, &paths.pack),
        (&category_ftl, &paths.category_ftl),
        (&category_prototypes, &paths.category_prototypes),
    ];
    for (content, path) in &outputs {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        manifest.record(&name, content);
    }
    let (manifest_text, manifest) = manifest.finalize()?;

    let mut changed = Vec::new();
    for (content, path) in &outputs {
        if write_if_changed(content, path)? {
            changed.push((*path).clone());
        }
    }
    if write_if_changed(&manifest_text, &paths.manifest)? {
        changed.push(paths.manifest.clone());
    }

    Ok(RenderReport {
        document_count: model.documents.len(),
        category_count: model.categories.len(),
        changed,
        bundle_hash: manifest.bundle_hash,
    })
}
