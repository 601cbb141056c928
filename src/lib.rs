//! PaperForge Core - Paperwork Production Compiler
//!
//! # The Five Laws (Non-Negotiable)
//! 1. Documents Are Truth
//! 2. Keys Are Deterministic
//! 3. The Model Is Built Whole Or Not At All
//! 4. Output Is Byte-Stable
//! 5. Artifacts Cross-Check Each Other

pub mod category;
pub mod check;
pub mod document;
pub mod emit;
pub mod hashing;
pub mod model;
pub mod pipeline;
pub mod verify;

pub use category::{CategoryEntry, CategoryOverride, CategoryOverrides};
pub use check::{check_documents, CheckFinding, CheckOptions, CheckReport, FindingKind};
pub use document::{DocumentRecord, FIELD_MARKERS, FLUENT_KEY_PREFIX, STAMP_MARKER};
pub use emit::{EmitOptions, FTL_PREFIX_MARKER, GENERATED_HEADER};
pub use hashing::{canonical_json, sha256_hex, ArtifactManifest};
pub use model::{build_model, DocumentModel};
pub use pipeline::{render, ArtifactPaths, PipelineError, RenderOptions, RenderReport};
pub use verify::verify_bundle;

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
