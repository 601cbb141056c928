//! PaperForge CLI
//!
//! Commands: render, check, verify
//! Returns non-zero on any fatal pipeline condition

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use paperforge_core::{
    build_model, check_documents, emit,
    pipeline::{render, ArtifactPaths, PipelineError, RenderOptions},
    verify_bundle, CategoryOverrides, CheckOptions, EmitOptions,
};

#[derive(Parser)]
#[command(name = "paperforge-cli")]
#[command(about = "PaperForge CLI - Paperwork Production Compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate all artifacts from the paperwork tree
    Render {
        /// Directory containing paperwork source documents
        #[arg(long, default_value = "docs")]
        docs_dir: PathBuf,

        /// Directory receiving the generated artifacts
        #[arg(long, default_value = "dist")]
        out_dir: PathBuf,

        /// Optional JSON file with per-category overrides
        #[arg(long)]
        category_config: Option<PathBuf>,

        /// Lathe material requirement (defaults to SheetPrinter=100)
        #[arg(long, value_name = "NAME=AMOUNT")]
        material: Vec<String>,

        /// Completion time for generated lathe recipes
        #[arg(long, default_value_t = 2)]
        recipe_time: u32,

        /// Identifier for the generated recipe pack
        #[arg(long, default_value = "PaperworkDocsAuto")]
        pack_id: String,

        /// Emit documents as visible instead of hidden
        #[arg(long)]
        show_in_spawn_menu: bool,

        /// Toggle applyMaterialDiscount for generated recipes
        #[arg(long)]
        apply_material_discount: bool,
    },

    /// Run sanity checks against the paperwork tree
    Check {
        #[arg(long, default_value = "docs")]
        docs_dir: PathBuf,

        /// Treat duplicate body content as an error
        #[arg(long)]
        strict_duplicates: bool,

        /// Fail when paperwork that requires validation lacks a stamp section
        #[arg(long)]
        strict_stamps: bool,
    },

    /// Verify that emitted artifacts stay internally consistent
    Verify {
        #[arg(long, default_value = "dist")]
        out_dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            docs_dir,
            out_dir,
            category_config,
            material,
            recipe_time,
            pack_id,
            show_in_spawn_menu,
            apply_material_discount,
        } => {
            let materials = match emit::parse_materials(&material) {
                Ok(m) => m,
                Err(e) => {
                    eprintln!("error: {e}");
                    return ExitCode::from(2);
                }
            };
            let options = RenderOptions {
                docs_dir,
                category_config,
                emit: EmitOptions {
                    pack_id,
                    recipe_time,
                    materials,
                    apply_material_discount,
                    visible: show_in_spawn_menu,
                },
            };
            let paths = ArtifactPaths::in_dir(&out_dir);

            match render(&options, &paths) {
                Ok(report) => {
                    if report.changed.is_empty() {
                        println!(
                            "Up to date: {} document(s), {} categor(ies), bundle {}",
                            report.document_count, report.category_count, report.bundle_hash
                        );
                    } else {
                        let joined = report
                            .changed
                            .iter()
                            .map(|p| p.display().to_string())
                            .collect::<Vec<_>>()
                            .join(", ");
                        println!(
                            "Updated {} from {} document(s), bundle {}",
                            joined, report.document_count, report.bundle_hash
                        );
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("error: {e}");
                    ExitCode::from(2)
                }
            }
        }

        Commands::Check {
            docs_dir,
            strict_duplicates,
            strict_stamps,
        } => {
            let model = match build_model(&docs_dir, &CategoryOverrides::new()) {
                Ok(m) => m,
                Err(e) => {
                    eprintln!("error: {e}");
                    return ExitCode::from(2);
                }
            };
            let options = CheckOptions {
                strict_duplicates,
                strict_stamps,
                ..Default::default()
            };
            let report = check_documents(&model, &options);

            for finding in &report.warnings {
                println!("warning: {}", finding.message);
            }
            for finding in &report.errors {
                eprintln!("error: {}", finding.message);
            }

            if report.passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }

        Commands::Verify { out_dir } => {
            let paths = ArtifactPaths::in_dir(&out_dir);
            match verify_bundle(&paths) {
                Ok(()) => {
                    println!("Bundle outputs verified: all references resolved.");
                    ExitCode::SUCCESS
                }
                Err(PipelineError::DanglingReferences(issues)) => {
                    for issue in issues {
                        eprintln!("error: {issue}");
                    }
                    ExitCode::FAILURE
                }
                Err(e) => {
                    eprintln!("error: {e}");
                    ExitCode::from(2)
                }
            }
        }
    }
}
