//! Minimal CLI: compile → (rules | check)
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::model::Schema;
use crate::rules::SchemaDefinition;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile a web-schema file and either print its rule tree or validate candidate documents
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compile and print the rule-tree debug view
    Rules(RulesOut),
    /// compile and validate candidate JSON documents
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
struct SchemaSource {
    /// path to the web-schema JSON file
    #[arg(long, short)]
    schema: PathBuf,
}

#[derive(clap::Parser, Debug)]
struct RulesOut {
    #[command(flatten)]
    schema: SchemaSource,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct CheckArgs {
    #[command(flatten)]
    schema: SchemaSource,

    /// One or more candidate documents. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaSource {
    fn compile(&self) -> anyhow::Result<SchemaDefinition> {
        let source = std::fs::read_to_string(&self.schema)
            .with_context(|| format!("failed to read schema file {}", self.schema.display()))?;
        let ws = crate::path_de::ws_from_str(&source)
            .map_err(|e| anyhow!("failed to parse schema file {}: {e}", self.schema.display()))?;
        let definition = crate::compile::compile(&ws)
            .with_context(|| format!("failed to compile schema {}", self.schema.display()))?;
        Ok(definition)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Rules(target) => {
                let definition = target.schema.compile()?;
                let view = crate::rules::describe(&definition);
                let view_src = serde_json::to_string_pretty(&view)?;
                match target.out.as_ref() {
                    Some(out) => {
                        if let Some(parent) = out.parent() {
                            std::fs::create_dir_all(parent)?;
                        }
                        std::fs::write(out, &view_src)?;
                    }
                    None => println!("{view_src}"),
                }
                Ok(())
            }
            Command::Check(target) => {
                let schema = Schema::new(target.schema.compile()?);
                let source_paths = resolve_file_path_patterns(&target.input)?;

                let mut failed = 0usize;
                let total = source_paths.len();
                for source_path in &source_paths {
                    let source_path_str = source_path.to_string_lossy();
                    let source = std::fs::read_to_string(source_path)
                        .with_context(|| format!("failed to read document {source_path_str}"))?;
                    let document = crate::path_de::value_from_str(&source)
                        .map_err(|e| anyhow!("failed to parse document {source_path_str}: {e}"))?;
                    match schema.validate(&document) {
                        Ok(()) => {
                            println!("{} {source_path_str}", "ok".green());
                        }
                        Err(errors) => {
                            failed += 1;
                            println!("{} {source_path_str}", "FAIL".red().bold());
                            for error in errors {
                                println!("  {}: {}", error.path.yellow(), error.message);
                            }
                        }
                    }
                }
                if failed > 0 {
                    anyhow::bail!("{failed} of {total} documents failed validation");
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                anyhow::bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }
    Ok(out)
}
