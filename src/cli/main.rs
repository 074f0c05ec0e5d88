use alarm_query::config::Config;
use alarm_query::search::{FieldClassifier, QueryCompiler, SearchRequest};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "alarm-query-cli")]
#[command(about = "Alarm search form compiler", long_about = None)]
struct Cli {
    /// Configuration file overriding the built-in defaults
    #[arg(short, long, env = "CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a search form JSON file and print the engine document
    Compile {
        #[arg(value_name = "FORM_FILE")]
        file: PathBuf,

        /// Compile as a bulk action (requires aggregatedTerms) and print the bare query
        #[arg(short, long)]
        bulk: bool,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Print the query fingerprint instead of the document
        #[arg(short, long, conflicts_with = "bulk")]
        fingerprint: bool,
    },

    /// List searchable fields with their kind and constraint
    Fields,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => Config::load_from(&path.to_string_lossy()),
        None => Config::load(),
    }
    .context("failed to load configuration")?;

    match cli.command {
        Commands::Compile {
            file,
            bulk,
            pretty,
            fingerprint,
        } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let form: serde_json::Value =
                serde_json::from_str(&raw).context("form file is not valid JSON")?;

            let compiler = QueryCompiler::from_config(&config.query);
            let request = SearchRequest::from_json(form)?;

            let document = if bulk {
                compiler
                    .compile_bulk_action(&request.form, &request.pagination, &request.sort)?
                    .to_json()
            } else {
                let compiled = compiler.compile_request(&request)?;
                if fingerprint {
                    println!("{}", compiled.fingerprint());
                    return Ok(());
                }
                compiled.to_json()
            };

            if pretty {
                println!("{}", serde_json::to_string_pretty(&document)?);
            } else {
                println!("{}", document);
            }
        }

        Commands::Fields => {
            println!("{:<16} {:<12} CONSTRAINT", "FIELD", "KIND");
            for (name, spec) in FieldClassifier::entries() {
                println!(
                    "{:<16} {:<12} {}",
                    name,
                    spec.kind.name(),
                    spec.constraint.map_or("-", |c| c.name())
                );
            }
        }
    }

    Ok(())
}
