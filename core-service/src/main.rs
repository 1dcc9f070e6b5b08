//! VectorScope - Main Entry Point (CLI)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;

use vectorscope_core::constants::{APP_NAME, APP_VERSION};
use vectorscope_core::logic::audit::{self, AuditRecord};
use vectorscope_core::logic::storage::KEY_LABEL;
use vectorscope_core::{
    options_for, Attack, AttackKind, AttackOptions, EngineConfig, Metadata, TemplateRegistry, VectorRecord,
    VectorStore,
};

/// Label of stored samples when `--label` is not given
const DEFAULT_LABEL: &str = "research_sample";

#[derive(Parser, Debug)]
#[command(name = "vectorscope", version = APP_VERSION, about = "Embedding inversion attack engine")]
struct Cli {
    /// Vector database file (overrides VECTORSCOPE_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Embed and store a text
    Store {
        text: String,
        #[arg(long, default_value = DEFAULT_LABEL)]
        label: String,
    },
    /// Attack a stored vector
    Attack {
        /// Defaults to the most recently stored vector
        #[arg(long = "vector-id")]
        vector_id: Option<String>,
        #[arg(long = "type", default_value = "ssn")]
        data_type: String,
        #[arg(long, value_enum, default_value_t = MethodArg::All)]
        method: MethodArg,
        #[arg(long = "sample-size")]
        sample_size: Option<usize>,
        #[arg(long = "beam-width")]
        beam_width: Option<usize>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// List stored vectors (id, label, length; never the text)
    List,
    /// Number of stored vectors
    Count,
    /// Delete every stored vector
    Clear,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum MethodArg {
    Similarity,
    Incremental,
    Reconstruction,
    Pattern,
    /// Similarity, reconstruction and pattern (incremental only on request)
    All,
}

impl MethodArg {
    fn kinds(self) -> Vec<AttackKind> {
        match self {
            MethodArg::Similarity => vec![AttackKind::Similarity],
            MethodArg::Incremental => vec![AttackKind::Incremental],
            MethodArg::Reconstruction => vec![AttackKind::Reconstruction],
            MethodArg::Pattern => vec![AttackKind::Pattern],
            MethodArg::All => vec![AttackKind::Similarity, AttackKind::Reconstruction, AttackKind::Pattern],
        }
    }
}

fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = EngineConfig::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    log::info!("Starting {} v{}...", APP_NAME, APP_VERSION);

    let store = Arc::new(
        VectorStore::from_config(&config)
            .with_context(|| format!("failed to open vector store at {:?}", config.db_path))?,
    );

    match cli.command {
        Commands::Store { text, label } => {
            let mut metadata = Metadata::new();
            metadata.insert(KEY_LABEL.to_string(), label.into());
            let id = store.store_text(&text, metadata)?;
            println!("{}", id);
        }
        Commands::Attack {
            vector_id,
            data_type,
            method,
            sample_size,
            beam_width,
            json,
        } => {
            let record = match vector_id {
                Some(id) => store.get_record(&id)?,
                None => match store.latest()? {
                    Some(record) => record,
                    None => bail!("No vectors stored; run `vectorscope store <text>` first"),
                },
            };
            let options = AttackOptions {
                data_type,
                sample_size,
                beam_width,
                ..AttackOptions::default()
            };
            run_attacks(&config, store, &record, method, &options, json)?;
        }
        Commands::List => {
            for record in store.get_all_vectors()? {
                let length = record.text_length().map_or_else(|| "-".to_string(), |n| n.to_string());
                println!(
                    "{}  {}  {:<16}  {} chars",
                    record.id,
                    record.created_at.format("%Y-%m-%d %H:%M:%S"),
                    record.label().unwrap_or("-"),
                    length
                );
            }
        }
        Commands::Count => {
            println!("{}", store.count()?);
        }
        Commands::Clear => {
            store.clear()?;
            println!("Cleared");
        }
    }

    Ok(())
}

fn run_attacks(
    config: &EngineConfig,
    store: Arc<VectorStore>,
    record: &VectorRecord,
    method: MethodArg,
    base: &AttackOptions,
    as_json: bool,
) -> Result<()> {
    let templates = Arc::new(TemplateRegistry::builtin());
    let audit_log = audit::from_config(config)?;
    let ground_truth = record.original_text();

    log::info!("Attacking vector {} ({} dimensions)", record.id, record.embedding.len());

    for kind in method.kinds() {
        let attack = Attack::build(kind, store.clone(), templates.clone(), config)
            .with_context(|| format!("failed to prepare {} attack", kind))?;
        let options = options_for(kind, base);
        log::info!("Running {} ({})...", attack.name(), kind);
        let result = attack
            .execute(&record.embedding, &options)
            .with_context(|| format!("{} attack failed", kind))?;

        // Pattern output is a category, not a reconstruction
        let evaluation = match (kind, ground_truth) {
            (AttackKind::Pattern, _) | (_, None) => None,
            (_, Some(truth)) => Some(attack.evaluate(result.extracted_text.as_deref().unwrap_or(""), truth)),
        };

        if let Some(writer) = &audit_log {
            let entry = AuditRecord::from_result(Some(&record.id), &options.data_type, &result, evaluation.as_ref());
            if let Err(e) = writer.append(&entry) {
                log::warn!("Failed to write audit record: {}", e);
            }
        }

        if as_json {
            let report = json!({ "result": result, "evaluation": evaluation });
            println!("{}", serde_json::to_string_pretty(&report)?);
            continue;
        }

        println!("{}", result);
        match &evaluation {
            Some(eval) if eval.exact_match => println!("  ✓ Exact match!"),
            Some(eval) => println!("  Partial accuracy: {:.2}%", eval.partial_accuracy * 100.0),
            None => {}
        }
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_skips_incremental() {
        let kinds = MethodArg::All.kinds();
        assert_eq!(
            kinds,
            vec![AttackKind::Similarity, AttackKind::Reconstruction, AttackKind::Pattern]
        );
        assert_eq!(MethodArg::Incremental.kinds(), vec![AttackKind::Incremental]);
    }

    #[test]
    fn test_store_label_defaults_to_research_sample() {
        let cli = Cli::try_parse_from(["vectorscope", "store", "SSN: 123-45-6789"]).unwrap();
        match cli.command {
            Commands::Store { label, .. } => assert_eq!(label, "research_sample"),
            other => panic!("Expected store command, got {:?}", other),
        }

        let cli = Cli::try_parse_from(["vectorscope", "store", "x", "--label", "mine"]).unwrap();
        assert!(matches!(cli.command, Commands::Store { ref label, .. } if label == "mine"));
    }

    #[test]
    fn test_attack_method_parsing() {
        let cli = Cli::try_parse_from(["vectorscope", "attack", "--method", "incremental", "--type", "creditcard"]).unwrap();
        match cli.command {
            Commands::Attack { method, data_type, .. } => {
                assert_eq!(method, MethodArg::Incremental);
                assert_eq!(data_type, "creditcard");
            }
            other => panic!("Expected attack command, got {:?}", other),
        }
    }
}
