use ai_likelihood::services::config_store::{AppConfig, ConfigStore};
use ai_likelihood::services::providers::InferenceClient;
use ai_likelihood::services::text_processor::RuleNormalizer;
use ai_likelihood::{init_logging, startup_elapsed_ms, Analyzer, CallSettings};
use anyhow::{Context, Result};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const USAGE: &str = "Usage:\n  ai-likelihood <path|-> [--endpoint <url>] [--config <config.json>] [--out <json_path>] [--pretty]\n\nNotes:\n  - `-` reads the text from stdin.\n  - The endpoint may also come from the config file or AI_LIKELIHOOD_ENDPOINT.\n  - Logs go to stderr and a timestamped file (AI_LIKELIHOOD_LOG_DIR, AI_LIKELIHOOD_DISABLE_FILE_LOG=1).";

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("read stdin failed")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("read file failed: {}", path))
}

fn load_config(path: Option<String>) -> Result<AppConfig> {
    let store = match path {
        Some(p) => ConfigStore::from_file(PathBuf::from(p)),
        None => match ConfigStore::default_config_dir() {
            Some(dir) => ConfigStore::new(dir),
            None => return Ok(AppConfig::default()),
        },
    };
    let config = store
        .load()
        .with_context(|| format!("load config failed: {}", store.config_file().display()))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || has_flag(&args, "--help") || has_flag(&args, "-h") {
        eprintln!("{}", USAGE);
        return Ok(());
    }

    init_logging();

    let input = args[1].clone();
    let pretty = has_flag(&args, "--pretty");
    let out_path = parse_arg_value(&args, "--out");

    let mut config = load_config(parse_arg_value(&args, "--config"))?;
    if let Some(endpoint) = parse_arg_value(&args, "--endpoint") {
        config.inference.endpoint = Some(endpoint);
    }

    let text = read_input(&input)?;
    let client = Arc::new(InferenceClient::from_config(&config.inference)?);
    info!(
        endpoint = client.base_url(),
        startup_ms = startup_elapsed_ms(),
        "cli.ready"
    );

    let analyzer = Analyzer::new(
        RuleNormalizer,
        client.clone(),
        client,
        config.profile,
        CallSettings::from(&config.inference),
    )?;

    let result = analyzer.analyze(&text).await?;

    let json = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };

    match out_path {
        Some(out_path) => {
            std::fs::write(&out_path, json).with_context(|| format!("write out failed: {}", out_path))?;
            eprintln!("Wrote JSON: {}", out_path);
        }
        None => println!("{}", json),
    }

    if !result.is_reliable {
        eprintln!(
            "note: result flagged unreliable ({} text, {} chars)",
            result.modality.as_str(),
            text.chars().count()
        );
    }
    Ok(())
}
