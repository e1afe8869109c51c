use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use queryforge::core::modes::estimate_service_calls;
use queryforge::{
    ConversationTurn, EnhancementMode, QueryClassifier, QueryEnhancer, QueryForgeConfig,
    ServiceGateway,
};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("queryforge=info".parse()?))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut mode_tag: Option<String> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut history_path: Option<PathBuf> = None;
    let mut offline = false;
    let mut classify_only = false;
    let mut stats = false;
    let mut words: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--mode" | "-m" => {
                i += 1;
                mode_tag = Some(args.get(i).context("--mode needs a value")?.clone());
            }
            "--config" | "-c" => {
                i += 1;
                config_path = Some(PathBuf::from(args.get(i).context("--config needs a path")?));
            }
            "--history-file" => {
                i += 1;
                history_path = Some(PathBuf::from(
                    args.get(i).context("--history-file needs a path")?,
                ));
            }
            "--offline" => offline = true,
            "--classify-only" => classify_only = true,
            "--stats" => stats = true,
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => words.push(other.to_string()),
        }
        i += 1;
    }

    let config = QueryForgeConfig::load(config_path.as_deref())?;
    let mode = match mode_tag {
        Some(tag) => EnhancementMode::parse(&tag)?,
        None => config.mode()?,
    };

    if stats {
        let classifier = QueryClassifier::new();
        let results: Vec<_> = words
            .iter()
            .map(|q| json!({ "query": q, "classification": classifier.classify(q) }))
            .collect();
        let output = json!({
            "mode": mode,
            "description": mode.description(),
            "estimate": estimate_service_calls(mode),
            "stats": classifier.stats(&words),
            "queries": results,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let query = words.join(" ");
    if classify_only {
        let classification = QueryClassifier::new().classify(&query);
        println!("{}", serde_json::to_string_pretty(&classification)?);
        return Ok(());
    }

    let history: Vec<ConversationTurn> = match history_path {
        Some(path) => {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading history file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing history file {}", path.display()))?
        }
        None => Vec::new(),
    };

    let gateway = if offline {
        ServiceGateway::offline()
    } else {
        ServiceGateway::from_config(&config)?
    };
    info!("Running in {} mode: {}", mode, mode.description());

    let report = QueryEnhancer::new(gateway, mode).enhance(&query, &history).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn print_help() {
    println!("queryforge - adaptive query classification and enhancement");
    println!();
    println!("USAGE:");
    println!("    queryforge [OPTIONS] QUERY...");
    println!();
    println!("OPTIONS:");
    println!("    -m, --mode <MODE>        speed | balanced | quality (default from config)");
    println!("    -c, --config <FILE>      TOML configuration file");
    println!("        --history-file <F>   JSON array of conversation turns");
    println!("        --offline            Run without LLM or embedding services");
    println!("        --classify-only      Print the rule-based classification only");
    println!("        --stats              Classify each argument as its own query and summarize");
    println!("    -h, --help               Print help");
    println!();
    println!("ENVIRONMENT:");
    println!("    QUERYFORGE_*             Configuration overrides (e.g. QUERYFORGE_LLM_MODEL)");
    println!("    RUST_LOG                 Log filter, logs go to stderr");
}
