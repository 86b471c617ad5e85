use anyhow::{bail, Result};
use autopost_gateway::{GatewayConfig, SelectionMode, StockTag, TopicClassifier};
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "autopost-gateway", version, about = "Stock tagging for trending topics")]
struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tags the classifier picks for a topic title
    Classify { title: String },
    /// Compose trending and/or manual tags
    Select {
        #[arg(long, default_value_t = SelectionMode::Trending)]
        mode: SelectionMode,
        #[arg(long = "code", help = "Manually picked stock code (repeatable)")]
        codes: Vec<String>,
        #[arg(default_value = "")]
        title: String,
    },
    /// Look up one stock code in the catalog
    Lookup { code: String },
    /// List the loaded rules in evaluation order
    Rules,
}

#[derive(Serialize)]
struct JsonOut<T: Serialize> {
    ok: bool,
    data: T,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = GatewayConfig::from_env();
    config.init_logging()?;

    let classifier = config.build_classifier()?;

    match cli.command {
        Commands::Classify { title } => {
            print_tags(cli.json, &classifier.classify(&title))?;
        }
        Commands::Select { mode, codes, title } => {
            print_tags(cli.json, &classifier.select(mode, &title, &codes))?;
        }
        Commands::Lookup { code } => match classifier.catalog_entry(&code) {
            Some(entry) => {
                if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&JsonOut { ok: true, data: entry })?
                    );
                } else {
                    println!("{}\t{}", entry.code, entry.name);
                }
            }
            None => bail!("stock code {} is not in the catalog", code),
        },
        Commands::Rules => print_rules(cli.json, &classifier)?,
    }

    Ok(())
}

fn print_tags(json: bool, tags: &[StockTag]) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data: tags })?
        );
        return Ok(());
    }

    if tags.is_empty() {
        println!("(no tags)");
    }
    for tag in tags {
        println!("{}\t{}\t{}", tag.code, tag.name, tag.origin.as_str());
    }
    Ok(())
}

fn print_rules(json: bool, classifier: &TopicClassifier) -> Result<()> {
    #[derive(Serialize)]
    struct RuleOut<'a> {
        id: &'a str,
        kind: autopost_gateway::RuleKind,
        emits: Vec<&'a str>,
    }

    let rules: Vec<RuleOut> = classifier
        .rule_summaries()
        .into_iter()
        .map(|(id, kind, emits)| RuleOut { id, kind, emits })
        .collect();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data: rules })?
        );
    } else {
        for rule in rules {
            println!("{:?}\t{}\t{}", rule.kind, rule.id, rule.emits.join(","));
        }
    }
    Ok(())
}
