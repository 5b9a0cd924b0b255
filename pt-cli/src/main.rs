//! pt-cli - pt-botの運用ツール
//!
//! Discordを介さずにデータディレクトリのカタログを検査したり、
//! 見積もりを計算する。

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use pt_bot::catalog::{self, Catalog, PRICES_FILE};
use pt_bot::pricing::{compute_invoice, format_money, ClientType};
use std::collections::BTreeMap;
use std::path::Path;

/// pt-bot CLI
#[derive(Parser)]
#[command(name = "pt-cli")]
#[command(about = "CLI tool for pt-bot", long_about = None)]
struct Cli {
    /// Data directory holding prices.json (default: data)
    #[arg(short, long, env = "PT_DATA_DIR", default_value = "data")]
    data_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the price catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },
    /// Compute an offline quote
    Quote {
        /// Client type (normal, lspd, ems)
        #[arg(short, long, default_value = "normal")]
        client: String,
        /// Items as NAME=QTY pairs, e.g. "Full Repair=2"
        items: Vec<String>,
    },
}

#[derive(Subcommand)]
enum CatalogCommands {
    /// List all catalog items by category
    List,
    /// Report malformed price entries
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Catalog { command } => match command {
            CatalogCommands::List => catalog_list(&cli.data_dir).await,
            CatalogCommands::Check => catalog_check(&cli.data_dir).await,
        },
        Commands::Quote { client, items } => quote(&cli.data_dir, &client, &items).await,
    }
}

/// カタログをカテゴリごとに一覧表示
async fn catalog_list(data_dir: &str) -> Result<()> {
    let loaded = Catalog::load(data_dir).await?;

    if loaded.is_empty() {
        println!("{}", "Catalog is empty.".yellow());
        return Ok(());
    }

    for category in catalog::category_names() {
        println!("{}", category.bold());
        for item in loaded.items_in_category(category) {
            if item.available {
                println!(
                    "  {} — ${}",
                    item.name,
                    format_money(item.unit_price).green()
                );
            } else {
                println!("  {} — {}", item.name, "N/A".red());
            }
        }
    }

    Ok(())
}

/// 価格として解釈できないエントリを報告
async fn catalog_check(data_dir: &str) -> Result<()> {
    let path = Path::new(data_dir).join(PRICES_FILE);
    if !path.exists() {
        println!("{}", format!("{} not found.", path.display()).yellow());
        return Ok(());
    }

    let content = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    let Some(object) = value.as_object() else {
        bail!("{} must contain a JSON object", path.display());
    };

    let mut malformed = 0;
    for (name, raw) in object {
        if raw.as_u64().is_none() {
            malformed += 1;
            println!(
                "{} {}: {} (will be listed as unavailable)",
                "warning:".yellow(),
                name,
                raw
            );
        }
    }

    if malformed == 0 {
        println!("{} ({} items)", "All entries are well-formed.".green(), object.len());
    } else {
        println!("{} malformed of {} entries.", malformed, object.len());
    }

    Ok(())
}

/// オフラインで見積もりを計算
async fn quote(data_dir: &str, client: &str, items: &[String]) -> Result<()> {
    let Some(client_type) = ClientType::from_value(client) else {
        bail!("unknown client type {:?} (expected normal, lspd or ems)", client);
    };
    if items.is_empty() {
        bail!("no items given (expected NAME=QTY pairs)");
    }

    let loaded = Catalog::load(data_dir).await?;

    let mut quantities: BTreeMap<String, u32> = BTreeMap::new();
    for pair in items {
        let (name, qty) = match pair.split_once('=') {
            Some((name, qty)) => (
                name.trim().to_string(),
                qty.trim()
                    .parse::<u32>()
                    .with_context(|| format!("invalid quantity in {:?}", pair))?,
            ),
            None => (pair.trim().to_string(), 1),
        };
        if qty == 0 {
            bail!("quantity must be at least 1 in {:?}", pair);
        }
        if !loaded.is_available(&name) {
            println!(
                "{} {:?} is not available in the catalog",
                "warning:".yellow(),
                name
            );
        }
        quantities.insert(name, qty);
    }

    let invoice = compute_invoice(&loaded, &quantities, client_type);
    for line in &invoice.lines {
        println!("{}", line.format());
    }
    println!(
        "{} ${} ({})",
        "Total:".bold(),
        format_money(invoice.total).green(),
        client_type.as_str().to_uppercase()
    );

    Ok(())
}
