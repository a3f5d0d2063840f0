#![allow(clippy::doc_markdown)]
//! `capdex` CLI - User-Agent lookup against a capability database
//!
//! Usage:
//!   `capdex lookup --db browscap.ini "Mozilla/5.0 (X11; Linux x86_64) ..."`
//!   `cat agents.txt | capdex lookup --db browscap.ini`
//!   `capdex stats --db browscap.ini`

use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use capdex_core::{CapdexConfig, Engine};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "capdex")]
#[command(author, version, about = "capdex CLI - User-Agent capability lookup")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to ./capdex.toml when present)
    #[arg(short, long, global = true, env = "CAPDEX_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up User-Agent strings, one JSON object per line
    Lookup {
        /// Capability database (browscap-style INI)
        #[arg(short, long, env = "CAPDEX_DB")]
        db: PathBuf,

        /// Include match phase and candidate count
        #[arg(long)]
        explain: bool,

        /// User-Agent strings; read from stdin, one per line, when omitted
        user_agents: Vec<String>,
    },

    /// Show database version and index statistics
    Stats {
        /// Capability database (browscap-style INI)
        #[arg(short, long, env = "CAPDEX_DB")]
        db: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CapdexConfig::load_from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => CapdexConfig::load()?,
    };
    init_tracing(&config);

    match cli.command {
        Commands::Lookup {
            db,
            explain,
            user_agents,
        } => {
            let engine = open_engine(config, &db)?;
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());

            if user_agents.is_empty() {
                for line in io::stdin().lock().lines() {
                    let line = line.context("reading stdin")?;
                    write_lookup(&mut out, &engine, &line, explain)?;
                }
            } else {
                for ua in &user_agents {
                    write_lookup(&mut out, &engine, ua, explain)?;
                }
            }
            out.flush()?;
        }
        Commands::Stats { db } => {
            let engine = open_engine(config, &db)?;
            let output = json!({
                "database": db.display().to_string(),
                "version": engine.current_version(),
                "stats": engine.stats(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Installs the log subscriber. `RUST_LOG` wins over `logging.level`.
///
/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(config: &CapdexConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn open_engine(config: CapdexConfig, db: &Path) -> anyhow::Result<Engine> {
    let engine = Engine::new(config)?;
    engine
        .initialize_from_path(db)
        .with_context(|| format!("loading capability database {}", db.display()))?;
    Ok(engine)
}

fn write_lookup<W: Write>(
    out: &mut W,
    engine: &Engine,
    ua: &str,
    explain: bool,
) -> anyhow::Result<()> {
    let line = if explain {
        let report = engine.explain(ua);
        json!({
            "user_agent": ua,
            "matched": report.as_ref().is_some_and(|r| r.pattern.is_some()),
            "pattern": report.as_ref().and_then(|r| r.pattern.clone()),
            "phase": report.as_ref().map(|r| r.phase),
            "candidates_tested": report.as_ref().map(|r| r.candidates_tested),
            "attributes": report.and_then(|r| r.attributes),
        })
    } else {
        let attributes = engine.lookup(ua);
        json!({
            "user_agent": ua,
            "matched": attributes.is_some(),
            "attributes": attributes,
        })
    };
    writeln!(out, "{line}")?;
    Ok(())
}
