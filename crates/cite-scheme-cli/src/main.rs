/*
 * main.rs
 * Copyright (c) 2025 Posit, PBC
 */

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cite_scheme::SPAN_SEPARATOR;

#[derive(Parser, Debug)]
#[command(name = "cite-scheme")]
#[command(about = "Parse, render, order and check structured citations")]
#[command(version)]
struct Cli {
    /// Scheme settings file (JSON, or YAML with a .yaml/.yml extension)
    #[arg(long, value_name = "FILE")]
    schemes: PathBuf,

    /// Scheme for citations without an @scheme: prefix
    #[arg(long, value_name = "ID")]
    scheme: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse citations and print them as JSON
    Parse {
        #[arg(required = true)]
        texts: Vec<String>,
    },

    /// Render a JSON array of citations and spans as text
    Render {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Sort citations and spans, one per line
    Sort {
        #[arg(required = true)]
        texts: Vec<String>,

        /// Turn spans without an end into plain citations
        #[arg(long)]
        compact: bool,
    },

    /// Parse a span and print it as JSON
    Span {
        text: String,

        /// Separator between the two ends
        #[arg(long, default_value = SPAN_SEPARATOR)]
        separator: String,
    },

    /// Print the domain of a step, optionally given a partial citation
    Domain {
        step: String,
        text: Option<String>,
    },

    /// Validate citations against their schemes
    Check {
        #[arg(required = true)]
        texts: Vec<String>,

        /// Output results as JSONL
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cite_scheme=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let registry = commands::load_registry(&cli.schemes)?;
    let scheme = cli.scheme.as_deref();

    match cli.command {
        Commands::Parse { texts } => {
            println!("{}", commands::parse(&registry, &texts, scheme)?);
        }
        Commands::Render { file } => {
            for line in commands::render(&registry, &file)? {
                println!("{}", line);
            }
        }
        Commands::Sort { texts, compact } => {
            for line in commands::sort(&registry, &texts, scheme, compact)? {
                println!("{}", line);
            }
        }
        Commands::Span { text, separator } => {
            println!("{}", commands::span(&registry, &text, &separator, scheme)?);
        }
        Commands::Domain { step, text } => {
            println!("{}", commands::domain(&registry, &step, text.as_deref(), scheme)?);
        }
        Commands::Check { texts, json } => {
            let reports = commands::check(&registry, &texts, scheme)?;
            for report in &reports {
                if json {
                    println!("{}", serde_json::to_string(report)?);
                } else if report.is_valid() {
                    println!("{} {}", "✓".green(), report.text);
                } else {
                    println!("{} {}", "✗".red(), report.text);
                    for violation in &report.violations {
                        println!("    {}", violation);
                    }
                }
            }
            if reports.iter().any(|r| !r.is_valid()) {
                process::exit(1);
            }
        }
    }
    Ok(())
}
