//! Abacate CLI - document and CEP tools for checkout development.
//!
//! # Usage
//!
//! ```bash
//! # Generate five CPFs starting with 123
//! abacate document generate cpf --seed 123 --count 5
//!
//! # Validate and format a CNPJ
//! abacate document validate 11222333000181
//! abacate document format 11222333000181
//!
//! # Look up the address of a CEP
//! abacate cep lookup 01001-000
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser)]
#[command(name = "abacate")]
#[command(author, version, about = "Abacate checkout tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// CPF and CNPJ tools
    Document {
        #[command(subcommand)]
        action: DocumentAction,
    },
    /// CEP tools
    Cep {
        #[command(subcommand)]
        action: CepAction,
    },
}

/// Which document to generate.
#[derive(Clone, Copy, ValueEnum)]
enum DocumentKindArg {
    Cpf,
    Cnpj,
}

#[derive(Subcommand)]
enum DocumentAction {
    /// Generate valid documents for test accounts
    Generate {
        kind: DocumentKindArg,

        /// Leading digits to keep
        #[arg(short, long, default_value = "")]
        seed: String,

        /// How many documents to generate
        #[arg(short, long, default_value_t = 1)]
        count: usize,

        /// Print bare digits instead of the punctuated form
        #[arg(long)]
        digits: bool,
    },
    /// Check a CPF or CNPJ; exits non-zero when invalid
    Validate { input: String },
    /// Print a CPF or CNPJ in its punctuated form
    Format { input: String },
}

#[derive(Subcommand)]
enum CepAction {
    /// Print the address of a CEP
    Lookup {
        cep: String,

        /// CEP service base URL
        #[arg(long, env = "CEP_BASE_URL", default_value = "https://brasilapi.com.br")]
        base_url: String,

        /// Request timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Document { action } => match action {
            DocumentAction::Generate {
                kind,
                seed,
                count,
                digits,
            } => {
                let kind = match kind {
                    DocumentKindArg::Cpf => abacate_core::DocumentKind::Cpf,
                    DocumentKindArg::Cnpj => abacate_core::DocumentKind::Cnpj,
                };
                for document in commands::document::generate(kind, &seed, count) {
                    if digits {
                        println!("{}", document.as_str());
                    } else {
                        println!("{document}");
                    }
                }
            }
            DocumentAction::Validate { input } => {
                let document = commands::document::validate(&input)?;
                println!("valid {}: {}", document.kind(), document.formatted());
            }
            DocumentAction::Format { input } => {
                println!("{}", commands::document::format(&input));
            }
        },
        Commands::Cep { action } => match action {
            CepAction::Lookup {
                cep,
                base_url,
                timeout,
            } => {
                let address = commands::cep::lookup(&cep, &base_url, timeout).await?;
                for line in commands::cep::describe(&address) {
                    println!("{line}");
                }
            }
        },
    }
    Ok(())
}
