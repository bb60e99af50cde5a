//! Trellis CLI - Compile request documents to SQL
//!
//! Usage:
//!   trellis compile --catalog <catalog.toml> --request <request.json> [--dialect <dialect>]
//!   trellis validate --catalog <catalog.toml>
//!
//! Examples:
//!   trellis compile --catalog library.toml --request books.json
//!   trellis compile --catalog library.toml --request books.json --dialect sqlite --explain

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use trellis::catalog::{Catalog, CatalogBuilder, Entity};
use trellis::compiler::QueryCompiler;
use trellis::config::CompilerSettings;
use trellis::request::{FieldTree, QueryArgs};
use trellis::sql::{render_plan, Dialect};

#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "Trellis - compiles nested entity requests into single relational queries")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a request document to SQL
    Compile {
        /// Path to the catalog definition (TOML)
        #[arg(short, long)]
        catalog: PathBuf,

        /// Path to the request document (JSON)
        #[arg(short, long)]
        request: PathBuf,

        /// SQL dialect to generate
        #[arg(short, long, default_value = "postgres")]
        dialect: DialectArg,

        /// Print the compiled plan instead of SQL
        #[arg(long)]
        explain: bool,
    },

    /// Validate a catalog definition without compiling anything
    Validate {
        /// Path to the catalog definition (TOML)
        #[arg(short, long)]
        catalog: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectArg {
    Postgres,
    Mysql,
    Sqlite,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Mysql => Dialect::MySql,
            DialectArg::Sqlite => Dialect::Sqlite,
        }
    }
}

/// On-disk catalog document: a list of entity tables.
#[derive(Deserialize)]
struct CatalogFile {
    entities: Vec<Entity>,
}

/// On-disk request document: root entity, selection, and arguments.
#[derive(Deserialize)]
struct RequestFile {
    entity: String,
    selection: FieldTree,
    #[serde(flatten)]
    args: QueryArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            catalog,
            request,
            dialect,
            explain,
        } => cmd_compile(catalog, request, dialect.into(), explain),
        Commands::Validate { catalog } => cmd_validate(catalog),
    }
}

fn load_catalog(path: &Path) -> Result<Catalog, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let file: CatalogFile =
        toml::from_str(&content).map_err(|e| format!("invalid catalog: {}", e))?;
    let mut builder = CatalogBuilder::new();
    for entity in file.entities {
        builder = builder.entity(entity);
    }
    builder.build().map_err(|e| e.to_string())
}

fn cmd_compile(
    catalog_path: PathBuf,
    request_path: PathBuf,
    dialect: Dialect,
    explain: bool,
) -> ExitCode {
    let catalog = match load_catalog(&catalog_path) {
        Ok(catalog) => catalog,
        Err(message) => {
            eprintln!("error: {}", message);
            return ExitCode::FAILURE;
        }
    };

    let request: RequestFile = match fs::read_to_string(&request_path)
        .map_err(|e| format!("cannot read {}: {}", request_path.display(), e))
        .and_then(|content| {
            serde_json::from_str(&content).map_err(|e| format!("invalid request: {}", e))
        }) {
        Ok(request) => request,
        Err(message) => {
            eprintln!("error: {}", message);
            return ExitCode::FAILURE;
        }
    };

    let settings = CompilerSettings {
        dialect,
        ..CompilerSettings::default()
    };
    let compiler = QueryCompiler::with_settings(&catalog, settings);
    let plan = match compiler.compile(&request.entity, &request.selection, &request.args) {
        Ok(plan) => plan,
        Err(error) => {
            eprintln!("error: {}", error);
            return ExitCode::FAILURE;
        }
    };

    if explain {
        match serde_json::to_string_pretty(&plan) {
            Ok(json) => println!("{}", json),
            Err(error) => {
                eprintln!("error: {}", error);
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    let rendered = render_plan(&plan, &catalog, dialect);
    println!("{}", rendered.sql);
    if let Some(count_sql) = rendered.count_sql {
        println!();
        println!("-- total count");
        println!("{}", count_sql);
    }
    ExitCode::SUCCESS
}

fn cmd_validate(catalog_path: PathBuf) -> ExitCode {
    match load_catalog(&catalog_path) {
        Ok(catalog) => {
            println!("ok: {} entities", catalog.len());
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}
