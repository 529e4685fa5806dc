//! quarry: compile and run serialized query trees.
//!
//! # Usage
//!
//! ```bash
//! # Compile a JSON AST for MySQL
//! quarry compile query.json --dialect mysql
//!
//! # Run it
//! QUARRY_DATABASE_URL=sqlite://app.db quarry exec query.json
//!
//! # Dialect reference
//! quarry dialects
//! ```

use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use quarry::config::DATABASE_URL_ENV;
use quarry::driver::{QueryResult, Row};
use quarry::prelude::*;
use quarry::transpiler::{IgnoreSpelling, PaginationStyle};

#[derive(Parser)]
#[command(name = "quarry")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compile and execute quarry query trees", long_about = None)]
#[command(after_help = "EXAMPLES:
    quarry compile query.json --dialect mssql
    cat query.json | quarry compile - --format json
    quarry exec query.json --database-url sqlite://app.db
    quarry dialects")]
struct Cli {
    /// Log runtime events (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a JSON AST into SQL
    Compile {
        /// File holding the AST, `-` for stdin
        #[arg(default_value = "-")]
        input: String,

        #[arg(short, long, default_value = "postgres")]
        dialect: Dialect,

        /// Qualify unqualified tables with this schema
        #[arg(long)]
        schema: Option<String>,

        #[arg(short, long, value_enum, default_value = "sql")]
        format: CompileFormat,
    },
    /// Execute a JSON AST against a database
    Exec {
        /// File holding the AST, `-` for stdin
        #[arg(default_value = "-")]
        input: String,

        #[arg(long, env = DATABASE_URL_ENV)]
        database_url: Option<String>,

        /// Configuration file (defaults to the user config directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the SQL instead of running it
        #[arg(long)]
        dry_run: bool,

        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Show how each dialect renders the dialect-specific parts of SQL
    Dialects,
}

#[derive(Clone, ValueEnum)]
enum CompileFormat {
    /// SQL text followed by the parameters
    Sql,
    /// The compiled query as JSON
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = match cli.command {
        Commands::Compile {
            input,
            dialect,
            schema,
            format,
        } => compile_command(&input, dialect, schema.as_deref(), format),
        Commands::Exec {
            input,
            database_url,
            config,
            dry_run,
            format,
        } => exec_command(&input, database_url, config, dry_run, format).await,
        Commands::Dialects => {
            show_dialects();
            Ok(())
        }
    };

    if let Err(e) = outcome {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "quarry=debug" } else { "quarry=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_node(input: &str) -> Result<OperationNode> {
    let source = if input == "-" {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("failed to read the AST from stdin")?;
        source
    } else {
        std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input))?
    };
    serde_json::from_str(&source).context("input is not a serialized query tree")
}

fn compile_command(
    input: &str,
    dialect: Dialect,
    schema: Option<&str>,
    format: CompileFormat,
) -> Result<()> {
    let node = read_node(input)?;
    let db = match schema {
        Some(schema) => Quarry::offline(dialect).with_schema(schema),
        None => Quarry::offline(dialect),
    };
    let compiled = db.compile_node(&node)?;

    match format {
        CompileFormat::Json => println!("{}", serde_json::to_string_pretty(&compiled)?),
        CompileFormat::Sql => print_compiled(&compiled),
    }
    Ok(())
}

fn print_compiled(compiled: &CompiledQuery) {
    println!("{}", compiled.sql.white());
    if !compiled.parameters.is_empty() {
        println!();
        println!("{}", "Parameters:".cyan());
        for (i, parameter) in compiled.parameters.iter().enumerate() {
            println!("  {} = {}", (i + 1).to_string().dimmed(), parameter.to_string().yellow());
        }
    }
}

async fn exec_command(
    input: &str,
    database_url: Option<String>,
    config: Option<PathBuf>,
    dry_run: bool,
    format: OutputFormat,
) -> Result<()> {
    let node = read_node(input)?;
    let mut config = QuarryConfig::load(config.as_deref())?;
    if let Some(url) = database_url {
        config.database_url = Some(url);
    }

    if dry_run {
        let db = Quarry::offline(config.resolved_dialect()?);
        print_compiled(&db.compile_node(&node)?);
        return Ok(());
    }

    let db = Quarry::from_config(&config)?;
    tracing::debug!(dialect = %db.dialect(), "connected");
    let outcome = db.execute_node(&node).await;
    db.destroy().await?;
    print_result(&outcome?, &format)
}

fn print_result(result: &QueryResult, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputFormat::Table if result.rows.is_empty() => match result.num_affected_rows {
            Some(affected) => println!("{} {} row(s) affected", "✓".green(), affected),
            None => println!("{}", "(no results)".dimmed()),
        },
        OutputFormat::Table => print_table(&result.rows),
    }
    Ok(())
}

fn print_table(rows: &[Row]) {
    let columns: Vec<&String> = rows
        .iter()
        .flat_map(|row| row.keys())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut widths: HashMap<&String, usize> = columns.iter().map(|c| (*c, c.len())).collect();
    for row in rows {
        for (column, value) in row {
            if let Some(width) = widths.get_mut(column) {
                *width = (*width).max(cell(value).len());
            }
        }
    }

    let header: Vec<String> = columns
        .iter()
        .map(|c| format!("{:width$}", c, width = widths[*c]))
        .collect();
    println!("{}", header.join(" │ ").white().bold());
    let separator: Vec<String> = columns.iter().map(|c| "─".repeat(widths[*c])).collect();
    println!("{}", separator.join("─┼─").dimmed());

    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|c| {
                let value = row.get(*c).map(cell).unwrap_or_default();
                format!("{:width$}", value, width = widths[*c])
            })
            .collect();
        println!("{}", cells.join(" │ "));
    }

    println!();
    println!("{} row(s) returned", rows.len().to_string().cyan());
}

fn cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn show_dialects() {
    println!(
        "{:10} {:8} {:6} {:22} {:10} {:26} {}",
        "Dialect".white().bold(),
        "Quote".white().bold(),
        "Param".white().bold(),
        "Auto increment".white().bold(),
        "Returning".white().bold(),
        "Insert ignore".white().bold(),
        "Pagination".white().bold(),
    );
    println!("{}", "─".repeat(100).dimmed());

    for dialect in Dialect::ALL {
        let generator = dialect.generator();
        let ignore = match generator.insert_ignore() {
            IgnoreSpelling::Prefix(prefix) => prefix.to_string(),
            IgnoreSpelling::OnConflictDoNothing => "on conflict do nothing".to_string(),
            IgnoreSpelling::Unsupported => "-".to_string(),
        };
        let pagination = match generator.pagination() {
            PaginationStyle::LimitOffset => "limit / offset",
            PaginationStyle::FetchNext => "offset / fetch next",
            PaginationStyle::TopOrFetch => "top / offset fetch",
        };
        let name = if dialect.has_driver() {
            dialect.name().cyan().bold()
        } else {
            format!("{}*", dialect.name()).cyan()
        };
        println!(
            "{:10} {:8} {:6} {:22} {:10} {:26} {}",
            name,
            generator.quote_identifier("id").yellow(),
            generator.placeholder(1).yellow(),
            generator.auto_increment(),
            if generator.supports_returning() { "yes" } else { "no" },
            ignore,
            pagination.dimmed(),
        );
    }
    println!();
    println!("{}", "* compile only, no bundled driver".dimmed());
}
