//! sqlpanel CLI - Render panel queries to SQL
//!
//! Usage:
//!   sqlpanel render <query.json> [--var name=value]... [--multi name]... [--request]
//!   sqlpanel meta <query.json> <schemas|tables|columns> [--category <category>]
//!   sqlpanel expand <query.sql> --from <RFC3339> --to <RFC3339>
//!
//! Examples:
//!   sqlpanel render panel.json --var host=db1
//!   sqlpanel render panel.json --var dc=eu,us --multi dc
//!   sqlpanel render panel.json --var host=db1 --request
//!   sqlpanel meta panel.json columns --category value
//!   sqlpanel expand query.sql --from 2021-01-01T12:00:00Z --to 2021-01-25T12:00:00Z

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use sqlpanel::config::Settings;
use sqlpanel::interpolate::{Renderer, TemplateVariable, TemplateVariables, VariableValue};
use sqlpanel::macros::{expand_macros, TimeRange};
use sqlpanel::metadata::{ColumnCategory, MetaQuery};
use sqlpanel::model::{normalize, Query, QueryDocument};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlpanel")]
#[command(about = "sqlpanel - Compile dashboard panel queries to SQL")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the SQL of a persisted panel query
    Render {
        /// Path to the query JSON document
        file: PathBuf,

        /// Template variable binding (repeatable)
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,

        /// Treat a variable as multi-valued; its value is split on commas
        #[arg(long = "multi", value_name = "NAME")]
        multi: Vec<String>,

        /// Print the SQL without substituting variables
        #[arg(long, conflicts_with = "request")]
        no_interpolate: bool,

        /// Print the SQL as sent to the backend (datasource quoting)
        #[arg(long)]
        request: bool,
    },

    /// Print the catalog query behind an editor picker
    Meta {
        /// Path to the query JSON document
        file: PathBuf,

        /// Which picker
        target: MetaTarget,

        /// Column type family (columns only)
        #[arg(short, long)]
        category: Option<CategoryArg>,
    },

    /// Expand $__ macros in raw SQL for a time range
    Expand {
        /// Path to a file holding the SQL
        file: PathBuf,

        /// Range start (RFC 3339)
        #[arg(long)]
        from: String,

        /// Range end (RFC 3339)
        #[arg(long)]
        to: String,
    },
}

#[derive(Clone, ValueEnum)]
enum MetaTarget {
    Schemas,
    Tables,
    Columns,
}

#[derive(Clone, ValueEnum)]
enum CategoryArg {
    Time,
    Metric,
    Value,
}

impl From<CategoryArg> for ColumnCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Time => ColumnCategory::Time,
            CategoryArg::Metric => ColumnCategory::Metric,
            CategoryArg::Value => ColumnCategory::Value,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum RenderOutput {
    /// Macros and variable references left in place
    Plain,
    /// Query editor quoting
    Editor,
    /// Backend request quoting
    Request,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Render {
            file,
            vars,
            multi,
            no_interpolate,
            request,
        } => {
            let output = if request {
                RenderOutput::Request
            } else if no_interpolate {
                RenderOutput::Plain
            } else {
                RenderOutput::Editor
            };
            cmd_render(&settings, &file, &vars, &multi, output)
        }
        Commands::Meta {
            file,
            target,
            category,
        } => cmd_meta(&settings, &file, target, category),
        Commands::Expand { file, from, to } => cmd_expand(&file, &from, &to),
    }
}

fn load_query(settings: &Settings, file: &Path) -> Result<Query, String> {
    let source = fs::read_to_string(file)
        .map_err(|e| format!("Error reading file '{}': {}", file.display(), e))?;
    let doc: QueryDocument = serde_json::from_str(&source)
        .map_err(|e| format!("Error parsing '{}': {}", file.display(), e))?;
    normalize(doc, &settings.editor).map_err(|e| format!("Invalid query: {}", e))
}

fn parse_variables(vars: &[String], multi: &[String]) -> Result<TemplateVariables, String> {
    let mut variables = TemplateVariables::new();

    for binding in vars {
        let Some((name, value)) = binding.split_once('=') else {
            return Err(format!("Invalid --var '{}', expected NAME=VALUE", binding));
        };

        let variable = if multi.iter().any(|m| m == name) {
            let values = value.split(',').map(str::trim).collect::<Vec<_>>();
            TemplateVariable::multi(name, values)
        } else {
            TemplateVariable::single(name, VariableValue::from(value))
        };
        variables.insert(variable);
    }

    Ok(variables)
}

fn cmd_render(
    settings: &Settings,
    file: &Path,
    vars: &[String],
    multi: &[String],
    output: RenderOutput,
) -> ExitCode {
    let query = match load_query(settings, file) {
        Ok(q) => q,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let variables = match parse_variables(vars, multi) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if !query.is_executable() {
        tracing::info!(file = %file.display(), "query is hidden");
        eprintln!(
            "Query '{}' is hidden, nothing to execute",
            query.ref_id.as_deref().unwrap_or("-")
        );
        return ExitCode::SUCCESS;
    }

    tracing::info!(mode = ?query.mode(), ?output, file = %file.display(), "rendering query");
    let renderer = Renderer::new(&variables);
    let sql = match output {
        RenderOutput::Plain => renderer.render(&query, false),
        RenderOutput::Editor => renderer.render(&query, true),
        RenderOutput::Request => match renderer.render_request(&query) {
            Some(sql) => sql,
            None => return ExitCode::SUCCESS,
        },
    };
    println!("{}", sql);
    ExitCode::SUCCESS
}

fn cmd_meta(
    settings: &Settings,
    file: &Path,
    target: MetaTarget,
    category: Option<CategoryArg>,
) -> ExitCode {
    let query = match load_query(settings, file) {
        Ok(q) => q,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let meta = MetaQuery::new(&query, &settings.catalog);
    let sql = match target {
        MetaTarget::Schemas => meta.build_schema_query(),
        MetaTarget::Tables => meta.build_table_query(),
        MetaTarget::Columns => meta.build_column_query(category.map(Into::into)),
    };

    println!("{}", sql);
    ExitCode::SUCCESS
}

fn parse_time(label: &str, value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("Invalid --{} '{}': {}", label, value, e))
}

fn cmd_expand(file: &Path, from: &str, to: &str) -> ExitCode {
    let sql = match fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let range = match (parse_time("from", from), parse_time("to", to)) {
        (Ok(from), Ok(to)) => TimeRange::new(from, to),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match expand_macros(&sql, &range) {
        Ok(expansion) => {
            tracing::info!(fill_mode = ?expansion.fill_mode, "expanded macros");
            println!("{}", expansion.sql);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Macro error: {}", e);
            ExitCode::FAILURE
        }
    }
}
