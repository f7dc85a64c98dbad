//! Decomposition CLI - Standalone command-line interface for question decomposition
//!
//! This binary runs the same decomposition as the MCP tools without an MCP
//! client, and additionally exposes the cutoff date so past runs can be
//! replayed.

use clap::{Parser, Subcommand, ValueEnum};
use decomposition::decompose::{decompose, format_result, DecomposeInvocation, DecompositionVariant};
use decomposition::mcp::backtest;
use decomposition::mcp::tools::decompose::{tool_name, DecomposeRequest};
use decomposition::{DecompositionResult, ServerConfig};
use rmcp::schemars;
use serde::Serialize;
use std::io::{self, Read};
use std::process::ExitCode;

/// Decomposition CLI - Break forecasting questions into tractable subquestions
#[derive(Parser)]
#[command(name = "decomposition-cli")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate configuration and exit
    #[arg(long)]
    validate_config: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for CLI responses
#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for programmatic use
    Json,
}

/// Shape of the decomposition
#[derive(Clone, Copy, ValueEnum, Default)]
enum VariantArg {
    /// Two-level tree of subquestions
    #[default]
    Nested,
    /// Flat list with rationale and importance
    Ranked,
}

impl From<VariantArg> for DecompositionVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Nested => DecompositionVariant::Nested,
            VariantArg::Ranked => DecompositionVariant::Ranked,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Decompose a forecasting question
    Decompose {
        /// The question to decompose (or - for stdin)
        #[arg(short, long)]
        question: Option<String>,

        /// Additional context about the question
        #[arg(short, long, default_value = "")]
        context: String,

        /// As-of date for the model, YYYY-MM-DD (default: today)
        #[arg(long)]
        cutoff_date: Option<String>,

        /// Maximum number of top-level subquestions
        #[arg(short, long)]
        max_subquestions: Option<usize>,

        /// Decomposition shape
        #[arg(long, value_enum, default_value = "nested")]
        variant: VariantArg,
    },

    /// Print the advertised tool schemas and the full invocation contract
    Schema,
}

/// JSON form of a decompose run
#[derive(Serialize)]
struct DecomposeOutput {
    invocation: DecomposeInvocation,
    model: String,
    result: DecompositionResult,
}

/// Advertised schema of one tool
#[derive(Serialize)]
struct ToolSchema {
    name: &'static str,
    tags: &'static [&'static str],
    input_schema: serde_json::Value,
}

#[derive(Serialize)]
struct SchemaOutput {
    tools: Vec<ToolSchema>,
    invocation_schema: serde_json::Value,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: failed to load .env: {}", e);
        }
    }

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(io::stderr)
        .init();

    if cli.validate_config {
        return execute_validate_config();
    }

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            eprintln!("Error: A subcommand is required. Use --help for usage.");
            return ExitCode::from(2);
        }
    };

    let result = match command {
        Commands::Decompose {
            question,
            context,
            cutoff_date,
            max_subquestions,
            variant,
        } => {
            execute_decompose(
                cli.format,
                question,
                context,
                cutoff_date,
                max_subquestions,
                variant.into(),
            )
            .await
        }
        Commands::Schema => execute_schema(cli.format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn execute_decompose(
    format: OutputFormat,
    question: Option<String>,
    context: String,
    cutoff_date: Option<String>,
    max_subquestions: Option<usize>,
    variant: DecompositionVariant,
) -> Result<(), String> {
    let question = get_input(question, "question")?;
    let config = ServerConfig::from_env().map_err(|e| format!("Configuration error: {}", e))?;

    let invocation = DecomposeInvocation::new(question)
        .with_context(context)
        .with_cutoff_date(cutoff_date.unwrap_or_else(|| config.effective_cutoff_date()))
        .with_max_subquestions(max_subquestions.unwrap_or(config.max_subquestions));

    let client = config
        .build_client()
        .map_err(|e| format!("Configuration error: {}", e))?;

    let result = decompose(&client, variant, &invocation, config.reasoning_effort)
        .await
        .map_err(|e| format!("Decomposition failed: {}", e))?;

    match format {
        OutputFormat::Text => {
            println!("{}", format_result(&result));
            Ok(())
        }
        OutputFormat::Json => print_json(&DecomposeOutput {
            invocation,
            model: config.model,
            result,
        }),
    }
}

fn execute_schema(format: OutputFormat) -> Result<(), String> {
    let advertised = serde_json::to_value(schemars::schema_for!(DecomposeRequest))
        .map_err(|e| format!("Failed to render schema: {}", e))?;
    let invocation_schema = serde_json::to_value(schemars::schema_for!(DecomposeInvocation))
        .map_err(|e| format!("Failed to render schema: {}", e))?;

    let tools = DecompositionVariant::ALL
        .iter()
        .map(|variant| {
            let name = tool_name(*variant);
            ToolSchema {
                name,
                tags: backtest::tool_tags(name),
                input_schema: advertised.clone(),
            }
        })
        .collect();

    let output = SchemaOutput {
        tools,
        invocation_schema,
    };

    match format {
        OutputFormat::Json => print_json(&output),
        OutputFormat::Text => {
            for tool in &output.tools {
                println!("{} [{}]", tool.name, tool.tags.join(", "));
                println!("  parameters: {}", property_names(&tool.input_schema));
            }
            println!(
                "invocation contract: {}",
                property_names(&output.invocation_schema)
            );
            Ok(())
        }
    }
}

fn execute_validate_config() -> ExitCode {
    match ServerConfig::from_env() {
        Ok(config) => {
            println!("Configuration is valid.");
            println!("  model: {}", config.model);
            println!("  reasoning effort: {}", config.reasoning_effort);
            println!("  base url: {}", config.base_url);
            println!("  max subquestions: {}", config.max_subquestions);
            if let Some(date) = &config.cutoff_date {
                println!("  cutoff date: {}", date);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Configuration errors:");
            eprintln!("  - {}", e);
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn get_input(arg: Option<String>, name: &str) -> Result<String, String> {
    match arg {
        Some(s) if s != "-" => Ok(s),
        _ => {
            // Read from stdin when no arg provided or arg is "-"
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .map_err(|e| format!("Failed to read {} from stdin: {}", name, e))?;
            Ok(input.trim().to_string())
        }
    }
}

fn property_names(schema: &serde_json::Value) -> String {
    schema
        .as_object()
        .map(backtest::schema_properties)
        .unwrap_or_default()
        .join(", ")
}

/// Print a response as pretty JSON
fn print_json<T: Serialize>(response: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| format!("Failed to serialize response: {}", e))?;
    println!("{}", json);
    Ok(())
}
