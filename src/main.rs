// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use the_ensemble::compiler::{compile_output_length, compile_tasks, split_input};
use the_ensemble::config::{
    load_and_validate_definitions, load_config, load_function, load_input, EngineConfig,
    FunctionDefinition,
};
use the_ensemble::engine::Executor;

#[derive(Debug, Parser)]
#[command(name = "the-ensemble")]
#[command(about = "Compile declarative functions and score them with a weighted model ensemble", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compile every task of a function against an input and print the payloads.
    Compile(FunctionArgs),
    /// Print the number of output entries a function yields for an input.
    OutputLength(FunctionArgs),
    /// Split an input into per-item sub-inputs (prints null when the function has no split).
    Split(FunctionArgs),
    /// Execute a function and profile against an input using the deterministic RNG backend.
    Execute {
        #[command(flatten)]
        function: FunctionArgs,
        /// Path to the profile definition (JSON, YAML or TOML).
        #[arg(long)]
        profile: PathBuf,
        /// Engine configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Run one sub-execution per split item and merge the results.
        #[arg(long)]
        split: bool,
    },
}

#[derive(Debug, Args)]
struct FunctionArgs {
    /// Path to the function definition (JSON, YAML or TOML).
    #[arg(long)]
    function: PathBuf,
    /// Path to the input document (JSON, YAML or TOML).
    #[arg(long)]
    input: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Compile(args) => {
            let (function, input) = load_function_and_input(&args)?;
            let compiled = compile_tasks(&function, &input)?;
            print_json(&compiled)
        }
        Commands::OutputLength(args) => {
            let (function, input) = load_function_and_input(&args)?;
            print_json(&compile_output_length(&function, &input)?)
        }
        Commands::Split(args) => {
            let (function, input) = load_function_and_input(&args)?;
            print_json(&split_input(&function, &input)?)
        }
        Commands::Execute {
            function,
            profile,
            config,
            split,
        } => {
            let (definition, profile) = load_and_validate_definitions(&function.function, &profile)?;
            let input = load_input(&function.input)?;
            let config = match config {
                Some(path) => load_config(&path)?,
                None => EngineConfig::default(),
            };

            let executor = Executor::from_config(&config);
            let result = if split {
                executor.execute_split(input, &definition, &profile, true).await
            } else {
                executor.execute(input, &definition, &profile, true).await
            };
            print_json(&result)?;

            if let Some(error) = result.error {
                anyhow::bail!("execution failed ({}): {}", error.kind.as_str(), error.message);
            }
            Ok(())
        }
    }
}

fn load_function_and_input(
    args: &FunctionArgs,
) -> Result<(FunctionDefinition, Value)> {
    let function = load_function(&args.function)?;
    let input = load_input(&args.input)?;
    Ok((function, input))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output as JSON")?;
    println!("{}", rendered);
    Ok(())
}
