#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that generates one proven-solvable Sokoban level.

mod config;
mod report;

use std::{path::PathBuf, process::ExitCode, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, LevelFilter};
use sokogen_generator::{Generator, GeneratorConfig};

use crate::{config::FileConfig, report::LevelReport};

/// Output encodings supported by the CLI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Grid followed by labelled lines.
    #[default]
    Text,
    /// Pretty-printed JSON document.
    Json,
}

/// Command-line arguments accepted by the generator binary.
#[derive(Debug, Parser)]
#[command(name = "sokogen", about = "Generates a Sokoban level with a proven solution")]
struct CliArgs {
    /// Seed driving every random choice. Drawn from OS entropy when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Exact number of goal/box pairs.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    entities: Option<u32>,
    /// Exact number of template divisions per grid axis.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    divisions: Option<u32>,
    /// Wall-clock budget in seconds before generation gives up.
    #[arg(long = "time-budget")]
    time_budget: Option<u64>,
    /// TOML file with generation settings. Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output encoding.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
    /// Raises log verbosity; repeat for more detail.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl CliArgs {
    /// Resolves the generator configuration and the seed, file first, flags last.
    fn resolve(&self) -> Result<(GeneratorConfig, u64)> {
        let file = match &self.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        let file_seed = file.seed;
        let mut config = file.into_generator_config();

        if let Some(entities) = self.entities {
            let entities = usize::try_from(entities).context("entity count out of range")?;
            config.min_entities = entities;
            config.max_entities = entities;
        }
        if let Some(divisions) = self.divisions {
            config.synthesis.min_divisions = divisions;
            config.synthesis.max_divisions = divisions;
        }
        if let Some(seconds) = self.time_budget {
            config.time_budget = Duration::from_secs(seconds);
        }

        let seed = self
            .seed
            .or(file_seed)
            .unwrap_or_else(rand::random::<u64>);
        Ok((config, seed))
    }
}

fn level_filter(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Entry point for the sokogen command-line interface.
fn main() -> ExitCode {
    let args = CliArgs::parse();
    env_logger::Builder::new()
        .filter_level(level_filter(args.verbose))
        .parse_default_env()
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> Result<()> {
    let (config, seed) = args.resolve()?;
    info!("generating with seed {seed}");

    let level = Generator::new(config)
        .generate(seed)
        .with_context(|| format!("generation with seed {seed} failed"))?;
    let report = LevelReport::from(&level);

    match args.format {
        Format::Text => print!("{}", report.to_text()),
        Format::Json => println!(
            "{}",
            report.to_json().context("failed to serialize level report")?
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = CliArgs::parse_from([
            "sokogen",
            "--seed",
            "5",
            "--entities",
            "2",
            "--divisions",
            "4",
            "--time-budget",
            "10",
            "--format",
            "json",
            "-vv",
        ]);
        let (config, seed) = args.resolve().expect("no config file to read");

        assert_eq!(seed, 5);
        assert_eq!(config.min_entities, 2);
        assert_eq!(config.max_entities, 2);
        assert_eq!(config.synthesis.min_divisions, 4);
        assert_eq!(config.synthesis.max_divisions, 4);
        assert_eq!(config.time_budget, Duration::from_secs(10));
        assert_eq!(args.format, Format::Json);
        assert_eq!(level_filter(args.verbose), LevelFilter::Debug);
    }

    #[test]
    fn zero_entities_are_refused() {
        assert!(CliArgs::try_parse_from(["sokogen", "--entities", "0"]).is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let args = CliArgs::parse_from(["sokogen", "--config", "/nonexistent/sokogen.toml"]);
        assert!(args.resolve().is_err());
    }

    #[test]
    fn verbosity_defaults_to_warnings() {
        let args = CliArgs::parse_from(["sokogen"]);
        assert_eq!(level_filter(args.verbose), LevelFilter::Warn);
        assert_eq!(args.format, Format::Text);
    }
}
