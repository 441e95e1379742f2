//! Vigil CLI
//!
//! Command-line front end for the DFA simulator and the URL validator.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use vigil_automaton::SimulatorConfig;
use vigil_engine::{
    AutomatonSummary, CompiledDfa, SimulationReport, UrlValidator, ValidationReport,
};
use vigil_url::ClassifierConfig;

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Vigil - DFA simulator and automaton-driven URL validator", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level
    #[arg(short, long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a DFA definition over one or more inputs
    Simulate {
        /// Definition file (.json, .yaml or .yml)
        #[arg(short, long)]
        dfa: PathBuf,

        /// Input strings
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Print reports as JSON
        #[arg(long)]
        json: bool,

        /// Do not record the step trace
        #[arg(long)]
        no_trace: bool,
    },

    /// Validate a DFA definition and print a summary
    CheckDfa {
        /// Definition file (.json, .yaml or .yml)
        #[arg(short, long)]
        dfa: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify one or more URLs
    Validate {
        /// URLs to classify
        #[arg(required = true)]
        urls: Vec<String>,

        /// Classifier configuration file (.json, .yaml or .yml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print reports as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level)?;

    match cli.command {
        Commands::Simulate {
            dfa,
            inputs,
            json,
            no_trace,
        } => simulate(dfa, &inputs, json, no_trace),
        Commands::CheckDfa { dfa, json } => check_dfa(dfa, json),
        Commands::Validate { urls, config, json } => validate(&urls, config, json),
    }
}

fn setup_logging(level: &str) -> Result<()> {
    let level = level.parse::<Level>().unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn simulate(path: PathBuf, inputs: &[String], json: bool, no_trace: bool) -> Result<()> {
    info!(definition = %path.display(), inputs = inputs.len(), "Simulating DFA");

    let dfa = CompiledDfa::load(&path)?.with_simulator(SimulatorConfig {
        record_trace: !no_trace,
    });
    let reports: Vec<SimulationReport> = inputs.iter().map(|input| dfa.run(input)).collect();

    if json {
        return print_json(&reports);
    }
    for report in &reports {
        print_simulation(report);
    }
    Ok(())
}

fn print_simulation(report: &SimulationReport) {
    println!("input {:?}", report.input);
    for step in &report.trace {
        println!("  {} --{}--> {}", step.from, step.symbol, step.to);
    }
    if let Some(halt) = report.halted_on {
        println!(
            "  halted at position {} on {:?} in state {}",
            halt.position, halt.symbol, report.final_state
        );
    }
    println!(
        "  {} (final state {}, {} symbols consumed)",
        report.verdict, report.final_state, report.consumed
    );
}

fn check_dfa(path: PathBuf, json: bool) -> Result<()> {
    info!(definition = %path.display(), "Checking DFA definition");

    let summary = CompiledDfa::load(&path)?.summary();
    if json {
        return print_json(&summary);
    }
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &AutomatonSummary) {
    let alphabet: String = summary.alphabet.iter().collect();
    println!("states:       {}", summary.states);
    println!("alphabet:     {:?}", alphabet);
    println!("transitions:  {}", summary.transitions);
    println!("start:        {}", summary.start_state);
    println!("accepting:    {}", summary.accept_states.join(", "));
    println!(
        "table:        {}",
        if summary.total { "total" } else { "partial" }
    );
    if !summary.unreachable_states.is_empty() {
        println!("unreachable:  {}", summary.unreachable_states.join(", "));
    }
}

fn validate(urls: &[String], config: Option<PathBuf>, json: bool) -> Result<()> {
    let config = match config {
        Some(path) => {
            info!(config = %path.display(), "Loading classifier configuration");
            ClassifierConfig::load(&path)?
        }
        None => ClassifierConfig::default(),
    };
    let validator = UrlValidator::new(config)?;
    info!(
        checks = validator.classifier().check_names().len(),
        urls = urls.len(),
        "Validating URLs"
    );

    let reports: Vec<ValidationReport> = urls.iter().map(|url| validator.validate(url)).collect();

    if json {
        return print_json(&reports);
    }
    for report in &reports {
        print_validation(report);
    }
    Ok(())
}

fn print_validation(report: &ValidationReport) {
    let status = if report.well_formed {
        "well-formed"
    } else {
        "malformed"
    };
    println!("{}", report.url);
    println!("  {} / {}", report.risk_level, status);
    if let Some(reason) = &report.rejection_reason {
        println!("  rejected: {}", reason);
    }
    for flag in &report.flags {
        println!("  {}", flag);
    }
}
