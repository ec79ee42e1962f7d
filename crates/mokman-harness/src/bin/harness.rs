//! CLI entrypoint for the MOK manager conformance harness.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use log::debug;

use mokman_core::siglist::{self, SignatureKind};
use mokman_core::inspect;
use mokman_efi::guid;
use mokman_efi::sim::SimConsole;
use mokman_harness::{Scenario, builtin, run_scenario};

/// Conformance tooling for the MOK manager.
#[derive(Debug, Parser)]
#[command(name = "mokman-harness")]
#[command(about = "Conformance testing harness for the MOK manager")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay scenario fixtures against the simulated firmware.
    Run {
        /// Fixture file, or a directory of *.json fixtures.
        #[arg(long)]
        fixture: Option<PathBuf>,
        /// Also run the built-in scenario set.
        #[arg(long)]
        builtin: bool,
        /// Print the captured console output of failing scenarios.
        #[arg(long)]
        show_output: bool,
    },
    /// Decode a signature-list blob and print one line per entry.
    List {
        /// Input blob (a staged request or a dumped MokList).
        #[arg(long)]
        input: PathBuf,
    },
    /// Render certificate metadata the way the review screen does.
    Inspect {
        /// DER-encoded certificate file.
        #[arg(long)]
        input: PathBuf,
    },
}

fn load_fixtures(path: &PathBuf) -> anyhow::Result<Vec<Scenario>> {
    let meta = fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
    let mut files = Vec::new();
    if meta.is_dir() {
        for entry in fs::read_dir(path).with_context(|| format!("read {}", path.display()))? {
            let entry = entry?;
            if entry.path().extension().is_some_and(|e| e == "json") {
                files.push(entry.path());
            }
        }
        files.sort();
    } else {
        files.push(path.clone());
    }

    let mut scenarios = Vec::new();
    for file in files {
        let text = fs::read_to_string(&file).with_context(|| format!("read {}", file.display()))?;
        let scenario: Scenario = serde_json::from_str(&text)
            .with_context(|| format!("decode fixture {}", file.display()))?;
        debug!("loaded fixture {} from {}", scenario.name, file.display());
        scenarios.push(scenario);
    }
    Ok(scenarios)
}

fn cmd_run(
    fixture: Option<PathBuf>,
    use_builtin: bool,
    show_output: bool,
) -> anyhow::Result<ExitCode> {
    let mut scenarios = Vec::new();
    if use_builtin || fixture.is_none() {
        scenarios.extend(builtin::builtin_scenarios());
    }
    if let Some(path) = &fixture {
        scenarios.extend(load_fixtures(path)?);
    }

    let mut failures = 0usize;
    for scenario in &scenarios {
        let report = run_scenario(scenario)
            .with_context(|| format!("scenario {} did not decode", scenario.name))?;
        if report.passed() {
            println!("PASS {}", report.name);
        } else {
            failures += 1;
            println!("FAIL {}", report.name);
            for check in report.checks.iter().filter(|c| !c.passed) {
                println!("     failed: {}", check.description);
            }
            if show_output {
                println!("--- captured output ---");
                println!("{}", report.output);
            }
        }
    }

    println!("{} scenario(s), {} failure(s)", scenarios.len(), failures);
    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_list(input: &PathBuf) -> anyhow::Result<ExitCode> {
    let blob = fs::read(input).with_context(|| format!("read {}", input.display()))?;
    let mut total = 0usize;
    for (index, entry) in siglist::iterate(&blob).enumerate() {
        let kind = match entry.kind {
            SignatureKind::X509 => "x509",
            SignatureKind::Sha256 => "sha256",
        };
        println!(
            "{:3}: {kind:6} owner={} {} bytes",
            index + 1,
            entry.owner,
            entry.data.len()
        );
        total += 1;
    }
    println!("{total} entr{} recognized", if total == 1 { "y" } else { "ies" });
    Ok(ExitCode::SUCCESS)
}

fn cmd_inspect(input: &PathBuf) -> anyhow::Result<ExitCode> {
    let der = fs::read(input).with_context(|| format!("read {}", input.display()))?;
    if !inspect::is_valid_x509(&der) {
        bail!("{} is not a valid X509 certificate", input.display());
    }
    let entry = siglist::SignatureEntry {
        kind: SignatureKind::X509,
        owner: guid::SHIM_LOCK,
        data: &der,
    };
    let mut con = SimConsole::new();
    inspect::render_entry(&mut con, &entry);
    print!("{}", con.output());
    Ok(ExitCode::SUCCESS)
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            fixture,
            builtin,
            show_output,
        } => cmd_run(fixture, builtin, show_output),
        Command::List { input } => cmd_list(&input),
        Command::Inspect { input } => cmd_inspect(&input),
    }
}
