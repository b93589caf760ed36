use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Warden workspace automation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the overhead benchmarks across resolution modes
    Bench {
        /// Run quickly (lower sample size/time)
        #[arg(long, default_value_t = false)]
        quick: bool,

        /// Generate report only (skip running benchmarks)
        #[arg(long, default_value_t = false)]
        report_only: bool,
    },
}

/// Resolution modes to compare: baseline lazy resolution, and the
/// `aggressive` feature which resolves at handle construction.
const MODES: &[(&str, Option<&str>)] = &[("lazy", None), ("aggressive", Some("aggressive"))];

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Bench { quick, report_only } => {
            if !report_only {
                run_benchmarks(quick)?;
            }
            generate_report()?;
        }
    }

    Ok(())
}

fn run_benchmarks(quick: bool) -> Result<()> {
    println!("Running overhead benchmarks...");

    // Build first to avoid measuring build time
    println!("Compiling benchmarks...");
    let status = Command::new("cargo")
        .args(["build", "--bench", "accessor_overhead", "--release"])
        .status()?;
    if !status.success() {
        anyhow::bail!("Failed to compile benchmarks");
    }

    for (mode, feature) in MODES {
        println!("\n>>> Benchmarking resolution mode: {}", mode);
        let start = Instant::now();

        let mut cmd = Command::new("cargo");
        cmd.env("CARGO_INCREMENTAL", "0");

        cmd.arg("bench").arg("--bench").arg("accessor_overhead");
        if let Some(feature) = feature {
            cmd.arg("--features").arg(feature);
        }

        // Args for the test runner (Criterion) go after --
        cmd.arg("--");
        cmd.arg("--save-baseline").arg(mode);

        if quick {
            cmd.arg("--measurement-time").arg("0.1");
            cmd.arg("--noplot");
            cmd.arg("--sample-size").arg("10");
        }

        let status = cmd
            .status()
            .context(format!("Failed to run bench for {}", mode))?;

        if !status.success() {
            eprintln!("Warning: Benchmark failed for {}", mode);
        } else {
            println!("Finished {} in {:.2?}", mode, start.elapsed());
        }
    }

    Ok(())
}

fn generate_report() -> Result<()> {
    println!("\n>>> Generating Report...");
    let mut results: HashMap<String, HashMap<String, f64>> = HashMap::new();

    let criterion_dir = Path::new("target/criterion");
    if !criterion_dir.exists() {
        eprintln!("No criterion output found at {}", criterion_dir.display());
        return Ok(());
    }

    collect_results(criterion_dir, &mut results);

    let report_path = Path::new("benchmark_results/report.md");
    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)?;
    }

    use std::io::Write;
    let mut file = fs::File::create(report_path)?;

    writeln!(file, "# Resolution-Mode Overhead Report")?;

    let mut workloads: Vec<_> = results.keys().collect();
    workloads.sort();

    write!(file, "| Workload |")?;
    for (mode, _) in MODES {
        write!(file, " {} (Ops/s) | vs lazy |", mode)?;
    }
    writeln!(file)?;

    write!(file, "|---|")?;
    for _ in MODES {
        write!(file, "---|---|")?;
    }
    writeln!(file)?;

    for workload in workloads {
        write!(file, "| {} |", workload)?;

        let lazy_ops = results
            .get(workload)
            .and_then(|m| m.get("lazy"))
            .copied()
            .unwrap_or(0.0);

        for (mode, _) in MODES {
            if let Some(ops) = results.get(workload).and_then(|m| m.get(*mode)) {
                let rel = if lazy_ops > 0.0 { ops / lazy_ops } else { 0.0 };

                let ops_str = if *ops > 1_000_000.0 {
                    format!("{:.2}M", ops / 1_000_000.0)
                } else if *ops > 1_000.0 {
                    format!("{:.2}K", ops / 1_000.0)
                } else {
                    format!("{:.0}", ops)
                };

                write!(file, " {} | **{:.2}x** |", ops_str, rel)?;
            } else {
                write!(file, " N/A | - |")?;
            }
        }
        writeln!(file)?;
    }

    println!("Report written to {}", report_path.display());
    Ok(())
}

fn collect_results(dir: &Path, results: &mut HashMap<String, HashMap<String, f64>>) {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_results(&path, results);
        } else if path.file_name().and_then(|s| s.to_str()) == Some("estimates.json") {
            // Structure: .../workload/baseline/estimates.json
            let Some(baseline_dir) = path.parent() else {
                continue;
            };
            let Some(workload_dir) = baseline_dir.parent() else {
                continue;
            };
            let Some(baseline_name) = baseline_dir.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some(workload_name) = workload_dir.file_name().and_then(|s| s.to_str()) else {
                continue;
            };

            // Criterion keeps its own summaries under 'report' directories.
            if baseline_name == "report" || workload_name == "report" {
                continue;
            }

            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(json) = serde_json::from_str::<serde_json::Value>(&content) {
                    if let Some(mean) = json.get("mean").and_then(|m| m.get("point_estimate")) {
                        let time_ns = mean.as_f64().unwrap_or(0.0);
                        if time_ns > 0.0 {
                            results
                                .entry(workload_name.to_string())
                                .or_default()
                                .insert(baseline_name.to_string(), 1e9 / time_ns);
                        }
                    }
                }
            }
        }
    }
}
