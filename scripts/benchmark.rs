// scripts/benchmark.rs
use bsm_sweep::analytics::{implied_volatility, BsParams, Greek, GreekSet, ImpliedVolConfig, OptionType};
use bsm_sweep::contract::{OptionContract, Param};
use bsm_sweep::error::PricingResult;
use bsm_sweep::math_utils::Timer;
use bsm_sweep::sweep::SweepSpec;
use std::env;
use std::fs::File;
use std::io::{self, Write};
use std::process::Command;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct SystemInfo {
    os: String,
    cpu_model: String,
    cpu_threads: usize,
    rust_version: String,
    rustc_flags: String,
}

impl SystemInfo {
    fn gather() -> Self {
        let cpu_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            os: env::consts::OS.to_string(),
            cpu_model: Self::get_cpu_model(),
            cpu_threads,
            rust_version: Self::get_rust_version(),
            rustc_flags: env::var("RUSTFLAGS").unwrap_or_else(|_| "default".to_string()),
        }
    }

    fn get_cpu_model() -> String {
        #[cfg(target_os = "linux")]
        {
            std::fs::read_to_string("/proc/cpuinfo")
                .ok()
                .and_then(|content| {
                    content
                        .lines()
                        .find(|line| line.starts_with("model name"))
                        .and_then(|line| line.split(':').nth(1))
                        .map(|s| s.trim().to_string())
                })
                .unwrap_or_else(|| "Unknown CPU".to_string())
        }

        #[cfg(target_os = "macos")]
        {
            Command::new("sysctl")
                .args(["-n", "machdep.cpu.brand_string"])
                .output()
                .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
                .unwrap_or_else(|_| "Unknown CPU".to_string())
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            "Unknown CPU".to_string()
        }
    }

    fn get_rust_version() -> String {
        Command::new("rustc")
            .arg("--version")
            .output()
            .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
            .unwrap_or_else(|_| "Unknown Rust version".to_string())
    }
}

#[derive(Debug)]
struct BenchmarkResult {
    name: String,
    evaluations: usize,
    time_ms: f64,
    throughput_per_sec: f64,
    value: f64,
    reference_value: Option<f64>,
    relative_error: Option<f64>,
}

impl BenchmarkResult {
    fn new(name: String, evaluations: usize, time_ms: f64, value: f64, reference: Option<f64>) -> Self {
        BenchmarkResult {
            name,
            evaluations,
            time_ms,
            throughput_per_sec: evaluations as f64 / (time_ms.max(1e-9) / 1000.0),
            value,
            reference_value: reference,
            relative_error: reference.map(|r| (value - r).abs() / r.abs()),
        }
    }
}

fn reference_params() -> BsParams {
    BsParams {
        s0: 100.0,
        k: 100.0,
        vol: 0.2,
        r: 0.05,
        t: 1.0,
        q: 0.0,
    }
}

fn run_scalar_benchmarks() -> Vec<BenchmarkResult> {
    let mut results = Vec::new();
    let p = reference_params();
    let calls = 1_000_000;

    let references = [
        (Greek::Price, Some(10.450583572185565)),
        (Greek::Delta, Some(0.636830651175619)),
        (Greek::Gamma, Some(0.018762017345847)),
        (Greek::Vega, Some(37.524034691693792)),
        (Greek::Theta, Some(-6.414027546438197)),
        (Greek::Color, None),
        (Greek::Ultima, None),
    ];

    let mut timer = Timer::new();
    for (greek, reference) in references {
        timer.start();
        let mut acc = 0.0;
        for i in 0..calls {
            // Nudge the spot so the loop cannot be hoisted
            let s0 = p.s0 + (i % 2) as f64 * 1e-12;
            acc += greek.evaluate(OptionType::Call, &BsParams { s0, ..p });
        }
        let time_ms = timer.elapsed_ms();
        let value = acc / calls as f64;
        results.push(BenchmarkResult::new(
            format!("Scalar {}", greek),
            calls,
            time_ms,
            value,
            reference,
        ));
    }

    results
}

fn run_implied_vol_benchmarks() -> PricingResult<Vec<BenchmarkResult>> {
    let cfg = ImpliedVolConfig::default();
    let p = reference_params();
    let strikes: Vec<f64> = (0..101).map(|i| 60.0 + 0.8 * i as f64).collect();
    let targets: Vec<(f64, f64)> = strikes
        .iter()
        .map(|&k| (k, Greek::Price.evaluate(OptionType::Call, &BsParams { k, ..p })))
        .collect();

    let rounds = 100;
    let mut timer = Timer::new();
    timer.start();
    let mut worst: f64 = 0.0;
    for _ in 0..rounds {
        for &(k, target) in &targets {
            let vol = implied_volatility(OptionType::Call, target, &BsParams { k, ..p }, &cfg)?;
            worst = worst.max((vol - p.vol).abs());
        }
    }
    let time_ms = timer.elapsed_ms();

    Ok(vec![BenchmarkResult::new(
        "Implied vol (strike ladder)".to_string(),
        rounds * targets.len(),
        time_ms,
        p.vol + worst,
        Some(p.vol),
    )])
}

fn run_sweep_benchmarks() -> PricingResult<Vec<BenchmarkResult>> {
    let mut results = Vec::new();
    let call = OptionContract::new(OptionType::Call, 100.0, 100.0, 1.0, 0.2, 0.05, 0.0)?;

    let configs = [
        ("Sweep S0 (1-D)", SweepSpec::new().axis(Param::S0, 50.0, 150.0, 10_001)),
        (
            "Sweep S0 x T (2-D)",
            SweepSpec::new()
                .axis(Param::S0, 50.0, 150.0, 201)
                .axis(Param::T, 0.05, 2.0, 200),
        ),
        (
            "Sweep S0 x vol x r (3-D)",
            SweepSpec::new()
                .axis(Param::S0, 50.0, 150.0, 51)
                .axis(Param::Vol, 0.05, 0.8, 40)
                .axis(Param::R, 0.0, 0.1, 20),
        ),
    ];

    let mut timer = Timer::new();
    for (name, spec) in configs {
        println!("Benchmarking {}...", name);
        timer.start();
        let res = call.sweep(&spec, GreekSet::EVERYTHING)?;
        let time_ms = timer.elapsed_ms();
        let points: usize = res.shape().iter().product();
        let price = res
            .output(Greek::Price)
            .and_then(|a| a.iter().cloned().reduce(f64::max))
            .unwrap_or(f64::NAN);
        info!(name, points, time_ms, "sweep finished");
        results.push(BenchmarkResult::new(
            format!("{} [{} outputs]", name, Greek::ALL.len()),
            points * Greek::ALL.len(),
            time_ms,
            price,
            None,
        ));
    }

    Ok(results)
}

fn write_results_to_csv(
    results: &[BenchmarkResult],
    system_info: &SystemInfo,
    filename: &str,
) -> io::Result<()> {
    let mut file = File::create(filename)?;

    // Write system information as comments
    writeln!(file, "# System Information")?;
    writeln!(file, "# OS: {}", system_info.os)?;
    writeln!(file, "# CPU: {}", system_info.cpu_model)?;
    writeln!(file, "# CPU Threads: {}", system_info.cpu_threads)?;
    writeln!(file, "# Rust Version: {}", system_info.rust_version)?;
    writeln!(file, "# RUSTFLAGS: {}", system_info.rustc_flags)?;
    writeln!(
        file,
        "# Benchmark Date: {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(file, "#")?;

    writeln!(
        file,
        "Benchmark,Evaluations,Time_ms,Throughput_per_sec,Value,Reference_Value,Relative_Error"
    )?;

    for result in results {
        writeln!(
            file,
            "{},{},{:.2},{:.0},{:.10},{},{}",
            result.name,
            result.evaluations,
            result.time_ms,
            result.throughput_per_sec,
            result.value,
            result
                .reference_value
                .map(|v| format!("{:.10}", v))
                .unwrap_or_else(|| "N/A".to_string()),
            result
                .relative_error
                .map(|e| format!("{:.3e}", e))
                .unwrap_or_else(|| "N/A".to_string())
        )?;
    }

    println!("Results written to {}", filename);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("bsm-sweep Benchmark Suite");
    println!("=========================\n");

    let system_info = SystemInfo::gather();
    println!("System Information:");
    println!("  OS: {}", system_info.os);
    println!("  CPU: {}", system_info.cpu_model);
    println!("  CPU Threads: {}", system_info.cpu_threads);
    println!("  Rust Version: {}", system_info.rust_version);
    println!("  RUSTFLAGS: {}", system_info.rustc_flags);
    println!();

    println!("Running scalar Greek benchmarks...");
    let mut all_results = run_scalar_benchmarks();

    println!("\nRunning implied volatility benchmarks...");
    all_results.extend(run_implied_vol_benchmarks()?);

    println!("\nRunning sweep benchmarks...");
    all_results.extend(run_sweep_benchmarks()?);

    println!("\n{:=<96}", "");
    println!("BENCHMARK RESULTS");
    println!("{:=<96}", "");
    println!(
        "{:<40} {:>10} {:>11} {:>14} {:>12} {:>12}",
        "Benchmark", "Evals", "Time (ms)", "Evals/sec", "Value", "Rel Error"
    );
    println!("{:-<96}", "");

    for result in &all_results {
        println!(
            "{:<40} {:>10} {:>11.2} {:>14.0} {:>12.6} {:>12}",
            result.name,
            result.evaluations,
            result.time_ms,
            result.throughput_per_sec,
            result.value,
            result
                .relative_error
                .map(|e| format!("{:.2e}", e))
                .unwrap_or_else(|| "N/A".to_string())
        );
        if result.relative_error.map_or(false, |e| e > 1e-6) {
            warn!(name = %result.name, "result deviates from reference value");
        }
    }

    println!("{:=<96}", "");

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let filename = format!("benchmark_results_{}.csv", timestamp);
    write_results_to_csv(&all_results, &system_info, &filename)?;

    println!("\nBenchmark complete!");
    println!("\nTo reproduce these results:");
    println!("1. Use Rust version: {}", system_info.rust_version);
    println!("2. Set RUSTFLAGS: {}", system_info.rustc_flags);
    println!("3. Run: cargo run --bin benchmark --release");
    Ok(())
}
