// demos/demo.rs
use bsm_sweep::analytics::{Greek, GreekSet, OptionType};
use bsm_sweep::contract::{OptionContract, Param, PositionDirection, WeekdayCalendar};
use bsm_sweep::error::PricingResult;
use bsm_sweep::math_utils::Timer;
use bsm_sweep::sweep::{Portfolio, SweepSpec};
use chrono::NaiveDate;
use std::fs::File;
use std::io::BufWriter;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("bsm-sweep Demo");
    println!("==============\n");

    let portfolio = build_condor()?;

    println!("Legs (volatility implied from quotes):");
    for leg in portfolio.legs() {
        println!("  {}", leg);
    }

    print_greeks_table(&portfolio);

    println!("\nPosition totals:");
    for greek in [Greek::Price, Greek::Delta, Greek::Gamma, Greek::Vega, Greek::Theta] {
        println!("  {:>6}: {:+.6}", greek, portfolio.value(greek)?);
    }

    run_sweeps(&portfolio)?;
    print_decay_profiles(&portfolio)?;

    println!("\n✓ Demo complete!");
    Ok(())
}

/// Long 325 put, short 335 put, short 335 call, long 345 call
fn build_condor() -> PricingResult<Portfolio> {
    let today = NaiveDate::from_ymd_opt(2020, 8, 21).expect("Valid date");
    let expiry = NaiveDate::from_ymd_opt(2020, 9, 18).expect("Valid date");
    let labor_day = NaiveDate::from_ymd_opt(2020, 9, 7).expect("Valid date");
    let calendar = WeekdayCalendar::with_holidays([labor_day]);

    let quotes = [
        (OptionType::Put, 325.0, 5.78, PositionDirection::Long),
        (OptionType::Put, 335.0, 8.98, PositionDirection::Short),
        (OptionType::Call, 335.0, 7.89, PositionDirection::Short),
        (OptionType::Call, 345.0, 3.14, PositionDirection::Long),
    ];

    let legs = quotes
        .iter()
        .map(|&(otype, k, quote, direction)| {
            OptionContract::builder(otype)
                .direction(direction)
                .spot(334.54)
                .strike(k)
                .expiry_date(expiry)
                .as_of(today)
                .calendar(&calendar)
                .market_price(quote)
                .build()
        })
        .collect::<PricingResult<Vec<_>>>()?;

    Ok(Portfolio::from_legs(legs))
}

fn print_greeks_table(portfolio: &Portfolio) {
    let table = portfolio.greeks_table();
    println!("\nGreeks per leg:");
    print!("  {:<10}", "");
    for leg in portfolio.legs() {
        print!(" {:>12}", format!("{} {}", leg.option_type(), leg.strike()));
    }
    println!();
    for greek in Greek::ALL {
        print!("  {:<10}", greek.as_str());
        for row in &table {
            print!(" {:>12.6}", row[&greek]);
        }
        println!();
    }
}

fn run_sweeps(portfolio: &Portfolio) -> Result<(), Box<dyn std::error::Error>> {
    let sweeps = [
        (
            "S0 x T",
            SweepSpec::new()
                .axis(Param::S0, 315.0, 355.0, 100)
                .axis(Param::T, 0.01, 0.11, 100),
        ),
        (
            "S0 x vol",
            SweepSpec::new()
                .axis(Param::S0, 315.0, 355.0, 100)
                .axis(Param::Vol, 0.1, 0.3, 100),
        ),
        (
            "vol x T",
            SweepSpec::new()
                .axis(Param::Vol, 0.1, 0.3, 100)
                .axis(Param::T, 0.01, 0.11, 100),
        ),
    ];

    std::fs::create_dir_all("results")?;
    let mut timer = Timer::new();
    println!("\nSweeps:");
    for (i, (name, spec)) in sweeps.iter().enumerate() {
        timer.start();
        let mut per_leg = Vec::with_capacity(portfolio.len());
        for leg in portfolio.legs() {
            per_leg.push(leg.sweep(spec, GreekSet::PRICE | GreekSet::DELTA | GreekSet::GAMMA)?);
        }
        let total = portfolio.sweep(spec, Greek::Price)?;
        let elapsed = timer.elapsed_ms();

        let (lo, hi) = total
            .values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
        println!(
            "  {:<9} shape {:?}  position value in [{:+.4}, {:+.4}]  ({:.2} ms)",
            name,
            total.values.shape(),
            lo,
            hi,
            elapsed
        );

        let path = format!("results/sweep{}.json", i + 1);
        let file = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(file, &serde_json::json!({ "legs": per_leg, "position": total }))?;
        println!("            written to {}", path);
    }
    Ok(())
}

fn print_decay_profiles(portfolio: &Portfolio) -> PricingResult<()> {
    let profiles = portfolio.decay_profiles(315.0, 355.0, 9)?;
    println!("\nPosition value against S0:");
    print!("  {:>8}", "S0");
    for profile in &profiles {
        print!(" {:>12}", profile.snapshot.label());
    }
    println!();

    let spots: Vec<f64> = profiles[0].spot.iter().copied().collect();
    for (i, s) in spots.iter().enumerate() {
        print!("  {:>8.2}", s);
        for profile in &profiles {
            let value = profile.value.iter().nth(i).copied().unwrap_or(f64::NAN);
            print!(" {:>12.4}", value);
        }
        println!();
    }
    Ok(())
}
