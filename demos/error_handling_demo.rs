// demos/error_handling_demo.rs
use bsm_sweep::analytics::{implied_volatility, BsParams, GreekSet, ImpliedVolConfig, OptionType};
use bsm_sweep::contract::{OptionContract, Param, ParamOverrides};
use bsm_sweep::error::PricingError;
use bsm_sweep::sweep::{Portfolio, SweepSpec};
use bsm_sweep::Greek;

fn main() {
    println!("Error Handling Demo for bsm-sweep");
    println!("=================================\n");

    // Test 1: Invalid contract parameters
    println!("1. Testing negative underlying price...");

    match OptionContract::new(OptionType::Call, -100.0, 100.0, 1.0, 0.2, 0.05, 0.0) {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(e) => println!("   ✓ Caught error: {}", e),
    }

    // Test 2: Neither volatility nor market price
    println!("\n2. Testing missing volatility and market price...");

    let missing = OptionContract::builder(OptionType::Put)
        .spot(100.0)
        .strike(95.0)
        .time_to_expiry(0.5)
        .build();
    match missing {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(e) => println!("   ✓ Caught error: {}", e),
    }

    // Test 3: Both volatility and market price
    println!("\n3. Testing conflicting volatility and market price...");

    let conflicting = OptionContract::builder(OptionType::Put)
        .spot(100.0)
        .strike(95.0)
        .time_to_expiry(0.5)
        .volatility(0.2)
        .market_price(3.0)
        .build();
    match conflicting {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(e) => println!("   ✓ Caught error: {}", e),
    }

    // Test 4: Quote below the no-arbitrage bound
    println!("\n4. Testing market price below intrinsic value...");

    let params = BsParams {
        s0: 120.0,
        k: 100.0,
        vol: 0.2,
        r: 0.05,
        t: 1.0,
        q: 0.0,
    };
    match implied_volatility(OptionType::Call, 5.0, &params, &ImpliedVolConfig::default()) {
        Ok(vol) => println!("   Unexpected: Solved vol = {}", vol),
        Err(e) => println!("   ✓ Caught error [{:?}]: {}", e.category(), e),
    }

    // Test 5: Invalid sweeps
    println!("\n5. Testing invalid sweep specifications...");

    let opt = OptionContract::new(OptionType::Call, 100.0, 100.0, 1.0, 0.2, 0.05, 0.0)
        .expect("Valid option");
    let too_many = SweepSpec::new()
        .axis(Param::S0, 80.0, 120.0, 5)
        .axis(Param::K, 80.0, 120.0, 5)
        .axis(Param::Vol, 0.1, 0.5, 5)
        .axis(Param::T, 0.1, 1.0, 5);
    for spec in [
        SweepSpec::new(),
        too_many,
        SweepSpec::new().axis(Param::Vol, -0.1, 0.5, 5),
        SweepSpec::new().axis(Param::S0, 80.0, 120.0, 0),
    ] {
        match opt.sweep(&spec, GreekSet::PRICE) {
            Ok(_) => println!("   Unexpected: Should have failed!"),
            Err(e) => println!("   ✓ Caught error [{:?}]: {}", e.category(), e),
        }
    }

    // Test 6: Unknown names fail rather than being skipped
    println!("\n6. Testing unknown output name...");

    match opt.sweep_named(&[("S0", (80.0, 120.0, 5))], &["price", "lambda"]) {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(PricingError::UnknownOutput { name }) => {
            println!("   ✓ Caught UnknownOutput: '{}'", name);
        }
        Err(other) => println!("   Unexpected error type: {}", other),
    }

    // Test 7: Elasticity cannot be summed across legs
    println!("\n7. Testing non-additive portfolio output...");

    let portfolio = Portfolio::from_legs(vec![opt.clone()]);
    match portfolio.value(Greek::Omega) {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(e) => println!("   ✓ Caught error: {}", e),
    }

    // Test 8: Valid evaluation should work
    println!("\n8. Testing valid evaluation...");

    let overrides = ParamOverrides::new().s0(105.0);
    println!(
        "   ✓ Success: Price = {:.4}, Delta = {:.4}",
        opt.price(&overrides),
        opt.delta(&overrides)
    );

    // Test 9: Error type matching
    println!("\n9. Testing error type matching...");

    match OptionContract::new(OptionType::Put, 100.0, 100.0, 1.0, 0.0, 0.05, 0.0) {
        Ok(_) => println!("   Unexpected: Should have failed!"),
        Err(PricingError::InvalidParameters {
            parameter,
            value,
            constraint,
        }) => {
            println!("   ✓ Caught InvalidParameters: {} = {} ({})", parameter, value, constraint);
        }
        Err(other) => println!("   Unexpected error type: {}", other),
    }

    println!("\n✓ Error handling demo complete!");
    println!("All error cases were properly caught and handled.");
}
