// tests/integration_test.rs
use approx::assert_relative_eq;
use bsm_sweep::analytics::bs_analytic::intrinsic_value;
use bsm_sweep::analytics::{Greek, GreekSet, OptionType};
use bsm_sweep::contract::{
    OptionContract, Param, ParamOverrides, PositionDirection, WeekdayCalendar, TRADING_DAYS_PER_YEAR,
};
use bsm_sweep::error::{ErrorCategory, PricingError};
use bsm_sweep::sweep::{DecaySnapshot, Portfolio, SweepSpec};
use chrono::NaiveDate;
use ndarray::IxDyn;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_reference_call() {
    let call = OptionContract::builder(OptionType::Call)
        .spot(100.0)
        .strike(100.0)
        .time_to_expiry(1.0)
        .volatility(0.2)
        .rate(0.05)
        .build()
        .expect("Valid option");
    let none = ParamOverrides::new();

    let expected = [
        (Greek::Price, 10.450583572185565),
        (Greek::Delta, 0.636830651175619),
        (Greek::Gamma, 0.018762017345847),
        (Greek::Vega, 37.524034691693792),
        (Greek::Theta, -6.414027546438197),
    ];
    for (greek, value) in expected {
        let computed = call.evaluate(greek, &none);
        println!("{:>6}: computed = {:.15}, expected = {:.15}", greek, computed, value);
        assert_relative_eq!(computed, value, max_relative = 1e-9);
    }
}

#[test]
fn test_put_call_parity() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let s0 = rng.gen_range(20.0..200.0);
        let k = rng.gen_range(20.0..200.0);
        let t = rng.gen_range(0.01..5.0);
        let vol = rng.gen_range(0.05..1.0);
        let r = rng.gen_range(-0.02..0.1);
        let q = rng.gen_range(0.0..0.06);

        let call = OptionContract::new(OptionType::Call, s0, k, t, vol, r, q).unwrap();
        let put = OptionContract::new(OptionType::Put, s0, k, t, vol, r, q).unwrap();
        let none = ParamOverrides::new();

        let lhs = call.price(&none) - put.price(&none);
        let rhs = s0 * (-q * t).exp() - k * (-r * t).exp();
        assert!((lhs - rhs).abs() < 1e-9 * s0.max(k), "price parity: {} vs {}", lhs, rhs);

        let delta_gap = call.delta(&none) - put.delta(&none);
        assert!((delta_gap - (-q * t).exp()).abs() < 1e-12);

        let dual_gap = call.dual_delta(&none) - put.dual_delta(&none);
        assert!((dual_gap + (-r * t).exp()).abs() < 1e-12);

        // Second-order terms do not depend on the option type
        assert_relative_eq!(call.gamma(&none), put.gamma(&none), max_relative = 1e-12);
        assert_relative_eq!(call.vega(&none), put.vega(&none), max_relative = 1e-12);
    }
}

#[test]
fn test_short_expiry_converges_to_intrinsic() {
    for otype in [OptionType::Call, OptionType::Put] {
        for k in [80.0, 95.0, 105.0, 120.0] {
            let opt = OptionContract::new(otype, 100.0, k, 1.0, 0.3, 0.03, 0.0).unwrap();
            let near = opt.price(&ParamOverrides::new().t(1e-8));
            let payoff = intrinsic_value(otype, 100.0, k);
            assert!((near - payoff).abs() < 1e-6, "{:?} K={} price {} payoff {}", otype, k, near, payoff);
        }
    }
}

#[test]
fn test_overrides_leave_option_unchanged() {
    let opt = OptionContract::new(OptionType::Put, 100.0, 110.0, 0.5, 0.25, 0.02, 0.0).unwrap();
    let base = opt.price(&ParamOverrides::new());
    let shifted = opt.price(&ParamOverrides::new().s0(90.0).vol(0.35));
    assert!(shifted > base);
    assert_eq!(opt.price(&ParamOverrides::new()), base);
    assert_eq!(opt.s0(), 100.0);
}

#[test]
fn test_expiry_date_uses_trading_days() {
    // Monday 2024-03-04 to Friday 2024-03-15: 9 business days in [start, end)
    let today = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
    let expiry = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

    let opt = OptionContract::builder(OptionType::Call)
        .spot(50.0)
        .strike(52.0)
        .expiry_date(expiry)
        .as_of(today)
        .volatility(0.3)
        .build()
        .unwrap();
    assert_relative_eq!(opt.time_to_expiry(), 10.0 / TRADING_DAYS_PER_YEAR, epsilon = 1e-15);
    assert_eq!(opt.expiry_date(), Some(expiry));
    assert_eq!(opt.rate(), 0.025);

    let holiday = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
    let calendar = WeekdayCalendar::with_holidays([holiday]);
    let with_holiday = OptionContract::builder(OptionType::Call)
        .spot(50.0)
        .strike(52.0)
        .expiry_date(expiry)
        .as_of(today)
        .calendar(&calendar)
        .volatility(0.3)
        .build()
        .unwrap();
    assert_relative_eq!(with_holiday.time_to_expiry(), 9.0 / TRADING_DAYS_PER_YEAR, epsilon = 1e-15);

    let expired = OptionContract::builder(OptionType::Call)
        .spot(50.0)
        .strike(52.0)
        .expiry_date(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
        .as_of(today)
        .volatility(0.3)
        .build();
    assert_eq!(expired.unwrap_err().category(), ErrorCategory::Input);
}

#[test]
fn test_construction_errors() {
    let missing_vol = OptionContract::builder(OptionType::Call)
        .spot(100.0)
        .strike(100.0)
        .time_to_expiry(1.0)
        .build();
    assert!(matches!(missing_vol, Err(PricingError::MissingInput { .. })));

    let both = OptionContract::builder(OptionType::Call)
        .spot(100.0)
        .strike(100.0)
        .time_to_expiry(1.0)
        .volatility(0.2)
        .market_price(10.0)
        .build();
    assert!(matches!(both, Err(PricingError::ConflictingInputs { .. })));

    let negative_strike = OptionContract::new(OptionType::Put, 100.0, -5.0, 1.0, 0.2, 0.05, 0.0);
    assert!(matches!(negative_strike, Err(PricingError::InvalidParameters { .. })));

    assert!("straddle".parse::<OptionType>().is_err());
}

#[test]
fn test_iron_condor_from_market_prices() {
    // Short strangle inside a long strangle, priced from quotes
    let s0 = 334.54;
    let t = 20.0 / TRADING_DAYS_PER_YEAR;
    let leg = |otype: OptionType, k: f64, quote: f64, direction: PositionDirection| {
        OptionContract::builder(otype)
            .direction(direction)
            .spot(s0)
            .strike(k)
            .time_to_expiry(t)
            .market_price(quote)
            .build()
            .expect("Quote inside no-arbitrage bounds")
    };
    let condor = Portfolio::from_legs(vec![
        leg(OptionType::Put, 325.0, 2.0, PositionDirection::Long),
        leg(OptionType::Put, 335.0, 6.5, PositionDirection::Short),
        leg(OptionType::Call, 335.0, 6.8, PositionDirection::Short),
        leg(OptionType::Call, 345.0, 2.4, PositionDirection::Long),
    ]);

    // Net credit received
    let value = condor.value(Greek::Price).unwrap();
    assert_relative_eq!(value, 2.0 - 6.5 - 6.8 + 2.4, epsilon = 1e-8);

    let spec = SweepSpec::new().axis(Param::S0, 300.0, 370.0, 71);
    let gamma = condor.sweep(&spec, Greek::Gamma).unwrap();
    assert_eq!(gamma.values.shape(), &[71]);
    // Short gamma near the body
    assert!(gamma.values[IxDyn(&[35])] < 0.0);

    let profiles = condor.decay_profiles(300.0, 370.0, 71).unwrap();
    let labels: Vec<_> = profiles.iter().map(|p| p.snapshot.label()).collect();
    assert_eq!(labels, vec!["Now", "Half Time", "Expiration"]);
    let expiry = profiles.iter().find(|p| p.snapshot == DecaySnapshot::Expiry).unwrap();
    // Wings cap the loss at the strike gap
    for v in expiry.value.iter() {
        assert!(*v >= -10.0 - 1e-2 && *v <= 1e-2, "expiry value {}", v);
    }

    let table = condor.greeks_table();
    assert_eq!(table.len(), 4);
    for row in &table {
        assert!(row[&Greek::Vega] > 0.0);
    }
}

#[test]
fn test_single_leg_sweep_matches_portfolio() {
    let opt = OptionContract::new(OptionType::Call, 100.0, 100.0, 0.5, 0.2, 0.01, 0.0).unwrap();
    let spec = SweepSpec::new()
        .axis(Param::S0, 90.0, 110.0, 5)
        .axis(Param::Vol, 0.1, 0.3, 3);
    let single = opt.sweep(&spec, GreekSet::CHARM).unwrap();
    let port = Portfolio::from_legs(vec![opt]).sweep(&spec, Greek::Charm).unwrap();
    assert_eq!(single.output(Greek::Charm).unwrap(), &port.values);
}
