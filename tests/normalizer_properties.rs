use approx::assert_relative_eq;
use box_office_toolkit::{IndexError, PriceIndexTable, RoundingMode, ValueNormalizer, Year};

const AMOUNTS: [u64; 8] = [
    0,
    1,
    999,
    1_000_000,
    11_000_000,
    104_931_801,
    403_354_469,
    9_007_199_254_740_991,
];

fn year(y: u16) -> Year {
    Year::new(y)
}

#[test]
fn test_matches_formula_for_every_known_year() {
    let table = PriceIndexTable::cpi_u();
    for mode in [RoundingMode::HalfEven, RoundingMode::HalfAwayFromZero] {
        let normalizer = ValueNormalizer::new(&table, mode);
        for y in table.years() {
            let ratio = table.reference_value() / table.index_for(y).unwrap();
            for &amount in &AMOUNTS[..AMOUNTS.len() - 1] {
                let expected = mode.apply(amount as f64 * ratio) as u64;
                assert_eq!(normalizer.normalize(amount, y).unwrap(), expected, "{amount} in {y}");
            }
        }
    }
}

#[test]
fn test_reference_year_is_identity() {
    let table = PriceIndexTable::cpi_u();
    let normalizer = ValueNormalizer::new(&table, RoundingMode::HalfEven);
    for &amount in AMOUNTS.iter().chain([u64::MAX].iter()) {
        assert_eq!(
            normalizer.normalize(amount, table.reference_year()).unwrap(),
            amount
        );
    }
}

#[test]
fn test_zero_is_zero_in_every_year() {
    let table = PriceIndexTable::cpi_u();
    let normalizer = ValueNormalizer::new(&table, RoundingMode::HalfEven);
    for y in table.years() {
        assert_eq!(normalizer.normalize(0, y).unwrap(), 0);
    }
}

#[test]
fn test_monotonic_in_amount() {
    let table = PriceIndexTable::cpi_u();
    let normalizer = ValueNormalizer::new(&table, RoundingMode::HalfEven);
    for y in table.years() {
        let mut prev = 0;
        for amount in (0..5_000u64).chain((1_000_000..1_002_000).step_by(7)) {
            let adjusted = normalizer.normalize(amount, y).unwrap();
            assert!(adjusted >= prev, "{amount} in {y}: {adjusted} < {prev}");
            prev = adjusted;
        }
    }
}

#[test]
fn test_unknown_year_fails_for_any_amount() {
    let table = PriceIndexTable::cpi_u();
    let normalizer = ValueNormalizer::new(&table, RoundingMode::HalfEven);
    for y in [1978, 1980, 2000, 2099] {
        for &amount in &AMOUNTS {
            assert_eq!(
                normalizer.normalize(amount, year(y)),
                Err(IndexError::UnknownYear(year(y)))
            );
        }
    }
}

#[test]
fn test_scenario_1979_million() {
    let table = PriceIndexTable::cpi_u();
    let normalizer = ValueNormalizer::new(&table, RoundingMode::HalfEven);
    // 1,000,000 * 319.1 / 72.6 = 4,395,316.804...
    assert_relative_eq!(
        normalizer.ratio(year(1979)).unwrap() * 1_000_000.0,
        4_395_316.804,
        epsilon = 1e-3
    );
    assert_eq!(normalizer.normalize(1_000_000, year(1979)).unwrap(), 4_395_317);
}

#[test]
fn test_scenario_reference_year_half_million() {
    let table = PriceIndexTable::cpi_u();
    let normalizer = ValueNormalizer::new(&table, RoundingMode::HalfEven);
    assert_eq!(normalizer.normalize(500_000, year(2025)).unwrap(), 500_000);
}

#[test]
fn test_scenario_2099_unknown() {
    let table = PriceIndexTable::cpi_u();
    let normalizer = ValueNormalizer::new(&table, RoundingMode::HalfEven);
    let err = normalizer.normalize(1, year(2099)).unwrap_err();
    assert_eq!(err, IndexError::UnknownYear(year(2099)));
    assert_eq!(err.to_string(), "No price index recorded for year 2099");
}

#[test]
fn test_synthetic_table_injection() {
    let table = PriceIndexTable::new(vec![(year(2000), 50.0), (year(2020), 100.0)], year(2020)).unwrap();
    let normalizer = ValueNormalizer::new(&table, RoundingMode::HalfEven);
    assert_eq!(normalizer.normalize(1_234, year(2000)).unwrap(), 2_468);
    assert!(normalizer.normalize(1_234, year(2025)).is_err());
}
