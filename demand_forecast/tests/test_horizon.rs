mod common;

use assert_approx_eq::assert_approx_eq;
use chrono::NaiveDate;
use common::{fast_config, sample_matrix};
use demand_forecast::horizon::{aggregate_horizon, horizon_labels, upcoming_labels, Horizon};
use demand_forecast::models::EnsembleForecaster;
use demand_forecast::policy::{plan, ReplenishmentPolicy};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
#[case("monthly", Horizon::Monthly, 1)]
#[case("Mensual", Horizon::Monthly, 1)]
#[case("quarterly", Horizon::Quarterly, 3)]
#[case("trimestral", Horizon::Quarterly, 3)]
#[case(" annual ", Horizon::Annual, 12)]
#[case("anual", Horizon::Annual, 12)]
fn test_parse_horizon(#[case] text: &str, #[case] expected: Horizon, #[case] periods: u32) {
    let horizon: Horizon = text.parse().unwrap();
    assert_eq!(horizon, expected);
    assert_eq!(horizon.periods(), periods);
}

#[test]
fn test_unknown_horizon() {
    assert!("weekly".parse::<Horizon>().is_err());
}

#[test]
fn test_labels_wrap_year() {
    let today = NaiveDate::from_ymd_opt(2024, 11, 15).unwrap();

    assert_eq!(horizon_labels(Horizon::Monthly, today), vec!["2024-12"]);
    assert_eq!(
        horizon_labels(Horizon::Quarterly, today),
        vec!["2024-12", "2025-01", "2025-02"]
    );
}

#[test]
fn test_annual_labels() {
    let today = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();

    let labels = horizon_labels(Horizon::Annual, today);

    assert_eq!(labels.len(), 12);
    assert_eq!(labels.first().map(String::as_str), Some("2024-02"));
    assert_eq!(labels.last().map(String::as_str), Some("2025-01"));
}

#[test]
fn test_upcoming_labels_length() {
    assert_eq!(upcoming_labels(Horizon::Quarterly).len(), 3);
}

#[test]
fn test_horizon_sums_repeated_months() {
    let matrix = sample_matrix();
    let mut forecaster = EnsembleForecaster::new(fast_config());
    forecaster.train(&matrix).unwrap();
    let policy = ReplenishmentPolicy::default();

    let monthly = plan(&forecaster, &matrix.latest_per_sku(), &policy).unwrap();
    let quarterly = aggregate_horizon(&forecaster, &matrix, &policy, Horizon::Quarterly);
    let annual = aggregate_horizon(&forecaster, &matrix, &policy, Horizon::Annual);

    assert_eq!(quarterly.len(), monthly.len());
    assert_eq!(annual.len(), monthly.len());
    for ((month, quarter), year) in monthly.iter().zip(&quarterly).zip(&annual) {
        assert_eq!(quarter.sku, month.sku);
        assert_eq!(quarter.horizon, Horizon::Quarterly);
        assert_approx_eq!(quarter.predicted, 3.0 * month.predicted, 1e-9);
        assert_eq!(quarter.order_quantity, 3 * month.order_quantity);
        assert_eq!(quarter.balance, month.balance);
        assert_eq!(quarter.priority, month.priority);
        assert_approx_eq!(year.predicted, 12.0 * month.predicted, 1e-9);
        assert_eq!(year.order_quantity, 12 * month.order_quantity);
    }
}

#[test]
fn test_horizon_fails_safe() {
    let untrained = EnsembleForecaster::new(fast_config());

    let plan = aggregate_horizon(
        &untrained,
        &sample_matrix(),
        &ReplenishmentPolicy::default(),
        Horizon::Quarterly,
    );

    assert!(plan.is_empty());
}

#[test]
fn test_horizon_ignores_older_rows() {
    let matrix = sample_matrix();
    let mut forecaster = EnsembleForecaster::new(fast_config());
    forecaster.train(&matrix).unwrap();
    let policy = ReplenishmentPolicy::default();

    let full = aggregate_horizon(&forecaster, &matrix, &policy, Horizon::Annual);
    let latest = aggregate_horizon(
        &forecaster,
        &matrix.latest_per_sku(),
        &policy,
        Horizon::Annual,
    );

    assert!(matrix.len() > full.len());
    assert_eq!(full.len(), latest.len());
    for (a, b) in full.iter().zip(&latest) {
        assert_eq!(a.sku, b.sku);
        assert_approx_eq!(a.predicted, b.predicted, 1e-9);
        assert_eq!(a.order_quantity, b.order_quantity);
    }
}
