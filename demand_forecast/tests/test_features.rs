mod common;

use assert_approx_eq::assert_approx_eq;
use common::{history, monthly_table};
use demand_forecast::aggregate::MonthlyTable;
use demand_forecast::error::ForecastError;
use demand_forecast::features::{build_features, FeatureColumn, FeatureSource};
use pretty_assertions::assert_eq;

#[test]
fn test_rows_start_at_fourth_month() {
    let table = monthly_table(vec![history(
        "X1",
        2024,
        1,
        &[10.0, 12.0, 11.0, 13.0, 9.0],
        &[50.0, 40.0, 35.0, 25.0, 20.0],
    )]);

    let matrix = build_features(&table).unwrap();

    assert_eq!(matrix.len(), 2);
    let months: Vec<u32> = matrix.rows().iter().map(|r| r.month).collect();
    assert_eq!(months, vec![202404, 202405]);

    let row = &matrix.rows()[0];
    assert_eq!(row.consumption_lags, [11.0, 12.0, 10.0]);
    assert_eq!(row.balance_lags, [35.0, 40.0, 50.0]);
    assert_approx_eq!(row.rolling_mean, 12.0);
    assert_eq!(row.quarter, 2);
}

#[test]
fn test_whole_history_statistics() {
    let table = monthly_table(vec![history(
        "X1",
        2024,
        1,
        &[10.0, 12.0, 11.0, 13.0],
        &[50.0, 40.0, 35.0, 25.0],
    )]);

    let matrix = build_features(&table).unwrap();
    let row = &matrix.rows()[0];

    assert_approx_eq!(row.consumption_stats.mean, 11.5);
    // population std, rounded to 2 decimals
    assert_approx_eq!(row.consumption_stats.std_dev, 1.12);
    assert_approx_eq!(row.consumption_stats.min, 10.0);
    assert_approx_eq!(row.consumption_stats.max, 13.0);
    assert_approx_eq!(row.days_of_inventory, 25.0 / (11.5 / 30.0), 1e-9);
}

#[test]
fn test_calendar_flags() {
    let table = monthly_table(vec![history(
        "X1",
        2023,
        10,
        &[1.0, 2.0, 3.0, 4.0],
        &[1.0, 1.0, 1.0, 1.0],
    )]);

    let matrix = build_features(&table).unwrap();
    let row = &matrix.rows()[0];

    assert_eq!(row.month, 202401);
    assert_eq!(row.year, 2024);
    assert_eq!(row.month_number, 1);
    assert!(row.year_end);
    assert!(row.year_start);
    assert_eq!(row.value(FeatureColumn::YearEnd), 1.0);
    assert_eq!(row.value(FeatureColumn::Quarter), 1.0);
}

#[test]
fn test_short_history_yields_no_rows() {
    let table = monthly_table(vec![
        history("A", 2024, 1, &[1.0, 2.0, 3.0], &[9.0, 8.0, 7.0]),
        history("B", 2024, 1, &[5.0, 5.0], &[1.0, 1.0]),
    ]);

    let matrix = build_features(&table).unwrap();

    assert!(matrix.is_empty());
}

#[test]
fn test_empty_monthly_table_is_insufficient() {
    let result = build_features(&MonthlyTable::default());
    assert!(matches!(result, Err(ForecastError::InsufficientData(_))));
}

#[test]
fn test_zero_consumption_gives_zero_days_of_inventory() {
    let table = monthly_table(vec![history(
        "Z",
        2024,
        1,
        &[0.0, 0.0, 0.0, 0.0],
        &[10.0, 10.0, 10.0, 10.0],
    )]);

    let matrix = build_features(&table).unwrap();

    assert_eq!(matrix.rows()[0].days_of_inventory, 0.0);
}

#[test]
fn test_latest_per_sku() {
    let matrix = common::sample_matrix();

    let latest = matrix.latest_per_sku();

    assert_eq!(matrix.len(), 27);
    assert_eq!(matrix.sku_count(), 3);
    assert_eq!(latest.len(), 3);
    assert!(latest.rows().iter().all(|r| r.month == 202312));
    assert_eq!(latest.columns(), matrix.columns());
}

#[test]
fn test_design_matrix_shape() {
    let matrix = common::sample_matrix();

    let design = matrix.design_matrix();

    assert_eq!(design.len(), matrix.len());
    assert!(design.iter().all(|r| r.len() == FeatureColumn::ALL.len()));
    assert_eq!(matrix.targets().len(), matrix.len());
    assert_eq!(matrix.column_names()[0], "mes_num");
}

#[test]
fn test_feature_names_round_trip() {
    for column in FeatureColumn::ALL {
        assert_eq!(FeatureColumn::from_name(column.name()), Some(column));
    }
    assert_eq!(FeatureColumn::from_name("precio"), None);
    assert_eq!(FeatureColumn::DaysOfInventory.source(), FeatureSource::Balance);
    assert_eq!(FeatureColumn::ConsumptionLag1.source(), FeatureSource::Consumption);
    assert!(FeatureColumn::MonthNumber.is_mandatory());
    assert!(!FeatureColumn::BalanceLag2.is_mandatory());
}
