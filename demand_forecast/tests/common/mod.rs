#![allow(dead_code)]

use demand_forecast::aggregate::{MonthlyRecord, MonthlyTable};
use demand_forecast::features::{build_features, FeatureMatrix};
use demand_forecast::models::EnsembleConfig;
use demand_forecast::utils::{add_months, month_key};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Consecutive monthly records of one SKU starting at `year`-`month`
pub fn history(
    sku: &str,
    year: i32,
    month: u32,
    consumption: &[f64],
    balance: &[f64],
) -> Vec<MonthlyRecord> {
    consumption
        .iter()
        .zip(balance)
        .enumerate()
        .map(|(i, (&c, &b))| {
            let (y, m) = add_months(year, month, i as u32);
            MonthlyRecord {
                sku: sku.to_string(),
                month: month_key(y, m),
                consumption: c,
                balance: b,
            }
        })
        .collect()
}

pub fn monthly_table(histories: Vec<Vec<MonthlyRecord>>) -> MonthlyTable {
    MonthlyTable::from_records(histories.into_iter().flatten().collect())
}

/// Three SKUs with a year of history each: 27 feature rows
pub fn sample_matrix() -> FeatureMatrix {
    let steady: Vec<f64> = (0..12).map(|i| 40.0 + (i % 3) as f64).collect();
    let growing: Vec<f64> = (0..12).map(|i| 10.0 + 2.0 * i as f64).collect();
    let seasonal: Vec<f64> = (0..12)
        .map(|i| if i % 4 == 0 { 90.0 } else { 30.0 })
        .collect();
    let balance = |c: &[f64]| -> Vec<f64> { c.iter().map(|x| 2.0 * x + 5.0).collect() };

    let table = monthly_table(vec![
        history("S1", 2023, 1, &steady, &balance(&steady)),
        history("S2", 2023, 1, &growing, &balance(&growing)),
        history("S3", 2023, 1, &seasonal, &balance(&seasonal)),
    ]);
    build_features(&table).unwrap()
}

/// A smaller ensemble that keeps tests quick
pub fn fast_config() -> EnsembleConfig {
    EnsembleConfig {
        forest_trees: 15,
        boosting_stages: 25,
        ..EnsembleConfig::default()
    }
}

/// Kardex-style CSV: an opening balance then one outflow per month per SKU
pub fn write_kardex(dir: &Path, months: u32) -> PathBuf {
    let mut text = String::from("id_insumo,fecha,tipo,canti salida,saldo final,promedio_fin\n");
    for (sku, base, cost) in [("A1", 20.0, 2.5), ("B2", 55.0, 10.0), ("C3", 5.0, 1.0)] {
        let mut balance = base * (months as f64 + 2.0);
        writeln!(text, "{},01/12/2022 08:00:00,SALDO INICIAL,0,{},{}", sku, balance, cost).unwrap();
        for i in 0..months {
            let (year, month) = add_months(2023, 1, i);
            let quantity = base + (i % 3) as f64;
            balance -= quantity;
            writeln!(
                text,
                "{},15/{:02}/{} 10:30:00,SALIDAS,{},{},{}",
                sku, month, year, quantity, balance, cost
            )
            .unwrap();
        }
    }

    let path = dir.join("kardex.csv");
    fs::write(&path, text).unwrap();
    path
}
