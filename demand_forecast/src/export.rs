//! Delimited and DataFrame export of plans
//!
//! Tables are written with a header row and no index column.

use crate::error::Result;
use crate::horizon::{Horizon, HorizonDecision};
use crate::policy::Decision;
use crate::utils::{month_label, split_month_key};
use polars::prelude::*;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use stock_math::statistics::round_to;
use tracing::info;

pub const DECISION_HEADERS: [&str; 8] = [
    "id_insumo",
    "mes",
    "consumo",
    "saldo final",
    "consumo_predicho",
    "cantidad_comprar",
    "recomendacion",
    "prioridad",
];

fn month_text(key: u32) -> String {
    let (year, month) = split_month_key(key);
    month_label(year, month)
}

/// Column headers of a horizon table
pub fn horizon_headers(horizon: Horizon) -> [String; 5] {
    [
        "id_insumo".to_string(),
        format!("consumo_{}_predicho", horizon.suffix()),
        format!("cantidad_comprar_{}", horizon.suffix()),
        "saldo final".to_string(),
        "prioridad".to_string(),
    ]
}

/// Write the decision table to any writer
pub fn write_decisions<W: Write>(writer: W, decisions: &[Decision]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(DECISION_HEADERS)?;
    for d in decisions {
        wtr.write_record([
            d.sku.clone(),
            month_text(d.month),
            d.consumption.to_string(),
            d.balance.to_string(),
            round_to(d.predicted, 2).to_string(),
            d.order_quantity.to_string(),
            d.recommendation.label().to_string(),
            d.priority.label().to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a horizon table to any writer
pub fn write_horizon<W: Write>(
    writer: W,
    horizon: Horizon,
    plan: &[HorizonDecision],
) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(horizon_headers(horizon))?;
    for h in plan {
        wtr.write_record([
            h.sku.clone(),
            round_to(h.predicted, 2).to_string(),
            h.order_quantity.to_string(),
            h.balance.to_string(),
            h.priority.label().to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the decision table to a file
pub fn save_decisions<P: AsRef<Path>>(path: P, decisions: &[Decision]) -> Result<()> {
    write_decisions(File::create(path.as_ref())?, decisions)?;
    info!(path = %path.as_ref().display(), rows = decisions.len(), "decision table written");
    Ok(())
}

/// Write a horizon table to a file
pub fn save_horizon<P: AsRef<Path>>(
    path: P,
    horizon: Horizon,
    plan: &[HorizonDecision],
) -> Result<()> {
    write_horizon(File::create(path.as_ref())?, horizon, plan)?;
    info!(path = %path.as_ref().display(), rows = plan.len(), horizon = %horizon, "horizon table written");
    Ok(())
}

/// Decision table as a DataFrame with the exported column names
pub fn decisions_to_dataframe(decisions: &[Decision]) -> Result<DataFrame> {
    let skus: Vec<&str> = decisions.iter().map(|d| d.sku.as_str()).collect();
    let months: Vec<String> = decisions.iter().map(|d| month_text(d.month)).collect();
    let consumption: Vec<f64> = decisions.iter().map(|d| d.consumption).collect();
    let balance: Vec<f64> = decisions.iter().map(|d| d.balance).collect();
    let predicted: Vec<f64> = decisions.iter().map(|d| d.predicted).collect();
    let orders: Vec<u64> = decisions.iter().map(|d| d.order_quantity).collect();
    let recommendations: Vec<&str> = decisions.iter().map(|d| d.recommendation.label()).collect();
    let priorities: Vec<&str> = decisions.iter().map(|d| d.priority.label()).collect();

    let df = DataFrame::new(vec![
        Series::new(DECISION_HEADERS[0], skus),
        Series::new(DECISION_HEADERS[1], months),
        Series::new(DECISION_HEADERS[2], consumption),
        Series::new(DECISION_HEADERS[3], balance),
        Series::new(DECISION_HEADERS[4], predicted),
        Series::new(DECISION_HEADERS[5], orders),
        Series::new(DECISION_HEADERS[6], recommendations),
        Series::new(DECISION_HEADERS[7], priorities),
    ])?;
    Ok(df)
}
