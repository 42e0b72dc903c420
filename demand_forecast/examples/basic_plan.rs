use demand_forecast::aggregate::{aggregate_monthly, AggregationConfig};
use demand_forecast::data::{TransactionRow, TransactionTable};
use demand_forecast::features::build_features;
use demand_forecast::horizon::{aggregate_horizon, Horizon};
use demand_forecast::models::{EnsembleConfig, EnsembleForecaster};
use demand_forecast::policy::{plan, ReplenishmentPolicy};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    demand_forecast::logging::init();

    // Eight months of outflows for two SKUs
    let mut rows = Vec::new();
    for (sku, base, mut balance) in [("TORNILLO-8", 120.0, 900.0), ("GUANTE-L", 15.0, 20.0)] {
        for month in 1..=8u32 {
            let quantity = base + (month % 3) as f64 * base * 0.1;
            balance -= quantity;
            rows.push(TransactionRow::outflow(
                sku,
                &format!("10/{:02}/2024 09:00:00", month),
                "SALIDAS",
                quantity,
                balance.max(0.0),
            ));
        }
    }
    let transactions = TransactionTable::from_rows(rows);

    let monthly = aggregate_monthly(&transactions, &AggregationConfig::default());
    let features = build_features(&monthly)?;
    println!(
        "{} monthly records, {} feature rows",
        monthly.len(),
        features.len()
    );

    let mut forecaster = EnsembleForecaster::new(EnsembleConfig::default());
    let report = forecaster.train(&features)?;
    println!("{}", report.metrics);

    let policy = ReplenishmentPolicy::default();
    for decision in plan(&forecaster, &features.latest_per_sku(), &policy)? {
        println!(
            "{:<12} predicted {:>8.2}  on hand {:>6}  order {:>5}  {} [{}]",
            decision.sku,
            decision.predicted,
            decision.balance,
            decision.order_quantity,
            decision.recommendation,
            decision.priority
        );
    }

    for h in aggregate_horizon(&forecaster, &features, &policy, Horizon::Quarterly) {
        println!("{:<12} next quarter: order {}", h.sku, h.order_quantity);
    }

    Ok(())
}
