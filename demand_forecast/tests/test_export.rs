use assert_approx_eq::assert_approx_eq;
use demand_forecast::data::{TransactionRow, TransactionTable};
use demand_forecast::export::{
    decisions_to_dataframe, horizon_headers, save_decisions, write_decisions, write_horizon,
};
use demand_forecast::finance::{coverage_days, CoverageReport, CoverageStatus, FinancialSummary};
use demand_forecast::horizon::{Horizon, HorizonDecision};
use demand_forecast::policy::{Decision, Priority, Recommendation};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::tempdir;

fn decision(sku: &str, balance: f64, predicted: f64, order: u64, priority: Priority) -> Decision {
    Decision {
        sku: sku.to_string(),
        month: 202403,
        consumption: 12.0,
        balance,
        predicted,
        order_quantity: order,
        recommendation: Recommendation::classify(order, predicted, balance),
        priority,
    }
}

fn decisions() -> Vec<Decision> {
    vec![
        decision("A1", 2.0, 20.0, 22, Priority::Alta),
        decision("B2", 500.0, 10.0, 0, Priority::Baja),
        decision("C3", 15.0, 12.346, 1, Priority::Media),
    ]
}

#[test]
fn test_write_decisions() {
    let mut buffer = Vec::new();

    write_decisions(&mut buffer, &decisions()).unwrap();

    let text = String::from_utf8(buffer).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        "id_insumo,mes,consumo,saldo final,consumo_predicho,cantidad_comprar,recomendacion,prioridad"
    );
    assert_eq!(
        lines[1],
        "A1,2024-03,12,2,20,22,COMPRAR NORMAL - Demanda esperada,ALTA"
    );
    assert_eq!(lines[3], "C3,2024-03,12,15,12.35,1,COMPRAR MÍNIMO - Reposición básica,MEDIA");
}

#[test]
fn test_write_horizon() {
    let plan = vec![HorizonDecision {
        sku: "A1".to_string(),
        horizon: Horizon::Quarterly,
        predicted: 60.0,
        order_quantity: 66,
        balance: 2.0,
        priority: Priority::Alta,
    }];
    let mut buffer = Vec::new();

    write_horizon(&mut buffer, Horizon::Quarterly, &plan).unwrap();

    let text = String::from_utf8(buffer).unwrap();
    assert_eq!(
        text,
        "id_insumo,consumo_trimestral_predicho,cantidad_comprar_trimestral,saldo final,prioridad\n\
         A1,60,66,2,ALTA\n"
    );
    assert_eq!(horizon_headers(Horizon::Annual)[2], "cantidad_comprar_anual");
}

#[test]
fn test_save_decisions_to_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plan.csv");

    save_decisions(&path, &decisions()).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 4);
    assert!(text.contains("NO COMPRAR - Exceso de stock"));
}

#[test]
fn test_decisions_to_dataframe() {
    let df = decisions_to_dataframe(&decisions()).unwrap();

    assert_eq!(df.shape(), (3, 8));
    assert_eq!(
        df.get_column_names(),
        vec![
            "id_insumo",
            "mes",
            "consumo",
            "saldo final",
            "consumo_predicho",
            "cantidad_comprar",
            "recomendacion",
            "prioridad"
        ]
    );
}

#[test]
fn test_financial_summary() {
    let transactions = TransactionTable::from_rows(vec![
        TransactionRow::outflow("A1", "01/03/2024", "SALIDAS", 5.0, 10.0).with_unit_cost(3.0),
        TransactionRow::outflow("A1", "20/03/2024", "SALIDAS", 8.0, 2.0),
        TransactionRow::outflow("B2", "20/03/2024", "SALIDAS", 1.0, 500.0).with_unit_cost(7.0),
        TransactionRow::outflow("C3", "20/03/2024", "SALIDAS", 1.0, 15.0),
    ]);

    let summary = FinancialSummary::compute(&transactions, &decisions());

    assert_approx_eq!(summary.inventory_on_hand, 517.0);
    // A1 at its last known cost; C3 has no cost
    assert_approx_eq!(summary.purchase_cost, 66.0);
    assert_approx_eq!(summary.stockout_risk_value, 66.0);
    assert_eq!(summary.skus_at_risk, 1);
}

#[test]
fn test_coverage_report() {
    let report = CoverageReport::compute(&decisions());

    assert_eq!(report.entries.len(), 3);
    assert_eq!(report.entries[0].status, CoverageStatus::StockoutRisk);
    assert_eq!(report.entries[1].status, CoverageStatus::Overstock);
    assert_eq!(report.entries[2].status, CoverageStatus::Optimal);
    assert_eq!(report.count(CoverageStatus::Overstock), 1);
    assert_approx_eq!(report.entries[0].coverage_days, 3.0);
    assert_eq!(report.with_status(CoverageStatus::StockoutRisk)[0].sku, "A1");
    assert_eq!(coverage_days(10.0, 0.0), 0.0);
}
