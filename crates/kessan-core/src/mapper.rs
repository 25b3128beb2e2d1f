//! Boundary between the upstream extraction service and the engine.
//!
//! The extraction output is structurally trusted but not semantically:
//! any branch may be null or missing, and numeric fields may arrive as
//! the wrong type. Everything here collapses to `None` / empty string
//! instead of failing.

use serde_json::Value;

use crate::types::FinancialRecord;

/// Numeric field lookup. Non-numeric values (strings, booleans, nested
/// objects) collapse to `None` per the malformed-input rule.
fn num(section: &Value, key: &str) -> Option<f64> {
    section.get(key).and_then(Value::as_f64)
}

fn text(section: &Value, key: &str) -> String {
    section
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn text_or(section: &Value, key: &str, default: &str) -> String {
    match section.get(key).and_then(Value::as_str) {
        Some(s) => s.to_string(),
        None => default.to_string(),
    }
}

/// Map an arbitrary extraction payload into a [`FinancialRecord`].
///
/// Sub-objects are identified by the fixed keys `basic_info`, `pl`,
/// `bs`, `cf` and `qualitative`; a missing sub-object behaves as an
/// empty mapping. Never errors.
pub fn map_json(data: &Value) -> FinancialRecord {
    let pl = data.get("pl").cloned().unwrap_or(Value::Null);
    let bs = data.get("bs").cloned().unwrap_or(Value::Null);
    let cf = data.get("cf").cloned().unwrap_or(Value::Null);
    let ql = data.get("qualitative").cloned().unwrap_or(Value::Null);
    let basic = data.get("basic_info").cloned().unwrap_or(Value::Null);

    FinancialRecord {
        net_sales: num(&pl, "net_sales"),
        operating_profit: num(&pl, "operating_profit"),
        ordinary_profit: num(&pl, "ordinary_profit"),
        net_income: num(&pl, "net_income"),
        eps: num(&pl, "eps"),

        forecast_net_sales: num(&pl, "forecast_net_sales"),
        forecast_operating_profit: num(&pl, "forecast_operating_profit"),
        forecast_net_income: num(&pl, "forecast_net_income"),

        total_assets: num(&bs, "total_assets"),
        total_net_assets: num(&bs, "total_net_assets"),
        current_assets: num(&bs, "current_assets"),
        current_liabilities: num(&bs, "current_liabilities"),
        quick_assets: num(&bs, "quick_assets"),
        interest_bearing_debt: num(&bs, "interest_bearing_debt"),
        equity_ratio: num(&bs, "equity_ratio"),
        bps: num(&bs, "bps"),

        operating_cf: num(&cf, "operating_cf"),
        investment_cf: num(&cf, "investment_cf"),
        financing_cf: num(&cf, "financing_cf"),

        progress_comment: text(&ql, "progress_comment"),
        future_strategy: text(&ql, "future_strategy"),
        risk_factors: text(&ql, "risk_factors"),
        management_attitude: text(&ql, "management_attitude"),
        cost_efficiency_comment: text(&ql, "cost_efficiency_comment"),

        company_name: text_or(&basic, "company_name", "Unknown"),
        fiscal_period: text_or(&basic, "fiscal_period", "Unknown"),
    }
}
