//! The evaluation pipeline: every known metric attempted in a fixed
//! order, missing inputs skipping the metric instead of failing.

use kessan_core::{
    AnalysisReport, EvaluationResult, FinancialRecord, QualitativeAnalysis, Quarter, Valuations,
};
use kessan_criteria::{BsCriteria, CriteriaStore, PlCriteria};

use crate::classify::{classify, Direction};
use crate::metrics;

/// Everything a metric evaluator may look at for one run.
struct EvalContext<'a> {
    current: &'a FinancialRecord,
    prior: Option<&'a FinancialRecord>,
    quarter: Quarter,
    pl: &'a PlCriteria,
    bs: &'a BsCriteria,
}

type MetricEvaluator = fn(&EvalContext<'_>) -> Option<EvaluationResult>;

/// The full metric table, in output order. Each entry checks its own
/// presence guards and returns `None` on insufficient data or missing
/// thresholds — the normal skip path, never an error.
const PIPELINE: &[MetricEvaluator] = &[
    progress_rate_sales,
    progress_rate_operating_profit,
    revenue_growth_yoy,
    operating_margin,
    margin_improvement_yoy,
    equity_ratio,
    current_ratio,
    de_ratio,
    operating_cf_vs_profit,
    operating_cf_margin,
    investing_cf_sign,
    free_cash_flow,
];

/// Evaluates financial records against the loaded criteria.
///
/// Holds no mutable state; `evaluate` is a pure function of its inputs
/// and the criteria, so repeated calls with identical inputs produce
/// identical reports.
pub struct EvaluationEngine {
    criteria: CriteriaStore,
}

impl EvaluationEngine {
    pub fn new(criteria: CriteriaStore) -> Self {
        Self { criteria }
    }

    /// Run the full pipeline for one period, optionally against the
    /// prior-year same-quarter record.
    pub fn evaluate(
        &self,
        current: &FinancialRecord,
        prior: Option<&FinancialRecord>,
        stock_price: f64,
    ) -> AnalysisReport {
        let cx = EvalContext {
            current,
            prior,
            quarter: Quarter::from_fiscal_period(&current.fiscal_period),
            pl: self.criteria.pl(),
            bs: self.criteria.bs(),
        };

        let evaluations: Vec<EvaluationResult> =
            PIPELINE.iter().filter_map(|metric| metric(&cx)).collect();

        tracing::debug!(
            company = %current.company_name,
            evaluated = evaluations.len(),
            attempted = PIPELINE.len(),
            "evaluation pipeline complete"
        );

        AnalysisReport {
            company_name: current.company_name.clone(),
            fiscal_period: current.fiscal_period.clone(),
            stock_price,
            evaluations,
            qualitative_analysis: QualitativeAnalysis {
                progress_comment: current.progress_comment.clone(),
                future_strategy: current.future_strategy.clone(),
                risk_factors: current.risk_factors.clone(),
                management_attitude: current.management_attitude.clone(),
                cost_efficiency: current.cost_efficiency_comment.clone(),
            },
            valuations: build_valuations(current, prior, stock_price),
        }
    }
}

// --- P/L metrics ---

fn progress_rate_sales(cx: &EvalContext<'_>) -> Option<EvaluationResult> {
    let sales = cx.current.net_sales?;
    let forecast = cx.current.forecast_net_sales?;
    let rate = metrics::progress_rate(sales, forecast)?;
    let good = cx.pl.progress_rate_sales.good?;
    let bad = cx.pl.progress_rate_sales.bad?;

    let assessment = if rate >= good {
        "Good"
    } else if rate <= bad {
        "Bad"
    } else {
        "Neutral"
    };

    Some(
        EvaluationResult::new("通期進捗率(売上)", format!("{rate:.2}%"), assessment)
            .with_details(format!("Forecast: {forecast}")),
    )
}

fn progress_rate_operating_profit(cx: &EvalContext<'_>) -> Option<EvaluationResult> {
    let profit = cx.current.operating_profit?;
    let forecast = cx.current.forecast_operating_profit?;
    let rate = metrics::progress_rate(profit, forecast)?;
    // Unresolvable quarter silently disables this metric
    let tag = cx.quarter.tag()?;
    let band = cx.pl.progress_rate_op.for_quarter(cx.quarter)?;
    let good = band.good?;
    let bad = band.bad?;

    let assessment = if rate >= good {
        "Good"
    } else if rate <= bad {
        "Bad"
    } else {
        "Neutral"
    };

    Some(
        EvaluationResult::new("通期進捗率(営業利益)", format!("{rate:.2}%"), assessment)
            .with_details(format!("Quarter: {tag}, Forecast: {forecast}")),
    )
}

fn revenue_growth_yoy(cx: &EvalContext<'_>) -> Option<EvaluationResult> {
    let current = cx.current.net_sales?;
    let prior = cx.prior?.net_sales?;
    let growth = metrics::yoy_growth(current, prior)?;
    let t = &cx.pl.revenue_growth_yoy.thresholds;

    let assessment = classify(
        growth,
        Direction::HigherIsBetter,
        &[
            ("Top Class", t.top_class),
            ("Excellent", t.excellent),
            ("Pass", t.pass),
        ],
        "Fail",
    )?;

    Some(EvaluationResult::new(
        "売上高成長率(YoY)",
        format!("{growth:.2}%"),
        assessment,
    ))
}

fn operating_margin(cx: &EvalContext<'_>) -> Option<EvaluationResult> {
    let profit = cx.current.operating_profit?;
    let sales = cx.current.net_sales?;
    let margin = metrics::margin(profit, sales)?;
    let target = cx.pl.operating_margin.default_target?;

    let assessment = if margin >= target { "Good" } else { "Low" };

    Some(
        EvaluationResult::new("営業利益率", format!("{margin:.2}%"), assessment)
            .with_details(format!("Target (Gen): {target}%")),
    )
}

fn margin_improvement_yoy(cx: &EvalContext<'_>) -> Option<EvaluationResult> {
    let current_margin = metrics::margin(cx.current.operating_profit?, cx.current.net_sales?)?;
    let prior = cx.prior?;
    let prior_margin = metrics::margin(prior.operating_profit?, prior.net_sales?)?;
    let delta = current_margin - prior_margin;
    let band = &cx.pl.margin_improvement;

    let assessment = classify(
        delta,
        Direction::HigherIsBetter,
        &[("Excellent", band.excellent), ("Improving", band.pass)],
        "Declining",
    )?;

    Some(
        EvaluationResult::new("営業利益率改善(YoY)", format!("{delta:+.2}pt"), assessment)
            .with_details(format!(
                "Margin: {current_margin:.2}% (prior {prior_margin:.2}%)"
            )),
    )
}

// --- B/S metrics ---

fn equity_ratio(cx: &EvalContext<'_>) -> Option<EvaluationResult> {
    let ratio = cx.current.equity_ratio?;
    let band = &cx.bs.capital_adequacy_ratio;

    let assessment = classify(
        ratio,
        Direction::HigherIsBetter,
        &[("Ironclad", band.ironclad), ("Safe", band.safe)],
        "Attention",
    )?;

    Some(EvaluationResult::new(
        "自己資本比率",
        format!("{ratio:.2}%"),
        assessment,
    ))
}

fn current_ratio(cx: &EvalContext<'_>) -> Option<EvaluationResult> {
    let assets = cx.current.current_assets?;
    let liabilities = cx.current.current_liabilities?;
    let ratio = metrics::current_ratio(assets, liabilities)?;
    let band = &cx.bs.current_ratio;

    let assessment = classify(
        ratio,
        Direction::HigherIsBetter,
        &[
            ("Very Safe", band.very_safe),
            ("Safe", band.safe),
            ("OK", band.danger),
        ],
        "Danger",
    )?;

    Some(EvaluationResult::new(
        "流動比率",
        format!("{ratio:.2}%"),
        assessment,
    ))
}

fn de_ratio(cx: &EvalContext<'_>) -> Option<EvaluationResult> {
    let debt = cx.current.interest_bearing_debt?;
    let net_assets = cx.current.total_net_assets?;
    let ratio = metrics::de_ratio(debt, net_assets)?;
    let band = &cx.bs.de_ratio;

    let assessment = classify(
        ratio,
        Direction::LowerIsBetter,
        &[
            ("Very Safe", band.very_safe),
            ("Healthy", band.healthy),
            ("Caution", band.danger),
        ],
        "Danger",
    )?;

    Some(EvaluationResult::new(
        "D/Eレシオ",
        format!("{ratio:.2}倍"),
        assessment,
    ))
}

// --- Cash-flow metrics ---

fn operating_cf_vs_profit(cx: &EvalContext<'_>) -> Option<EvaluationResult> {
    let ocf = cx.current.operating_cf?;
    let profit = cx.current.operating_profit?;

    let assessment = if ocf > profit { "Good" } else { "Bad" };

    Some(EvaluationResult::new(
        "営業CF > 営業利益",
        format!("CF:{ocf} vs OP:{profit}"),
        assessment,
    ))
}

fn operating_cf_margin(cx: &EvalContext<'_>) -> Option<EvaluationResult> {
    let ocf = cx.current.operating_cf?;
    let sales = cx.current.net_sales?;
    let ocf_margin = metrics::margin(ocf, sales)?;
    // Missing operating profit counts as a 0% margin for this comparison
    let op_margin = cx
        .current
        .operating_profit
        .and_then(|profit| metrics::margin(profit, sales))
        .unwrap_or(0.0);

    let assessment = if ocf_margin > op_margin {
        "Good"
    } else {
        "Lower than OP Margin"
    };

    Some(EvaluationResult::new(
        "営業CFマージン > 営業利益率",
        format!("OCF%:{ocf_margin:.2}% vs OP%:{op_margin:.2}%"),
        assessment,
    ))
}

fn investing_cf_sign(cx: &EvalContext<'_>) -> Option<EvaluationResult> {
    let icf = cx.current.investment_cf?;

    let assessment = if icf < 0.0 {
        "Normal"
    } else {
        "Attention (Positive)"
    };

    Some(EvaluationResult::new("投資CF", format!("{icf}"), assessment))
}

fn free_cash_flow(cx: &EvalContext<'_>) -> Option<EvaluationResult> {
    let ocf = cx.current.operating_cf?;
    let icf = cx.current.investment_cf?;
    let fcf = metrics::free_cash_flow(ocf, icf);

    let assessment = if fcf > 0.0 { "Positive" } else { "Negative" };

    Some(EvaluationResult::new(
        "フリーキャッシュフロー(FCF)",
        format!("{fcf}"),
        assessment,
    ))
}

// --- Valuations ---

fn build_valuations(
    current: &FinancialRecord,
    prior: Option<&FinancialRecord>,
    stock_price: f64,
) -> Valuations {
    let mut valuations = Valuations::default();

    let per = current.eps.and_then(|eps| metrics::per(stock_price, eps));
    if let Some(per) = per {
        valuations.per = Some(format!("{per:.2}倍"));
    }

    if let Some(pbr) = current.bps.and_then(|bps| metrics::pbr(stock_price, bps)) {
        valuations.pbr = Some(format!("{pbr:.2}倍"));
    }

    // PEG needs a computable PER and positive EPS growth off a positive base
    if let (Some(per), Some(eps), Some(prior)) = (per, current.eps, prior) {
        if let Some(prior_eps) = prior.eps.filter(|&e| e > 0.0) {
            let peg = metrics::yoy_growth(eps, prior_eps)
                .and_then(|growth| metrics::peg(per, growth));
            if let Some(peg) = peg {
                valuations.peg = Some(format!("{peg:.2}倍"));
            }
        }
    }

    valuations
}

#[cfg(test)]
mod tests {
    use super::*;

    const CRITERIA: &str = r#"
analysis:
  pl:
    progress_rate_sales:
      good: 55.0
      bad: 45.0
    progress_rate_op:
      "1Q": { good: 30.0, bad: 20.0 }
      "2Q": { good: 55.0, bad: 45.0 }
      "3Q": { good: 80.0, bad: 70.0 }
      "通期": { good: 100.0, bad: 95.0 }
    revenue_growth_yoy:
      thresholds:
        top_class: 20.0
        excellent: 16.0
        pass: 10.0
    operating_margin:
      default_target: 10.0
    margin_improvement:
      excellent: 2.0
      pass: 0.0
  bs:
    capital_adequacy_ratio:
      ironclad: 50.0
      safe: 30.0
    current_ratio:
      very_safe: 200.0
      safe: 150.0
      danger: 100.0
    de_ratio:
      very_safe: 0.3
      healthy: 1.0
      danger: 2.0
"#;

    fn engine() -> EvaluationEngine {
        EvaluationEngine::new(CriteriaStore::from_yaml(CRITERIA).unwrap())
    }

    fn find<'a>(report: &'a AnalysisReport, metric: &str) -> &'a EvaluationResult {
        report
            .evaluations
            .iter()
            .find(|e| e.metric_name == metric)
            .unwrap_or_else(|| panic!("metric {metric} missing from report"))
    }

    fn has(report: &AnalysisReport, metric: &str) -> bool {
        report.evaluations.iter().any(|e| e.metric_name == metric)
    }

    #[test]
    fn test_yoy_growth_top_class() {
        let current = FinancialRecord {
            net_sales: Some(1300.0),
            operating_profit: Some(100.0),
            ..Default::default()
        };
        let prior = FinancialRecord {
            net_sales: Some(1000.0),
            operating_profit: Some(80.0),
            ..Default::default()
        };
        let report = engine().evaluate(&current, Some(&prior), 1000.0);

        let yoy = find(&report, "売上高成長率(YoY)");
        assert_eq!(yoy.value, "30.00%");
        assert_eq!(yoy.assessment, "Top Class");
    }

    #[test]
    fn test_yoy_growth_pass_band() {
        let current = FinancialRecord {
            net_sales: Some(1150.0),
            ..Default::default()
        };
        let prior = FinancialRecord {
            net_sales: Some(1000.0),
            ..Default::default()
        };
        let report = engine().evaluate(&current, Some(&prior), 1000.0);
        assert_eq!(find(&report, "売上高成長率(YoY)").assessment, "Pass");
    }

    #[test]
    fn test_yoy_growth_boundary_is_top_class() {
        // growth exactly at the top_class cutoff classifies as Top Class
        let current = FinancialRecord {
            net_sales: Some(1200.0),
            ..Default::default()
        };
        let prior = FinancialRecord {
            net_sales: Some(1000.0),
            ..Default::default()
        };
        let report = engine().evaluate(&current, Some(&prior), 1000.0);
        let yoy = find(&report, "売上高成長率(YoY)");
        assert_eq!(yoy.value, "20.00%");
        assert_eq!(yoy.assessment, "Top Class");
    }

    #[test]
    fn test_yoy_skipped_without_prior_record() {
        let current = FinancialRecord {
            net_sales: Some(1300.0),
            ..Default::default()
        };
        let report = engine().evaluate(&current, None, 1000.0);
        assert!(!has(&report, "売上高成長率(YoY)"));
    }

    #[test]
    fn test_valuations() {
        let current = FinancialRecord {
            eps: Some(100.0),
            bps: Some(1000.0),
            ..Default::default()
        };
        let report = engine().evaluate(&current, None, 1500.0);

        assert_eq!(report.valuations.per.as_deref(), Some("15.00倍"));
        assert_eq!(report.valuations.pbr.as_deref(), Some("1.50倍"));
        assert_eq!(report.valuations.peg, None);
    }

    #[test]
    fn test_peg_with_positive_eps_growth() {
        let current = FinancialRecord {
            eps: Some(120.0),
            ..Default::default()
        };
        let prior = FinancialRecord {
            eps: Some(100.0),
            ..Default::default()
        };
        let report = engine().evaluate(&current, Some(&prior), 1800.0);

        // PER 15.00, EPS growth 20% -> PEG 0.75
        assert_eq!(report.valuations.per.as_deref(), Some("15.00倍"));
        assert_eq!(report.valuations.peg.as_deref(), Some("0.75倍"));
    }

    #[test]
    fn test_peg_requires_positive_prior_eps() {
        let current = FinancialRecord {
            eps: Some(120.0),
            ..Default::default()
        };
        let prior = FinancialRecord {
            eps: Some(-50.0),
            ..Default::default()
        };
        let report = engine().evaluate(&current, Some(&prior), 1800.0);
        assert_eq!(report.valuations.peg, None);
    }

    #[test]
    fn test_equity_ratio_ironclad() {
        let current = FinancialRecord {
            equity_ratio: Some(60.0),
            ..Default::default()
        };
        let report = engine().evaluate(&current, None, 1000.0);
        let eq = find(&report, "自己資本比率");
        assert_eq!(eq.assessment, "Ironclad");
        assert_eq!(eq.value, "60.00%");
    }

    #[test]
    fn test_current_ratio_bands() {
        let mut current = FinancialRecord {
            current_assets: Some(300.0),
            current_liabilities: Some(100.0),
            ..Default::default()
        };
        let report = engine().evaluate(&current, None, 1000.0);
        assert_eq!(find(&report, "流動比率").assessment, "Very Safe");

        current.current_assets = Some(90.0);
        let report = engine().evaluate(&current, None, 1000.0);
        assert_eq!(find(&report, "流動比率").assessment, "Danger");
    }

    #[test]
    fn test_de_ratio_lower_is_better() {
        // exactly at the very_safe cutoff, inclusive
        let current = FinancialRecord {
            interest_bearing_debt: Some(30.0),
            total_net_assets: Some(100.0),
            ..Default::default()
        };
        let report = engine().evaluate(&current, None, 1000.0);
        let de = find(&report, "D/Eレシオ");
        assert_eq!(de.value, "0.30倍");
        assert_eq!(de.assessment, "Very Safe");

        let leveraged = FinancialRecord {
            interest_bearing_debt: Some(250.0),
            total_net_assets: Some(100.0),
            ..Default::default()
        };
        let report = engine().evaluate(&leveraged, None, 1000.0);
        assert_eq!(find(&report, "D/Eレシオ").assessment, "Danger");
    }

    #[test]
    fn test_cash_flow_metrics() {
        let current = FinancialRecord {
            operating_cf: Some(120.0),
            operating_profit: Some(100.0),
            net_sales: Some(1000.0),
            investment_cf: Some(-50.0),
            ..Default::default()
        };
        let report = engine().evaluate(&current, None, 1000.0);

        assert_eq!(find(&report, "営業CF > 営業利益").assessment, "Good");
        assert_eq!(find(&report, "営業CFマージン > 営業利益率").assessment, "Good");
        assert_eq!(find(&report, "投資CF").assessment, "Normal");
        let fcf = find(&report, "フリーキャッシュフロー(FCF)");
        assert_eq!(fcf.assessment, "Positive");
        assert_eq!(fcf.value, "70");
    }

    #[test]
    fn test_positive_investing_cf_flagged() {
        let current = FinancialRecord {
            investment_cf: Some(40.0),
            ..Default::default()
        };
        let report = engine().evaluate(&current, None, 1000.0);
        assert_eq!(find(&report, "投資CF").assessment, "Attention (Positive)");
    }

    #[test]
    fn test_progress_rate_sales() {
        let current = FinancialRecord {
            net_sales: Some(600.0),
            forecast_net_sales: Some(1000.0),
            ..Default::default()
        };
        let report = engine().evaluate(&current, None, 1000.0);
        let prog = find(&report, "通期進捗率(売上)");
        assert_eq!(prog.value, "60.00%");
        assert_eq!(prog.assessment, "Good");
    }

    #[test]
    fn test_progress_rate_operating_profit_quarter_specific() {
        let current = FinancialRecord {
            operating_profit: Some(60.0),
            forecast_operating_profit: Some(100.0),
            fiscal_period: "2024年3月期 第2四半期".to_string(),
            ..Default::default()
        };
        let report = engine().evaluate(&current, None, 1000.0);
        let prog = find(&report, "通期進捗率(営業利益)");
        assert_eq!(prog.value, "60.00%");
        assert_eq!(prog.assessment, "Good");

        // Same figures in 1Q are well past the 30% bar too, but in the
        // full-year period they fall below the 95% bad cutoff
        let full_year = FinancialRecord {
            fiscal_period: "2024年3月期 通期".to_string(),
            ..current.clone()
        };
        let report = engine().evaluate(&full_year, None, 1000.0);
        assert_eq!(find(&report, "通期進捗率(営業利益)").assessment, "Bad");
    }

    #[test]
    fn test_unresolvable_quarter_skips_op_progress() {
        let current = FinancialRecord {
            operating_profit: Some(60.0),
            forecast_operating_profit: Some(100.0),
            fiscal_period: "2024年3月期".to_string(),
            ..Default::default()
        };
        let report = engine().evaluate(&current, None, 1000.0);
        assert!(!has(&report, "通期進捗率(営業利益)"));
    }

    #[test]
    fn test_margin_improvement() {
        let current = FinancialRecord {
            net_sales: Some(1000.0),
            operating_profit: Some(120.0),
            ..Default::default()
        };
        let prior = FinancialRecord {
            net_sales: Some(1000.0),
            operating_profit: Some(100.0),
            ..Default::default()
        };
        let report = engine().evaluate(&current, Some(&prior), 1000.0);
        let imp = find(&report, "営業利益率改善(YoY)");
        assert_eq!(imp.value, "+2.00pt");
        assert_eq!(imp.assessment, "Excellent");

        let report = engine().evaluate(&prior, Some(&current), 1000.0);
        assert_eq!(find(&report, "営業利益率改善(YoY)").assessment, "Declining");
    }

    #[test]
    fn test_empty_record_yields_empty_report() {
        let record = FinancialRecord::default();
        let report = engine().evaluate(&record, None, 1000.0);
        assert!(report.evaluations.is_empty());
        assert!(report.valuations.is_empty());
    }

    #[test]
    fn test_zero_denominators_are_skipped() {
        let current = FinancialRecord {
            net_sales: Some(0.0),
            operating_profit: Some(100.0),
            forecast_net_sales: Some(0.0),
            eps: Some(0.0),
            bps: Some(0.0),
            total_net_assets: Some(0.0),
            interest_bearing_debt: Some(100.0),
            current_liabilities: Some(0.0),
            current_assets: Some(100.0),
            ..Default::default()
        };
        let report = engine().evaluate(&current, None, 1000.0);
        assert!(!has(&report, "営業利益率"));
        assert!(!has(&report, "通期進捗率(売上)"));
        assert!(!has(&report, "流動比率"));
        assert!(!has(&report, "D/Eレシオ"));
        assert!(report.valuations.is_empty());
    }

    #[test]
    fn test_missing_thresholds_suppress_classification() {
        let minimal = "analysis:\n  pl: {}\n  bs: {}\n";
        let engine = EvaluationEngine::new(CriteriaStore::from_yaml(minimal).unwrap());
        let current = FinancialRecord {
            net_sales: Some(1300.0),
            equity_ratio: Some(60.0),
            operating_cf: Some(120.0),
            investment_cf: Some(-50.0),
            ..Default::default()
        };
        let prior = FinancialRecord {
            net_sales: Some(1000.0),
            ..Default::default()
        };
        let report = engine.evaluate(&current, Some(&prior), 1000.0);

        // Banded metrics lose their thresholds and drop out
        assert!(!has(&report, "売上高成長率(YoY)"));
        assert!(!has(&report, "自己資本比率"));
        // Comparison metrics need no thresholds and survive
        assert!(has(&report, "投資CF"));
        assert!(has(&report, "フリーキャッシュフロー(FCF)"));
    }

    #[test]
    fn test_idempotence() {
        let current = FinancialRecord {
            net_sales: Some(1300.0),
            operating_profit: Some(100.0),
            forecast_net_sales: Some(2600.0),
            equity_ratio: Some(60.0),
            eps: Some(100.0),
            bps: Some(1000.0),
            operating_cf: Some(120.0),
            investment_cf: Some(-50.0),
            fiscal_period: "2024年3月期 第2四半期".to_string(),
            company_name: "テスト株式会社".to_string(),
            ..Default::default()
        };
        let prior = FinancialRecord {
            net_sales: Some(1000.0),
            operating_profit: Some(80.0),
            eps: Some(80.0),
            ..Default::default()
        };
        let engine = engine();
        let first = engine.evaluate(&current, Some(&prior), 1000.0);
        let second = engine.evaluate(&current, Some(&prior), 1000.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_qualitative_fields_carried_through() {
        let current = FinancialRecord {
            progress_comment: "順調に進捗".to_string(),
            risk_factors: "為替変動".to_string(),
            ..Default::default()
        };
        let report = engine().evaluate(&current, None, 1000.0);
        assert_eq!(report.qualitative_analysis.progress_comment, "順調に進捗");
        assert_eq!(report.qualitative_analysis.risk_factors, "為替変動");
        assert_eq!(report.qualitative_analysis.future_strategy, "");
    }
}
