use serde::{Deserialize, Serialize};

/// Normalized figures for one reporting period.
///
/// Monetary figures are in millions of yen; per-share figures in yen.
/// `None` means "not reported or not extracted" and is never conflated
/// with a reported zero — every derived metric checks presence before
/// dividing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    // P/L
    pub net_sales: Option<f64>,
    pub operating_profit: Option<f64>,
    pub ordinary_profit: Option<f64>,
    pub net_income: Option<f64>,
    pub eps: Option<f64>,

    // Full-year guidance
    pub forecast_net_sales: Option<f64>,
    pub forecast_operating_profit: Option<f64>,
    pub forecast_net_income: Option<f64>,

    // B/S
    pub total_assets: Option<f64>,
    pub total_net_assets: Option<f64>,
    pub current_assets: Option<f64>,
    pub current_liabilities: Option<f64>,
    pub quick_assets: Option<f64>,
    pub interest_bearing_debt: Option<f64>,
    pub equity_ratio: Option<f64>,
    pub bps: Option<f64>,

    // C/F
    pub operating_cf: Option<f64>,
    pub investment_cf: Option<f64>,
    pub financing_cf: Option<f64>,

    // Qualitative commentary, carried through unevaluated
    pub progress_comment: String,
    pub future_strategy: String,
    pub risk_factors: String,
    pub management_attitude: String,
    pub cost_efficiency_comment: String,

    // Meta
    pub company_name: String,
    pub fiscal_period: String,
}

impl Default for FinancialRecord {
    fn default() -> Self {
        Self {
            net_sales: None,
            operating_profit: None,
            ordinary_profit: None,
            net_income: None,
            eps: None,
            forecast_net_sales: None,
            forecast_operating_profit: None,
            forecast_net_income: None,
            total_assets: None,
            total_net_assets: None,
            current_assets: None,
            current_liabilities: None,
            quick_assets: None,
            interest_bearing_debt: None,
            equity_ratio: None,
            bps: None,
            operating_cf: None,
            investment_cf: None,
            financing_cf: None,
            progress_comment: String::new(),
            future_strategy: String::new(),
            risk_factors: String::new(),
            management_attitude: String::new(),
            cost_efficiency_comment: String::new(),
            company_name: "Unknown".to_string(),
            fiscal_period: "Unknown".to_string(),
        }
    }
}

/// Reporting quarter inferred from the free-text fiscal period label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    FullYear,
    /// No recognized quarter marker in the label
    Unknown,
}

impl Quarter {
    /// Infer the quarter from a fiscal period label such as
    /// "2024年3月期 第2四半期". Pure function of the text; unrecognized
    /// labels map to `Unknown` rather than failing.
    pub fn from_fiscal_period(label: &str) -> Self {
        if label.contains("第1四半期") || label.contains("1Q") {
            Quarter::Q1
        } else if label.contains("第2四半期") || label.contains("2Q") || label.contains("中間") {
            Quarter::Q2
        } else if label.contains("第3四半期") || label.contains("3Q") {
            Quarter::Q3
        } else if label.contains("通期") || label.contains("本決算") || label.contains("期末") {
            Quarter::FullYear
        } else {
            Quarter::Unknown
        }
    }

    /// Tag used to key quarter-dependent threshold tables.
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            Quarter::Q1 => Some("1Q"),
            Quarter::Q2 => Some("2Q"),
            Quarter::Q3 => Some("3Q"),
            Quarter::FullYear => Some("通期"),
            Quarter::Unknown => None,
        }
    }
}

/// One classified metric in the output sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub metric_name: String,
    pub value: String,
    pub assessment: String,
    #[serde(default)]
    pub details: String,
}

impl EvaluationResult {
    pub fn new(
        metric_name: impl Into<String>,
        value: impl Into<String>,
        assessment: impl Into<String>,
    ) -> Self {
        Self {
            metric_name: metric_name.into(),
            value: value.into(),
            assessment: assessment.into(),
            details: String::new(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }
}

/// Qualitative commentary, fixed five keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualitativeAnalysis {
    pub progress_comment: String,
    pub future_strategy: String,
    pub risk_factors: String,
    pub management_attitude: String,
    pub cost_efficiency: String,
}

/// Valuation ratios, each present only when computable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Valuations {
    #[serde(rename = "PER", skip_serializing_if = "Option::is_none")]
    pub per: Option<String>,
    #[serde(rename = "PBR", skip_serializing_if = "Option::is_none")]
    pub pbr: Option<String>,
    #[serde(rename = "PEG", skip_serializing_if = "Option::is_none")]
    pub peg: Option<String>,
}

impl Valuations {
    pub fn is_empty(&self) -> bool {
        self.per.is_none() && self.pbr.is_none() && self.peg.is_none()
    }
}

/// Completed assessment for one company and period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub company_name: String,
    pub fiscal_period: String,
    pub stock_price: f64,
    /// Insertion order from the pipeline, stable across runs.
    pub evaluations: Vec<EvaluationResult>,
    pub qualitative_analysis: QualitativeAnalysis,
    pub valuations: Valuations,
}
