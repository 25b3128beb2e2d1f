//! Threshold criteria loaded once at startup and treated as read-only
//! for the process lifetime.
//!
//! Every numeric cutoff lives in the YAML document, not in code; a
//! missing metric block or threshold leaf only suppresses the affected
//! classification, while a missing `pl`/`bs` category is a fatal
//! structure error.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use kessan_core::{AnalysisError, Quarter};

/// A good/bad cutoff pair for progress-rate metrics. Values between the
/// two classify as neutral.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProgressBand {
    pub good: Option<f64>,
    pub bad: Option<f64>,
}

/// Progress-rate cutoffs keyed by quarter tag ("1Q", "2Q", "3Q", "通期").
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct QuarterBands(HashMap<String, ProgressBand>);

impl QuarterBands {
    /// Cutoffs for a resolved quarter; `Unknown` has no tag and yields
    /// nothing, which disables quarter-specific classification.
    pub fn for_quarter(&self, quarter: Quarter) -> Option<&ProgressBand> {
        quarter.tag().and_then(|tag| self.0.get(tag))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GrowthThresholds {
    pub top_class: Option<f64>,
    pub excellent: Option<f64>,
    pub pass: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GrowthCriteria {
    pub thresholds: GrowthThresholds,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MarginCriteria {
    pub default_target: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImprovementBand {
    pub excellent: Option<f64>,
    pub pass: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlCriteria {
    pub progress_rate_sales: ProgressBand,
    pub progress_rate_op: QuarterBands,
    pub revenue_growth_yoy: GrowthCriteria,
    pub operating_margin: MarginCriteria,
    pub margin_improvement: ImprovementBand,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EquityRatioBand {
    pub ironclad: Option<f64>,
    pub safe: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CurrentRatioBand {
    pub very_safe: Option<f64>,
    pub safe: Option<f64>,
    pub danger: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeRatioBand {
    pub very_safe: Option<f64>,
    pub healthy: Option<f64>,
    pub danger: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BsCriteria {
    pub capital_adequacy_ratio: EquityRatioBand,
    pub current_ratio: CurrentRatioBand,
    pub de_ratio: DeRatioBand,
}

/// The statement categories. Both must be present in the document;
/// the engine cannot run without its rule definitions.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisCriteria {
    pub pl: PlCriteria,
    pub bs: BsCriteria,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawDocument {
    analysis: RawAnalysis,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawAnalysis {
    pl: Option<PlCriteria>,
    bs: Option<BsCriteria>,
}

/// Immutable criteria configuration.
#[derive(Debug, Clone)]
pub struct CriteriaStore {
    analysis: AnalysisCriteria,
}

impl CriteriaStore {
    /// Load criteria from a YAML file. The file handle is released
    /// before this returns; nothing is re-read later.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| AnalysisError::CriteriaIo(format!("{}: {e}", path.display())))?;
        let store = Self::from_yaml(&raw)?;
        tracing::debug!(path = %path.display(), "criteria loaded");
        Ok(store)
    }

    /// Parse criteria from a YAML string.
    pub fn from_yaml(raw: &str) -> Result<Self, AnalysisError> {
        let doc: RawDocument =
            serde_yaml::from_str(raw).map_err(|e| AnalysisError::CriteriaParse(e.to_string()))?;

        let pl = doc
            .analysis
            .pl
            .ok_or_else(|| AnalysisError::CriteriaStructure("missing 'analysis.pl' category".to_string()))?;
        let bs = doc
            .analysis
            .bs
            .ok_or_else(|| AnalysisError::CriteriaStructure("missing 'analysis.bs' category".to_string()))?;

        Ok(Self {
            analysis: AnalysisCriteria { pl, bs },
        })
    }

    pub fn pl(&self) -> &PlCriteria {
        &self.analysis.pl
    }

    pub fn bs(&self) -> &BsCriteria {
        &self.analysis.bs
    }
}
