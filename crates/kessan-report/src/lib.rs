//! Markdown rendering of a completed [`AnalysisReport`].

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use kessan_core::{AnalysisError, AnalysisReport};

/// Render the report body. Pure function of the report and timestamp so
/// output is testable without touching the clock or filesystem.
pub fn render_markdown(report: &AnalysisReport, generated_at: DateTime<Local>) -> String {
    let mut md = Vec::new();

    md.push(format!("# 企業分析レポート: {}", report.company_name));
    md.push(format!("**決算期**: {}", report.fiscal_period));
    md.push(format!("**現在株価**: {} 円", report.stock_price));
    md.push(format!("**分析日**: {}", generated_at.format("%Y-%m-%d %H:%M")));
    md.push(String::new());

    md.push("## 1. バリュエーション指標".to_string());
    if report.valuations.is_empty() {
        md.push("（データ不足のため算出不能）".to_string());
    } else {
        for (key, value) in [
            ("PER", &report.valuations.per),
            ("PBR", &report.valuations.pbr),
            ("PEG", &report.valuations.peg),
        ] {
            if let Some(value) = value {
                md.push(format!("- **{key}**: {value}"));
            }
        }
    }
    md.push(String::new());

    md.push("## 2. 定量分析結果 (基準照合)".to_string());
    md.push("| 項目 | 値 | 判定 | 詳細 |".to_string());
    md.push("|---|---|---|---|".to_string());
    for ev in &report.evaluations {
        md.push(format!(
            "| {} | {} | **{}** | {} |",
            ev.metric_name, ev.value, ev.assessment, ev.details
        ));
    }
    md.push(String::new());

    md.push("## 3. 定性分析".to_string());
    let qa = &report.qualitative_analysis;
    md.push("### 業績進捗".to_string());
    md.push(qa.progress_comment.clone());
    md.push("### 将来戦略".to_string());
    md.push(qa.future_strategy.clone());
    md.push("### リスク要因".to_string());
    md.push(qa.risk_factors.clone());
    md.push("### 経営陣の姿勢".to_string());
    md.push(qa.management_attitude.clone());
    md.push("### コスト効率性".to_string());
    md.push(qa.cost_efficiency.clone());

    md.join("\n")
}

/// Writes rendered reports under a fixed output directory.
pub struct Reporter {
    output_dir: PathBuf,
}

impl Reporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write `<company>_<YYYY-MM-DD>.md`, creating the output directory
    /// if needed. Returns the written path.
    pub fn write_markdown(&self, report: &AnalysisReport) -> Result<PathBuf, AnalysisError> {
        let now = Local::now();
        let filename = format!("{}_{}.md", report.company_name, now.format("%Y-%m-%d"));
        let path = self.output_dir.join(filename);

        fs::create_dir_all(&self.output_dir)
            .map_err(|e| AnalysisError::ReportIo(format!("{}: {e}", self.output_dir.display())))?;
        fs::write(&path, render_markdown(report, now))
            .map_err(|e| AnalysisError::ReportIo(format!("{}: {e}", path.display())))?;

        tracing::info!(path = %path.display(), "report written");
        Ok(path)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kessan_core::{EvaluationResult, QualitativeAnalysis, Valuations};

    fn sample_report() -> AnalysisReport {
        AnalysisReport {
            company_name: "テスト株式会社".to_string(),
            fiscal_period: "2024年3月期 第2四半期".to_string(),
            stock_price: 1500.0,
            evaluations: vec![EvaluationResult::new(
                "売上高成長率(YoY)",
                "30.00%",
                "Top Class",
            )],
            qualitative_analysis: QualitativeAnalysis {
                progress_comment: "順調".to_string(),
                ..Default::default()
            },
            valuations: Valuations {
                per: Some("15.00倍".to_string()),
                pbr: Some("1.50倍".to_string()),
                peg: None,
            },
        }
    }

    #[test]
    fn test_render_sections() {
        let md = render_markdown(&sample_report(), Local::now());

        assert!(md.contains("# 企業分析レポート: テスト株式会社"));
        assert!(md.contains("**決算期**: 2024年3月期 第2四半期"));
        assert!(md.contains("**現在株価**: 1500 円"));
        assert!(md.contains("- **PER**: 15.00倍"));
        assert!(md.contains("- **PBR**: 1.50倍"));
        assert!(!md.contains("PEG"));
        assert!(md.contains("| 売上高成長率(YoY) | 30.00% | **Top Class** |  |"));
        assert!(md.contains("### 業績進捗\n順調"));
    }

    #[test]
    fn test_render_empty_valuations_placeholder() {
        let mut report = sample_report();
        report.valuations = Valuations::default();
        let md = render_markdown(&report, Local::now());
        assert!(md.contains("（データ不足のため算出不能）"));
    }

    #[test]
    fn test_write_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = Reporter::new(dir.path().join("output"));
        let path = reporter.write_markdown(&sample_report()).unwrap();

        assert!(path.exists());
        let body = fs::read_to_string(&path).unwrap();
        assert!(body.contains("テスト株式会社"));
    }
}
