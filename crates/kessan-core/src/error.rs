use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Criteria file error: {0}")]
    CriteriaIo(String),

    #[error("Criteria parse error: {0}")]
    CriteriaParse(String),

    #[error("Criteria structure error: {0}")]
    CriteriaStructure(String),

    #[error("Report output error: {0}")]
    ReportIo(String),
}
