use std::path::PathBuf;

use serde::Serialize;

/// One target domain paired with the file the scanner writes its report to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanJob {
    pub target: String,
    pub output_path: PathBuf,
}

impl ScanJob {
    pub fn new(target: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            output_path: output_path.into(),
        }
    }
}
