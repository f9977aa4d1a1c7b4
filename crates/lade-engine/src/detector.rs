//! `ReportDetector`: a pure query over an archive directory's contents.

// Layer 2: Third-party crate imports
use regex::Regex;

// Layer 3: Internal module imports
use lade_core::error::WorkflowError;
use lade_core::traits::CloudPort;

/// Result of scanning `directory_path` for names matching a detection
/// pattern. Carries no side effects: the detector never writes to the
/// database, it only observes (§4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDetectionResult {
    pub found: bool,
    pub matching_files: Vec<String>,
    pub directory_path: String,
}

/// Lists `dir`'s direct children and returns the subset whose name matches
/// `pattern`.
///
/// # Errors
///
/// Returns [`WorkflowError::Cloud`] if the listing call fails.
pub async fn detect_report<C: CloudPort>(
    dir: &str,
    cloud: &C,
    pattern: &Regex,
) -> Result<ReportDetectionResult, WorkflowError> {
    let entries = cloud.list_files(dir).await?;
    let matching_files: Vec<String> =
        entries.into_iter().filter(|e| pattern.is_match(&e.name)).map(|e| e.name).collect();

    Ok(ReportDetectionResult {
        found: !matching_files.is_empty(),
        matching_files,
        directory_path: dir.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lade_cloud::fake::FakeCloudPort;
    use lade_core::model::AgencyStorageConfig;

    fn pattern() -> Regex {
        Regex::new(AgencyStorageConfig::DEFAULT_REPORT_PATTERN).unwrap()
    }

    #[tokio::test]
    async fn finds_matching_file_case_insensitively() {
        let cloud = FakeCloudPort::new();
        cloud.seed_file("/State Workspace/Archive/12345/Master Documents 2019.pdf");
        cloud.seed_file("/State Workspace/Archive/12345/cover.txt");

        let result = detect_report("/State Workspace/Archive/12345", &cloud, &pattern()).await.unwrap();

        assert!(result.found);
        assert_eq!(result.matching_files, vec!["Master Documents 2019.pdf".to_string()]);
    }

    #[tokio::test]
    async fn no_match_yields_found_false() {
        let cloud = FakeCloudPort::new();
        cloud.seed_file("/State Workspace/Archive/12345/cover.txt");

        let result = detect_report("/State Workspace/Archive/12345", &cloud, &pattern()).await.unwrap();

        assert!(!result.found);
        assert!(result.matching_files.is_empty());
    }

    #[tokio::test]
    async fn empty_directory_yields_found_false() {
        let cloud = FakeCloudPort::new();

        let result = detect_report("/State Workspace/Archive/99999", &cloud, &pattern()).await.unwrap();

        assert!(!result.found);
    }
}
