use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of a single Cloud Build build, plus the synthetic values the
/// resolver and the HTTP layer introduce.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(from = "String", into = "String")]
pub enum BuildStatus {
    Success,
    Failure,
    InternalError,
    Timeout,
    Queued,
    Working,
    Cancelled,
    #[default]
    StatusUnknown,
    /// No conclusive build exists for the identifier.
    NotFound,
    /// A status string the API returned that we do not know about.
    Unrecognized(String),
}

impl From<String> for BuildStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "SUCCESS" => BuildStatus::Success,
            "FAILURE" => BuildStatus::Failure,
            "INTERNAL_ERROR" => BuildStatus::InternalError,
            "TIMEOUT" => BuildStatus::Timeout,
            "QUEUED" => BuildStatus::Queued,
            "WORKING" => BuildStatus::Working,
            "CANCELLED" => BuildStatus::Cancelled,
            "STATUS_UNKNOWN" => BuildStatus::StatusUnknown,
            "NOT_FOUND" => BuildStatus::NotFound,
            _ => BuildStatus::Unrecognized(s),
        }
    }
}

impl From<&str> for BuildStatus {
    fn from(s: &str) -> Self {
        BuildStatus::from(s.to_string())
    }
}

impl From<BuildStatus> for String {
    fn from(status: BuildStatus) -> Self {
        status.as_str().to_string()
    }
}

impl BuildStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BuildStatus::Success => "SUCCESS",
            BuildStatus::Failure => "FAILURE",
            BuildStatus::InternalError => "INTERNAL_ERROR",
            BuildStatus::Timeout => "TIMEOUT",
            BuildStatus::Queued => "QUEUED",
            BuildStatus::Working => "WORKING",
            BuildStatus::Cancelled => "CANCELLED",
            BuildStatus::StatusUnknown => "STATUS_UNKNOWN",
            BuildStatus::NotFound => "NOT_FOUND",
            BuildStatus::Unrecognized(s) => s,
        }
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One build as reported by the build source, most recent first.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct BuildRecord {
    #[serde(default)]
    pub status: BuildStatus,
    #[serde(rename = "logUrl", default, skip_serializing_if = "Option::is_none")]
    pub log_url: Option<String>,
}

#[cfg(test)]
impl BuildRecord {
    pub fn new(status: impl Into<BuildStatus>) -> Self {
        Self {
            status: status.into(),
            log_url: None,
        }
    }
}

/// Builds that are still running, waiting, or were cancelled say nothing
/// about the health of the project and are skipped by [`resolve`].
pub fn is_inconclusive(status: &BuildStatus) -> bool {
    matches!(
        status,
        BuildStatus::Working | BuildStatus::Queued | BuildStatus::Cancelled
    )
}

/// Reduce a most-recent-first sequence of builds to the status shown on the badge.
pub fn resolve<'a, I>(records: I) -> BuildStatus
where
    I: IntoIterator<Item = &'a BuildRecord>,
{
    resolve_with(records, is_inconclusive)
}

/// Returns the status of the first record `skip` rejects, or
/// [`BuildStatus::NotFound`] when every record is skipped. Records after the
/// selected one are never pulled from the iterator.
pub fn resolve_with<'a, I, F>(records: I, skip: F) -> BuildStatus
where
    I: IntoIterator<Item = &'a BuildRecord>,
    F: Fn(&BuildStatus) -> bool,
{
    records
        .into_iter()
        .map(|record| &record.status)
        .find(|status| !skip(status))
        .cloned()
        .unwrap_or(BuildStatus::NotFound)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn records(statuses: &[&str]) -> Vec<BuildRecord> {
        statuses.iter().map(|s| BuildRecord::new(*s)).collect()
    }

    #[test]
    fn empty_history_is_not_found() {
        assert_eq!(resolve(&Vec::<BuildRecord>::new()), BuildStatus::NotFound);
    }

    #[test]
    fn only_inconclusive_builds_is_not_found() {
        let history = records(&["WORKING", "QUEUED", "CANCELLED", "WORKING"]);
        assert_eq!(resolve(&history), BuildStatus::NotFound);
        assert_eq!(resolve(&records(&["WORKING"])), BuildStatus::NotFound);
    }

    #[test]
    fn cancelled_build_is_skipped() {
        let history = records(&["CANCELLED", "SUCCESS"]);
        assert_eq!(resolve(&history), BuildStatus::Success);
    }

    #[test]
    fn most_recent_conclusive_build_wins() {
        let history = records(&["FAILURE", "SUCCESS"]);
        assert_eq!(resolve(&history), BuildStatus::Failure);

        let history = records(&["QUEUED", "WORKING", "TIMEOUT", "SUCCESS"]);
        assert_eq!(resolve(&history), BuildStatus::Timeout);
    }

    #[test]
    fn scan_stops_at_selected_record() {
        let history = records(&["WORKING", "SUCCESS", "FAILURE", "FAILURE"]);
        let mut inspected = 0;
        let status = resolve(history.iter().inspect(|_| inspected += 1));
        assert_eq!(status, BuildStatus::Success);
        assert_eq!(inspected, 2);
    }

    #[test]
    fn unrecognized_status_passes_through() {
        let history = records(&["QUEUED", "EXPIRED", "SUCCESS"]);
        assert_eq!(
            resolve(&history),
            BuildStatus::Unrecognized("EXPIRED".to_string())
        );
        assert_eq!(
            resolve(&records(&["STATUS_UNKNOWN"])),
            BuildStatus::StatusUnknown
        );
    }

    #[test]
    fn custom_skip_predicate() {
        let history = records(&["CANCELLED", "SUCCESS"]);
        let status = resolve_with(&history, |s| matches!(s, BuildStatus::Working));
        assert_eq!(status, BuildStatus::Cancelled);
    }

    #[test]
    fn status_strings_round_trip_through_serde() {
        let record: BuildRecord =
            serde_json::from_str(r#"{"status":"WORKING","logUrl":"https://x"}"#).unwrap();
        assert_eq!(record.status, BuildStatus::Working);
        assert_eq!(record.log_url.as_deref(), Some("https://x"));

        let missing: BuildRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.status, BuildStatus::StatusUnknown);

        let json = serde_json::to_string(&BuildStatus::InternalError).unwrap();
        assert_eq!(json, r#""INTERNAL_ERROR""#);
    }
}
