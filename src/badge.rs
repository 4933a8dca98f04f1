use serde::Serialize;
use url::Url;

use crate::build_status::BuildStatus;
use crate::error::{AppError, AppResult};

pub const LABEL: &str = "build";
pub const SCHEMA_VERSION: u32 = 1;
pub const STYLE: &str = "flat";

/// Shield colors understood by the badge service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    BrightGreen,
    Orange,
    Red,
    Blue,
    LightGrey,
}

/// Used for anything the table does not know about
pub const DEFAULT_COLOR: Color = Color::LightGrey;

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::BrightGreen => "brightgreen",
            Color::Orange => "orange",
            Color::Red => "red",
            Color::Blue => "blue",
            Color::LightGrey => "lightgrey",
        }
    }
}

/// The single color table shared by image redirects and badge documents
pub fn color(status: &BuildStatus) -> Color {
    match status {
        BuildStatus::Success => Color::BrightGreen,
        BuildStatus::Failure => Color::Orange,
        BuildStatus::InternalError | BuildStatus::Timeout => Color::Red,
        BuildStatus::Queued | BuildStatus::Working => Color::Blue,
        BuildStatus::Cancelled | BuildStatus::StatusUnknown | BuildStatus::NotFound => {
            Color::LightGrey
        }
        BuildStatus::Unrecognized(_) => DEFAULT_COLOR,
    }
}

pub fn is_error(status: &BuildStatus) -> bool {
    matches!(
        status,
        BuildStatus::Failure | BuildStatus::InternalError | BuildStatus::Timeout
    )
}

/// Human-readable badge message, e.g. "internal error" or "no builds"
pub fn message(status: &BuildStatus) -> String {
    match status {
        BuildStatus::NotFound => "no builds".to_string(),
        other => other.as_str().to_lowercase().replace('_', " "),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation {
    pub message: String,
    pub color: Color,
    pub is_error: bool,
}

/// Shields.io endpoint badge descriptor
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BadgeDocument {
    pub schema_version: u32,
    pub label: &'static str,
    pub message: String,
    pub color: &'static str,
    pub is_error: bool,
    pub style: &'static str,
}

pub fn present(status: &BuildStatus) -> Presentation {
    Presentation {
        message: message(status),
        color: color(status),
        is_error: is_error(status),
    }
}

impl Presentation {
    pub fn document(&self) -> BadgeDocument {
        BadgeDocument {
            schema_version: SCHEMA_VERSION,
            label: LABEL,
            message: self.message.clone(),
            color: self.color.as_str(),
            is_error: self.is_error,
            style: STYLE,
        }
    }

    /// Static badge image URL on the badge service, `query` is passed through
    /// so callers can pick a style or logo.
    pub fn image_url(&self, badge_base: &Url, query: &str) -> AppResult<Url> {
        let segment = format!(
            "{}-{}-{}.svg",
            escape_badge_text(LABEL),
            escape_badge_text(&self.message),
            self.color.as_str()
        );

        let mut url = badge_base.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("badge URL {} cannot be a base", badge_base)))?
            .pop_if_empty()
            .push("badge")
            .push(&segment);
        url.set_query(if query.is_empty() { None } else { Some(query) });

        Ok(url)
    }
}

/// Dashes and underscores separate fields in a static badge path, so they are
/// doubled; spaces are written as a single underscore.
fn escape_badge_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '-' => out.push_str("--"),
            '_' => out.push_str("__"),
            ' ' => out.push('_'),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::build_status::{resolve, BuildRecord};

    const ALL: [BuildStatus; 9] = [
        BuildStatus::Success,
        BuildStatus::Failure,
        BuildStatus::InternalError,
        BuildStatus::Timeout,
        BuildStatus::Queued,
        BuildStatus::Working,
        BuildStatus::Cancelled,
        BuildStatus::StatusUnknown,
        BuildStatus::NotFound,
    ];

    fn shields() -> Url {
        Url::parse("https://img.shields.io").unwrap()
    }

    #[test]
    fn every_status_has_a_color() {
        for status in ALL.iter() {
            assert!(!color(status).as_str().is_empty(), "{status}");
        }
        assert_eq!(
            color(&BuildStatus::Unrecognized("EXPIRED".into())),
            DEFAULT_COLOR
        );
    }

    #[test]
    fn empty_history_presents_as_not_found() {
        let history: Vec<BuildRecord> = Vec::new();
        assert_eq!(
            present(&resolve(&history)),
            present(&BuildStatus::NotFound)
        );
    }

    #[test]
    fn success_after_cancel_is_green() {
        let history = vec![BuildRecord::new("CANCELLED"), BuildRecord::new("SUCCESS")];
        let p = present(&resolve(&history));
        assert_eq!(p.color, Color::BrightGreen);
        assert_eq!(p.message, "success");
        assert!(!p.is_error);
    }

    #[test]
    fn working_only_is_grey() {
        let history = vec![BuildRecord::new("WORKING")];
        let p = present(&resolve(&history));
        assert_eq!(p.color, Color::LightGrey);
        assert_eq!(p.message, "no builds");
    }

    #[test]
    fn failure_is_orange_error() {
        let history = vec![BuildRecord::new("FAILURE"), BuildRecord::new("SUCCESS")];
        let doc = present(&resolve(&history)).document();
        assert_eq!(doc.color, "orange");
        assert!(doc.is_error);
        assert_eq!(doc.message, "failure");
    }

    #[test]
    fn internal_error_document() {
        let doc = present(&BuildStatus::InternalError).document();
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            serde_json::json!({
                "schemaVersion": 1,
                "label": "build",
                "message": "internal error",
                "color": "red",
                "isError": true,
                "style": "flat",
            })
        );
    }

    #[test]
    fn unrecognized_status_message_is_lowercased() {
        let p = present(&BuildStatus::Unrecognized("PENDING".into()));
        assert_eq!(p.message, "pending");
        assert_eq!(p.color, DEFAULT_COLOR);
        assert!(!p.is_error);
    }

    #[test]
    fn image_url_escapes_message() {
        let url = present(&BuildStatus::InternalError)
            .image_url(&shields(), "")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://img.shields.io/badge/build-internal_error-red.svg"
        );

        let url = present(&BuildStatus::Unrecognized("A-B_C".into()))
            .image_url(&shields(), "style=flat-square")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://img.shields.io/badge/build-a--b__c-lightgrey.svg?style=flat-square"
        );
    }

    #[test]
    fn image_url_keeps_base_path() {
        let base = Url::parse("http://badges.internal/shields/").unwrap();
        let url = present(&BuildStatus::Success).image_url(&base, "").unwrap();
        assert_eq!(
            url.as_str(),
            "http://badges.internal/shields/badge/build-success-brightgreen.svg"
        );
    }
}
