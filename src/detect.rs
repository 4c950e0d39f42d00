use std::collections::HashSet;

use crate::model::AppRecord;

/// WeChat mini-program ids all start with this prefix; anything else in
/// the registry belongs to another platform and is not scannable here.
pub const APP_ID_PREFIX: &str = "wx";

/// Phrases that mark a verification page as a suspension or ban notice.
pub const WARNING_TOKENS: &[&str] = &[
    "封禁",
    "永久",
    "违规",
    "违反",
    "暂停服务",
    "故障",
    "涉嫌",
    "涉及",
    "不符",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    InvalidId,
    Blacklisted,
}

pub fn check_record(record: &AppRecord, blacklist: &HashSet<&str>) -> Eligibility {
    if !record.uuid.starts_with(APP_ID_PREFIX) {
        return Eligibility::InvalidId;
    }
    if blacklist.contains(record.uuid.as_str()) {
        return Eligibility::Blacklisted;
    }
    Eligibility::Eligible
}

/// Returns the first warning phrase found in the page title, if any.
/// An empty title never matches.
pub fn matched_token(title: &str) -> Option<&'static str> {
    if title.is_empty() {
        return None;
    }
    WARNING_TOKENS
        .iter()
        .copied()
        .find(|token| title.contains(token))
}

/// Substitutes the app id into the verification URL template.
pub fn detect_url(template: &str, app_id: &str) -> String {
    template.replacen("{}", app_id, 1)
}
