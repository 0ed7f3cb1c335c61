use std::env;
use std::path::PathBuf;

const WORKBOOK_VAR: &str = "MEETING_LIST_WORKBOOK";
const TAB_VAR: &str = "MEETING_LIST_TAB";

const DEFAULT_WORKBOOK: &str = "meeting-list.json";
const DEFAULT_TAB: &str = "Meeting List";

/// Where the meeting list lives. Read from the environment on every request.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub workbook: PathBuf,
    pub tab: String,
}

impl Config {
    pub fn from_env() -> Config {
        Config::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        Config {
            workbook: lookup(WORKBOOK_VAR)
                .filter(|path| !path.is_empty())
                .unwrap_or_else(|| DEFAULT_WORKBOOK.to_string())
                .into(),
            tab: lookup(TAB_VAR)
                .filter(|tab| !tab.is_empty())
                .unwrap_or_else(|| DEFAULT_TAB.to_string()),
        }
    }
}
