use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::model::{Status, TorrentRecord};

#[derive(Debug, Clone, Default)]
pub struct FilterList {
    keywords: Vec<String>,
    case_sensitive: bool,
}

impl FilterList {
    pub fn new(case_sensitive: bool) -> Self {
        FilterList {
            keywords: Vec::new(),
            case_sensitive,
        }
    }

    // Keywords are comma separated; all whitespace is noise, so the file can
    // be one line or many and indented however the user likes.
    pub fn parse(text: &str, case_sensitive: bool) -> Self {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let keywords = compact
            .split(',')
            .filter(|word| !word.is_empty())
            .map(|word| {
                if case_sensitive {
                    word.to_string()
                } else {
                    word.to_lowercase()
                }
            })
            .collect();
        FilterList {
            keywords,
            case_sensitive,
        }
    }

    pub fn load(path: &Path, case_sensitive: bool) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read filter file {}", path.display()))?;
        Ok(FilterList::parse(&text, case_sensitive))
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn excludes(&self, name: &str) -> bool {
        if self.keywords.is_empty() {
            return false;
        }
        let haystack = if self.case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        };
        self.keywords.iter().any(|word| haystack.contains(word.as_str()))
    }
}

pub fn retain_visible(records: &mut Vec<TorrentRecord>, filter: &FilterList, active_only: bool) {
    records.retain(|record| {
        if active_only && !record.status.as_ref().is_some_and(Status::is_active) {
            return false;
        }
        !record
            .name
            .as_deref()
            .is_some_and(|name| filter.excludes(name))
    });
}
