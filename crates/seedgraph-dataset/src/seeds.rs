//! Seed query files.
//!
//! Accepted shapes:
//! - JSON list: `[{"id": "q1", "query": "..."}, ...]` (bare strings get `qN` ids)
//! - JSON domains: `{"technology": [...], "business": [...]}`
//! - plain text: one query per line, ids `q1..qN`; blank lines and `#` comments skipped

use crate::error::{DatasetError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedQuery {
    pub id: String,
    pub query: String,
}

impl SeedQuery {
    pub fn new(id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            query: query.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeedEntry {
    Full { id: String, query: String },
    Bare(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeedDocument {
    List(Vec<SeedEntry>),
    Domains(BTreeMap<String, Vec<SeedEntry>>),
}

fn number_entries(entries: Vec<SeedEntry>, prefix: &str) -> Vec<SeedQuery> {
    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| match entry {
            SeedEntry::Full { id, query } => SeedQuery { id, query },
            SeedEntry::Bare(query) => SeedQuery::new(format!("{prefix}{}", i + 1), query),
        })
        .collect()
}

/// Seeds grouped by domain, in domain-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSet {
    pub domains: BTreeMap<String, Vec<SeedQuery>>,
}

impl SeedSet {
    pub fn single(domain: impl Into<String>, seeds: Vec<SeedQuery>) -> Self {
        Self {
            domains: BTreeMap::from([(domain.into(), seeds)]),
        }
    }

    /// Parse file contents; JSON is tried first when the text starts with
    /// `[` or `{`. Ungrouped seeds land in `default_domain`.
    pub fn parse(text: &str, default_domain: &str) -> std::result::Result<Self, String> {
        let trimmed = text.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            let doc: SeedDocument = serde_json::from_str(text).map_err(|e| e.to_string())?;
            return Ok(match doc {
                SeedDocument::List(entries) => {
                    Self::single(default_domain, number_entries(entries, "q"))
                }
                SeedDocument::Domains(domains) => Self {
                    domains: domains
                        .into_iter()
                        .map(|(domain, entries)| {
                            let seeds = number_entries(entries, &format!("{domain}_q"));
                            (domain, seeds)
                        })
                        .collect(),
                },
            });
        }

        let seeds = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .enumerate()
            .map(|(i, line)| SeedQuery::new(format!("q{}", i + 1), line))
            .collect();
        Ok(Self::single(default_domain, seeds))
    }

    pub fn load(path: &Path, default_domain: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
        let set = Self::parse(&text, default_domain).map_err(|message| DatasetError::Seeds {
            path: path.to_path_buf(),
            message,
        })?;
        if set.is_empty() {
            return Err(DatasetError::Seeds {
                path: path.to_path_buf(),
                message: "no seed queries found".to_string(),
            });
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.domains.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All seeds in domain order.
    pub fn all(&self) -> Vec<SeedQuery> {
        self.domains.values().flatten().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_seeds_are_numbered() {
        let set = SeedSet::parse(
            "# travel\nWhat are popular attractions in Seattle?\n\n  Where is the nearest coffee shop?  \n",
            "travel",
        )
        .unwrap();
        assert_eq!(
            set.domains["travel"],
            vec![
                SeedQuery::new("q1", "What are popular attractions in Seattle?"),
                SeedQuery::new("q2", "Where is the nearest coffee shop?"),
            ]
        );
    }

    #[test]
    fn json_list_keeps_ids() {
        let set = SeedSet::parse(
            r#"[{"id": "sci1", "query": "What is DNA?"}, "Explain entropy."]"#,
            "default",
        )
        .unwrap();
        let seeds = &set.domains["default"];
        assert_eq!(seeds[0].id, "sci1");
        assert_eq!(seeds[1], SeedQuery::new("q2", "Explain entropy."));
    }

    #[test]
    fn json_domains_group_seeds() {
        let set = SeedSet::parse(
            r#"{
                "technology": [{"id": "tech1", "query": "What is cloud computing?"}],
                "business": ["What is a SWOT analysis?", "How does supply chain optimization work?"]
            }"#,
            "ignored",
        )
        .unwrap();
        assert_eq!(set.domains.keys().collect::<Vec<_>>(), vec!["business", "technology"]);
        assert_eq!(set.domains["business"][1].id, "business_q2");
        assert_eq!(set.len(), 3);
        assert_eq!(set.all()[2].id, "tech1");
    }

    #[test]
    fn malformed_and_empty_files_fail() {
        assert!(SeedSet::parse("[{\"id\": 1}]", "d").is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seeds.txt");
        std::fs::write(&path, "# only comments\n").unwrap();
        let err = SeedSet::load(&path, "d").unwrap_err();
        assert!(err.to_string().contains("no seed queries"));
    }
}
