use crate::rules::RuleName;
use crate::{Result, TriageError};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const CONFIG_FILE_NAME: &str = "event-processor.config";

/// Directories, relative to a repository root, searched for the rules file
pub const SEARCH_LOCATIONS: &[&str] = &[".github", ".github/workflows"];

/// A single entry's value: `On`/`Off` or a YAML/JSON boolean
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RuleSetting {
    Flag(bool),
    Text(String),
}

impl RuleSetting {
    fn enabled(&self) -> std::result::Result<bool, String> {
        match self {
            RuleSetting::Flag(flag) => Ok(*flag),
            RuleSetting::Text(text) if text.eq_ignore_ascii_case("on") => Ok(true),
            RuleSetting::Text(text) if text.eq_ignore_ascii_case("off") => Ok(false),
            RuleSetting::Text(text) => Err(format!("expected On or Off, found '{}'", text)),
        }
    }
}

/// Enabled state for every named rule, fixed for the life of the process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RulesConfiguration {
    rules: HashMap<RuleName, bool>,
}

impl RulesConfiguration {
    /// Load from `path`, or discover the file from the working directory
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let cwd = std::env::current_dir()?;
                Self::discover(&cwd).ok_or_else(|| {
                    TriageError::Config(format!(
                        "{} not found under {} in {} or any parent directory",
                        CONFIG_FILE_NAME,
                        SEARCH_LOCATIONS.join(" or "),
                        cwd.display()
                    ))
                })?
            }
        };
        Self::load_file(&path)
    }

    /// Read one rules file
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TriageError::Config(format!(
                "Rules configuration not found: {}",
                path.display()
            )));
        }

        info!(path = %path.display(), "Loading rules configuration");
        let content = fs::read_to_string(path)?;
        let config: Self = content.parse()?;

        debug!(
            enabled = config.enabled_rules().count(),
            scheduled = config.enabled_rules().filter(|r| r.is_scheduled()).count(),
            configured = config.rules.len(),
            "Rules configuration loaded"
        );
        Ok(config)
    }

    /// Climb from `start` towards the root, returning the first rules file found
    pub fn discover(start: &Path) -> Option<PathBuf> {
        start.ancestors().find_map(|dir| {
            SEARCH_LOCATIONS
                .iter()
                .map(|location| dir.join(location).join(CONFIG_FILE_NAME))
                .find(|candidate| candidate.is_file())
        })
    }

    /// Configuration with exactly `rules` switched on
    pub fn from_rules(rules: impl IntoIterator<Item = RuleName>) -> Self {
        Self {
            rules: rules.into_iter().map(|rule| (rule, true)).collect(),
        }
    }

    pub fn all_enabled() -> Self {
        Self::from_rules(RuleName::ALL)
    }

    /// Rules that are not listed are disabled
    pub fn is_enabled(&self, rule: RuleName) -> bool {
        match self.rules.get(&rule) {
            Some(enabled) => *enabled,
            None => {
                debug!(rule = %rule, "Rule not present in configuration; treating as disabled");
                false
            }
        }
    }

    pub fn enabled_rules(&self) -> impl Iterator<Item = RuleName> + '_ {
        RuleName::ALL
            .into_iter()
            .filter(|rule| self.rules.get(rule).copied().unwrap_or(false))
    }
}

impl std::str::FromStr for RulesConfiguration {
    type Err = TriageError;

    fn from_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let raw: BTreeMap<String, RuleSetting> = serde_yaml::from_str(content)?;
        let mut rules = HashMap::new();
        for (name, setting) in raw {
            let rule = match name.parse::<RuleName>() {
                Ok(rule) => rule,
                Err(e) => {
                    warn!(rule = %name, "{}; ignoring", e);
                    continue;
                }
            };
            let enabled = setting
                .enabled()
                .map_err(|e| TriageError::Config(format!("{}: {}", name, e)))?;
            rules.insert(rule, enabled);
        }
        Ok(Self { rules })
    }
}
