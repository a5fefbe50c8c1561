//! Rules configuration
//!
//! Loads the per-repository rules file that switches each named rule on or
//! off. The file is a flat map of rule name to `On`/`Off` (or a boolean):
//!
//! ```yaml
//! InitialIssueTriage: On
//! CloseStaleIssues: Off
//! LockClosedIssues: true
//! ```

mod rules_config;

pub use rules_config::{RulesConfiguration, CONFIG_FILE_NAME, SEARCH_LOCATIONS};
