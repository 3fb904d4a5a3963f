//! Coverage run configuration
//!
//! Loaded from YAML or assembled with [`CoverageConfigBuilder`].

use super::threshold::MinimumCoverage;
use crate::result::{FlowcovError, FlowcovResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// File name of a class report inside its class directory
pub const REPORT_FILE_NAME: &str = "flowCovReport.json";

/// Default root of the report tree
pub const DEFAULT_REPORT_DIR: &str = "target/flowcov";

/// Coverage run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoverageConfig {
    /// Root of the report tree
    pub report_dir: PathBuf,
    /// Process definition keys whose deployments and observations are ignored
    pub excluded_process_definition_keys: BTreeSet<String>,
    /// Minimum coverage of the whole class
    pub class_minimum_coverage: Option<MinimumCoverage>,
    /// Minimum coverage per test method name
    pub method_minimum_coverage: BTreeMap<String, MinimumCoverage>,
    /// Log per-method and per-definition ratios on finish
    pub detailed_logging: bool,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            report_dir: PathBuf::from(DEFAULT_REPORT_DIR),
            excluded_process_definition_keys: BTreeSet::new(),
            class_minimum_coverage: None,
            method_minimum_coverage: BTreeMap::new(),
            detailed_logging: false,
        }
    }
}

impl CoverageConfig {
    /// Create a builder for coverage config
    #[must_use]
    pub fn builder() -> CoverageConfigBuilder {
        CoverageConfigBuilder::default()
    }

    /// Parse a YAML document
    pub fn from_yaml_str(text: &str) -> FlowcovResult<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Load a YAML file
    pub fn load(path: impl AsRef<Path>) -> FlowcovResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded coverage config");
        Ok(config)
    }

    /// Serialize as YAML
    pub fn to_yaml_string(&self) -> FlowcovResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Whether observations for the key are ignored
    #[must_use]
    pub fn is_excluded(&self, definition_key: &str) -> bool {
        self.excluded_process_definition_keys.contains(definition_key)
    }

    /// Directory holding the report of one class
    #[must_use]
    pub fn class_report_dir(&self, class_name: &str) -> PathBuf {
        self.report_dir.join(class_name)
    }

    /// Report file of one class
    #[must_use]
    pub fn class_report_path(&self, class_name: &str) -> PathBuf {
        self.class_report_dir(class_name).join(REPORT_FILE_NAME)
    }
}

/// Builder for coverage configuration
#[derive(Debug, Default)]
pub struct CoverageConfigBuilder {
    report_dir: Option<PathBuf>,
    excluded: BTreeSet<String>,
    class_minimum: Option<f64>,
    method_minimums: BTreeMap<String, f64>,
    detailed_logging: bool,
}

impl CoverageConfigBuilder {
    /// Set the report root
    #[must_use]
    pub fn report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_dir = Some(dir.into());
        self
    }

    /// Ignore a process definition key
    #[must_use]
    pub fn exclude_process_definition_key(mut self, key: impl Into<String>) -> Self {
        self.excluded.insert(key.into());
        self
    }

    /// Require a minimum class coverage
    #[must_use]
    pub const fn class_minimum_coverage(mut self, ratio: f64) -> Self {
        self.class_minimum = Some(ratio);
        self
    }

    /// Require a minimum coverage for one test method
    #[must_use]
    pub fn method_minimum_coverage(mut self, method: impl Into<String>, ratio: f64) -> Self {
        self.method_minimums.insert(method.into(), ratio);
        self
    }

    /// Log per-method and per-definition ratios on finish
    #[must_use]
    pub const fn detailed_logging(mut self, enabled: bool) -> Self {
        self.detailed_logging = enabled;
        self
    }

    /// Build the configuration, validating every minimum
    pub fn build(self) -> FlowcovResult<CoverageConfig> {
        let class_minimum_coverage = self.class_minimum.map(MinimumCoverage::new).transpose()?;
        let method_minimum_coverage = self
            .method_minimums
            .into_iter()
            .map(|(method, ratio)| {
                MinimumCoverage::new(ratio)
                    .map(|minimum| (method.clone(), minimum))
                    .map_err(|_| {
                        FlowcovError::invalid_configuration(format!(
                            "minimum coverage of method '{method}' must be within [0.0, 1.0], got {ratio}"
                        ))
                    })
            })
            .collect::<FlowcovResult<_>>()?;
        Ok(CoverageConfig {
            report_dir: self
                .report_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_DIR)),
            excluded_process_definition_keys: self.excluded,
            class_minimum_coverage,
            method_minimum_coverage,
            detailed_logging: self.detailed_logging,
        })
    }
}
