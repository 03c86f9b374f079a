//! Classification vocabularies owned by the storage side.
//!
//! Configuration text and bumper descriptions are free text in the report.
//! The record builder maps them onto fixed vocabularies using the ordered
//! lookup tables held in a [`Catalog`], so new hardware can be added from
//! config without touching the parser.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Bumper code stored when no catalog entry matches.
pub const NO_BUMPER: &str = "NONE";

/// Built-in bumper/rigging hardware codes, in match priority order.
pub const DEFAULT_BUMPERS: &[&str] = &[
    "KIBU-SB", "KIBU II", "M-BUMP", "K1-BUMP", "K2-BUMP", "A-BUMP",
];

/// Controls how a list of values is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }
}

/// How an array is deployed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayConfiguration {
    #[default]
    VerticalFlown,
    VerticalGround,
    Horizontal,
}

impl ArrayConfiguration {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArrayConfiguration::VerticalFlown => "vertical_flown",
            ArrayConfiguration::VerticalGround => "vertical_ground",
            ArrayConfiguration::Horizontal => "horizontal",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ArrayConfiguration::VerticalFlown => "Vertical Flown",
            ArrayConfiguration::VerticalGround => "Vertical Ground Stacked",
            ArrayConfiguration::Horizontal => "Horizontal",
        }
    }
}

impl fmt::Display for ArrayConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArrayConfiguration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vertical_flown" => Ok(ArrayConfiguration::VerticalFlown),
            "vertical_ground" => Ok(ArrayConfiguration::VerticalGround),
            "horizontal" => Ok(ArrayConfiguration::Horizontal),
            other => Err(format!("unknown array configuration: {other}")),
        }
    }
}

/// Maps configuration text to a value when every keyword is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationRule {
    pub keywords: Vec<String>,
    pub configuration: ArrayConfiguration,
}

impl ConfigurationRule {
    pub fn new(keywords: &[&str], configuration: ArrayConfiguration) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            configuration,
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        !self.keywords.is_empty() && self.keywords.iter().all(|k| lowered.contains(k.as_str()))
    }
}

/// Ordered lookup tables for bumper hardware and array configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub bumpers: Vec<String>,
    pub configuration_rules: Vec<ConfigurationRule>,
    /// Returned when no configuration rule matches (or the text is absent).
    pub fallback_configuration: ArrayConfiguration,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            bumpers: DEFAULT_BUMPERS.iter().map(|b| b.to_string()).collect(),
            configuration_rules: vec![
                ConfigurationRule::new(&["vertical", "flown"], ArrayConfiguration::VerticalFlown),
                ConfigurationRule::new(&["vertical", "ground"], ArrayConfiguration::VerticalGround),
                ConfigurationRule::new(&["horizontal"], ArrayConfiguration::Horizontal),
            ],
            fallback_configuration: ArrayConfiguration::VerticalFlown,
        }
    }
}

impl Catalog {
    /// Default catalog with the bumper list overridden.
    pub fn with_bumpers(bumpers: &ListOverride<String>) -> Self {
        let defaults: Vec<String> = DEFAULT_BUMPERS.iter().map(|b| b.to_string()).collect();
        Self {
            bumpers: bumpers.resolve(&defaults),
            ..Self::default()
        }
    }

    /// Classify raw configuration text. First matching rule wins.
    pub fn classify_configuration(&self, text: Option<&str>) -> ArrayConfiguration {
        let Some(text) = text else {
            return self.fallback_configuration;
        };
        let lowered = text.to_lowercase();
        self.configuration_rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| rule.configuration)
            .unwrap_or(self.fallback_configuration)
    }

    /// Classify a bumper description by containment. Returns [`NO_BUMPER`]
    /// when nothing in the catalog appears in the text.
    pub fn classify_bumper(&self, text: Option<&str>) -> &str {
        let Some(text) = text else {
            return NO_BUMPER;
        };
        let upper = text.to_uppercase();
        self.bumpers
            .iter()
            .find(|code| !code.is_empty() && upper.contains(&code.to_uppercase()))
            .map(String::as_str)
            .unwrap_or(NO_BUMPER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_keywords() {
        let catalog = Catalog::default();
        assert_eq!(
            catalog.classify_configuration(Some("Vertical / Flown")),
            ArrayConfiguration::VerticalFlown
        );
        assert_eq!(
            catalog.classify_configuration(Some("VERTICAL GROUND STACKED")),
            ArrayConfiguration::VerticalGround
        );
        assert_eq!(
            catalog.classify_configuration(Some("Horizontal")),
            ArrayConfiguration::Horizontal
        );
    }

    #[test]
    fn test_configuration_fallback() {
        let catalog = Catalog::default();
        assert_eq!(catalog.classify_configuration(None), ArrayConfiguration::VerticalFlown);
        assert_eq!(
            catalog.classify_configuration(Some("Ground")),
            ArrayConfiguration::VerticalFlown
        );
    }

    #[test]
    fn test_bumper_first_match_wins() {
        let catalog = Catalog::default();
        assert_eq!(catalog.classify_bumper(Some("KIBU-SB with KIBU II adaptor")), "KIBU-SB");
        assert_eq!(catalog.classify_bumper(Some("k2-bump, hole 4")), "K2-BUMP");
    }

    #[test]
    fn test_bumper_none() {
        let catalog = Catalog::default();
        assert_eq!(catalog.classify_bumper(Some("Custom frame")), NO_BUMPER);
        assert_eq!(catalog.classify_bumper(None), NO_BUMPER);
    }

    #[test]
    fn test_bumper_extension() {
        let catalog =
            Catalog::with_bumpers(&ListOverride::Extend(vec!["KS28-BUMP".to_string()]));
        assert_eq!(catalog.bumpers.len(), DEFAULT_BUMPERS.len() + 1);
        assert_eq!(catalog.classify_bumper(Some("KS28-BUMP")), "KS28-BUMP");
    }

    #[test]
    fn test_bumper_replacement() {
        let catalog = Catalog::with_bumpers(&ListOverride::Replace(vec!["X-FRAME".to_string()]));
        assert_eq!(catalog.classify_bumper(Some("M-BUMP")), NO_BUMPER);
        assert_eq!(catalog.classify_bumper(Some("x-frame")), "X-FRAME");
    }

    #[test]
    fn test_configuration_round_trip() {
        for config in [
            ArrayConfiguration::VerticalFlown,
            ArrayConfiguration::VerticalGround,
            ArrayConfiguration::Horizontal,
        ] {
            assert_eq!(config.as_str().parse::<ArrayConfiguration>(), Ok(config));
        }
        assert!("sideways".parse::<ArrayConfiguration>().is_err());
    }

    #[test]
    fn test_list_override_resolve() {
        let defaults = vec!["a".to_string(), "b".to_string()];

        let d: ListOverride<String> = ListOverride::Default;
        assert_eq!(d.resolve(&defaults), defaults);

        let r: ListOverride<String> = ListOverride::Replace(vec!["x".to_string()]);
        assert_eq!(r.resolve(&defaults), vec!["x".to_string()]);

        let e: ListOverride<String> = ListOverride::Extend(vec!["c".to_string()]);
        assert_eq!(
            e.resolve(&defaults),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }
}
