use regex::Regex;

use audiopatch_core::ListOverride;
use audiopatch_core::config_file::ParsingSection;

/// Suffixes accepted after an angle value. Extracted report text carries the
/// degree sign either intact or as its mis-decoded two-character form.
pub const DEFAULT_DEGREE_SUFFIXES: &[&str] = &["°", "Â°"];

/// Feature name whose presence marks the directivity-column table layout.
pub const DEFAULT_DIRECTIVITY_KEYWORD: &str = "Panflex";

/// Column-type words that identify a cabinet table header row.
pub const DEFAULT_HEADER_TYPE_WORDS: &[&str] = &["Enclosure", "Type", "Model", "Cabinet"];

/// Column words that, together with a type word, identify a header row.
pub const DEFAULT_HEADER_MARKER_WORDS: &[&str] = &["Angles", "Site"];

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Configuration for the report parsing pipeline.
///
/// Regex fields are `Option<Regex>`: `None` means "use the built-in default".
/// Use [`ParsingConfigBuilder`] to construct with string patterns.
#[derive(Debug, Clone)]
pub struct ParsingConfig {
    // ── segment.rs ──
    /// Regex locating `Group:` declarations. Capture group 1 is the name.
    pub(crate) group_re: Option<Regex>,
    /// Regex locating `Source:` declarations. Capture group 1 is the name.
    pub(crate) source_re: Option<Regex>,

    // ── fields.rs ──
    pub(crate) degree_suffixes: Vec<String>,

    // ── cabinets.rs ──
    pub(crate) directivity_keyword: String,
    pub(crate) header_type_words: Vec<String>,
    pub(crate) header_marker_words: Vec<String>,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            group_re: None,
            source_re: None,
            degree_suffixes: to_strings(DEFAULT_DEGREE_SUFFIXES),
            directivity_keyword: DEFAULT_DIRECTIVITY_KEYWORD.to_string(),
            header_type_words: to_strings(DEFAULT_HEADER_TYPE_WORDS),
            header_marker_words: to_strings(DEFAULT_HEADER_MARKER_WORDS),
        }
    }
}

impl ParsingConfig {
    pub fn degree_suffixes(&self) -> &[String] {
        &self.degree_suffixes
    }

    pub fn directivity_keyword(&self) -> &str {
        &self.directivity_keyword
    }
}

/// Builder for [`ParsingConfig`].
///
/// Accepts string patterns that are compiled to `Regex` in [`build()`](Self::build).
/// Fails fast with `regex::Error` if any pattern is invalid.
#[derive(Debug, Clone, Default)]
pub struct ParsingConfigBuilder {
    group_re: Option<String>,
    source_re: Option<String>,
    degree_suffixes: ListOverride<String>,
    directivity_keyword: Option<String>,
    header_type_words: ListOverride<String>,
    header_marker_words: ListOverride<String>,
}

impl ParsingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder from the `[parsing]` section of a config file.
    /// Lists given there replace the built-in defaults.
    pub fn from_section(section: &ParsingSection) -> Self {
        let replace = |v: &Option<Vec<String>>| match v {
            Some(values) => ListOverride::Replace(values.clone()),
            None => ListOverride::Default,
        };
        Self {
            group_re: None,
            source_re: None,
            degree_suffixes: replace(&section.degree_suffixes),
            directivity_keyword: section.directivity_keyword.clone(),
            header_type_words: replace(&section.header_type_words),
            header_marker_words: replace(&section.header_marker_words),
        }
    }

    // ── Declarations ──

    pub fn group_regex(mut self, pattern: &str) -> Self {
        self.group_re = Some(pattern.to_string());
        self
    }

    pub fn source_regex(mut self, pattern: &str) -> Self {
        self.source_re = Some(pattern.to_string());
        self
    }

    // ── Angle suffixes ──

    pub fn set_degree_suffixes(mut self, suffixes: Vec<String>) -> Self {
        self.degree_suffixes = ListOverride::Replace(suffixes);
        self
    }

    pub fn add_degree_suffix(mut self, suffix: String) -> Self {
        match &mut self.degree_suffixes {
            ListOverride::Extend(v) | ListOverride::Replace(v) => v.push(suffix),
            ListOverride::Default => self.degree_suffixes = ListOverride::Extend(vec![suffix]),
        }
        self
    }

    // ── Cabinet table ──

    pub fn directivity_keyword(mut self, keyword: &str) -> Self {
        self.directivity_keyword = Some(keyword.to_string());
        self
    }

    pub fn set_header_type_words(mut self, words: Vec<String>) -> Self {
        self.header_type_words = ListOverride::Replace(words);
        self
    }

    pub fn set_header_marker_words(mut self, words: Vec<String>) -> Self {
        self.header_marker_words = ListOverride::Replace(words);
        self
    }

    /// Compile all string patterns into regexes and produce a [`ParsingConfig`].
    pub fn build(self) -> Result<ParsingConfig, regex::Error> {
        let compile = |opt: Option<String>| -> Result<Option<Regex>, regex::Error> {
            opt.map(|p| Regex::new(&p)).transpose()
        };

        Ok(ParsingConfig {
            group_re: compile(self.group_re)?,
            source_re: compile(self.source_re)?,
            degree_suffixes: self
                .degree_suffixes
                .resolve(&to_strings(DEFAULT_DEGREE_SUFFIXES)),
            directivity_keyword: self
                .directivity_keyword
                .unwrap_or_else(|| DEFAULT_DIRECTIVITY_KEYWORD.to_string()),
            header_type_words: self
                .header_type_words
                .resolve(&to_strings(DEFAULT_HEADER_TYPE_WORDS)),
            header_marker_words: self
                .header_marker_words
                .resolve(&to_strings(DEFAULT_HEADER_MARKER_WORDS)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ParsingConfig::default();
        assert!(config.group_re.is_none());
        assert_eq!(config.directivity_keyword(), "Panflex");
        assert_eq!(config.degree_suffixes(), &["°".to_string(), "Â°".to_string()]);
    }

    #[test]
    fn test_builder_matches_default() {
        let built = ParsingConfigBuilder::new().build().unwrap();
        let default = ParsingConfig::default();
        assert_eq!(built.degree_suffixes, default.degree_suffixes);
        assert_eq!(built.header_type_words, default.header_type_words);
        assert_eq!(built.header_marker_words, default.header_marker_words);
    }

    #[test]
    fn test_builder_extend_suffix() {
        let config = ParsingConfigBuilder::new()
            .add_degree_suffix("deg".to_string())
            .build()
            .unwrap();
        assert_eq!(config.degree_suffixes.len(), 3);
        assert_eq!(config.degree_suffixes.last().map(String::as_str), Some("deg"));
    }

    #[test]
    fn test_builder_custom_regex() {
        let config = ParsingConfigBuilder::new()
            .source_regex(r"(?m)^Quelle:\s*([^\n]+)")
            .build()
            .unwrap();
        assert!(config.source_re.is_some());
    }

    #[test]
    fn test_builder_invalid_regex() {
        let result = ParsingConfigBuilder::new().group_regex(r"[invalid").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_from_section_replaces_lists() {
        let section = ParsingSection {
            degree_suffixes: Some(vec!["deg".to_string()]),
            directivity_keyword: Some("Directivity".to_string()),
            header_type_words: None,
            header_marker_words: None,
        };
        let config = ParsingConfigBuilder::from_section(&section).build().unwrap();
        assert_eq!(config.degree_suffixes, vec!["deg".to_string()]);
        assert_eq!(config.directivity_keyword(), "Directivity");
        assert_eq!(config.header_type_words, to_strings(DEFAULT_HEADER_TYPE_WORDS));
    }
}
