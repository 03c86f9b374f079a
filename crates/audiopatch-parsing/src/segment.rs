use once_cell::sync::Lazy;
use regex::Regex;

use audiopatch_core::UNKNOWN_GROUP;

use crate::config::ParsingConfig;

static GROUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\.(?:\d+\.)*[ \t]*Group:[ \t]*(\S[^\n]*)").unwrap());

static SOURCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\.(?:\d+\.)*[ \t]*Source:[ \t]*(\S[^\n]*)").unwrap());

/// The text owned by one `Source:` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpan<'a> {
    pub source_name: String,
    pub group_context: String,
    /// From the declaration up to the next source or group declaration.
    pub text: &'a str,
    /// Byte offset of the declaration in the full document.
    pub start: usize,
}

/// An ordinal-prefixed declaration line.
#[derive(Debug, Clone)]
struct Declaration {
    start: usize,
    name: String,
}

fn find_declarations(re: &Regex, text: &str) -> Vec<Declaration> {
    re.captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?.as_str().trim();
            if name.is_empty() {
                return None;
            }
            Some(Declaration {
                start: whole.start(),
                name: name.to_string(),
            })
        })
        .collect()
}

/// Locate every `Source:` declaration, in order of appearance.
///
/// Each source is attributed to the last `Group:` declared at or before it
/// ([`UNKNOWN_GROUP`] when there is none), and owns the text up to whichever
/// comes first: the next source, the next group, or the end of the document.
pub fn segment_arrays(text: &str) -> Vec<SourceSpan<'_>> {
    segment_arrays_with_config(text, &ParsingConfig::default())
}

/// Config-aware version of [`segment_arrays`].
pub(crate) fn segment_arrays_with_config<'a>(
    text: &'a str,
    config: &ParsingConfig,
) -> Vec<SourceSpan<'a>> {
    let group_re = config.group_re.as_ref().unwrap_or(&GROUP_RE);
    let source_re = config.source_re.as_ref().unwrap_or(&SOURCE_RE);

    let groups = find_declarations(group_re, text);
    let sources = find_declarations(source_re, text);

    let mut spans = Vec::with_capacity(sources.len());
    for (i, source) in sources.iter().enumerate() {
        let group_context = groups
            .iter()
            .take_while(|g| g.start <= source.start)
            .last()
            .map(|g| g.name.clone())
            .unwrap_or_else(|| UNKNOWN_GROUP.to_string());

        let next_source = sources.get(i + 1).map(|s| s.start);
        let next_group = groups
            .iter()
            .find(|g| g.start > source.start)
            .map(|g| g.start);
        let end = [next_source, next_group]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(text.len());

        spans.push(SourceSpan {
            source_name: source.name.clone(),
            group_context,
            text: &text[source.start..end],
            start: source.start,
        });
    }
    spans
}
