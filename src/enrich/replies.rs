//! Line-oriented parsers for structured generator replies.
//!
//! Each parser is a small state machine: it is either looking for a marker
//! or accumulating the body of the block the last marker opened. Generator
//! output is imperfect, so recovery is lenient and explicit.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::aggregate::{Priority, Suggestion};

lazy_static! {
    // IMPORT 3: text   (tolerates "**IMPORT 3:**", "## IMPORT 3:")
    static ref IMPORT_MARKER: Regex =
        Regex::new(r"^[\s*#]*IMPORT\s+([^\s:]+)\s*:[\s*]*(.*)$").unwrap();
    static ref METHOD_MARKER: Regex =
        Regex::new(r"^[\s*#]*METHOD\s+([^:]+?)\s*:[\s*]*(.*)$").unwrap();
    static ref SUGGESTION_LABEL: Regex = Regex::new(
        r"(?i)^[\s*#]*(CATEGORY|TITLE|DESCRIPTION|PRIORITY|EXAMPLE)[\s*]*:[\s*]*(.*)$"
    )
    .unwrap();
}

/// Body lines of one block, joined with single spaces.
#[derive(Debug, Default)]
struct Body(Vec<String>);

impl Body {
    fn push(&mut self, text: &str) {
        let text = text.trim();
        if !text.is_empty() {
            self.0.push(text.to_string());
        }
    }

    fn joined(&self) -> String {
        self.0.join(" ")
    }
}

enum ImportState {
    SeekingMarker,
    /// `slot` is `None` for a block whose index is out of range; its text is
    /// read but discarded.
    Accumulating { slot: Option<usize>, body: Body },
}

/// Parse `IMPORT <n>: <text>` blocks for `count` imports.
///
/// Returns one entry per import; `None` where no block was found.
/// - A non-numeric index appends the marker's text to the open block.
/// - Out-of-range indices are ignored.
/// - The first block for an index wins.
pub fn parse_batch_imports(reply: &str, count: usize) -> Vec<Option<String>> {
    let mut purposes: Vec<Option<String>> = vec![None; count];
    let mut state = ImportState::SeekingMarker;

    for line in reply.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let Some(caps) = IMPORT_MARKER.captures(line) else {
            if let ImportState::Accumulating { body, .. } = &mut state {
                body.push(line);
            }
            continue;
        };

        let index = caps.get(1).map_or("", |m| m.as_str()).trim_matches('*');
        let text = caps.get(2).map_or("", |m| m.as_str());

        match index.parse::<usize>() {
            Ok(n) => {
                let previous = std::mem::replace(&mut state, ImportState::SeekingMarker);
                close_import(previous, &mut purposes);
                let slot = (1..=count).contains(&n).then(|| n - 1);
                let mut body = Body::default();
                body.push(text);
                state = ImportState::Accumulating { slot, body };
            }
            Err(_) => {
                if let ImportState::Accumulating { body, .. } = &mut state {
                    body.push(text);
                }
            }
        }
    }
    close_import(state, &mut purposes);

    purposes
}

fn close_import(state: ImportState, purposes: &mut [Option<String>]) {
    if let ImportState::Accumulating {
        slot: Some(slot),
        body,
    } = state
    {
        let text = body.joined();
        if !text.is_empty() && purposes[slot].is_none() {
            purposes[slot] = Some(text);
        }
    }
}

/// Class explanation split into prose and per-method blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassReply {
    pub explanation: String,
    pub methods: BTreeMap<String, String>,
}

enum ClassState {
    Prose,
    Method { name: String, body: Body },
}

/// Parse a class explanation: prose up to the first `METHOD <name>:` marker,
/// then one block per method.
///
/// Markers naming an unknown method append to whichever block is open.
pub fn parse_class_reply(reply: &str, method_names: &[String]) -> ClassReply {
    let mut prose: Vec<&str> = Vec::new();
    let mut methods = BTreeMap::new();
    let mut state = ClassState::Prose;

    for line in reply.lines() {
        let marker = METHOD_MARKER.captures(line).map(|caps| {
            let name = caps
                .get(1)
                .map_or("", |m| m.as_str())
                .trim_matches(|c| c == '`' || c == '*')
                .trim_end_matches("()")
                .to_string();
            let text = caps.get(2).map_or("", |m| m.as_str());
            (name, text)
        });

        match marker {
            Some((name, text)) if method_names.contains(&name) => {
                let previous = std::mem::replace(&mut state, ClassState::Prose);
                close_method(previous, &mut methods);
                let mut body = Body::default();
                body.push(text);
                state = ClassState::Method { name, body };
            }
            Some((_, text)) => match &mut state {
                ClassState::Prose => prose.push(text),
                ClassState::Method { body, .. } => body.push(text),
            },
            None => match &mut state {
                ClassState::Prose => prose.push(line),
                ClassState::Method { body, .. } => body.push(line),
            },
        }
    }
    close_method(state, &mut methods);

    ClassReply {
        explanation: prose.join("\n").trim().to_string(),
        methods,
    }
}

fn close_method(state: ClassState, methods: &mut BTreeMap<String, String>) {
    if let ClassState::Method { name, body } = state {
        let text = body.joined();
        if !text.is_empty() {
            methods.entry(name).or_insert(text);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Category,
    Title,
    Description,
    Priority,
    Example,
}

impl Field {
    fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_uppercase().as_str() {
            "CATEGORY" => Some(Field::Category),
            "TITLE" => Some(Field::Title),
            "DESCRIPTION" => Some(Field::Description),
            "PRIORITY" => Some(Field::Priority),
            "EXAMPLE" => Some(Field::Example),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct SuggestionDraft {
    category: Option<String>,
    title: Option<String>,
    description: Body,
    priority: Option<String>,
    example: Vec<String>,
    open: Option<Field>,
}

impl SuggestionDraft {
    fn label(&mut self, field: Field, value: &str) {
        let value = value.trim();
        match field {
            Field::Category => self.category = Some(value.to_string()),
            Field::Title => self.title = Some(value.to_string()),
            Field::Description => self.description.push(value),
            Field::Priority => self.priority = Some(value.to_string()),
            Field::Example => {
                if !value.is_empty() && !value.starts_with("```") {
                    self.example.push(value.to_string());
                }
            }
        }
        self.open = Some(field);
    }

    fn continuation(&mut self, line: &str) {
        match self.open {
            Some(Field::Description) => self.description.push(line),
            Some(Field::Example) => {
                if !line.trim_start().starts_with("```") {
                    self.example.push(line.trim_end().to_string());
                }
            }
            _ => {}
        }
    }

    fn finish(self) -> Option<Suggestion> {
        let title = self.title.filter(|t| !t.is_empty()).unwrap_or_default();
        let description = self.description.joined();
        if title.is_empty() && description.is_empty() {
            return None;
        }

        let example = self.example.join("\n").trim_matches('\n').to_string();
        Some(Suggestion {
            category: self
                .category
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "General".to_string()),
            title,
            description,
            code_example: (!example.trim().is_empty()).then_some(example),
            priority: self
                .priority
                .map(|p| Priority::parse_lenient(&p))
                .unwrap_or(Priority::Medium),
        })
    }
}

/// Parse `---`-separated suggestion blocks with labeled lines.
///
/// Blocks with neither a title nor a description are dropped. Category
/// defaults to "General" and priority to Medium.
pub fn parse_suggestions(reply: &str) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();
    let mut draft = SuggestionDraft::default();

    for line in reply.lines() {
        if line.trim() == "---" {
            suggestions.extend(std::mem::take(&mut draft).finish());
            continue;
        }
        match SUGGESTION_LABEL.captures(line) {
            Some(caps) => {
                let field = caps.get(1).and_then(|m| Field::from_label(m.as_str()));
                let value = caps.get(2).map_or("", |m| m.as_str());
                if let Some(field) = field {
                    draft.label(field, value);
                }
            }
            None => {
                if !line.trim().is_empty() {
                    draft.continuation(line);
                }
            }
        }
    }
    suggestions.extend(draft.finish());

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_round_trip() {
        let reply = "IMPORT 1: Operating system access.\nIMPORT 2: Interpreter state.\nIMPORT 3: JSON codec.";
        let parsed = parse_batch_imports(reply, 3);
        assert_eq!(
            parsed,
            vec![
                Some("Operating system access.".to_string()),
                Some("Interpreter state.".to_string()),
                Some("JSON codec.".to_string()),
            ]
        );
    }

    #[test]
    fn test_batch_multiline_and_decorated_markers() {
        let reply = "Here you go:\n\n**IMPORT 2:** Second\ncontinues here\n\n## IMPORT 1: First";
        let parsed = parse_batch_imports(reply, 2);
        assert_eq!(parsed[0].as_deref(), Some("First"));
        assert_eq!(parsed[1].as_deref(), Some("Second continues here"));
    }

    #[test]
    fn test_batch_non_numeric_index_appends_to_open_block() {
        let reply = "IMPORT 1: Alpha\nIMPORT two: extra words\nIMPORT 2: Beta";
        let parsed = parse_batch_imports(reply, 2);
        assert_eq!(parsed[0].as_deref(), Some("Alpha extra words"));
        assert_eq!(parsed[1].as_deref(), Some("Beta"));
    }

    #[test]
    fn test_batch_missing_out_of_range_and_duplicate() {
        let reply = "IMPORT 3: Gamma\nIMPORT 9: Nope\nIMPORT 3: Again\nIMPORT 0: Zero";
        let parsed = parse_batch_imports(reply, 3);
        assert_eq!(parsed, vec![None, None, Some("Gamma".to_string())]);
    }

    #[test]
    fn test_batch_text_before_first_marker_is_ignored() {
        let parsed = parse_batch_imports("preamble\nIMPORT x: orphan", 1);
        assert_eq!(parsed, vec![None]);
    }

    #[test]
    fn test_class_reply() {
        let reply = "Dog models a pet.\n\nIt barks.\nMETHOD bark: Prints a bark.\nLoudly.\nMETHOD `fetch()`: Retrieves things.\nMETHOD unknown: stray text";
        let methods = vec!["bark".to_string(), "fetch".to_string()];
        let parsed = parse_class_reply(reply, &methods);
        assert_eq!(parsed.explanation, "Dog models a pet.\n\nIt barks.");
        assert_eq!(parsed.methods["bark"], "Prints a bark. Loudly.");
        assert_eq!(parsed.methods["fetch"], "Retrieves things. stray text");
    }

    #[test]
    fn test_suggestions() {
        let reply = r#"CATEGORY: Performance
TITLE: Cache lookups
DESCRIPTION: Memoize the expensive call
so it runs once.
PRIORITY: high
EXAMPLE: @functools.cache
def lookup(key): ...
---
TITLE: Rename variables
PRIORITY: whenever
---
CATEGORY: Style
PRIORITY: Low
---
"#;
        let parsed = parse_suggestions(reply);
        assert_eq!(parsed.len(), 2);

        assert_eq!(parsed[0].category, "Performance");
        assert_eq!(parsed[0].title, "Cache lookups");
        assert_eq!(parsed[0].description, "Memoize the expensive call so it runs once.");
        assert_eq!(parsed[0].priority, Priority::High);
        assert_eq!(
            parsed[0].code_example.as_deref(),
            Some("@functools.cache\ndef lookup(key): ...")
        );

        assert_eq!(parsed[1].category, "General");
        assert_eq!(parsed[1].priority, Priority::Medium);
        assert!(parsed[1].code_example.is_none());
    }

    #[test]
    fn test_suggestions_garbage() {
        assert!(parse_suggestions("I cannot help with that.").is_empty());
    }
}
