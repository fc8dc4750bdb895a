//! Hexo-style markdown drafts
//!
//! ```text
//! ---
//! title: Hello
//! date: 2024-05-01 10:00:00
//! categories: notes
//! tags: [a, b]
//! ---
//! A short saying
//! <!-- more -->
//! The body.
//! ```

use serde_yaml::Value;

use crate::errors::{ClientError, Result};
use crate::types::BlogMeta;

const DELIMITER: &str = "---";
const MORE_TAG: &str = "<!-- more -->";

/// A parsed local draft
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: Option<String>,
    pub date: Option<String>,
    pub categories: Option<String>,
    pub tags: Vec<String>,
    pub saying: Option<String>,
    pub content: String,
}

impl Draft {
    /// Metadata for `add_blog`; missing fields become empty strings
    pub fn meta(&self) -> BlogMeta {
        BlogMeta {
            title: self.title.clone().unwrap_or_default(),
            categories: self.categories.clone().unwrap_or_default(),
            tags: self.tags.clone(),
            saying: self.saying.clone().unwrap_or_default(),
        }
    }
}

/// Split front matter and body, then the body at `<!-- more -->`
pub fn parse(source: &str) -> Result<Draft> {
    if !source.starts_with(DELIMITER) {
        return Err(ClientError::Parse(
            "invalid draft: must start with '---'".to_string(),
        ));
    }

    let (yaml, rest) = split_front_matter(source).ok_or_else(|| {
        ClientError::Parse("invalid draft: closing '---' not found".to_string())
    })?;

    let mut draft = Draft::default();

    let front: Value = serde_yaml::from_str(yaml)
        .map_err(|e| ClientError::Parse(format!("front matter is not valid YAML: {}", e)))?;

    if let Value::Mapping(map) = &front {
        draft.title = map.get("title").and_then(scalar_to_string);
        draft.date = map.get("date").and_then(scalar_to_string);
        draft.categories = map.get("categories").and_then(scalar_to_string);
        draft.tags = match map.get("tags") {
            Some(Value::Sequence(items)) => items.iter().filter_map(scalar_to_string).collect(),
            Some(other) => scalar_to_string(other).into_iter().collect(),
            None => Vec::new(),
        };
    } else if !matches!(front, Value::Null) {
        return Err(ClientError::Parse(
            "front matter must be a YAML mapping".to_string(),
        ));
    }

    let body = rest.trim();
    match body.find(MORE_TAG) {
        Some(idx) => {
            draft.saying = Some(body[..idx].trim().to_string());
            draft.content = body[idx + MORE_TAG.len()..].trim().to_string();
        }
        None => {
            draft.content = body.to_string();
        }
    }

    Ok(draft)
}

/// `(yaml, remainder)` when a closing delimiter line exists
fn split_front_matter(source: &str) -> Option<(&str, &str)> {
    let after_open = &source[DELIMITER.len()..];
    let after_open = after_open
        .strip_prefix("\r\n")
        .or_else(|| after_open.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            let yaml = &after_open[..offset];
            let rest = &after_open[offset + line.len()..];
            return Some((yaml, rest));
        }
        offset += line.len();
    }
    None
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "---\ntitle: Hello World\ndate: 2024-05-01 10:00:00\ncategories: notes\ntags:\n  - rust\n  - 2024\n---\n\nStay hungry\n<!-- more -->\n\n# Body\n\ntext\n";

    #[test]
    fn test_parse_full_draft() {
        let draft = parse(SAMPLE).unwrap();
        assert_eq!(draft.title.as_deref(), Some("Hello World"));
        assert_eq!(draft.date.as_deref(), Some("2024-05-01 10:00:00"));
        assert_eq!(draft.categories.as_deref(), Some("notes"));
        assert_eq!(draft.tags, vec!["rust", "2024"]);
        assert_eq!(draft.saying.as_deref(), Some("Stay hungry"));
        assert_eq!(draft.content, "# Body\n\ntext");
    }

    #[test]
    fn test_without_more_tag() {
        let draft = parse("---\ntitle: t\n---\nall body\n").unwrap();
        assert!(draft.saying.is_none());
        assert_eq!(draft.content, "all body");
    }

    #[test]
    fn test_scalar_tag_becomes_list() {
        let draft = parse("---\ntags: solo\n---\n").unwrap();
        assert_eq!(draft.tags, vec!["solo"]);
    }

    #[test]
    fn test_crlf_delimiters() {
        let draft = parse("---\r\ntitle: win\r\n---\r\nbody\r\n").unwrap();
        assert_eq!(draft.title.as_deref(), Some("win"));
        assert_eq!(draft.content, "body");
    }

    #[test]
    fn test_missing_delimiters() {
        assert!(matches!(parse("title: x"), Err(ClientError::Parse(_))));
        assert!(matches!(parse("---\ntitle: x\nbody"), Err(ClientError::Parse(_))));
    }

    #[test]
    fn test_bad_yaml() {
        assert!(matches!(
            parse("---\ntitle: [unclosed\n---\n"),
            Err(ClientError::Parse(_))
        ));
    }

    #[test]
    fn test_meta_defaults() {
        let meta = parse("---\ntitle: only title\n---\n").unwrap().meta();
        assert_eq!(meta.title, "only title");
        assert_eq!(meta.categories, "");
        assert!(meta.tags.is_empty());
    }
}
