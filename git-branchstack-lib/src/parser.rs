//! Extracts the topic tag and declared dependency edges out of a commit
//! subject line, per the subject grammar in the specification:
//!
//! ```text
//! subject     := prefix_word ws rest
//! prefix_word := PREFIX topic_spec SUFFIX
//! topic_spec  := topic (':' parent_spec)*
//! parent_spec := '+'? topic
//! topic       := any non-':' chars
//! ```

use bstr::{BString, ByteSlice};

use crate::git::ParentEdge;

/// The parsed result of a single subject line.
pub struct ParsedSubject {
    /// `None` when the subject carried no parseable tag at all. `Some("")`
    /// when the tag was present but explicitly empty (e.g. `[] subject`).
    pub topic: Option<String>,
    pub parents: Vec<ParentEdge>,
    /// The subject with the leading `PREFIX topic_spec SUFFIX` stripped.
    /// Equal to the original subject when no tag was found.
    pub trimmed_subject: BString,
}

/// Parse `subject` using the configured `prefix`/`suffix` delimiters. See
/// the module docs for the grammar; see §4.1 of the specification for the
/// step-by-step algorithm this implements.
pub fn parse_subject(subject: &[u8], prefix: &[u8], suffix: &[u8]) -> ParsedSubject {
    let (first_word, rest) = split_first_word(subject);

    let rest = match rest {
        Some(rest) => rest,
        None => {
            return ParsedSubject {
                topic: None,
                parents: Vec::new(),
                trimmed_subject: BString::from(subject.to_vec()),
            }
        }
    };

    let no_tag = first_word.len() < prefix.len() + suffix.len()
        || !first_word.starts_with(prefix)
        || !first_word.ends_with(suffix);
    if no_tag {
        return ParsedSubject {
            topic: None,
            parents: Vec::new(),
            trimmed_subject: BString::from(subject.to_vec()),
        };
    }

    let stripped = &first_word[prefix.len()..first_word.len() - suffix.len()];
    let mut segments = stripped.split_str(":");
    let topic_segment = segments.next().unwrap_or(&[]);
    let topic = String::from_utf8_lossy(topic_segment).into_owned();

    let parents = segments
        .filter(|segment| !segment.is_empty())
        .map(|segment| parse_parent_spec(segment))
        .collect();

    ParsedSubject {
        topic: Some(topic),
        parents,
        trimmed_subject: BString::from(rest.to_vec()),
    }
}

fn parse_parent_spec(segment: &[u8]) -> ParentEdge {
    let (keep_tag, topic_bytes) = match segment.strip_prefix(b"+") {
        Some(rest) => (true, rest),
        None => (false, segment),
    };
    ParentEdge {
        topic: String::from_utf8_lossy(topic_bytes).into_owned(),
        keep_tag,
    }
}

/// Split on the first run of ASCII whitespace, as `str.split(maxsplit=1)`
/// does in the reference implementation. Returns `(first_word, None)` if
/// there is no whitespace in `subject`.
fn split_first_word(subject: &[u8]) -> (&[u8], Option<&[u8]>) {
    match subject.iter().position(|b| b.is_ascii_whitespace()) {
        Some(idx) => {
            let first_word = &subject[..idx];
            let rest = subject[idx..].trim_start();
            (first_word, Some(rest))
        }
        None => (subject, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics(subject: &str) -> (Option<String>, Vec<(String, bool)>, String) {
        let parsed = parse_subject(subject.as_bytes(), b"[", b"]");
        (
            parsed.topic,
            parsed
                .parents
                .into_iter()
                .map(|p| (p.topic, p.keep_tag))
                .collect(),
            parsed.trimmed_subject.to_string(),
        )
    }

    #[test]
    fn test_basic_tag() {
        let (topic, parents, trimmed) = topics("[a] a1");
        assert_eq!(topic.as_deref(), Some("a"));
        assert!(parents.is_empty());
        assert_eq!(trimmed, "a1");
    }

    #[test]
    fn test_no_tag() {
        let (topic, parents, trimmed) = topics("WIP commit");
        assert_eq!(topic, None);
        assert!(parents.is_empty());
        assert_eq!(trimmed, "WIP commit");
    }

    #[test]
    fn test_single_word_subject_has_no_tag() {
        let (topic, _parents, trimmed) = topics("onlyoneword");
        assert_eq!(topic, None);
        assert_eq!(trimmed, "onlyoneword");
    }

    #[test]
    fn test_explicit_empty_tag() {
        let (topic, parents, trimmed) = topics("[] a3");
        assert_eq!(topic.as_deref(), Some(""));
        assert!(parents.is_empty());
        assert_eq!(trimmed, "a3");
    }

    #[test]
    fn test_forward_dependency() {
        let (topic, parents, trimmed) = topics("[a:b] a");
        assert_eq!(topic.as_deref(), Some("a"));
        assert_eq!(parents, vec![("b".to_string(), false)]);
        assert_eq!(trimmed, "a");
    }

    #[test]
    fn test_keep_tag_parent() {
        let (topic, parents, _trimmed) = topics("[a:+b] subject a");
        assert_eq!(topic.as_deref(), Some("a"));
        assert_eq!(parents, vec![("b".to_string(), true)]);
    }

    #[test]
    fn test_custom_affixes() {
        let parsed = parse_subject(b"a: a1", b"", b":");
        assert_eq!(parsed.topic.as_deref(), Some("a"));
        assert_eq!(parsed.trimmed_subject.to_string(), "a1");
    }

    #[test]
    fn test_custom_affixes_with_parent() {
        let parsed = parse_subject(b"c:a: c1", b"", b":");
        assert_eq!(parsed.topic.as_deref(), Some("c"));
        assert_eq!(
            parsed
                .parents
                .into_iter()
                .map(|p| (p.topic, p.keep_tag))
                .collect::<Vec<_>>(),
            vec![("a".to_string(), false)]
        );
    }

    #[test]
    fn test_ignores_empty_segments() {
        let parsed = parse_subject(b"[a::b] subject", b"[", b"]");
        assert_eq!(parsed.topic.as_deref(), Some("a"));
        assert_eq!(
            parsed
                .parents
                .into_iter()
                .map(|p| p.topic)
                .collect::<Vec<_>>(),
            vec!["b".to_string()]
        );
    }
}
