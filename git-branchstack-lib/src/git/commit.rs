use bstr::BString;

use super::ObjectId;

/// Author or committer identity, preserved verbatim across a replay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
    /// Seconds since the Unix epoch.
    pub time: i64,
    /// Offset from UTC, in minutes, as Git signatures carry it.
    pub offset_minutes: i32,
}

/// A declared dependency edge parsed out of a commit subject's topic spec,
/// e.g. the `b` and `+c` in `[a:b:+c] subject`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParentEdge {
    pub topic: String,
    /// Whether this parent's subject tag should be retained verbatim on the
    /// rewritten commit, regardless of the run's tag-retention policy.
    pub keep_tag: bool,
}

/// A single commit in the scanned range, with its topic tag (if any) and
/// declared dependency edges already parsed out of the subject line.
///
/// Produced once by the Log Scanner and never mutated afterwards.
#[derive(Clone, Debug)]
pub struct CommitRecord {
    pub id: ObjectId,
    /// `None` when the subject carried no parseable tag at all.
    /// `Some("")` when the tag was present but explicitly empty (`[]`).
    pub topic: Option<String>,
    pub declared_parents: Vec<ParentEdge>,
    /// The subject with the `[topic:...]` prefix stripped, if any.
    pub trimmed_subject: BString,
    /// The subject line exactly as Git reports it (untouched).
    pub raw_subject: BString,
    pub full_message: BString,
    pub author: Identity,
    pub committer: Identity,
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
}

impl CommitRecord {
    /// The message body: everything after the first blank line, or empty if
    /// there is none.
    pub fn body(&self) -> BString {
        let message = self.full_message.as_slice();
        match find_subsequence(message, b"\n\n") {
            Some(idx) => BString::from(&message[idx + 2..]),
            None => BString::from(Vec::new()),
        }
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
