use std::fmt;
use std::str::FromStr;

/// A Git object id. Thin wrapper around [`git2::Oid`] so that the rest of
/// the crate doesn't need to depend on `git2` types directly at every call
/// site, and so that we get a cheap, `Copy` value to pass around freely.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub(crate) git2::Oid);

impl ObjectId {
    pub fn from_git2(oid: git2::Oid) -> Self {
        Self(oid)
    }

    pub fn as_git2(&self) -> git2::Oid {
        self.0
    }

    /// A shortened hex rendering, suitable for diagnostic output. Mirrors
    /// the 7-character abbreviation Git itself defaults to for typical
    /// repository sizes.
    pub fn short(&self) -> String {
        let full = self.0.to_string();
        full.chars().take(7).collect()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.0)
    }
}

impl FromStr for ObjectId {
    type Err = git2::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(git2::Oid::from_str(s.trim())?))
    }
}

impl From<git2::Oid> for ObjectId {
    fn from(oid: git2::Oid) -> Self {
        Self(oid)
    }
}
