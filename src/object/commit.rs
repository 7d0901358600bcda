use std::fmt;

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::store::{read_object, write_object, ObjectKind};
use crate::repo::Repo;

/// author or committer identity with timestamp
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
    /// unix seconds
    pub timestamp: i64,
    /// zone offset rendered as `±HHMM`
    pub offset: String,
}

impl Signature {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        timestamp: i64,
        offset: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            timestamp,
            offset: offset.into(),
        }
    }

    /// parse `Name <email> <seconds> <offset>`
    pub fn parse(s: &str) -> Result<Self> {
        let open = s
            .find('<')
            .ok_or_else(|| Error::CorruptObject(format!("malformed signature: {}", s)))?;
        let close = s[open..]
            .find('>')
            .map(|i| open + i)
            .ok_or_else(|| Error::CorruptObject(format!("malformed signature: {}", s)))?;

        let name = s[..open].trim_end().to_string();
        let email = s[open + 1..close].to_string();

        let mut rest = s[close + 1..].split_ascii_whitespace();
        let timestamp = rest
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| Error::CorruptObject(format!("malformed signature time: {}", s)))?;
        let offset = rest
            .next()
            .ok_or_else(|| Error::CorruptObject(format!("malformed signature zone: {}", s)))?
            .to_string();

        Ok(Self {
            name,
            email,
            timestamp,
            offset,
        })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} <{}> {} {}",
            self.name, self.email, self.timestamp, self.offset
        )
    }
}

/// a commit object: a tree snapshot with ancestry and identity headers
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    pub tree: Hash,
    /// empty for a root commit; this implementation produces at most one
    pub parents: Vec<Hash>,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
}

impl Commit {
    /// create a commit where the author is also the committer
    pub fn new(
        tree: Hash,
        parents: Vec<Hash>,
        author: Signature,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tree,
            parents,
            committer: author.clone(),
            author,
            message: message.into(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// serialize to the textual payload
    ///
    /// the `parent` header is omitted entirely for root commits.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = String::new();
        out.push_str(&format!("tree {}\n", self.tree));
        for parent in &self.parents {
            out.push_str(&format!("parent {}\n", parent));
        }
        out.push_str(&format!("author {}\n", self.author));
        out.push_str(&format!("committer {}\n", self.committer));
        out.push('\n');
        out.push_str(&self.message);
        out.push('\n');
        out.into_bytes()
    }

    /// parse a textual commit payload
    ///
    /// unknown headers and their continuation lines are tolerated and
    /// dropped, so commits fetched from other implementations (gpgsig,
    /// mergetag) still yield their tree and ancestry.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| Error::CorruptObject("commit payload is not utf-8".into()))?;

        let (headers, message) = text
            .split_once("\n\n")
            .ok_or_else(|| Error::CorruptObject("commit missing header separator".into()))?;

        let mut tree = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;

        for line in headers.lines() {
            if line.starts_with(' ') {
                continue; // continuation of a multi-line header
            }
            let (key, value) = line
                .split_once(' ')
                .ok_or_else(|| Error::CorruptObject(format!("malformed commit header: {}", line)))?;
            match key {
                "tree" => tree = Some(Hash::from_hex(value)?),
                "parent" => parents.push(Hash::from_hex(value)?),
                "author" => author = Some(Signature::parse(value)?),
                "committer" => committer = Some(Signature::parse(value)?),
                _ => {}
            }
        }

        Ok(Self {
            tree: tree.ok_or_else(|| Error::CorruptObject("commit missing tree header".into()))?,
            parents,
            author: author
                .ok_or_else(|| Error::CorruptObject("commit missing author header".into()))?,
            committer: committer
                .ok_or_else(|| Error::CorruptObject("commit missing committer header".into()))?,
            message: message.strip_suffix('\n').unwrap_or(message).to_string(),
        })
    }
}

/// read a commit object from the store
pub fn read_commit(repo: &Repo, hash: &Hash) -> Result<Commit> {
    let (kind, payload) = read_object(repo, hash)?;
    if kind != ObjectKind::Commit {
        return Err(Error::CorruptObject(format!(
            "expected commit, found {} at {}",
            kind, hash
        )));
    }
    Commit::decode(&payload)
}

/// write a commit object to the store
pub fn write_commit(repo: &Repo, commit: &Commit) -> Result<Hash> {
    write_object(repo, ObjectKind::Commit, &commit.encode())
}
