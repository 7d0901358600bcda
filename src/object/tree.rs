use std::borrow::Cow;
use std::fmt;

use crate::error::{Error, Result};
use crate::hash::{Hash, HASH_LEN};
use crate::object::store::{read_object, write_object, ObjectKind};
use crate::repo::Repo;

/// raw ASCII file mode of a tree entry
///
/// the builder only produces `100<octal3>` and `40000`, but any mode read
/// from an existing tree is carried through encode/decode unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryMode(Vec<u8>);

impl EntryMode {
    /// mode of a subtree entry
    pub fn tree() -> Self {
        Self(b"40000".to_vec())
    }

    /// mode of a regular file with the given permission bits
    pub fn blob(permissions: u32) -> Self {
        Self(format!("100{:03o}", permissions & 0o777).into_bytes())
    }

    /// accept a raw mode field as read from a stored tree
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() || !bytes.iter().all(|b| b.is_ascii_digit()) {
            return Err(Error::CorruptObject(format!(
                "malformed tree entry mode: {:?}",
                String::from_utf8_lossy(bytes)
            )));
        }
        Ok(Self(bytes.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_tree(&self) -> bool {
        self.0 == b"40000" || self.0 == b"040000"
    }

    pub fn is_blob(&self) -> bool {
        self.0.starts_with(b"100")
    }

    pub fn is_symlink(&self) -> bool {
        self.0 == b"120000"
    }

    pub fn is_gitlink(&self) -> bool {
        self.0 == b"160000"
    }

    /// POSIX permission bits from the trailing three octal digits
    pub fn permissions(&self) -> u32 {
        let tail = &self.0[self.0.len().saturating_sub(3)..];
        tail.iter()
            .fold(0, |acc, b| acc * 8 + u32::from(b - b'0'))
    }

    /// object kind this mode points at
    pub fn kind(&self) -> ObjectKind {
        if self.is_tree() {
            ObjectKind::Tree
        } else if self.is_gitlink() {
            ObjectKind::Commit
        } else {
            ObjectKind::Blob
        }
    }
}

impl fmt::Display for EntryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // zero-pad to the six columns git shows ("040000", "100644")
        write!(f, "{:0>6}", String::from_utf8_lossy(&self.0))
    }
}

/// a single `(mode, name, hash)` entry in a tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: EntryMode,
    pub name: Vec<u8>,
    pub hash: Hash,
}

impl TreeEntry {
    pub fn new(mode: EntryMode, name: impl Into<Vec<u8>>, hash: Hash) -> Self {
        Self {
            mode,
            name: name.into(),
            hash,
        }
    }

    /// entry name for display purposes
    pub fn name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }
}

impl fmt::Display for TreeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}\t{}",
            self.mode,
            self.mode.kind(),
            self.hash,
            self.name_lossy()
        )
    }
}

/// an ordered collection of tree entries
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// create a new tree, validating names and applying canonical ordering
    ///
    /// subtree names compare as if suffixed with `/`, matching the ordering
    /// canonical trees are hashed with.
    pub fn new(mut entries: Vec<TreeEntry>) -> Result<Self> {
        for entry in &entries {
            validate_entry_name(&entry.name)?;
        }

        entries.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));

        for window in entries.windows(2) {
            if window[0].name == window[1].name {
                return Err(Error::DuplicateEntryName(
                    window[0].name_lossy().into_owned(),
                ));
            }
        }

        Ok(Self { entries })
    }

    /// create an empty tree
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// look up an entry by name
    pub fn get(&self, name: &[u8]) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// serialize to the stored payload: `<mode> <name>\0<20 raw hash bytes>`
    /// per entry, concatenated with no separator
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in &self.entries {
            out.extend_from_slice(entry.mode.as_bytes());
            out.push(b' ');
            out.extend_from_slice(&entry.name);
            out.push(0);
            out.extend_from_slice(entry.hash.as_bytes());
        }
        out
    }

    /// parse a stored payload, preserving entry order exactly as read
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut entries = Vec::new();
        let mut rest = payload;

        while !rest.is_empty() {
            let space = rest
                .iter()
                .position(|&b| b == b' ')
                .ok_or_else(|| Error::CorruptObject("tree entry missing mode".into()))?;
            let mode = EntryMode::from_bytes(&rest[..space])?;
            rest = &rest[space + 1..];

            let nul = rest
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| Error::CorruptObject("tree entry missing name".into()))?;
            let name = rest[..nul].to_vec();
            rest = &rest[nul + 1..];

            if rest.len() < HASH_LEN {
                return Err(Error::CorruptObject("truncated tree entry hash".into()));
            }
            let hash = Hash::from_bytes(rest[..HASH_LEN].try_into().unwrap());
            rest = &rest[HASH_LEN..];

            entries.push(TreeEntry { mode, name, hash });
        }

        Ok(Self { entries })
    }
}

/// canonical comparison key: subtree names sort with a trailing `/`
fn sort_key(entry: &TreeEntry) -> Vec<u8> {
    let mut key = entry.name.clone();
    if entry.mode.is_tree() {
        key.push(b'/');
    }
    key
}

fn validate_entry_name(name: &[u8]) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidEntryName("empty name".to_string()));
    }
    if name.contains(&b'/') {
        return Err(Error::InvalidEntryName(format!(
            "name contains '/': {}",
            String::from_utf8_lossy(name)
        )));
    }
    if name.contains(&0) {
        return Err(Error::InvalidEntryName(format!(
            "name contains null byte: {}",
            String::from_utf8_lossy(name)
        )));
    }
    if name == b"." || name == b".." {
        return Err(Error::InvalidEntryName(format!(
            "reserved name: {}",
            String::from_utf8_lossy(name)
        )));
    }
    Ok(())
}

/// read a tree object from the store
pub fn read_tree(repo: &Repo, hash: &Hash) -> Result<Tree> {
    let (kind, payload) = read_object(repo, hash)?;
    if kind != ObjectKind::Tree {
        return Err(Error::CorruptObject(format!(
            "expected tree, found {} at {}",
            kind, hash
        )));
    }
    Tree::decode(&payload)
}

/// write a tree object to the store
pub fn write_tree(repo: &Repo, tree: &Tree) -> Result<Hash> {
    write_object(repo, ObjectKind::Tree, &tree.encode())
}
