//! grit - minimal git-compatible version control
//!
//! a content-addressed object store speaking Git's on-disk and wire
//! formats: loose objects, trees, commits, smart-HTTP clone with packfile
//! expansion, and working-tree checkout.
//!
//! # Core concepts
//!
//! - **Object**: an immutable byte payload of kind blob, tree, commit, or
//!   tag, addressed by the SHA-1 of its `<kind> <size>\0` envelope and
//!   stored zlib-compressed under `.git/objects/`
//! - **Tree**: `(mode, name, hash)` entries in canonical order
//! - **Commit**: a tree snapshot with ancestry, identity, and message
//! - **Ref**: a named pointer to a commit under `.git/refs/heads/`
//! - **Packfile**: the wire container expanded into loose objects on clone
//!
//! # Example usage
//!
//! ```no_run
//! use grit::{ops, Repo};
//! use std::path::Path;
//!
//! // initialize a repository
//! let repo = Repo::init(Path::new("/path/to/repo")).unwrap();
//!
//! // snapshot the working tree and commit it
//! let tree = ops::write_tree(&repo, repo.path()).unwrap();
//! let commit = ops::commit_tree(&repo, tree, None, "initial import", None).unwrap();
//!
//! // materialize it somewhere else
//! ops::checkout(&repo, &commit, Path::new("/path/to/restore")).unwrap();
//! ```

mod error;
mod hash;
mod repo;

pub mod object;
pub mod ops;
pub mod pack;
pub mod refs;
pub mod transport;

pub use error::{Error, Result};
pub use hash::Hash;
pub use object::{
    read_commit, read_object, read_tree, write_commit, write_object, write_tree, Commit,
    EntryMode, ObjectKind, Signature, Tree, TreeEntry,
};
pub use repo::{Repo, DEFAULT_BRANCH};
