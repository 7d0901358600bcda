pub mod commit;
pub mod store;
pub mod tree;

pub use commit::{read_commit, write_commit, Commit, Signature};
pub use store::{object_exists, object_path, read_object, write_object, ObjectKind};
pub use tree::{read_tree, write_tree, EntryMode, Tree, TreeEntry};
