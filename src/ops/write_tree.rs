use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::error::{IoResultExt, Result};
use crate::hash::Hash;
use crate::object::{self, EntryMode, ObjectKind, Tree, TreeEntry};
use crate::repo::Repo;

/// snapshot a directory into the object store, returning the root tree hash
///
/// every regular file becomes a blob with mode `100<octal3>` taken from its
/// permission bits, every directory a nested tree with mode `40000`. the
/// `.git` directory is excluded. entries are stored in canonical order so
/// the same contents always produce the same tree address.
pub fn write_tree(repo: &Repo, dir: &Path) -> Result<Hash> {
    let mut entries = Vec::new();

    for dir_entry in fs::read_dir(dir).with_path(dir)? {
        let dir_entry = dir_entry.with_path(dir)?;
        let name = dir_entry.file_name();
        if name == ".git" {
            continue;
        }

        let path = dir_entry.path();
        let file_type = dir_entry.file_type().with_path(&path)?;

        if file_type.is_dir() {
            let hash = write_tree(repo, &path)?;
            entries.push(TreeEntry::new(
                EntryMode::tree(),
                name.as_encoded_bytes().to_vec(),
                hash,
            ));
        } else if file_type.is_file() {
            let content = fs::read(&path).with_path(&path)?;
            let hash = object::write_object(repo, ObjectKind::Blob, &content)?;
            let permissions = dir_entry.metadata().with_path(&path)?.permissions().mode();
            entries.push(TreeEntry::new(
                EntryMode::blob(permissions),
                name.as_encoded_bytes().to_vec(),
                hash,
            ));
        } else {
            // symlinks and other special files are not snapshotted
            eprintln!("warning: skipping non-regular file {:?}", path);
        }
    }

    let tree = Tree::new(entries)?;
    object::write_tree(repo, &tree)
}
