use std::fs;

use crate::error::{IoResultExt, Result};
use crate::hash::Hash;
use crate::object::store::{decompress, split_envelope};
use crate::repo::Repo;

/// integrity report over the loose object store
#[derive(Debug, Default)]
pub struct FsckReport {
    /// objects examined
    pub objects_checked: usize,
    /// objects whose stored bytes no longer match their address
    pub corrupt: Vec<(Hash, String)>,
}

impl FsckReport {
    pub fn is_ok(&self) -> bool {
        self.corrupt.is_empty()
    }
}

/// verify every loose object: decompress, check the envelope, and re-hash
pub fn fsck(repo: &Repo) -> Result<FsckReport> {
    let mut report = FsckReport::default();

    let objects_dir = repo.objects_path();
    for fan_out in fs::read_dir(&objects_dir).with_path(&objects_dir)? {
        let fan_out = fan_out.with_path(&objects_dir)?;
        if !fan_out.file_type().with_path(fan_out.path())?.is_dir() {
            continue;
        }

        let dir_name = fan_out.file_name().to_string_lossy().into_owned();
        for object_file in fs::read_dir(fan_out.path()).with_path(fan_out.path())? {
            let object_file = object_file.with_path(fan_out.path())?;
            let file_name = object_file.file_name().to_string_lossy().into_owned();

            // skip in-flight temp files and anything else that is not an address
            let Ok(expected) = Hash::from_hex(&format!("{}{}", dir_name, file_name)) else {
                continue;
            };

            report.objects_checked += 1;
            if let Err(message) = verify_object(&object_file.path(), &expected) {
                report.corrupt.push((expected, message));
            }
        }
    }

    Ok(report)
}

fn verify_object(path: &std::path::Path, expected: &Hash) -> std::result::Result<(), String> {
    let compressed = fs::read(path).map_err(|e| format!("unreadable: {}", e))?;
    let envelope = decompress(&compressed).map_err(|e| e.to_string())?;
    split_envelope(&envelope).map_err(|e| e.to_string())?;

    let actual = Hash::digest(&envelope);
    if actual != *expected {
        return Err(format!("hash mismatch: content hashes to {}", actual));
    }
    Ok(())
}
