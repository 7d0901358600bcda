use std::fmt;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::Hash;
use crate::repo::Repo;

/// the four kinds of stored objects
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectKind {
    /// header name used in the object envelope
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
            ObjectKind::Tag => "tag",
        }
    }

    /// parse an envelope header name
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        match bytes {
            b"blob" => Ok(ObjectKind::Blob),
            b"tree" => Ok(ObjectKind::Tree),
            b"commit" => Ok(ObjectKind::Commit),
            b"tag" => Ok(ObjectKind::Tag),
            other => Err(Error::InvalidObjectKind(
                String::from_utf8_lossy(other).into_owned(),
            )),
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// build the `<kind> <size>\0<payload>` envelope that is hashed and compressed
pub fn encode_envelope(kind: ObjectKind, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 16);
    out.extend_from_slice(kind.as_str().as_bytes());
    out.push(b' ');
    out.extend_from_slice(payload.len().to_string().as_bytes());
    out.push(0);
    out.extend_from_slice(payload);
    out
}

/// split an envelope into its kind and payload, verifying the recorded size
pub fn split_envelope(data: &[u8]) -> Result<(ObjectKind, &[u8])> {
    let nul = data
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::CorruptObject("missing envelope terminator".into()))?;
    let (header, payload) = (&data[..nul], &data[nul + 1..]);

    let space = header
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| Error::CorruptObject("malformed envelope header".into()))?;
    let kind = ObjectKind::from_bytes(&header[..space])?;

    let size: usize = std::str::from_utf8(&header[space + 1..])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::CorruptObject("malformed envelope size".into()))?;
    if size != payload.len() {
        return Err(Error::CorruptObject(format!(
            "envelope size {} does not match payload length {}",
            size,
            payload.len()
        )));
    }

    Ok((kind, payload))
}

/// compute the address an object would be stored under
pub fn hash_object(kind: ObjectKind, payload: &[u8]) -> Hash {
    Hash::digest(&encode_envelope(kind, payload))
}

/// zlib-compress a byte sequence
pub fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// zlib-decompress a byte sequence
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| Error::CorruptObject(format!("zlib: {}", e)))?;
    Ok(out)
}

/// get the filesystem path of a loose object
pub fn object_path(repo: &Repo, hash: &Hash) -> PathBuf {
    let (dir, file) = hash.to_path_components();
    repo.objects_path().join(dir).join(file)
}

/// check whether an object exists in the store
pub fn object_exists(repo: &Repo, hash: &Hash) -> bool {
    object_path(repo, hash).exists()
}

/// read an object from the store, returning its kind and payload
pub fn read_object(repo: &Repo, hash: &Hash) -> Result<(ObjectKind, Vec<u8>)> {
    let path = object_path(repo, hash);

    let compressed = fs::read(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::ObjectNotFound(*hash)
        } else {
            Error::Io { path, source: e }
        }
    })?;

    let envelope = decompress(&compressed)?;
    let (kind, payload) = split_envelope(&envelope)?;
    Ok((kind, payload.to_vec()))
}

/// write an object to the store, returning its address
///
/// the write is atomic (temp file then rename) and overwrites any existing
/// file at the address: identical content always has identical bytes, and
/// rewriting repairs a loose object whose stored bytes have rotted.
pub fn write_object(repo: &Repo, kind: ObjectKind, payload: &[u8]) -> Result<Hash> {
    let envelope = encode_envelope(kind, payload);
    let hash = Hash::digest(&envelope);

    let (dir, file) = hash.to_path_components();
    let object_dir = repo.objects_path().join(&dir);
    let object_path = object_dir.join(&file);

    fs::create_dir_all(&object_dir).with_path(&object_dir)?;

    let compressed = compress(&envelope).with_path(&object_path)?;

    let tmp_path = object_dir.join(format!(".tmp-{}", uuid::Uuid::new_v4()));
    {
        let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
        tmp_file.write_all(&compressed).with_path(&tmp_path)?;
    }
    fs::rename(&tmp_path, &object_path).with_path(&object_path)?;

    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repo) {
        let dir = tempdir().unwrap();
        let repo_path = dir.path().join("repo");
        let repo = Repo::init(&repo_path).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_write_and_read_roundtrip() {
        let (_dir, repo) = test_repo();

        for kind in [
            ObjectKind::Blob,
            ObjectKind::Tree,
            ObjectKind::Commit,
            ObjectKind::Tag,
        ] {
            let payload = format!("payload for {}", kind).into_bytes();
            let hash = write_object(&repo, kind, &payload).unwrap();
            let (read_kind, read_payload) = read_object(&repo, &hash).unwrap();
            assert_eq!(read_kind, kind);
            assert_eq!(read_payload, payload);
        }
    }

    #[test]
    fn test_known_blob_address() {
        let (_dir, repo) = test_repo();

        let hash = write_object(&repo, ObjectKind::Blob, b"hello\n").unwrap();
        assert_eq!(hash.to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");

        // stored form is the zlib-compressed envelope
        let stored = fs::read(object_path(&repo, &hash)).unwrap();
        assert_eq!(decompress(&stored).unwrap(), b"blob 6\0hello\n");
    }

    #[test]
    fn test_empty_blob_address() {
        let (_dir, repo) = test_repo();

        let hash = write_object(&repo, ObjectKind::Blob, b"").unwrap();
        assert_eq!(hash.to_hex(), "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
    }

    #[test]
    fn test_write_is_deterministic() {
        let (_dir, repo) = test_repo();

        let h1 = write_object(&repo, ObjectKind::Blob, b"same bytes").unwrap();
        let bytes1 = fs::read(object_path(&repo, &h1)).unwrap();

        let h2 = write_object(&repo, ObjectKind::Blob, b"same bytes").unwrap();
        let bytes2 = fs::read(object_path(&repo, &h2)).unwrap();

        assert_eq!(h1, h2);
        assert_eq!(bytes1, bytes2);
    }

    #[test]
    fn test_rewrite_repairs_corrupt_object() {
        let (_dir, repo) = test_repo();

        let hash = write_object(&repo, ObjectKind::Blob, b"precious").unwrap();
        fs::write(object_path(&repo, &hash), b"bit rot").unwrap();
        assert!(read_object(&repo, &hash).is_err());

        // writing the same content again replaces the rotted file
        let rewritten = write_object(&repo, ObjectKind::Blob, b"precious").unwrap();
        assert_eq!(rewritten, hash);

        let (kind, payload) = read_object(&repo, &hash).unwrap();
        assert_eq!(kind, ObjectKind::Blob);
        assert_eq!(payload, b"precious");
    }

    #[test]
    fn test_object_exists() {
        let (_dir, repo) = test_repo();

        let missing = Hash::from_hex("0000000000000000000000000000000000000000").unwrap();
        assert!(!object_exists(&repo, &missing));

        let hash = write_object(&repo, ObjectKind::Blob, b"present").unwrap();
        assert!(object_exists(&repo, &hash));
    }

    #[test]
    fn test_read_nonexistent_object() {
        let (_dir, repo) = test_repo();

        let missing = Hash::from_hex("0000000000000000000000000000000000000000").unwrap();
        let result = read_object(&repo, &missing);
        assert!(matches!(result, Err(Error::ObjectNotFound(_))));
    }

    #[test]
    fn test_read_corrupt_object() {
        let (_dir, repo) = test_repo();

        let hash = write_object(&repo, ObjectKind::Blob, b"fine").unwrap();
        fs::write(object_path(&repo, &hash), b"not zlib at all").unwrap();

        let result = read_object(&repo, &hash);
        assert!(matches!(result, Err(Error::CorruptObject(_))));
    }

    #[test]
    fn test_envelope_size_mismatch_is_corrupt() {
        assert!(matches!(
            split_envelope(b"blob 5\0abc"),
            Err(Error::CorruptObject(_))
        ));
    }

    #[test]
    fn test_envelope_missing_terminator_is_corrupt() {
        assert!(matches!(
            split_envelope(b"blob 3abc"),
            Err(Error::CorruptObject(_))
        ));
    }

    #[test]
    fn test_envelope_unknown_kind() {
        assert!(matches!(
            split_envelope(b"sprocket 3\0abc"),
            Err(Error::InvalidObjectKind(_))
        ));
    }
}
