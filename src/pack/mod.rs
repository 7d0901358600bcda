//! packfile decoding: expanding a fetched pack into loose-storable objects

pub mod delta;

use std::collections::HashMap;
use std::io::Read;

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};
use crate::hash::{Hash, HASH_LEN};
use crate::object::store::{hash_object, ObjectKind};

const PACK_MAGIC: &[u8; 4] = b"PACK";
const PACK_VERSION: u32 = 2;
const HEADER_LEN: usize = 12;

// pack object type codes
const TYPE_COMMIT: u8 = 1;
const TYPE_TREE: u8 = 2;
const TYPE_BLOB: u8 = 3;
const TYPE_TAG: u8 = 4;
const TYPE_OFS_DELTA: u8 = 6;
const TYPE_REF_DELTA: u8 = 7;

/// a fully resolved object decoded from a packfile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackObject {
    pub kind: ObjectKind,
    pub data: Vec<u8>,
}

/// decode a packfile into content-addressed objects
///
/// the trailing SHA-1 is verified before any parsing. ref-delta objects are
/// reconstructed against bases appearing earlier in the pack; a delta whose
/// base has not been seen fails with `UnknownBase`. ofs-delta objects are
/// not produced by servers we talk to (the capability is never requested)
/// and are rejected as unsupported.
pub fn unpack(data: &[u8]) -> Result<HashMap<Hash, PackObject>> {
    if data.len() < HEADER_LEN + HASH_LEN {
        return Err(Error::CorruptPack("truncated packfile".into()));
    }

    // verify the trailer checksum over everything before it
    let body_end = data.len() - HASH_LEN;
    let expected = Hash::from_bytes(data[body_end..].try_into().unwrap());
    let actual = Hash::digest(&data[..body_end]);
    if actual != expected {
        return Err(Error::ChecksumMismatch { expected, actual });
    }

    if &data[..4] != PACK_MAGIC {
        return Err(Error::CorruptPack("missing PACK signature".into()));
    }
    let version = BigEndian::read_u32(&data[4..8]);
    if version != PACK_VERSION {
        return Err(Error::CorruptPack(format!(
            "unsupported pack version {}",
            version
        )));
    }
    let object_count = BigEndian::read_u32(&data[8..12]);

    let body = &data[..body_end];
    let mut pos = HEADER_LEN;
    let mut objects = HashMap::with_capacity(object_count as usize);

    for _ in 0..object_count {
        let (type_code, size) = read_object_header(body, &mut pos)?;

        match type_code {
            TYPE_COMMIT | TYPE_TREE | TYPE_BLOB | TYPE_TAG => {
                let payload = inflate(body, &mut pos)?;
                if payload.len() != size {
                    return Err(Error::CorruptPack(format!(
                        "object size {} does not match header {}",
                        payload.len(),
                        size
                    )));
                }
                let kind = object_kind(type_code);
                let hash = hash_object(kind, &payload);
                objects.insert(hash, PackObject {
                    kind,
                    data: payload,
                });
            }
            TYPE_REF_DELTA => {
                if pos + HASH_LEN > body.len() {
                    return Err(Error::CorruptPack("truncated delta base hash".into()));
                }
                let base_hash = Hash::from_bytes(body[pos..pos + HASH_LEN].try_into().unwrap());
                pos += HASH_LEN;

                let delta_stream = inflate(body, &mut pos)?;
                if delta_stream.len() != size {
                    return Err(Error::CorruptPack(format!(
                        "delta size {} does not match header {}",
                        delta_stream.len(),
                        size
                    )));
                }

                let base = objects
                    .get(&base_hash)
                    .ok_or(Error::UnknownBase(base_hash))?;
                let kind = base.kind;
                let payload = delta::apply(&base.data, &delta_stream)?;

                let hash = hash_object(kind, &payload);
                objects.insert(hash, PackObject {
                    kind,
                    data: payload,
                });
            }
            TYPE_OFS_DELTA => {
                return Err(Error::Unsupported("ofs-delta pack objects".into()));
            }
            other => {
                return Err(Error::CorruptPack(format!(
                    "unknown pack object type {}",
                    other
                )));
            }
        }
    }

    Ok(objects)
}

/// decode the per-object header: 3 type bits and a variable-length size
///
/// the size accumulates little-endian: 4 bits from the first byte, then
/// 7 bits per continuation byte while the msb is set.
fn read_object_header(data: &[u8], pos: &mut usize) -> Result<(u8, usize)> {
    let first = *data
        .get(*pos)
        .ok_or_else(|| Error::CorruptPack("truncated object header".into()))?;
    *pos += 1;

    let type_code = (first >> 4) & 0b111;
    let mut size = (first & 0b1111) as usize;
    let mut shift = 4;

    let mut byte = first;
    while byte & 0x80 != 0 {
        byte = *data
            .get(*pos)
            .ok_or_else(|| Error::CorruptPack("truncated object header".into()))?;
        *pos += 1;
        size |= ((byte & 0x7f) as usize) << shift;
        shift += 7;
    }

    Ok((type_code, size))
}

/// inflate one zlib stream starting at `pos`, advancing `pos` past the
/// compressed bytes actually consumed
///
/// many compressed streams are concatenated inside a pack, so decoding must
/// stop at the zlib end-of-stream marker rather than at the end of input.
fn inflate(data: &[u8], pos: &mut usize) -> Result<Vec<u8>> {
    let mut decoder = flate2::bufread::ZlibDecoder::new(&data[*pos..]);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::CorruptPack(format!("zlib: {}", e)))?;
    *pos += decoder.total_in() as usize;
    Ok(out)
}

fn object_kind(type_code: u8) -> ObjectKind {
    match type_code {
        TYPE_COMMIT => ObjectKind::Commit,
        TYPE_TREE => ObjectKind::Tree,
        TYPE_TAG => ObjectKind::Tag,
        _ => ObjectKind::Blob,
    }
}
