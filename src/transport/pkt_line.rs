use std::io::Read;

use crate::error::{Error, Result};

/// one decoded pkt-line frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// a data frame (payload without the length prefix)
    Line(Vec<u8>),
    /// the `0000` flush packet ending a section
    Flush,
}

impl Packet {
    /// unwrap a data frame, treating a flush as a framing error
    pub fn into_line(self) -> Result<Vec<u8>> {
        match self {
            Packet::Line(line) => Ok(line),
            Packet::Flush => Err(Error::Protocol("unexpected flush packet".into())),
        }
    }
}

/// frame a payload: 4 lowercase hex digits of total length, then the payload
pub fn encode(payload: &[u8]) -> Result<Vec<u8>> {
    let total = payload.len() + 4;
    if total > 0xffff {
        return Err(Error::Protocol(format!(
            "pkt-line payload too long: {} bytes",
            payload.len()
        )));
    }

    let mut out = format!("{:04x}", total).into_bytes();
    out.extend_from_slice(payload);
    Ok(out)
}

/// read one frame from a stream
pub fn decode<R: Read>(reader: &mut R) -> Result<Packet> {
    let mut length_hex = [0u8; 4];
    reader
        .read_exact(&mut length_hex)
        .map_err(|_| Error::Protocol("unexpected end of stream in pkt-line length".into()))?;

    let length_str = std::str::from_utf8(&length_hex)
        .map_err(|_| Error::Protocol("pkt-line length is not ascii".into()))?;
    let length = usize::from_str_radix(length_str, 16)
        .map_err(|_| Error::Protocol(format!("invalid pkt-line length: {:?}", length_str)))?;

    if length == 0 {
        return Ok(Packet::Flush);
    }
    if length < 4 {
        return Err(Error::Protocol(format!(
            "pkt-line length {} below minimum",
            length
        )));
    }

    let mut payload = vec![0u8; length - 4];
    reader
        .read_exact(&mut payload)
        .map_err(|_| Error::Protocol("unexpected end of stream in pkt-line payload".into()))?;
    Ok(Packet::Line(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        assert_eq!(encode(b"want abc\n").unwrap(), b"000dwant abc\n");
        assert_eq!(encode(b"").unwrap(), b"0004");
    }

    #[test]
    fn test_encode_too_long() {
        let payload = vec![b'x'; 0x10000];
        assert!(matches!(encode(&payload), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_decode_line() {
        let mut input = &b"000dwant abc\n"[..];
        let packet = decode(&mut input).unwrap();
        assert_eq!(packet, Packet::Line(b"want abc\n".to_vec()));
    }

    #[test]
    fn test_decode_flush() {
        let mut input = &b"0000"[..];
        assert_eq!(decode(&mut input).unwrap(), Packet::Flush);
    }

    #[test]
    fn test_decode_sequence() {
        let mut input = &b"0009done\n00000008NAK\n"[..];
        assert_eq!(decode(&mut input).unwrap(), Packet::Line(b"done\n".to_vec()));
        assert_eq!(decode(&mut input).unwrap(), Packet::Flush);
        assert_eq!(decode(&mut input).unwrap(), Packet::Line(b"NAK\n".to_vec()));
    }

    #[test]
    fn test_decode_truncated_length() {
        let mut input = &b"00"[..];
        assert!(matches!(decode(&mut input), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_decode_truncated_payload() {
        let mut input = &b"0010short"[..];
        assert!(matches!(decode(&mut input), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_decode_non_hex_length() {
        let mut input = &b"zzzzdata"[..];
        assert!(matches!(decode(&mut input), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_decode_reserved_length() {
        let mut input = &b"0003"[..];
        assert!(matches!(decode(&mut input), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_roundtrip() {
        let encoded = encode(b"hello world\n").unwrap();
        let mut reader = &encoded[..];
        assert_eq!(
            decode(&mut reader).unwrap(),
            Packet::Line(b"hello world\n".to_vec())
        );
    }

    #[test]
    fn test_into_line() {
        assert_eq!(Packet::Line(b"x".to_vec()).into_line().unwrap(), b"x");
        assert!(Packet::Flush.into_line().is_err());
    }
}
