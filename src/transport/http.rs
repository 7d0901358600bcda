//! smart-HTTP upload-pack client: ref discovery and packfile fetch

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::transport::pkt_line::{self, Packet};

const UPLOAD_PACK_SERVICE: &str = "git-upload-pack";
const ADVERTISEMENT_CONTENT_TYPE: &str = "application/x-git-upload-pack-advertisement";
const REQUEST_CONTENT_TYPE: &str = "application/x-git-upload-pack-request";

/// discover the commit the remote's HEAD points at
pub fn discover_head(client: &Client, url: &str) -> Result<Hash> {
    let discovery_url = format!(
        "{}/info/refs?service={}",
        url.trim_end_matches('/'),
        UPLOAD_PACK_SERVICE
    );

    let response = client.get(&discovery_url).send()?;
    if !response.status().is_success() {
        return Err(Error::Protocol(format!(
            "ref discovery returned {}",
            response.status()
        )));
    }

    // a smart server labels the advertisement; a dumb response would not
    // parse as pkt-lines, so reject it up front
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    if content_type != ADVERTISEMENT_CONTENT_TYPE {
        return Err(Error::Protocol(format!(
            "unexpected ref discovery content type: {:?}",
            content_type
        )));
    }

    let body = response.bytes()?;
    parse_advertisement(&body)
}

/// parse a ref advertisement down to the advertised HEAD commit
///
/// layout: a `# service=git-upload-pack` announcement, a flush, then the
/// HEAD line whose first space- or NUL-delimited token is the commit hash.
/// trailing ref advertisements and capabilities are ignored.
pub(crate) fn parse_advertisement(data: &[u8]) -> Result<Hash> {
    let mut reader = data;

    let announcement = pkt_line::decode(&mut reader)?.into_line()?;
    if !announcement.starts_with(b"# service=") {
        return Err(Error::Protocol(
            "missing service announcement in ref discovery".into(),
        ));
    }

    if pkt_line::decode(&mut reader)? != Packet::Flush {
        return Err(Error::Protocol(
            "missing flush after service announcement".into(),
        ));
    }

    let head_line = pkt_line::decode(&mut reader)?.into_line()?;
    let token = head_line
        .split(|&b| b == b' ' || b == 0 || b == b'\n')
        .next()
        .unwrap_or_default();

    let hex = std::str::from_utf8(token)
        .map_err(|_| Error::Protocol("advertised head is not ascii".into()))?;
    Hash::from_hex(hex).map_err(|_| Error::Protocol(format!("advertised head {:?} is not a hash", hex)))
}

/// fetch the packfile for a single commit
///
/// sends `want <hash> no-progress`, a flush, and `done`; no side-band or
/// delta-offset capabilities are requested, so the response is one ACK or
/// NAK packet-line followed by raw pack bytes.
pub fn fetch_pack(client: &Client, url: &str, want: &Hash) -> Result<Vec<u8>> {
    let upload_pack_url = format!("{}/{}", url.trim_end_matches('/'), UPLOAD_PACK_SERVICE);

    let mut request_body = Vec::new();
    request_body.extend(pkt_line::encode(
        format!("want {} no-progress\n", want).as_bytes(),
    )?);
    request_body.extend_from_slice(b"0000");
    request_body.extend(pkt_line::encode(b"done\n")?);

    let response = client
        .post(&upload_pack_url)
        .header(CONTENT_TYPE, REQUEST_CONTENT_TYPE)
        .body(request_body)
        .send()?;
    if !response.status().is_success() {
        return Err(Error::Protocol(format!(
            "upload-pack returned {}",
            response.status()
        )));
    }

    let body = response.bytes()?;
    strip_ack(&body)
}

/// consume the single ACK/NAK packet-line preceding the pack bytes
pub(crate) fn strip_ack(data: &[u8]) -> Result<Vec<u8>> {
    let mut reader = data;

    let ack = pkt_line::decode(&mut reader)?.into_line()?;
    if !(ack.starts_with(b"ACK") || ack.starts_with(b"NAK")) {
        return Err(Error::Protocol(format!(
            "expected ACK or NAK, got {:?}",
            String::from_utf8_lossy(&ack)
        )));
    }

    Ok(reader.to_vec())
}
