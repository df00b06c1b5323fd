//! RFC 2617 Digest access authentication.
//!
//! Parses `WWW-Authenticate` challenges and computes the MD5
//! challenge/response pair the server expects back in `Authorization`.

use md5::{Digest, Md5};
use rand::Rng;

use crate::error::{Result, TransportError};

/// A parsed `Digest` challenge from a 401 response.
///
/// Challenges are rebuilt for every 401 and never cached across requests:
/// the server nonce is scoped to a single challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    /// Protection realm, hashed into HA1 and echoed back verbatim.
    pub realm: String,

    /// Server nonce for this challenge.
    pub nonce: String,

    /// Quality of protection, normalized to `auth` during parsing.
    pub qop: String,

    /// Opaque blob to echo back, if the server sent one.
    pub opaque: Option<String>,

    /// Digest algorithm name, if the server sent one. Only MD5 is computed.
    pub algorithm: Option<String>,
}

impl DigestChallenge {
    /// Parses a `WWW-Authenticate` header value.
    ///
    /// Fails with [`TransportError::Protocol`] when the header does not carry
    /// a `Digest` challenge or lacks the mandatory `realm`/`nonce` fields, and
    /// with [`TransportError::UnsupportedQop`] when the quality-of-protection
    /// list does not offer plain `auth`.
    pub fn parse(header: &str) -> Result<Self> {
        let fields = header.trim().strip_prefix("Digest ").ok_or_else(|| {
            TransportError::Protocol(format!("expected a Digest challenge, got: {header}"))
        })?;

        let mut realm = None;
        let mut nonce = None;
        let mut qop = None;
        let mut opaque = None;
        let mut algorithm = None;
        for field in split_fields(fields) {
            let Some((key, value)) = field.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').to_string();
            match key.trim() {
                "realm" => realm = Some(value),
                "nonce" => nonce = Some(value),
                "qop" => qop = Some(value),
                "opaque" => opaque = Some(value),
                "algorithm" => algorithm = Some(value),
                _ => {}
            }
        }

        Ok(Self {
            realm: realm.ok_or_else(|| {
                TransportError::Protocol("digest challenge is missing realm".to_string())
            })?,
            nonce: nonce.ok_or_else(|| {
                TransportError::Protocol("digest challenge is missing nonce".to_string())
            })?,
            qop: select_qop(qop.as_deref())?,
            opaque,
            algorithm,
        })
    }

    /// Computes the digest response hash for one request.
    ///
    /// `HA1 = md5(username:realm:password)`, `HA2 = md5(method:uri)`, and the
    /// returned value is `md5(HA1:nonce:nc:cnonce:qop:HA2)` as lowercase hex.
    pub fn response(
        &self,
        username: &str,
        password: &str,
        method: &str,
        uri: &str,
        nc: &str,
        cnonce: &str,
    ) -> String {
        let ha1 = md5_hex(format!("{username}:{}:{password}", self.realm).as_bytes());
        let ha2 = md5_hex(format!("{method}:{uri}").as_bytes());
        md5_hex(format!("{ha1}:{}:{nc}:{cnonce}:{}:{ha2}", self.nonce, self.qop).as_bytes())
    }

    /// Renders the full `Authorization` header value for one request.
    ///
    /// Attribute order and quoting follow the wire format servers check
    /// byte-for-byte: `username`, `realm`, `nonce`, `uri`, `response`,
    /// `opaque` and `cnonce` are quoted; `algorithm`, `qop` and `nc` are not.
    /// `opaque` and `algorithm` appear only when the challenge supplied them.
    pub fn authorization(
        &self,
        username: &str,
        password: &str,
        method: &str,
        uri: &str,
        nc: u32,
        cnonce: &str,
    ) -> String {
        let nc = format!("{nc:08x}");
        let response = self.response(username, password, method, uri, &nc, cnonce);

        let mut attrs = vec![
            format!("username=\"{username}\""),
            format!("realm=\"{}\"", self.realm),
            format!("nonce=\"{}\"", self.nonce),
            format!("uri=\"{uri}\""),
        ];
        if let Some(algorithm) = &self.algorithm {
            attrs.push(format!("algorithm={algorithm}"));
        }
        attrs.push(format!("response=\"{response}\""));
        if let Some(opaque) = &self.opaque {
            attrs.push(format!("opaque=\"{opaque}\""));
        }
        attrs.push(format!("qop={}", self.qop));
        attrs.push(format!("nc={nc}"));
        attrs.push(format!("cnonce=\"{cnonce}\""));
        format!("Digest {}", attrs.join(", "))
    }
}

/// Splits a challenge parameter list on commas, ignoring commas that sit
/// inside a quoted value (a qop offer may be a quoted `auth,auth-int` list).
fn split_fields(input: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    fields.push(&input[start..]);
    fields
}

/// Validates the challenge's quality-of-protection offer.
///
/// The server may offer a single token or a comma-separated list; anything
/// that does not include plain `auth` (notably `auth-int`, which would
/// require hashing request bodies) is rejected before any retry is issued.
fn select_qop(qop: Option<&str>) -> Result<String> {
    let Some(qop) = qop else {
        return Err(TransportError::UnsupportedQop("unspecified".to_string()));
    };
    if qop.split(',').any(|q| q.trim() == "auth") {
        Ok("auth".to_string())
    } else {
        Err(TransportError::UnsupportedQop(qop.to_string()))
    }
}

/// Generates a fresh 16-hex-digit client nonce.
pub fn cnonce() -> String {
    format!("{:016x}", rand::rng().random::<u64>())
}

fn md5_hex(input: &[u8]) -> String {
    let digest = Md5::digest(input);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
