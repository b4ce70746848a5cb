//! Binary macaroon codec.
//!
//! The node issues macaroons in the V2 binary format and still accepts the
//! older V1 packet format. Both are decoded here; encoding always emits V2.
//!
//! ```text
//! V2:  0x02
//!      [location(1)] identifier(2) EOS            header section
//!      ( [location(1)] identifier(2) [vid(4)] EOS )*  caveat sections
//!      EOS
//!      signature(6)
//!
//!      field := uvarint(type) uvarint(len) bytes     EOS := 0x00
//!
//! V1:  packet* where packet := 4 hex digits (total length) "key value\n"
//! ```

use std::fmt;

use prost::encoding::{decode_varint, encode_varint};
use thiserror::Error;

const V2_VERSION: u8 = 2;

const FIELD_EOS: u64 = 0;
const FIELD_LOCATION: u64 = 1;
const FIELD_IDENTIFIER: u64 = 2;
const FIELD_VERIFICATION_ID: u64 = 4;
const FIELD_SIGNATURE: u64 = 6;

const V1_HEADER_LEN: usize = 4;

/// Length of a macaroon signature (HMAC-SHA256).
pub const SIGNATURE_LEN: usize = 32;

/// Errors raised while decoding a binary macaroon.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MacaroonError {
    #[error("empty macaroon data")]
    Empty,

    #[error("unsupported macaroon format (leading byte {0:#04x})")]
    UnsupportedFormat(u8),

    #[error("macaroon data truncated")]
    Truncated,

    #[error("invalid varint: {0}")]
    Varint(String),

    #[error("unexpected field type {found} in {section} section")]
    UnexpectedField { found: u64, section: &'static str },

    #[error("fields out of order in {0} section")]
    FieldOrder(&'static str),

    #[error("missing identifier in {0} section")]
    MissingIdentifier(&'static str),

    #[error("signature is {0} bytes, expected 32")]
    SignatureLength(usize),

    #[error("{0} unexpected bytes after macaroon")]
    TrailingData(usize),

    #[error("malformed v1 packet: {0}")]
    Packet(String),

    #[error("location is not valid UTF-8")]
    InvalidLocation,
}

/// A first- or third-party caveat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caveat {
    /// Caveat identifier (for first-party caveats, the condition text).
    pub id: Vec<u8>,
    /// Verification id, present on third-party caveats only.
    pub verification_id: Option<Vec<u8>>,
    /// Location hint for third-party caveats.
    pub location: Option<String>,
}

impl Caveat {
    /// Create a first-party caveat.
    pub fn first_party(id: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            verification_id: None,
            location: None,
        }
    }

    /// Whether this caveat must be discharged by a third party.
    pub fn is_third_party(&self) -> bool {
        self.verification_id.is_some()
    }
}

/// A decoded macaroon. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Macaroon {
    location: Option<String>,
    identifier: Vec<u8>,
    caveats: Vec<Caveat>,
    signature: [u8; SIGNATURE_LEN],
}

impl Macaroon {
    /// Assemble a macaroon from its parts.
    pub fn from_parts(
        location: Option<String>,
        identifier: Vec<u8>,
        caveats: Vec<Caveat>,
        signature: [u8; SIGNATURE_LEN],
    ) -> Self {
        Self {
            location: location.filter(|l| !l.is_empty()),
            identifier,
            caveats,
            signature,
        }
    }

    /// Decode either binary format.
    pub fn from_binary(data: &[u8]) -> Result<Self, MacaroonError> {
        match data.first() {
            None => Err(MacaroonError::Empty),
            Some(&V2_VERSION) => decode_v2(data),
            Some(b) if b.is_ascii_hexdigit() => decode_v1(data),
            Some(&b) => Err(MacaroonError::UnsupportedFormat(b)),
        }
    }

    /// Encode in the V2 binary format.
    pub fn to_binary(&self) -> Vec<u8> {
        let mut out = vec![V2_VERSION];
        if let Some(location) = &self.location {
            put_field(&mut out, FIELD_LOCATION, location.as_bytes());
        }
        put_field(&mut out, FIELD_IDENTIFIER, &self.identifier);
        out.push(FIELD_EOS as u8);

        for caveat in &self.caveats {
            if let Some(location) = caveat.location.as_deref().filter(|l| !l.is_empty()) {
                put_field(&mut out, FIELD_LOCATION, location.as_bytes());
            }
            put_field(&mut out, FIELD_IDENTIFIER, &caveat.id);
            if let Some(vid) = caveat.verification_id.as_deref().filter(|v| !v.is_empty()) {
                put_field(&mut out, FIELD_VERIFICATION_ID, vid);
            }
            out.push(FIELD_EOS as u8);
        }
        out.push(FIELD_EOS as u8);

        put_field(&mut out, FIELD_SIGNATURE, &self.signature);
        out
    }

    /// Hex form of the V2 encoding, as sent in request metadata.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_binary())
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn identifier(&self) -> &[u8] {
        &self.identifier
    }

    pub fn caveats(&self) -> &[Caveat] {
        &self.caveats
    }

    pub fn signature(&self) -> &[u8; SIGNATURE_LEN] {
        &self.signature
    }
}

impl fmt::Debug for Macaroon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Macaroon")
            .field("location", &self.location)
            .field("identifier", &hex::encode(&self.identifier))
            .field("caveats", &self.caveats.len())
            .finish_non_exhaustive()
    }
}

fn put_field(out: &mut Vec<u8>, kind: u64, data: &[u8]) {
    encode_varint(kind, out);
    encode_varint(data.len() as u64, out);
    out.extend_from_slice(data);
}

struct Field<'a> {
    kind: u64,
    data: &'a [u8],
}

fn read_varint(buf: &mut &[u8]) -> Result<u64, MacaroonError> {
    if buf.is_empty() {
        return Err(MacaroonError::Truncated);
    }
    decode_varint(buf).map_err(|e| MacaroonError::Varint(e.to_string()))
}

fn read_field<'a>(buf: &mut &'a [u8]) -> Result<Field<'a>, MacaroonError> {
    let kind = read_varint(buf)?;
    if kind == FIELD_EOS {
        return Ok(Field { kind, data: &[] });
    }

    let len = usize::try_from(read_varint(buf)?).map_err(|_| MacaroonError::Truncated)?;
    if buf.len() < len {
        return Err(MacaroonError::Truncated);
    }
    let (data, rest) = buf.split_at(len);
    *buf = rest;
    Ok(Field { kind, data })
}

/// Read fields up to and including the terminating EOS.
fn read_section<'a>(
    buf: &mut &'a [u8],
    section: &'static str,
) -> Result<Vec<Field<'a>>, MacaroonError> {
    let mut fields = Vec::new();
    let mut last = FIELD_EOS;
    loop {
        let field = read_field(buf)?;
        if field.kind == FIELD_EOS {
            return Ok(fields);
        }
        if field.kind <= last {
            return Err(MacaroonError::FieldOrder(section));
        }
        last = field.kind;
        fields.push(field);
    }
}

fn utf8_location(data: &[u8]) -> Result<Option<String>, MacaroonError> {
    let location = std::str::from_utf8(data).map_err(|_| MacaroonError::InvalidLocation)?;
    Ok(Some(location.to_string()).filter(|l| !l.is_empty()))
}

fn signature_from(data: &[u8]) -> Result<[u8; SIGNATURE_LEN], MacaroonError> {
    data.try_into()
        .map_err(|_| MacaroonError::SignatureLength(data.len()))
}

fn decode_v2(data: &[u8]) -> Result<Macaroon, MacaroonError> {
    let mut buf = &data[1..];

    let mut location = None;
    let mut identifier = None;
    for field in read_section(&mut buf, "header")? {
        match field.kind {
            FIELD_LOCATION => location = utf8_location(field.data)?,
            FIELD_IDENTIFIER => identifier = Some(field.data.to_vec()),
            found => {
                return Err(MacaroonError::UnexpectedField {
                    found,
                    section: "header",
                })
            }
        }
    }
    let identifier = identifier.ok_or(MacaroonError::MissingIdentifier("header"))?;

    let mut caveats = Vec::new();
    loop {
        match buf.first() {
            None => return Err(MacaroonError::Truncated),
            Some(&b) if u64::from(b) == FIELD_EOS => {
                buf = &buf[1..];
                break;
            }
            Some(_) => {}
        }

        let mut caveat_location = None;
        let mut id = None;
        let mut verification_id = None;
        for field in read_section(&mut buf, "caveat")? {
            match field.kind {
                FIELD_LOCATION => caveat_location = utf8_location(field.data)?,
                FIELD_IDENTIFIER => id = Some(field.data.to_vec()),
                FIELD_VERIFICATION_ID => verification_id = Some(field.data.to_vec()),
                found => {
                    return Err(MacaroonError::UnexpectedField {
                        found,
                        section: "caveat",
                    })
                }
            }
        }
        caveats.push(Caveat {
            id: id.ok_or(MacaroonError::MissingIdentifier("caveat"))?,
            verification_id,
            location: caveat_location,
        });
    }

    let field = read_field(&mut buf)?;
    if field.kind != FIELD_SIGNATURE {
        return Err(MacaroonError::UnexpectedField {
            found: field.kind,
            section: "signature",
        });
    }
    let signature = signature_from(field.data)?;

    if !buf.is_empty() {
        return Err(MacaroonError::TrailingData(buf.len()));
    }

    Ok(Macaroon {
        location,
        identifier,
        caveats,
        signature,
    })
}

fn read_packet<'a>(buf: &mut &'a [u8]) -> Result<(&'a [u8], &'a [u8]), MacaroonError> {
    if buf.len() < V1_HEADER_LEN {
        return Err(MacaroonError::Truncated);
    }
    let header = &buf[..V1_HEADER_LEN];
    if !header.iter().all(u8::is_ascii_hexdigit) {
        return Err(MacaroonError::Packet("bad length header".into()));
    }
    // Validated as ASCII hex above.
    let size = header
        .iter()
        .fold(0usize, |acc, b| acc * 16 + (*b as char).to_digit(16).unwrap_or(0) as usize);
    if size <= V1_HEADER_LEN {
        return Err(MacaroonError::Packet(format!("packet size {} too small", size)));
    }
    if size > buf.len() {
        return Err(MacaroonError::Truncated);
    }

    let packet = &buf[V1_HEADER_LEN..size];
    *buf = &buf[size..];

    let body = packet
        .strip_suffix(b"\n")
        .ok_or_else(|| MacaroonError::Packet("missing terminating newline".into()))?;
    let split = body
        .iter()
        .position(|b| *b == b' ')
        .ok_or_else(|| MacaroonError::Packet("missing key separator".into()))?;
    Ok((&body[..split], &body[split + 1..]))
}

fn expect_packet<'a>(buf: &mut &'a [u8], key: &str) -> Result<&'a [u8], MacaroonError> {
    let (found, value) = read_packet(buf)?;
    if found != key.as_bytes() {
        return Err(MacaroonError::Packet(format!(
            "expected {:?}, found {:?}",
            key,
            String::from_utf8_lossy(found)
        )));
    }
    Ok(value)
}

fn decode_v1(data: &[u8]) -> Result<Macaroon, MacaroonError> {
    let mut buf = data;

    let location = utf8_location(expect_packet(&mut buf, "location")?)?;
    let identifier = expect_packet(&mut buf, "identifier")?.to_vec();

    let mut caveats: Vec<Caveat> = Vec::new();
    let signature = loop {
        let (key, value) = read_packet(&mut buf)?;
        match key {
            b"signature" => break signature_from(value)?,
            b"cid" => caveats.push(Caveat::first_party(value)),
            b"vid" | b"cl" => {
                let caveat = caveats
                    .last_mut()
                    .ok_or_else(|| MacaroonError::Packet("caveat field before cid".into()))?;
                if key == b"vid" {
                    caveat.verification_id = Some(value.to_vec());
                } else {
                    caveat.location = utf8_location(value)?;
                }
            }
            other => {
                return Err(MacaroonError::Packet(format!(
                    "unexpected key {:?}",
                    String::from_utf8_lossy(other)
                )))
            }
        }
    };

    if !buf.is_empty() {
        return Err(MacaroonError::TrailingData(buf.len()));
    }

    Ok(Macaroon {
        location,
        identifier,
        caveats,
        signature,
    })
}
