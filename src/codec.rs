//! WKT/WKB codecs and the codec-state snapshot surface.
//!
//! Grammar and byte layout are delegated to geozero; this module wraps
//! the four codec roles (text/binary, parse/generate) as small objects
//! carrying their option maps, so a factory can be decomposed into a
//! plain mapping of codec-state fields for external persistence. Codecs
//! are built lazily by the factory; a freshly constructed factory
//! therefore snapshots four empty maps.

use crate::error::{GeoforgeError, Result};
use geo::Geometry as GeoGeometry;
use geozero::wkb::{FromWkb, WkbDialect, WkbWriter};
use geozero::wkt::Wkt;
use geozero::{GeozeroGeometry, ToGeo, ToWkt};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Option map carried by each codec. Options are currently all
/// defaulted, so the maps stay empty; the type exists for the snapshot
/// contract.
pub type CodecOptions = FxHashMap<String, String>;

/// Snapshot of a factory's codec-state fields.
///
/// All four maps are empty immediately after factory construction, since
/// codecs are built on first use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodecState {
    pub wkt_generator: CodecOptions,
    pub wkb_generator: CodecOptions,
    pub wkt_parser: CodecOptions,
    pub wkb_parser: CodecOptions,
}

/// Generates well-known text.
#[derive(Debug, Default)]
pub struct WktGenerator {
    options: CodecOptions,
}

impl WktGenerator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn generate(&self, geom: &GeoGeometry<f64>) -> Result<String> {
        geom.to_wkt()
            .map_err(|err| GeoforgeError::Serialization(err.to_string()))
    }

    pub(crate) fn options(&self) -> &CodecOptions {
        &self.options
    }
}

/// Parses well-known text.
#[derive(Debug, Default)]
pub struct WktParser {
    options: CodecOptions,
}

impl WktParser {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn parse(&self, text: &str) -> Result<GeoGeometry<f64>> {
        Wkt(text)
            .to_geo()
            .map_err(|err| GeoforgeError::WktParse(err.to_string()))
    }

    pub(crate) fn options(&self) -> &CodecOptions {
        &self.options
    }
}

/// Generates well-known binary (XY, plain WKB dialect).
#[derive(Debug, Default)]
pub struct WkbGenerator {
    options: CodecOptions,
}

impl WkbGenerator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn generate(&self, geom: &GeoGeometry<f64>) -> Result<Vec<u8>> {
        let mut wkb: Vec<u8> = Vec::new();
        let mut writer = WkbWriter::new(&mut wkb, WkbDialect::Wkb);
        geom.process_geom(&mut writer)
            .map_err(|err| GeoforgeError::Serialization(err.to_string()))?;
        Ok(wkb)
    }

    pub(crate) fn options(&self) -> &CodecOptions {
        &self.options
    }
}

/// Parses well-known binary, accepting raw bytes or hexadecimal text.
#[derive(Debug, Default)]
pub struct WkbParser {
    options: CodecOptions,
}

impl WkbParser {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Parses `input` as WKB. Hexadecimal text is detected and decoded
    /// first: a valid raw stream always starts with a byte-order marker
    /// (`0x00`/`0x01`), which is never an ASCII hex digit.
    pub fn parse(&self, input: &[u8]) -> Result<GeoGeometry<f64>> {
        if input.is_empty() {
            return Err(GeoforgeError::WkbParse("empty input".to_string()));
        }
        let decoded;
        let bytes: &[u8] = if looks_like_hex(input) {
            decoded = decode_hex(input)?;
            &decoded
        } else {
            input
        };
        let mut cursor = Cursor::new(bytes);
        GeoGeometry::from_wkb(&mut cursor, WkbDialect::Wkb)
            .map_err(|err| GeoforgeError::WkbParse(err.to_string()))
    }

    pub(crate) fn options(&self) -> &CodecOptions {
        &self.options
    }
}

fn looks_like_hex(input: &[u8]) -> bool {
    input.len() % 2 == 0 && input.iter().all(u8::is_ascii_hexdigit)
}

/// Encodes bytes as lowercase hexadecimal text.
pub fn encode_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(char::from_digit((byte >> 4) as u32, 16).unwrap_or('0'));
        out.push(char::from_digit((byte & 0x0f) as u32, 16).unwrap_or('0'));
    }
    out
}

fn decode_hex(input: &[u8]) -> Result<Vec<u8>> {
    fn nibble(byte: u8) -> Result<u8> {
        match byte {
            b'0'..=b'9' => Ok(byte - b'0'),
            b'a'..=b'f' => Ok(byte - b'a' + 10),
            b'A'..=b'F' => Ok(byte - b'A' + 10),
            _ => Err(GeoforgeError::WkbParse(format!(
                "invalid hex digit 0x{byte:02x}"
            ))),
        }
    }

    input
        .chunks_exact(2)
        .map(|pair| Ok((nibble(pair[0])? << 4) | nibble(pair[1])?))
        .collect()
}
