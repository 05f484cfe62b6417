//! Embedded image metadata extraction (IPTC-IIM).
//!
//! Reads the IPTC Application Record out of a JPEG's APP13 segment (the
//! Photoshop 8BIM resource 0x0404) into an open key/value map that the
//! content loader attaches to each image as its `meta` field. The fields most
//! photography tools actually write are mapped to stable names:
//!
//! | Dataset | Key            |
//! |---------|----------------|
//! | 2:05    | `title`        |
//! | 2:25    | `keywords` (repeatable, collected into an array) |
//! | 2:55    | `date_created` |
//! | 2:80    | `byline`       |
//! | 2:90    | `city`         |
//! | 2:101   | `country`      |
//! | 2:105   | `headline`     |
//! | 2:120   | `caption`      |
//!
//! Missing or unparseable metadata is not an error — most images carry none —
//! but an unreadable file is, since it means the content tree points at
//! something the later pipeline stages cannot use either.

use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum MetaError {
    #[error("Could not read file {0}; {1}")]
    Unreadable(String, std::io::Error),
}

/// Read embedded metadata from an image file.
///
/// Returns an empty map for formats without IPTC support and for files
/// without (or with corrupt) metadata.
pub fn read_meta(path: &Path) -> Result<Map<String, Value>, MetaError> {
    let bytes = std::fs::read(path)
        .map_err(|e| MetaError::Unreadable(path.display().to_string(), e))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let meta = match extension.as_str() {
        "jpg" | "jpeg" => parse_jpeg(&bytes),
        _ => Map::new(),
    };

    if meta.is_empty() {
        debug!("No embedded metadata read from file {}", path.display());
    }
    Ok(meta)
}

const PHOTOSHOP_HEADER: &[u8] = b"Photoshop 3.0\0";
const RESOURCE_MARKER: &[u8] = b"8BIM";
const IPTC_RESOURCE: u16 = 0x0404;

/// Walk the JPEG segment chain looking for an APP13 segment with IPTC data.
fn parse_jpeg(bytes: &[u8]) -> Map<String, Value> {
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return Map::new();
    }

    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            break;
        }
        let marker = bytes[pos + 1];
        match marker {
            // Standalone markers carry no length field
            0xD8 | 0xD9 | 0x01 | 0xD0..=0xD7 => {
                pos += 2;
            }
            // Start of scan: entropy-coded data follows, metadata cannot
            0xDA => break,
            _ => {
                let length = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
                if length < 2 {
                    break;
                }
                let body_start = pos + 4;
                let body_end = (pos + 2 + length).min(bytes.len());
                if marker == 0xED {
                    if let Some(records) = iptc_resource(&bytes[body_start..body_end]) {
                        return parse_records(records);
                    }
                }
                pos += 2 + length;
            }
        }
    }
    Map::new()
}

/// Pull the raw IPTC record bytes out of a Photoshop 8BIM resource chain.
fn iptc_resource(segment: &[u8]) -> Option<&[u8]> {
    let mut data = segment.strip_prefix(PHOTOSHOP_HEADER).unwrap_or(segment);

    while data.len() >= 12 {
        if !data.starts_with(RESOURCE_MARKER) {
            data = &data[1..];
            continue;
        }
        let resource_id = u16::from_be_bytes([data[4], data[5]]);

        // Pascal name string, padded to even length (minimum 2 bytes)
        let name_len = data[6] as usize;
        let mut offset = 6 + 1 + name_len;
        if offset % 2 == 1 {
            offset += 1;
        }
        if offset + 4 > data.len() {
            return None;
        }

        let size = u32::from_be_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ]) as usize;
        let payload_start = offset + 4;
        let payload_end = payload_start.checked_add(size)?;
        if payload_end > data.len() {
            return None;
        }

        if resource_id == IPTC_RESOURCE {
            return Some(&data[payload_start..payload_end]);
        }

        // Resource payloads are padded to even length
        let advance = payload_end + (size % 2);
        data = data.get(advance..)?;
    }
    None
}

/// Decode IPTC-IIM datasets (record 2) into the metadata map.
///
/// Dataset layout: `0x1C`, record number, dataset number, big-endian u16
/// length, then the value bytes.
fn parse_records(data: &[u8]) -> Map<String, Value> {
    let mut meta = Map::new();
    let mut keywords = Vec::new();
    let mut pos = 0;

    while pos + 5 <= data.len() {
        if data[pos] != 0x1C {
            pos += 1;
            continue;
        }
        let record = data[pos + 1];
        let dataset = data[pos + 2];
        let length = u16::from_be_bytes([data[pos + 3], data[pos + 4]]) as usize;
        pos += 5;
        if pos + length > data.len() {
            break;
        }

        if record == 2 {
            let value = String::from_utf8_lossy(&data[pos..pos + length])
                .trim()
                .to_string();
            if !value.is_empty() {
                match dataset {
                    5 => insert(&mut meta, "title", value),
                    25 => keywords.push(Value::String(value)),
                    55 => insert(&mut meta, "date_created", value),
                    80 => insert(&mut meta, "byline", value),
                    90 => insert(&mut meta, "city", value),
                    101 => insert(&mut meta, "country", value),
                    105 => insert(&mut meta, "headline", value),
                    120 => insert(&mut meta, "caption", value),
                    _ => {}
                }
            }
        }
        pos += length;
    }

    if !keywords.is_empty() {
        meta.insert("keywords".to_string(), Value::Array(keywords));
    }
    meta
}

fn insert(meta: &mut Map<String, Value>, key: &str, value: String) {
    meta.insert(key.to_string(), Value::String(value));
}
