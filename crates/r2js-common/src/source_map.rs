//! Source Map v3 generation.
//!
//! The printer records one mapping per emitted token that carries an origin.
//! Generated positions are 0-based lines and 0-based columns of the final,
//! whitespace-normalized text; original positions are 0-based lines (the
//! span's 1-based line minus one) and 0-based columns.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

const BASE64_CHARS: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Base64 VLQ encoding as used by the `mappings` field.
pub mod vlq {
    use super::BASE64_CHARS;

    const VLQ_BASE_SHIFT: u32 = 5;
    const VLQ_BASE_MASK: i64 = 0b1_1111;
    const VLQ_CONTINUATION_BIT: i64 = 0b10_0000;

    pub fn encode(value: i32) -> String {
        let mut out = String::new();
        encode_into(value, &mut out);
        out
    }

    pub fn encode_into(value: i32, out: &mut String) {
        let value = i64::from(value);
        let mut vlq = if value < 0 {
            ((-value) << 1) | 1
        } else {
            value << 1
        };
        loop {
            let mut digit = vlq & VLQ_BASE_MASK;
            vlq >>= VLQ_BASE_SHIFT;
            if vlq > 0 {
                digit |= VLQ_CONTINUATION_BIT;
            }
            out.push(BASE64_CHARS[digit as usize] as char);
            if vlq == 0 {
                break;
            }
        }
    }

    /// Decode one value from the front of `input`.
    ///
    /// Returns the value and the number of bytes consumed, or `None` when the
    /// input is empty, truncated or holds a non-base64 character.
    pub fn decode(input: &str) -> Option<(i32, usize)> {
        let mut result: i64 = 0;
        let mut shift = 0u32;
        for (index, byte) in input.bytes().enumerate() {
            let digit = i64::from(base64_value(byte)?);
            result += (digit & VLQ_BASE_MASK) << shift;
            if digit & VLQ_CONTINUATION_BIT == 0 {
                let negative = result & 1 == 1;
                let magnitude = result >> 1;
                let value = if negative { -magnitude } else { magnitude };
                return Some((i32::try_from(value).ok()?, index + 1));
            }
            shift += VLQ_BASE_SHIFT;
            if shift > 32 {
                return None;
            }
        }
        None
    }

    fn base64_value(byte: u8) -> Option<u8> {
        match byte {
            b'A'..=b'Z' => Some(byte - b'A'),
            b'a'..=b'z' => Some(byte - b'a' + 26),
            b'0'..=b'9' => Some(byte - b'0' + 52),
            b'+' => Some(62),
            b'/' => Some(63),
            _ => None,
        }
    }
}

/// A single generated-to-original position pair.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Mapping {
    pub generated_line: u32,
    pub generated_column: u32,
    pub source_index: u32,
    pub original_line: u32,
    pub original_column: u32,
    pub name_index: Option<u32>,
}

/// Accumulates sources, names and mappings, then serializes them.
#[derive(Debug, Default)]
pub struct SourceMapGenerator {
    file: String,
    sources: IndexSet<String>,
    sources_content: Vec<Option<String>>,
    names: IndexSet<String>,
    mappings: Vec<Mapping>,
}

impl SourceMapGenerator {
    pub fn new(file: String) -> Self {
        SourceMapGenerator {
            file,
            ..Default::default()
        }
    }

    /// Register a source file, returning its index. Re-adding a source returns
    /// the existing index.
    pub fn add_source(&mut self, source: String) -> u32 {
        let (index, inserted) = self.sources.insert_full(source);
        if inserted {
            self.sources_content.push(None);
        }
        index as u32
    }

    pub fn add_source_with_content(&mut self, source: String, content: String) -> u32 {
        let index = self.add_source(source);
        if let Some(slot) = self.sources_content.get_mut(index as usize) {
            *slot = Some(content);
        }
        index
    }

    pub fn add_name(&mut self, name: String) -> u32 {
        self.names.insert_full(name).0 as u32
    }

    pub fn add_simple_mapping(
        &mut self,
        generated_line: u32,
        generated_column: u32,
        source_index: u32,
        original_line: u32,
        original_column: u32,
    ) {
        self.add_mapping(Mapping {
            generated_line,
            generated_column,
            source_index,
            original_line,
            original_column,
            name_index: None,
        });
    }

    pub fn add_named_mapping(
        &mut self,
        generated_line: u32,
        generated_column: u32,
        source_index: u32,
        original_line: u32,
        original_column: u32,
        name_index: u32,
    ) {
        self.add_mapping(Mapping {
            generated_line,
            generated_column,
            source_index,
            original_line,
            original_column,
            name_index: Some(name_index),
        });
    }

    pub fn add_mapping(&mut self, mapping: Mapping) {
        self.mappings.push(mapping);
    }

    pub fn mapping_count(&self) -> usize {
        self.mappings.len()
    }

    /// Encode the `mappings` string.
    ///
    /// Mappings are sorted by generated position first; exact duplicates are
    /// dropped. Empty generated lines still get their `;` separator.
    pub fn encode_mappings(&self) -> String {
        let mut mappings = self.mappings.clone();
        mappings.sort();
        mappings.dedup();

        let mut out = String::new();
        let mut line = 0u32;
        let mut prev_generated_column = 0i64;
        let mut prev_source_index = 0i64;
        let mut prev_original_line = 0i64;
        let mut prev_original_column = 0i64;
        let mut prev_name_index = 0i64;
        let mut first_in_line = true;

        for mapping in &mappings {
            while line < mapping.generated_line {
                out.push(';');
                line += 1;
                prev_generated_column = 0;
                first_in_line = true;
            }
            if !first_in_line {
                out.push(',');
            }
            first_in_line = false;

            push_delta(&mut out, i64::from(mapping.generated_column), &mut prev_generated_column);
            push_delta(&mut out, i64::from(mapping.source_index), &mut prev_source_index);
            push_delta(&mut out, i64::from(mapping.original_line), &mut prev_original_line);
            push_delta(&mut out, i64::from(mapping.original_column), &mut prev_original_column);
            if let Some(name) = mapping.name_index {
                push_delta(&mut out, i64::from(name), &mut prev_name_index);
            }
        }
        out
    }

    pub fn generate(&self) -> SourceMap {
        let has_content = self.sources_content.iter().any(Option::is_some);
        SourceMap {
            version: 3,
            file: self.file.clone(),
            sources: self.sources.iter().cloned().collect(),
            sources_content: has_content.then(|| self.sources_content.clone()),
            names: self.names.iter().cloned().collect(),
            mappings: self.encode_mappings(),
        }
    }

    pub fn to_json(&self) -> String {
        self.generate().to_json()
    }
}

fn push_delta(out: &mut String, value: i64, prev: &mut i64) {
    let delta = value - *prev;
    *prev = value;
    vlq::encode_into(delta as i32, out);
}

/// A serialized Source Map v3 object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u32,
    pub file: String,
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn to_inline_comment(&self) -> String {
        format!(
            "//# sourceMappingURL=data:application/json;base64,{}",
            base64_encode(self.to_json().as_bytes())
        )
    }

    /// Decode `mappings` back into absolute positions.
    ///
    /// Malformed segments are skipped rather than reported; this is a
    /// debugging and testing aid, not a validating parser.
    pub fn decoded_mappings(&self) -> Vec<Mapping> {
        let mut decoded = Vec::new();
        let mut source_index = 0i64;
        let mut original_line = 0i64;
        let mut original_column = 0i64;
        let mut name_index = 0i64;

        for (generated_line, line) in self.mappings.split(';').enumerate() {
            let mut generated_column = 0i64;
            for segment in line.split(',').filter(|segment| !segment.is_empty()) {
                let mut fields = [0i64; 5];
                let mut count = 0;
                let mut rest = segment;
                while !rest.is_empty() && count < 5 {
                    let Some((value, consumed)) = vlq::decode(rest) else {
                        break;
                    };
                    fields[count] = i64::from(value);
                    count += 1;
                    rest = &rest[consumed..];
                }

                generated_column += fields[0];
                if count < 4 {
                    continue;
                }
                source_index += fields[1];
                original_line += fields[2];
                original_column += fields[3];
                let name = (count == 5).then(|| {
                    name_index += fields[4];
                    name_index as u32
                });

                decoded.push(Mapping {
                    generated_line: generated_line as u32,
                    generated_column: generated_column as u32,
                    source_index: source_index as u32,
                    original_line: original_line as u32,
                    original_column: original_column as u32,
                    name_index: name,
                });
            }
        }
        decoded
    }
}

/// Standard (padded) base64, used for inline `sourceMappingURL` comments.
pub fn base64_encode(input: &[u8]) -> String {
    let mut out = String::with_capacity(input.len().div_ceil(3) * 4);
    for chunk in input.chunks(3) {
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied().unwrap_or(0);
        let b2 = chunk.get(2).copied().unwrap_or(0);
        let triple = (u32::from(b0) << 16) | (u32::from(b1) << 8) | u32::from(b2);

        out.push(BASE64_CHARS[(triple >> 18) as usize & 0x3f] as char);
        out.push(BASE64_CHARS[(triple >> 12) as usize & 0x3f] as char);
        if chunk.len() > 1 {
            out.push(BASE64_CHARS[(triple >> 6) as usize & 0x3f] as char);
        } else {
            out.push('=');
        }
        if chunk.len() > 2 {
            out.push(BASE64_CHARS[triple as usize & 0x3f] as char);
        } else {
            out.push('=');
        }
    }
    out
}
