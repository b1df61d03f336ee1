//! Parser for the `key: value` meta mini-language.
//!
//! Users type extra character attributes as either one pair per line or
//! comma-separated pairs on a single line:
//!
//! ```text
//! image: http://image.com/image.jpg, hair_color: blond, nickname: Kevin
//! ```
//!
//! If the text contains a newline it is split on newlines only, otherwise on
//! commas only. Each segment must contain exactly one `": "` separator.

use rolecall_types::character::MetaMap;
use rolecall_types::error::{MetaFormatError, MetaFormatReason};

const SEPARATOR: &str = ": ";

/// Parse a block of meta text into an ordered map.
///
/// Keys and values are trimmed. A repeated key keeps its first position and
/// takes the last value. Either the whole block parses or nothing does.
pub fn parse_meta(text: &str) -> Result<MetaMap, MetaFormatError> {
    let segments: Vec<&str> = if text.contains('\n') {
        text.split('\n').collect()
    } else {
        text.split(',').collect()
    };

    let mut meta = MetaMap::with_capacity(segments.len());
    for segment in segments {
        let (key, value) = split_pair(segment)?;
        meta.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(meta)
}

fn split_pair(segment: &str) -> Result<(&str, &str), MetaFormatError> {
    let mut parts = segment.split(SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(value), None) => Ok((key, value)),
        (_, None, _) => Err(MetaFormatError {
            segment: segment.to_string(),
            reason: MetaFormatReason::MissingSeparator,
        }),
        _ => Err(MetaFormatError {
            segment: segment.to_string(),
            reason: MetaFormatReason::ExtraSeparator,
        }),
    }
}

/// Merge `incoming` into `target`; existing keys are overwritten in place,
/// new keys are appended in `incoming`'s order.
pub fn merge_meta(target: &mut MetaMap, incoming: MetaMap) {
    target.extend(incoming);
}
