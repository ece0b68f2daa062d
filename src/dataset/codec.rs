use crate::models::chat::ConversationRecord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("dataset is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("malformed record on line {line}: {source}")]
    MalformedRecord {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize record {index}: {source}")]
    Serialize {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Parses newline-delimited JSON, one record per non-blank line.
pub fn decode(bytes: &[u8]) -> Result<Vec<ConversationRecord>, CodecError> {
    let text = std::str::from_utf8(bytes)?;

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json
                ::from_str::<ConversationRecord>(line)
                .map_err(|source| CodecError::MalformedRecord { line: i + 1, source })
        })
        .collect()
}

pub fn encode(records: &[ConversationRecord]) -> Result<Vec<u8>, CodecError> {
    let lines = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            serde_json::to_string(record).map_err(|source| CodecError::Serialize { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(lines.join("\n").into_bytes())
}
