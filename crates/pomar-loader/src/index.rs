//! The fragment index.
//!
//! `fragments/index.txt` is a list of `key: value` lines. `fragments` (the
//! chunk count) is required; `filesize` is informational and dropped when it
//! is not a number; any other key is kept verbatim.

use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentIndex {
    pub fragments: usize,
    pub filesize: Option<u64>,
    pub extra: BTreeMap<String, String>,
}

impl FromStr for FragmentIndex {
    type Err = IndexError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut fragments = None;
        let mut filesize = None;
        let mut extra = BTreeMap::new();

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let Some((key, value)) = line.split_once(':') else {
                tracing::warn!("Skipping index line without ':': {}", line);
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            match key {
                "fragments" => fragments = Some(parse_number(key, value)?),
                "filesize" => match parse_number(key, value) {
                    Ok(size) => filesize = Some(size),
                    Err(e) => tracing::warn!("{}; ignoring it", e),
                },
                _ => {
                    extra.insert(key.to_string(), value.to_string());
                }
            }
        }

        Ok(Self {
            fragments: fragments.ok_or(IndexError::MissingCount)?,
            filesize,
            extra,
        })
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, IndexError> {
    value.parse().map_err(|_| IndexError::InvalidNumber {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error("index has no fragment count")]
    MissingCount,
    #[error("index value for {key} is not a number: {value}")]
    InvalidNumber { key: String, value: String },
}
