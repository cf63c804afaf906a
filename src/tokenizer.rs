use std::collections::BTreeMap;
use std::fmt;

/// A flag such as `n/` that introduces an argument value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Prefix(&'static str);

pub const PREFIX_COMPANY: Prefix = Prefix("n/");
pub const PREFIX_ROLE: Prefix = Prefix("r/");
pub const PREFIX_STATUS: Prefix = Prefix("s/");
pub const PREFIX_DEADLINE: Prefix = Prefix("d/");
pub const PREFIX_TAG: Prefix = Prefix("t/");

impl Prefix {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "Multiple values specified for the following single-valued field(s): {}",
    join_prefixes(.0)
)]
pub struct DuplicatePrefixError(pub Vec<Prefix>);

fn join_prefixes(prefixes: &[Prefix]) -> String {
    prefixes
        .iter()
        .map(Prefix::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tokenized arguments: the text before the first flag, and every value given
/// for each flag in the order they appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentMultimap {
    preamble: String,
    values: BTreeMap<Prefix, Vec<String>>,
}

impl ArgumentMultimap {
    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    /// Last value given for `prefix`.
    pub fn value(&self, prefix: Prefix) -> Option<&str> {
        self.values
            .get(&prefix)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    pub fn all_values(&self, prefix: Prefix) -> &[String] {
        self.values.get(&prefix).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_present(&self, prefix: Prefix) -> bool {
        self.values.contains_key(&prefix)
    }

    pub fn verify_no_duplicates(&self, prefixes: &[Prefix]) -> Result<(), DuplicatePrefixError> {
        let repeated: Vec<Prefix> = prefixes
            .iter()
            .copied()
            .filter(|prefix| self.all_values(*prefix).len() > 1)
            .collect();
        if repeated.is_empty() {
            Ok(())
        } else {
            Err(DuplicatePrefixError(repeated))
        }
    }
}

/// Splits `args` on the given flags. A flag only counts when it starts the
/// text or follows whitespace, so `n/AT&T r/x/y` keeps `x/y` intact.
pub fn tokenize(args: &str, prefixes: &[Prefix]) -> ArgumentMultimap {
    let padded = format!(" {}", args);
    let mut positions: Vec<(usize, Prefix)> = prefixes
        .iter()
        .flat_map(|prefix| {
            let padded = padded.as_str();
            padded
                .match_indices(prefix.as_str())
                .filter(move |(idx, _)| follows_whitespace(padded, *idx))
                .map(move |(idx, _)| (idx, *prefix))
        })
        .collect();
    positions.sort_by_key(|(idx, _)| *idx);

    let preamble_end = positions.first().map_or(padded.len(), |(idx, _)| *idx);
    let mut multimap = ArgumentMultimap {
        preamble: padded[..preamble_end].trim().to_string(),
        values: BTreeMap::new(),
    };

    for (i, (start, prefix)) in positions.iter().enumerate() {
        let value_start = start + prefix.as_str().len();
        let value_end = positions.get(i + 1).map_or(padded.len(), |(next, _)| *next);
        multimap
            .values
            .entry(*prefix)
            .or_default()
            .push(padded[value_start..value_end].trim().to_string());
    }
    multimap
}

fn follows_whitespace(text: &str, idx: usize) -> bool {
    text[..idx]
        .chars()
        .next_back()
        .is_some_and(char::is_whitespace)
}
