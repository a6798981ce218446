// Draft lineups: four unique core stocks plus one wildcard.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CORE_SLOTS: usize = 4;
pub const WILDCARD_SLOTS: usize = 1;
pub const TOTAL_SLOTS: usize = CORE_SLOTS + WILDCARD_SLOTS;

const MAX_ROOT_LEN: usize = 5;
const MAX_CLASS_LEN: usize = 2;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LineupError {
    #[error("invalid ticker symbol `{symbol}`: {reason}")]
    InvalidSymbol { symbol: String, reason: String },

    #[error("{0} is already in the lineup")]
    Duplicate(Symbol),

    #[error("{0} is not in the lineup")]
    NotInLineup(Symbol),

    #[error("lineup is full ({max} slots)", max = TOTAL_SLOTS)]
    Full,

    #[error("lineup has {filled} of {max} slots filled", max = TOTAL_SLOTS)]
    Incomplete { filled: usize },

    #[error("lineup has {0} symbols, at most {max} fit", max = TOTAL_SLOTS)]
    TooManySymbols(usize),
}

// ---------------------------------------------------------------------------
// Symbol
// ---------------------------------------------------------------------------

/// An upper-case ticker symbol such as `AAPL` or `BRK.B`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Validate and normalize a ticker: 1-5 letters, optionally followed by
    /// `.` and a 1-2 letter share class.
    pub fn parse(raw: &str) -> Result<Self, LineupError> {
        let upper = raw.trim().to_ascii_uppercase();
        let invalid = |reason: &str| LineupError::InvalidSymbol {
            symbol: raw.to_string(),
            reason: reason.to_string(),
        };

        let (root, class) = match upper.split_once('.') {
            Some((root, class)) => (root, Some(class)),
            None => (upper.as_str(), None),
        };
        if root.is_empty() || root.len() > MAX_ROOT_LEN {
            return Err(invalid("expected 1-5 letters"));
        }
        if !root.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(invalid("only letters are allowed"));
        }
        if let Some(class) = class {
            if class.is_empty()
                || class.len() > MAX_CLASS_LEN
                || !class.chars().all(|c| c.is_ascii_uppercase())
            {
                return Err(invalid("share class must be 1-2 letters"));
            }
        }
        Ok(Symbol(upper))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = LineupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbol::parse(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = LineupError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Symbol::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

// ---------------------------------------------------------------------------
// DraftLineup
// ---------------------------------------------------------------------------

/// A lineup being drafted. Slots `0..CORE_SLOTS` are core; the last is the
/// wildcard. Every filled slot holds a distinct symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftLineup {
    slots: [Option<Symbol>; TOTAL_SLOTS],
}

impl DraftLineup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a lineup from stored symbols, filling slots in order.
    pub fn from_symbols<I, S>(symbols: I) -> Result<Self, LineupError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let symbols: Vec<S> = symbols.into_iter().collect();
        if symbols.len() > TOTAL_SLOTS {
            return Err(LineupError::TooManySymbols(symbols.len()));
        }
        let mut lineup = DraftLineup::new();
        for raw in &symbols {
            lineup.add(Symbol::parse(raw.as_ref())?)?;
        }
        Ok(lineup)
    }

    /// Put `symbol` in the first empty slot. Returns the slot index.
    pub fn add(&mut self, symbol: Symbol) -> Result<usize, LineupError> {
        if self.contains(&symbol) {
            return Err(LineupError::Duplicate(symbol));
        }
        let idx = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(LineupError::Full)?;
        self.slots[idx] = Some(symbol);
        Ok(idx)
    }

    /// Clear the slot holding `symbol`. Other slots keep their positions.
    pub fn remove(&mut self, symbol: &Symbol) -> Result<usize, LineupError> {
        let idx = self
            .slots
            .iter()
            .position(|s| s.as_ref() == Some(symbol))
            .ok_or_else(|| LineupError::NotInLineup(symbol.clone()))?;
        self.slots[idx] = None;
        Ok(idx)
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.slots.iter().any(|s| s.as_ref() == Some(symbol))
    }

    pub fn slots(&self) -> &[Option<Symbol>; TOTAL_SLOTS] {
        &self.slots
    }

    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.filled() == TOTAL_SLOTS
    }

    /// Filled symbols in slot order, as stored by the record store.
    pub fn symbols(&self) -> Vec<String> {
        self.slots
            .iter()
            .flatten()
            .map(|s| s.as_str().to_string())
            .collect()
    }

    /// The uniqueness key once every core slot is filled.
    pub fn core_key(&self) -> Option<CoreKey> {
        let core: Option<Vec<&Symbol>> = self.slots[..CORE_SLOTS].iter().map(Option::as_ref).collect();
        core.map(CoreKey::from_symbols)
    }
}

// ---------------------------------------------------------------------------
// CoreKey / LockedLineup
// ---------------------------------------------------------------------------

/// Sorted, dash-joined core symbols, e.g. `AAPL-MSFT-NVDA-TSLA`. Two lineups
/// with the same core in any order share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoreKey(String);

impl CoreKey {
    fn from_symbols(symbols: Vec<&Symbol>) -> Self {
        let mut names: Vec<&str> = symbols.iter().map(|s| s.as_str()).collect();
        names.sort_unstable();
        CoreKey(names.join("-"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A complete lineup submitted for the week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedLineup {
    pub core: [Symbol; CORE_SLOTS],
    pub wildcard: Symbol,
    pub core_key: CoreKey,
}

impl LockedLineup {
    pub fn symbols(&self) -> Vec<String> {
        self.core
            .iter()
            .chain(std::iter::once(&self.wildcard))
            .map(|s| s.as_str().to_string())
            .collect()
    }
}

impl TryFrom<&DraftLineup> for LockedLineup {
    type Error = LineupError;

    fn try_from(lineup: &DraftLineup) -> Result<Self, Self::Error> {
        let [Some(a), Some(b), Some(c), Some(d), Some(wildcard)] = lineup.slots.clone() else {
            return Err(LineupError::Incomplete {
                filled: lineup.filled(),
            });
        };
        let core = [a, b, c, d];
        let core_key = CoreKey::from_symbols(core.iter().collect());
        Ok(LockedLineup {
            core,
            wildcard,
            core_key,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
