use std::fmt;
use std::str::FromStr;

use crate::SessionError;

/// Position of a branch in the result vector and in the marker list.
pub type BranchIndex = usize;

/// Branches reported by the status service, in wire order.
pub const DEFAULT_BRANCHES: [&str; 5] = [
    "nixos-unstable",
    "master",
    "nixos-unstable-small",
    "nixos-22.11",
    "nixpkgs-unstable",
];

/// A pull-request number entered by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrNumber(u32);

impl PrNumber {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// Parses base-10 digits, ignoring surrounding whitespace.
    ///
    /// Signs, separators and trailing characters are rejected, as are values
    /// that do not fit the service's `u32` identifiers.
    pub fn parse(raw: &str) -> Result<Self, SessionError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SessionError::InvalidInput);
        }
        trimmed
            .parse::<u32>()
            .map(Self)
            .map_err(|_| SessionError::InvalidInput)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl FromStr for PrNumber {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered names of the tracked release branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchTable {
    names: Vec<String>,
}

impl BranchTable {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, index: BranchIndex) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BranchIndex, &str)> {
        self.names.iter().enumerate().map(|(i, n)| (i, n.as_str()))
    }
}

impl Default for BranchTable {
    fn default() -> Self {
        Self::new(DEFAULT_BRANCHES)
    }
}
