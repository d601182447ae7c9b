use core::{fmt, str::FromStr};

use crate::{error::InitError, id::SnowflakeId};

/// The 10-bit identity of one running instance, embedded in every
/// [`SnowflakeId`] it issues.
///
/// A `NodeId` can only be built by masking to 10 bits, so every value is in
/// `[0, 1023]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u16);

impl NodeId {
    /// Number of distinct node IDs.
    pub const CAPACITY: u64 = SnowflakeId::NODE_ID_MASK + 1;

    /// Builds a node ID, keeping only the low 10 bits.
    pub const fn new(raw: u64) -> Self {
        Self((raw & SnowflakeId::NODE_ID_MASK) as u16)
    }

    /// Returns the raw 10-bit value.
    pub const fn get(&self) -> u16 {
        self.0
    }

    /// Returns the value shifted into bits 12 through 21, ready to be OR'ed
    /// into an ID.
    pub const fn positioned(&self) -> u64 {
        (self.0 as u64) << SnowflakeId::NODE_ID_SHIFT
    }
}

impl FromStr for NodeId {
    type Err = InitError;

    /// Parses a static override. Anything that is not a non-negative integer
    /// is rejected; larger values are masked.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self::new)
            .map_err(|_| InitError::InvalidNodeId {
                value: s.to_string(),
            })
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<NodeId> for u64 {
    fn from(node: NodeId) -> Self {
        u64::from(node.0)
    }
}
