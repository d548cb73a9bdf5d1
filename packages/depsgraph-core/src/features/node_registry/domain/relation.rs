//! Directed edges between operations

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use super::keys::OperationId;
use depsgraph_alloc::BlockHandle;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RelationFlags(u32);

impl RelationFlags {
    pub const NONE: RelationFlags = RelationFlags(0);
    /// Closes a dependency cycle; ignored for ordering
    pub const CYCLIC: RelationFlags = RelationFlags(1 << 0);
    /// Updates never travel over this relation
    pub const NO_FLUSH: RelationFlags = RelationFlags(1 << 1);
    /// Reuse an existing relation with the same endpoints and name
    pub const CHECK_BEFORE_ADD: RelationFlags = RelationFlags(1 << 2);
    /// Only user edits travel over this relation
    pub const FLUSH_USER_EDIT_ONLY: RelationFlags = RelationFlags(1 << 3);

    #[inline]
    pub fn contains(&self, other: RelationFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: RelationFlags) {
        self.0 |= other.0;
    }
}

impl BitOr for RelationFlags {
    type Output = RelationFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        RelationFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for RelationFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Where a relation starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationSource {
    TimeSource,
    Operation(OperationId),
}

impl RelationSource {
    pub fn operation(&self) -> Option<OperationId> {
        match self {
            Self::TimeSource => None,
            Self::Operation(op) => Some(*op),
        }
    }
}

impl fmt::Display for RelationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimeSource => f.write_str("time"),
            Self::Operation(op) => write!(f, "{}", op),
        }
    }
}

/// `to` must run after `from`
#[derive(Debug)]
pub struct Relation {
    pub from: RelationSource,
    pub to: OperationId,
    pub name: String,
    pub flags: RelationFlags,
    pub(crate) block: BlockHandle,
}

impl Relation {
    pub fn is_cyclic(&self) -> bool {
        self.flags.contains(RelationFlags::CYCLIC)
    }
}
