// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2026.

//! Voltage-corner arbiter.
//!
//! Each regulator class (CX, MX, GFX) keeps a table of corner votes, one per
//! voting clock node. The committed corner is the maximum live vote, rounded
//! up to a level the regulator supports. The vote table has its own lock,
//! taken only while a controller already holds its instance lock, never the
//! other way around.
//!
//! Regulators are passed explicitly to every controller that shares them, so
//! a camera and a display controller voting on the same CX rail hold clones
//! of one [`RegulatorHandle`].

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{ClockError, Result};
use crate::graph::NodeId;

/// Ordinal voltage corner. Higher corners permit higher clock rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Corner {
    /// No requirement; the rail may be released.
    None,
    Min,
    Lower,
    Low,
    LowL1,
    Nominal,
    NominalL1,
    High,
    HighL1,
}

/// Corner required to run at `rate` given a node's ceiling table.
///
/// The table lists `(corner, rate_max)` pairs in ascending corner order. The
/// result is the lowest corner whose ceiling covers `rate`, `None` for a
/// stopped clock, or `Option::None` when the rate exceeds every ceiling.
pub fn corner_for_rate(ceilings: &[(Corner, u64)], rate: u64) -> Option<Corner> {
    if rate == 0 {
        return Some(Corner::None);
    }
    ceilings
        .iter()
        .find(|(_, rate_max)| rate <= *rate_max)
        .map(|(corner, _)| *corner)
}

/// Backend that actually moves a regulator to a corner.
pub trait VoltageRail: Send + Sync {
    fn set_corner(&self, corner: Corner) -> core::result::Result<(), ()>;
}

/// Identity of one vote: a node of one controller instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Voter {
    pub controller: usize,
    pub node: NodeId,
}

struct VoteTable {
    votes: BTreeMap<Voter, Corner>,
    committed: Corner,
}

struct Regulator {
    name: &'static str,
    /// Supported levels, ascending.
    levels: &'static [Corner],
    rail: Arc<dyn VoltageRail>,
    table: Mutex<VoteTable>,
}

/// Shared handle to one regulator class and its vote table.
#[derive(Clone)]
pub struct RegulatorHandle(Arc<Regulator>);

impl RegulatorHandle {
    pub fn new(name: &'static str, levels: &'static [Corner], rail: Arc<dyn VoltageRail>) -> Self {
        RegulatorHandle(Arc::new(Regulator {
            name,
            levels,
            rail,
            table: Mutex::new(VoteTable {
                votes: BTreeMap::new(),
                committed: Corner::None,
            }),
        }))
    }

    pub fn name(&self) -> &'static str {
        self.0.name
    }

    /// Record `voter`'s requirement. Takes effect at the next [`commit`].
    ///
    /// [`commit`]: RegulatorHandle::commit
    pub fn vote(&self, voter: Voter, corner: Corner) {
        let mut table = self.lock();
        if corner == Corner::None {
            table.votes.remove(&voter);
        } else {
            table.votes.insert(voter, corner);
        }
    }

    pub fn unvote(&self, voter: Voter) {
        self.lock().votes.remove(&voter);
    }

    /// The vote currently recorded for `voter`.
    pub fn vote_of(&self, voter: Voter) -> Corner {
        self.lock()
            .votes
            .get(&voter)
            .copied()
            .unwrap_or(Corner::None)
    }

    /// Maximum of all live votes, before rounding to a supported level.
    pub fn aggregate(&self) -> Corner {
        Self::max_vote(&self.lock())
    }

    /// Corner last applied to the rail.
    pub fn committed(&self) -> Corner {
        self.lock().committed
    }

    /// Apply the aggregated corner to the rail and return it.
    ///
    /// The rail is only called when the level changes.
    ///
    /// # Errors
    ///
    /// + [Err]\([ClockError::RegulatorLimit]\): the aggregated vote is above
    ///   every supported level.
    /// + [Err]\([ClockError::RailFailure]\): the rail refused the level; the
    ///   previously committed corner stays in effect.
    pub fn commit(&self) -> Result<Corner> {
        self.commit_tracked().map(|(corner, _)| corner)
    }

    /// Like [`commit`](RegulatorHandle::commit), also reporting whether the
    /// rail was moved.
    pub(crate) fn commit_tracked(&self) -> Result<(Corner, bool)> {
        let mut table = self.lock();
        let wanted = Self::max_vote(&table);
        let level = self.level_for(wanted)?;
        if level == table.committed {
            return Ok((level, false));
        }
        self.0
            .rail
            .set_corner(level)
            .map_err(|()| ClockError::RailFailure {
                regulator: self.0.name,
                corner: level,
            })?;
        table.committed = level;
        Ok((level, true))
    }

    /// Whether `other` refers to the same regulator.
    pub fn same_as(&self, other: &RegulatorHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn level_for(&self, wanted: Corner) -> Result<Corner> {
        if wanted == Corner::None {
            return Ok(Corner::None);
        }
        self.0
            .levels
            .iter()
            .copied()
            .find(|level| *level >= wanted)
            .ok_or(ClockError::RegulatorLimit {
                regulator: self.0.name,
                corner: wanted,
            })
    }

    fn max_vote(table: &VoteTable) -> Corner {
        table.votes.values().copied().max().unwrap_or(Corner::None)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VoteTable> {
        self.0.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl core::fmt::Debug for RegulatorHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegulatorHandle")
            .field("name", &self.0.name)
            .field("committed", &self.committed())
            .finish()
    }
}
