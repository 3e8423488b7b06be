use std::collections::BTreeSet;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::model::group::GroupSets;

/// Whole-session client state: the group-set collection plus the duplicate
/// ignore set that lives alongside it.
///
/// The engine holds no global state; callers pass a [`State`] handle into
/// every operation, and sequence save/re-fetch against the external store
/// themselves.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct State {
    #[serde(default)]
    pub groups: GroupSets,
    #[serde(default)]
    ignored: BTreeSet<String>,
}

impl State {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_reader(rdr: impl Read) -> EngineResult<Self> {
        Ok(serde_yml::from_reader(rdr)?)
    }

    pub fn to_writer(&self, wr: impl Write) -> EngineResult<()> {
        Ok(serde_yml::to_writer(wr, self)?)
    }

    pub fn serialize(&self) -> EngineResult<String> {
        Ok(serde_yml::to_string(self)?)
    }

    #[must_use]
    pub const fn ignored(&self) -> &BTreeSet<String> {
        &self.ignored
    }

    #[must_use]
    pub fn is_ignored(&self, entity_id: &str) -> bool {
        self.ignored.contains(entity_id)
    }

    /// Pure toggle on the ignore set, with no cascading side effects.
    /// Recomputing duplicate partitions is the caller's responsibility.
    ///
    /// Returns whether the set changed.
    pub fn set_ignored(&mut self, entity_id: &str, ignored: bool) -> bool {
        if ignored {
            self.ignored.insert(entity_id.to_string())
        } else {
            self.ignored.remove(entity_id)
        }
    }

    /// "Keep best" collapse for a duplicate group: every member not listed
    /// in `keep` joins the ignore set. Returns the number of newly ignored
    /// entities.
    pub fn retain_preferred(&mut self, members: &[String], keep: &[String]) -> usize {
        let count = members
            .iter()
            .filter(|id| !keep.contains(id))
            .filter(|id| self.ignored.insert((*id).clone()))
            .count();
        if count > 0 {
            log::debug!("Ignoring {count} duplicate members, keeping {}", keep.len());
        }
        count
    }

    /// Bump the collection version ahead of a save.
    pub const fn stamp(&mut self) -> u32 {
        self.groups.version += 1;
        self.groups.version
    }

    /// Replace the in-memory snapshot with canonical state fetched from the
    /// store after a save.
    ///
    /// Rejects snapshots older than the one currently held, so a concurrent
    /// writer cannot silently roll this session back.
    pub fn adopt(&mut self, fetched: GroupSets) -> EngineResult<()> {
        if fetched.version < self.groups.version {
            return Err(EngineError::StaleSnapshot {
                current: self.groups.version,
                fetched: fetched.version,
            });
        }
        self.groups = fetched;
        Ok(())
    }
}
