/// Unit of Work Pattern for State Management
///
/// Stages every record an instruction touches and writes the dirty ones back
/// in a single pass at commit. Dropping a unit without committing discards all
/// staged writes and restores any reentrancy lock it persisted, leaving the
/// store exactly as it was.
use crate::error::{FeelsError, FeelsResult};
use crate::events::FeelsEvent;
use crate::host::AccountStore;
use crate::state::{
    Buffer, Market, OracleState, Position, Record, RecordKey, ReentrancyGuard, TickArray,
};
use std::collections::BTreeMap;
use tracing::{trace, warn};

// ============================================================================
// Core Unit of Work Types
// ============================================================================

/// How an instruction declares a record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    Writable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopePhase {
    Empty,
    Loading,
    Executing,
    Committed,
    Discarded,
}

/// Represents a tracked state change
#[derive(Clone, Debug)]
pub enum StateChange {
    Market(Box<Market>),
    TickArray(Box<TickArray>),
    Position(Box<Position>),
    Oracle(Box<OracleState>),
    Buffer(Box<Buffer>),
}

/// Record types that can live in a work unit
pub trait Staged: Record + Sized {
    fn wrap(self) -> StateChange;
    fn peek(change: &StateChange) -> Option<&Self>;
    fn peek_mut(change: &mut StateChange) -> Option<&mut Self>;

    /// Called once when the record is loaded. Returning true asks the unit
    /// to persist the (locked) record immediately and restore it on discard.
    fn acquire(&mut self, _access: Access) -> FeelsResult<bool> {
        Ok(false)
    }

    /// Called on the staged copy right before it is serialized for commit
    fn release(&mut self) {}
}

macro_rules! impl_staged {
    ($variant:ident) => {
        fn wrap(self) -> StateChange {
            StateChange::$variant(Box::new(self))
        }

        fn peek(change: &StateChange) -> Option<&Self> {
            match change {
                StateChange::$variant(inner) => Some(&**inner),
                _ => None,
            }
        }

        fn peek_mut(change: &mut StateChange) -> Option<&mut Self> {
            match change {
                StateChange::$variant(inner) => Some(&mut **inner),
                _ => None,
            }
        }
    };
}

impl Staged for Market {
    impl_staged!(Market);

    fn acquire(&mut self, access: Access) -> FeelsResult<bool> {
        match access {
            Access::ReadOnly => {
                ReentrancyGuard::ensure_unlocked(self.reentrancy)?;
                Ok(false)
            }
            Access::Writable => {
                ReentrancyGuard::acquire(&mut self.reentrancy)?;
                Ok(true)
            }
        }
    }

    fn release(&mut self) {
        ReentrancyGuard::release(&mut self.reentrancy);
    }
}

impl Staged for TickArray {
    impl_staged!(TickArray);
}

impl Staged for Position {
    impl_staged!(Position);
}

impl Staged for OracleState {
    impl_staged!(Oracle);
}

impl Staged for Buffer {
    impl_staged!(Buffer);
}

impl StateChange {
    fn release(&mut self) {
        match self {
            StateChange::Market(market) => market.release(),
            StateChange::TickArray(_)
            | StateChange::Position(_)
            | StateChange::Oracle(_)
            | StateChange::Buffer(_) => {}
        }
    }

    fn try_serialize(&self) -> FeelsResult<Vec<u8>> {
        match self {
            StateChange::Market(v) => v.try_serialize(),
            StateChange::TickArray(v) => v.try_serialize(),
            StateChange::Position(v) => v.try_serialize(),
            StateChange::Oracle(v) => v.try_serialize(),
            StateChange::Buffer(v) => v.try_serialize(),
        }
    }
}

struct StagedEntry {
    value: StateChange,
    access: Access,
    dirty: bool,
    created: bool,
    closed: bool,
}

// ============================================================================
// Unit of Work Implementation
// ============================================================================

pub struct WorkUnit<'a, S: AccountStore> {
    store: &'a S,
    phase: ScopePhase,
    entries: BTreeMap<RecordKey, StagedEntry>,
    /// Pre-instruction bytes of records whose lock was persisted at load
    guarded: Vec<(RecordKey, Vec<u8>)>,
    events: Vec<FeelsEvent>,
}

impl<'a, S: AccountStore> WorkUnit<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            phase: ScopePhase::Empty,
            entries: BTreeMap::new(),
            guarded: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn phase(&self) -> ScopePhase {
        self.phase
    }

    fn enter_loading(&mut self) -> FeelsResult<()> {
        match self.phase {
            ScopePhase::Empty | ScopePhase::Loading => {
                self.phase = ScopePhase::Loading;
                Ok(())
            }
            _ => Err(FeelsError::InvalidScopePhase),
        }
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Declare and stage a record that must exist
    pub fn load<T: Staged>(&mut self, key: RecordKey, access: Access) -> FeelsResult<()> {
        if self.load_optional::<T>(key, access)? {
            Ok(())
        } else {
            Err(FeelsError::AccountNotFound)
        }
    }

    /// Declare and stage a record that may be absent; returns whether it exists
    pub fn load_optional<T: Staged>(&mut self, key: RecordKey, access: Access) -> FeelsResult<bool> {
        self.enter_loading()?;

        if let Some(entry) = self.entries.get(&key) {
            if T::peek(&entry.value).is_none() {
                return Err(FeelsError::AccountDiscriminatorMismatch);
            }
            // A read-only declaration cannot be upgraded after the fact
            if access == Access::Writable && entry.access == Access::ReadOnly {
                return Err(FeelsError::AccountNotWritable);
            }
            return Ok(true);
        }

        let Some(original) = self.store.read(&key) else {
            return Ok(false);
        };
        let mut value = T::try_deserialize(&original)?;

        if value.acquire(access)? {
            // The lock must be visible to anything that re-enters before commit
            self.store.write(key, value.try_serialize()?);
            self.guarded.push((key, original));
        }

        trace!(%key, ?access, "staged record");
        self.entries.insert(
            key,
            StagedEntry {
                value: value.wrap(),
                access,
                dirty: false,
                created: false,
                closed: false,
            },
        );
        Ok(true)
    }

    /// Stage a brand new record; fails if one already exists under `key`
    pub fn create<T: Staged>(&mut self, key: RecordKey, value: T) -> FeelsResult<()> {
        self.enter_loading()?;
        if self.entries.contains_key(&key) || self.store.contains(&key) {
            return Err(FeelsError::AccountAlreadyInitialized);
        }
        self.entries.insert(
            key,
            StagedEntry {
                value: value.wrap(),
                access: Access::Writable,
                dirty: true,
                created: true,
                closed: false,
            },
        );
        Ok(())
    }

    /// End the Loading phase. The read/write set is now fixed.
    pub fn begin_execution(&mut self) -> FeelsResult<()> {
        match self.phase {
            ScopePhase::Empty | ScopePhase::Loading => {
                self.phase = ScopePhase::Executing;
                Ok(())
            }
            _ => Err(FeelsError::InvalidScopePhase),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    fn entry(&self, key: &RecordKey) -> FeelsResult<&StagedEntry> {
        match self.phase {
            ScopePhase::Loading | ScopePhase::Executing => {}
            _ => return Err(FeelsError::InvalidScopePhase),
        }
        match self.entries.get(key) {
            Some(entry) if !entry.closed => Ok(entry),
            _ => Err(FeelsError::AccountNotLoaded),
        }
    }

    pub fn contains(&self, key: &RecordKey) -> bool {
        self.entry(key).is_ok()
    }

    pub fn get<T: Staged>(&self, key: &RecordKey) -> FeelsResult<&T> {
        T::peek(&self.entry(key)?.value).ok_or(FeelsError::AccountDiscriminatorMismatch)
    }

    pub fn get_mut<T: Staged>(&mut self, key: &RecordKey) -> FeelsResult<&mut T> {
        if self.phase != ScopePhase::Executing {
            return Err(FeelsError::InvalidScopePhase);
        }
        let entry = match self.entries.get_mut(key) {
            Some(entry) if !entry.closed => entry,
            _ => return Err(FeelsError::AccountNotLoaded),
        };
        if entry.access != Access::Writable {
            return Err(FeelsError::AccountNotWritable);
        }
        let value = T::peek_mut(&mut entry.value).ok_or(FeelsError::AccountDiscriminatorMismatch)?;
        entry.dirty = true;
        Ok(value)
    }

    /// Mark a writable record for deletion at commit
    pub fn close(&mut self, key: &RecordKey) -> FeelsResult<()> {
        if self.phase != ScopePhase::Executing {
            return Err(FeelsError::InvalidScopePhase);
        }
        let entry = self.entries.get_mut(key).ok_or(FeelsError::AccountNotLoaded)?;
        if entry.access != Access::Writable {
            return Err(FeelsError::AccountNotWritable);
        }
        entry.closed = true;
        entry.dirty = true;
        Ok(())
    }

    /// Buffer an event; released only by a successful commit
    pub fn emit(&mut self, event: FeelsEvent) {
        self.events.push(event);
    }

    pub fn has_changes(&self) -> bool {
        self.entries.values().any(|e| e.dirty)
    }

    // ========================================================================
    // Commit / Discard
    // ========================================================================

    /// Write all dirty records back in one pass and release the locks.
    /// Everything is serialized before the first write, so commit either
    /// lands completely or not at all.
    pub fn commit(mut self) -> FeelsResult<Vec<FeelsEvent>> {
        if self.phase != ScopePhase::Executing {
            return Err(FeelsError::InvalidScopePhase);
        }

        let mut writes: Vec<(RecordKey, Option<Vec<u8>>)> = Vec::new();
        for (key, entry) in self.entries.iter_mut() {
            if entry.closed {
                if !entry.created {
                    writes.push((*key, None));
                }
                continue;
            }
            if entry.dirty {
                entry.value.release();
                writes.push((*key, Some(entry.value.try_serialize()?)));
            }
        }
        // Locked records that were never modified go back to their original bytes
        for (key, original) in &self.guarded {
            if !writes.iter().any(|(k, _)| k == key) {
                writes.push((*key, Some(original.clone())));
            }
        }

        for (key, data) in writes {
            match data {
                Some(bytes) => self.store.write(key, bytes),
                None => self.store.remove(&key),
            }
        }

        self.guarded.clear();
        self.phase = ScopePhase::Committed;
        Ok(std::mem::take(&mut self.events))
    }

    /// Explicitly abandon the unit
    pub fn discard(self) {
        drop(self)
    }
}

impl<'a, S: AccountStore> Drop for WorkUnit<'a, S> {
    fn drop(&mut self) {
        if self.phase == ScopePhase::Committed {
            return;
        }
        if self.has_changes() {
            warn!(
                staged = self.entries.len(),
                "WorkUnit dropped without commit, discarding staged changes"
            );
        }
        for (key, original) in self.guarded.drain(..) {
            self.store.write(key, original);
        }
        self.events.clear();
        self.phase = ScopePhase::Discarded;
    }
}
