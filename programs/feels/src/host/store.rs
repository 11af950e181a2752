//! Record storage
//!
//! Methods take `&self`: the host serializes access per record, and a
//! token-transfer callback may hold a handle to the same store while an
//! instruction is in flight.

use crate::state::RecordKey;
use std::cell::RefCell;
use std::collections::BTreeMap;

pub trait AccountStore {
    fn read(&self, key: &RecordKey) -> Option<Vec<u8>>;
    fn write(&self, key: RecordKey, data: Vec<u8>);
    fn remove(&self, key: &RecordKey);

    fn contains(&self, key: &RecordKey) -> bool {
        self.read(key).is_some()
    }
}

/// Single-threaded in-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RefCell<BTreeMap<RecordKey, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every stored record, for byte-level comparisons
    pub fn snapshot(&self) -> BTreeMap<RecordKey, Vec<u8>> {
        self.records.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl AccountStore for MemoryStore {
    fn read(&self, key: &RecordKey) -> Option<Vec<u8>> {
        self.records.borrow().get(key).cloned()
    }

    fn write(&self, key: RecordKey, data: Vec<u8>) {
        self.records.borrow_mut().insert(key, data);
    }

    fn remove(&self, key: &RecordKey) {
        self.records.borrow_mut().remove(key);
    }

    fn contains(&self, key: &RecordKey) -> bool {
        self.records.borrow().contains_key(key)
    }
}

impl<S: AccountStore + ?Sized> AccountStore for &S {
    fn read(&self, key: &RecordKey) -> Option<Vec<u8>> {
        (**self).read(key)
    }

    fn write(&self, key: RecordKey, data: Vec<u8>) {
        (**self).write(key, data)
    }

    fn remove(&self, key: &RecordKey) {
        (**self).remove(key)
    }

    fn contains(&self, key: &RecordKey) -> bool {
        (**self).contains(key)
    }
}
