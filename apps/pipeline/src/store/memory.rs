//! In-process record store with Airtable-like semantics: store-assigned ids,
//! cursor pagination, PATCH-style merging updates. Tables can be switched into
//! a failing mode to exercise the best-effort paths of the stages.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::models::{Fields, Page, Record};
use crate::store::RecordStore;

const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Default)]
struct State {
    tables: BTreeMap<String, Vec<Record>>,
    next_id: u64,
    failing: HashSet<String>,
    failing_writes: HashSet<String>,
    page_requests: HashMap<String, usize>,
}

pub struct InMemoryStore {
    state: Mutex<State>,
    page_size: usize,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: page_size.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seeds a record with a caller-chosen id.
    pub fn insert(&self, table: &str, id: &str, fields: Fields) {
        self.lock()
            .tables
            .entry(table.to_string())
            .or_default()
            .push(Record::new(id, fields));
    }

    /// Current contents of `table`, in insertion order.
    pub fn records(&self, table: &str) -> Vec<Record> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    pub fn get(&self, table: &str, id: &str) -> Option<Record> {
        self.lock()
            .tables
            .get(table)
            .and_then(|rows| rows.iter().find(|r| r.id == id).cloned())
    }

    /// Makes every subsequent call against `table` fail with a 503.
    pub fn fail_table(&self, table: &str) {
        self.lock().failing.insert(table.to_string());
    }

    /// Makes create, update and delete against `table` fail while reads
    /// keep working.
    pub fn fail_writes_to(&self, table: &str) {
        self.lock().failing_writes.insert(table.to_string());
    }

    pub fn page_requests(&self, table: &str) -> usize {
        self.lock().page_requests.get(table).copied().unwrap_or(0)
    }

    fn check_available(state: &State, table: &str) -> Result<(), StoreError> {
        if state.failing.contains(table) {
            return Err(StoreError::Api {
                status: 503,
                message: format!("table '{table}' unavailable"),
            });
        }
        Ok(())
    }

    fn check_writable(state: &State, table: &str) -> Result<(), StoreError> {
        Self::check_available(state, table)?;
        if state.failing_writes.contains(table) {
            return Err(StoreError::Api {
                status: 422,
                message: format!("INVALID_MULTIPLE_CHOICE_OPTIONS in '{table}'"),
            });
        }
        Ok(())
    }

    fn not_found(table: &str, id: &str) -> StoreError {
        StoreError::NotFound {
            table: table.to_string(),
            id: id.to_string(),
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn fetch_page(&self, table: &str, offset: Option<&str>) -> Result<Page, StoreError> {
        let mut state = self.lock();
        *state.page_requests.entry(table.to_string()).or_default() += 1;
        Self::check_available(&state, table)?;

        let start = match offset {
            Some(raw) => raw.parse::<usize>().map_err(|_| StoreError::Api {
                status: 422,
                message: format!("LIST_RECORDS_ITERATOR_NOT_AVAILABLE: {raw}"),
            })?,
            None => 0,
        };

        let rows = state.tables.get(table).map(Vec::as_slice).unwrap_or(&[]);
        let end = (start + self.page_size).min(rows.len());
        let records = rows.get(start..end).map(<[Record]>::to_vec).unwrap_or_default();
        let offset = (end < rows.len()).then(|| end.to_string());

        Ok(Page { records, offset })
    }

    async fn create(&self, table: &str, fields: Fields) -> Result<Record, StoreError> {
        let mut state = self.lock();
        Self::check_writable(&state, table)?;

        state.next_id += 1;
        let record = Record::new(format!("rec{:014}", state.next_id), fields);
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(&self, table: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let mut state = self.lock();
        Self::check_writable(&state, table)?;

        let record = state
            .tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| Self::not_found(table, id))?;
        record.fields.extend(fields);
        Ok(())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        let mut state = self.lock();
        Self::check_writable(&state, table)?;

        let rows = state
            .tables
            .get_mut(table)
            .ok_or_else(|| Self::not_found(table, id))?;
        let before = rows.len();
        rows.retain(|r| r.id != id);
        if rows.len() == before {
            return Err(Self::not_found(table, id));
        }
        Ok(())
    }
}
