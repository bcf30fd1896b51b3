//! Result persistence
//!
//! Records are keyed by address. The JSON store rewrites its file after each
//! change so an interrupted survey resumes from the last finished address.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::AnalysisRecord;

/// Address-keyed storage for analysis records
pub trait ResultStore {
    /// Get the record for an address
    fn get(&self, address: &str) -> Option<&AnalysisRecord>;

    /// Insert an empty record for `address` unless one exists
    fn ensure(&mut self, address: &str) -> Result<()>;

    /// Insert or replace a record
    fn upsert(&mut self, record: AnalysisRecord) -> Result<()>;

    /// All records in insertion order
    fn records(&self) -> Vec<&AnalysisRecord>;

    /// Whether a likelihood has been stored for `address`
    fn is_complete(&self, address: &str) -> bool {
        self.get(address).is_some_and(AnalysisRecord::is_complete)
    }
}

/// Insertion-ordered map of records
#[derive(Debug, Clone, Default)]
struct RecordTable {
    records: Vec<AnalysisRecord>,
    index: BTreeMap<String, usize>,
}

impl RecordTable {
    fn from_records(records: Vec<AnalysisRecord>) -> Self {
        let mut table = Self::default();
        for record in records {
            table.upsert(record);
        }
        table
    }

    fn get(&self, address: &str) -> Option<&AnalysisRecord> {
        self.index.get(address).map(|&i| &self.records[i])
    }

    /// Returns true if a new record was added
    fn ensure(&mut self, address: &str) -> bool {
        if self.index.contains_key(address) {
            return false;
        }
        self.upsert(AnalysisRecord::pending(address));
        true
    }

    fn upsert(&mut self, record: AnalysisRecord) {
        match self.index.get(&record.address) {
            Some(&i) => self.records[i] = record,
            None => {
                self.index.insert(record.address.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: RecordTable,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultStore for MemoryStore {
    fn get(&self, address: &str) -> Option<&AnalysisRecord> {
        self.table.get(address)
    }

    fn ensure(&mut self, address: &str) -> Result<()> {
        self.table.ensure(address);
        Ok(())
    }

    fn upsert(&mut self, record: AnalysisRecord) -> Result<()> {
        self.table.upsert(record);
        Ok(())
    }

    fn records(&self) -> Vec<&AnalysisRecord> {
        self.table.records.iter().collect()
    }
}

/// Store persisted as a pretty-printed JSON array
#[derive(Debug)]
pub struct JsonResultStore {
    path: PathBuf,
    table: RecordTable,
}

impl JsonResultStore {
    /// Open the store at `path`, loading existing records if the file exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let table = if path.exists() {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read results file: {}", path.display()))?;
            let records: Vec<AnalysisRecord> = serde_json::from_str(&json)
                .with_context(|| format!("Failed to parse results file: {}", path.display()))?;
            log::info!("Loaded {} records from {}", records.len(), path.display());
            RecordTable::from_records(records)
        } else {
            RecordTable::default()
        };
        Ok(Self { path, table })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write all records to disk
    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.table.records)?;
        // Write a sibling file, then rename it over the target
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write results file: {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace results file: {}", self.path.display()))?;
        Ok(())
    }
}

impl ResultStore for JsonResultStore {
    fn get(&self, address: &str) -> Option<&AnalysisRecord> {
        self.table.get(address)
    }

    fn ensure(&mut self, address: &str) -> Result<()> {
        if self.table.ensure(address) {
            self.save()?;
        }
        Ok(())
    }

    fn upsert(&mut self, record: AnalysisRecord) -> Result<()> {
        self.table.upsert(record);
        self.save()
    }

    fn records(&self) -> Vec<&AnalysisRecord> {
        self.table.records.iter().collect()
    }
}
