use crate::domain::ports::RecordStore;
use crate::domain::record::{Method, TransactionRecord};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Column Family for storing transaction records.
pub const CF_TRANSACTIONS: &str = "transactions";

const SEPARATOR: u8 = 0;

/// A persistent record store implementation using RocksDB.
///
/// Keys are `token \0 method \0 created-at-micros sequence`, so all records
/// for a token sit next to each other and sort oldest first within a
/// `(token, method)` prefix. Values are JSON.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBRecordStore {
    db: Arc<DB>,
    sequence: Arc<AtomicU32>,
}

impl RocksDBRecordStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the "transactions" column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_transactions = ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_transactions])?;

        Ok(Self {
            db: Arc::new(db),
            sequence: Arc::new(AtomicU32::new(0)),
        })
    }

    fn transactions(&self) -> Result<&ColumnFamily> {
        self.db.cf_handle(CF_TRANSACTIONS).ok_or_else(|| {
            PaymentError::Storage(Box::new(std::io::Error::other(
                "Transactions column family not found",
            )))
        })
    }

    /// All records stored under `prefix`, oldest first.
    fn scan(&self, prefix: &[u8]) -> Result<Vec<TransactionRecord>> {
        let cf = self.transactions()?;
        let mut records = Vec::new();
        for item in self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward))
        {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            let record: TransactionRecord = serde_json::from_slice(&value).map_err(|e| {
                PaymentError::Storage(Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("Deserialization error: {}", e),
                )))
            })?;
            records.push(record);
        }
        Ok(records)
    }
}

fn token_prefix(token: &str) -> Vec<u8> {
    let mut prefix = token.as_bytes().to_vec();
    prefix.push(SEPARATOR);
    prefix
}

fn key_prefix(token: &str, method: Method) -> Vec<u8> {
    let mut prefix = token_prefix(token);
    prefix.extend_from_slice(method.api_name().as_bytes());
    prefix.push(SEPARATOR);
    prefix
}

#[async_trait]
impl RecordStore for RocksDBRecordStore {
    async fn save(&self, record: TransactionRecord) -> Result<()> {
        let cf = self.transactions()?;

        let mut key = key_prefix(record.token(), record.method());
        key.extend_from_slice(&(record.created_at().timestamp_micros() as u64).to_be_bytes());
        key.extend_from_slice(&self.sequence.fetch_add(1, Ordering::Relaxed).to_be_bytes());
        let value = serde_json::to_vec(&record).map_err(|e| {
            PaymentError::Storage(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Serialization error: {}", e),
            )))
        })?;

        self.db.put_cf(cf, key, value)?;

        Ok(())
    }

    async fn find(&self, token: &str, method: Method) -> Result<Option<TransactionRecord>> {
        Ok(self.scan(&key_prefix(token, method))?.pop())
    }

    async fn history(&self, token: &str) -> Result<Vec<TransactionRecord>> {
        let mut history = self.scan(&token_prefix(token))?;
        history.sort_by_key(TransactionRecord::created_at);
        Ok(history)
    }
}
