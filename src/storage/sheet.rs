//! Spreadsheet-as-database storage backend
//!
//! One CSV file per entity under a data directory. Records are addressed by
//! logical id: every operation scans for the matching row internally, so
//! callers never see row positions. Rows whose id cell is blank or
//! non-numeric are treated as absent when reading, but are preserved
//! verbatim when the file is rewritten.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use csv::StringRecord;
use tokio::sync::Mutex;

use crate::{
    error::{AppError, AppResult, Entity},
    models::{Book, Member, Transaction},
};

use super::Storage;

const BOOKS_FILE: &str = "books.csv";
const MEMBERS_FILE: &str = "members.csv";
const TRANSACTIONS_FILE: &str = "transactions.csv";

const BOOKS_HEADER: [&str; 3] = ["id", "title", "available_copies"];
const MEMBERS_HEADER: [&str; 2] = ["id", "name"];
const TRANSACTIONS_HEADER: [&str; 6] = [
    "id",
    "member_id",
    "book_id",
    "borrow_date",
    "due_date",
    "return_date",
];

pub struct SheetStorage {
    dir: PathBuf,
    // Serializes read-modify-write cycles against the files
    lock: Mutex<()>,
}

impl SheetStorage {
    /// Open a sheet directory, creating it and any missing files
    pub async fn open(dir: impl AsRef<Path>) -> AppResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to create {}: {}", dir.display(), e)))?;

        let storage = Self {
            dir,
            lock: Mutex::new(()),
        };

        storage.ensure_file(BOOKS_FILE, &BOOKS_HEADER).await?;
        storage.ensure_file(MEMBERS_FILE, &MEMBERS_HEADER).await?;
        storage
            .ensure_file(TRANSACTIONS_FILE, &TRANSACTIONS_HEADER)
            .await?;

        Ok(storage)
    }

    async fn ensure_file(&self, file: &str, header: &[&str]) -> AppResult<()> {
        let path = self.dir.join(file);
        if tokio::fs::try_exists(&path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to stat {}: {}", path.display(), e)))?
        {
            return Ok(());
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(header)
            .map_err(|e| AppError::Storage(format!("Failed to encode header: {}", e)))?;
        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Storage(format!("Failed to encode header: {}", e)))?;

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", path.display(), e)))
    }

    /// Read all data rows of a file (header excluded)
    async fn read_records(&self, file: &str) -> AppResult<Vec<StringRecord>> {
        let path = self.dir.join(file);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read {}: {}", path.display(), e)))?;

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(bytes.as_slice());
        let mut records = Vec::new();
        for result in reader.records() {
            let record = result
                .map_err(|e| AppError::Storage(format!("Malformed row in {}: {}", file, e)))?;
            records.push(record);
        }
        Ok(records)
    }

    /// Rewrite a file in full, through a temp file in the same directory
    async fn write_records(
        &self,
        file: &str,
        header: &[&str],
        records: &[StringRecord],
    ) -> AppResult<()> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());
        writer
            .write_record(header)
            .map_err(|e| AppError::Storage(format!("Failed to encode {}: {}", file, e)))?;
        for record in records {
            writer
                .write_record(record)
                .map_err(|e| AppError::Storage(format!("Failed to encode {}: {}", file, e)))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Storage(format!("Failed to encode {}: {}", file, e)))?;

        let path = self.dir.join(file);
        let tmp = self.dir.join(format!("{}.tmp", file));
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to replace {}: {}", path.display(), e)))
    }

    async fn load_books(&self) -> AppResult<Vec<Book>> {
        let records = self.read_records(BOOKS_FILE).await?;
        Ok(records
            .iter()
            .enumerate()
            .filter_map(|(row, record)| match parse_book(record) {
                Some(book) => Some(book),
                None => {
                    tracing::warn!("Skipping unreadable row {} in {}", row + 2, BOOKS_FILE);
                    None
                }
            })
            .collect())
    }

    async fn load_members(&self) -> AppResult<Vec<Member>> {
        let records = self.read_records(MEMBERS_FILE).await?;
        Ok(records
            .iter()
            .enumerate()
            .filter_map(|(row, record)| match parse_member(record) {
                Some(member) => Some(member),
                None => {
                    tracing::warn!("Skipping unreadable row {} in {}", row + 2, MEMBERS_FILE);
                    None
                }
            })
            .collect())
    }

    async fn load_transactions(&self) -> AppResult<Vec<Transaction>> {
        let records = self.read_records(TRANSACTIONS_FILE).await?;
        Ok(records
            .iter()
            .enumerate()
            .filter_map(|(row, record)| match parse_transaction(record) {
                Some(tx) => Some(tx),
                None => {
                    tracing::warn!(
                        "Skipping unreadable row {} in {}",
                        row + 2,
                        TRANSACTIONS_FILE
                    );
                    None
                }
            })
            .collect())
    }
}

/// Parse an id cell; blank or non-numeric means the row is absent
fn parse_id(record: &StringRecord, index: usize) -> Option<i64> {
    record.get(index)?.trim().parse().ok()
}

fn parse_date(record: &StringRecord, index: usize) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(record.get(index)?.trim(), "%Y-%m-%d").ok()
}

fn parse_book(record: &StringRecord) -> Option<Book> {
    Some(Book {
        id: parse_id(record, 0)?,
        title: record.get(1)?.to_string(),
        available_copies: record.get(2)?.trim().parse().ok()?,
    })
}

fn parse_member(record: &StringRecord) -> Option<Member> {
    Some(Member {
        id: parse_id(record, 0)?,
        name: record.get(1)?.to_string(),
    })
}

fn parse_transaction(record: &StringRecord) -> Option<Transaction> {
    let return_date = match record.get(5).map(str::trim) {
        None | Some("") => None,
        Some(s) => Some(NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?),
    };
    Some(Transaction {
        id: parse_id(record, 0)?,
        member_id: parse_id(record, 1)?,
        book_id: parse_id(record, 2)?,
        borrow_date: parse_date(record, 3)?,
        due_date: parse_date(record, 4)?,
        return_date,
    })
}

fn transaction_record(tx: &Transaction) -> StringRecord {
    StringRecord::from(vec![
        tx.id.to_string(),
        tx.member_id.to_string(),
        tx.book_id.to_string(),
        tx.borrow_date.to_string(),
        tx.due_date.to_string(),
        tx.return_date.map(|d| d.to_string()).unwrap_or_default(),
    ])
}

#[async_trait]
impl Storage for SheetStorage {
    async fn get_book(&self, id: i64) -> AppResult<Book> {
        let _guard = self.lock.lock().await;
        self.load_books()
            .await?
            .into_iter()
            .find(|b| b.id == id)
            .ok_or(AppError::NotFound {
                entity: Entity::Book,
                id,
            })
    }

    async fn get_member(&self, id: i64) -> AppResult<Member> {
        let _guard = self.lock.lock().await;
        self.load_members()
            .await?
            .into_iter()
            .find(|m| m.id == id)
            .ok_or(AppError::NotFound {
                entity: Entity::Member,
                id,
            })
    }

    async fn update_available_copies(&self, book_id: i64, new_value: i32) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_records(BOOKS_FILE).await?;

        let position = records
            .iter()
            .position(|r| parse_id(r, 0) == Some(book_id))
            .ok_or(AppError::NotFound {
                entity: Entity::Book,
                id: book_id,
            })?;

        let title = records[position].get(1).unwrap_or_default().to_string();
        records[position] = StringRecord::from(vec![
            book_id.to_string(),
            title,
            new_value.to_string(),
        ]);

        self.write_records(BOOKS_FILE, &BOOKS_HEADER, &records).await
    }

    async fn append_transaction(&self, tx: &Transaction) -> AppResult<i64> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_records(TRANSACTIONS_FILE).await?;
        records.push(transaction_record(tx));
        self.write_records(TRANSACTIONS_FILE, &TRANSACTIONS_HEADER, &records)
            .await?;
        Ok(tx.id)
    }

    async fn get_transaction(&self, id: i64) -> AppResult<Transaction> {
        let _guard = self.lock.lock().await;
        self.load_transactions()
            .await?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or(AppError::NotFound {
                entity: Entity::Transaction,
                id,
            })
    }

    async fn set_return_date(&self, tx_id: i64, date: NaiveDate) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_records(TRANSACTIONS_FILE).await?;

        let position = records
            .iter()
            .position(|r| parse_id(r, 0) == Some(tx_id))
            .ok_or(AppError::NotFound {
                entity: Entity::Transaction,
                id: tx_id,
            })?;

        let mut cells: Vec<String> = records[position]
            .iter()
            .map(|c| c.to_string())
            .collect();
        cells.resize(TRANSACTIONS_HEADER.len(), String::new());
        cells[5] = date.to_string();
        records[position] = StringRecord::from(cells);

        self.write_records(TRANSACTIONS_FILE, &TRANSACTIONS_HEADER, &records)
            .await
    }

    async fn list_transactions(&self) -> AppResult<Vec<Transaction>> {
        let _guard = self.lock.lock().await;
        self.load_transactions().await
    }

    async fn list_books(&self) -> AppResult<Vec<Book>> {
        let _guard = self.lock.lock().await;
        self.load_books().await
    }

    async fn list_members(&self) -> AppResult<Vec<Member>> {
        let _guard = self.lock.lock().await;
        self.load_members().await
    }
}
