use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use deed_types::{ChainKey, LedgerRecord, PrevHash};
use tracing::{debug, error, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::index::ChainIndex;
use crate::traits::RecordStore;

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: u64 = 8;

/// Largest payload a single entry may carry.
const MAX_ENTRY_LEN: u32 = 16 * 1024 * 1024;

/// Flush/sync strategy for the journal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// `fsync` after every append (safest, highest latency).
    EveryWrite,
    /// Flush to the OS page cache only (fastest, least durable).
    #[default]
    OsDefault,
}

/// Configuration for a [`FileRecordStore`].
#[derive(Clone, Debug, Default)]
pub struct JournalConfig {
    pub sync_mode: SyncMode,
}

struct JournalState {
    file: File,
    /// End of the last complete entry. Nothing past it is ever kept.
    offset: u64,
    index: ChainIndex,
}

impl JournalState {
    /// Write one framed entry at `offset`. On failure the file is cut back
    /// to `offset`, so a half-written frame never precedes the next append.
    fn write_entry(&mut self, frame: &[u8], sync: bool) -> io::Result<()> {
        let written = self.file.write_all(frame).and_then(|()| {
            if sync {
                self.file.sync_all()
            } else {
                Ok(())
            }
        });
        if let Err(e) = written {
            if let Err(rollback) = self.rollback() {
                error!(
                    offset = self.offset,
                    error = %rollback,
                    "failed to roll back partial journal entry"
                );
            }
            return Err(e);
        }
        Ok(())
    }

    fn rollback(&mut self) -> io::Result<()> {
        self.file.set_len(self.offset)
    }
}

struct Journal {
    path: PathBuf,
    config: JournalConfig,
    state: Mutex<JournalState>,
}

/// Append-only journal record store.
///
/// Every record is bincode-serialized and framed on disk as:
///
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized LedgerRecord)]
/// ```
///
/// The full chain index is rebuilt in memory on open, so reads never touch
/// the disk. A torn final entry (a crash mid-append) is truncated away with a
/// warning; an over-long entry followed by intact entries is not torn and the
/// journal refuses to open. A failed append cuts the file back to the end of
/// the last complete entry. A complete entry that fails its checksum is reported as
/// [`StoreError::Corrupt`] and the journal refuses to open: the CRC guards
/// against accidental damage, and silently dropping a record would hide a
/// gap in the chain.
#[derive(Clone)]
pub struct FileRecordStore {
    journal: Arc<Journal>,
}

impl FileRecordStore {
    /// Open (or create) a journal at `path` and rebuild its index.
    pub fn open(path: impl AsRef<Path>, config: JournalConfig) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let (index, valid_len) = recover(path)?;
        let file_len = file.metadata()?.len();
        if valid_len < file_len {
            warn!(
                path = %path.display(),
                valid_len,
                file_len,
                "truncating torn journal tail"
            );
            file.set_len(valid_len)?;
        }

        info!(path = %path.display(), records = index.len(), "journal opened");

        Ok(Self {
            journal: Arc::new(Journal {
                path: path.to_path_buf(),
                config,
                state: Mutex::new(JournalState {
                    file,
                    offset: valid_len,
                    index,
                }),
            }),
        })
    }

    /// Path to the journal file.
    pub fn path(&self) -> &Path {
        &self.journal.path
    }

    /// Current write offset (journal length in bytes).
    pub fn offset(&self) -> u64 {
        self.journal.state.lock().expect("journal mutex poisoned").offset
    }

    async fn append(&self, record: &LedgerRecord, expected_tail: Option<PrevHash>) -> StoreResult<()> {
        let journal = Arc::clone(&self.journal);
        let record = record.clone();
        tokio::task::spawn_blocking(move || journal.append(record, expected_tail.as_ref()))
            .await
            .map_err(|e| StoreError::Unavailable(format!("journal writer task failed: {e}")))?
    }
}

impl Journal {
    fn append(&self, record: LedgerRecord, expected_tail: Option<&PrevHash>) -> StoreResult<()> {
        let mut state = self.state.lock().expect("journal mutex poisoned");
        let key = state.index.check_insert(&record, expected_tail)?;

        let payload =
            bincode::serialize(&record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let length = u32::try_from(payload.len())
            .ok()
            .filter(|len| *len <= MAX_ENTRY_LEN)
            .ok_or_else(|| {
                StoreError::Serialization(format!(
                    "record of {} bytes exceeds the {MAX_ENTRY_LEN} byte entry limit",
                    payload.len()
                ))
            })?;
        let entry_offset = state.offset;

        let mut frame = Vec::with_capacity(HEADER_SIZE as usize + payload.len());
        frame.extend_from_slice(&length.to_le_bytes());
        frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        frame.extend_from_slice(&payload);
        state.write_entry(&frame, self.config.sync_mode == SyncMode::EveryWrite)?;

        state.offset += frame.len() as u64;
        debug!(
            offset = entry_offset,
            len = payload.len(),
            record_id = %record.id,
            "journal append"
        );
        state.index.apply_insert(key, record);
        Ok(())
    }
}

/// Read the journal front to back, returning the rebuilt index and the
/// length of the valid prefix.
fn recover(path: &Path) -> StoreResult<(ChainIndex, u64)> {
    let mut reader = BufReader::new(File::open(path)?);
    let file_len = reader.get_ref().metadata()?.len();
    let mut index = ChainIndex::default();
    let mut offset: u64 = 0;

    while offset < file_len {
        if offset + HEADER_SIZE > file_len {
            warn!(offset, "torn journal header; stopping recovery");
            break;
        }

        let mut header = [0u8; HEADER_SIZE as usize];
        reader.read_exact(&mut header)?;
        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        if length == 0 {
            return Err(StoreError::Corrupt {
                offset,
                reason: "zero-length entry".into(),
            });
        }
        if length > MAX_ENTRY_LEN {
            return Err(StoreError::Corrupt {
                offset,
                reason: format!("entry length {length} exceeds limit {MAX_ENTRY_LEN}"),
            });
        }
        if offset + HEADER_SIZE + u64::from(length) > file_len {
            // Only the last entry may be torn. A damaged length that hides
            // complete entries after it is corruption, not a crash artifact.
            let mut rest = Vec::new();
            reader.read_to_end(&mut rest)?;
            if let Some(pos) = find_complete_entry(&rest) {
                return Err(StoreError::Corrupt {
                    offset,
                    reason: format!(
                        "entry length {length} runs past end of journal but an entry follows at {}",
                        offset + HEADER_SIZE + pos as u64
                    ),
                });
            }
            warn!(offset, length, file_len, "torn journal entry; stopping recovery");
            break;
        }

        let mut payload = vec![0u8; length as usize];
        match reader.read_exact(&mut payload) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                warn!(offset, "truncated journal entry; stopping recovery");
                break;
            }
            Err(e) => return Err(e.into()),
        }

        let actual_crc = crc32fast::hash(&payload);
        if actual_crc != expected_crc {
            return Err(StoreError::Corrupt {
                offset,
                reason: format!("CRC mismatch: expected {expected_crc:08x}, computed {actual_crc:08x}"),
            });
        }

        let record: LedgerRecord = bincode::deserialize(&payload).map_err(|e| StoreError::Corrupt {
            offset,
            reason: format!("undecodable record: {e}"),
        })?;
        index.insert(record, None).map_err(|e| StoreError::Corrupt {
            offset,
            reason: e.to_string(),
        })?;

        offset += HEADER_SIZE + u64::from(length);
    }

    debug!(recovered = index.len(), "journal recovery complete");
    Ok((index, offset))
}

/// Position of the first well-formed entry (sane length, whole payload
/// present, matching CRC) anywhere in `bytes`.
fn find_complete_entry(bytes: &[u8]) -> Option<usize> {
    let header = HEADER_SIZE as usize;
    (0..bytes.len().saturating_sub(header)).find(|&pos| {
        let length = u32::from_le_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]]);
        let crc = u32::from_le_bytes([bytes[pos + 4], bytes[pos + 5], bytes[pos + 6], bytes[pos + 7]]);
        if length == 0 || length > MAX_ENTRY_LEN {
            return false;
        }
        let start = pos + header;
        let end = start + length as usize;
        end <= bytes.len() && crc32fast::hash(&bytes[start..end]) == crc
    })
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn find_by_chain_key(&self, key: &ChainKey) -> StoreResult<Vec<LedgerRecord>> {
        let state = self.journal.state.lock().expect("journal mutex poisoned");
        Ok(state.index.find_by_chain_key(key))
    }

    async fn find_by_survey(&self, survey_number: &str) -> StoreResult<Vec<LedgerRecord>> {
        let state = self.journal.state.lock().expect("journal mutex poisoned");
        Ok(state.index.find_by_survey(survey_number))
    }

    async fn insert(&self, record: &LedgerRecord) -> StoreResult<()> {
        self.append(record, None).await
    }

    async fn insert_if_tail(
        &self,
        record: &LedgerRecord,
        expected_tail: &PrevHash,
    ) -> StoreResult<()> {
        self.append(record, Some(*expected_tail)).await
    }

    async fn tail(&self, key: &ChainKey) -> StoreResult<Option<LedgerRecord>> {
        let state = self.journal.state.lock().expect("journal mutex poisoned");
        Ok(state.index.tail(key))
    }

    async fn len(&self) -> StoreResult<usize> {
        let state = self.journal.state.lock().expect("journal mutex poisoned");
        Ok(state.index.len())
    }
}

impl std::fmt::Debug for FileRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRecordStore")
            .field("path", &self.journal.path)
            .finish()
    }
}
