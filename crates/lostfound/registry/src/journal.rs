//! Write-ahead journal of registry events.
//!
//! File format: `[magic "LFRJ":4][version:2][reserved:2][entries...]`
//! Entry format: `[length:4][sequence:8][event json:N][crc32:4]`, little endian.
//!
//! A torn or checksum-failing tail (a crash mid-append) is cut back to the
//! last good entry on open. Anything else malformed is reported as corruption.

use crate::config::SyncMode;
use lostfound_types::{FoundItem, LostItem, RegistryError, SettlementReceipt, User};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

const JOURNAL_MAGIC: [u8; 4] = *b"LFRJ";
const JOURNAL_VERSION: u16 = 1;
/// magic(4) + version(2) + reserved(2)
const HEADER_SIZE: usize = 8;
/// length(4) + sequence(8)
const ENTRY_HEADER_SIZE: usize = 12;
const CRC_SIZE: usize = 4;

/// Errors from the journal.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("journal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("journal corruption at offset {offset}: {reason}")]
    Corruption { offset: u64, reason: String },

    #[error("unsupported journal version {0}")]
    UnsupportedVersion(u16),

    #[error("journal serialization error: {0}")]
    Serialization(String),

    #[error("journal unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for JournalError {
    fn from(e: serde_json::Error) -> Self {
        JournalError::Serialization(e.to_string())
    }
}

impl From<JournalError> for RegistryError {
    fn from(e: JournalError) -> Self {
        RegistryError::Storage(e.to_string())
    }
}

/// A state change, recorded before it is applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    UserRegistered { user: User },
    LostItemReported { item: LostItem },
    FoundItemReported { item: FoundItem },
    LostItemResolved { receipt: SettlementReceipt },
    FoundItemClaimed { receipt: SettlementReceipt },
}

impl RegistryEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RegistryEvent::UserRegistered { .. } => "user_registered",
            RegistryEvent::LostItemReported { .. } => "lost_item_reported",
            RegistryEvent::FoundItemReported { .. } => "found_item_reported",
            RegistryEvent::LostItemResolved { .. } => "lost_item_resolved",
            RegistryEvent::FoundItemClaimed { .. } => "found_item_claimed",
        }
    }
}

/// Byte store behind a journal.
pub trait JournalStorage: Send + Sync {
    fn read_all(&self) -> Result<Vec<u8>, JournalError>;
    fn append(&self, bytes: &[u8]) -> Result<(), JournalError>;
    /// Cut the store back to `len` bytes.
    fn truncate(&self, len: u64) -> Result<(), JournalError>;
    fn sync(&self) -> Result<(), JournalError>;
}

// ---- File-backed storage ----

pub struct FileJournalStorage {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileJournalStorage {
    /// Open (or create) the journal file, creating parent directories.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, JournalError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl JournalStorage for FileJournalStorage {
    fn read_all(&self) -> Result<Vec<u8>, JournalError> {
        Ok(std::fs::read(&self.path)?)
    }

    fn append(&self, bytes: &[u8]) -> Result<(), JournalError> {
        let mut file = self.file.lock();
        file.write_all(bytes)?;
        file.flush()?;
        Ok(())
    }

    fn truncate(&self, len: u64) -> Result<(), JournalError> {
        let file = self.file.lock();
        file.set_len(len)?;
        file.sync_all()?;
        Ok(())
    }

    fn sync(&self) -> Result<(), JournalError> {
        self.file.lock().sync_data()?;
        Ok(())
    }
}

// ---- In-memory storage ----

/// Shared in-memory bytes. Clones see the same buffer, so a test can keep a
/// handle and reopen a registry over what an earlier one wrote.
#[derive(Clone, Default)]
pub struct MemoryJournalStorage {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl MemoryJournalStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(Mutex::new(bytes)),
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        self.bytes.lock().clone()
    }
}

impl JournalStorage for MemoryJournalStorage {
    fn read_all(&self) -> Result<Vec<u8>, JournalError> {
        Ok(self.contents())
    }

    fn append(&self, bytes: &[u8]) -> Result<(), JournalError> {
        self.bytes.lock().extend_from_slice(bytes);
        Ok(())
    }

    fn truncate(&self, len: u64) -> Result<(), JournalError> {
        let len = usize::try_from(len).map_err(|_| JournalError::Corruption {
            offset: len,
            reason: "truncate length out of range".into(),
        })?;
        self.bytes.lock().truncate(len);
        Ok(())
    }

    fn sync(&self) -> Result<(), JournalError> {
        Ok(())
    }
}

// ---- Journal ----

pub struct RegistryJournal {
    storage: Box<dyn JournalStorage>,
    sync_mode: SyncMode,
    /// The lock also serializes appends.
    tail: Mutex<JournalTail>,
}

/// End of the committed prefix of the journal.
struct JournalTail {
    /// Sequence of the last committed entry.
    sequence: u64,
    /// Storage length covering every committed entry.
    len: u64,
    /// Set when a failed append could not be rolled back; the storage may
    /// then hold bytes past `len`, so nothing more may be written.
    poisoned: bool,
}

impl RegistryJournal {
    /// Open a journal, returning it with every recovered event in order.
    pub fn open(
        storage: Box<dyn JournalStorage>,
        sync_mode: SyncMode,
    ) -> Result<(Self, Vec<RegistryEvent>), JournalError> {
        let bytes = storage.read_all()?;

        if bytes.len() < HEADER_SIZE {
            if !bytes.is_empty() {
                warn!(len = bytes.len(), "Journal header torn, starting fresh");
                storage.truncate(0)?;
            }
            storage.append(&header())?;
            storage.sync()?;
            info!("Journal created");
            return Ok((
                Self::with_tail(storage, sync_mode, 0, HEADER_SIZE as u64),
                Vec::new(),
            ));
        }

        if bytes[..4] != JOURNAL_MAGIC {
            return Err(JournalError::Corruption {
                offset: 0,
                reason: "bad magic".into(),
            });
        }
        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != JOURNAL_VERSION {
            return Err(JournalError::UnsupportedVersion(version));
        }

        let (events, last_sequence, good_len) = scan_entries(&bytes)?;
        if good_len < bytes.len() {
            warn!(
                offset = good_len,
                discarded = bytes.len() - good_len,
                "Truncating torn journal tail"
            );
            storage.truncate(good_len as u64)?;
        }

        info!(events = events.len(), last_sequence, "Journal opened");
        Ok((
            Self::with_tail(storage, sync_mode, last_sequence, good_len as u64),
            events,
        ))
    }

    /// Open a file-backed journal at `path`.
    pub fn open_file(
        path: impl Into<PathBuf>,
        sync_mode: SyncMode,
    ) -> Result<(Self, Vec<RegistryEvent>), JournalError> {
        Self::open(Box::new(FileJournalStorage::open(path)?), sync_mode)
    }

    fn with_tail(
        storage: Box<dyn JournalStorage>,
        sync_mode: SyncMode,
        sequence: u64,
        len: u64,
    ) -> Self {
        Self {
            storage,
            sync_mode,
            tail: Mutex::new(JournalTail {
                sequence,
                len,
                poisoned: false,
            }),
        }
    }

    /// Append an event. Returns its sequence number.
    ///
    /// Either the whole entry is committed or the storage is cut back to the
    /// previous committed length. If that rollback fails too, the journal
    /// refuses every later append.
    pub fn append(&self, event: &RegistryEvent) -> Result<u64, JournalError> {
        let payload = serde_json::to_vec(event)?;
        let length = u32::try_from(payload.len()).map_err(|_| {
            JournalError::Serialization(format!("event too large: {} bytes", payload.len()))
        })?;

        let mut tail = self.tail.lock();
        if tail.poisoned {
            return Err(JournalError::Unavailable(
                "an earlier failed append could not be rolled back".into(),
            ));
        }
        let sequence = tail.sequence + 1;

        let mut entry = Vec::with_capacity(ENTRY_HEADER_SIZE + payload.len() + CRC_SIZE);
        entry.extend_from_slice(&length.to_le_bytes());
        entry.extend_from_slice(&sequence.to_le_bytes());
        entry.extend_from_slice(&payload);
        entry.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());

        if let Err(e) = self.write_entry(&entry) {
            warn!(sequence, error = %e, "Journal append failed, rolling back");
            if let Err(rollback) = self.storage.truncate(tail.len) {
                warn!(len = tail.len, error = %rollback, "Journal rollback failed");
                tail.poisoned = true;
            }
            return Err(e);
        }
        tail.sequence = sequence;
        tail.len += entry.len() as u64;

        debug!(sequence, event = event.name(), "Event appended to journal");
        Ok(sequence)
    }

    fn write_entry(&self, entry: &[u8]) -> Result<(), JournalError> {
        self.storage.append(entry)?;
        if self.sync_mode == SyncMode::Immediate {
            self.storage.sync()?;
        }
        Ok(())
    }

    pub fn last_sequence(&self) -> u64 {
        self.tail.lock().sequence
    }
}

fn header() -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    header[..4].copy_from_slice(&JOURNAL_MAGIC);
    header[4..6].copy_from_slice(&JOURNAL_VERSION.to_le_bytes());
    header
}

/// Decode entries after the header. Returns the events, the last sequence,
/// and the length of the intact prefix.
fn scan_entries(bytes: &[u8]) -> Result<(Vec<RegistryEvent>, u64, usize), JournalError> {
    let mut events = Vec::new();
    let mut last_sequence = 0u64;
    let mut pos = HEADER_SIZE;

    while pos < bytes.len() {
        let Some(entry_header) = bytes.get(pos..pos + ENTRY_HEADER_SIZE) else {
            break;
        };
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&entry_header[..4]);
        let mut seq_bytes = [0u8; 8];
        seq_bytes.copy_from_slice(&entry_header[4..]);
        let length = u32::from_le_bytes(len_bytes) as usize;
        let sequence = u64::from_le_bytes(seq_bytes);

        let payload_start = pos + ENTRY_HEADER_SIZE;
        let payload_end = payload_start + length;
        let Some(crc_bytes) = bytes.get(payload_end..payload_end + CRC_SIZE) else {
            break;
        };
        let payload = &bytes[payload_start..payload_end];
        let stored_crc = u32::from_le_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
        if crc32fast::hash(payload) != stored_crc {
            break;
        }

        if sequence != last_sequence + 1 {
            return Err(JournalError::Corruption {
                offset: pos as u64,
                reason: format!("expected sequence {}, found {}", last_sequence + 1, sequence),
            });
        }
        let event: RegistryEvent = serde_json::from_slice(payload).map_err(|e| {
            JournalError::Corruption {
                offset: pos as u64,
                reason: format!("undecodable event: {}", e),
            }
        })?;

        events.push(event);
        last_sequence = sequence;
        pos = payload_end + CRC_SIZE;
    }

    Ok((events, last_sequence, pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lostfound_types::{Identity, UserProfile};

    fn user_event(name: &str) -> RegistryEvent {
        let profile = UserProfile::new(name, "x@example.com", "1234567890").unwrap();
        RegistryEvent::UserRegistered {
            user: User::new(Identity::new(name), profile, Utc::now()),
        }
    }

    #[test]
    fn test_fresh_journal_writes_header() {
        let storage = MemoryJournalStorage::new();
        let (journal, events) =
            RegistryJournal::open(Box::new(storage.clone()), SyncMode::Immediate).unwrap();
        assert!(events.is_empty());
        assert_eq!(journal.last_sequence(), 0);
        assert_eq!(&storage.contents()[..4], b"LFRJ");
        assert_eq!(storage.contents().len(), HEADER_SIZE);
    }

    #[test]
    fn test_append_and_recover() {
        let storage = MemoryJournalStorage::new();
        let (journal, _) =
            RegistryJournal::open(Box::new(storage.clone()), SyncMode::Immediate).unwrap();
        let first = user_event("alice");
        let second = user_event("bob");
        assert_eq!(journal.append(&first).unwrap(), 1);
        assert_eq!(journal.append(&second).unwrap(), 2);

        let (reopened, events) =
            RegistryJournal::open(Box::new(storage.clone()), SyncMode::OsManaged).unwrap();
        assert_eq!(events, vec![first, second]);
        assert_eq!(reopened.last_sequence(), 2);
    }

    #[test]
    fn test_torn_tail_is_truncated() {
        let storage = MemoryJournalStorage::new();
        let (journal, _) =
            RegistryJournal::open(Box::new(storage.clone()), SyncMode::Immediate).unwrap();
        journal.append(&user_event("alice")).unwrap();
        let intact = storage.contents().len();
        journal.append(&user_event("bob")).unwrap();

        let mut bytes = storage.contents();
        bytes.truncate(bytes.len() - 3);
        let torn = MemoryJournalStorage::from_bytes(bytes);

        let (journal, events) =
            RegistryJournal::open(Box::new(torn.clone()), SyncMode::Immediate).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(torn.contents().len(), intact);
        assert_eq!(journal.append(&user_event("carol")).unwrap(), 2);
    }

    #[test]
    fn test_checksum_mismatch_ends_recovery() {
        let storage = MemoryJournalStorage::new();
        let (journal, _) =
            RegistryJournal::open(Box::new(storage.clone()), SyncMode::Immediate).unwrap();
        journal.append(&user_event("alice")).unwrap();
        journal.append(&user_event("bob")).unwrap();

        let mut bytes = storage.contents();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        let damaged = MemoryJournalStorage::from_bytes(bytes);

        let (_, events) =
            RegistryJournal::open(Box::new(damaged.clone()), SyncMode::Immediate).unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RegistryEvent::UserRegistered { user } => assert_eq!(user.username, "alice"),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(damaged.contents().len() < storage.contents().len());
    }

    /// Memory storage whose next `sync` fails on request. Clones share the
    /// buffer and the switches.
    #[derive(Clone, Default)]
    struct FlakyStorage {
        inner: MemoryJournalStorage,
        fail_next_sync: Arc<Mutex<bool>>,
        fail_truncate: Arc<Mutex<bool>>,
    }

    impl FlakyStorage {
        fn fail_next_sync(&self) {
            *self.fail_next_sync.lock() = true;
        }
    }

    impl JournalStorage for FlakyStorage {
        fn read_all(&self) -> Result<Vec<u8>, JournalError> {
            self.inner.read_all()
        }

        fn append(&self, bytes: &[u8]) -> Result<(), JournalError> {
            self.inner.append(bytes)
        }

        fn truncate(&self, len: u64) -> Result<(), JournalError> {
            if *self.fail_truncate.lock() {
                return Err(std::io::Error::other("truncate failed").into());
            }
            self.inner.truncate(len)
        }

        fn sync(&self) -> Result<(), JournalError> {
            if std::mem::take(&mut *self.fail_next_sync.lock()) {
                return Err(std::io::Error::other("fsync failed").into());
            }
            Ok(())
        }
    }

    #[test]
    fn test_failed_sync_rolls_entry_back() {
        let storage = FlakyStorage::default();
        let (journal, _) =
            RegistryJournal::open(Box::new(storage.clone()), SyncMode::Immediate).unwrap();
        journal.append(&user_event("alice")).unwrap();
        let committed = storage.inner.contents();

        storage.fail_next_sync();
        let err = journal.append(&user_event("ghost")).unwrap_err();
        assert!(matches!(err, JournalError::Io(_)));
        assert_eq!(storage.inner.contents(), committed);
        assert_eq!(journal.last_sequence(), 1);

        assert_eq!(journal.append(&user_event("carol")).unwrap(), 2);

        let (_, events) =
            RegistryJournal::open(Box::new(storage.inner.clone()), SyncMode::Immediate).unwrap();
        let names: Vec<_> = events
            .iter()
            .map(|event| match event {
                RegistryEvent::UserRegistered { user } => user.username.clone(),
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(names, vec!["alice", "carol"]);
    }

    #[test]
    fn test_failed_rollback_refuses_later_appends() {
        let storage = FlakyStorage::default();
        let (journal, _) =
            RegistryJournal::open(Box::new(storage.clone()), SyncMode::Immediate).unwrap();
        journal.append(&user_event("alice")).unwrap();

        *storage.fail_truncate.lock() = true;
        storage.fail_next_sync();
        assert!(journal.append(&user_event("ghost")).is_err());

        let err = journal.append(&user_event("carol")).unwrap_err();
        assert!(matches!(err, JournalError::Unavailable(_)));
        assert_eq!(journal.last_sequence(), 1);
    }

    #[test]
    fn test_bad_magic_is_corruption() {
        let storage = MemoryJournalStorage::from_bytes(b"NOPE\x01\x00\x00\x00".to_vec());
        let err = RegistryJournal::open(Box::new(storage), SyncMode::Immediate)
            .err()
            .unwrap();
        assert!(matches!(err, JournalError::Corruption { offset: 0, .. }));
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let storage = MemoryJournalStorage::from_bytes(b"LFRJ\x09\x00\x00\x00".to_vec());
        let err = RegistryJournal::open(Box::new(storage), SyncMode::Immediate)
            .err()
            .unwrap();
        assert!(matches!(err, JournalError::UnsupportedVersion(9)));
    }

    #[test]
    fn test_event_tags() {
        let json = serde_json::to_value(user_event("alice")).unwrap();
        assert_eq!(json["event"], "user_registered");
        assert_eq!(user_event("alice").name(), "user_registered");
    }

    #[test]
    fn test_journal_error_maps_to_storage() {
        let err: RegistryError = JournalError::UnsupportedVersion(2).into();
        assert!(matches!(err, RegistryError::Storage(_)));
    }
}
