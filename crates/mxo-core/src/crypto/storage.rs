// ============================================
// File: crates/mxo-core/src/crypto/storage.rs
// ============================================
//! # Key Storage
//!
//! ## Creation Reason
//! The key store decides WHAT to persist; this module decides WHERE.
//! Keeping it behind a trait lets the bootstrap run against a temp
//! directory or plain memory in tests.
//!
//! ## Main Functionality
//! - `KeySlot`: the four persisted artifacts and their file names
//! - `KeyStorage`: load/store seam
//! - `FileKeyStorage`: one directory, one file per slot
//! - `MemoryKeyStorage`: in-process map, with injectable write failures
//!
//! ## ⚠️ Important Note for Next Developer
//! - Writes create or truncate; there is no append mode
//! - Private slots are chmod 0600 on Unix
//!
//! ## Last Modified
//! v0.1.0 - Initial storage backends

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::trace;
use zeroize::Zeroizing;

use crate::error::{CoreError, Result};

// ============================================
// KeySlot
// ============================================

/// A persisted key artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySlot {
    /// Signing private key, PKCS#1 DER.
    SigningPrivate,
    /// Signing modulus, raw 256 bytes.
    SigningPublic,
    /// Session private key, PKCS#1 DER.
    SessionPrivate,
    /// Signed session `PublicKeyRecord`.
    SessionPublicRecord,
}

impl KeySlot {
    /// All slots, in bootstrap order.
    pub const ALL: [Self; 4] = [
        Self::SigningPrivate,
        Self::SigningPublic,
        Self::SessionPrivate,
        Self::SessionPublicRecord,
    ];

    /// File name used by [`FileKeyStorage`].
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::SigningPrivate => "signPriv.dat",
            Self::SigningPublic => "signPub.dat",
            Self::SessionPrivate => "privkey.dat",
            Self::SessionPublicRecord => "pubkey.dat",
        }
    }

    /// Returns `true` for slots holding private key material.
    #[must_use]
    pub const fn is_private(self) -> bool {
        matches!(self, Self::SigningPrivate | Self::SessionPrivate)
    }
}

impl fmt::Display for KeySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

// ============================================
// KeyStorage Trait
// ============================================

/// Backend that holds persisted key material.
pub trait KeyStorage: Send + Sync {
    /// Reads a slot.
    ///
    /// # Errors
    /// Any I/O error; the caller treats every read failure as "absent".
    fn load(&self, slot: KeySlot) -> io::Result<Zeroizing<Vec<u8>>>;

    /// Writes a slot, replacing previous contents.
    ///
    /// # Errors
    /// Returns `Persistence` on failure.
    fn store(&self, slot: KeySlot, data: &[u8]) -> Result<()>;

    /// Human-readable location of a slot, for logs and errors.
    fn describe(&self, slot: KeySlot) -> PathBuf;
}

// ============================================
// FileKeyStorage
// ============================================

/// Stores each slot as a file in one directory.
#[derive(Debug, Clone)]
pub struct FileKeyStorage {
    directory: PathBuf,
}

impl FileKeyStorage {
    /// Creates storage rooted at `directory`. Nothing is touched until the
    /// first write.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Root directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Full path of a slot.
    #[must_use]
    pub fn path(&self, slot: KeySlot) -> PathBuf {
        self.directory.join(slot.file_name())
    }

    fn write_file(&self, slot: KeySlot, data: &[u8]) -> io::Result<()> {
        std::fs::create_dir_all(&self.directory)?;
        let path = self.path(slot);
        std::fs::write(&path, data)?;

        // Set restrictive permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if slot.is_private() {
                let mut perms = std::fs::metadata(&path)?.permissions();
                perms.set_mode(0o600);
                std::fs::set_permissions(&path, perms)?;
            }
        }
        Ok(())
    }
}

impl KeyStorage for FileKeyStorage {
    fn load(&self, slot: KeySlot) -> io::Result<Zeroizing<Vec<u8>>> {
        let path = self.path(slot);
        trace!(path = %path.display(), "Reading key file");
        std::fs::read(path).map(Zeroizing::new)
    }

    fn store(&self, slot: KeySlot, data: &[u8]) -> Result<()> {
        self.write_file(slot, data)
            .map_err(|e| CoreError::persistence(self.path(slot), e))
    }

    fn describe(&self, slot: KeySlot) -> PathBuf {
        self.path(slot)
    }
}

// ============================================
// MemoryKeyStorage
// ============================================

/// In-memory storage for tests and tooling.
#[derive(Default)]
pub struct MemoryKeyStorage {
    slots: Mutex<HashMap<KeySlot, Vec<u8>>>,
    fail_writes: AtomicBool,
    failing_slots: Mutex<HashSet<KeySlot>>,
}

impl MemoryKeyStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets slot contents directly, bypassing failure injection.
    pub fn insert(&self, slot: KeySlot, data: impl Into<Vec<u8>>) {
        self.slots.lock().insert(slot, data.into());
    }

    /// Removes a slot.
    pub fn remove(&self, slot: KeySlot) {
        self.slots.lock().remove(&slot);
    }

    /// Copy of a slot's contents.
    #[must_use]
    pub fn get(&self, slot: KeySlot) -> Option<Vec<u8>> {
        self.slots.lock().get(&slot).cloned()
    }

    /// Makes every subsequent `store` fail with `PermissionDenied`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes `store` fail for `slot` only.
    pub fn set_fail_writes_for(&self, slot: KeySlot, fail: bool) {
        let mut failing = self.failing_slots.lock();
        if fail {
            failing.insert(slot);
        } else {
            failing.remove(&slot);
        }
    }
}

impl KeyStorage for MemoryKeyStorage {
    fn load(&self, slot: KeySlot) -> io::Result<Zeroizing<Vec<u8>>> {
        self.slots
            .lock()
            .get(&slot)
            .cloned()
            .map(Zeroizing::new)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, slot.file_name()))
    }

    fn store(&self, slot: KeySlot, data: &[u8]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) || self.failing_slots.lock().contains(&slot) {
            return Err(CoreError::persistence(
                self.describe(slot),
                io::Error::new(io::ErrorKind::PermissionDenied, "writes disabled"),
            ));
        }
        self.slots.lock().insert(slot, data.to_vec());
        Ok(())
    }

    fn describe(&self, slot: KeySlot) -> PathBuf {
        PathBuf::from("memory").join(slot.file_name())
    }
}

impl fmt::Debug for MemoryKeyStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut present: Vec<_> = self.slots.lock().keys().map(|s| s.file_name()).collect();
        present.sort_unstable();
        f.debug_struct("MemoryKeyStorage")
            .field("slots", &present)
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_file_names() {
        let names: Vec<_> = KeySlot::ALL.iter().map(|s| s.file_name()).collect();
        assert_eq!(names, ["signPriv.dat", "signPub.dat", "privkey.dat", "pubkey.dat"]);
        assert!(KeySlot::SessionPrivate.is_private());
        assert!(!KeySlot::SessionPublicRecord.is_private());
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileKeyStorage::new(dir.path().join("keys"));

        assert_eq!(
            storage.load(KeySlot::SessionPublicRecord).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );

        storage.store(KeySlot::SessionPublicRecord, b"first").unwrap();
        storage.store(KeySlot::SessionPublicRecord, b"2nd").unwrap();
        assert_eq!(
            storage.load(KeySlot::SessionPublicRecord).unwrap().as_slice(),
            b"2nd"
        );
        assert!(dir.path().join("keys/pubkey.dat").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_private_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let storage = FileKeyStorage::new(dir.path());
        storage.store(KeySlot::SigningPrivate, b"secret").unwrap();

        let mode = std::fs::metadata(storage.path(KeySlot::SigningPrivate))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_file_storage_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();

        let storage = FileKeyStorage::new(&blocker);
        let err = storage.store(KeySlot::SessionPrivate, b"x").unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("privkey.dat"));
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryKeyStorage::new();
        assert!(storage.load(KeySlot::SigningPrivate).is_err());

        storage.store(KeySlot::SigningPrivate, b"abc").unwrap();
        assert_eq!(storage.get(KeySlot::SigningPrivate).unwrap(), b"abc");

        storage.set_fail_writes(true);
        assert!(storage.store(KeySlot::SigningPrivate, b"def").is_err());
        assert_eq!(storage.get(KeySlot::SigningPrivate).unwrap(), b"abc");
        storage.set_fail_writes(false);

        storage.set_fail_writes_for(KeySlot::SigningPublic, true);
        assert!(storage.store(KeySlot::SigningPublic, b"n").is_err());
        assert!(storage.store(KeySlot::SigningPrivate, b"ghi").is_ok());
        storage.set_fail_writes_for(KeySlot::SigningPublic, false);
        assert!(storage.store(KeySlot::SigningPublic, b"n").is_ok());
    }
}
