//! File-based reference store.
//!
//! Each ref lives at `<root>/<name>` as a single line of hex. Updates go
//! through a temp file in the same directory and an atomic rename, so a
//! crashed writer never leaves a half-written ref behind. The
//! compare-and-swap in `update_ref` additionally holds a `<name>.lock`
//! file across the read-compare-persist sequence, so concurrent updaters
//! serialize and the loser sees a conflict instead of overwriting.

use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use strata_types::ObjectId;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{RefError, RefResult};
use crate::names::validate_ref_name;
use crate::traits::RefStore;

const LOCK_RETRY: Duration = Duration::from_millis(1);
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Held for the duration of one compare-and-swap. Creating `<ref>.lock`
/// with `create_new` is the mutual exclusion; the file is removed on drop.
/// Ref name validation reserves the `.lock` suffix, so the path can never
/// collide with a real ref.
#[derive(Debug)]
struct RefLock {
    path: PathBuf,
}

impl RefLock {
    fn acquire(ref_path: &Path) -> RefResult<Self> {
        let mut os = ref_path.as_os_str().to_os_string();
        os.push(".lock");
        let path = PathBuf::from(os);
        let deadline = Instant::now() + LOCK_TIMEOUT;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(Self { path }),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if Instant::now() >= deadline {
                        return Err(RefError::Io(io::Error::new(
                            ErrorKind::TimedOut,
                            format!("lock file held too long: {}", path.display()),
                        )));
                    }
                    thread::sleep(LOCK_RETRY);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Drop for RefLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// File-backed [`RefStore`] rooted at a directory.
#[derive(Debug)]
pub struct FileRefStore {
    root: PathBuf,
}

impl FileRefStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> RefResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ref_path(&self, name: &str) -> PathBuf {
        // Name validation already forbids `..` and absolute components.
        self.root.join(name)
    }

    fn read_validated(&self, name: &str) -> RefResult<Option<ObjectId>> {
        let contents = match fs::read_to_string(self.ref_path(name)) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let id = ObjectId::from_hex(contents.trim()).map_err(|e| RefError::Corrupt {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(id))
    }
}

impl RefStore for FileRefStore {
    fn read_ref(&self, name: &str) -> RefResult<Option<ObjectId>> {
        validate_ref_name(name)?;
        self.read_validated(name)
    }

    fn update_ref(&self, name: &str, new: ObjectId, expected: Option<ObjectId>) -> RefResult<()> {
        validate_ref_name(name)?;

        let path = self.ref_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // The check and the swap must be one critical section; without the
        // lock two updaters could both pass the comparison and one write
        // would vanish.
        let _lock = RefLock::acquire(&path)?;

        let actual = self.read_validated(name)?;
        if actual != expected {
            return Err(RefError::Conflict {
                name: name.to_string(),
                expected,
                actual,
            });
        }

        // Write-then-rename within the root so the swap stays on one
        // filesystem.
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        writeln!(tmp, "{}", new.to_hex())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| RefError::Io(e.error))?;

        debug!(ref_name = name, target = %new.short_hex(), "updated ref");
        Ok(())
    }

    fn list_refs(&self) -> RefResult<Vec<(String, ObjectId)>> {
        let mut out = Vec::new();
        collect_refs(&self.root, "", &mut out)?;
        let mut refs = Vec::with_capacity(out.len());
        for name in out {
            if let Some(id) = self.read_validated(&name)? {
                refs.push((name, id));
            }
        }
        refs.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(refs)
    }
}

fn collect_refs(dir: &Path, prefix: &str, out: &mut Vec<String>) -> RefResult<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        // In-flight updates leave a transient lock file next to the ref.
        if file_name.ends_with(".lock") {
            continue;
        }
        let name = if prefix.is_empty() {
            file_name.to_string()
        } else {
            format!("{prefix}/{file_name}")
        };
        if entry.file_type()?.is_dir() {
            collect_refs(&entry.path(), &name, out)?;
        } else {
            out.push(name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> ObjectId {
        ObjectId::from_bytes(&[n])
    }

    fn open_store() -> (tempfile::TempDir, FileRefStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRefStore::open(dir.path().join("refs")).unwrap();
        (dir, store)
    }

    #[test]
    fn missing_ref_reads_none() {
        let (_dir, store) = open_store();
        assert!(store.read_ref("main").unwrap().is_none());
    }

    #[test]
    fn create_and_read_back() {
        let (_dir, store) = open_store();
        store.update_ref("main", id(1), None).unwrap();
        assert_eq!(store.read_ref("main").unwrap(), Some(id(1)));
    }

    #[test]
    fn advance_with_matching_expected() {
        let (_dir, store) = open_store();
        store.update_ref("main", id(1), None).unwrap();
        store.update_ref("main", id(2), Some(id(1))).unwrap();
        assert_eq!(store.read_ref("main").unwrap(), Some(id(2)));
    }

    #[test]
    fn stale_expected_conflicts_and_leaves_ref_unchanged() {
        let (_dir, store) = open_store();
        store.update_ref("main", id(1), None).unwrap();
        let err = store.update_ref("main", id(3), Some(id(2))).unwrap_err();
        match err {
            RefError::Conflict {
                expected, actual, ..
            } => {
                assert_eq!(expected, Some(id(2)));
                assert_eq!(actual, Some(id(1)));
            }
            other => panic!("expected conflict, got {other}"),
        }
        assert_eq!(store.read_ref("main").unwrap(), Some(id(1)));
    }

    #[test]
    fn create_conflicts_when_ref_exists() {
        let (_dir, store) = open_store();
        store.update_ref("main", id(1), None).unwrap();
        let err = store.update_ref("main", id(2), None).unwrap_err();
        assert!(matches!(err, RefError::Conflict { .. }));
    }

    #[test]
    fn nested_names_create_directories() {
        let (_dir, store) = open_store();
        store.update_ref("backups/laptop", id(7), None).unwrap();
        assert_eq!(store.read_ref("backups/laptop").unwrap(), Some(id(7)));
    }

    #[test]
    fn invalid_name_is_rejected_before_io() {
        let (_dir, store) = open_store();
        let err = store.update_ref("../escape", id(1), None).unwrap_err();
        assert!(matches!(err, RefError::InvalidName { .. }));
    }

    #[test]
    fn corrupt_ref_file_is_reported() {
        let (_dir, store) = open_store();
        fs::write(store.root().join("broken"), b"not hex at all\n").unwrap();
        let err = store.read_ref("broken").unwrap_err();
        assert!(matches!(err, RefError::Corrupt { .. }));
    }

    #[test]
    fn concurrent_updates_with_same_expected_admit_exactly_one() {
        use std::sync::Barrier;

        let (_dir, store) = open_store();
        store.update_ref("main", id(0), None).unwrap();

        for round in 0..50u8 {
            let current = store.read_ref("main").unwrap();
            let a = id(round.wrapping_mul(2).wrapping_add(1));
            let b = id(round.wrapping_mul(2).wrapping_add(2));
            let barrier = Barrier::new(2);

            let (res_a, res_b) = std::thread::scope(|scope| {
                let ta = scope.spawn(|| {
                    barrier.wait();
                    store.update_ref("main", a, current)
                });
                let tb = scope.spawn(|| {
                    barrier.wait();
                    store.update_ref("main", b, current)
                });
                (ta.join().unwrap(), tb.join().unwrap())
            });

            let a_won = res_a.is_ok();
            let winners = usize::from(a_won) + usize::from(res_b.is_ok());
            assert_eq!(winners, 1, "round {round}: both swaps passed the check");
            let loser = if a_won { res_b } else { res_a };
            assert!(matches!(loser, Err(RefError::Conflict { .. })));
            let final_target = if a_won { a } else { b };
            assert_eq!(store.read_ref("main").unwrap(), Some(final_target));
        }
    }

    #[test]
    fn update_leaves_no_lock_file_behind() {
        let (_dir, store) = open_store();
        store.update_ref("main", id(1), None).unwrap();
        assert!(!store.root().join("main.lock").exists());
        let refs = store.list_refs().unwrap();
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn list_refs_is_sorted_and_recursive() {
        let (_dir, store) = open_store();
        store.update_ref("zeta", id(3), None).unwrap();
        store.update_ref("backups/laptop", id(1), None).unwrap();
        store.update_ref("backups/desktop", id(2), None).unwrap();
        let refs = store.list_refs().unwrap();
        let names: Vec<&str> = refs.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["backups/desktop", "backups/laptop", "zeta"]);
    }
}
