//! File-backed page revision store.
//!
//! Every page lives in one of three directories under the storage root:
//!
//! - `pages/<name>`: live content
//! - `old/<name>.<N>`: history revision `N` of a live page
//! - `deleted/<name>` and `deleted/<name>.<N>`: a trashed page and its history
//!
//! Each operation is a sequence of renames. A single rename is atomic, the
//! sequence is not: concurrent `save`/`delete`/`restore` calls against the
//! same page name race and must be serialized by the caller (one lock per
//! name is enough). Reads may run concurrently with each other.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use tempfile::NamedTempFile;
use time::OffsetDateTime;

use crate::config::Config;
use crate::errors::{WikiError, WikiResult};
use crate::types::{RevisionInfo, TrashedPage, Version};
use crate::utils::is_valid_name;

/// Upper bound on revision numbers probed or assigned for one page.
pub const MAX_VERSIONS: u32 = 10_000;

const PAGES_DIR: &str = "pages";
const HISTORY_DIR: &str = "old";
const TRASH_DIR: &str = "deleted";

/// Owns all file-level state transitions for wiki pages
#[derive(Debug, Clone)]
pub struct RevisionStore {
    pages_dir: PathBuf,
    history_dir: PathBuf,
    trash_dir: PathBuf,
    home_page: String,
}

impl RevisionStore {
    /// Open the store described by `config`, creating its directories if needed
    pub fn open(config: &Config) -> WikiResult<Self> {
        Self::new(&config.root_dir, &config.home_page)
    }

    pub fn new(root: impl AsRef<Path>, home_page: &str) -> WikiResult<Self> {
        let root = root.as_ref();
        let store = Self {
            pages_dir: root.join(PAGES_DIR),
            history_dir: root.join(HISTORY_DIR),
            trash_dir: root.join(TRASH_DIR),
            home_page: home_page.to_string(),
        };
        for dir in [&store.pages_dir, &store.history_dir, &store.trash_dir] {
            fs::create_dir_all(dir).map_err(|e| {
                error!("Failed to create storage directory {:?}: {}", dir, e);
                WikiError::Io(e)
            })?;
        }
        info!("Opened revision store at {:?} (home page: {})", root, home_page);
        Ok(store)
    }

    pub fn home_page(&self) -> &str {
        &self.home_page
    }

    /// Read the content stored for `name` at `version`
    pub fn read(&self, name: &str, version: Version) -> WikiResult<Vec<u8>> {
        validate(name)?;
        let path = self.version_path(name, version);
        debug!("Reading {} of {} from {:?}", version, name, path);
        fs::read(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                debug!("No {} stored for {}", version, name);
                WikiError::NotFound
            } else {
                error!("Failed to read {:?}: {}", path, e);
                WikiError::Io(e)
            }
        })
    }

    /// Non-throwing existence probe; invalid names never exist
    pub fn exists(&self, name: &str, version: Version) -> bool {
        is_valid_name(name) && self.version_path(name, version).is_file()
    }

    /// Modification time of the addressed revision
    pub fn last_modified(&self, name: &str, version: Version) -> WikiResult<OffsetDateTime> {
        validate(name)?;
        modified_time(&self.version_path(name, version))
    }

    /// Store `content` as the live page, archiving the previous content first.
    ///
    /// Saving unchanged content is a no-op. Returns the page's redirect path.
    pub fn save(&self, name: &str, content: &[u8]) -> WikiResult<String> {
        validate(name)?;
        let live = self.live_path(name);

        let previous = match fs::read(&live) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                error!("Failed to read live page {:?}: {}", live, e);
                return Err(WikiError::Io(e));
            }
        };

        match previous {
            Some(ref bytes) if bytes.as_slice() == content => {
                debug!("Content of {} unchanged, nothing to save", name);
                return Ok(self.page_url(name));
            }
            Some(bytes) => {
                let number = self.next_free_number(&self.history_dir, name)?;
                self.write_new_file(&self.history_path(name, number), &bytes)?;
                info!("Archived previous content of {} as revision {}", name, number);
            }
            None => debug!("First save of {}", name),
        }

        self.replace_live(&live, content)?;
        info!("Saved {} ({} bytes)", name, content.len());
        Ok(self.page_url(name))
    }

    /// Move a live page and its history into the trash.
    ///
    /// An earlier trashed copy of the same name is folded into the trash's
    /// numbered sequence first: its content takes the number after the
    /// highest one in use and the page being deleted continues from there.
    pub fn delete(&self, name: &str) -> WikiResult<String> {
        validate(name)?;
        if name == self.home_page {
            warn!("Refusing to delete home page {}", name);
            return Err(WikiError::Forbidden(format!("the home page {} cannot be deleted", name)));
        }
        let live = self.live_path(name);
        if !live.is_file() {
            return Err(WikiError::NotFound);
        }

        let trash_current = self.trash_path(name);
        let history = self.numbered_entries(&self.history_dir, name)?;
        let mut next = self
            .numbered_entries(&self.trash_dir, name)?
            .last()
            .map_or(1, |highest| highest + 1);

        let needed = history.len() as u32 + u32::from(trash_current.is_file());
        if next + needed > MAX_VERSIONS {
            return Err(self.exhausted(name));
        }

        if trash_current.is_file() {
            rename(&trash_current, &self.trash_revision_path(name, next))?;
            info!("Renumbered earlier trashed {} to trash revision {}", name, next);
            next += 1;
        }
        for number in history {
            rename(&self.history_path(name, number), &self.trash_revision_path(name, next))?;
            next += 1;
        }
        rename(&live, &trash_current)?;

        info!("Deleted {} (trash now holds {} revisions)", name, next - 1);
        Ok("/".to_string())
    }

    /// Bring the most recently trashed copy of `name` back.
    ///
    /// Trashed revisions take the lowest history numbers and any history the
    /// page accrued after being recreated is shifted above them. If a page
    /// was recreated under the same name it stays live; the trashed content
    /// becomes revision `n` and the returned redirect points at its editor
    /// so the caller decides which content wins.
    pub fn restore(&self, name: &str) -> WikiResult<String> {
        validate(name)?;
        let trash_current = self.trash_path(name);
        if !trash_current.is_file() {
            return Err(WikiError::NotFound);
        }

        let trashed = self.numbered_entries(&self.trash_dir, name)?;
        let live_present = self.live_path(name).is_file();
        let mut n = trashed.len() as u32;
        if live_present {
            n += 1;
        }

        let existing = self.numbered_entries(&self.history_dir, name)?;
        let top = existing.last().map_or(n, |&highest| highest + n);
        if top >= MAX_VERSIONS {
            return Err(self.exhausted(name));
        }

        if n > 0 {
            // highest first so no rename lands on a slot still occupied
            for &number in existing.iter().rev() {
                rename(&self.history_path(name, number), &self.history_path(name, number + n))?;
            }
            debug!("Shifted {} history revisions of {} up by {}", existing.len(), name, n);
        }

        for (slot, &number) in (1..).zip(trashed.iter()) {
            rename(&self.trash_revision_path(name, number), &self.history_path(name, slot))?;
        }

        if live_present {
            rename(&trash_current, &self.history_path(name, n))?;
            info!("Restored {} beside a recreated page; trashed content is revision {}", name, n);
            return Ok(format!("/edit/{}?ver={}", name, n));
        }

        rename(&trash_current, &self.live_path(name))?;
        info!("Restored {} with {} history revisions", name, trashed.len());
        Ok(self.page_url(name))
    }

    /// Names of all live pages, sorted
    pub fn list_live(&self) -> WikiResult<Vec<String>> {
        let mut names: Vec<String> = list_file_names(&self.pages_dir)?
            .into_iter()
            .filter(|n| is_valid_name(n))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Trashed pages with their last modification time, sorted by name.
    ///
    /// Deleting renames the file, so this is the time of the last edit
    /// before the delete, not the time of the delete.
    pub fn list_trashed(&self) -> WikiResult<Vec<TrashedPage>> {
        let mut pages = Vec::new();
        for name in list_file_names(&self.trash_dir)? {
            if !is_valid_name(&name) {
                continue;
            }
            let modified = modified_time(&self.trash_path(&name))?;
            pages.push(TrashedPage { name, modified });
        }
        pages.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(pages)
    }

    /// History of a live page, most recent revision first
    pub fn list_revisions(&self, name: &str) -> WikiResult<Vec<RevisionInfo>> {
        validate(name)?;
        if !self.live_path(name).is_file() {
            return Err(WikiError::NotFound);
        }
        let mut revisions = Vec::new();
        for number in self.numbered_entries(&self.history_dir, name)?.into_iter().rev() {
            let modified = modified_time(&self.history_path(name, number))?;
            revisions.push(RevisionInfo { number, modified });
        }
        Ok(revisions)
    }

    fn page_url(&self, name: &str) -> String {
        if name == self.home_page {
            "/".to_string()
        } else {
            format!("/{}", name)
        }
    }

    fn live_path(&self, name: &str) -> PathBuf {
        self.pages_dir.join(name)
    }

    fn history_path(&self, name: &str, number: u32) -> PathBuf {
        self.history_dir.join(format!("{}.{}", name, number))
    }

    fn trash_path(&self, name: &str) -> PathBuf {
        self.trash_dir.join(name)
    }

    fn trash_revision_path(&self, name: &str, number: u32) -> PathBuf {
        self.trash_dir.join(format!("{}.{}", name, number))
    }

    fn version_path(&self, name: &str, version: Version) -> PathBuf {
        match version {
            Version::Live | Version::Revision(0) => self.live_path(name),
            Version::Revision(n) => self.history_path(name, n),
        }
    }

    /// Revision numbers present for `name` in `dir`, ascending
    fn numbered_entries(&self, dir: &Path, name: &str) -> WikiResult<Vec<u32>> {
        let mut numbers: Vec<u32> = list_file_names(dir)?
            .iter()
            .filter_map(|file| file.strip_prefix(name)?.strip_prefix('.')?.parse::<u32>().ok())
            .filter(|&n| n > 0)
            .collect();
        numbers.sort_unstable();
        Ok(numbers)
    }

    /// First unused revision number, scanning upward from 1
    fn next_free_number(&self, dir: &Path, name: &str) -> WikiResult<u32> {
        (1..MAX_VERSIONS)
            .find(|&n| !dir.join(format!("{}.{}", name, n)).exists())
            .ok_or_else(|| self.exhausted(name))
    }

    fn exhausted(&self, name: &str) -> WikiError {
        error!("Ran out of version numbers for {}", name);
        WikiError::VersionSpaceExhausted { name: name.to_string() }
    }

    fn write_new_file(&self, path: &Path, content: &[u8]) -> WikiResult<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| {
                error!("Failed to create {:?}: {}", path, e);
                WikiError::Io(e)
            })?;
        file.write_all(content)?;
        file.sync_all()?;
        Ok(())
    }

    fn replace_live(&self, live: &Path, content: &[u8]) -> WikiResult<()> {
        let mut tmp = NamedTempFile::new_in(&self.pages_dir)?;
        tmp.write_all(content)?;
        tmp.as_file().sync_all()?;
        tmp.persist(live).map_err(|e| {
            error!("Failed to replace live page {:?}: {}", live, e.error);
            WikiError::Io(e.error)
        })?;
        Ok(())
    }
}

fn validate(name: &str) -> WikiResult<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        warn!("Rejected invalid page name {:?}", name);
        Err(WikiError::InvalidName(name.to_string()))
    }
}

fn rename(from: &Path, to: &Path) -> WikiResult<()> {
    debug!("Renaming {:?} -> {:?}", from, to);
    fs::rename(from, to).map_err(|e| {
        error!("Failed to rename {:?} to {:?}: {}", from, to, e);
        WikiError::Io(e)
    })
}

fn modified_time(path: &Path) -> WikiResult<OffsetDateTime> {
    let metadata = fs::metadata(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            WikiError::NotFound
        } else {
            WikiError::Io(e)
        }
    })?;
    Ok(OffsetDateTime::from(metadata.modified()?))
}

fn list_file_names(dir: &Path) -> WikiResult<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        error!("Failed to read directory {:?}: {}", dir, e);
        WikiError::Io(e)
    })?;

    let mut names = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => {
                if entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                    names.push(entry.file_name().to_string_lossy().to_string());
                }
            }
            Err(e) => warn!("Failed to read directory entry in {:?}: {}", dir, e),
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, RevisionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RevisionStore::new(dir.path(), "home").unwrap();
        (dir, store)
    }

    #[test]
    fn numbered_entries_sort_numerically_and_ignore_other_pages() {
        let (dir, store) = store();
        for file in ["Foo.1", "Foo.10", "Foo.2", "FooBar.3", "Foo.x", "Foo.0", "Foo"] {
            fs::write(dir.path().join(HISTORY_DIR).join(file), b"x").unwrap();
        }
        assert_eq!(store.numbered_entries(&store.history_dir, "Foo").unwrap(), vec![1, 2, 10]);
    }

    #[test]
    fn next_free_number_finds_first_gap() {
        let (dir, store) = store();
        for file in ["Foo.1", "Foo.3"] {
            fs::write(dir.path().join(HISTORY_DIR).join(file), b"x").unwrap();
        }
        assert_eq!(store.next_free_number(&store.history_dir, "Foo").unwrap(), 2);
        assert_eq!(store.next_free_number(&store.history_dir, "Bar").unwrap(), 1);
    }

    #[test]
    fn restore_refuses_to_overflow_version_space() {
        let (dir, store) = store();
        fs::write(dir.path().join(TRASH_DIR).join("Foo"), b"old").unwrap();
        fs::write(dir.path().join(TRASH_DIR).join("Foo.1"), b"older").unwrap();
        fs::write(dir.path().join(PAGES_DIR).join("Foo"), b"new").unwrap();
        fs::write(dir.path().join(HISTORY_DIR).join(format!("Foo.{}", MAX_VERSIONS - 1)), b"x").unwrap();

        let err = store.restore("Foo").unwrap_err();
        assert!(matches!(err, WikiError::VersionSpaceExhausted { .. }));
        // nothing moved
        assert!(dir.path().join(TRASH_DIR).join("Foo.1").is_file());
        assert!(dir.path().join(TRASH_DIR).join("Foo").is_file());
    }

    #[test]
    fn save_refuses_when_history_is_full() {
        let (dir, store) = store();
        fs::write(dir.path().join(PAGES_DIR).join("Foo"), b"live").unwrap();
        for n in 1..MAX_VERSIONS {
            fs::write(dir.path().join(HISTORY_DIR).join(format!("Foo.{}", n)), b"x").unwrap();
        }

        let err = store.save("Foo", b"changed").unwrap_err();
        assert!(matches!(err, WikiError::VersionSpaceExhausted { .. }));
        assert_eq!(store.read("Foo", Version::Live).unwrap(), b"live");
        assert!(!dir.path().join(HISTORY_DIR).join(format!("Foo.{}", MAX_VERSIONS)).exists());
    }

    #[test]
    fn delete_refuses_to_overflow_trash_numbers() {
        let (dir, store) = store();
        let trash = dir.path().join(TRASH_DIR);
        fs::write(dir.path().join(PAGES_DIR).join("Foo"), b"live").unwrap();
        fs::write(trash.join("Foo"), b"trashed").unwrap();
        fs::write(trash.join(format!("Foo.{}", MAX_VERSIONS - 1)), b"x").unwrap();

        let err = store.delete("Foo").unwrap_err();
        assert!(matches!(err, WikiError::VersionSpaceExhausted { .. }));
        // nothing moved
        assert_eq!(fs::read(dir.path().join(PAGES_DIR).join("Foo")).unwrap(), b"live");
        assert_eq!(fs::read(trash.join("Foo")).unwrap(), b"trashed");
        assert!(!trash.join(format!("Foo.{}", MAX_VERSIONS)).exists());
    }

    #[test]
    fn revision_zero_addresses_live_content() {
        let (_dir, store) = store();
        store.save("Foo", b"one").unwrap();
        store.save("Foo", b"two").unwrap();
        assert_eq!(store.read("Foo", Version::Revision(0)).unwrap(), b"two");
        assert!(store.exists("Foo", Version::Revision(0)));
    }

    #[test]
    fn temp_files_are_not_listed() {
        let (dir, store) = store();
        store.save("Foo", b"a").unwrap();
        fs::write(dir.path().join(PAGES_DIR).join(".tmpXYZ"), b"partial").unwrap();
        assert_eq!(store.list_live().unwrap(), vec!["Foo".to_string()]);
    }
}
