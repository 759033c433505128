// Recent files and last used directories

use std::path::{Path, PathBuf};

use crate::keys::{key_for, Group, SettingsKey, KEY_RECENT_FILES};
use crate::store::SettingsStore;

/// Entries kept in the recent files list
pub const MAX_RECENT_FILES: usize = 5;

const RECENT_FILES: &SettingsKey = key_for(KEY_RECENT_FILES);

/// Most-recent-first list of opened files, backed by `Recent_files_list`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentFiles {
    files: Vec<String>,
}

impl RecentFiles {
    pub fn load(store: &SettingsStore) -> Self {
        let mut files = store.get_list(RECENT_FILES);
        files.truncate(MAX_RECENT_FILES);
        Self { files }
    }

    pub fn save(&self, store: &mut SettingsStore) {
        store.set(RECENT_FILES, self.files.clone());
    }

    /// Move `path` to the front, dropping duplicates and the oldest entries
    pub fn push(&mut self, path: &Path) {
        let entry = path.to_string_lossy().to_string();
        self.files.retain(|f| *f != entry);
        self.files.insert(0, entry);
        self.files.truncate(MAX_RECENT_FILES);
    }

    /// Drop an entry, e.g. after the file failed to open
    pub fn remove(&mut self, path: &Path) {
        let entry = path.to_string_lossy();
        self.files.retain(|f| *f != entry);
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Store the directory containing `path` under one of the `Recent_path_*` keys.
///
/// Returns false (and stores nothing) for keys outside the recent paths group
/// or for paths without a parent.
pub fn remember_dir(store: &mut SettingsStore, key: &SettingsKey, path: &Path) -> bool {
    if key.group != Group::RecentPaths || key.key == KEY_RECENT_FILES {
        return false;
    }
    let dir = if path.is_dir() { Some(path) } else { path.parent() };
    match dir {
        Some(dir) if !dir.as_os_str().is_empty() => {
            store.set(key, dir.to_string_lossy().to_string());
            true
        }
        _ => false,
    }
}

/// Last directory stored under `key`, if any
pub fn last_dir(store: &SettingsStore, key: &SettingsKey) -> Option<PathBuf> {
    store
        .get(key)
        .and_then(|v| v.as_text())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::find_by_name;

    #[test]
    fn test_push_orders_and_dedupes() {
        let mut recent = RecentFiles::default();
        recent.push(Path::new("/a.hdr"));
        recent.push(Path::new("/b.hdr"));
        recent.push(Path::new("/a.hdr"));
        assert_eq!(recent.files(), &["/a.hdr".to_string(), "/b.hdr".to_string()]);
    }

    #[test]
    fn test_push_caps_length() {
        let mut recent = RecentFiles::default();
        for i in 0..8 {
            recent.push(Path::new(&format!("/img{}.tif", i)));
        }
        assert_eq!(recent.files().len(), MAX_RECENT_FILES);
        assert_eq!(recent.files()[0], "/img7.tif");
        assert_eq!(recent.files()[4], "/img3.tif");
    }

    #[test]
    fn test_store_roundtrip() {
        let mut store = SettingsStore::new();
        let mut recent = RecentFiles::load(&store);
        assert!(recent.is_empty());

        recent.push(Path::new("/x.jpg"));
        recent.push(Path::new("/y.jpg"));
        recent.save(&mut store);

        let mut reloaded = RecentFiles::load(&store);
        assert_eq!(reloaded, recent);

        reloaded.remove(Path::new("/x.jpg"));
        assert_eq!(reloaded.files(), &["/y.jpg".to_string()]);
    }

    #[test]
    fn test_remember_dir() {
        let mut store = SettingsStore::new();
        let key = find_by_name("KEY_RECENT_PATH_SAVE_LDR").unwrap();

        assert!(remember_dir(&mut store, key, Path::new("/photos/out/result.jpg")));
        assert_eq!(last_dir(&store, key), Some(PathBuf::from("/photos/out")));

        // not a recent-path key
        let other = find_by_name("KEY_GUI_LANG").unwrap();
        assert!(!remember_dir(&mut store, other, Path::new("/photos/a.jpg")));
        assert!(!remember_dir(&mut store, RECENT_FILES, Path::new("/photos/a.jpg")));

        // bare file name has no directory to remember
        assert!(!remember_dir(&mut store, key, Path::new("result.jpg")));
    }
}
