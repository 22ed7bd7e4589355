// src/session/state.rs
use super::paths::{session_dir_name, snapshot_file_name};
use crate::error::AppError;
use crate::model::Item;
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use url::Url;

/// One crawl run's isolated output directory and in-memory state.
///
/// The snapshot counter and the pending-item buffer sit behind one lock.
/// Nothing outside this type touches either; callers get three
/// operations: take a snapshot name, append an item, drain the buffer.
#[derive(Debug)]
pub struct Session {
    data_path: PathBuf,
    state: Mutex<SessionState>,
}

#[derive(Debug, Default)]
struct SessionState {
    file_num: u64,
    items: Vec<Item>,
}

impl Session {
    /// Creates a session directory under `root`, named after the current time.
    ///
    /// `root` must already exist; it is never created here.
    pub fn create(root: &Path) -> Result<Self, AppError> {
        Self::create_at(root, &Local::now())
    }

    /// Like [`Session::create`] with an explicit start time.
    pub fn create_at(root: &Path, started_at: &DateTime<Local>) -> Result<Self, AppError> {
        let metadata = std::fs::metadata(root).map_err(|source| AppError::DataRootUnavailable {
            path: root.to_path_buf(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(AppError::DataRootUnavailable {
                path: root.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "data root is not a directory",
                ),
            });
        }

        let data_path = root.join(session_dir_name(started_at));
        std::fs::create_dir(&data_path).map_err(|source| AppError::SessionDirectory {
            path: data_path.clone(),
            source,
        })?;

        log::info!("Data folder is: {}", data_path.display());

        Ok(Self {
            data_path,
            state: Mutex::new(SessionState::default()),
        })
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Reserves the next snapshot file for a response to `url`.
    ///
    /// Every call returns a distinct path for the lifetime of the session.
    pub fn snapshot_path(&self, url: &Url) -> PathBuf {
        let file_num = {
            let mut state = self.state.lock();
            state.file_num += 1;
            state.file_num
        };
        self.data_path.join(snapshot_file_name(url, file_num))
    }

    /// Queues an item for the next flush.
    pub fn append_item(&self, item: Item) {
        self.state.lock().items.push(item);
    }

    /// Takes every pending item, leaving the buffer empty.
    pub fn drain(&self) -> Vec<Item> {
        std::mem::take(&mut self.state.lock().items)
    }

    /// Number of items waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.state.lock().items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn started_at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2023, 5, 14, 9, 30, 12).unwrap()
    }

    #[test]
    fn creates_a_timestamped_directory() {
        let root = tempfile::tempdir().unwrap();
        let session = Session::create_at(root.path(), &started_at()).unwrap();

        assert_eq!(session.data_path(), root.path().join("2023-05-14_093012"));
        assert!(session.data_path().is_dir());
    }

    #[test]
    fn missing_root_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("nope");

        let err = Session::create(&missing).unwrap_err();
        assert!(matches!(err, AppError::DataRootUnavailable { .. }));
        assert!(!missing.exists());
    }

    #[test]
    fn same_second_sessions_collide() {
        let root = tempfile::tempdir().unwrap();
        Session::create_at(root.path(), &started_at()).unwrap();

        let err = Session::create_at(root.path(), &started_at()).unwrap_err();
        assert!(matches!(err, AppError::SessionDirectory { .. }));
    }

    #[test]
    fn drain_takes_everything_once() {
        let root = tempfile::tempdir().unwrap();
        let session = Session::create_at(root.path(), &started_at()).unwrap();

        for i in 0..3 {
            session.append_item(Item {
                product_id: i.to_string(),
                ..Default::default()
            });
        }
        assert_eq!(session.pending(), 3);

        let drained = session.drain();
        let ids: Vec<_> = drained.iter().map(|i| i.product_id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
        assert!(session.drain().is_empty());
    }

    #[test]
    fn concurrent_snapshot_names_never_collide() {
        let root = tempfile::tempdir().unwrap();
        let session = Arc::new(Session::create_at(root.path(), &started_at()).unwrap());
        let url = Url::parse("https://hobbygames.ru/catalog-all?page=1").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let session = Arc::clone(&session);
                let url = url.clone();
                std::thread::spawn(move || {
                    (0..250)
                        .map(|_| session.snapshot_path(&url))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut names = HashSet::new();
        for handle in handles {
            for path in handle.join().unwrap() {
                assert!(names.insert(path), "snapshot name handed out twice");
            }
        }
        assert_eq!(names.len(), 8 * 250);
    }
}
