// src/session/clean.rs
use crate::error::AppError;
use std::io::ErrorKind;
use std::path::Path;

/// Wipes the data root (every session and the response cache) and
/// recreates it empty.
///
/// An absent root is not an error; it is simply created.
pub fn clear_all_data(root: &Path) -> Result<(), AppError> {
    match std::fs::remove_dir_all(root) {
        Ok(()) => log::info!("Removed data folder {}", root.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!("Data folder {} did not exist", root.display());
        }
        Err(source) => {
            log::error!("Can't remove data folder {}: {}", root.display(), source);
            return Err(AppError::DataRootUnavailable {
                path: root.to_path_buf(),
                source,
            });
        }
    }

    std::fs::create_dir_all(root).map_err(|source| AppError::DataRootUnavailable {
        path: root.to_path_buf(),
        source,
    })?;
    log::info!("Created empty data folder {}", root.display());
    Ok(())
}
