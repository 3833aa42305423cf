//! Catalog store: one working SQLite file per instance.
//!
//! Every operation takes the instance lock, opens a short-lived connection,
//! runs, and closes the connection before the lock is released. Connections
//! never outlive a single call.

mod schema;
pub mod collections;
pub mod filter;
pub mod items;
pub mod queries;
pub mod tags;

use rusqlite::{Connection, OpenFlags};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

use crate::error::{CatalogError, Result};

pub use collections::Collection;
pub use filter::{filter_from_str, Filter, Predicate, SortMode};
pub use items::MediaItem;
pub use schema::{SCHEMA, SENTINEL_TAG_ID, SENTINEL_TAG_NAME, TABLES};

/// Entry name of the catalog inside a packaged organizer archive.
pub const ORGANIZER_DATABASE_NAME: &str = "organizer.db";

/// Extension of private working files.
pub const WORKING_FILE_EXTENSION: &str = "tempdb";

/// Side files SQLite may leave next to the working file.
const SIDE_FILE_SUFFIXES: [&str; 3] = ["-journal", "-wal", "-shm"];

pub struct Catalog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl Catalog {
    /// Open a catalog whose working file lives in the system temp directory.
    ///
    /// If `seed` is supplied, its bytes are written to the working file
    /// (replacing any previous content) before anything else touches it.
    pub fn open(name_hint: &str, seed: Option<&[u8]>) -> Result<Self> {
        Self::open_in(&std::env::temp_dir(), name_hint, seed)
    }

    /// Like [`Catalog::open`], with an explicit directory for the working file.
    pub fn open_in(dir: &Path, name_hint: &str, seed: Option<&[u8]>) -> Result<Self> {
        let path = working_path(dir, name_hint)?;

        if let Some(bytes) = seed {
            fs::create_dir_all(dir).map_err(|e| CatalogError::io(dir, e))?;
            fs::write(&path, bytes).map_err(|e| CatalogError::io(&path, e))?;
            info!("Catalog seeded at {:?} ({} bytes)", path, bytes.len());
        }

        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    /// Open and immediately initialize a fresh catalog in the temp directory.
    pub fn create(name_hint: &str) -> Result<Self> {
        let catalog = Self::open(name_hint, None)?;
        catalog.initialize_schema()?;
        Ok(catalog)
    }

    pub fn create_in(dir: &Path, name_hint: &str) -> Result<Self> {
        let catalog = Self::open_in(dir, name_hint, None)?;
        catalog.initialize_schema()?;
        Ok(catalog)
    }

    pub fn working_path(&self) -> &Path {
        &self.path
    }

    /// Create the schema from scratch. Destroys any existing working file.
    pub fn initialize_schema(&self) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.remove_files()?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
        }

        let create = || -> rusqlite::Result<()> {
            let mut conn = Connection::open(&self.path)?;
            let tx = conn.transaction()?;
            tx.execute_batch(SCHEMA)?;
            tx.commit()
        };

        create().map_err(|e| {
            warn!(operation = "initialize_schema", error = %e, "catalog operation failed");
            CatalogError::Schema(e.to_string())
        })?;

        info!("Catalog schema created at {:?}", self.path);
        Ok(())
    }

    /// Release the working file. Calling this when no file exists is a no-op.
    pub fn discard(&self) -> Result<()> {
        // Waiting on the lock guarantees no connection is open.
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.remove_files()?;
        info!("Catalog discarded at {:?}", self.path);
        Ok(())
    }

    /// Copy of the working file, for the caller to package as
    /// [`ORGANIZER_DATABASE_NAME`].
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        fs::read(&self.path).map_err(|e| CatalogError::io(&self.path, e))
    }

    /// Run `op` against a fresh connection while holding the instance lock.
    ///
    /// All failures pass through here, so they are logged once and reach the
    /// caller as a [`CatalogError`].
    pub(crate) fn with_connection<T>(
        &self,
        operation: &'static str,
        op: impl FnOnce(&mut Connection) -> Result<T>,
    ) -> Result<T> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let result = self.connect().and_then(|mut conn| {
            let result = op(&mut conn);
            drop(conn);
            result
        });

        if let Err(ref e) = result {
            warn!(operation, error = %e, "catalog operation failed");
        }
        result
    }

    fn connect(&self) -> Result<Connection> {
        if !self.path.exists() {
            return Err(CatalogError::Schema(format!(
                "catalog not initialized at {}",
                self.path.display()
            )));
        }
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        Ok(Connection::open_with_flags(&self.path, flags)?)
    }

    fn remove_files(&self) -> Result<()> {
        remove_if_present(&self.path)?;
        for suffix in SIDE_FILE_SUFFIXES {
            let mut side = self.path.clone().into_os_string();
            side.push(suffix);
            remove_if_present(Path::new(&side))?;
        }
        Ok(())
    }
}

fn working_path(dir: &Path, name_hint: &str) -> Result<PathBuf> {
    let name = Path::new(name_hint)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            CatalogError::io(
                dir,
                io::Error::new(io::ErrorKind::InvalidInput, "empty catalog name"),
            )
        })?;
    Ok(dir.join(format!("{}.{}", name, WORKING_FILE_EXTENSION)))
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CatalogError::io(path, e)),
    }
}
