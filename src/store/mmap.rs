use super::{Directory, IndexInput};
use crate::error::{Error, Result};
use log::debug;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Directory whose files are memory-mapped on open.
#[derive(Debug, Clone)]
pub struct MmapDirectory {
    path: PathBuf,
}

impl MmapDirectory {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(Error::io(
                path.display().to_string(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            ));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Directory for MmapDirectory {
    fn open_input(&self, name: &str) -> Result<IndexInput> {
        let file_path = self.path.join(name);
        let file = File::open(&file_path)
            .map_err(|e| Error::io(file_path.display().to_string(), e))?;
        let len = file
            .metadata()
            .map_err(|e| Error::io(file_path.display().to_string(), e))?
            .len();

        // Zero-length files cannot be mapped on every platform
        if len == 0 {
            return Ok(IndexInput::from_vec(name, Vec::new()));
        }

        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|e| Error::io(file_path.display().to_string(), e))?;
        debug!("mapped {} ({} bytes)", file_path.display(), len);
        Ok(IndexInput::new(name, Arc::new(mmap)))
    }

    fn file_length(&self, name: &str) -> Result<u64> {
        let file_path = self.path.join(name);
        std::fs::metadata(&file_path)
            .map(|m| m.len())
            .map_err(|e| Error::io(file_path.display().to_string(), e))
    }

    fn file_exists(&self, name: &str) -> bool {
        self.path.join(name).is_file()
    }
}
