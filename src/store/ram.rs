use super::{Directory, IndexInput};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Directory backed by in-memory buffers.
#[derive(Debug, Default)]
pub struct RamDirectory {
    files: RwLock<HashMap<String, Arc<Vec<u8>>>>,
}

impl RamDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn write_file(&self, name: impl Into<String>, bytes: Vec<u8>) {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.insert(name.into(), Arc::new(bytes));
    }

    pub fn file_names(&self) -> Vec<String> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = files.keys().cloned().collect();
        names.sort();
        names
    }

    fn get(&self, name: &str) -> Result<Arc<Vec<u8>>> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.get(name).cloned().ok_or_else(|| {
            Error::io(
                name.to_string(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            )
        })
    }
}

impl Directory for RamDirectory {
    fn open_input(&self, name: &str) -> Result<IndexInput> {
        Ok(IndexInput::new(name, self.get(name)?))
    }

    fn file_length(&self, name: &str) -> Result<u64> {
        Ok(self.get(name)?.len() as u64)
    }

    fn file_exists(&self, name: &str) -> bool {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.contains_key(name)
    }
}
