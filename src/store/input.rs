use crate::error::{Error, Result};
use crate::utils::{decode_varint, decode_varint_u64};
use std::fmt;
use std::sync::Arc;

/// Immutable backing bytes of one file.
pub type FileBytes = Arc<dyn AsRef<[u8]> + Send + Sync>;

/// Random-access cursor over a single index file.
///
/// Cloning is cheap and yields a cursor with its own position over the same
/// bytes, so every enumerator can own an independent view of a shared file.
#[derive(Clone)]
pub struct IndexInput {
    name: Arc<str>,
    data: FileBytes,
    pos: usize,
}

impl fmt::Debug for IndexInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexInput")
            .field("name", &self.name)
            .field("len", &self.len())
            .field("pos", &self.pos)
            .finish()
    }
}

impl IndexInput {
    pub fn new(name: impl Into<Arc<str>>, data: FileBytes) -> Self {
        Self {
            name: name.into(),
            data,
            pos: 0,
        }
    }

    /// Wrap an owned buffer.
    pub fn from_vec(name: impl Into<Arc<str>>, bytes: Vec<u8>) -> Self {
        Self::new(name, Arc::new(bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn bytes(&self) -> &[u8] {
        AsRef::<[u8]>::as_ref(&*self.data)
    }

    pub fn len(&self) -> u64 {
        self.bytes().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }

    #[inline]
    pub fn file_pointer(&self) -> u64 {
        self.pos as u64
    }

    /// Move to an absolute offset. Seeking to the very end is allowed.
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        if pos > self.len() {
            return Err(Error::eof(format!(
                "seek to {pos} beyond end ({}) of {}",
                self.len(),
                self.name
            )));
        }
        self.pos = pos as usize;
        Ok(())
    }

    pub fn skip_bytes(&mut self, count: u64) -> Result<()> {
        self.seek(self.file_pointer() + count)
    }

    #[inline]
    pub fn read_byte(&mut self) -> Result<u8> {
        match self.bytes().get(self.pos) {
            Some(&b) => {
                self.pos += 1;
                Ok(b)
            }
            None => Err(self.eof()),
        }
    }

    pub fn read_bytes(&mut self, out: &mut [u8]) -> Result<()> {
        let end = self.pos + out.len();
        match self.bytes().get(self.pos..end) {
            Some(src) => {
                out.copy_from_slice(src);
                self.pos = end;
                Ok(())
            }
            None => Err(self.eof()),
        }
    }

    /// Big-endian 32-bit integer
    pub fn read_int(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.read_bytes(&mut buf)?;
        Ok(i32::from_be_bytes(buf))
    }

    /// Big-endian 64-bit integer
    pub fn read_long(&mut self) -> Result<i64> {
        let mut buf = [0u8; 8];
        self.read_bytes(&mut buf)?;
        Ok(i64::from_be_bytes(buf))
    }

    pub fn read_vint(&mut self) -> Result<i32> {
        let rest = &self.bytes()[self.pos..];
        match decode_varint(rest) {
            Some((value, consumed)) => {
                self.pos += consumed;
                Ok(value as i32)
            }
            None if rest.len() < 5 && rest.iter().all(|b| b & 0x80 != 0) => Err(self.eof()),
            None => Err(Error::corrupt(
                self.name.to_string(),
                format!("invalid vInt at offset {}", self.pos),
            )),
        }
    }

    pub fn read_vlong(&mut self) -> Result<i64> {
        let rest = &self.bytes()[self.pos..];
        match decode_varint_u64(rest) {
            Some((value, consumed)) => {
                self.pos += consumed;
                Ok(value as i64)
            }
            None if rest.len() < 10 && rest.iter().all(|b| b & 0x80 != 0) => Err(self.eof()),
            None => Err(Error::corrupt(
                self.name.to_string(),
                format!("invalid vLong at offset {}", self.pos),
            )),
        }
    }

    /// A vint length followed by that many bytes.
    pub fn read_string_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_vint()?;
        if len < 0 {
            return Err(Error::corrupt(
                self.name.to_string(),
                format!("negative string length {len}"),
            ));
        }
        let mut buf = vec![0u8; len as usize];
        self.read_bytes(&mut buf)?;
        Ok(buf)
    }

    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_string_bytes()?;
        String::from_utf8(bytes)
            .map_err(|_| Error::corrupt(self.name.to_string(), "string is not valid UTF-8"))
    }

    fn eof(&self) -> Error {
        Error::eof(format!("{} (pos {}, len {})", self.name, self.pos, self.len()))
    }
}
