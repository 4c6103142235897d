use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::path::Path;

/// A unified reader over either a local file or an uploaded byte buffer
pub(crate) enum UnifiedReader {
    /// Local file reader
    Local(BufReader<File>),
    /// Uploaded content (in-memory buffer)
    Memory(Cursor<Vec<u8>>),
}

impl UnifiedReader {
    /// Opens a local file for reading.
    ///
    /// # Arguments
    /// * `path` - Path to the file
    pub(crate) fn open<P: AsRef<Path>>(path: P) -> std::io::Result<UnifiedReader> {
        let file = File::open(path)?;
        Ok(UnifiedReader::Local(BufReader::new(file)))
    }

    /// Wraps an uploaded byte buffer.
    pub(crate) fn from_bytes(bytes: Vec<u8>) -> UnifiedReader {
        UnifiedReader::Memory(Cursor::new(bytes))
    }

    /// Reads everything that is left into memory.
    pub(crate) fn into_bytes(self) -> std::io::Result<Vec<u8>> {
        match self {
            UnifiedReader::Local(mut reader) => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;
                Ok(bytes)
            }
            UnifiedReader::Memory(cursor) => {
                let position = cursor.position() as usize;
                let mut bytes = cursor.into_inner();
                bytes.drain(..position.min(bytes.len()));
                Ok(bytes)
            }
        }
    }
}

impl Read for UnifiedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            UnifiedReader::Local(reader) => reader.read(buf),
            UnifiedReader::Memory(reader) => reader.read(buf),
        }
    }
}

impl Seek for UnifiedReader {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        match self {
            UnifiedReader::Local(reader) => reader.seek(pos),
            UnifiedReader::Memory(reader) => reader.seek(pos),
        }
    }
}
