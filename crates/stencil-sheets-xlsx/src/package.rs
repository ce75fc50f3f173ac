//! In-memory OOXML package
//!
//! The whole ZIP container is unpacked into memory, text parts are edited
//! by path, and everything is re-packed in the original entry order.
//! Entries that are never touched are written back byte-for-byte.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use crate::error::{XlsxError, XlsxResult};

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    data: Vec<u8>,
    is_dir: bool,
    stored: bool,
}

/// An unpacked `.xlsx` container
#[derive(Debug, Clone, Default)]
pub struct Package {
    entries: Vec<Entry>,
}

impl Package {
    /// Unpack a package from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> XlsxResult<Self> {
        if bytes.is_empty() {
            return Err(XlsxError::InvalidFormat("template is empty".into()));
        }

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push(Entry {
                name: file.name().to_string(),
                data,
                is_dir: file.is_dir(),
                stored: file.compression() == CompressionMethod::Stored,
            });
        }

        Ok(Self { entries })
    }

    /// Entry names matching `pattern`, in archive order.
    ///
    /// `*` matches any run of characters other than `/`; everything else
    /// matches literally.
    pub fn list_entries(&self, pattern: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| !e.is_dir && glob_match(pattern, &e.name))
            .map(|e| e.name.clone())
            .collect()
    }

    /// Whether an entry named `path` exists
    pub fn contains(&self, path: &str) -> bool {
        self.entry(path).is_some()
    }

    /// Raw bytes of an entry
    pub fn read_bytes(&self, path: &str) -> XlsxResult<&[u8]> {
        self.entry(path)
            .map(|e| e.data.as_slice())
            .ok_or_else(|| XlsxError::MissingPart(path.to_string()))
    }

    /// Text of an entry
    pub fn read_text(&self, path: &str) -> XlsxResult<String> {
        let bytes = self.read_bytes(path)?;
        // Tolerate a UTF-8 byte order mark
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        String::from_utf8(bytes.to_vec()).map_err(|_| XlsxError::NotUtf8(path.to_string()))
    }

    /// Replace an entry's content, or add a new entry at the end
    pub fn write_text(&mut self, path: &str, text: &str) {
        match self.entries.iter_mut().find(|e| e.name == path) {
            Some(entry) => entry.data = text.as_bytes().to_vec(),
            None => self.entries.push(Entry {
                name: path.to_string(),
                data: text.as_bytes().to_vec(),
                is_dir: false,
                stored: false,
            }),
        }
    }

    /// Re-pack into ZIP bytes
    pub fn finalize(self) -> XlsxResult<Vec<u8>> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));

        for entry in self.entries {
            let method = if entry.stored {
                CompressionMethod::Stored
            } else {
                CompressionMethod::Deflated
            };
            let options = SimpleFileOptions::default().compression_method(method);

            if entry.is_dir {
                zip.add_directory(entry.name, options)?;
            } else {
                zip.start_file(entry.name, options)?;
                zip.write_all(&entry.data)?;
            }
        }

        Ok(zip.finish()?.into_inner())
    }

    fn entry(&self, path: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == path)
    }
}

fn glob_match(pattern: &str, name: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == name,
        Some((literal, rest)) => {
            let Some(tail) = name.strip_prefix(literal) else {
                return false;
            };
            // Try every split of `tail` that keeps the starred part free of `/`
            for (i, c) in tail.char_indices() {
                if glob_match(rest, &tail[i..]) {
                    return true;
                }
                if c == '/' {
                    return false;
                }
            }
            glob_match(rest, "")
        }
    }
}
