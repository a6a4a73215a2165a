//! Memory-mapped table backend.
//!
//! A table is written once as one or more chunk files of raw little-endian
//! `u32` values (`<table>.<chunk>.u32`) and then read through `memmap2`.
//! The directory also holds a manifest with the sequence and bucket table,
//! so [`MappedEsa::open`](crate::esa::MappedEsa::open) can serve queries in
//! a later session.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::debug;

use super::{BuildTable, TableKind, TableStorage};
use crate::esa::buckets::PrefixBuckets;
use crate::esa::{persist, BuildConfig, EsaError};
use crate::genomics::Sequence;

/// Largest number of elements stored in a single mapped file.
pub const MAX_MAPPED_ELEMENTS: usize = 400_000_000;

const ELEMENT_BYTES: usize = std::mem::size_of::<u32>();

/// Table backed by read-only memory maps.
#[derive(Debug)]
pub struct MappedTable {
    kind: TableKind,
    chunks: Vec<Mmap>,
    chunk_elements: usize,
    len: usize,
}

impl MappedTable {
    /// Write `values` under `dir` in chunks of `chunk_elements` and map them.
    pub fn create(
        dir: &Path,
        kind: TableKind,
        values: &[u32],
        chunk_elements: usize,
    ) -> Result<Self, EsaError> {
        if chunk_elements == 0 {
            return Err(EsaError::Format("chunk size must be > 0".to_string()));
        }
        fs::create_dir_all(dir).map_err(|err| EsaError::io(dir, err))?;
        for (chunk, values) in values.chunks(chunk_elements).enumerate() {
            let path = chunk_path(dir, kind, chunk);
            let file = File::create(&path).map_err(|err| EsaError::io(&path, err))?;
            let mut writer = BufWriter::new(file);
            for value in values {
                writer
                    .write_all(&value.to_le_bytes())
                    .map_err(|err| EsaError::io(&path, err))?;
            }
            writer.flush().map_err(|err| EsaError::io(&path, err))?;
        }
        let mut stale = values.len().div_ceil(chunk_elements);
        loop {
            let path = chunk_path(dir, kind, stale);
            if !path.exists() {
                break;
            }
            fs::remove_file(&path).map_err(|err| EsaError::io(&path, err))?;
            stale += 1;
        }
        debug!(
            table = kind.name(),
            elements = values.len(),
            chunks = values.len().div_ceil(chunk_elements),
            "wrote mapped table"
        );
        Self::open(dir, kind)
    }

    /// Map the chunk files of table `kind` found under `dir`.
    pub fn open(dir: &Path, kind: TableKind) -> Result<Self, EsaError> {
        let mut chunks = Vec::new();
        loop {
            let path = chunk_path(dir, kind, chunks.len());
            if !path.exists() {
                break;
            }
            let file = File::open(&path).map_err(|err| EsaError::io(&path, err))?;
            // SAFETY: chunk files are written once before mapping and never
            // modified while an index holds them.
            let map = unsafe { Mmap::map(&file) }.map_err(|err| EsaError::io(&path, err))?;
            if map.is_empty() || map.len() % ELEMENT_BYTES != 0 {
                return Err(EsaError::Format(format!(
                    "{} has invalid size {}",
                    path.display(),
                    map.len()
                )));
            }
            chunks.push(map);
        }

        let Some(first) = chunks.first() else {
            return Err(EsaError::Format(format!(
                "no {} chunks under {}",
                kind.name(),
                dir.display()
            )));
        };
        let chunk_elements = first.len() / ELEMENT_BYTES;
        let mut len = 0;
        for (index, chunk) in chunks.iter().enumerate() {
            let elements = chunk.len() / ELEMENT_BYTES;
            let is_last = index + 1 == chunks.len();
            if elements > chunk_elements || (!is_last && elements != chunk_elements) {
                return Err(EsaError::Format(format!(
                    "{} chunk {index} holds {elements} elements, expected {chunk_elements}",
                    kind.name()
                )));
            }
            len += elements;
        }

        Ok(Self {
            kind,
            chunks,
            chunk_elements,
            len,
        })
    }

    /// Number of chunk files backing the table.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

impl TableStorage for MappedTable {
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn get(&self, index: usize) -> Result<usize, EsaError> {
        let chunk = self
            .chunks
            .get(index / self.chunk_elements)
            .ok_or_else(|| EsaError::corrupt(self.kind, index))?;
        let offset = (index % self.chunk_elements) * ELEMENT_BYTES;
        let bytes: [u8; ELEMENT_BYTES] = chunk
            .get(offset..offset + ELEMENT_BYTES)
            .and_then(|slice| slice.try_into().ok())
            .ok_or_else(|| EsaError::corrupt(self.kind, index))?;
        Ok(u32::from_le_bytes(bytes) as usize)
    }
}

impl BuildTable for MappedTable {
    fn from_values(kind: TableKind, values: Vec<u32>, config: &BuildConfig) -> Result<Self, EsaError> {
        let dir = config.mapped_dir.as_deref().ok_or_else(|| {
            EsaError::Format("memory-mapped tables need a mapped directory".to_string())
        })?;
        Self::create(dir, kind, &values, config.chunk_elements)
    }

    fn store_manifest(
        sequence: &Sequence,
        buckets: Option<&PrefixBuckets>,
        config: &BuildConfig,
    ) -> Result<(), EsaError> {
        let dir = config.mapped_dir.as_deref().ok_or_else(|| {
            EsaError::Format("memory-mapped tables need a mapped directory".to_string())
        })?;
        persist::write_manifest(dir, sequence, buckets)
    }
}

fn chunk_path(dir: &Path, kind: TableKind, chunk: usize) -> PathBuf {
    dir.join(format!("{}.{chunk:04}.u32", kind.name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_chunked_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let values: Vec<u32> = (0..23).map(|v| v * 7 + 1).collect();
        let table = MappedTable::create(dir.path(), TableKind::Suffix, &values, 5).unwrap();
        assert_eq!(table.chunk_count(), 5);
        assert_eq!(table.len(), values.len());
        assert_eq!(table.to_vec().unwrap(), values);
        assert!(table.get(values.len()).is_err());

        let reopened = MappedTable::open(dir.path(), TableKind::Suffix).unwrap();
        assert_eq!(reopened.get(22).unwrap(), 155);
    }

    #[test]
    fn missing_directory_configuration_is_rejected() {
        let err = MappedTable::from_values(TableKind::Lcp, vec![0, 0], &BuildConfig::default());
        assert!(matches!(err, Err(EsaError::Format(_))));
    }

    #[test]
    fn opening_absent_table_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(MappedTable::open(dir.path(), TableKind::Child).is_err());
    }
}
