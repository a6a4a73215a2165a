//! Binary index files.
//!
//! A record is little-endian throughout:
//!
//! ```text
//! magic "ESAX" | version u32 | contig id u32 | length u64 | sequence bytes
//! suftab: (length + 1) x u32
//! lcptab, childtab: (length + 1) cells as i8 | overflow count u64 | (slot u32, value u32)*
//! bucket depth u32 | starts, ends: 4^depth x u32 each (only if depth > 0)
//! blake3 digest of everything above (32 bytes)
//! ```
//!
//! LCP and child tables are always stored compactly, whatever backend the
//! saved index used; loading yields a [`CompactEsa`].

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::{debug, info};

use super::buckets::PrefixBuckets;
use super::index::{CompactEsa, EnhancedSuffixArray};
use super::storage::compact::{CompactTable, OverflowMap};
use super::storage::{IntTable, TableKind, TableStorage};
use super::EsaError;
use crate::genomics::{Sequence, MAX_SEQUENCE_LEN};

/// Leading bytes of an index record.
pub const INDEX_MAGIC: [u8; 4] = *b"ESAX";

/// Leading bytes of the manifest stored beside memory-mapped tables.
pub const MANIFEST_MAGIC: [u8; 4] = *b"ESAM";

/// File name of that manifest inside the mapped directory.
pub const MANIFEST_FILE: &str = "manifest.esam";

/// Current record layout version.
pub const FORMAT_VERSION: u32 = 1;

const DIGEST_LEN: usize = blake3::OUT_LEN;
const IO_BUFFER_BYTES: usize = 1 << 16;

/// Write `esa` to a new file at `path`.
pub fn save<S: TableStorage, T: TableStorage>(
    esa: &EnhancedSuffixArray<S, T>,
    contig_id: u32,
    path: &Path,
) -> Result<(), EsaError> {
    let file = File::create(path).map_err(|err| EsaError::io(path, err))?;
    let mut writer = BufWriter::with_capacity(IO_BUFFER_BYTES, file);
    write_record(&mut writer, path, contig_id, esa)?;
    writer.flush().map_err(|err| EsaError::io(path, err))?;
    info!(path = %path.display(), contig_id, len = esa.len(), "index saved");
    Ok(())
}

/// Read the index stored at `path`, returning its contig id and tables.
pub fn load(path: &Path) -> Result<(u32, CompactEsa), EsaError> {
    let file = File::open(path).map_err(|err| EsaError::io(path, err))?;
    let mut reader = BufReader::with_capacity(IO_BUFFER_BYTES, file);
    let (contig_id, esa) = read_record(&mut reader, path)?;
    info!(path = %path.display(), contig_id, len = esa.len(), "index loaded");
    Ok((contig_id, esa))
}

/// Append one record to `writer`; `path` only labels errors.
pub(crate) fn write_record<W: Write, S: TableStorage, T: TableStorage>(
    writer: &mut W,
    path: &Path,
    contig_id: u32,
    esa: &EnhancedSuffixArray<S, T>,
) -> Result<(), EsaError> {
    let io_err = |err| EsaError::io(path, err);
    let mut out = DigestWriter::new(writer);

    out.write_all(&INDEX_MAGIC).map_err(io_err)?;
    write_u32(&mut out, FORMAT_VERSION).map_err(io_err)?;
    write_u32(&mut out, contig_id).map_err(io_err)?;
    write_u64(&mut out, esa.len() as u64).map_err(io_err)?;
    out.write_all(esa.sequence().as_bytes()).map_err(io_err)?;

    write_u32_slice(&mut out, &esa.suftab().to_vec()?).map_err(io_err)?;
    for (kind, table) in [(TableKind::Lcp, esa.lcptab()), (TableKind::Child, esa.childtab())] {
        let compact = CompactTable::encode(kind, &table.to_vec()?);
        write_compact(&mut out, &compact).map_err(io_err)?;
        debug!(table = kind.name(), overflow = compact.overflow().len(), "table written");
    }

    write_buckets(&mut out, esa.buckets()).map_err(io_err)?;

    out.finish().map_err(io_err)?;
    Ok(())
}

/// Read one record from `reader`; `path` only labels errors.
pub(crate) fn read_record<R: Read>(reader: &mut R, path: &Path) -> Result<(u32, CompactEsa), EsaError> {
    let io_err = |err| EsaError::io(path, err);
    let mut input = DigestReader::new(reader);

    let magic: [u8; 4] = read_array(&mut input).map_err(io_err)?;
    if magic != INDEX_MAGIC {
        return Err(EsaError::Format(format!("bad magic {magic:?}")));
    }
    let version = read_u32(&mut input).map_err(io_err)?;
    if version != FORMAT_VERSION {
        return Err(EsaError::Format(format!("unsupported format version {version}")));
    }
    let contig_id = read_u32(&mut input).map_err(io_err)?;
    let len = read_len(&mut input, MAX_SEQUENCE_LEN).map_err(io_err)?;
    let sequence = Sequence::new(read_bytes(&mut input, len).map_err(io_err)?)?;

    let suftab = read_u32_vec(&mut input, len + 1).map_err(io_err)?;
    let lcptab = read_compact(&mut input, TableKind::Lcp, len + 1, path)?;
    let childtab = read_compact(&mut input, TableKind::Child, len + 1, path)?;

    let buckets = read_buckets(&mut input, path)?;

    if !input.verify().map_err(io_err)? {
        return Err(EsaError::Format(format!(
            "digest mismatch in {}",
            path.display()
        )));
    }

    let esa = EnhancedSuffixArray::from_parts(
        sequence,
        IntTable::new(TableKind::Suffix, suftab),
        lcptab,
        childtab,
        buckets,
    )?;
    Ok((contig_id, esa))
}

/// Write the sequence and bucket table that accompany mapped tables in `dir`.
///
/// ```text
/// magic "ESAM" | version u32 | length u64 | sequence bytes
/// bucket depth u32 | starts, ends (only if depth > 0) | blake3 digest
/// ```
pub(crate) fn write_manifest(
    dir: &Path,
    sequence: &Sequence,
    buckets: Option<&PrefixBuckets>,
) -> Result<(), EsaError> {
    let path = dir.join(MANIFEST_FILE);
    let io_err = |err| EsaError::io(&path, err);
    let file = File::create(&path).map_err(io_err)?;
    let mut writer = BufWriter::with_capacity(IO_BUFFER_BYTES, file);
    let mut out = DigestWriter::new(&mut writer);

    out.write_all(&MANIFEST_MAGIC).map_err(io_err)?;
    write_u32(&mut out, FORMAT_VERSION).map_err(io_err)?;
    write_u64(&mut out, sequence.len() as u64).map_err(io_err)?;
    out.write_all(sequence.as_bytes()).map_err(io_err)?;
    write_buckets(&mut out, buckets).map_err(io_err)?;
    out.finish().map_err(io_err)?;
    writer.flush().map_err(io_err)?;
    debug!(path = %path.display(), len = sequence.len(), "mapped manifest written");
    Ok(())
}

/// Read the manifest written by [`write_manifest`].
pub(crate) fn read_manifest(dir: &Path) -> Result<(Sequence, Option<PrefixBuckets>), EsaError> {
    let path = dir.join(MANIFEST_FILE);
    let io_err = |err| EsaError::io(&path, err);
    let file = File::open(&path).map_err(io_err)?;
    let mut reader = BufReader::with_capacity(IO_BUFFER_BYTES, file);
    let mut input = DigestReader::new(&mut reader);

    let magic: [u8; 4] = read_array(&mut input).map_err(io_err)?;
    if magic != MANIFEST_MAGIC {
        return Err(EsaError::Format(format!("bad manifest magic {magic:?}")));
    }
    let version = read_u32(&mut input).map_err(io_err)?;
    if version != FORMAT_VERSION {
        return Err(EsaError::Format(format!("unsupported format version {version}")));
    }
    let len = read_len(&mut input, MAX_SEQUENCE_LEN).map_err(io_err)?;
    let sequence = Sequence::new(read_bytes(&mut input, len).map_err(io_err)?)?;
    let buckets = read_buckets(&mut input, &path)?;

    if !input.verify().map_err(io_err)? {
        return Err(EsaError::Format(format!(
            "digest mismatch in {}",
            path.display()
        )));
    }
    Ok((sequence, buckets))
}

fn write_buckets<W: Write>(out: &mut W, buckets: Option<&PrefixBuckets>) -> io::Result<()> {
    match buckets {
        Some(buckets) => {
            write_u32(out, buckets.depth() as u32)?;
            write_u32_slice(out, buckets.starts())?;
            write_u32_slice(out, buckets.ends())
        }
        None => write_u32(out, 0),
    }
}

fn read_buckets<R: Read>(input: &mut R, path: &Path) -> Result<Option<PrefixBuckets>, EsaError> {
    let io_err = |err| EsaError::io(path, err);
    let depth = read_u32(input).map_err(io_err)? as usize;
    if depth == 0 {
        return Ok(None);
    }
    if depth > super::MAX_BUCKET_DEPTH {
        return Err(EsaError::Format(format!("bucket depth {depth} out of range")));
    }
    let size = 1usize << (2 * depth);
    let starts = read_u32_vec(input, size).map_err(io_err)?;
    let ends = read_u32_vec(input, size).map_err(io_err)?;
    Ok(Some(PrefixBuckets::from_parts(depth, starts, ends)?))
}

/// Writer that hashes everything passing through it.
pub(crate) struct DigestWriter<W> {
    inner: W,
    hasher: blake3::Hasher,
}

impl<W: Write> DigestWriter<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: blake3::Hasher::new(),
        }
    }

    /// Append the digest of the bytes written so far.
    pub(crate) fn finish(mut self) -> io::Result<W> {
        let digest = self.hasher.finalize();
        self.inner.write_all(digest.as_bytes())?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Reader that hashes everything read through it.
pub(crate) struct DigestReader<R> {
    inner: R,
    hasher: blake3::Hasher,
}

impl<R: Read> DigestReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: blake3::Hasher::new(),
        }
    }

    /// Read the trailing digest and compare it with the bytes consumed.
    pub(crate) fn verify(mut self) -> io::Result<bool> {
        let mut stored = [0u8; DIGEST_LEN];
        self.inner.read_exact(&mut stored)?;
        Ok(self.hasher.finalize() == blake3::Hash::from(stored))
    }
}

impl<R: Read> Read for DigestReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.hasher.update(&buf[..read]);
        Ok(read)
    }
}

fn write_compact<W: Write>(out: &mut W, table: &CompactTable) -> io::Result<()> {
    let cells: Vec<u8> = table.cells().iter().map(|&cell| cell as u8).collect();
    out.write_all(&cells)?;
    let entries = table.overflow().entries();
    write_u64(out, entries.len() as u64)?;
    for &(slot, value) in entries {
        write_u32(out, slot)?;
        write_u32(out, value)?;
    }
    Ok(())
}

fn read_compact<R: Read>(
    input: &mut R,
    kind: TableKind,
    len: usize,
    path: &Path,
) -> Result<CompactTable, EsaError> {
    let io_err = |err| EsaError::io(path, err);
    let cells = read_bytes(input, len)
        .map_err(io_err)?
        .into_iter()
        .map(|byte| byte as i8)
        .collect();
    let count = read_len(input, len).map_err(io_err)?;
    let raw = read_u32_vec(input, 2 * count).map_err(io_err)?;
    let entries = raw.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect();
    CompactTable::from_parts(kind, cells, OverflowMap::from_sorted(entries)?)
}

pub(crate) fn write_u32<W: Write>(out: &mut W, value: u32) -> io::Result<()> {
    out.write_all(&value.to_le_bytes())
}

pub(crate) fn write_u64<W: Write>(out: &mut W, value: u64) -> io::Result<()> {
    out.write_all(&value.to_le_bytes())
}

fn write_u32_slice<W: Write>(out: &mut W, values: &[u32]) -> io::Result<()> {
    let mut buffer = Vec::with_capacity(IO_BUFFER_BYTES);
    for value in values {
        buffer.extend_from_slice(&value.to_le_bytes());
        if buffer.len() >= IO_BUFFER_BYTES {
            out.write_all(&buffer)?;
            buffer.clear();
        }
    }
    out.write_all(&buffer)
}

fn read_array<R: Read, const N: usize>(input: &mut R) -> io::Result<[u8; N]> {
    let mut bytes = [0u8; N];
    input.read_exact(&mut bytes)?;
    Ok(bytes)
}

pub(crate) fn read_u32<R: Read>(input: &mut R) -> io::Result<u32> {
    read_array(input).map(u32::from_le_bytes)
}

pub(crate) fn read_u64<R: Read>(input: &mut R) -> io::Result<u64> {
    read_array(input).map(u64::from_le_bytes)
}

/// Read a u64 length field, rejecting values above `max`.
pub(crate) fn read_len<R: Read>(input: &mut R, max: usize) -> io::Result<usize> {
    let len = read_u64(input)?;
    usize::try_from(len)
        .ok()
        .filter(|&len| len <= max)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, format!("length {len} out of range")))
}

/// Read exactly `len` bytes without trusting `len` for preallocation.
pub(crate) fn read_bytes<R: Read>(input: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    input.by_ref().take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated index data"));
    }
    Ok(bytes)
}

fn read_u32_vec<R: Read>(input: &mut R, count: usize) -> io::Result<Vec<u32>> {
    let bytes = read_bytes(input, count * 4)?;
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
