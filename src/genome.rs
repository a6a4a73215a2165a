//! Multi-contig genome index.
//!
//! Every contig gets its own [`CompactEsa`]; queries fan out over all
//! contigs and both strands. Contigs are built in parallel.

use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use thiserror::Error;
use tracing::info;

use crate::approx::{ApproxSearchError, ApproxSearchParams, ApproxSearcher};
use crate::esa::persist::{self, DigestReader, DigestWriter};
use crate::esa::{BuildConfig, CompactEsa, EsaError};
use crate::genomics::{normalize_pattern, reverse_complement, Hit, Sequence, Strand};
use crate::util::CancellationToken;

/// Leading bytes of a genome index file.
pub const GENOME_MAGIC: [u8; 4] = *b"ESAG";

const GENOME_VERSION: u32 = 1;
const MAX_NAME_BYTES: usize = 1 << 16;

/// Errors raised by [`GenomeIndex`].
#[derive(Debug, Error)]
pub enum GenomeIndexError {
    /// No contigs were supplied.
    #[error("genome index needs at least one contig")]
    NoContigs,

    /// Two contigs share a name.
    #[error("duplicate contig name '{0}'")]
    DuplicateContig(String),

    /// Building one contig failed.
    #[error("contig '{name}': {source}")]
    Contig {
        /// Contig being built.
        name: String,
        /// Underlying failure.
        #[source]
        source: EsaError,
    },

    /// Index lookup or persistence failed.
    #[error(transparent)]
    Index(#[from] EsaError),

    /// Approximate search failed.
    #[error(transparent)]
    Search(#[from] ApproxSearchError),
}

/// Named contig with its index.
#[derive(Debug)]
pub struct Contig {
    name: String,
    esa: CompactEsa,
}

impl Contig {
    /// Contig name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index over the contig.
    pub fn index(&self) -> &CompactEsa {
        &self.esa
    }
}

/// Indexes over every contig of a genome.
#[derive(Debug)]
pub struct GenomeIndex {
    contigs: Vec<Contig>,
}

impl GenomeIndex {
    /// Build with default options.
    pub fn build<N: Into<String>>(
        contigs: impl IntoIterator<Item = (N, Sequence)>,
    ) -> Result<Self, GenomeIndexError> {
        let contigs = contigs.into_iter().map(|(name, seq)| (name.into(), seq)).collect();
        Self::build_with(contigs, &BuildConfig::default(), &CancellationToken::new())
    }

    /// Build every contig in parallel with `config`.
    pub fn build_with(
        contigs: Vec<(String, Sequence)>,
        config: &BuildConfig,
        cancel: &CancellationToken,
    ) -> Result<Self, GenomeIndexError> {
        check_names(contigs.iter().map(|(name, _)| name.as_str()))?;
        let started = Instant::now();
        let total_bases: usize = contigs.iter().map(|(_, seq)| seq.len()).sum();

        let contigs = contigs
            .into_par_iter()
            .map(|(name, sequence)| match CompactEsa::build_with(sequence, config, cancel) {
                Ok(esa) => Ok(Contig { name, esa }),
                Err(source) => Err(GenomeIndexError::Contig { name, source }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            contigs = contigs.len(),
            total_bases,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "genome index built"
        );
        Ok(Self { contigs })
    }

    /// Contigs in input order; a contig's position is its id.
    pub fn contigs(&self) -> &[Contig] {
        &self.contigs
    }

    /// Contig with id `contig_id`.
    pub fn contig(&self, contig_id: usize) -> Option<&Contig> {
        self.contigs.get(contig_id)
    }

    /// Id of the contig called `name`.
    pub fn contig_id(&self, name: &str) -> Option<usize> {
        self.contigs.iter().position(|contig| contig.name == name)
    }

    /// Number of contigs.
    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    /// Whether the index holds no contigs.
    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    /// Sum of all contig lengths.
    pub fn total_bases(&self) -> usize {
        self.contigs.iter().map(|contig| contig.esa.len()).sum()
    }

    /// Exact occurrences of `pattern` on both strands of every contig.
    ///
    /// Reverse-strand hits are occurrences of the reverse complement and
    /// report its leftmost coordinate.
    pub fn find_positions(&self, pattern: impl AsRef<[u8]>) -> Result<BTreeSet<Hit>, GenomeIndexError> {
        let forward = normalize_pattern(pattern.as_ref()).map_err(EsaError::from)?;
        let reverse = reverse_complement(&forward);
        let mut hits = BTreeSet::new();
        for (contig_id, contig) in self.contigs.iter().enumerate() {
            for (strand, query) in [(Strand::Forward, &forward), (Strand::Reverse, &reverse)] {
                hits.extend(
                    contig
                        .esa
                        .find_positions(query)?
                        .into_iter()
                        .map(|position| Hit::new(contig_id, position, strand)),
                );
            }
        }
        Ok(hits)
    }

    /// Number of exact occurrences on both strands.
    pub fn match_count(&self, pattern: impl AsRef<[u8]>) -> Result<usize, GenomeIndexError> {
        let forward = normalize_pattern(pattern.as_ref()).map_err(EsaError::from)?;
        let reverse = reverse_complement(&forward);
        let mut count = 0;
        for contig in &self.contigs {
            count += contig.esa.match_count(&forward)? + contig.esa.match_count(&reverse)?;
        }
        Ok(count)
    }

    /// Approximate occurrences of `query` over every contig.
    pub fn approximate_matches(
        &self,
        query: impl AsRef<[u8]>,
        params: &ApproxSearchParams,
    ) -> Result<BTreeSet<Hit>, GenomeIndexError> {
        self.approximate_matches_with(query, params, &CancellationToken::new())
    }

    /// As [`approximate_matches`](Self::approximate_matches), polling `cancel`.
    pub fn approximate_matches_with(
        &self,
        query: impl AsRef<[u8]>,
        params: &ApproxSearchParams,
        cancel: &CancellationToken,
    ) -> Result<BTreeSet<Hit>, GenomeIndexError> {
        let query = query.as_ref();
        let mut hits = BTreeSet::new();
        for (contig_id, contig) in self.contigs.iter().enumerate() {
            let mut searcher = ApproxSearcher::new(&contig.esa, *params);
            hits.extend(
                searcher
                    .search_with(query, cancel)?
                    .into_iter()
                    .map(|found| Hit::new(contig_id, found.position, found.strand)),
            );
        }
        Ok(hits)
    }

    /// Write the whole genome index to `path`.
    pub fn save(&self, path: &Path) -> Result<(), GenomeIndexError> {
        let io_err = |err| EsaError::io(path, err);
        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);

        let mut header = DigestWriter::new(&mut writer);
        header.write_all(&GENOME_MAGIC).map_err(io_err)?;
        persist::write_u32(&mut header, GENOME_VERSION).map_err(io_err)?;
        persist::write_u32(&mut header, self.contigs.len() as u32).map_err(io_err)?;
        for contig in &self.contigs {
            persist::write_u64(&mut header, contig.name.len() as u64).map_err(io_err)?;
            header.write_all(contig.name.as_bytes()).map_err(io_err)?;
        }
        header.finish().map_err(io_err)?;

        for (contig_id, contig) in self.contigs.iter().enumerate() {
            persist::write_record(&mut writer, path, contig_id as u32, &contig.esa)?;
        }
        writer.flush().map_err(io_err)?;
        info!(path = %path.display(), contigs = self.contigs.len(), "genome index saved");
        Ok(())
    }

    /// Read a genome index written by [`save`](Self::save).
    pub fn load(path: &Path) -> Result<Self, GenomeIndexError> {
        let io_err = |err| EsaError::io(path, err);
        let file = File::open(path).map_err(io_err)?;
        let mut reader = BufReader::new(file);

        let mut header = DigestReader::new(&mut reader);
        let magic = persist::read_bytes(&mut header, GENOME_MAGIC.len()).map_err(io_err)?;
        if magic != GENOME_MAGIC {
            return Err(EsaError::Format(format!("bad genome magic {magic:?}")).into());
        }
        let version = persist::read_u32(&mut header).map_err(io_err)?;
        if version != GENOME_VERSION {
            return Err(EsaError::Format(format!("unsupported genome version {version}")).into());
        }
        let count = persist::read_u32(&mut header).map_err(io_err)? as usize;
        let mut names = Vec::new();
        for _ in 0..count {
            let len = persist::read_len(&mut header, MAX_NAME_BYTES).map_err(io_err)?;
            let bytes = persist::read_bytes(&mut header, len).map_err(io_err)?;
            let name = String::from_utf8(bytes)
                .map_err(|_| EsaError::Format("contig name is not UTF-8".to_string()))?;
            names.push(name);
        }
        if !header.verify().map_err(io_err)? {
            return Err(EsaError::Format(format!("header digest mismatch in {}", path.display())).into());
        }

        let mut contigs = Vec::with_capacity(names.len());
        for (expected_id, name) in names.into_iter().enumerate() {
            let (contig_id, esa) = persist::read_record(&mut reader, path)?;
            if contig_id as usize != expected_id {
                return Err(EsaError::Format(format!(
                    "contig record {contig_id} found where {expected_id} was expected"
                ))
                .into());
            }
            contigs.push(Contig { name, esa });
        }
        check_names(contigs.iter().map(|contig| contig.name.as_str()))?;
        info!(path = %path.display(), contigs = contigs.len(), "genome index loaded");
        Ok(Self { contigs })
    }
}

fn check_names<'a>(names: impl Iterator<Item = &'a str>) -> Result<(), GenomeIndexError> {
    let mut seen = HashSet::new();
    let mut any = false;
    for name in names {
        any = true;
        if !seen.insert(name) {
            return Err(GenomeIndexError::DuplicateContig(name.to_string()));
        }
    }
    if any {
        Ok(())
    } else {
        Err(GenomeIndexError::NoContigs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genome() -> GenomeIndex {
        GenomeIndex::build([
            ("chr1", Sequence::new("ACAAACATAT").unwrap()),
            ("chr2", Sequence::new("GGATGTTTGT").unwrap()),
        ])
        .unwrap()
    }

    #[test]
    fn hits_cover_both_strands_and_contigs() {
        let index = genome();
        // ATGT is the reverse complement of ACAT
        let hits = index.find_positions("ACAT").unwrap();
        assert_eq!(
            hits.into_iter().collect::<Vec<_>>(),
            vec![
                Hit::new(0, 4, Strand::Forward),
                Hit::new(1, 2, Strand::Reverse),
            ]
        );
        assert_eq!(index.match_count("acat").unwrap(), 2);
    }

    #[test]
    fn palindromes_hit_both_strands_at_one_position() {
        let index = genome();
        let hits = index.find_positions("AT").unwrap();
        assert!(hits.contains(&Hit::new(0, 6, Strand::Forward)));
        assert!(hits.contains(&Hit::new(0, 6, Strand::Reverse)));
        assert_eq!(index.match_count("AT").unwrap(), hits.len());
    }

    #[test]
    fn names_must_be_unique_and_present() {
        let dup = GenomeIndex::build([
            ("chr1", Sequence::new("ACGT").unwrap()),
            ("chr1", Sequence::new("TTTT").unwrap()),
        ]);
        assert!(matches!(dup, Err(GenomeIndexError::DuplicateContig(name)) if name == "chr1"));
        let empty = GenomeIndex::build(Vec::<(String, Sequence)>::new());
        assert!(matches!(empty, Err(GenomeIndexError::NoContigs)));
    }

    #[test]
    fn contig_lookup_by_name() {
        let index = genome();
        assert_eq!(index.contig_id("chr2"), Some(1));
        assert_eq!(index.contig(1).map(Contig::name), Some("chr2"));
        assert_eq!(index.total_bases(), 20);
    }
}
