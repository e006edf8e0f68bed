//! Random access to the reference genome.
//!
//! The scoring engine only needs a clamped slice lookup plus a hint about
//! the chromosome naming convention, so the backing source sits behind a
//! small trait: indexed FASTA on disk in production, an in-memory map in
//! tests.
use crate::sequence::has_chr_prefix;
use anyhow::{Context, Result};
use bio::io::fasta;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

/// Read-only reference sequence accessor, safe for concurrent reads.
pub trait ReferenceGenome {
    /// Fetch the 0-based half-open slice `[start, end)` of a chromosome,
    /// clamped at the chromosome end. `None` when the chromosome is unknown
    /// or the window starts before the chromosome does; a short return value
    /// means the window ran off the end. Bases are returned uppercased.
    fn slice(&self, chrom: &str, start: i64, end: i64) -> Option<Vec<u8>>;

    /// Whether the backing source names chromosomes with a `chr` prefix.
    fn chr_prefixed(&self) -> bool;
}

/// Reference genome backed by an indexed FASTA file (`.fai` alongside).
pub struct IndexedFastaGenome {
    reader: Mutex<fasta::IndexedReader<File>>,
    lengths: HashMap<String, u64>,
    chr_prefixed: bool,
}

impl IndexedFastaGenome {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<IndexedFastaGenome> {
        let reader = fasta::IndexedReader::from_file(&path.as_ref())
            .with_context(|| format!("cannot open reference fasta {:?}", path.as_ref()))?;
        let sequences = reader.index.sequences();
        let chr_prefixed = sequences
            .first()
            .map(|s| has_chr_prefix(&s.name))
            .unwrap_or(false);
        let lengths = sequences.into_iter().map(|s| (s.name, s.len)).collect();
        Ok(IndexedFastaGenome {
            reader: Mutex::new(reader),
            lengths,
            chr_prefixed,
        })
    }
}

impl ReferenceGenome for IndexedFastaGenome {
    fn slice(&self, chrom: &str, start: i64, end: i64) -> Option<Vec<u8>> {
        if start < 0 || end < start {
            return None;
        }
        let len = *self.lengths.get(chrom)?;
        let start = (start as u64).min(len);
        let end = (end as u64).min(len);
        // a poisoned lock still holds a usable reader; recovering it keeps
        // a panicked sibling thread from turning into per-record skips
        let mut reader = self.reader.lock().unwrap_or_else(|e| e.into_inner());
        let mut seq = Vec::with_capacity((end - start) as usize);
        reader.fetch(chrom, start, end).ok()?;
        reader.read(&mut seq).ok()?;
        seq.make_ascii_uppercase();
        Some(seq)
    }

    fn chr_prefixed(&self) -> bool {
        self.chr_prefixed
    }
}

/// In-memory reference genome, mostly for tests and small fixtures.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGenome {
    contigs: HashMap<String, Vec<u8>>,
    chr_prefixed: bool,
}

impl InMemoryGenome {
    pub fn new() -> InMemoryGenome {
        InMemoryGenome::default()
    }

    /// The first inserted contig decides the naming convention.
    pub fn insert(&mut self, name: &str, seq: &str) {
        if self.contigs.is_empty() {
            self.chr_prefixed = has_chr_prefix(name);
        }
        self.contigs
            .insert(name.to_string(), seq.as_bytes().to_ascii_uppercase());
    }
}

impl ReferenceGenome for InMemoryGenome {
    fn slice(&self, chrom: &str, start: i64, end: i64) -> Option<Vec<u8>> {
        if start < 0 || end < start {
            return None;
        }
        let seq = self.contigs.get(chrom)?;
        let start = (start as usize).min(seq.len());
        let end = (end as usize).min(seq.len());
        Some(seq[start..end].to_vec())
    }

    fn chr_prefixed(&self) -> bool {
        self.chr_prefixed
    }
}
