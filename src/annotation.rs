//! Gene annotation table: which transcripts cover a position, and where the
//! transcript ends and exon boundaries sit relative to it.
//!
//! The table is the tab-separated format also produced by annotation
//! exporters (`#NAME CHROM STRAND TX_START TX_END EXON_START EXON_END`,
//! exon columns holding comma-joined coordinate lists). Start coordinates
//! are stored 0-based and shifted to 1-based on load.
use crate::sequence::{has_chr_prefix, normalise_chrom, Strand};
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct TranscriptRow {
    #[serde(rename = "#NAME")]
    name: String,
    #[serde(rename = "CHROM")]
    chrom: String,
    #[serde(rename = "STRAND")]
    strand: Strand,
    #[serde(rename = "TX_START")]
    tx_start: i64,
    #[serde(rename = "TX_END")]
    tx_end: i64,
    #[serde(rename = "EXON_START")]
    exon_starts: String,
    #[serde(rename = "EXON_END")]
    exon_ends: String,
}

#[derive(Debug, Clone)]
struct Transcript {
    gene: String,
    chrom: String,
    strand: Strand,
    tx_start: i64,
    tx_end: i64,
    // union of 1-based exon starts and ends, sorted ascending
    exon_boundaries: Vec<i64>,
}

/// A transcript whose span covers a queried variant position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptMatch {
    pub gene: String,
    pub strand: Strand,
    /// Opaque index used to fetch positional metadata later.
    pub index: usize,
}

/// Signed distances from a variant position to transcript landmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionData {
    pub dist_tx_start: i64,
    pub dist_tx_end: i64,
    /// Distance to the closest annotated exon boundary (smallest |distance|,
    /// leftmost boundary on ties).
    pub dist_exon_boundary: i64,
}

/// Read-only transcript annotation table, queried once per variant.
#[derive(Debug, Clone)]
pub struct Annotator {
    transcripts: Vec<Transcript>,
    chr_prefixed: bool,
}

fn parse_coordinate_list(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .filter(|c| !c.is_empty())
        .map(|c| {
            c.parse::<i64>()
                .map_err(|e| anyhow!("bad exon coordinate {c:?}: {e}"))
        })
        .collect()
}

impl Annotator {
    pub fn from_reader<R: Read>(reader: R) -> Result<Annotator> {
        let mut table = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_reader(reader);

        let mut transcripts = Vec::new();
        for row in table.deserialize() {
            let row: TranscriptRow = row.context("gene annotation file not formatted properly")?;
            let mut exon_boundaries: Vec<i64> = parse_coordinate_list(&row.exon_starts)?
                .iter()
                .map(|s| s + 1)
                .chain(parse_coordinate_list(&row.exon_ends)?)
                .collect();
            exon_boundaries.sort_unstable();
            exon_boundaries.dedup();
            if exon_boundaries.is_empty() {
                bail!("transcript {} has no exon coordinates", row.name);
            }
            transcripts.push(Transcript {
                gene: row.name,
                chrom: row.chrom,
                strand: row.strand,
                tx_start: row.tx_start + 1,
                tx_end: row.tx_end,
                exon_boundaries,
            });
        }
        if transcripts.is_empty() {
            bail!("gene annotation file holds no transcripts");
        }
        let chr_prefixed = has_chr_prefix(&transcripts[0].chrom);
        Ok(Annotator {
            transcripts,
            chr_prefixed,
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Annotator> {
        let file = File::open(path.as_ref())
            .with_context(|| format!("cannot open annotation file {:?}", path.as_ref()))?;
        Annotator::from_reader(file)
    }

    /// All transcripts whose span covers `pos`, in table order. The
    /// chromosome name is normalised to the table's naming convention first.
    pub fn matches(&self, chrom: &str, pos: i64) -> Vec<TranscriptMatch> {
        let chrom = normalise_chrom(chrom, self.chr_prefixed);
        self.transcripts
            .iter()
            .enumerate()
            .filter(|(_, tx)| tx.chrom == chrom && tx.tx_start <= pos && pos <= tx.tx_end)
            .map(|(index, tx)| TranscriptMatch {
                gene: tx.gene.clone(),
                strand: tx.strand,
                index,
            })
            .collect()
    }

    /// Positional metadata for one transcript. A bad index is an internal
    /// bug, not a data problem, hence the hard error.
    pub fn position_data(&self, index: usize, pos: i64) -> Result<PositionData> {
        let tx = self
            .transcripts
            .get(index)
            .ok_or_else(|| anyhow!("transcript index {index} out of range"))?;
        let dist_exon_boundary = tx
            .exon_boundaries
            .iter()
            .map(|b| b - pos)
            .min_by_key(|d| d.abs())
            .ok_or_else(|| anyhow!("transcript {} has no exon boundaries", tx.gene))?;
        Ok(PositionData {
            dist_tx_start: tx.tx_start - pos,
            dist_tx_end: tx.tx_end - pos,
            dist_exon_boundary,
        })
    }
}
