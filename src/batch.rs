//! Tensor batch aggregator and record/result reconciler.
//!
//! Encoded tensors from many variants accumulate in shape-keyed row arenas
//! until enough predictions are pending, then every arena goes through the
//! scorer in one vectorized call per shape. Small row handles recorded at
//! insertion time let each record pull its own results back out afterwards,
//! so the arenas can be cleared without dangling references.
use crate::annotation::{Annotator, TranscriptMatch};
use crate::delta::{extract_delta_score, unscored_annotation};
use crate::encode::{coverage, encode_variant, PairEncoding};
use crate::pipeline::ScoringOptions;
use crate::reference::ReferenceGenome;
use crate::scorer::Scorer;
use crate::variant::{AnnotatedRecord, Variant};
use anyhow::{anyhow, bail, Result};
use log::debug;
use ndarray::{concatenate, Array2, Array3, ArrayView2, Axis};
use std::collections::HashMap;
use std::time::Instant;

/// Handle to one row of a shape-keyed batch group. Valid only until the
/// flush that consumes the group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowRef {
    pub width: usize,
    pub row: usize,
}

/// Where one (allele, transcript) pair finds its results after the flush.
#[derive(Clone, Debug)]
pub enum PairSlot {
    /// Nothing was encoded; the pair keeps its position but yields no
    /// annotation.
    Skipped,
    /// Complex indel: gets the fixed unscored annotation, no model call.
    Unscored,
    /// Both tensors were batched; the rows to read back after scoring.
    Scored { x_ref: RowRef, x_alt: RowRef },
}

/// A variant held back until the flush that resolves its batches, with its
/// transcript matches and one slot per (allele, transcript) pair in
/// iteration order.
#[derive(Debug)]
struct PreparedRecord {
    variant: Variant,
    matches: Vec<TranscriptMatch>,
    slots: Vec<PairSlot>,
}

/// Collects encoded tensors across variants and scores them in
/// size-homogeneous batches once the prediction threshold is reached.
pub struct BatchAggregator<'a, S, R> {
    annotator: &'a Annotator,
    genome: &'a R,
    scorer: &'a S,
    options: ScoringOptions,
    groups: HashMap<usize, Vec<Array2<f32>>>,
    pending: Vec<PreparedRecord>,
    batch_predictions: usize,
    total_predictions: usize,
    total_records: usize,
}

impl<'a, S: Scorer, R: ReferenceGenome> BatchAggregator<'a, S, R> {
    pub fn new(
        annotator: &'a Annotator,
        genome: &'a R,
        scorer: &'a S,
        options: ScoringOptions,
    ) -> Self {
        BatchAggregator {
            annotator,
            genome,
            scorer,
            options,
            groups: HashMap::new(),
            pending: Vec::new(),
            batch_predictions: 0,
            total_predictions: 0,
            total_records: 0,
        }
    }

    /// Encode a variant into the current batch. Returns the records emitted
    /// by the flush this addition triggered, in input order; an empty list
    /// means the batch is still accumulating.
    pub fn add(&mut self, variant: Variant) -> Result<Vec<AnnotatedRecord>> {
        let matches = self.annotator.matches(&variant.chrom, variant.pos);
        // placeholders count too, so output-order alignment stays deterministic
        let prediction_count = variant.alternates.len() * matches.len();
        self.batch_predictions += prediction_count;
        self.total_predictions += prediction_count;
        self.total_records += 1;

        let encodings = encode_variant(
            &variant,
            &matches,
            self.annotator,
            self.genome,
            self.options.distance,
        )?;
        let slots = encodings
            .into_iter()
            .map(|encoding| match encoding {
                PairEncoding::Absent => PairSlot::Skipped,
                PairEncoding::Unscored => PairSlot::Unscored,
                PairEncoding::Scored { x_ref, x_alt } => PairSlot::Scored {
                    x_ref: self.push_row(x_ref),
                    x_alt: self.push_row(x_alt),
                },
            })
            .collect();
        self.pending.push(PreparedRecord {
            variant,
            matches,
            slots,
        });

        if self.batch_predictions >= self.options.batch_size {
            self.flush()
        } else {
            Ok(Vec::new())
        }
    }

    /// Flush whatever is left after the input is exhausted.
    pub fn finish(&mut self) -> Result<Vec<AnnotatedRecord>> {
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }
        self.flush()
    }

    fn push_row(&mut self, tensor: Array2<f32>) -> RowRef {
        let width = tensor.nrows();
        let group = self.groups.entry(width).or_default();
        group.push(tensor);
        RowRef {
            width,
            row: group.len() - 1,
        }
    }

    /// Score every shape group and reconcile all pending records. Local
    /// batch state is cleared up front, so a failed flush never leaves
    /// stale rows behind.
    fn flush(&mut self) -> Result<Vec<AnnotatedRecord>> {
        let start = Instant::now();
        let groups = std::mem::take(&mut self.groups);
        let pending = std::mem::take(&mut self.pending);
        let flushed = self.batch_predictions;
        self.batch_predictions = 0;
        debug!(
            "flushing {} shape groups ({} records, {} predictions, {} total so far)",
            groups.len(),
            pending.len(),
            flushed,
            self.total_predictions
        );

        let mut tracks = HashMap::with_capacity(groups.len());
        for (width, rows) in groups {
            let views: Vec<_> = rows
                .iter()
                .map(|row| row.view().insert_axis(Axis(0)))
                .collect();
            let batch = concatenate(Axis(0), &views)?;
            tracks.insert(width, self.scorer.score(&batch)?);
        }

        let mut emitted = Vec::with_capacity(pending.len());
        for prepared in pending {
            emitted.push(self.reconcile(prepared, &tracks)?);
        }

        let elapsed = start.elapsed().as_secs_f64();
        debug!(
            "flush finished in {elapsed:.2}s ({:.2} predictions/s)",
            flushed as f64 / elapsed.max(f64::EPSILON)
        );
        Ok(emitted)
    }

    fn reconcile(
        &self,
        prepared: PreparedRecord,
        tracks: &HashMap<usize, Array3<f32>>,
    ) -> Result<AnnotatedRecord> {
        let n_matches = prepared.matches.len();
        let mut annotations = Vec::new();
        for (pair_ix, slot) in prepared.slots.iter().enumerate() {
            let alt = &prepared.variant.alternates[pair_ix / n_matches];
            let tx = &prepared.matches[pair_ix % n_matches];
            match slot {
                PairSlot::Skipped => {}
                PairSlot::Unscored => annotations.push(unscored_annotation(alt, &tx.gene)),
                PairSlot::Scored { x_ref, x_alt } => {
                    let y_ref = Self::take_row(tracks, *x_ref)?;
                    let y_alt = Self::take_row(tracks, *x_alt)?;
                    let pd = self.annotator.position_data(tx.index, prepared.variant.pos)?;
                    annotations.push(extract_delta_score(
                        alt,
                        &tx.gene,
                        y_ref,
                        y_alt,
                        prepared.variant.reference.len(),
                        alt.len(),
                        tx.strand,
                        coverage(self.options.distance),
                        pd.dist_exon_boundary,
                        self.options.mask,
                    )?);
                }
            }
        }
        Ok(AnnotatedRecord {
            variant: prepared.variant,
            annotations,
        })
    }

    fn take_row(
        tracks: &HashMap<usize, Array3<f32>>,
        row_ref: RowRef,
    ) -> Result<ArrayView2<'_, f32>> {
        let track = tracks
            .get(&row_ref.width)
            .ok_or_else(|| anyhow!("no scored batch for tensor width {}", row_ref.width))?;
        if row_ref.row >= track.dim().0 {
            bail!(
                "lookup row {} beyond scored batch of {} rows (width {})",
                row_ref.row,
                track.dim().0,
                row_ref.width
            );
        }
        Ok(track.index_axis(Axis(0), row_ref.row))
    }
}
