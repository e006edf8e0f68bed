//! Single-threaded scoring pipeline: read, encode, aggregate, flush,
//! reconcile, emit. VCF parsing and writing stay outside, behind the
//! source/sink traits.
use crate::annotation::Annotator;
use crate::batch::BatchAggregator;
use crate::delta::{extract_delta_score, unscored_annotation};
use crate::encode::{coverage, encode_variant, PairEncoding};
use crate::reference::ReferenceGenome;
use crate::scorer::Scorer;
use crate::variant::{AnnotatedRecord, Variant};
use anyhow::Result;
use log::{debug, warn};
use ndarray::Axis;

/// Externally supplied knobs of the scoring engine.
#[derive(Clone, Debug)]
pub struct ScoringOptions {
    /// Maximum distance between the variant and a gained/lost splice site.
    pub distance: usize,
    /// Suppress scores for annotated gains and unannotated losses.
    pub mask: bool,
    /// Number of accumulated predictions that triggers a flush; 1 scores
    /// every variant on its own (unbatched path).
    pub batch_size: usize,
}

impl Default for ScoringOptions {
    fn default() -> ScoringOptions {
        ScoringOptions {
            distance: 50,
            mask: false,
            batch_size: 1,
        }
    }
}

/// Upstream record boundary: one variant at a time, never seeking back.
pub trait VariantSource {
    fn next_variant(&mut self) -> Option<Result<Variant>>;
}

/// Downstream record boundary; must be called in input order.
pub trait AnnotationSink {
    fn write(&mut self, record: &AnnotatedRecord) -> Result<()>;
}

/// Totals reported after a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub records: usize,
    pub annotations: usize,
}

/// Score one variant on its own, without batching. The batched path must
/// produce byte-identical annotations for any batch size.
pub fn score_variant<S: Scorer, R: ReferenceGenome>(
    variant: &Variant,
    annotator: &Annotator,
    genome: &R,
    scorer: &S,
    options: &ScoringOptions,
) -> Result<Vec<String>> {
    let matches = annotator.matches(&variant.chrom, variant.pos);
    let encodings = encode_variant(variant, &matches, annotator, genome, options.distance)?;
    let n_matches = matches.len();
    let mut annotations = Vec::new();
    for (pair_ix, encoding) in encodings.into_iter().enumerate() {
        let alt = &variant.alternates[pair_ix / n_matches];
        let tx = &matches[pair_ix % n_matches];
        match encoding {
            PairEncoding::Absent => {}
            PairEncoding::Unscored => annotations.push(unscored_annotation(alt, &tx.gene)),
            PairEncoding::Scored { x_ref, x_alt } => {
                let y_ref = scorer.score(&x_ref.insert_axis(Axis(0)))?;
                let y_alt = scorer.score(&x_alt.insert_axis(Axis(0)))?;
                let pd = annotator.position_data(tx.index, variant.pos)?;
                annotations.push(extract_delta_score(
                    alt,
                    &tx.gene,
                    y_ref.index_axis(Axis(0), 0),
                    y_alt.index_axis(Axis(0), 0),
                    variant.reference.len(),
                    alt.len(),
                    tx.strand,
                    coverage(options.distance),
                    pd.dist_exon_boundary,
                    options.mask,
                )?);
            }
        }
    }
    Ok(annotations)
}

/// Drive the whole pipeline over a variant stream. Records come out in the
/// exact order they went in, whatever the batch size.
pub fn run<Src, Snk, S, R>(
    source: &mut Src,
    sink: &mut Snk,
    annotator: &Annotator,
    genome: &R,
    scorer: &S,
    options: &ScoringOptions,
) -> Result<RunSummary>
where
    Src: VariantSource,
    Snk: AnnotationSink,
    S: Scorer,
    R: ReferenceGenome,
{
    let mut summary = RunSummary::default();

    if options.batch_size > 1 {
        let mut aggregator = BatchAggregator::new(annotator, genome, scorer, options.clone());
        while let Some(next) = source.next_variant() {
            let variant = match next {
                Ok(variant) => variant,
                Err(err) => {
                    warn!("skipping record (bad input): {err}");
                    continue;
                }
            };
            for record in aggregator.add(variant)? {
                summary.records += 1;
                summary.annotations += record.annotations.len();
                sink.write(&record)?;
            }
        }
        for record in aggregator.finish()? {
            summary.records += 1;
            summary.annotations += record.annotations.len();
            sink.write(&record)?;
        }
    } else {
        while let Some(next) = source.next_variant() {
            let variant = match next {
                Ok(variant) => variant,
                Err(err) => {
                    warn!("skipping record (bad input): {err}");
                    continue;
                }
            };
            let annotations = score_variant(&variant, annotator, genome, scorer, options)?;
            summary.records += 1;
            summary.annotations += annotations.len();
            sink.write(&AnnotatedRecord {
                variant,
                annotations,
            })?;
        }
    }

    debug!(
        "processed {} records, wrote {} annotations",
        summary.records, summary.annotations
    );
    Ok(summary)
}
