#![warn(clippy::large_types_passed_by_value)]

//! Annotate genomic variants with predicted splicing-impact delta scores.
//!
//! The crate wraps a pretrained ensemble of sequence-to-probability models
//! (consumed through the [`SpliceModel`] trait) with everything needed to
//! score a VCF stream: window extraction and one-hot encoding around each
//! variant, shape-homogeneous tensor batching, delta-score extraction with
//! indel and strand corrections, and in-order result reconciliation.

pub mod annotation;
pub mod batch;
pub mod delta;
pub mod encode;
pub mod parallel;
pub mod pipeline;
pub mod reference;
pub mod scorer;
pub mod sequence;
pub mod variant;

pub use crate::annotation::{Annotator, PositionData, TranscriptMatch};
pub use crate::batch::BatchAggregator;
pub use crate::delta::{extract_delta_score, unscored_annotation};
pub use crate::encode::{coverage, encode_variant, window_width, PairEncoding};
pub use crate::parallel::run_parallel;
pub use crate::pipeline::{
    run, score_variant, AnnotationSink, RunSummary, ScoringOptions, VariantSource,
};
pub use crate::reference::{IndexedFastaGenome, InMemoryGenome, ReferenceGenome};
pub use crate::scorer::{Ensemble, Scorer, SpliceModel};
pub use crate::sequence::{normalise_chrom, one_hot_encode, Strand};
pub use crate::variant::{AnnotatedRecord, Variant, INFO_FIELD};
