//! Window encoder: turns a variant and its transcript matches into
//! one-hot reference/mutated tensors ready for batching.
use crate::annotation::{Annotator, TranscriptMatch};
use crate::reference::ReferenceGenome;
use crate::sequence::{normalise_chrom, one_hot_encode, reverse_complement_encoding, Strand};
use crate::variant::Variant;
use anyhow::Result;
use itertools::iproduct;
use log::warn;
use ndarray::Array2;

/// Number of positions the model reports scores for.
pub fn coverage(distance: usize) -> usize {
    2 * distance + 1
}

/// Width of the genomic window handed to the model: the scored positions
/// plus 5000 bases of flanking context on each side.
pub fn window_width(distance: usize) -> usize {
    10000 + coverage(distance)
}

/// Outcome of encoding one (alternate allele, transcript) pair.
#[derive(Clone, Debug)]
pub enum PairEncoding {
    /// Nothing to score; the pair keeps its place in the iteration order
    /// but produces no annotation.
    Absent,
    /// Complex indel (multi-base ref and alt): receives the fixed
    /// unscored annotation without going through the model.
    Unscored,
    /// Strand-corrected one-hot windows, shape (width, 4). The alt tensor
    /// width differs from the ref width when the allele is an indel.
    Scored {
        x_ref: Array2<f32>,
        x_alt: Array2<f32>,
    },
}

/// Validity gate applied once per variant: fetch the full window around the
/// position and check it against the declared reference allele. Any failure
/// skips the whole variant (logged, never fatal).
fn fetch_window<R: ReferenceGenome>(
    variant: &Variant,
    genome: &R,
    distance: usize,
) -> Option<Vec<u8>> {
    let wid = window_width(distance);
    let half = (wid / 2) as i64;
    let chrom = normalise_chrom(&variant.chrom, genome.chr_prefixed());

    let Some(seq) = genome.slice(&chrom, variant.pos - half - 1, variant.pos + half) else {
        warn!("skipping record (fasta issue): {variant}");
        return None;
    };
    if seq.len() != wid {
        warn!("skipping record (near chromosome end): {variant}");
        return None;
    }
    let ref_len = variant.reference.len();
    let matches_reference = seq
        .get(wid / 2..wid / 2 + ref_len)
        .is_some_and(|window_ref| window_ref.eq_ignore_ascii_case(variant.reference.as_bytes()));
    if !matches_reference {
        warn!("skipping record (ref mismatch): {variant}");
        return None;
    }
    if ref_len > 2 * distance {
        warn!("skipping record (ref too long): {variant}");
        return None;
    }
    Some(seq)
}

/// Encode every (alternate, transcript) pair of a variant, outer loop over
/// alternates in record order, inner loop over matches in lookup order. The
/// returned list always holds `alternates x matches` entries so downstream
/// bookkeeping stays aligned; pairs that cannot be scored come back as
/// `Absent` or `Unscored`.
pub fn encode_variant<R: ReferenceGenome>(
    variant: &Variant,
    matches: &[TranscriptMatch],
    annotator: &Annotator,
    genome: &R,
    distance: usize,
) -> Result<Vec<PairEncoding>> {
    let pairs = variant.alternates.len() * matches.len();
    if pairs == 0 {
        return Ok(Vec::new());
    }
    if !variant.is_well_formed() {
        warn!("skipping record (bad input): {variant}");
        return Ok(vec![PairEncoding::Absent; pairs]);
    }
    let Some(seq) = fetch_window(variant, genome, distance) else {
        return Ok(vec![PairEncoding::Absent; pairs]);
    };

    let wid = window_width(distance);
    let half = (wid / 2) as i64;
    let ref_len = variant.reference.len();
    let mut out = Vec::with_capacity(pairs);

    for (alt, tx) in iproduct!(&variant.alternates, matches) {
        if !Variant::is_supported_alt(alt) {
            out.push(PairEncoding::Absent);
            continue;
        }
        if ref_len > 1 && alt.len() > 1 {
            out.push(PairEncoding::Unscored);
            continue;
        }

        let pd = annotator.position_data(tx.index, variant.pos)?;
        // pad with N beyond the transcript span so context outside the
        // transcript carries no signal
        let pad_left = (half + pd.dist_tx_start).max(0) as usize;
        let pad_right = (half - pd.dist_tx_end).max(0) as usize;
        if pad_left + pad_right > wid {
            warn!("skipping pair (transcript {} shorter than window): {variant}", tx.gene);
            out.push(PairEncoding::Absent);
            continue;
        }
        let mut ref_window = vec![b'N'; pad_left];
        ref_window.extend_from_slice(&seq[pad_left..wid - pad_right]);
        ref_window.resize(wid, b'N');

        let mut alt_window = Vec::with_capacity(wid - ref_len + alt.len());
        alt_window.extend_from_slice(&ref_window[..wid / 2]);
        alt_window.extend_from_slice(alt.as_bytes());
        alt_window.extend_from_slice(&ref_window[wid / 2 + ref_len..]);

        let mut x_ref = one_hot_encode(&ref_window);
        let mut x_alt = one_hot_encode(&alt_window);
        if tx.strand == Strand::Reverse {
            x_ref = reverse_complement_encoding(&x_ref);
            x_alt = reverse_complement_encoding(&x_alt);
        }
        out.push(PairEncoding::Scored { x_ref, x_alt });
    }
    Ok(out)
}
