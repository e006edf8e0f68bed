//! Delta-score extraction: compares reference and mutated probability
//! tracks for one (allele, transcript) pair and formats the annotation.
use crate::sequence::Strand;
use anyhow::{ensure, Result};
use ndarray::{concatenate, s, Array1, Array2, ArrayView2, Axis};

/// Track channel holding acceptor-site probabilities.
pub const ACCEPTOR: usize = 1;
/// Track channel holding donor-site probabilities.
pub const DONOR: usize = 2;

/// Fixed annotation for pairs the model never sees (complex indels).
pub fn unscored_annotation(alt: &str, gene: &str) -> String {
    format!("{alt}|{gene}|.|.|.|.|.|.|.|.")
}

/// First-occurrence argmax, standard numpy semantics on ties.
fn argmax(values: &Array1<f32>) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Restore positional alignment of the alt track with the ref track.
///
/// A deletion shortens the alt track, so zero rows are spliced back in
/// right after the substitution point; an insertion lengthens it, so the
/// inserted span collapses to a single per-channel maximum.
fn realign_indel(
    y_alt: Array2<f32>,
    ref_len: usize,
    alt_len: usize,
    centre: usize,
) -> Result<Array2<f32>> {
    if ref_len > 1 && alt_len == 1 {
        let del_len = ref_len - alt_len;
        // a deletion longer than half the coverage leaves fewer than
        // centre + alt_len rows; clamp the split so the zeros land at the
        // track end and the result still spans `cov` rows
        let split = (centre + alt_len).min(y_alt.nrows());
        let zeros = Array2::zeros((del_len, y_alt.ncols()));
        Ok(concatenate(
            Axis(0),
            &[
                y_alt.slice(s![..split, ..]),
                zeros.view(),
                y_alt.slice(s![split.., ..]),
            ],
        )?)
    } else if ref_len == 1 && alt_len > 1 {
        let collapsed = y_alt
            .slice(s![centre..centre + alt_len, ..])
            .map_axis(Axis(0), |channel| {
                channel.fold(f32::NEG_INFINITY, |a, &b| a.max(b))
            });
        Ok(concatenate(
            Axis(0),
            &[
                y_alt.slice(s![..centre, ..]),
                collapsed.view().insert_axis(Axis(0)),
                y_alt.slice(s![centre + alt_len.., ..]),
            ],
        )?)
    } else {
        Ok(y_alt)
    }
}

/// Compute the four directional delta scores for one pair and format the
/// pipe-delimited annotation string.
///
/// `y_ref`/`y_alt` are the (positions, 3) tracks in transcript orientation
/// as returned by the scorer; `dist_exon_boundary` is the signed distance
/// to the closest annotated exon boundary, used by the masking policy.
#[allow(clippy::too_many_arguments)]
pub fn extract_delta_score(
    alt: &str,
    gene: &str,
    y_ref: ArrayView2<f32>,
    y_alt: ArrayView2<f32>,
    ref_len: usize,
    alt_len: usize,
    strand: Strand,
    cov: usize,
    dist_exon_boundary: i64,
    mask: bool,
) -> Result<String> {
    // encoding already flipped the channel axis for `-` transcripts; only
    // the positional order has to come back to genomic orientation here
    let (y_ref, y_alt) = match strand {
        Strand::Forward => (y_ref.to_owned(), y_alt.to_owned()),
        Strand::Reverse => (
            y_ref.slice(s![..;-1, ..]).to_owned(),
            y_alt.slice(s![..;-1, ..]).to_owned(),
        ),
    };
    let centre = cov / 2;
    let y_alt = realign_indel(y_alt, ref_len, alt_len, centre)?;
    ensure!(
        y_ref.nrows() == cov && y_alt.nrows() == cov,
        "track lengths {}/{} do not match coverage {cov}",
        y_ref.nrows(),
        y_alt.nrows()
    );

    // losses are ref - alt rather than a negated gain: negating a zero
    // difference would print as -0.00
    let acceptor_gain = &y_alt.column(ACCEPTOR) - &y_ref.column(ACCEPTOR);
    let acceptor_loss = &y_ref.column(ACCEPTOR) - &y_alt.column(ACCEPTOR);
    let donor_gain = &y_alt.column(DONOR) - &y_ref.column(DONOR);
    let donor_loss = &y_ref.column(DONOR) - &y_alt.column(DONOR);

    let idx_ag = argmax(&acceptor_gain);
    let idx_al = argmax(&acceptor_loss);
    let idx_dg = argmax(&donor_gain);
    let idx_dl = argmax(&donor_loss);

    let dp_ag = idx_ag as i64 - centre as i64;
    let dp_al = idx_al as i64 - centre as i64;
    let dp_dg = idx_dg as i64 - centre as i64;
    let dp_dl = idx_dl as i64 - centre as i64;

    // gains are suppressed at the annotated boundary, losses away from it:
    // only unexpected signal is informative
    let masked = |score: f32, suppress: bool| if suppress { 0.0 } else { score };
    let ds_ag = masked(acceptor_gain[idx_ag], mask && dp_ag == dist_exon_boundary);
    let ds_al = masked(acceptor_loss[idx_al], mask && dp_al != dist_exon_boundary);
    let ds_dg = masked(donor_gain[idx_dg], mask && dp_dg == dist_exon_boundary);
    let ds_dl = masked(donor_loss[idx_dl], mask && dp_dl != dist_exon_boundary);

    Ok(format!(
        "{alt}|{gene}|{ds_ag:.2}|{ds_al:.2}|{ds_dg:.2}|{ds_dl:.2}|{dp_ag}|{dp_al}|{dp_dg}|{dp_dl}"
    ))
}
