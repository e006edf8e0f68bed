//! Score-level properties of the whole encode/score/extract path, checked
//! against hand-computed tracks of the stub ensemble.
//!
//! The fixture plants the 9-mer AAAACGGGG around the variant so every
//! affected position gets a distinct, exactly-representable score. A C>T
//! substitution at the centre lowers the acceptor track (C and G carry the
//! heavy acceptor weight) and raises the donor track, with unique extrema
//! one base away from the variant on either side.
mod common;

use common::{random_sequence, reverse_complement, stub_ensemble};
use deltasplice::{score_variant, Annotator, InMemoryGenome, ScoringOptions, Variant};

const CONTIG_LEN: usize = 25_000;
const POS: i64 = 12_500;

fn options(mask: bool) -> ScoringOptions {
    ScoringOptions {
        distance: 10,
        mask,
        batch_size: 1,
    }
}

fn forward_sequence() -> String {
    let mut seq = random_sequence(CONTIG_LEN, 11);
    // positions 12496..=12504, variant ref base C at 12500
    seq.replace_range(12_495..12_504, "AAAACGGGG");
    seq
}

fn forward_setup() -> (InMemoryGenome, Annotator, Variant) {
    let mut genome = InMemoryGenome::new();
    genome.insert("chr1", &forward_sequence());
    let table = "#NAME\tCHROM\tSTRAND\tTX_START\tTX_END\tEXON_START\tEXON_END\n\
                 PLUS\tchr1\t+\t6000\t19000\t6000,\t19000,\n";
    let annotator = Annotator::from_reader(table.as_bytes()).unwrap();
    (genome, annotator, Variant::new("chr1", POS, "C", &["T"]))
}

/// The same locus mirrored: reverse-complemented contig, transcript on the
/// minus strand, complemented alleles at the reflected position. The
/// transcript span reflects onto itself, so the table keeps its
/// coordinates.
fn mirrored_setup() -> (InMemoryGenome, Annotator, Variant) {
    let mut genome = InMemoryGenome::new();
    genome.insert("chr1", &reverse_complement(&forward_sequence()));
    let table = "#NAME\tCHROM\tSTRAND\tTX_START\tTX_END\tEXON_START\tEXON_END\n\
                 MINUS\tchr1\t-\t6000\t19000\t6000,\t19000,\n";
    let annotator = Annotator::from_reader(table.as_bytes()).unwrap();
    let pos = CONTIG_LEN as i64 - POS + 1;
    (genome, annotator, Variant::new("chr1", pos, "G", &["A"]))
}

#[test]
fn test_forward_scores_match_hand_computed_tracks() {
    let (genome, annotator, variant) = forward_setup();
    let scorer = stub_ensemble();
    let out = score_variant(&variant, &annotator, &genome, &scorer, &options(false)).unwrap();
    // acceptor loss peaks one base right of the variant, donor gain one
    // base left; the all-nonpositive gain channels report 0.00 with the
    // argmax parked at the window start
    assert_eq!(out, vec!["T|PLUS|0.00|0.14|0.05|0.00|-10|1|-1|-10"]);
}

#[test]
fn test_scores_are_strand_symmetric() {
    let scorer = stub_ensemble();
    let (genome, annotator, variant) = forward_setup();
    let fwd = score_variant(&variant, &annotator, &genome, &scorer, &options(false)).unwrap();
    let (genome, annotator, variant) = mirrored_setup();
    let rev = score_variant(&variant, &annotator, &genome, &scorer, &options(false)).unwrap();

    // same scores, reflected positions
    assert_eq!(rev, vec!["A|MINUS|0.00|0.14|0.05|0.00|-10|-1|1|-10"]);
    let f: Vec<&str> = fwd[0].split('|').collect();
    let r: Vec<&str> = rev[0].split('|').collect();
    assert_eq!(f[2..6], r[2..6]);
    for (df, dr) in [(f[7], r[7]), (f[8], r[8])] {
        assert_eq!(df.parse::<i64>().unwrap(), -dr.parse::<i64>().unwrap());
    }
}

#[test]
fn test_mask_keeps_gains_away_from_annotated_boundaries() {
    let (genome, annotator, variant) = forward_setup();
    let scorer = stub_ensemble();
    let out = score_variant(&variant, &annotator, &genome, &scorer, &options(true)).unwrap();
    // the nearest exon boundary is thousands of bases away: unannotated
    // losses are suppressed, gains survive
    assert_eq!(out, vec!["T|PLUS|0.00|0.00|0.05|0.00|-10|1|-1|-10"]);
}

#[test]
fn test_mask_suppresses_gain_at_the_boundary() {
    let (genome, _, variant) = forward_setup();
    // exon boundary one base left of the variant, right where the donor
    // gain peaks
    let table = "#NAME\tCHROM\tSTRAND\tTX_START\tTX_END\tEXON_START\tEXON_END\n\
                 PLUS2\tchr1\t+\t6000\t19000\t6000,12498,\t12499,19000,\n";
    let annotator = Annotator::from_reader(table.as_bytes()).unwrap();
    let scorer = stub_ensemble();
    let out = score_variant(&variant, &annotator, &genome, &scorer, &options(true)).unwrap();
    assert_eq!(out, vec!["T|PLUS2|0.00|0.00|0.00|0.00|-10|1|-1|-10"]);
}
