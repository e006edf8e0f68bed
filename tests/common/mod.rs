#![allow(dead_code)]

use anyhow::Result;
use deltasplice::scorer::{CONTEXT_TRIM, TRACK_CHANNELS};
use deltasplice::{
    AnnotatedRecord, AnnotationSink, Annotator, Ensemble, InMemoryGenome, ReferenceGenome, Scorer,
    SpliceModel, Variant, VariantSource,
};
use ndarray::Array3;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Deterministic pseudo-random nucleotide sequence, no RNG dependency.
pub fn random_sequence(len: usize, seed: u64) -> String {
    let mut state = seed.wrapping_add(0x9e3779b97f4a7c15);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            b"ACGT"[(state >> 33) as usize % 4] as char
        })
        .collect()
}

pub fn reverse_complement(seq: &str) -> String {
    seq.bytes()
        .rev()
        .map(|b| match b {
            b'A' => 'T',
            b'C' => 'G',
            b'G' => 'C',
            b'T' => 'A',
            other => other as char,
        })
        .collect()
}

pub fn complement(base: &str) -> String {
    reverse_complement(base)
}

/// A substitution that always switches between the A/T and C/G weight
/// classes of the stub model, so every substituted allele moves the score.
pub fn substitute(base: &str) -> String {
    match base {
        "A" => "C",
        "C" => "T",
        "G" => "A",
        _ => "G",
    }
    .to_string()
}

/// Reference bases at a 1-based position, so test variants can declare a
/// matching ref allele without hard-coding the fixture sequence.
pub fn bases_at(genome: &InMemoryGenome, chrom: &str, pos: i64, len: i64) -> String {
    let slice = genome
        .slice(chrom, pos - 1, pos - 1 + len)
        .expect("fixture position outside contig");
    String::from_utf8(slice).unwrap()
}

const KERNEL: [f32; 3] = [1.0, 1.0, 0.5];
const REACH: i64 = 2;
const SCALE: f32 = 0.0625;

/// Stand-in ensemble member: each output position is the squared,
/// kernel-weighted base count of a 5-base window around the aligned input
/// position.
///
/// Channel weights are complement-symmetric (A and T share one weight, C
/// and G the other) and the kernel is mirror-symmetric, so the model is
/// reverse-complement equivariant. All weights are dyadic rationals, which
/// keeps the window sums exact in f32; together with row independence this
/// makes batched, unbatched and strand-mirrored runs agree bit for bit.
pub struct WindowModel {
    pub acc_at: f32,
    pub acc_cg: f32,
    pub don_at: f32,
    pub don_cg: f32,
}

impl SpliceModel for WindowModel {
    fn predict(&self, batch: &Array3<f32>) -> Result<Array3<f32>> {
        let (rows, width, _) = batch.dim();
        let out_len = width - CONTEXT_TRIM;
        let w_acc = [self.acc_at, self.acc_cg, self.acc_cg, self.acc_at];
        let w_don = [self.don_at, self.don_cg, self.don_cg, self.don_at];
        let mut y = Array3::zeros((rows, out_len, TRACK_CHANNELS));
        for r in 0..rows {
            for p in 0..out_len {
                let centre = (p + CONTEXT_TRIM / 2) as i64;
                let mut acc = 0.0f32;
                let mut don = 0.0f32;
                for offset in -REACH..=REACH {
                    let kern = KERNEL[offset.unsigned_abs() as usize];
                    let j = (centre + offset) as usize;
                    for c in 0..4 {
                        let v = batch[[r, j, c]] * kern;
                        acc += v * w_acc[c];
                        don += v * w_don[c];
                    }
                }
                y[[r, p, 1]] = acc * acc * SCALE;
                y[[r, p, 2]] = don * don * SCALE;
                y[[r, p, 0]] = 1.0 - (y[[r, p, 1]] + y[[r, p, 2]]) * 0.5;
            }
        }
        Ok(y)
    }
}

/// Two-member ensemble with distinct dyadic weights.
pub fn stub_ensemble() -> Ensemble {
    Ensemble::new(vec![
        Box::new(WindowModel {
            acc_at: 0.125,
            acc_cg: 0.75,
            don_at: 0.5,
            don_cg: 0.25,
        }),
        Box::new(WindowModel {
            acc_at: 0.25,
            acc_cg: 0.625,
            don_at: 0.375,
            don_cg: 0.125,
        }),
    ])
    .unwrap()
}

/// Counts scorer invocations and batch rows, to assert when the model is
/// (not) consulted.
pub struct CountingScorer<S> {
    pub inner: S,
    pub calls: AtomicUsize,
    pub rows: AtomicUsize,
}

impl<S> CountingScorer<S> {
    pub fn new(inner: S) -> Self {
        CountingScorer {
            inner,
            calls: AtomicUsize::new(0),
            rows: AtomicUsize::new(0),
        }
    }
}

impl<S: Scorer> Scorer for CountingScorer<S> {
    fn score(&self, batch: &Array3<f32>) -> Result<Array3<f32>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.rows.fetch_add(batch.dim().0, Ordering::Relaxed);
        self.inner.score(batch)
    }
}

pub struct VecSource {
    items: std::vec::IntoIter<Variant>,
}

impl VecSource {
    pub fn new(items: Vec<Variant>) -> Self {
        VecSource {
            items: items.into_iter(),
        }
    }
}

impl VariantSource for VecSource {
    fn next_variant(&mut self) -> Option<Result<Variant>> {
        self.items.next().map(Ok)
    }
}

#[derive(Default)]
pub struct VecSink {
    pub records: Vec<AnnotatedRecord>,
}

impl AnnotationSink for VecSink {
    fn write(&mut self, record: &AnnotatedRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// 40kb chr10 fixture: two transcripts (one per strand) overlapping around
/// position 15000 and a short one hugging the contig end.
pub fn fixture_genome() -> InMemoryGenome {
    let mut genome = InMemoryGenome::new();
    genome.insert("chr10", &random_sequence(40_000, 7));
    genome
}

pub fn fixture_annotator() -> Annotator {
    let table = "#NAME\tCHROM\tSTRAND\tTX_START\tTX_END\tEXON_START\tEXON_END\n\
                 TUBB8\tchr10\t+\t7000\t23000\t7000,14900,\t12000,23000,\n\
                 MINUS1\tchr10\t-\t7000\t23000\t7000,\t23000,\n\
                 LONELY\tchr10\t+\t30000\t39990\t30000,\t39990,\n";
    Annotator::from_reader(table.as_bytes()).unwrap()
}
