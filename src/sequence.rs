//! Nucleotide sequences: one-hot encodings, strand handling and
//! chromosome-name conventions.
use ndarray::{s, Array2};
use phf::phf_map;
use serde::Deserialize;
use std::fmt;

/// Channel order of the one-hot encoding (N maps to an all-zero row).
pub const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

pub static BASE_CHANNEL: phf::Map<u8, usize> = phf_map! {
    b'A' => 0, b'C' => 1, b'G' => 2, b'T' => 3,
};

/// Orientation of a transcript on the genome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Forward,
    #[serde(rename = "-")]
    Reverse,
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
        }
    }
}

/// One-hot encode a nucleotide sequence into a (length, 4) matrix.
/// Lowercase bases are accepted, anything outside ACGT encodes as zeros.
pub fn one_hot_encode(seq: &[u8]) -> Array2<f32> {
    let mut x = Array2::zeros((seq.len(), 4));
    for (i, b) in seq.iter().enumerate() {
        if let Some(&channel) = BASE_CHANNEL.get(&b.to_ascii_uppercase()) {
            x[[i, channel]] = 1.0;
        }
    }
    x
}

/// Reverse-complement an encoding in one-hot space: reversing the position
/// axis flips the sequence, reversing the channel axis swaps A<->T and C<->G.
pub fn reverse_complement_encoding(x: &Array2<f32>) -> Array2<f32> {
    x.slice(s![..;-1, ..;-1]).to_owned()
}

pub fn has_chr_prefix(name: &str) -> bool {
    name.starts_with("chr")
}

/// Standardise a chromosome name to match the naming convention of a backing
/// source, adding or stripping the `chr` prefix as required.
pub fn normalise_chrom(source: &str, target_has_prefix: bool) -> String {
    match (has_chr_prefix(source), target_has_prefix) {
        (true, false) => source.trim_start_matches("chr").to_string(),
        (false, true) => format!("chr{source}"),
        _ => source.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_chrom() {
        assert_eq!(normalise_chrom("1", has_chr_prefix("1")), "1");
        assert_eq!(normalise_chrom("1", has_chr_prefix("2")), "1");
        assert_eq!(normalise_chrom("1", has_chr_prefix("chr2")), "chr1");
        assert_eq!(normalise_chrom("chr1", has_chr_prefix("chr2")), "chr1");
        assert_eq!(normalise_chrom("chr1", has_chr_prefix("2")), "1");
    }

    #[test]
    fn test_one_hot_encode() {
        let x = one_hot_encode(b"ACGTNa");
        assert_eq!(x.nrows(), 6);
        assert_eq!(x.row(0).to_vec(), vec![1., 0., 0., 0.]);
        assert_eq!(x.row(1).to_vec(), vec![0., 1., 0., 0.]);
        assert_eq!(x.row(2).to_vec(), vec![0., 0., 1., 0.]);
        assert_eq!(x.row(3).to_vec(), vec![0., 0., 0., 1.]);
        assert_eq!(x.row(4).to_vec(), vec![0., 0., 0., 0.]);
        assert_eq!(x.row(5).to_vec(), vec![1., 0., 0., 0.]);
    }

    #[test]
    fn test_reverse_complement_encoding() {
        // AC reverse-complemented is GT
        let x = one_hot_encode(b"AC");
        let rc = reverse_complement_encoding(&x);
        assert_eq!(rc, one_hot_encode(b"GT"));
    }
}
