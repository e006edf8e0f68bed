//! Variant records as handed over by the VCF reader, and the annotated
//! records handed back to the writer.
use std::fmt;

/// Name of the INFO field carrying the delta-score annotations.
pub const INFO_FIELD: &str = "SpliceAI";

/// A single variant record: chromosome, 1-based position, reference allele
/// and the ordered alternate alleles. Immutable once read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variant {
    pub chrom: String,
    pub pos: i64,
    pub reference: String,
    pub alternates: Vec<String>,
}

impl Variant {
    pub fn new(chrom: &str, pos: i64, reference: &str, alternates: &[&str]) -> Variant {
        Variant {
            chrom: chrom.to_string(),
            pos,
            reference: reference.to_string(),
            alternates: alternates.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Minimal structural check applied once per record; anything failing
    /// here is skipped, not fatal.
    pub fn is_well_formed(&self) -> bool {
        !self.chrom.is_empty() && self.pos >= 1 && !self.reference.is_empty()
    }

    /// Symbolic or unresolved alternate alleles (breakends, `<DEL>`, spanning
    /// deletions...) cannot be encoded and are skipped per allele.
    pub fn is_supported_alt(alt: &str) -> bool {
        !alt.is_empty() && !alt.contains(['.', '-', '*', '<', '>'])
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}:{} {}>{}",
            self.chrom,
            self.pos,
            self.reference,
            self.alternates.join(",")
        )
    }
}

/// A variant together with the annotation strings it received (possibly
/// none). Emitted downstream in strict input order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotatedRecord {
    pub variant: Variant,
    pub annotations: Vec<String>,
}

impl AnnotatedRecord {
    /// Value for the `SpliceAI` INFO field, or `None` when the record
    /// received no annotation and should pass through unchanged.
    pub fn info_value(&self) -> Option<String> {
        if self.annotations.is_empty() {
            None
        } else {
            Some(self.annotations.join(","))
        }
    }
}
