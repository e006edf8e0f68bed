//! Ensemble scorer adapter: the boundary to the opaque sequence-to-
//! probability models. Each member maps a one-hot batch to a per-position
//! probability track; the ensemble output is their elementwise mean.
use anyhow::{ensure, Result};
use ndarray::Array3;
use rayon::prelude::*;

/// Flanking context the models consume without scoring: the output track is
/// this much narrower than the input window.
pub const CONTEXT_TRIM: usize = 10000;

/// Output channels per position: not-splice, acceptor, donor.
pub const TRACK_CHANNELS: usize = 3;

/// One pretrained ensemble member. Implementations must be pure: every
/// input row yields exactly one output row, in submission order.
pub trait SpliceModel: Send + Sync {
    /// Maps (rows, width, 4) one-hot tensors to (rows, width - 10000, 3)
    /// probability tracks.
    fn predict(&self, batch: &Array3<f32>) -> Result<Array3<f32>>;
}

/// Batch scoring capability consumed by the aggregator. A failure here is
/// fatal for the run: once the row-count/order contract is broken, partial
/// results cannot be reconciled safely.
pub trait Scorer {
    fn score(&self, batch: &Array3<f32>) -> Result<Array3<f32>>;
}

/// Averages the probability tracks of every ensemble member.
pub struct Ensemble {
    members: Vec<Box<dyn SpliceModel>>,
}

impl Ensemble {
    pub fn new(members: Vec<Box<dyn SpliceModel>>) -> Result<Ensemble> {
        ensure!(!members.is_empty(), "ensemble needs at least one member");
        Ok(Ensemble { members })
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Scorer for Ensemble {
    fn score(&self, batch: &Array3<f32>) -> Result<Array3<f32>> {
        let (rows, width, channels) = batch.dim();
        ensure!(channels == 4, "expected one-hot batch, got {channels} channels");
        ensure!(
            width > CONTEXT_TRIM,
            "window of width {width} is narrower than the model context"
        );
        let expected = (rows, width - CONTEXT_TRIM, TRACK_CHANNELS);

        let tracks: Vec<Array3<f32>> = self
            .members
            .par_iter()
            .map(|member| {
                let track = member.predict(batch)?;
                ensure!(
                    track.dim() == expected,
                    "model returned track of shape {:?}, expected {:?}",
                    track.dim(),
                    expected
                );
                Ok(track)
            })
            .collect::<Result<_>>()?;

        let mut mean = Array3::zeros(expected);
        for track in &tracks {
            mean += track;
        }
        mean /= self.members.len() as f32;
        Ok(mean)
    }
}
