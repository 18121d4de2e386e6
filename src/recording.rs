//! Multi-channel recordings as handed over by the loading layer.
//!
//! `data` is `[C, T]` (channel × sample), one shared sampling frequency, and a
//! parallel list of unique channel names.
use ndarray::{s, Array2, ArrayView1};

use crate::error::{Result, SyncError};

#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    data: Array2<f64>,
    ch_names: Vec<String>,
    sfreq: u32,
}

impl Recording {
    /// Validate and wrap a `[C, T]` array.
    ///
    /// Fails when `ch_names.len()` differs from the row count, when a name is
    /// repeated, or when `sfreq` is zero.
    pub fn new(data: Array2<f64>, ch_names: Vec<String>, sfreq: u32) -> Result<Self> {
        if sfreq == 0 {
            return Err(SyncError::ShapeMismatch("sampling frequency must be positive".into()));
        }
        if ch_names.len() != data.nrows() {
            return Err(SyncError::ShapeMismatch(format!(
                "{} channel names for {} channels",
                ch_names.len(),
                data.nrows()
            )));
        }
        for (i, name) in ch_names.iter().enumerate() {
            if ch_names[..i].contains(name) {
                return Err(SyncError::ShapeMismatch(format!("duplicate channel name {name:?}")));
            }
        }
        Ok(Self { data, ch_names, sfreq })
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn ch_names(&self) -> &[String] {
        &self.ch_names
    }

    pub fn sfreq(&self) -> u32 {
        self.sfreq
    }

    pub fn n_channels(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    /// `n_samples / sfreq`.
    pub fn duration_secs(&self) -> f64 {
        self.n_samples() as f64 / self.sfreq as f64
    }

    pub fn channel(&self, idx: usize) -> Result<ArrayView1<'_, f64>> {
        if idx >= self.n_channels() {
            return Err(SyncError::ShapeMismatch(format!(
                "channel index {idx} out of range for {} channels",
                self.n_channels()
            )));
        }
        Ok(self.data.row(idx))
    }

    /// Owned copy of one channel, the form the detectors take.
    pub fn channel_vec(&self, idx: usize) -> Result<Vec<f64>> {
        Ok(self.channel(idx)?.to_vec())
    }

    /// Index of the channel called `name`.
    ///
    /// Name normalisation: lowercase + strip spaces.
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        let norm = |s: &str| s.replace(' ', "").to_lowercase();
        self.ch_names.iter().position(|n| norm(n) == norm(name))
    }

    /// Samples `start .. start + len` of every channel, names and rate kept.
    pub(crate) fn crop(&self, start: usize, len: usize) -> Self {
        Self {
            data: self.data.slice(s![.., start..start + len]).to_owned(),
            ch_names: self.ch_names.clone(),
            sfreq: self.sfreq,
        }
    }
}
