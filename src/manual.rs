//! Human-in-the-loop capabilities: manual onset picking and the
//! accept/reject gate for automated detections.
//!
//! The synchronization core never talks to a UI directly. It asks an injected
//! [`ManualPicker`] for picks and an injected [`Reviewer`] for confirmation.
//! Interactive front-ends implement both traits; tests and batch replays use
//! the scripted implementations below.
use std::collections::VecDeque;

use crate::detect::IntracranialMethod;
use crate::error::{Result, Side, SyncError};

/// What the picker is asked to show.
#[derive(Debug, Clone, Copy)]
pub struct PickRequest<'a> {
    pub side: Side,
    pub signal: &'a [f64],
    pub sfreq: u32,
    pub prompt: &'a str,
}

/// Interactive point picking on a rendered signal.
///
/// Implementations render the signal, allow arbitrary zoom and pan, accept
/// repeated picks and block until the operator confirms. They return every
/// picked x-coordinate (seconds) in the order it was made.
pub trait ManualPicker {
    fn pick(&mut self, request: &PickRequest<'_>) -> Result<Vec<f64>>;
}

/// Anchors presented to the operator for confirmation.
#[derive(Debug, Clone)]
pub struct Review<'a> {
    pub lfp_method: &'a IntracranialMethod,
    pub art_time_lfp: f64,
    pub art_time_external: f64,
    /// All intracranial candidate times (s), first one is the anchor.
    pub lfp_candidates: &'a [f64],
}

/// The "are artifacts properly selected? y/n" gate.
pub trait Reviewer {
    fn confirm(&mut self, review: &Review<'_>) -> Result<bool>;

    /// Gate for the automatically detected external anchor (seconds). A
    /// rejection sends the external side to manual selection.
    fn confirm_external(&mut self, _art_time_external: f64) -> Result<bool> {
        Ok(true)
    }
}

/// Resolve a manual selection to a sample timestamp.
///
/// The most recent pick wins; it is snapped to the nearest sample of
/// `signal`.
pub fn manual_select(
    picker: &mut dyn ManualPicker,
    side: Side,
    signal: &[f64],
    sfreq: u32,
    prompt: &str,
) -> Result<f64> {
    let picks = picker.pick(&PickRequest { side, signal, sfreq, prompt })?;
    let last = *picks.last().ok_or(SyncError::EmptySelection)?;
    let snapped = snap_to_sample(last, signal.len(), sfreq);
    tracing::info!(%side, picked = last, snapped, "manual selection");
    Ok(snapped)
}

/// Nearest sample timestamp to `x` on a grid of `n` samples at `sfreq`.
pub fn snap_to_sample(x: f64, n: usize, sfreq: u32) -> f64 {
    let last = n.saturating_sub(1) as f64;
    let idx = (x * sfreq as f64).round().clamp(0.0, last);
    idx / sfreq as f64
}

// ── Scripted implementations ─────────────────────────────────────────────────

/// Replays pre-recorded pick sessions, one per call.
#[derive(Debug, Default, Clone)]
pub struct ScriptedPicker {
    sessions: VecDeque<Vec<f64>>,
}

impl ScriptedPicker {
    pub fn new(sessions: Vec<Vec<f64>>) -> Self {
        Self { sessions: sessions.into() }
    }

    /// Picker that must never be asked; any call yields an empty selection.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn remaining(&self) -> usize {
        self.sessions.len()
    }
}

impl ManualPicker for ScriptedPicker {
    fn pick(&mut self, _request: &PickRequest<'_>) -> Result<Vec<f64>> {
        self.sessions.pop_front().ok_or(SyncError::EmptySelection)
    }
}

/// Replays pre-recorded answers; answers `false` once exhausted.
///
/// External anchors are accepted unless answers were queued with
/// [`with_external`](Self::with_external).
#[derive(Debug, Default, Clone)]
pub struct ScriptedReviewer {
    answers: VecDeque<bool>,
    external: VecDeque<bool>,
    asked: usize,
}

impl ScriptedReviewer {
    pub fn new(answers: Vec<bool>) -> Self {
        Self { answers: answers.into(), ..Self::default() }
    }

    /// Queue answers for [`Reviewer::confirm_external`].
    pub fn with_external(mut self, answers: Vec<bool>) -> Self {
        self.external = answers.into();
        self
    }

    /// How many reviews were requested so far.
    pub fn asked(&self) -> usize {
        self.asked
    }
}

impl Reviewer for ScriptedReviewer {
    fn confirm(&mut self, _review: &Review<'_>) -> Result<bool> {
        self.asked += 1;
        Ok(self.answers.pop_front().unwrap_or(false))
    }

    fn confirm_external(&mut self, _art_time_external: f64) -> Result<bool> {
        Ok(self.external.pop_front().unwrap_or(true))
    }
}

/// Accepts every detection.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl Reviewer for AcceptAll {
    fn confirm(&mut self, _review: &Review<'_>) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_pick_wins_and_snaps() {
        let signal = vec![0.0; 1000];
        let mut picker = ScriptedPicker::new(vec![vec![0.1, 0.40312]]);
        let t = manual_select(&mut picker, Side::External, &signal, 500, "pick").unwrap();
        // 0.40312 s × 500 Hz = 201.56 → sample 202
        approx::assert_abs_diff_eq!(t, 0.404, epsilon = 1e-12);
        assert_eq!(picker.remaining(), 0);
    }

    #[test]
    fn snap_clamps_to_signal() {
        approx::assert_abs_diff_eq!(snap_to_sample(-0.3, 100, 100), 0.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(snap_to_sample(50.0, 100, 100), 0.99, epsilon = 1e-12);
    }

    #[test]
    fn scripted_reviewer_external_answers() {
        let mut reviewer = ScriptedReviewer::new(vec![]).with_external(vec![false]);
        assert!(!reviewer.confirm_external(2.3).unwrap());
        assert!(reviewer.confirm_external(2.3).unwrap());
        assert!(AcceptAll.confirm_external(2.3).unwrap());
        assert_eq!(reviewer.asked(), 0);
    }

    #[test]
    fn no_pick_is_an_error() {
        let mut picker = ScriptedPicker::new(vec![vec![]]);
        let err = manual_select(&mut picker, Side::Intracranial, &[0.0; 10], 10, "pick").unwrap_err();
        assert!(matches!(err, SyncError::EmptySelection));
    }
}
