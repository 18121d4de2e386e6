//! IIR filter design and zero-phase application.
//!
//! - [`design`]: first-order Butterworth highpass, matching
//!   `scipy.signal.butter(1, wn, 'highpass')`.
//! - [`apply`]: forward-backward filtering, matching
//!   `scipy.signal.filtfilt` / `lfilter` / `lfilter_zi`.

pub mod apply;
pub mod design;

pub use design::{butter_highpass, IirCoeffs};
pub use apply::{filtfilt, lfilter, lfilter_zi};
