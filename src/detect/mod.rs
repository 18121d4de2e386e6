//! Stimulation-artifact detection.
//!
//! - [`external`]: fixed-threshold, polarity-aware scan of the detrended
//!   external bipolar channel.
//! - [`intracranial`]: threshold/percentile and matched-filter (kernel)
//!   detectors for the raw intracranial channel.
//! - [`kernel`]: the two matched-filter templates and their sliding response.
//!
//! Every detector is a pure function of its input and returns
//! [`SyncError::NoArtifactFound`](crate::SyncError::NoArtifactFound) rather
//! than an empty or placeholder result.

pub mod external;
pub mod intracranial;
pub mod kernel;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{ExternalParams, KernelParams, ThresholdParams};
use crate::error::SyncError;

pub use external::find_external_artifact;
pub use intracranial::{
    find_intracranial_artifact, find_kernel_artifacts, find_threshold_artifact,
    reject_amplitude_outliers, Detection,
};
pub use kernel::{kernel_response, Kernel};

/// Detection method for the intracranial recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum IntracranialMethod {
    /// Peak-to-peak threshold crossing refined by a percentile bound.
    #[serde(rename = "thresh")]
    Threshold(ThresholdParams),
    /// Matched filter with the `[1, -1]` edge template.
    #[serde(rename = "1")]
    Kernel1(KernelParams),
    /// Matched filter with the edge + slow-recovery template.
    #[serde(rename = "2")]
    Kernel2(KernelParams),
    /// Operator picks the onset through the injected picker.
    #[serde(rename = "manual")]
    Manual,
}

impl IntracranialMethod {
    /// Short tag used in logs and provenance records.
    pub fn tag(&self) -> &'static str {
        match self {
            IntracranialMethod::Threshold(_) => "thresh",
            IntracranialMethod::Kernel1(_) => "1",
            IntracranialMethod::Kernel2(_) => "2",
            IntracranialMethod::Manual => "manual",
        }
    }
}

impl FromStr for IntracranialMethod {
    type Err = SyncError;

    /// Parse a method tag with default parameters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "thresh" => Ok(IntracranialMethod::Threshold(ThresholdParams::default())),
            "1" => Ok(IntracranialMethod::Kernel1(KernelParams::default())),
            "2" => Ok(IntracranialMethod::Kernel2(KernelParams::default())),
            "manual" => Ok(IntracranialMethod::Manual),
            _ => Err(SyncError::InvalidMethod(s.to_string())),
        }
    }
}

impl std::fmt::Display for IntracranialMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Detection method for the external recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum ExternalMethod {
    FixedThreshold(ExternalParams),
    Manual,
}

impl ExternalMethod {
    pub fn tag(&self) -> &'static str {
        match self {
            ExternalMethod::FixedThreshold(_) => "fixed-threshold",
            ExternalMethod::Manual => "manual",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_tags() {
        for tag in ["thresh", "1", "2", "manual", " MANUAL "] {
            let m: IntracranialMethod = tag.parse().unwrap();
            assert_eq!(m.tag(), tag.trim().to_lowercase());
        }
    }

    #[test]
    fn parse_invalid_tag_lists_valid_ones() {
        let err = "kernel3".parse::<IntracranialMethod>().unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, SyncError::InvalidMethod(_)));
        for tag in ["thresh", "1", "2", "manual"] {
            assert!(msg.contains(tag), "{msg}");
        }
    }

    #[test]
    fn method_json_uses_tags() {
        let m: IntracranialMethod =
            serde_json::from_str(r#"{ "method": "2", "width_ratio": 3.0 }"#).unwrap();
        match m {
            IntracranialMethod::Kernel2(p) => {
                assert_eq!(p.width_ratio, 3.0);
                assert_eq!(p.tie_break_samples, 50);
            }
            other => panic!("unexpected method {other:?}"),
        }
        let json = serde_json::to_string(&IntracranialMethod::Manual).unwrap();
        assert_eq!(json, r#"{"method":"manual"}"#);
    }
}
