use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::foundation::error::TermlayerError;

/// How an image is fitted into its layer box.
///
/// Wire names match the external renderer's `scaler` field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalePolicy {
    /// Clamp each axis independently to the box. Not a true crop.
    #[serde(rename = "crop")]
    Crop,
    /// Same behavior as [`ScalePolicy::Crop`].
    #[serde(rename = "cover")]
    Cover,
    /// Stretch to exactly the box, ignoring aspect.
    #[serde(rename = "distort")]
    Distort,
    /// Same behavior as [`ScalePolicy::Distort`].
    #[serde(rename = "forced_cover")]
    ForcedCover,
    /// Preserve aspect, shrink to fit, never upscale.
    #[default]
    #[serde(rename = "contain")]
    ContainFit,
    /// Preserve aspect and always fill one axis of the box.
    #[serde(rename = "fit_contain")]
    ContainFitUpscale,
}

impl ScalePolicy {
    /// Every policy, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Crop,
        Self::Cover,
        Self::Distort,
        Self::ForcedCover,
        Self::ContainFit,
        Self::ContainFitUpscale,
    ];

    /// Wire name of the policy.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Crop => "crop",
            Self::Cover => "cover",
            Self::Distort => "distort",
            Self::ForcedCover => "forced_cover",
            Self::ContainFit => "contain",
            Self::ContainFitUpscale => "fit_contain",
        }
    }
}

impl fmt::Display for ScalePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScalePolicy {
    type Err = TermlayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| TermlayerError::config(format!("invalid scaler '{s}'")))
    }
}
