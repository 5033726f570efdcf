//! Dark-pixel classification for logo background removal.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Default summed-channel threshold.
pub const DEFAULT_SUM_THRESHOLD: u16 = 50;

/// Rule deciding whether a logo pixel is background.
///
/// Textual forms: `exact`, `sum:<n>`, `channel:<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "threshold", rename_all = "snake_case")]
pub enum DarknessPolicy {
    /// Only pure black (0, 0, 0).
    ExactBlack,
    /// `r + g + b < threshold`.
    SumBelow(u16),
    /// Every channel `< threshold`.
    ChannelBelow(u8),
}

impl Default for DarknessPolicy {
    fn default() -> Self {
        DarknessPolicy::SumBelow(DEFAULT_SUM_THRESHOLD)
    }
}

impl DarknessPolicy {
    /// Classify an RGB triple.
    pub fn is_dark(&self, r: u8, g: u8, b: u8) -> bool {
        match *self {
            DarknessPolicy::ExactBlack => r == 0 && g == 0 && b == 0,
            DarknessPolicy::SumBelow(threshold) => {
                (r as u16) + (g as u16) + (b as u16) < threshold
            }
            DarknessPolicy::ChannelBelow(threshold) => {
                r < threshold && g < threshold && b < threshold
            }
        }
    }
}

impl fmt::Display for DarknessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DarknessPolicy::ExactBlack => write!(f, "exact"),
            DarknessPolicy::SumBelow(t) => write!(f, "sum:{}", t),
            DarknessPolicy::ChannelBelow(t) => write!(f, "channel:{}", t),
        }
    }
}

impl FromStr for DarknessPolicy {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        if value == "exact" {
            return Ok(DarknessPolicy::ExactBlack);
        }

        let invalid = || ParseError::InvalidDarknessPolicy(s.to_string());
        let (kind, threshold) = value.split_once(':').ok_or_else(invalid)?;
        match kind {
            "sum" => threshold
                .parse::<u16>()
                .map(DarknessPolicy::SumBelow)
                .map_err(|_| invalid()),
            "channel" => threshold
                .parse::<u8>()
                .map(DarknessPolicy::ChannelBelow)
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_sum_50() {
        let policy = DarknessPolicy::default();
        assert!(policy.is_dark(10, 10, 10));
        assert!(policy.is_dark(49, 0, 0));
        assert!(!policy.is_dark(20, 20, 10));
    }

    #[test]
    fn test_policies_disagree_where_expected() {
        // Near-black but not exact
        assert!(!DarknessPolicy::ExactBlack.is_dark(1, 0, 0));
        assert!(DarknessPolicy::ChannelBelow(50).is_dark(40, 40, 40));
        assert!(!DarknessPolicy::SumBelow(50).is_dark(40, 40, 40));
    }

    #[test]
    fn test_parse_round_trip_forms() {
        assert_eq!("exact".parse::<DarknessPolicy>().unwrap(), DarknessPolicy::ExactBlack);
        assert_eq!("sum:75".parse::<DarknessPolicy>().unwrap(), DarknessPolicy::SumBelow(75));
        assert_eq!(
            "Channel:30".parse::<DarknessPolicy>().unwrap(),
            DarknessPolicy::ChannelBelow(30)
        );
        assert_eq!(DarknessPolicy::SumBelow(50).to_string(), "sum:50");
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("luma:20".parse::<DarknessPolicy>().is_err());
        assert!("channel:300".parse::<DarknessPolicy>().is_err());
        assert!("sum".parse::<DarknessPolicy>().is_err());
    }
}
