use serde::{Deserialize, Serialize};

/// How an impact builds up (or fades) after its event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactShape {
    /// Full effect at once, fading 10% per month after the first quarter.
    Immediate,
    /// Linear ramp to the full effect over two years.
    #[default]
    Gradual,
    /// Logistic adoption curve centred on month 12.
    Saturating,
    /// Grows with the square root of elapsed years.
    Network,
}

impl ImpactShape {
    /// Months over which `Gradual` reaches the full magnitude.
    pub const GRADUAL_RAMP_MONTHS: u32 = 24;

    /// Realized effect `months` after the event for a total `magnitude`.
    #[must_use]
    pub fn response(self, magnitude: f64, months: u32) -> f64 {
        let m = f64::from(months);
        match self {
            Self::Immediate => {
                if months <= 1 {
                    magnitude
                } else if months <= 3 {
                    magnitude * 0.8
                } else {
                    magnitude * (1.0 - (m - 3.0) * 0.1).max(0.0)
                }
            }
            Self::Gradual => {
                if months == 0 {
                    0.0
                } else if months >= Self::GRADUAL_RAMP_MONTHS {
                    magnitude
                } else {
                    magnitude * m / f64::from(Self::GRADUAL_RAMP_MONTHS)
                }
            }
            Self::Saturating => {
                if months == 0 {
                    0.0
                } else {
                    magnitude / (1.0 + (-0.2 * (m - 12.0)).exp())
                }
            }
            Self::Network => {
                if months == 0 {
                    0.0
                } else {
                    magnitude * (m / 12.0).sqrt()
                }
            }
        }
    }
}
