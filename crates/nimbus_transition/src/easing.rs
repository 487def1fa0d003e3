//! # Easing Catalog
//!
//! Eleven base curves, each in three flavors:
//!
//! ```text
//! in(t)    = f(t)
//! out(t)   = 1 - f(1 - t)
//! inOut(t) = t < 0.5 ? f(2t) / 2 : 1 - f(2(1 - t)) / 2
//! ```
//!
//! Curves are addressed by `"family.flavor"` strings (`"quadratic.inOut"`)
//! so transition records stay plain data.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::error::{TransitionError, TransitionResult};

/// Base curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EasingFamily {
    /// `t`
    Linear,
    /// `t^2`
    Quadratic,
    /// `t^3`
    Cubic,
    /// `t^4`
    Quartic,
    /// `t^5`
    Quintic,
    /// Quarter cosine.
    Sine,
    /// `2^(10(t-1))`
    Exponential,
    /// Quarter circle.
    Circle,
    /// Overshoots backwards before moving.
    Back,
    /// Decaying oscillation.
    Elastic,
    /// Bouncing-ball rebounds.
    Bounce,
}

impl EasingFamily {
    /// Every family, in catalog order.
    pub const ALL: [Self; 11] = [
        Self::Linear,
        Self::Quadratic,
        Self::Cubic,
        Self::Quartic,
        Self::Quintic,
        Self::Sine,
        Self::Exponential,
        Self::Circle,
        Self::Back,
        Self::Elastic,
        Self::Bounce,
    ];

    /// Catalog name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Quadratic => "quadratic",
            Self::Cubic => "cubic",
            Self::Quartic => "quartic",
            Self::Quintic => "quintic",
            Self::Sine => "sine",
            Self::Exponential => "exponential",
            Self::Circle => "circle",
            Self::Back => "back",
            Self::Elastic => "elastic",
            Self::Bounce => "bounce",
        }
    }

    /// The `in` curve.
    #[must_use]
    pub fn ease_in(self, t: f64) -> f64 {
        match self {
            Self::Linear => t,
            Self::Quadratic => t * t,
            Self::Cubic => t * t * t,
            Self::Quartic => t * t * t * t,
            Self::Quintic => t * t * t * t * t,
            Self::Sine => 1.0 - (t * PI / 2.0).cos(),
            Self::Exponential => {
                if t <= 0.0 {
                    0.0
                } else {
                    2.0_f64.powf(10.0 * (t - 1.0))
                }
            }
            Self::Circle => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            Self::Back => {
                const S: f64 = 1.701_58;
                t * t * ((S + 1.0) * t - S)
            }
            Self::Elastic => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else {
                    -(2.0_f64.powf(10.0 * (t - 1.0))) * ((t - 1.1) * 5.0 * PI).sin()
                }
            }
            Self::Bounce => 1.0 - bounce_out(1.0 - t),
        }
    }
}

fn bounce_out(t: f64) -> f64 {
    const N: f64 = 7.5625;
    const D: f64 = 2.75;
    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let t = t - 1.5 / D;
        N * t * t + 0.75
    } else if t < 2.5 / D {
        let t = t - 2.25 / D;
        N * t * t + 0.9375
    } else {
        let t = t - 2.625 / D;
        N * t * t + 0.984_375
    }
}

/// How a base curve is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EasingFlavor {
    /// Accelerating.
    In,
    /// Decelerating.
    Out,
    /// Accelerating then decelerating.
    InOut,
}

impl EasingFlavor {
    /// Catalog name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
            Self::InOut => "inOut",
        }
    }
}

/// A resolved easing curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Easing {
    /// Base curve.
    pub family: EasingFamily,
    /// Flavor.
    pub flavor: EasingFlavor,
}

impl Default for Easing {
    fn default() -> Self {
        Self::LINEAR
    }
}

impl Easing {
    /// `linear.inOut`
    pub const LINEAR: Self = Self::new(EasingFamily::Linear, EasingFlavor::InOut);

    /// Creates an easing.
    #[must_use]
    pub const fn new(family: EasingFamily, flavor: EasingFlavor) -> Self {
        Self { family, flavor }
    }

    /// Applies the easing function to a t value (clamped to 0-1).
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        let f = |x| self.family.ease_in(x);

        match self.flavor {
            EasingFlavor::In => f(t),
            EasingFlavor::Out => 1.0 - f(1.0 - t),
            EasingFlavor::InOut => {
                if t < 0.5 {
                    f(2.0 * t) / 2.0
                } else {
                    1.0 - f(2.0 * (1.0 - t)) / 2.0
                }
            }
        }
    }

    /// Resolves a `"family.flavor"` path.
    ///
    /// # Errors
    ///
    /// [`TransitionError::UnknownEasing`] when either segment is unknown.
    pub fn parse(path: &str) -> TransitionResult<Self> {
        let unknown = || TransitionError::UnknownEasing(path.to_string());

        let (family, flavor) = path.split_once('.').ok_or_else(unknown)?;
        let family = EasingFamily::ALL
            .into_iter()
            .find(|candidate| candidate.name() == family)
            .ok_or_else(unknown)?;
        let flavor = [EasingFlavor::In, EasingFlavor::Out, EasingFlavor::InOut]
            .into_iter()
            .find(|candidate| candidate.name() == flavor)
            .ok_or_else(unknown)?;
        Ok(Self::new(family, flavor))
    }
}

impl FromStr for Easing {
    type Err = TransitionError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        Self::parse(path)
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.family.name(), self.flavor.name())
    }
}
