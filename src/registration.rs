//! Spatial registration between a base image and a coarser derived image.
//!
//! A derived raster (e.g. a likelihood map) is aligned to the base image by a
//! single positive integer downsample factor shared by both axes. Resolution
//! happens once per image load; nothing here is persisted.

use std::fmt;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Point;

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ImageDimensions {
    pub width: u64,
    pub height: u64,
}

impl ImageDimensions {
    pub fn new(width: u64, height: u64) -> Self {
        Self { width, height }
    }

    /// Whether both extents are strictly positive.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl From<(u64, u64)> for ImageDimensions {
    fn from((width, height): (u64, u64)) -> Self {
        Self::new(width, height)
    }
}

impl fmt::Display for ImageDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl std::str::FromStr for ImageDimensions {
    type Err = String;

    /// Parse `WIDTHxHEIGHT`, e.g. `4000x3000`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
        let width = w.trim().parse().map_err(|_| format!("invalid width '{}'", w))?;
        let height = h.trim().parse().map_err(|_| format!("invalid height '{}'", h))?;
        Ok(Self::new(width, height))
    }
}

/// Integer downsample factor from base pixels to derived pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScaleFactor(NonZeroU64);

impl ScaleFactor {
    /// The identity factor.
    pub const ONE: ScaleFactor = ScaleFactor(NonZeroU64::MIN);

    /// Returns None for zero.
    pub fn new(factor: u64) -> Option<Self> {
        NonZeroU64::new(factor).map(Self)
    }

    pub fn get(&self) -> u64 {
        self.0.get()
    }

    /// Map a derived-image pixel position into base-image pixels.
    pub fn derived_to_base(&self, point: Point) -> Point {
        let k = self.get() as f64;
        Point::new(point.x * k, point.y * k)
    }

    /// Map a base-image pixel position into derived-image pixels.
    pub fn base_to_derived(&self, point: Point) -> Point {
        let k = self.get() as f64;
        Point::new(point.x / k, point.y / k)
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How strictly the per-axis ratios must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationPolicy {
    /// Floor-divided ratios must be equal. Accepts pairs whose true ratio is
    /// not integral, e.g. 10x10 over 3x3 registers at factor 3.
    #[default]
    FloorDivision,
    /// Both axes must divide exactly and agree.
    ExactDivision,
}

/// Why a base/derived pair cannot be registered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// An extent of either image is zero
    #[error("Image dimensions must be positive (base {base}, derived {derived})")]
    NonPositiveDimension {
        base: ImageDimensions,
        derived: ImageDimensions,
    },

    /// The derived image is larger than the base along some axis
    #[error("Derived image {derived} is larger than base image {base}")]
    DerivedLargerThanBase {
        base: ImageDimensions,
        derived: ImageDimensions,
    },

    /// The axes downsample by different factors
    #[error("Axis ratios differ: {rx} horizontally, {ry} vertically")]
    AxisMismatch { rx: u64, ry: u64 },

    /// A ratio is not an exact integer
    #[error("Base image {base} is not an exact multiple of derived image {derived}")]
    InexactRatio {
        base: ImageDimensions,
        derived: ImageDimensions,
    },
}

/// Compute the downsample factor relating `base` to `derived`.
pub fn resolve(
    base: ImageDimensions,
    derived: ImageDimensions,
    policy: RegistrationPolicy,
) -> Result<ScaleFactor, RegistrationError> {
    if !base.is_valid() || !derived.is_valid() {
        return Err(RegistrationError::NonPositiveDimension { base, derived });
    }

    let rx = base.width / derived.width;
    let ry = base.height / derived.height;

    if rx != ry {
        return Err(RegistrationError::AxisMismatch { rx, ry });
    }

    if policy == RegistrationPolicy::ExactDivision
        && (base.width % derived.width != 0 || base.height % derived.height != 0)
    {
        return Err(RegistrationError::InexactRatio { base, derived });
    }

    ScaleFactor::new(rx).ok_or(RegistrationError::DerivedLargerThanBase { base, derived })
}

/// Registration of the currently loaded pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationState {
    pub base: ImageDimensions,
    pub derived: ImageDimensions,
    /// None when the pair could not be registered.
    pub scale: Option<ScaleFactor>,
}

impl RegistrationState {
    /// Resolve and record the outcome for a pair.
    pub fn compute(
        base: ImageDimensions,
        derived: ImageDimensions,
        policy: RegistrationPolicy,
    ) -> (Self, Result<ScaleFactor, RegistrationError>) {
        let result = resolve(base, derived, policy);
        let state = Self {
            base,
            derived,
            scale: result.as_ref().ok().copied(),
        };
        (state, result)
    }

    pub fn is_registered(&self) -> bool {
        self.scale.is_some()
    }
}
