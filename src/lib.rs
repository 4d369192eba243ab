//! # Beach Profile Core Library
//!
//! This library predicts where waves break along surveyed beach transects and
//! prepares annotated depth profiles for rendering. It is organised as a small
//! set of independent components that are composed by explicit function calls:
//!
//! - [`wave_break`]: Miche breaking criterion, with an optional
//!   angle-of-incidence correction
//! - [`geometry`]: turns a raw column triplet into aligned coordinates plus an
//!   alongshore distance label
//! - [`break_point`]: finds the predicted break coordinate on a transect
//! - [`planner`]: expands a wide survey table and a wave-height series into
//!   the full cross product of analyses
//!
//! Around that core sit the collaborators that touch the outside world:
//! [`table`] (CSV parsing), [`renderer`] (PNG and ASCII output),
//! [`storage`] (object store), [`service`] (download → plan → render →
//! upload) and [`config`].
//!
//! ## Data Flow
//! 1. **Parse**: survey CSV → [`table::ProfileTable`], wave CSV →
//!    [`WaveObservation`]s
//! 2. **Plan**: column triplets × wave heights → [`planner::AnalysisUnit`]s
//! 3. **Evaluate**: each unit → [`ProfilePlot`] (pure math, may run in parallel)
//! 4. **Deliver**: plots handed to a [`planner::PlotSink`] in plan order
//!
//! ## Core Types
//! - [`Coordinate`]: one (distance, depth) survey sample
//! - [`Transect`]: one cross-shore line of samples
//! - [`WaveObservation`]: one observed wave height
//! - [`ProfilePlot`]: everything needed to draw one annotated profile

use serde::{Deserialize, Serialize};

pub mod break_point;
pub mod config;
pub mod error;
pub mod geometry;
pub mod planner;
pub mod renderer;
pub mod service;
pub mod storage;
pub mod table;
pub mod wave_break;

pub use error::ProfileError;

/// A single survey sample on a transect.
///
/// `x` is the cross-shore distance in metres and `depth` the water depth in
/// metres. Larger depth values mean deeper water; which side is land and
/// which is sea only matters when plotting.
///
/// # Example
/// ```
/// use beach_profile_lib::Coordinate;
///
/// let sample = Coordinate { x: 15.0, depth: 4.0 };
/// assert!(sample.depth < 5.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Cross-shore distance in metres
    pub x: f64,
    /// Water depth in metres
    pub depth: f64,
}

/// Predicted break position. Always one of the surveyed samples.
pub type BreakPoint = Coordinate;

/// One cross-shore line of the beach profile.
///
/// `coordinates` keep the sampling order of the source columns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transect {
    /// Ordered (distance, depth) samples
    pub coordinates: Vec<Coordinate>,
    /// Alongshore distance identifying this transect, in metres
    pub alongshore_distance: f64,
}

/// A single observed wave height in metres.
///
/// # Example
/// ```
/// use beach_profile_lib::WaveObservation;
///
/// let wave = WaveObservation::new(1.2).unwrap();
/// assert_eq!(wave.height_m(), 1.2);
/// assert!(WaveObservation::new(-0.5).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveObservation {
    height_m: f64,
}

impl WaveObservation {
    /// Wrap a wave height, rejecting values that are not finite and positive.
    pub fn new(height_m: f64) -> Result<Self, ProfileError> {
        if !height_m.is_finite() || height_m <= 0.0 {
            return Err(ProfileError::InvalidWaveHeight { value: height_m });
        }
        Ok(Self { height_m })
    }

    pub fn height_m(&self) -> f64 {
        self.height_m
    }
}

/// Plotting data package for one (transect, wave height) analysis.
///
/// This is what the renderer and uploader consume. It carries no pixels,
/// only geometry, the break point and the labels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfilePlot {
    /// Destination file name, `profile_<base>_<transect>_<height>.png`
    pub label: String,
    /// 1-based transect index within the survey table
    pub transect_index: usize,
    /// Observed wave height in metres
    pub wave_height: f64,
    /// Miche breaking depth for `wave_height`
    pub breaking_depth: f64,
    /// Survey geometry for this transect
    pub transect: Transect,
    /// Last sample at or below the breaking depth, if any
    pub break_point: Option<BreakPoint>,
}
