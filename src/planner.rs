//! # Profile Batch Planning
//!
//! Expands one survey submission into independent analyses: every wave
//! observation crossed with every transect of the survey table.
//!
//! ## Table Layout
//! Survey tables are wide. Columns are consumed in consecutive triplets
//! `(x, y, distance)`, one triplet per transect, numbered from 1 in column
//! order. A table whose column count is not a multiple of 3 is rejected
//! before any analysis runs.
//!
//! ## Ordering
//! Units are planned wave-height-major, transect-minor:
//! ```text
//! (h1, t1) (h1, t2) … (h1, tN) (h2, t1) … (hM, tN)
//! ```
//! Labels and sequence numbers follow that order. [`evaluate_all`] may spread
//! the math over a rayon pool, but results always come back in plan order,
//! and [`drive`] hands them to the [`PlotSink`] one by one in that order.
//!
//! ## Breaking Depth
//! The batch path uses the baseline Miche depth
//! ([`wave_break::breaking_depth`]). The angle-adjusted model needs wave
//! direction and coast orientation, which survey submissions do not carry.

use crate::{
    break_point, geometry, table::ProfileTable, wave_break, BreakPoint, ProfileError, ProfilePlot,
    WaveObservation,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Columns per transect: x distance, depth, alongshore distance.
const COLUMNS_PER_TRANSECT: usize = 3;

/// Column positions of one transect in the survey table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ColumnTriplet {
    /// 1-based transect index
    pub index: usize,
    pub x: usize,
    pub y: usize,
    pub distance: usize,
}

/// One (transect, wave observation) analysis, not yet evaluated.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisUnit {
    /// 0-based position in plan order
    pub sequence: usize,
    pub transect: ColumnTriplet,
    pub wave: WaveObservation,
    pub breaking_depth: f64,
    pub label: String,
}

impl AnalysisUnit {
    /// Extract the transect geometry and locate the break point.
    pub fn evaluate(&self, table: &ProfileTable) -> Result<ProfilePlot, ProfileError> {
        let transect = geometry::extract(
            table.column(self.transect.x)?,
            table.column(self.transect.y)?,
            table.column(self.transect.distance)?,
        )?;
        let break_point = break_point::locate(&transect.coordinates, self.breaking_depth);

        Ok(ProfilePlot {
            label: self.label.clone(),
            transect_index: self.transect.index,
            wave_height: self.wave.height_m(),
            breaking_depth: self.breaking_depth,
            transect,
            break_point,
        })
    }
}

/// Group table columns into transect triplets.
pub fn partition_transects(table: &ProfileTable) -> Result<Vec<ColumnTriplet>, ProfileError> {
    let columns = table.column_count();
    if columns % COLUMNS_PER_TRANSECT != 0 {
        return Err(ProfileError::Shape { columns });
    }

    Ok((0..columns / COLUMNS_PER_TRANSECT)
        .map(|i| {
            let first = i * COLUMNS_PER_TRANSECT;
            ColumnTriplet {
                index: i + 1,
                x: first,
                y: first + 1,
                distance: first + 2,
            }
        })
        .collect())
}

/// Build the full cross product of analyses for one submission.
///
/// `source_name` is the survey file name or object key; its last path
/// component becomes part of every label.
pub fn plan(
    table: &ProfileTable,
    waves: &[WaveObservation],
    source_name: &str,
) -> Result<Vec<AnalysisUnit>, ProfileError> {
    let transects = partition_transects(table)?;
    let base_name = base_name(source_name);

    let mut units = Vec::with_capacity(waves.len() * transects.len());
    for wave in waves {
        let breaking_depth = wave_break::breaking_depth(wave.height_m());
        for transect in &transects {
            units.push(AnalysisUnit {
                sequence: units.len(),
                transect: *transect,
                wave: *wave,
                breaking_depth,
                label: profile_label(base_name, transect.index, wave.height_m()),
            });
        }
    }

    info!(
        transects = transects.len(),
        waves = waves.len(),
        units = units.len(),
        source = source_name,
        "planned profile batch"
    );
    Ok(units)
}

/// Evaluate every unit, in parallel when asked. Results keep plan order.
pub fn evaluate_all(
    units: &[AnalysisUnit],
    table: &ProfileTable,
    parallel: bool,
) -> Vec<Result<ProfilePlot, ProfileError>> {
    if parallel {
        units.par_iter().map(|unit| unit.evaluate(table)).collect()
    } else {
        units.iter().map(|unit| unit.evaluate(table)).collect()
    }
}

/// `profile_<base>_<transect>_<height>.png`
///
/// This name doubles as the object-store key suffix, so its format must stay
/// stable.
///
/// # Example
/// ```
/// use beach_profile_lib::planner::profile_label;
///
/// assert_eq!(profile_label("survey.csv", 2, 1.5), "profile_survey.csv_2_1.5.png");
/// assert_eq!(profile_label("survey.csv", 1, 2.0), "profile_survey.csv_1_2.0.png");
/// ```
pub fn profile_label(base_name: &str, transect_index: usize, wave_height: f64) -> String {
    format!(
        "profile_{}_{}_{}.png",
        base_name,
        transect_index,
        format_wave_height(wave_height)
    )
}

/// Shortest round-trip decimal, always with a fractional part (`2.0`, `3.9`).
///
/// Magnitudes below 1e-4 or from 1e16 up switch to exponent form with a
/// signed, two-digit exponent (`1e-05`, `1.5e+16`), as Python's `str(float)`
/// prints them. Heights are always read as floats, so a column holding only
/// whole numbers still labels as `2.0`; pandas would have inferred integers
/// there and printed `2`.
pub(crate) fn format_wave_height(wave_height: f64) -> String {
    let magnitude = wave_height.abs();
    if wave_height.is_finite() && magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let text = format!("{wave_height:e}");
        if let Some((mantissa, exponent)) = text.split_once('e') {
            if let Ok(exponent) = exponent.parse::<i32>() {
                let sign = if exponent < 0 { '-' } else { '+' };
                return format!("{mantissa}e{sign}{:02}", exponent.abs());
            }
        }
        return text;
    }

    let text = wave_height.to_string();
    if wave_height.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}

/// Last `/`- or `\`-separated component of a file name or object key.
fn base_name(source_name: &str) -> &str {
    source_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(source_name)
}

// -- Driving units through a sink --

/// Consumer of evaluated plots: a renderer, an uploader, or both.
pub trait PlotSink {
    type Error: fmt::Display;

    /// Handle one plot and return where it ended up.
    fn deliver(&mut self, plot: &ProfilePlot) -> Result<String, Self::Error>;
}

/// What happens to the rest of a batch after one unit fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchPolicy {
    /// Stop at the first failure; later units are reported as skipped
    #[default]
    Abort,
    /// Record the failure and keep going
    Continue,
}

/// Outcome of a single unit.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnitStatus {
    Delivered {
        location: String,
        break_point: Option<BreakPoint>,
    },
    Failed {
        error: String,
    },
    Skipped,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UnitReport {
    pub sequence: usize,
    pub label: String,
    pub transect_index: usize,
    pub wave_height: f64,
    pub breaking_depth: f64,
    #[serde(flatten)]
    pub status: UnitStatus,
}

/// Per-unit statuses for one submission, in plan order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub policy: BatchPolicy,
    pub units: Vec<UnitReport>,
}

impl BatchReport {
    pub fn delivered(&self) -> usize {
        self.count(|s| matches!(s, UnitStatus::Delivered { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, UnitStatus::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, UnitStatus::Skipped))
    }

    /// True when every unit was delivered.
    pub fn is_complete(&self) -> bool {
        self.delivered() == self.units.len()
    }

    fn count(&self, pred: impl Fn(&UnitStatus) -> bool) -> usize {
        self.units.iter().filter(|u| pred(&u.status)).count()
    }
}

/// Evaluate `units` and hand each plot to `sink` in plan order.
///
/// Evaluation failures and sink failures are both recorded against the unit
/// that raised them; `policy` decides whether the batch continues.
pub fn drive<S: PlotSink>(
    units: &[AnalysisUnit],
    table: &ProfileTable,
    sink: &mut S,
    policy: BatchPolicy,
    parallel: bool,
) -> BatchReport {
    let results = evaluate_all(units, table, parallel);
    let mut report = BatchReport {
        policy,
        units: Vec::with_capacity(units.len()),
    };
    let mut aborted = false;

    for (unit, result) in units.iter().zip(results) {
        let status = if aborted {
            UnitStatus::Skipped
        } else {
            let status = deliver_one(unit, result, sink);
            if matches!(status, UnitStatus::Failed { .. }) && policy == BatchPolicy::Abort {
                warn!(label = %unit.label, "aborting batch after failed unit");
                aborted = true;
            }
            status
        };

        report.units.push(UnitReport {
            sequence: unit.sequence,
            label: unit.label.clone(),
            transect_index: unit.transect.index,
            wave_height: unit.wave.height_m(),
            breaking_depth: unit.breaking_depth,
            status,
        });
    }

    info!(
        delivered = report.delivered(),
        failed = report.failed(),
        skipped = report.skipped(),
        "profile batch finished"
    );
    report
}

fn deliver_one<S: PlotSink>(
    unit: &AnalysisUnit,
    result: Result<ProfilePlot, ProfileError>,
    sink: &mut S,
) -> UnitStatus {
    let plot = match result {
        Ok(plot) => plot,
        Err(e) => {
            warn!(label = %unit.label, error = %e, "unit evaluation failed");
            return UnitStatus::Failed {
                error: e.to_string(),
            };
        }
    };

    debug!(
        label = %plot.label,
        breaking_depth = plot.breaking_depth,
        break_point = ?plot.break_point,
        "unit evaluated"
    );

    match sink.deliver(&plot) {
        Ok(location) => {
            info!(label = %plot.label, %location, "profile delivered");
            UnitStatus::Delivered {
                location,
                break_point: plot.break_point,
            }
        }
        Err(e) => {
            warn!(label = %plot.label, error = %e, "profile delivery failed");
            UnitStatus::Failed {
                error: e.to_string(),
            }
        }
    }
}
