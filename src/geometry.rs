//! Transect geometry from a raw (x, y, distance) column triplet.

use crate::{table::Column, Coordinate, ProfileError, Transect};

/// Build a [`Transect`] from its distance, depth and alongshore columns.
///
/// Missing cells are dropped from the distance and depth columns
/// independently, then both are truncated to the shorter length, so trailing
/// samples of the longer column are discarded. The alongshore distance is
/// the first present value of the third column; later values are ignored.
pub fn extract(
    distance: &Column,
    depth: &Column,
    alongshore: &Column,
) -> Result<Transect, ProfileError> {
    let alongshore_distance = alongshore
        .present()
        .next()
        .ok_or_else(|| ProfileError::MissingData(alongshore.name.clone()))?;

    // zip stops at the shorter iterator
    let coordinates: Vec<Coordinate> = distance
        .present()
        .zip(depth.present())
        .map(|(x, depth)| Coordinate { x, depth })
        .collect();

    if coordinates.is_empty() {
        return Err(ProfileError::EmptyTransect {
            x_column: distance.name.clone(),
            y_column: depth.name.clone(),
        });
    }

    Ok(Transect {
        coordinates,
        alongshore_distance,
    })
}
