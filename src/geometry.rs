//! Geometric helper functions for planar overlap detection.
//!
//! This module provides functions for checking overlaps between placed
//! items and for computing overlap lengths along single axes.

use crate::model::PlacedItem;

/// Checks whether two placed items overlap on the pallet plane.
///
/// Uses axis-aligned bounding box (AABB) overlap detection. Two boxes do
/// NOT overlap when they are separated along at least one axis; touching
/// edges do not count as overlap.
///
/// # Parameters
/// * `a` - First placed item
/// * `b` - Second placed item
///
/// # Returns
/// `true` when the bounding boxes overlap, otherwise `false`
pub fn intersects(a: &PlacedItem, b: &PlacedItem) -> bool {
    let (ax, ay) = a.position;
    let (aw, ah) = a.size;
    let (bx, by) = b.position;
    let (bw, bh) = b.size;

    !(ax + aw <= bx || bx + bw <= ax || ay + ah <= by || by + bh <= ay)
}

/// Computes the overlap of two intervals along one dimension.
///
/// # Parameters
/// * `a1` - Start of the first interval
/// * `a2` - End of the first interval
/// * `b1` - Start of the second interval
/// * `b2` - End of the second interval
///
/// # Returns
/// Length of the overlap, at least 0.0
#[allow(dead_code)]
pub fn overlap_1d(a1: f64, a2: f64, b1: f64, b2: f64) -> f64 {
    (a2.min(b2) - a1.max(b1)).max(0.0)
}

/// Checks whether a point lies inside a placed item's bounding box.
///
/// # Parameters
/// * `point` - The point to check (x, y)
/// * `placed` - The placed item
///
/// # Returns
/// `true` when the point lies inside the bounding box
#[allow(dead_code)]
pub fn point_inside(point: (f64, f64), placed: &PlacedItem) -> bool {
    let (px, py) = point;
    let (bx, by) = placed.position;
    let (bw, bh) = placed.size;

    px >= bx && px <= bx + bw && py >= by && py <= by + bh
}
