//! Common types and traits for pallet-plane geometry.
//!
//! This module defines reusable types and trait abstractions
//! shared by the data model and the layout strategies.

use std::ops::{Add, Mul, Sub};

/// Global numerical tolerance for floating-point comparisons.
///
/// Used for fit checks and coordinate comparisons in millimeters.
pub const EPSILON_GENERAL: f64 = 1e-6;

/// Represents a 2D vector or point on the pallet plane.
///
/// Used for positions, footprints, and centroid calculations.
///
/// # Examples
/// ```
/// use pack_it_flat::types::Vec2;
///
/// let origin = Vec2::new(150.0, 140.0);
/// let footprint = Vec2::new(300.0, 180.0);
/// let center = origin + footprint * 0.5;
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    /// Creates a new 2D vector.
    ///
    /// # Parameters
    /// * `x` - X component (width axis)
    /// * `y` - Y component (depth axis)
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Creates a zero vector (pallet origin, lower-left corner).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Converts to tuple format for API compatibility.
    #[inline]
    pub const fn as_tuple(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Creates from tuple format.
    #[inline]
    pub const fn from_tuple(tuple: (f64, f64)) -> Self {
        Self::new(tuple.0, tuple.1)
    }

    /// Calculates the area (product of both components).
    ///
    /// Useful for footprint vectors.
    #[inline]
    pub fn area(&self) -> f64 {
        self.x * self.y
    }

    /// Calculates the Euclidean distance to another point.
    #[inline]
    pub fn distance_to(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Checks if both components are positive and finite.
    #[inline]
    pub fn is_valid_dimension(&self) -> bool {
        self.x > 0.0 && self.y > 0.0 && self.x.is_finite() && self.y.is_finite()
    }

    /// Checks if the vector fits within another vector (component-wise <=).
    ///
    /// # Parameters
    /// * `outer` - The outer vector (e.g. pallet dimensions)
    /// * `tolerance` - Numerical tolerance for the comparison
    #[inline]
    pub fn fits_within(&self, outer: &Self, tolerance: f64) -> bool {
        self.x <= outer.x + tolerance && self.y <= outer.y + tolerance
    }

    /// Returns the midpoint between the origin and this point.
    #[inline]
    pub fn center(&self) -> Self {
        Self::new(self.x / 2.0, self.y / 2.0)
    }

    /// Returns the vector with its components swapped (90° rotation of a footprint).
    #[inline]
    pub const fn swapped(&self) -> Self {
        Self::new(self.y, self.x)
    }
}

impl Add for Vec2 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

impl From<(f64, f64)> for Vec2 {
    #[inline]
    fn from(tuple: (f64, f64)) -> Self {
        Self::from_tuple(tuple)
    }
}

impl From<Vec2> for (f64, f64) {
    #[inline]
    fn from(vec: Vec2) -> Self {
        vec.as_tuple()
    }
}

/// Trait for objects with a 2D footprint.
///
/// Provides a common interface for all objects with spatial extent
/// on the pallet plane.
pub trait Dimensional {
    /// Returns the footprint of the object (width, depth).
    fn dimensions(&self) -> Vec2;

    /// Calculates the footprint area.
    fn area(&self) -> f64 {
        self.dimensions().area()
    }

    /// Checks if this object fits on a pallet with the given dimensions.
    fn fits_in(&self, pallet_dims: &Vec2, tolerance: f64) -> bool {
        self.dimensions().fits_within(pallet_dims, tolerance)
    }
}

/// Trait for objects with a position on the pallet plane.
pub trait Positioned {
    /// Returns the position (lower-left corner).
    fn position(&self) -> Vec2;
}

/// Trait for objects with weight.
pub trait Weighted {
    /// Returns the weight in kg.
    fn weight(&self) -> f64;
}

/// Represents an axis-aligned rectangle on the pallet plane.
///
/// Used for overlap detection and bounds checks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    /// Minimum corner (position)
    pub min: Vec2,
    /// Maximum corner (position + footprint)
    pub max: Vec2,
}

impl Rect {
    /// Creates a new rectangle.
    #[inline]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Creates a rectangle from position and footprint.
    #[inline]
    pub fn from_position_and_dims(position: Vec2, dims: Vec2) -> Self {
        Self {
            min: position,
            max: position + dims,
        }
    }

    /// Checks if two rectangles intersect.
    ///
    /// Touching edges do not count as an intersection.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        !(self.max.x <= other.min.x
            || other.max.x <= self.min.x
            || self.max.y <= other.min.y
            || other.max.y <= self.min.y)
    }

    /// Calculates the overlap length in one dimension.
    #[inline]
    fn overlap_1d(a_min: f64, a_max: f64, b_min: f64, b_max: f64) -> f64 {
        (a_max.min(b_max) - a_min.max(b_min)).max(0.0)
    }

    /// Calculates the overlap area with another rectangle.
    #[inline]
    pub fn overlap_area(&self, other: &Self) -> f64 {
        let overlap_x = Self::overlap_1d(self.min.x, self.max.x, other.min.x, other.max.x);
        let overlap_y = Self::overlap_1d(self.min.y, self.max.y, other.min.y, other.max.y);
        overlap_x * overlap_y
    }

    /// Checks if a point is inside the rectangle.
    #[inline]
    pub fn contains_point(&self, point: &Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Checks if this rectangle lies entirely inside another one.
    ///
    /// # Parameters
    /// * `outer` - The containing rectangle
    /// * `tolerance` - Numerical tolerance for the boundary comparison
    #[inline]
    pub fn contained_in(&self, outer: &Self, tolerance: f64) -> bool {
        self.min.x >= outer.min.x - tolerance
            && self.min.y >= outer.min.y - tolerance
            && self.max.x <= outer.max.x + tolerance
            && self.max.y <= outer.max.y + tolerance
    }

    /// Returns the center point.
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Returns the footprint (width, depth).
    #[inline]
    pub fn dimensions(&self) -> Vec2 {
        self.max - self.min
    }
}

/// Validation helpers shared by the data model and the API layer.
pub mod validation {

    /// Validates a single dimension.
    ///
    /// # Parameters
    /// * `value` - The value to validate
    /// * `name` - Name of the dimension for error messages
    ///
    /// # Returns
    /// `Ok(())` for valid values, otherwise error text
    pub fn validate_dimension(value: f64, name: &str) -> Result<(), String> {
        if value.is_nan() {
            return Err(format!("{} must not be NaN", name));
        }
        if value.is_infinite() {
            return Err(format!("{} must not be infinite", name));
        }
        if value <= 0.0 {
            return Err(format!("{} must be positive, got: {}", name, value));
        }
        Ok(())
    }

    /// Validates a unit weight.
    ///
    /// Zero is allowed; the centroid is simply omitted when the total
    /// placed weight is zero.
    ///
    /// # Parameters
    /// * `value` - The value to validate
    ///
    /// # Returns
    /// `Ok(())` for valid values, otherwise error text
    pub fn validate_weight(value: f64) -> Result<(), String> {
        if value.is_nan() {
            return Err("Weight must not be NaN".to_string());
        }
        if value.is_infinite() {
            return Err("Weight must not be infinite".to_string());
        }
        if value < 0.0 {
            return Err(format!("Weight must not be negative, got: {}", value));
        }
        Ok(())
    }

    /// Validates a requested quantity.
    ///
    /// # Parameters
    /// * `value` - The value to validate
    ///
    /// # Returns
    /// `Ok(())` for valid values, otherwise error text
    pub fn validate_quantity(value: i64) -> Result<(), String> {
        if value < 0 {
            return Err(format!("Quantity must not be negative, got: {}", value));
        }
        Ok(())
    }

    /// Validates both footprint dimensions of an item or pallet.
    ///
    /// # Parameters
    /// * `dims` - The dimensions to validate (width, depth)
    ///
    /// # Returns
    /// `Ok(())` for valid values, otherwise error text
    pub fn validate_dimensions_2d(dims: (f64, f64)) -> Result<(), String> {
        validate_dimension(dims.0, "Width")?;
        validate_dimension(dims.1, "Depth")?;
        Ok(())
    }
}

/// Weight centroid calculation helper.
///
/// Accumulates weighted positions for the weight-centroid estimate.
#[derive(Clone, Debug, Default)]
pub struct CenterOfMassCalculator {
    weighted_x: f64,
    weighted_y: f64,
    total_weight: f64,
}

impl CenterOfMassCalculator {
    /// Creates a new calculator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a weighted point.
    ///
    /// # Parameters
    /// * `x` - X position of the point
    /// * `y` - Y position of the point
    /// * `weight` - Weight of the point
    pub fn add_point(&mut self, x: f64, y: f64, weight: f64) {
        self.weighted_x += x * weight;
        self.weighted_y += y * weight;
        self.total_weight += weight;
    }

    /// Calculates the weight centroid.
    ///
    /// # Returns
    /// `Some((x, y))` for a valid centroid, `None` if no weight present
    pub fn compute(&self) -> Option<(f64, f64)> {
        if self.total_weight <= 0.0 {
            None
        } else {
            Some((
                self.weighted_x / self.total_weight,
                self.weighted_y / self.total_weight,
            ))
        }
    }

    /// Calculates the distance of the centroid to a reference point.
    ///
    /// # Parameters
    /// * `reference` - The reference point (e.g. pallet center)
    pub fn distance_to(&self, reference: (f64, f64)) -> f64 {
        match self.compute() {
            Some((cx, cy)) => {
                let dx = cx - reference.0;
                let dy = cy - reference.1;
                (dx * dx + dy * dy).sqrt()
            }
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_operations() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(4.0, 5.0);

        assert_eq!(a + b, Vec2::new(5.0, 7.0));
        assert_eq!(b - a, Vec2::new(3.0, 3.0));
        assert_eq!(a * 2.0, Vec2::new(2.0, 4.0));
        assert_eq!(a.swapped(), Vec2::new(2.0, 1.0));
    }

    #[test]
    fn test_vec2_area() {
        let dims = Vec2::new(300.0, 180.0);
        assert!((dims.area() - 54000.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn test_vec2_fits_within() {
        let item = Vec2::new(300.0, 180.0);
        let pallet = Vec2::new(1200.0, 1000.0);

        assert!(item.fits_within(&pallet, EPSILON_GENERAL));
        assert!(!pallet.fits_within(&item, EPSILON_GENERAL));
    }

    #[test]
    fn test_rect_intersects() {
        let a = Rect::from_position_and_dims(Vec2::zero(), Vec2::new(10.0, 10.0));
        let b = Rect::from_position_and_dims(Vec2::new(5.0, 5.0), Vec2::new(10.0, 10.0));
        let c = Rect::from_position_and_dims(Vec2::new(20.0, 20.0), Vec2::new(10.0, 10.0));
        let touching = Rect::from_position_and_dims(Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0));

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(!a.intersects(&touching));
    }

    #[test]
    fn test_rect_overlap_area() {
        let a = Rect::from_position_and_dims(Vec2::zero(), Vec2::new(10.0, 10.0));
        let b = Rect::from_position_and_dims(Vec2::new(5.0, 5.0), Vec2::new(10.0, 10.0));

        let overlap = a.overlap_area(&b);
        assert!((overlap - 25.0).abs() < EPSILON_GENERAL); // 5x5 overlap
    }

    #[test]
    fn test_rect_contained_in() {
        let pallet = Rect::from_position_and_dims(Vec2::zero(), Vec2::new(1200.0, 1000.0));
        let inside = Rect::from_position_and_dims(Vec2::new(900.0, 820.0), Vec2::new(300.0, 180.0));
        let sticking_out =
            Rect::from_position_and_dims(Vec2::new(1000.0, 0.0), Vec2::new(300.0, 180.0));

        assert!(inside.contained_in(&pallet, EPSILON_GENERAL));
        assert!(!sticking_out.contained_in(&pallet, EPSILON_GENERAL));
    }

    #[test]
    fn test_rect_contains_point_and_distances() {
        let rect = Rect::from_position_and_dims(Vec2::new(100.0, 100.0), Vec2::new(200.0, 100.0));
        assert!(rect.contains_point(&rect.center()));
        assert!(!rect.contains_point(&Vec2::zero()));
        assert!((rect.center().distance_to(&Vec2::new(200.0, 150.0)) - 0.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn test_center_of_mass_calculator() {
        let mut calc = CenterOfMassCalculator::new();
        calc.add_point(100.0, 100.0, 10.0);
        calc.add_point(300.0, 100.0, 10.0);

        let center = calc.compute().unwrap();
        assert!((center.0 - 200.0).abs() < EPSILON_GENERAL);
        assert!((center.1 - 100.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn test_center_of_mass_undefined_without_weight() {
        let mut calc = CenterOfMassCalculator::new();
        calc.add_point(100.0, 100.0, 0.0);
        calc.add_point(300.0, 100.0, 0.0);

        assert!(calc.compute().is_none());
        assert_eq!(calc.distance_to((600.0, 500.0)), 0.0);
    }

    #[test]
    fn test_validation_dimension() {
        assert!(validation::validate_dimension(10.0, "Width").is_ok());
        assert!(validation::validate_dimension(0.0, "Width").is_err());
        assert!(validation::validate_dimension(-1.0, "Width").is_err());
        assert!(validation::validate_dimension(f64::NAN, "Width").is_err());
        assert!(validation::validate_dimension(f64::INFINITY, "Width").is_err());
    }

    #[test]
    fn test_validation_weight_allows_zero() {
        assert!(validation::validate_weight(10.0).is_ok());
        assert!(validation::validate_weight(0.0).is_ok());
        assert!(validation::validate_weight(-1.0).is_err());
        assert!(validation::validate_weight(f64::NAN).is_err());
    }

    #[test]
    fn test_validation_quantity() {
        assert!(validation::validate_quantity(0).is_ok());
        assert!(validation::validate_quantity(12).is_ok());
        assert!(validation::validate_quantity(-1).is_err());
    }
}
