//! Data models for the pallet layer layout calculator.
//!
//! This module defines the fundamental data structures for 1-tier loading
//! patterns:
//! - `PalletSpec`: The pallet footprint items are placed on
//! - `ItemSpec`: A battery model with footprint, weight, and requested quantity
//! - `PlacedItem`: One accepted unit with its position on the pallet
//! - `LayerLayout`: All placements of a single pallet layer
//!
//! All structures implement the traits from the `types` module.

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::types::{CenterOfMassCalculator, Dimensional, Positioned, Rect, Vec2, Weighted, validation};

/// Validation error for a single input row.
#[derive(Debug, Clone)]
pub enum ValidationError {
    InvalidDimension(String),
    InvalidWeight(String),
    InvalidQuantity(String),
    DuplicateModel(String),
}

impl ValidationError {
    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::InvalidDimension(_) => "invalid_dimension",
            ValidationError::InvalidWeight(_) => "invalid_weight",
            ValidationError::InvalidQuantity(_) => "invalid_quantity",
            ValidationError::DuplicateModel(_) => "duplicate_model",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidDimension(msg) => write!(f, "Invalid dimension: {}", msg),
            ValidationError::InvalidWeight(msg) => write!(f, "Invalid weight: {}", msg),
            ValidationError::InvalidQuantity(msg) => write!(f, "Invalid quantity: {}", msg),
            ValidationError::DuplicateModel(model) => {
                write!(f, "Duplicate model name: {}", model)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validates an item's footprint, carried height, weight, and quantity together.
fn validate_item_params(
    dims: (f64, f64, f64),
    weight: f64,
    quantity: i64,
) -> Result<(), ValidationError> {
    validation::validate_dimension(dims.0, "Width").map_err(ValidationError::InvalidDimension)?;
    validation::validate_dimension(dims.1, "Depth").map_err(ValidationError::InvalidDimension)?;
    validate_carried_height(dims.2)?;
    validation::validate_weight(weight).map_err(ValidationError::InvalidWeight)?;
    validation::validate_quantity(quantity).map_err(ValidationError::InvalidQuantity)?;
    Ok(())
}

/// Height is carried through for the presentation layer but never used by
/// layout, so only finite non-negative values are required.
fn validate_carried_height(value: f64) -> Result<(), ValidationError> {
    if value.is_nan() || value.is_infinite() || value < 0.0 {
        return Err(ValidationError::InvalidDimension(format!(
            "Height must be a finite non-negative number, got: {}",
            value
        )));
    }
    Ok(())
}

/// Validates pallet dimensions.
fn validate_pallet_dims(dims: (f64, f64)) -> Result<(), ValidationError> {
    validation::validate_dimension(dims.0, "Pallet width")
        .map_err(ValidationError::InvalidDimension)?;
    validation::validate_dimension(dims.1, "Pallet depth")
        .map_err(ValidationError::InvalidDimension)?;
    Ok(())
}

/// The pallet footprint a single layer is placed on.
///
/// # Fields
/// * `width` - Extent along the X axis in mm
/// * `depth` - Extent along the Y axis in mm
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema)]
pub struct PalletSpec {
    #[schema(example = 1200.0)]
    pub width: f64,
    #[schema(example = 1000.0)]
    pub depth: f64,
}

impl PalletSpec {
    /// Creates a new pallet spec with validation.
    ///
    /// # Parameters
    /// * `width` - Extent along X in mm
    /// * `depth` - Extent along Y in mm
    ///
    /// # Returns
    /// `Ok(PalletSpec)` for valid values, otherwise `Err(ValidationError)`
    ///
    /// # Examples
    /// ```
    /// use pack_it_flat::model::PalletSpec;
    ///
    /// assert!(PalletSpec::new(1200.0, 1000.0).is_ok());
    /// assert!(PalletSpec::new(-1200.0, 1000.0).is_err());
    /// ```
    pub fn new(width: f64, depth: f64) -> Result<Self, ValidationError> {
        validate_pallet_dims((width, depth))?;
        Ok(Self { width, depth })
    }

    /// Validates an already-constructed spec (e.g. after deserialization).
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_pallet_dims((self.width, self.depth))
    }

    /// Returns the footprint as a Vec2.
    #[inline]
    pub fn dims(&self) -> Vec2 {
        Vec2::new(self.width, self.depth)
    }

    /// Returns the geometric center of the pallet.
    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.depth / 2.0)
    }

    /// Returns the pallet footprint as a rectangle anchored at the origin.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::from_position_and_dims(Vec2::zero(), self.dims())
    }
}

impl Dimensional for PalletSpec {
    fn dimensions(&self) -> Vec2 {
        self.dims()
    }
}

/// One battery model row from the input table.
///
/// # Fields
/// * `model` - Model name, unique per run
/// * `width` - Footprint extent along X in mm
/// * `depth` - Footprint extent along Y in mm
/// * `height` - Unit height in mm; carried through, unused by layout
/// * `weight` - Unit weight in kg
/// * `quantity` - Requested units for this layer; negative values are rejected
/// * `allow_rotation` - Whether the unit may be rotated by 90°
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "model": "BCI65",
    "width": 300.0,
    "depth": 180.0,
    "height": 200.0,
    "weight": 20.0,
    "quantity": 12,
    "allow_rotation": false
}))]
pub struct ItemSpec {
    pub model: String,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub weight: f64,
    pub quantity: i64,
    #[serde(default)]
    pub allow_rotation: bool,
}

impl ItemSpec {
    /// Creates a new item spec with validation.
    ///
    /// # Parameters
    /// * `model` - Model name
    /// * `dims` - Dimensions (width, depth, height) in mm
    /// * `weight` - Unit weight in kg
    /// * `quantity` - Requested units
    /// * `allow_rotation` - Whether 90° rotation is permitted
    ///
    /// # Returns
    /// `Ok(ItemSpec)` for valid values, otherwise `Err(ValidationError)`
    pub fn new(
        model: impl Into<String>,
        dims: (f64, f64, f64),
        weight: f64,
        quantity: i64,
        allow_rotation: bool,
    ) -> Result<Self, ValidationError> {
        validate_item_params(dims, weight, quantity)?;
        Ok(Self {
            model: model.into(),
            width: dims.0,
            depth: dims.1,
            height: dims.2,
            weight,
            quantity,
            allow_rotation,
        })
    }

    /// Validates an already-constructed spec (e.g. one row of a request).
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_item_params(
            (self.width, self.depth, self.height),
            self.weight,
            self.quantity,
        )
    }

    /// Returns the footprint in declared orientation.
    #[inline]
    pub fn footprint(&self) -> Vec2 {
        Vec2::new(self.width, self.depth)
    }

    /// Returns the footprint for the given orientation.
    #[inline]
    pub fn oriented_footprint(&self, rotated: bool) -> Vec2 {
        if rotated {
            self.footprint().swapped()
        } else {
            self.footprint()
        }
    }

    /// Requested quantity as a count, after validation.
    #[inline]
    pub fn units(&self) -> usize {
        self.quantity.max(0) as usize
    }
}

impl Dimensional for ItemSpec {
    fn dimensions(&self) -> Vec2 {
        self.footprint()
    }
}

impl Weighted for ItemSpec {
    fn weight(&self) -> f64 {
        self.weight
    }
}

/// One accepted unit with its position on the pallet.
///
/// # Fields
/// * `model` - Model name of the originating item row
/// * `position` - Lower-left corner (x, y) measured from the pallet's lower-left corner
/// * `size` - Effective footprint actually used; swapped from the spec when rotated
/// * `rotated` - Whether the 90° orientation was applied
/// * `weight` - Unit weight in kg, carried for centroid math
#[derive(Clone, Debug)]
pub struct PlacedItem {
    pub model: String,
    pub position: (f64, f64),
    pub size: (f64, f64),
    pub rotated: bool,
    pub weight: f64,
}

impl PlacedItem {
    /// Creates a new placed item.
    pub fn new(
        model: impl Into<String>,
        position: (f64, f64),
        size: (f64, f64),
        rotated: bool,
        weight: f64,
    ) -> Self {
        Self {
            model: model.into(),
            position,
            size,
            rotated,
            weight,
        }
    }

    /// Returns the center of the bounding box.
    ///
    /// # Returns
    /// Tuple with (center_x, center_y)
    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (
            self.position.0 + self.size.0 / 2.0,
            self.position.1 + self.size.1 / 2.0,
        )
    }

    /// Returns the bounding box of the placed unit.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::from_position_and_dims(
            Vec2::from_tuple(self.position),
            Vec2::from_tuple(self.size),
        )
    }
}

impl Positioned for PlacedItem {
    fn position(&self) -> Vec2 {
        Vec2::from_tuple(self.position)
    }
}

impl Dimensional for PlacedItem {
    fn dimensions(&self) -> Vec2 {
        Vec2::from_tuple(self.size)
    }
}

impl Weighted for PlacedItem {
    fn weight(&self) -> f64 {
        self.weight
    }
}

/// All placements of one pallet layer, in placement order.
///
/// # Fields
/// * `pallet` - The pallet footprint this layer was computed for
/// * `placed` - Accepted units; insertion order equals placement order
#[derive(Clone, Debug)]
pub struct LayerLayout {
    pub pallet: PalletSpec,
    pub placed: Vec<PlacedItem>,
}

impl LayerLayout {
    /// Creates an empty layer for the given pallet.
    pub fn new(pallet: PalletSpec) -> Self {
        Self {
            pallet,
            placed: Vec::new(),
        }
    }

    /// Calculates the total weight of all placed units.
    pub fn total_weight(&self) -> f64 {
        self.placed.iter().map(|p| p.weight).sum()
    }

    /// Counts the placed units of one model.
    pub fn placed_count(&self, model: &str) -> usize {
        self.placed.iter().filter(|p| p.model == model).count()
    }

    /// Calculates the weight centroid of the layer.
    ///
    /// The centroid is the weight-weighted mean of the placed bounding-box
    /// centers. It is undefined when the total placed weight is zero.
    ///
    /// # Returns
    /// `Some((x, y))` for a valid centroid, `None` at zero total weight
    pub fn centroid(&self) -> Option<(f64, f64)> {
        let mut calc = CenterOfMassCalculator::new();
        for p in &self.placed {
            let (cx, cy) = p.center();
            calc.add_point(cx, cy, p.weight);
        }
        calc.compute()
    }

    /// Calculates the centroid offset from the pallet's geometric center.
    ///
    /// # Returns
    /// `Some((offset_x, offset_y))` as absolute distances per axis, `None`
    /// when the centroid is undefined
    pub fn centroid_offset(&self) -> Option<(f64, f64)> {
        let (center_x, center_y) = self.pallet.center();
        self.centroid()
            .map(|(cx, cy)| ((cx - center_x).abs(), (cy - center_y).abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EPSILON_GENERAL;

    #[test]
    fn pallet_spec_rejects_bad_dimensions() {
        assert!(PalletSpec::new(1200.0, 1000.0).is_ok());
        assert!(PalletSpec::new(0.0, 1000.0).is_err());
        assert!(PalletSpec::new(1200.0, -5.0).is_err());
        assert!(PalletSpec::new(f64::NAN, 1000.0).is_err());
    }

    #[test]
    fn item_spec_rejects_bad_rows() {
        assert!(ItemSpec::new("BCI65", (300.0, 180.0, 200.0), 20.0, 12, false).is_ok());
        assert!(ItemSpec::new("BCI65", (0.0, 180.0, 200.0), 20.0, 12, false).is_err());
        assert!(ItemSpec::new("BCI65", (300.0, 180.0, 200.0), -1.0, 12, false).is_err());
        assert!(ItemSpec::new("BCI65", (300.0, 180.0, 200.0), 20.0, -1, false).is_err());
    }

    #[test]
    fn item_spec_allows_zero_weight_and_zero_quantity() {
        assert!(ItemSpec::new("EMPTY", (300.0, 180.0, 200.0), 0.0, 0, false).is_ok());
    }

    #[test]
    fn oriented_footprint_swaps_when_rotated() {
        let item = ItemSpec::new("DIN66", (280.0, 175.0, 190.0), 18.0, 15, true).unwrap();
        assert_eq!(item.oriented_footprint(false), Vec2::new(280.0, 175.0));
        assert_eq!(item.oriented_footprint(true), Vec2::new(175.0, 280.0));
    }

    #[test]
    fn placed_item_center_and_rect() {
        let placed = PlacedItem::new("BCI65", (150.0, 140.0), (300.0, 180.0), false, 20.0);
        assert_eq!(placed.center(), (300.0, 230.0));
        assert_eq!(placed.rect().max, Vec2::new(450.0, 320.0));
    }

    #[test]
    fn layer_centroid_of_two_equal_weights() {
        let pallet = PalletSpec::new(1200.0, 1000.0).unwrap();
        let mut layer = LayerLayout::new(pallet);
        layer
            .placed
            .push(PlacedItem::new("A", (50.0, 50.0), (100.0, 100.0), false, 20.0));
        layer
            .placed
            .push(PlacedItem::new("A", (250.0, 50.0), (100.0, 100.0), false, 20.0));

        // Two equal weights centered at (100, 100) and (300, 100).
        let (cx, cy) = layer.centroid().unwrap();
        assert!((cx - 200.0).abs() < EPSILON_GENERAL);
        assert!((cy - 100.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn layer_centroid_undefined_at_zero_weight() {
        let pallet = PalletSpec::new(1200.0, 1000.0).unwrap();
        let mut layer = LayerLayout::new(pallet);
        layer
            .placed
            .push(PlacedItem::new("A", (0.0, 0.0), (100.0, 100.0), false, 0.0));

        assert!(layer.centroid().is_none());
        assert!(layer.centroid_offset().is_none());
    }

    #[test]
    fn layer_total_weight_and_counts() {
        let pallet = PalletSpec::new(1200.0, 1000.0).unwrap();
        let mut layer = LayerLayout::new(pallet);
        layer
            .placed
            .push(PlacedItem::new("A", (0.0, 0.0), (100.0, 100.0), false, 20.0));
        layer
            .placed
            .push(PlacedItem::new("B", (100.0, 0.0), (100.0, 100.0), false, 18.0));
        layer
            .placed
            .push(PlacedItem::new("A", (200.0, 0.0), (100.0, 100.0), false, 20.0));

        assert!((layer.total_weight() - 58.0).abs() < EPSILON_GENERAL);
        assert_eq!(layer.placed_count("A"), 2);
        assert_eq!(layer.placed_count("B"), 1);
        assert_eq!(layer.placed_count("C"), 0);
    }
}
