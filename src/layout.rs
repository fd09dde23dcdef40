//! Layer layout calculation for 1-tier pallet loading patterns.
//!
//! This module implements the placement strategies behind `compute_layout`:
//! - Row-major shelf packing with optional 90° rotation
//! - Delegation to a maximal-rectangles packer, single or multi pallet
//! - A centered near-square grid for a single item type
//!
//! All strategies report requested-vs-placed counts, per-row validation
//! rejections, warnings, and the weight centroid of every produced layer.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::geometry::intersects;
use crate::maxrects::{MaxRectsPacker, RectPacker, RectRequest};
use crate::model::{ItemSpec, LayerLayout, PalletSpec, PlacedItem, ValidationError};
use crate::types::Vec2;

/// Configuration for the layout calculator.
///
/// Contains the tolerances and limits steering all strategies.
#[derive(Copy, Clone, Debug)]
pub struct LayoutConfig {
    /// General numerical tolerance for fit checks
    pub general_epsilon: f64,
    /// Margin above which the grid strategy notes excessive cushioning (mm)
    pub cushion_note_mm: f64,
    /// Upper bound on pallet layers opened by the multi-pallet mode
    pub max_layers: usize,
    /// When set, overrides every item's rotation-allowed flag
    pub allow_rotation_override: Option<bool>,
}

impl LayoutConfig {
    pub const DEFAULT_GENERAL_EPSILON: f64 = 1e-6;
    pub const DEFAULT_CUSHION_NOTE_MM: f64 = 30.0;
    pub const DEFAULT_MAX_LAYERS: usize = 32;
    pub const DEFAULT_ALLOW_ROTATION_OVERRIDE: Option<bool> = None;

    /// Creates a builder for custom configuration.
    pub fn builder() -> LayoutConfigBuilder {
        LayoutConfigBuilder::default()
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            general_epsilon: Self::DEFAULT_GENERAL_EPSILON,
            cushion_note_mm: Self::DEFAULT_CUSHION_NOTE_MM,
            max_layers: Self::DEFAULT_MAX_LAYERS,
            allow_rotation_override: Self::DEFAULT_ALLOW_ROTATION_OVERRIDE,
        }
    }
}

/// Builder for LayoutConfig.
#[derive(Clone, Debug, Default)]
pub struct LayoutConfigBuilder {
    config: LayoutConfig,
}

impl LayoutConfigBuilder {
    /// Sets the general numerical tolerance.
    pub fn general_epsilon(mut self, epsilon: f64) -> Self {
        self.config.general_epsilon = epsilon;
        self
    }

    /// Sets the cushioning note threshold in mm.
    pub fn cushion_note_mm(mut self, millimeters: f64) -> Self {
        self.config.cushion_note_mm = millimeters;
        self
    }

    /// Sets the layer cap for the multi-pallet mode.
    pub fn max_layers(mut self, layers: usize) -> Self {
        self.config.max_layers = layers;
        self
    }

    /// Sets the request-level rotation override.
    pub fn allow_rotation_override(mut self, value: Option<bool>) -> Self {
        self.config.allow_rotation_override = value;
        self
    }

    /// Builds the final configuration.
    pub fn build(self) -> LayoutConfig {
        self.config
    }
}

/// Placement strategy selected by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Row-major shelf packing in input order, rotation optional
    Shelf,
    /// Maximal-rectangles packing onto a single pallet, no rotation
    MaxRects,
    /// Maximal-rectangles packing across additional pallet layers on overflow
    MaxRectsMulti,
    /// Centered near-square grid, single item type only
    CenteredGrid,
}

/// Requested-vs-placed accounting for one item row.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PlacementSummary {
    pub model: String,
    pub requested: usize,
    pub placed: usize,
}

/// An input row that failed validation; the remaining rows proceed.
#[derive(Clone, Debug)]
pub struct RejectedRow {
    /// Zero-based index of the row in the request
    pub row: usize,
    pub model: String,
    pub reason: ValidationError,
}

/// Severity of a layout warning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WarningSeverity {
    Info,
    Caution,
    Alert,
}

impl WarningSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningSeverity::Info => "info",
            WarningSeverity::Caution => "caution",
            WarningSeverity::Alert => "alert",
        }
    }
}

/// Non-fatal findings surfaced alongside the layout plan.
#[derive(Clone, Debug)]
pub enum LayoutWarning {
    /// Some units of an item type could not be placed
    PartialPlacement {
        model: String,
        requested: usize,
        placed: usize,
    },
    /// No unit of an item type fit at all
    ZeroPlacement { model: String, requested: usize },
    /// The centered grid left more margin than typical spacer stock covers
    CushionExceeded { margin_x: f64, margin_y: f64 },
}

impl LayoutWarning {
    pub fn code(&self) -> &'static str {
        match self {
            LayoutWarning::PartialPlacement { .. } => "partial_placement",
            LayoutWarning::ZeroPlacement { .. } => "zero_placement",
            LayoutWarning::CushionExceeded { .. } => "cushion_exceeded",
        }
    }

    pub fn severity(&self) -> WarningSeverity {
        match self {
            LayoutWarning::PartialPlacement { .. } => WarningSeverity::Caution,
            LayoutWarning::ZeroPlacement { .. } => WarningSeverity::Alert,
            LayoutWarning::CushionExceeded { .. } => WarningSeverity::Info,
        }
    }
}

impl std::fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutWarning::PartialPlacement {
                model,
                requested,
                placed,
            } => write!(
                f,
                "Model {}: only {} of {} requested units were placed",
                model, placed, requested
            ),
            LayoutWarning::ZeroPlacement { model, requested } => write!(
                f,
                "Model {}: none of {} requested units fit on the pallet, check the dimensions",
                model, requested
            ),
            LayoutWarning::CushionExceeded { margin_x, margin_y } => write!(
                f,
                "Centering margins of {:.1} mm x {:.1} mm exceed typical spacer stock",
                margin_x, margin_y
            ),
        }
    }
}

/// Errors that abort the whole computation.
#[derive(Clone, Debug)]
pub enum LayoutError {
    /// The grid strategy found no orientation/grid combination that fits
    Infeasible { model: String },
    /// The grid strategy needs exactly one item row
    SingleItemRequired { given: usize },
    /// The grid strategy's sole item row failed validation
    InvalidItem {
        model: String,
        reason: ValidationError,
    },
}

impl LayoutError {
    pub fn code(&self) -> &'static str {
        match self {
            LayoutError::Infeasible { .. } => "infeasible_layout",
            LayoutError::SingleItemRequired { .. } => "single_item_required",
            LayoutError::InvalidItem { .. } => "invalid_item",
        }
    }
}

impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutError::Infeasible { model } => write!(
                f,
                "Model {} cannot be arranged on the pallet in any orientation, adjust quantity or size",
                model
            ),
            LayoutError::SingleItemRequired { given } => write!(
                f,
                "The centered grid strategy requires exactly one item row, got {}",
                given
            ),
            LayoutError::InvalidItem { model, reason } => {
                write!(f, "Model {}: {}", model, reason)
            }
        }
    }
}

impl std::error::Error for LayoutError {}

/// Result of the layout computation.
#[derive(Clone, Debug)]
pub struct LayoutPlan {
    /// Produced pallet layers; exactly one except for the multi-pallet mode
    pub layers: Vec<LayerLayout>,
    /// Requested-vs-placed accounting per accepted item row
    pub summary: Vec<PlacementSummary>,
    /// Rows that failed validation
    pub rejected: Vec<RejectedRow>,
    /// Non-fatal findings
    pub warnings: Vec<LayoutWarning>,
}

impl LayoutPlan {
    /// Indicates whether every requested unit of every valid row was placed.
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty() && self.summary.iter().all(|s| s.placed == s.requested)
    }

    /// Returns the number of produced layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Returns the total number of placed units across all layers.
    pub fn placed_units(&self) -> usize {
        self.layers.iter().map(|l| l.placed.len()).sum()
    }

    /// Returns the total number of requested units across accepted rows.
    pub fn requested_units(&self) -> usize {
        self.summary.iter().map(|s| s.requested).sum()
    }

    /// Calculates the total placed weight across all layers.
    pub fn total_placed_weight(&self) -> f64 {
        self.layers.iter().map(|l| l.total_weight()).sum()
    }
}

/// Events emitted during layout computation for live visualization.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum LayoutEvent {
    /// A new pallet layer is started.
    LayerStarted {
        layer: usize,
        pallet_width: f64,
        pallet_depth: f64,
    },
    /// A unit was placed.
    ItemPlaced {
        layer: usize,
        model: String,
        pos: (f64, f64),
        size: (f64, f64),
        rotated: bool,
        weight: f64,
    },
    /// An input row was rejected during validation.
    ItemRejected {
        row: usize,
        model: String,
        reason_code: String,
        reason_text: String,
    },
    /// Computation finished.
    Finished {
        layers: usize,
        placed: usize,
        unplaced: usize,
    },
}

/// Computes a 1-tier loading pattern for the given pallet and item rows.
///
/// Validates rows, dispatches to the selected strategy, and returns the
/// plan with placements, accounting, rejections, and warnings.
///
/// # Parameters
/// * `pallet` - The pallet footprint
/// * `items` - Item rows in input order
/// * `strategy` - The placement strategy to apply
/// * `config` - Tolerances and limits
///
/// # Returns
/// `Ok(LayoutPlan)` or a `LayoutError` when the grid strategy cannot
/// produce any result
pub fn compute_layout(
    pallet: &PalletSpec,
    items: &[ItemSpec],
    strategy: Strategy,
    config: LayoutConfig,
) -> Result<LayoutPlan, LayoutError> {
    compute_layout_with_progress(pallet, items, strategy, config, |_| {})
}

/// Layout computation with a live progress callback.
///
/// Calls the callback for every placement step (suited for SSE streaming).
pub fn compute_layout_with_progress(
    pallet: &PalletSpec,
    items: &[ItemSpec],
    strategy: Strategy,
    config: LayoutConfig,
    mut on_event: impl FnMut(&LayoutEvent),
) -> Result<LayoutPlan, LayoutError> {
    if strategy == Strategy::CenteredGrid {
        return grid_plan(pallet, items, &config, &mut on_event);
    }

    let (valid, rejected) = validate_rows(items, &mut on_event);

    let mut plan = match strategy {
        Strategy::Shelf => shelf_plan(pallet, &valid, &config, &mut on_event),
        Strategy::MaxRects => maxrects_plan(pallet, &valid, Some(1), &mut on_event),
        Strategy::MaxRectsMulti => {
            maxrects_plan(pallet, &valid, Some(config.max_layers), &mut on_event)
        }
        Strategy::CenteredGrid => unreachable!("handled above"),
    };
    plan.rejected = rejected;

    on_event(&LayoutEvent::Finished {
        layers: plan.layer_count(),
        placed: plan.placed_units(),
        unplaced: plan.requested_units() - plan.placed_units(),
    });
    Ok(plan)
}

/// Validates rows and splits them into accepted specs and rejections.
///
/// Later rows reusing an earlier model name are rejected; the first
/// occurrence wins.
fn validate_rows(
    items: &[ItemSpec],
    on_event: &mut impl FnMut(&LayoutEvent),
) -> (Vec<ItemSpec>, Vec<RejectedRow>) {
    let mut valid = Vec::with_capacity(items.len());
    let mut rejected = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for (row, item) in items.iter().enumerate() {
        let reason = match item.validate() {
            Err(reason) => Some(reason),
            Ok(()) if !seen.insert(item.model.as_str()) => {
                Some(ValidationError::DuplicateModel(item.model.clone()))
            }
            Ok(()) => None,
        };

        match reason {
            Some(reason) => {
                on_event(&LayoutEvent::ItemRejected {
                    row,
                    model: item.model.clone(),
                    reason_code: reason.code().to_string(),
                    reason_text: reason.to_string(),
                });
                rejected.push(RejectedRow {
                    row,
                    model: item.model.clone(),
                    reason,
                });
            }
            None => valid.push(item.clone()),
        }
    }

    (valid, rejected)
}

/// Effective rotation permission for one item under the current config.
fn rotation_allowed(item: &ItemSpec, config: &LayoutConfig) -> bool {
    config.allow_rotation_override.unwrap_or(item.allow_rotation)
}

/// Builds the requested-vs-placed summary and the derived warnings.
fn summarize(valid: &[ItemSpec], layers: &[LayerLayout]) -> (Vec<PlacementSummary>, Vec<LayoutWarning>) {
    let mut summary = Vec::with_capacity(valid.len());
    let mut warnings = Vec::new();

    for item in valid {
        let requested = item.units();
        let placed = layers
            .iter()
            .map(|l| l.placed_count(&item.model))
            .sum::<usize>();
        if requested > 0 {
            if placed == 0 {
                warnings.push(LayoutWarning::ZeroPlacement {
                    model: item.model.clone(),
                    requested,
                });
            } else if placed < requested {
                warnings.push(LayoutWarning::PartialPlacement {
                    model: item.model.clone(),
                    requested,
                    placed,
                });
            }
        }
        summary.push(PlacementSummary {
            model: item.model.clone(),
            requested,
            placed,
        });
    }

    (summary, warnings)
}

/// Row-major shelf packing with optional rotation.
///
/// Keeps an explicit cursor (x, y) and the running maximum height of the
/// current row. The cursor carries across item types; the heuristic is
/// greedy and never re-packs earlier rows.
fn shelf_plan(
    pallet: &PalletSpec,
    valid: &[ItemSpec],
    config: &LayoutConfig,
    on_event: &mut impl FnMut(&LayoutEvent),
) -> LayoutPlan {
    let mut layer = LayerLayout::new(*pallet);
    on_event(&LayoutEvent::LayerStarted {
        layer: 0,
        pallet_width: pallet.width,
        pallet_depth: pallet.depth,
    });

    let eps = config.general_epsilon;
    let mut cursor_x = 0.0_f64;
    let mut cursor_y = 0.0_f64;
    let mut row_max_height = 0.0_f64;

    for item in valid {
        let may_rotate = rotation_allowed(item, config);

        for _ in 0..item.units() {
            let mut fit = orientation_fit(pallet, item, may_rotate, cursor_x, cursor_y, eps);

            if fit.is_none() {
                // Wrap to a new row and retry both orientations once.
                cursor_x = 0.0;
                cursor_y += row_max_height;
                row_max_height = 0.0;
                fit = orientation_fit(pallet, item, may_rotate, cursor_x, cursor_y, eps);
            }

            let Some((size, rotated)) = fit else {
                // Still unfit at the start of the fresh row: give up on
                // this item type, the summary reports the shortfall.
                break;
            };

            let placed = PlacedItem::new(
                item.model.clone(),
                (cursor_x, cursor_y),
                size.as_tuple(),
                rotated,
                item.weight,
            );
            on_event(&LayoutEvent::ItemPlaced {
                layer: 0,
                model: placed.model.clone(),
                pos: placed.position,
                size: placed.size,
                rotated: placed.rotated,
                weight: placed.weight,
            });
            layer.placed.push(placed);

            cursor_x += size.x;
            row_max_height = row_max_height.max(size.y);
        }
    }

    let layers = vec![layer];
    let (summary, warnings) = summarize(valid, &layers);
    LayoutPlan {
        layers,
        summary,
        rejected: Vec::new(),
        warnings,
    }
}

/// Tries the declared orientation at the cursor, then the swapped one.
///
/// # Returns
/// `Some((footprint, rotated))` for the first orientation that fits
fn orientation_fit(
    pallet: &PalletSpec,
    item: &ItemSpec,
    may_rotate: bool,
    x: f64,
    y: f64,
    eps: f64,
) -> Option<(Vec2, bool)> {
    let declared = item.oriented_footprint(false);
    if x + declared.x <= pallet.width + eps && y + declared.y <= pallet.depth + eps {
        return Some((declared, false));
    }
    if may_rotate {
        let swapped = item.oriented_footprint(true);
        if x + swapped.x <= pallet.width + eps && y + swapped.y <= pallet.depth + eps {
            return Some((swapped, true));
        }
    }
    None
}

/// Delegation to the rectangle packer, one rectangle per requested unit.
///
/// Rotation is never applied here; the packer works on declared
/// orientations only.
fn maxrects_plan(
    pallet: &PalletSpec,
    valid: &[ItemSpec],
    max_bins: Option<usize>,
    on_event: &mut impl FnMut(&LayoutEvent),
) -> LayoutPlan {
    let packer = MaxRectsPacker::default();

    let mut requests = Vec::new();
    for (idx, item) in valid.iter().enumerate() {
        for _ in 0..item.units() {
            requests.push(RectRequest {
                item: idx,
                width: item.width,
                height: item.depth,
            });
        }
    }

    let placements = packer.pack(&requests, pallet.width, pallet.depth, max_bins);

    let mut layers: Vec<LayerLayout> = Vec::new();
    for packed in &placements {
        while layers.len() <= packed.bin {
            on_event(&LayoutEvent::LayerStarted {
                layer: layers.len(),
                pallet_width: pallet.width,
                pallet_depth: pallet.depth,
            });
            layers.push(LayerLayout::new(*pallet));
        }

        let item = &valid[packed.item];
        let placed = PlacedItem::new(
            item.model.clone(),
            (packed.x, packed.y),
            (packed.width, packed.height),
            false,
            item.weight,
        );
        on_event(&LayoutEvent::ItemPlaced {
            layer: packed.bin,
            model: placed.model.clone(),
            pos: placed.position,
            size: placed.size,
            rotated: placed.rotated,
            weight: placed.weight,
        });
        layers[packed.bin].placed.push(placed);
    }

    if layers.is_empty() {
        on_event(&LayoutEvent::LayerStarted {
            layer: 0,
            pallet_width: pallet.width,
            pallet_depth: pallet.depth,
        });
        layers.push(LayerLayout::new(*pallet));
    }

    // The packer behind the trait is swappable; catch a misbehaving one early.
    debug_assert!(
        layers.iter().all(|layer| layer
            .placed
            .iter()
            .enumerate()
            .all(|(i, a)| layer.placed.iter().skip(i + 1).all(|b| !intersects(a, b)))),
        "rectangle packer produced overlapping placements"
    );

    let (summary, warnings) = summarize(valid, &layers);
    LayoutPlan {
        layers,
        summary,
        rejected: Vec::new(),
        warnings,
    }
}

/// Winning grid arrangement of the near-square search.
#[derive(Clone, Copy, Debug)]
struct GridCandidate {
    rows: usize,
    cols: usize,
    cell: Vec2,
    rotated: bool,
    diff: f64,
}

/// Centered near-square grid for exactly one item type.
fn grid_plan(
    pallet: &PalletSpec,
    items: &[ItemSpec],
    config: &LayoutConfig,
    on_event: &mut impl FnMut(&LayoutEvent),
) -> Result<LayoutPlan, LayoutError> {
    if items.len() != 1 {
        return Err(LayoutError::SingleItemRequired { given: items.len() });
    }
    let item = &items[0];
    if let Err(reason) = item.validate() {
        return Err(LayoutError::InvalidItem {
            model: item.model.clone(),
            reason,
        });
    }

    let mut layer = LayerLayout::new(*pallet);
    on_event(&LayoutEvent::LayerStarted {
        layer: 0,
        pallet_width: pallet.width,
        pallet_depth: pallet.depth,
    });

    let quantity = item.units();
    let mut warnings = Vec::new();

    if quantity > 0 {
        let best = find_best_grid(pallet, item, quantity, config).ok_or_else(|| {
            LayoutError::Infeasible {
                model: item.model.clone(),
            }
        })?;

        let total_w = best.cols as f64 * best.cell.x;
        let total_h = best.rows as f64 * best.cell.y;
        let margin_x = (pallet.width - total_w) / 2.0;
        let margin_y = (pallet.depth - total_h) / 2.0;

        if margin_x > config.cushion_note_mm || margin_y > config.cushion_note_mm {
            warnings.push(LayoutWarning::CushionExceeded { margin_x, margin_y });
        }

        // Fill left-to-right, bottom-to-top; trailing cells stay empty.
        let mut placed_units = 0;
        'rows: for r in 0..best.rows {
            for c in 0..best.cols {
                if placed_units >= quantity {
                    break 'rows;
                }
                let x = margin_x + c as f64 * best.cell.x;
                let y = margin_y + r as f64 * best.cell.y;
                let placed = PlacedItem::new(
                    item.model.clone(),
                    (x, y),
                    best.cell.as_tuple(),
                    best.rotated,
                    item.weight,
                );
                on_event(&LayoutEvent::ItemPlaced {
                    layer: 0,
                    model: placed.model.clone(),
                    pos: placed.position,
                    size: placed.size,
                    rotated: placed.rotated,
                    weight: placed.weight,
                });
                layer.placed.push(placed);
                placed_units += 1;
            }
        }
    }

    let layers = vec![layer];
    let summary = vec![PlacementSummary {
        model: item.model.clone(),
        requested: quantity,
        placed: layers[0].placed.len(),
    }];
    let plan = LayoutPlan {
        layers,
        summary,
        rejected: Vec::new(),
        warnings,
    };

    on_event(&LayoutEvent::Finished {
        layers: plan.layer_count(),
        placed: plan.placed_units(),
        unplaced: plan.requested_units() - plan.placed_units(),
    });
    Ok(plan)
}

/// Searches both orientations and all row counts for the feasible grid
/// whose footprint is closest to a square.
///
/// Candidates whose top row would stay entirely empty are skipped: their
/// footprint overstates the occupied area and would pull the centered
/// load off the pallet middle. Strict comparison keeps the earliest
/// candidate on equal diffs, declared orientation first.
fn find_best_grid(
    pallet: &PalletSpec,
    item: &ItemSpec,
    quantity: usize,
    config: &LayoutConfig,
) -> Option<GridCandidate> {
    let eps = config.general_epsilon;
    let mut best: Option<GridCandidate> = None;

    for rotated in [false, true] {
        if rotated && !rotation_allowed(item, config) {
            continue;
        }
        let cell = item.oriented_footprint(rotated);

        for rows in 1..=quantity {
            let cols = quantity.div_ceil(rows);
            if rows * cols < quantity {
                continue;
            }
            if rows > 1 && (rows - 1) * cols >= quantity {
                continue;
            }

            let total_w = cols as f64 * cell.x;
            let total_h = rows as f64 * cell.y;
            if total_w > pallet.width + eps || total_h > pallet.depth + eps {
                continue;
            }

            let diff = (total_w - total_h).abs();
            if best.as_ref().is_none_or(|b| diff < b.diff) {
                best = Some(GridCandidate {
                    rows,
                    cols,
                    cell,
                    rotated,
                    diff,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EPSILON_GENERAL;

    fn pallet() -> PalletSpec {
        PalletSpec::new(1200.0, 1000.0).unwrap()
    }

    fn item(
        model: &str,
        width: f64,
        depth: f64,
        weight: f64,
        quantity: i64,
        allow_rotation: bool,
    ) -> ItemSpec {
        ItemSpec {
            model: model.to_string(),
            width,
            depth,
            height: 200.0,
            weight,
            quantity,
            allow_rotation,
        }
    }

    fn assert_layer_invariants(layer: &LayerLayout) {
        let pallet_rect = layer.pallet.rect();
        for placed in &layer.placed {
            assert!(
                placed.rect().contained_in(&pallet_rect, EPSILON_GENERAL),
                "unit of {} at {:?} leaves the pallet",
                placed.model,
                placed.position
            );
        }
        for (i, a) in layer.placed.iter().enumerate() {
            for b in layer.placed.iter().skip(i + 1) {
                assert!(
                    !intersects(a, b),
                    "units overlap: {:?} vs {:?}",
                    a.position,
                    b.position
                );
            }
        }
    }

    #[test]
    fn shelf_fills_rows_and_wraps() {
        let items = vec![
            item("BCI65", 300.0, 180.0, 20.0, 4, false),
            item("DIN66", 280.0, 175.0, 18.0, 2, false),
        ];
        let plan = compute_layout(&pallet(), &items, Strategy::Shelf, LayoutConfig::default())
            .unwrap();

        assert!(plan.is_complete());
        assert_eq!(plan.layer_count(), 1);
        let layer = &plan.layers[0];
        assert_eq!(layer.placed.len(), 6);
        assert_layer_invariants(layer);

        // Four units fill the first row exactly, the fifth wraps.
        assert_eq!(layer.placed[0].position, (0.0, 0.0));
        assert_eq!(layer.placed[3].position, (900.0, 0.0));
        assert_eq!(layer.placed[4].position, (0.0, 180.0));
        assert_eq!(layer.placed[5].position, (280.0, 180.0));
        assert!((plan.total_placed_weight() - 116.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn shelf_rotates_when_declared_orientation_does_not_fit() {
        let narrow = PalletSpec::new(1000.0, 400.0).unwrap();
        let items = vec![item("TALL", 300.0, 500.0, 25.0, 1, true)];
        let plan =
            compute_layout(&narrow, &items, Strategy::Shelf, LayoutConfig::default()).unwrap();

        let layer = &plan.layers[0];
        assert_eq!(layer.placed.len(), 1);
        assert!(layer.placed[0].rotated);
        assert_eq!(layer.placed[0].size, (500.0, 300.0));
        assert_layer_invariants(layer);
    }

    #[test]
    fn shelf_reports_zero_placement_without_rotation() {
        let narrow = PalletSpec::new(1000.0, 400.0).unwrap();
        let items = vec![item("TALL", 300.0, 500.0, 25.0, 2, false)];
        let plan =
            compute_layout(&narrow, &items, Strategy::Shelf, LayoutConfig::default()).unwrap();

        assert_eq!(plan.placed_units(), 0);
        assert_eq!(plan.warnings.len(), 1);
        assert_eq!(plan.warnings[0].code(), "zero_placement");
        assert_eq!(plan.warnings[0].severity(), WarningSeverity::Alert);
    }

    #[test]
    fn shelf_reports_partial_placement() {
        let square = PalletSpec::new(1000.0, 1000.0).unwrap();
        let items = vec![item("BULKY", 600.0, 600.0, 40.0, 3, false)];
        let plan =
            compute_layout(&square, &items, Strategy::Shelf, LayoutConfig::default()).unwrap();

        assert_eq!(plan.placed_units(), 1);
        assert!(!plan.is_complete());
        match &plan.warnings[0] {
            LayoutWarning::PartialPlacement {
                model,
                requested,
                placed,
            } => {
                assert_eq!(model, "BULKY");
                assert_eq!(*requested, 3);
                assert_eq!(*placed, 1);
            }
            other => panic!("expected partial placement warning, got {:?}", other),
        }
    }

    #[test]
    fn quantity_zero_places_nothing_and_warns_nothing() {
        let items = vec![item("BCI65", 300.0, 180.0, 20.0, 0, false)];
        for strategy in [Strategy::Shelf, Strategy::MaxRects, Strategy::CenteredGrid] {
            let plan =
                compute_layout(&pallet(), &items, strategy, LayoutConfig::default()).unwrap();
            assert_eq!(plan.placed_units(), 0, "strategy {:?}", strategy);
            assert!(plan.warnings.is_empty(), "strategy {:?}", strategy);
            assert!(plan.is_complete(), "strategy {:?}", strategy);
        }
    }

    #[test]
    fn invalid_rows_are_rejected_without_aborting_others() {
        let items = vec![
            item("BROKEN", -300.0, 180.0, 20.0, 4, false),
            item("BCI65", 300.0, 180.0, 20.0, 4, false),
            item("BCI65", 280.0, 175.0, 18.0, 2, false),
        ];
        let plan = compute_layout(&pallet(), &items, Strategy::Shelf, LayoutConfig::default())
            .unwrap();

        assert_eq!(plan.rejected.len(), 2);
        assert_eq!(plan.rejected[0].row, 0);
        assert_eq!(plan.rejected[0].reason.code(), "invalid_dimension");
        assert_eq!(plan.rejected[1].row, 2);
        assert_eq!(plan.rejected[1].reason.code(), "duplicate_model");
        assert_eq!(plan.placed_units(), 4);
        assert!(!plan.is_complete());
    }

    #[test]
    fn rotation_override_disables_item_flags() {
        let narrow = PalletSpec::new(1000.0, 400.0).unwrap();
        let items = vec![item("TALL", 300.0, 500.0, 25.0, 1, true)];
        let config = LayoutConfig::builder()
            .allow_rotation_override(Some(false))
            .build();
        let plan = compute_layout(&narrow, &items, Strategy::Shelf, config).unwrap();

        assert_eq!(plan.placed_units(), 0);
    }

    #[test]
    fn maxrects_places_all_when_they_fit() {
        let items = vec![item("BCI65", 300.0, 180.0, 20.0, 12, false)];
        let plan = compute_layout(&pallet(), &items, Strategy::MaxRects, LayoutConfig::default())
            .unwrap();

        assert!(plan.is_complete());
        assert_eq!(plan.layer_count(), 1);
        assert_eq!(plan.placed_units(), 12);
        assert_layer_invariants(&plan.layers[0]);
        assert!((plan.total_placed_weight() - 240.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn maxrects_single_pallet_reports_overflow() {
        let items = vec![item("BULKY", 600.0, 500.0, 40.0, 5, false)];
        let plan = compute_layout(&pallet(), &items, Strategy::MaxRects, LayoutConfig::default())
            .unwrap();

        assert_eq!(plan.layer_count(), 1);
        assert_eq!(plan.placed_units(), 4);
        assert_eq!(plan.warnings[0].code(), "partial_placement");
        assert_layer_invariants(&plan.layers[0]);
    }

    #[test]
    fn maxrects_multi_opens_additional_layer() {
        let items = vec![item("BULKY", 600.0, 500.0, 40.0, 5, false)];
        let plan = compute_layout(
            &pallet(),
            &items,
            Strategy::MaxRectsMulti,
            LayoutConfig::default(),
        )
        .unwrap();

        assert!(plan.is_complete());
        assert_eq!(plan.layer_count(), 2);
        assert_eq!(plan.layers[0].placed.len(), 4);
        assert_eq!(plan.layers[1].placed.len(), 1);
        for layer in &plan.layers {
            assert_layer_invariants(layer);
        }
    }

    #[test]
    fn maxrects_zero_placement_for_oversized_item() {
        let items = vec![item("HUGE", 1300.0, 1100.0, 80.0, 2, false)];
        let plan = compute_layout(&pallet(), &items, Strategy::MaxRects, LayoutConfig::default())
            .unwrap();

        assert_eq!(plan.placed_units(), 0);
        assert_eq!(plan.layer_count(), 1);
        assert_eq!(plan.warnings[0].code(), "zero_placement");
    }

    #[test]
    fn grid_picks_minimum_diff_feasible_pair() {
        // 1200x1000 pallet, 300x180 item, no rotation, quantity 12:
        // rows=3/cols=4 gives 1200x540 (diff 660), rows=4/cols=3 gives
        // 900x720 (diff 180) and wins; margins 150/140.
        let items = vec![item("BCI65", 300.0, 180.0, 20.0, 12, false)];
        let plan = compute_layout(
            &pallet(),
            &items,
            Strategy::CenteredGrid,
            LayoutConfig::default(),
        )
        .unwrap();

        let layer = &plan.layers[0];
        assert_eq!(layer.placed.len(), 12);
        assert_layer_invariants(layer);

        assert_eq!(layer.placed[0].position, (150.0, 140.0));
        assert_eq!(layer.placed[2].position, (750.0, 140.0));
        // Fourth unit starts the second row: three columns, four rows.
        assert_eq!(layer.placed[3].position, (150.0, 320.0));
        assert_eq!(layer.placed[11].position, (750.0, 680.0));

        // A full symmetric grid balances on the pallet center.
        let (cg_x, cg_y) = layer.centroid().unwrap();
        assert!((cg_x - 600.0).abs() < EPSILON_GENERAL);
        assert!((cg_y - 500.0).abs() < EPSILON_GENERAL);
        let (off_x, off_y) = layer.centroid_offset().unwrap();
        assert!(off_x < EPSILON_GENERAL && off_y < EPSILON_GENERAL);
    }

    #[test]
    fn grid_notes_excessive_cushioning() {
        let square = PalletSpec::new(1000.0, 1000.0).unwrap();
        let items = vec![item("CUBE", 100.0, 100.0, 5.0, 5, false)];
        let plan = compute_layout(
            &square,
            &items,
            Strategy::CenteredGrid,
            LayoutConfig::default(),
        )
        .unwrap();

        // 2 rows x 3 cols, five placed, trailing cell empty.
        assert_eq!(plan.placed_units(), 5);
        assert_eq!(plan.warnings.len(), 1);
        match &plan.warnings[0] {
            LayoutWarning::CushionExceeded { margin_x, margin_y } => {
                assert!((margin_x - 350.0).abs() < EPSILON_GENERAL);
                assert!((margin_y - 400.0).abs() < EPSILON_GENERAL);
            }
            other => panic!("expected cushion warning, got {:?}", other),
        }
        assert_eq!(plan.warnings[0].severity(), WarningSeverity::Info);
    }

    #[test]
    fn grid_uses_rotation_when_permitted() {
        let slim = PalletSpec::new(400.0, 1000.0).unwrap();
        // Declared 500x100 never fits the 400 width; rotated 100x500 does.
        let items = vec![item("SLAB", 500.0, 100.0, 10.0, 4, true)];
        let plan = compute_layout(
            &slim,
            &items,
            Strategy::CenteredGrid,
            LayoutConfig::default(),
        )
        .unwrap();

        assert_eq!(plan.placed_units(), 4);
        assert!(plan.layers[0].placed.iter().all(|p| p.rotated));
        assert_layer_invariants(&plan.layers[0]);
    }

    #[test]
    fn grid_infeasible_when_nothing_fits() {
        let items = vec![item("HUGE", 1300.0, 1100.0, 80.0, 2, true)];
        let result = compute_layout(
            &pallet(),
            &items,
            Strategy::CenteredGrid,
            LayoutConfig::default(),
        );

        match result {
            Err(LayoutError::Infeasible { model }) => assert_eq!(model, "HUGE"),
            other => panic!("expected infeasible layout, got {:?}", other),
        }
    }

    #[test]
    fn grid_requires_exactly_one_item() {
        let items = vec![
            item("BCI65", 300.0, 180.0, 20.0, 12, false),
            item("DIN66", 280.0, 175.0, 18.0, 15, false),
        ];
        let result = compute_layout(
            &pallet(),
            &items,
            Strategy::CenteredGrid,
            LayoutConfig::default(),
        );

        match result {
            Err(LayoutError::SingleItemRequired { given }) => assert_eq!(given, 2),
            other => panic!("expected single-item error, got {:?}", other),
        }

        let result = compute_layout(
            &pallet(),
            &[],
            Strategy::CenteredGrid,
            LayoutConfig::default(),
        );
        assert!(matches!(
            result,
            Err(LayoutError::SingleItemRequired { given: 0 })
        ));
    }

    #[test]
    fn grid_fails_outright_on_invalid_sole_row() {
        let items = vec![item("BROKEN", -300.0, 180.0, 20.0, 12, false)];
        let result = compute_layout(
            &pallet(),
            &items,
            Strategy::CenteredGrid,
            LayoutConfig::default(),
        );

        assert!(matches!(result, Err(LayoutError::InvalidItem { .. })));
    }

    #[test]
    fn progress_events_follow_placements() {
        let items = vec![
            item("BROKEN", 0.0, 180.0, 20.0, 1, false),
            item("BCI65", 300.0, 180.0, 20.0, 2, false),
        ];
        let mut events = Vec::new();
        let plan = compute_layout_with_progress(
            &pallet(),
            &items,
            Strategy::Shelf,
            LayoutConfig::default(),
            |evt| events.push(evt.clone()),
        )
        .unwrap();

        assert_eq!(plan.placed_units(), 2);
        assert!(matches!(events[0], LayoutEvent::ItemRejected { row: 0, .. }));
        assert!(matches!(events[1], LayoutEvent::LayerStarted { layer: 0, .. }));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, LayoutEvent::ItemPlaced { .. }))
                .count(),
            2
        );
        assert!(matches!(
            events.last(),
            Some(LayoutEvent::Finished {
                layers: 1,
                placed: 2,
                unplaced: 0
            })
        ));
    }
}
