//! Maximal-rectangles packing for the delegation strategies.
//!
//! The layout calculator hands every requested unit to a rectangle packer
//! behind the `RectPacker` trait, so the concrete algorithm stays swappable.
//! The shipped implementation keeps the classic MaxRects bookkeeping: a
//! free-rectangle list per bin, seeded with the full bin, split on every
//! placement and pruned of contained entries. Scoring heuristics: best
//! short side fit (default), best area fit, best long side fit.

use crate::types::EPSILON_GENERAL;

/// One rectangle to pack, tagged with the index of its originating item row.
#[derive(Clone, Copy, Debug)]
pub struct RectRequest {
    pub item: usize,
    pub width: f64,
    pub height: f64,
}

/// One packed rectangle with its bin index and position.
#[derive(Clone, Copy, Debug)]
pub struct PackedRect {
    pub item: usize,
    pub bin: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Interface for rectangle packers.
///
/// Implementations place as many requests as possible into bins of the
/// given footprint. Requests that fit nowhere are simply absent from the
/// result; the caller reconciles requested vs. placed counts.
pub trait RectPacker {
    /// Packs `requests` into bins of `bin_width` × `bin_height`.
    ///
    /// # Parameters
    /// * `requests` - Rectangles to place, one per requested unit
    /// * `bin_width` - Bin extent along X
    /// * `bin_height` - Bin extent along Y
    /// * `max_bins` - Upper bound on opened bins; `None` opens bins as needed
    ///
    /// # Returns
    /// Placements in placement order; unplaceable requests are omitted
    fn pack(
        &self,
        requests: &[RectRequest],
        bin_width: f64,
        bin_height: f64,
        max_bins: Option<usize>,
    ) -> Vec<PackedRect>;
}

/// Scoring heuristic for choosing the free rectangle to place into.
///
/// Lower scores win; ties fall back to the secondary component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScoreHeuristic {
    /// Minimize the smaller leftover side (tight fits first).
    #[default]
    BestShortSideFit,
    /// Minimize the leftover area.
    BestAreaFit,
    /// Minimize the larger leftover side.
    BestLongSideFit,
}

/// A free region of a bin.
#[derive(Clone, Copy, Debug)]
struct FreeRect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl FreeRect {
    fn fits(&self, width: f64, height: f64) -> bool {
        width <= self.width + EPSILON_GENERAL && height <= self.height + EPSILON_GENERAL
    }

    fn intersects(&self, other: &FreeRect) -> bool {
        !(self.x + self.width <= other.x + EPSILON_GENERAL
            || other.x + other.width <= self.x + EPSILON_GENERAL
            || self.y + self.height <= other.y + EPSILON_GENERAL
            || other.y + other.height <= self.y + EPSILON_GENERAL)
    }

    fn contains(&self, other: &FreeRect) -> bool {
        other.x >= self.x - EPSILON_GENERAL
            && other.y >= self.y - EPSILON_GENERAL
            && other.x + other.width <= self.x + self.width + EPSILON_GENERAL
            && other.y + other.height <= self.y + self.height + EPSILON_GENERAL
    }
}

/// Maximal-rectangles packer.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaxRectsPacker {
    heuristic: ScoreHeuristic,
}

impl MaxRectsPacker {
    /// Creates a packer with the given scoring heuristic.
    pub fn new(heuristic: ScoreHeuristic) -> Self {
        Self { heuristic }
    }

    /// Scores a candidate free rectangle; lower is better.
    fn score(&self, free: &FreeRect, width: f64, height: f64) -> (f64, f64) {
        let leftover_w = free.width - width;
        let leftover_h = free.height - height;
        match self.heuristic {
            ScoreHeuristic::BestShortSideFit => {
                (leftover_w.min(leftover_h), leftover_w.max(leftover_h))
            }
            ScoreHeuristic::BestAreaFit => (
                free.width * free.height - width * height,
                leftover_w.min(leftover_h),
            ),
            ScoreHeuristic::BestLongSideFit => {
                (leftover_w.max(leftover_h), leftover_w.min(leftover_h))
            }
        }
    }

    /// Finds the best free rectangle of one bin for the given footprint.
    fn find_best(&self, free_list: &[FreeRect], width: f64, height: f64) -> Option<usize> {
        let mut best: Option<(usize, (f64, f64))> = None;
        for (idx, free) in free_list.iter().enumerate() {
            if !free.fits(width, height) {
                continue;
            }
            let score = self.score(free, width, height);
            let better = match &best {
                None => true,
                Some((_, current)) => score < *current,
            };
            if better {
                best = Some((idx, score));
            }
        }
        best.map(|(idx, _)| idx)
    }
}

/// Splits every free rectangle intersecting the placed one and prunes
/// entries contained in another.
fn commit_placement(free_list: &mut Vec<FreeRect>, placed: &FreeRect) {
    let mut next: Vec<FreeRect> = Vec::with_capacity(free_list.len() + 4);

    for free in free_list.iter() {
        if !free.intersects(placed) {
            next.push(*free);
            continue;
        }

        // Up to four maximal sub-rectangles survive around the placement.
        if placed.x > free.x {
            push_if_usable(
                &mut next,
                FreeRect {
                    x: free.x,
                    y: free.y,
                    width: placed.x - free.x,
                    height: free.height,
                },
            );
        }
        if placed.x + placed.width < free.x + free.width {
            push_if_usable(
                &mut next,
                FreeRect {
                    x: placed.x + placed.width,
                    y: free.y,
                    width: free.x + free.width - (placed.x + placed.width),
                    height: free.height,
                },
            );
        }
        if placed.y > free.y {
            push_if_usable(
                &mut next,
                FreeRect {
                    x: free.x,
                    y: free.y,
                    width: free.width,
                    height: placed.y - free.y,
                },
            );
        }
        if placed.y + placed.height < free.y + free.height {
            push_if_usable(
                &mut next,
                FreeRect {
                    x: free.x,
                    y: placed.y + placed.height,
                    width: free.width,
                    height: free.y + free.height - (placed.y + placed.height),
                },
            );
        }
    }

    prune_contained(&mut next);
    *free_list = next;
}

fn push_if_usable(list: &mut Vec<FreeRect>, rect: FreeRect) {
    if rect.width > EPSILON_GENERAL && rect.height > EPSILON_GENERAL {
        list.push(rect);
    }
}

fn prune_contained(list: &mut Vec<FreeRect>) {
    let mut idx = 0;
    while idx < list.len() {
        let mut removed = false;
        let mut other = 0;
        while other < list.len() {
            if other != idx && list[other].contains(&list[idx]) {
                list.swap_remove(idx);
                removed = true;
                break;
            }
            other += 1;
        }
        if !removed {
            idx += 1;
        }
    }
}

impl RectPacker for MaxRectsPacker {
    fn pack(
        &self,
        requests: &[RectRequest],
        bin_width: f64,
        bin_height: f64,
        max_bins: Option<usize>,
    ) -> Vec<PackedRect> {
        // Largest area first; stable on the original order for equal areas.
        let mut order: Vec<usize> = (0..requests.len()).collect();
        order.sort_by(|&a, &b| {
            let area_a = requests[a].width * requests[a].height;
            let area_b = requests[b].width * requests[b].height;
            area_b
                .partial_cmp(&area_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.cmp(&b))
        });

        let mut bins: Vec<Vec<FreeRect>> = Vec::new();
        let mut placements: Vec<PackedRect> = Vec::new();

        for req_idx in order {
            let request = requests[req_idx];

            // A request that exceeds an empty bin can never be placed.
            if request.width > bin_width + EPSILON_GENERAL
                || request.height > bin_height + EPSILON_GENERAL
            {
                continue;
            }

            let mut target: Option<(usize, usize)> = None;
            for (bin_idx, free_list) in bins.iter().enumerate() {
                if let Some(free_idx) = self.find_best(free_list, request.width, request.height) {
                    target = Some((bin_idx, free_idx));
                    break;
                }
            }

            if target.is_none() {
                let cap = max_bins.unwrap_or(usize::MAX);
                if bins.len() >= cap {
                    continue;
                }
                bins.push(vec![FreeRect {
                    x: 0.0,
                    y: 0.0,
                    width: bin_width,
                    height: bin_height,
                }]);
                let bin_idx = bins.len() - 1;
                let free_idx = self
                    .find_best(&bins[bin_idx], request.width, request.height)
                    .expect("request checked against empty bin dimensions");
                target = Some((bin_idx, free_idx));
            }

            let (bin_idx, free_idx) = target.expect("placement target resolved above");
            let free = bins[bin_idx][free_idx];
            let placed = FreeRect {
                x: free.x,
                y: free.y,
                width: request.width,
                height: request.height,
            };
            commit_placement(&mut bins[bin_idx], &placed);

            placements.push(PackedRect {
                item: request.item,
                bin: bin_idx,
                x: placed.x,
                y: placed.y,
                width: placed.width,
                height: placed.height,
            });
        }

        placements
    }
}
