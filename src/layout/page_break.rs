//! # Page Break Decisions
//!
//! Whether a measured block goes on the current page, moves to the next
//! one, or gets split line by line. Blocks are kept whole whenever a fresh
//! page could hold them; only content taller than a full page is split.

/// Decide what to do with a block that may not fit on the current page.
#[derive(Debug, Clone, PartialEq)]
pub enum BreakDecision {
    /// Place the entire block on the current page (it fits).
    Place,
    /// Move the entire block to the next page.
    MoveToNextPage,
    /// Split the block: place some lines here, continue on the next page.
    Split {
        /// How many lines fit on the current page.
        items_on_current_page: usize,
    },
}

/// Given the remaining space on a page and the heights of a block's lines,
/// decide how to break.
///
/// `page_capacity` is the room a fresh page offers. A block that would fit
/// there moves as a unit instead of being split.
pub fn decide_break(
    remaining_height: f64,
    page_capacity: f64,
    child_heights: &[f64],
) -> BreakDecision {
    let total: f64 = child_heights.iter().sum();

    if total <= remaining_height + f64::EPSILON {
        return BreakDecision::Place;
    }

    if total <= page_capacity {
        return BreakDecision::MoveToNextPage;
    }

    let mut running = 0.0;
    let mut fit_count = 0;
    for &h in child_heights {
        if running + h > remaining_height {
            break;
        }
        running += h;
        fit_count += 1;
    }

    if fit_count == 0 {
        return BreakDecision::MoveToNextPage;
    }

    BreakDecision::Split {
        items_on_current_page: fit_count,
    }
}
