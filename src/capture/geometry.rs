//! Page geometry for the printed document.
//!
//! The paper is a fixed two A4 widths wide and exactly as tall as the
//! page's content. Height is not capped: a page of any length becomes a
//! single sheet of that length.

use crate::protocol::PrintOptions;

// ============================================================================
// Constants
// ============================================================================

/// Width of an A4 sheet, in inches.
pub const A4_WIDTH_IN: f64 = 8.27;

/// Default paper width: two A4 sheets side by side.
pub const DEFAULT_PAPER_WIDTH_IN: f64 = 2.0 * A4_WIDTH_IN;

/// CSS pixels per inch.
pub const DEFAULT_DPI: f64 = 96.0;

// ============================================================================
// Functions
// ============================================================================

/// Converts a pixel length to inches at `dpi`.
#[inline]
#[must_use]
pub fn pixels_to_inches(pixels: u64, dpi: f64) -> f64 {
    pixels as f64 / dpi
}

// ============================================================================
// PageGeometry
// ============================================================================

/// Paper size derived from a measured page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Paper width in inches.
    pub width_in: f64,
    /// Paper height in inches.
    pub height_in: f64,
}

impl PageGeometry {
    /// Computes the paper for a page `height_px` tall.
    ///
    /// The width is always [`DEFAULT_PAPER_WIDTH_IN`], whatever the page.
    #[must_use]
    pub fn for_page(height_px: u64, dpi: f64) -> Self {
        Self {
            width_in: DEFAULT_PAPER_WIDTH_IN,
            height_in: pixels_to_inches(height_px, dpi),
        }
    }

    /// Builds the print options: background on, portrait, no margins.
    #[must_use]
    pub fn print_options(&self) -> PrintOptions {
        PrintOptions {
            print_background: true,
            paper_width: self.width_in,
            paper_height: self.height_in,
            landscape: false,
            margin_top: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            margin_right: 0.0,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
