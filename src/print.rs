//! Physical Geometry
//!
//! Layout pixels, page points and inches. The placed footprint always comes
//! from the preset, never from the bitmap's pixel size.

use serde::{Deserialize, Serialize};

use crate::templates::{LabelPreset, LabelSize};

/// Layout pixels per inch.
pub const LAYOUT_PPI: u32 = 96;
/// Rasterization scale relative to layout pixels.
pub const SUPERSAMPLE: u32 = 4;
pub const POINTS_PER_INCH: f64 = 72.0;
/// Top-left margin of the placed label on the page.
pub const PLACEMENT_OFFSET_IN: f64 = 0.5;

/// Page of the exported document, in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSpec {
    pub width_pt: i64,
    pub height_pt: i64,
}

impl PageSpec {
    /// A4 portrait.
    pub const A4: PageSpec = PageSpec {
        width_pt: 595,
        height_pt: 842,
    };
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::A4
    }
}

/// Where the label image sits on the page, in inches from the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub x_in: f64,
    pub y_in: f64,
    pub width_in: f64,
    pub height_in: f64,
}

/// Placement in PDF user space (origin bottom-left, points).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    pub fn for_size(size: LabelSize) -> Self {
        let preset = LabelPreset::for_size(size);
        Self {
            x_in: PLACEMENT_OFFSET_IN,
            y_in: PLACEMENT_OFFSET_IN,
            width_in: preset.width_in,
            height_in: preset.height_in,
        }
    }

    pub fn to_pdf_rect(&self, page: &PageSpec) -> PdfRect {
        let width = self.width_in * POINTS_PER_INCH;
        let height = self.height_in * POINTS_PER_INCH;
        PdfRect {
            x: self.x_in * POINTS_PER_INCH,
            y: page.height_pt as f64 - self.y_in * POINTS_PER_INCH - height,
            width,
            height,
        }
    }
}

impl PdfRect {
    /// Content-stream operators drawing XObject `name` stretched over this rect.
    pub fn draw_image_ops(&self, name: &str) -> String {
        format!(
            "q\n{:.2} 0 0 {:.2} {:.2} {:.2} cm\n/{} Do\nQ\n",
            self.width, self.height, self.x, self.y, name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outer_placement_in_points() {
        let rect = Placement::for_size(LabelSize::Outer).to_pdf_rect(&PageSpec::A4);
        assert!((rect.width - 432.0).abs() < 1e-9);
        assert!((rect.height - 232.56).abs() < 1e-9);
        assert!((rect.x - 36.0).abs() < 1e-9);
        assert!((rect.y - 573.44).abs() < 1e-9);
        assert_eq!(
            rect.draw_image_ops("Im0"),
            "q\n432.00 0 0 232.56 36.00 573.44 cm\n/Im0 Do\nQ\n"
        );
    }

    #[test]
    fn test_inner_placement() {
        let placement = Placement::for_size(LabelSize::Inner);
        assert_eq!(placement.x_in, 0.5);
        assert_eq!(placement.y_in, 0.5);
        assert_eq!(placement.width_in, 3.1);
        assert_eq!(placement.height_in, 1.6);
    }
}
