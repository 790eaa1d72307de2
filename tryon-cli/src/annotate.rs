//! Anchor markers drawn over composited output.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_cross_mut, draw_hollow_circle_mut};
use tryon_core::{JewelryAnchors, Landmark, OverlayLayout};

const EAR_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);
const CHIN_COLOR: Rgba<u8> = Rgba([255, 0, 255, 255]);

/// Mark the ear and chin anchors on a canvas laid out with `layout`.
pub fn mark_anchors(canvas: &mut RgbaImage, layout: &OverlayLayout, anchors: JewelryAnchors) {
    let anchors = if layout.mirror {
        anchors.mirrored()
    } else {
        anchors
    };
    for (landmark, color) in [
        (anchors.left_ear, EAR_COLOR),
        (anchors.right_ear, EAR_COLOR),
        (anchors.chin, CHIN_COLOR),
    ] {
        let (x, y) = to_pixel(landmark, layout);
        draw_hollow_circle_mut(canvas, (x, y), 4, color);
        draw_cross_mut(canvas, color, x, y);
    }
}

fn to_pixel(landmark: Landmark, layout: &OverlayLayout) -> (i32, i32) {
    let (x, y) = landmark.to_pixels(layout.canvas_width, layout.canvas_height);
    (x.round() as i32, y.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_follow_mirroring() {
        let layout = OverlayLayout {
            canvas_width: 100,
            canvas_height: 100,
            ..OverlayLayout::default()
        };
        let anchors = JewelryAnchors {
            left_ear: Landmark::new(0.2, 0.5, 0.0),
            right_ear: Landmark::new(0.8, 0.5, 0.0),
            chin: Landmark::new(0.3, 0.9, 0.0),
        };
        let mut canvas = RgbaImage::new(100, 100);
        mark_anchors(&mut canvas, &layout, anchors);

        assert_eq!(canvas.get_pixel(70, 90), &CHIN_COLOR);
        assert_eq!(canvas.get_pixel(30, 90), &Rgba([0, 0, 0, 0]));
    }
}
