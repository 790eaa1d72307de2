//! Draws the camera frame and the jewelry overlays onto the try-on canvas.

use image::{
    DynamicImage, GenericImageView, Rgba, RgbaImage,
    imageops::{self, FilterType},
};
use tryon_utils::{LayoutSettings, timing_guard};

use crate::{
    detector::DetectionResult,
    landmarks::{JewelryAnchors, Landmark},
    overlay::{OverlayAssets, OverlayImage},
};

/// Canvas size and overlay geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayLayout {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub mirror: bool,
    pub earring_size: (u32, u32),
    pub ear_offset_y: f32,
    pub necklace_size: (u32, u32),
}

impl Default for OverlayLayout {
    fn default() -> Self {
        Self::from(&LayoutSettings::default())
    }
}

impl From<&LayoutSettings> for OverlayLayout {
    fn from(settings: &LayoutSettings) -> Self {
        Self {
            canvas_width: settings.canvas_width.max(1),
            canvas_height: settings.canvas_height.max(1),
            mirror: settings.mirror,
            earring_size: (settings.earring_width, settings.earring_height),
            ear_offset_y: settings.ear_offset_y,
            necklace_size: (settings.necklace_width, settings.necklace_height),
        }
    }
}

impl OverlayLayout {
    fn to_canvas(&self, landmark: Landmark) -> (f32, f32) {
        landmark.to_pixels(self.canvas_width, self.canvas_height)
    }

    /// Box for an earring hanging from `ear`: centred on the landmark, pushed down by the ear
    /// offset.
    pub fn earring_placement(&self, ear: Landmark) -> Placement {
        let (x, y) = self.to_canvas(ear);
        let (width, height) = self.earring_size;
        Placement {
            x: x - width as f32 / 2.0,
            y: y - height as f32 / 2.0 + self.ear_offset_y,
            width,
            height,
        }
    }

    /// Box for a necklace hanging from `chin`: horizontally centred, top edge on the landmark.
    pub fn necklace_placement(&self, chin: Landmark) -> Placement {
        let (x, y) = self.to_canvas(chin);
        let (width, height) = self.necklace_size;
        Placement {
            x: x - width as f32 / 2.0,
            y,
            width,
            height,
        }
    }
}

/// Destination rectangle on the canvas, top-left corner in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    pub fn center(&self) -> (f32, f32) {
        (
            self.x + self.width as f32 / 2.0,
            self.y + self.height as f32 / 2.0,
        )
    }
}

/// One step of composing a canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawOp {
    /// Stretch the frame over the whole canvas.
    Frame,
    Earring(Placement),
    Necklace(Placement),
}

/// Decide what to draw for one detection result.
///
/// Only the first face is used. Overlays that have not finished loading are left out.
pub fn plan(layout: &OverlayLayout, result: &DetectionResult, assets: &OverlayAssets) -> Vec<DrawOp> {
    let mut ops = Vec::with_capacity(4);
    if result.image.is_some() {
        ops.push(DrawOp::Frame);
    }

    let Some(anchors) = result.primary_face().and_then(|face| face.anchors()) else {
        return ops;
    };
    let JewelryAnchors {
        left_ear,
        right_ear,
        chin,
    } = if layout.mirror {
        anchors.mirrored()
    } else {
        anchors
    };

    if assets.earring.is_complete() {
        ops.push(DrawOp::Earring(layout.earring_placement(left_ear)));
        ops.push(DrawOp::Earring(layout.earring_placement(right_ear)));
    }
    if assets.necklace.is_complete() {
        ops.push(DrawOp::Necklace(layout.necklace_placement(chin)));
    }
    ops
}

/// Owns the canvas and redraws it for every detection result.
#[derive(Debug, Clone)]
pub struct Compositor {
    layout: OverlayLayout,
    canvas: RgbaImage,
}

impl Compositor {
    pub fn new(layout: OverlayLayout) -> Self {
        Self {
            canvas: RgbaImage::new(layout.canvas_width, layout.canvas_height),
            layout,
        }
    }

    pub fn layout(&self) -> &OverlayLayout {
        &self.layout
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Clear the canvas and draw the frame and whatever overlays are ready.
    pub fn render(&mut self, result: &DetectionResult, assets: &OverlayAssets) -> &RgbaImage {
        let _guard = timing_guard("tryon_core::composite", log::Level::Trace);
        let ops = plan(&self.layout, result, assets);

        for pixel in self.canvas.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
        for op in ops {
            match op {
                DrawOp::Frame => {
                    if let Some(frame) = &result.image {
                        self.draw_frame(frame);
                    }
                }
                DrawOp::Earring(placement) => draw_overlay(&mut self.canvas, &assets.earring, placement),
                DrawOp::Necklace(placement) => {
                    draw_overlay(&mut self.canvas, &assets.necklace, placement)
                }
            }
        }
        &self.canvas
    }

    fn draw_frame(&mut self, frame: &DynamicImage) {
        let (width, height) = (self.layout.canvas_width, self.layout.canvas_height);
        let mut scaled = if frame.dimensions() == (width, height) {
            frame.to_rgba8()
        } else {
            frame.resize_exact(width, height, FilterType::Triangle).to_rgba8()
        };
        if self.layout.mirror {
            imageops::flip_horizontal_in_place(&mut scaled);
        }
        imageops::replace(&mut self.canvas, &scaled, 0, 0);
    }
}

fn draw_overlay(canvas: &mut RgbaImage, overlay: &OverlayImage, placement: Placement) {
    let Some(image) = overlay.image() else {
        return;
    };
    if placement.width == 0 || placement.height == 0 {
        return;
    }
    let sized = if image.dimensions() == (placement.width, placement.height) {
        (*image).clone()
    } else {
        imageops::resize(&*image, placement.width, placement.height, FilterType::Triangle)
    };
    imageops::overlay(
        canvas,
        &sized,
        placement.x.round() as i64,
        placement.y.round() as i64,
    );
}
