use std::path::Path;

use anyhow::{Context, Result};
use image::{DynamicImage, RgbImage, imageops::FilterType};
use ndarray::Array3;

/// Load an image from disk into memory.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path_ref = path.as_ref();
    image::open(path_ref).with_context(|| format!("failed to open image {}", path_ref.display()))
}

/// Square region of a frame in pixel coordinates. May extend past the frame edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareRegion {
    pub center_x: f32,
    pub center_y: f32,
    pub side: f32,
}

impl SquareRegion {
    /// Largest square centred on the image.
    pub fn centered(width: u32, height: u32) -> Self {
        Self {
            center_x: width as f32 / 2.0,
            center_y: height as f32 / 2.0,
            side: width.min(height) as f32,
        }
    }

    pub fn left(&self) -> f32 {
        self.center_x - self.side / 2.0
    }

    pub fn top(&self) -> f32 {
        self.center_y - self.side / 2.0
    }
}

/// Cut `region` out of `image` and resample it to `size x size`.
///
/// Pixels that fall outside the source image are black.
pub fn crop_region_resized(image: &RgbImage, region: SquareRegion, size: u32) -> Result<RgbImage> {
    anyhow::ensure!(size > 0, "target size must be greater than zero");
    anyhow::ensure!(region.side >= 1.0, "crop region must be at least one pixel wide");

    let side = region.side.round() as u32;
    let left = region.left().round() as i64;
    let top = region.top().round() as i64;

    let mut cropped = RgbImage::new(side, side);
    image::imageops::replace(&mut cropped, image, -left, -top);
    if side == size {
        return Ok(cropped);
    }

    Ok(image::imageops::resize(
        &cropped,
        size,
        size,
        FilterType::Triangle,
    ))
}

/// Convert an RGB image into a CHW array with channel values scaled to `[0, 1]`.
pub fn rgb_to_chw_unit(image: &RgbImage) -> Array3<f32> {
    let (width, height) = image.dimensions();
    let mut array = Array3::<f32>::zeros((3, height as usize, width as usize));
    for (x, y, pixel) in image.enumerate_pixels() {
        for channel in 0..3 {
            array[(channel, y as usize, x as usize)] = pixel[channel] as f32 / 255.0;
        }
    }
    array
}

/// Convert an RGB image into an HWC array with channel values scaled to `[0, 1]`.
pub fn rgb_to_hwc_unit(image: &RgbImage) -> Array3<f32> {
    let mut chw = rgb_to_chw_unit(image);
    chw.swap_axes(0, 1);
    chw.swap_axes(1, 2);
    chw.as_standard_layout().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn centered_region_uses_short_side() {
        let region = SquareRegion::centered(640, 480);
        assert_eq!(region.side, 480.0);
        assert_eq!(region.left(), 80.0);
        assert_eq!(region.top(), 0.0);
    }

    #[test]
    fn crop_pads_outside_pixels_with_black() {
        let mut image = RgbImage::from_pixel(4, 4, Rgb([200, 100, 50]));
        image.put_pixel(0, 0, Rgb([255, 255, 255]));
        let region = SquareRegion {
            center_x: 0.0,
            center_y: 0.0,
            side: 4.0,
        };

        let cropped = crop_region_resized(&image, region, 4).expect("crop");
        assert_eq!(cropped.dimensions(), (4, 4));
        assert_eq!(cropped.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(cropped.get_pixel(2, 2), &Rgb([255, 255, 255]));
        assert_eq!(cropped.get_pixel(3, 3), &Rgb([200, 100, 50]));
    }

    #[test]
    fn crop_rejects_empty_target() {
        let image = RgbImage::new(2, 2);
        assert!(crop_region_resized(&image, SquareRegion::centered(2, 2), 0).is_err());
    }

    #[test]
    fn channel_layouts_agree() {
        let mut image = RgbImage::new(2, 1);
        image.put_pixel(1, 0, Rgb([255, 0, 51]));

        let chw = rgb_to_chw_unit(&image);
        let hwc = rgb_to_hwc_unit(&image);
        assert_eq!(chw.shape(), &[3, 1, 2]);
        assert_eq!(hwc.shape(), &[1, 2, 3]);
        assert_eq!(chw[(0, 0, 1)], 1.0);
        assert_eq!(hwc[(0, 1, 0)], 1.0);
        assert!((hwc[(0, 1, 2)] - 0.2).abs() < 1e-6);
    }
}
