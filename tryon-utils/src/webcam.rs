//! Webcam capture backed by `nokhwa`.

use anyhow::{Context, Result, anyhow};
use image::{DynamicImage, RgbImage};
use log::{debug, info, warn};
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    query,
    utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType, Resolution},
};

use crate::config::CameraSettings;

/// An open webcam stream.
pub struct WebcamCapture {
    camera: Camera,
    device_index: u32,
    resolution: (u32, u32),
    streaming: bool,
}

impl WebcamCapture {
    /// Open the camera described by `settings`.
    ///
    /// The requested resolution and frame rate are hints; drivers may pick something else, in
    /// which case the actual values are logged and reported by [`WebcamCapture::resolution`].
    pub fn open(settings: &CameraSettings) -> Result<Self> {
        let CameraSettings {
            device_index,
            width,
            height,
            fps,
        } = *settings;
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);

        debug!(
            "Opening webcam device {} at {}x{} @ {} fps",
            device_index, width, height, fps
        );

        let mut camera = Camera::new(CameraIndex::Index(device_index), requested)
            .with_context(|| format!("failed to open webcam device {device_index}"))?;

        camera
            .open_stream()
            .context("failed to open webcam stream")?;

        if let Err(e) = camera.set_resolution(Resolution::new(width, height)) {
            warn!("Could not set resolution {width}x{height}: {e}. Using camera default.");
        }
        if let Err(e) = camera.set_frame_rate(fps) {
            warn!("Could not set frame rate {fps} fps: {e}. Using camera default.");
        }

        let actual = camera.resolution();
        info!(
            "Webcam device {} streaming at {}x{} @ {} fps",
            device_index,
            actual.width(),
            actual.height(),
            camera.frame_rate()
        );

        Ok(Self {
            camera,
            device_index,
            resolution: (actual.width(), actual.height()),
            streaming: true,
        })
    }

    /// Grab and decode the next frame.
    pub fn capture_frame(&mut self) -> Result<DynamicImage> {
        anyhow::ensure!(
            self.streaming,
            "webcam device {} has been stopped",
            self.device_index
        );
        let frame = self
            .camera
            .frame()
            .context("failed to capture webcam frame")?;
        let decoded = frame
            .decode_image::<RgbFormat>()
            .context("failed to decode webcam frame")?;

        let (width, height) = (decoded.width(), decoded.height());
        if (width, height) != self.resolution {
            debug!(
                "Webcam resolution changed from {:?} to {}x{}",
                self.resolution, width, height
            );
            self.resolution = (width, height);
        }

        let rgb = RgbImage::from_raw(width, height, decoded.into_raw())
            .ok_or_else(|| anyhow!("webcam frame buffer does not match {width}x{height}"))?;
        Ok(DynamicImage::ImageRgb8(rgb))
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    pub fn device_index(&self) -> u32 {
        self.device_index
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Stop the stream and release the device. Calling this more than once is a no-op.
    pub fn stop(&mut self) -> Result<()> {
        if !self.streaming {
            return Ok(());
        }
        self.streaming = false;
        self.camera
            .stop_stream()
            .context("failed to stop webcam stream")?;
        info!("Webcam device {} stopped", self.device_index);
        Ok(())
    }
}

impl Drop for WebcamCapture {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("{e:#}");
        }
    }
}

/// List the cameras the platform backend can see as `(index, name)` pairs.
pub fn list_webcam_devices() -> Result<Vec<(u32, String)>> {
    let devices = query(ApiBackend::Auto).context("failed to query webcam devices")?;
    Ok(devices
        .iter()
        .enumerate()
        .map(|(idx, info)| (idx as u32, info.human_name().to_string()))
        .collect())
}
