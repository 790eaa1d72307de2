use std::{fmt::Write, path::Path};

use anyhow::{Context, Result};
use image::RgbImage;
use log::{debug, warn};
use tract_onnx::prelude::{
    Framework, Graph, InferenceModelExt, IntoTensor, SimplePlan, Tensor, TypedFact, TypedModel,
    TypedOp, tvec,
};
use tryon_utils::{rgb_to_chw_unit, rgb_to_hwc_unit};

use crate::landmarks::{FACE_MESH_POINTS, Landmark};

type RunnableModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Element order the model expects for its image input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorLayout {
    /// `[1, 3, H, W]`
    Nchw,
    /// `[1, H, W, 3]`
    Nhwc,
}

/// Raw landmark model output for one square crop.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshOutput {
    /// Landmarks normalized to the crop (`0..1` on both axes).
    pub landmarks: Vec<Landmark>,
    /// Face-presence probability.
    pub presence: f32,
}

/// Face-mesh landmark model executed with `tract-onnx`.
///
/// The graph takes one square RGB crop scaled to `[0, 1]` and returns a flat `(x, y, z)` landmark
/// vector in crop pixels plus a face-presence logit.
#[derive(Debug)]
pub struct FaceMeshModel {
    runnable: RunnableModel,
    input_side: u32,
    layout: TensorLayout,
}

impl FaceMeshModel {
    /// Load and optimize the face-mesh ONNX graph.
    ///
    /// Falls back to the decluttered graph when tract cannot optimize it.
    pub fn load<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let path = model_path.as_ref();
        anyhow::ensure!(path.exists(), "model file not found: {}", path.display());

        let (runnable, input_side, layout) = match load_runnable_model(path, true) {
            Ok(loaded) => {
                debug!("Face-mesh model {} optimized successfully", path.display());
                loaded
            }
            Err(opt_err) => {
                let optimize_msg = format!("{opt_err}");
                let mut chain_msg = String::new();
                for cause in opt_err.chain() {
                    let _ = writeln!(&mut chain_msg, "  - {cause}");
                }
                warn!(
                    "Face-mesh model {} failed optimized load ({}); falling back to decluttered graph.\nError chain:\n{}",
                    path.display(),
                    optimize_msg,
                    chain_msg.trim_end()
                );
                load_runnable_model(path, false).with_context(|| {
                    format!(
                        "fallback to decluttered face-mesh graph failed after optimize error: {optimize_msg}"
                    )
                })?
            }
        };

        debug!(
            "Face-mesh model input {}x{} ({:?})",
            input_side, input_side, layout
        );
        Ok(Self {
            runnable,
            input_side,
            layout,
        })
    }

    /// Side length of the square crop the model consumes.
    pub fn input_side(&self) -> u32 {
        self.input_side
    }

    pub fn layout(&self) -> TensorLayout {
        self.layout
    }

    /// Run the model on a crop that is already `input_side x input_side`.
    pub fn run(&self, crop: &RgbImage) -> Result<MeshOutput> {
        anyhow::ensure!(
            crop.dimensions() == (self.input_side, self.input_side),
            "crop is {}x{}, model expects {}x{}",
            crop.width(),
            crop.height(),
            self.input_side,
            self.input_side
        );

        let side = self.input_side as usize;
        let (array, shape) = match self.layout {
            TensorLayout::Nchw => (rgb_to_chw_unit(crop), [1usize, 3, side, side]),
            TensorLayout::Nhwc => (rgb_to_hwc_unit(crop), [1usize, side, side, 3]),
        };
        let (data, offset) = array.into_raw_vec_and_offset();
        debug_assert_eq!(offset, Some(0), "expected contiguous array");
        let input = Tensor::from_shape(&shape, &data)
            .map_err(|e| anyhow::anyhow!("failed to build input tensor: {e}"))?;

        let outputs = self
            .runnable
            .run(tvec![input.into()])
            .map_err(|e| anyhow::anyhow!("face-mesh execution failed: {e}"))?;
        let tensors: Vec<Tensor> = outputs.into_iter().map(|v| v.into_tensor()).collect();

        decode_outputs(&tensors, self.input_side)
    }
}

fn load_runnable_model(path: &Path, optimized: bool) -> Result<(RunnableModel, u32, TensorLayout)> {
    let model = tract_onnx::onnx()
        .model_for_path(path)
        .with_context(|| format!("failed to parse ONNX graph from {}", path.display()))?;

    let typed = if optimized {
        model
            .into_optimized()
            .map_err(|e| anyhow::anyhow!("unable to optimize face-mesh graph: {e}"))?
    } else {
        model
            .into_typed()
            .map_err(|e| anyhow::anyhow!("unable to type-check face-mesh graph: {e}"))?
            .into_decluttered()
            .map_err(|e| anyhow::anyhow!("unable to declutter face-mesh graph: {e}"))?
    };
    let (side, layout) = input_geometry(&typed)?;
    let runnable = typed
        .into_runnable()
        .map_err(|e| anyhow::anyhow!("unable to make face-mesh graph runnable: {e}"))?;
    Ok((runnable, side, layout))
}

fn input_geometry(model: &TypedModel) -> Result<(u32, TensorLayout)> {
    let fact = model
        .input_fact(0)
        .map_err(|e| anyhow::anyhow!("face-mesh graph has no input: {e}"))?;
    let dims = fact
        .shape
        .as_concrete()
        .context("face-mesh input shape must be concrete")?;
    layout_from_shape(dims)
}

fn layout_from_shape(dims: &[usize]) -> Result<(u32, TensorLayout)> {
    match *dims {
        [1, 3, h, w] if h == w => Ok((h as u32, TensorLayout::Nchw)),
        [1, h, w, 3] if h == w => Ok((h as u32, TensorLayout::Nhwc)),
        _ => anyhow::bail!("unsupported face-mesh input shape {dims:?}"),
    }
}

/// Pick the landmark vector (the largest output) and the presence logit (a single value) out of
/// the model outputs.
fn decode_outputs(tensors: &[Tensor], input_side: u32) -> Result<MeshOutput> {
    let mut coords: Option<&[f32]> = None;
    let mut logit: Option<f32> = None;

    for tensor in tensors {
        let values = tensor
            .as_slice::<f32>()
            .map_err(|e| anyhow::anyhow!("face-mesh output is not f32: {e}"))?;
        match values.len() {
            1 => logit = logit.or(Some(values[0])),
            n if n >= FACE_MESH_POINTS * 3 && n % 3 == 0 => {
                if coords.is_none_or(|current| current.len() < n) {
                    coords = Some(values);
                }
            }
            _ => {}
        }
    }

    let coords = coords.context("face-mesh model produced no landmark output")?;
    let logit = logit.context("face-mesh model produced no face-presence output")?;
    Ok(MeshOutput {
        landmarks: normalize_landmarks(coords, input_side),
        presence: sigmoid(logit),
    })
}

fn normalize_landmarks(coords: &[f32], input_side: u32) -> Vec<Landmark> {
    let side = input_side as f32;
    coords
        .chunks_exact(3)
        .map(|c| Landmark::new(c[0] / side, c[1] / side, c[2] / side))
        .collect()
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
