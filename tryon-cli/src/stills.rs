//! Try-on over still images.

use std::{
    fs::{self, File},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;
use tryon_core::{
    Compositor, DetectorOptions, DrawOp, FaceMeshDetector, FaceMeshModel, JewelryAnchors,
    LandmarkDetector, OverlayAssets, OverlayLayout, Placement, ResourceLoader, plan,
};
use tryon_utils::{AppSettings, load_image, timing_guard};
use walkdir::WalkDir;

use crate::{annotate::mark_anchors, args::TryOnArgs, config::resolve_model};

const SUPPORTED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];
const OVERLAY_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize, PartialEq)]
pub struct AnchorRecord {
    pub left_ear: [f32; 2],
    pub right_ear: [f32; 2],
    pub chin: [f32; 2],
}

impl From<JewelryAnchors> for AnchorRecord {
    fn from(anchors: JewelryAnchors) -> Self {
        Self {
            left_ear: [anchors.left_ear.x, anchors.left_ear.y],
            right_ear: [anchors.right_ear.x, anchors.right_ear.y],
            chin: [anchors.chin.x, anchors.chin.y],
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PlacementRecord {
    pub kind: &'static str,
    /// `[x, y, width, height]` on the canvas.
    pub rect: [f32; 4],
}

impl PlacementRecord {
    fn from_op(op: &DrawOp) -> Option<Self> {
        let (kind, placement): (_, &Placement) = match op {
            DrawOp::Frame => return None,
            DrawOp::Earring(placement) => ("earring", placement),
            DrawOp::Necklace(placement) => ("necklace", placement),
        };
        Some(Self {
            kind,
            rect: [
                placement.x,
                placement.y,
                placement.width as f32,
                placement.height as f32,
            ],
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ImageRecord {
    pub image: String,
    pub output: String,
    pub faces: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchors: Option<AnchorRecord>,
    pub placements: Vec<PlacementRecord>,
}

/// Composite every image under `input` and report where the jewelry went.
pub fn run_stills_mode(
    args: &TryOnArgs,
    input: &Path,
    settings: &AppSettings,
    loader: &ResourceLoader<FaceMeshModel>,
) -> Result<()> {
    let images = collect_images(input)?;
    if images.is_empty() {
        anyhow::bail!(
            "no images found at {} (supported extensions: {})",
            input.display(),
            SUPPORTED_EXTENSIONS.join(", ")
        );
    }

    let model_path = resolve_model(&settings.resolved_model_path())?;
    info!("Loading face-mesh model from {}", model_path.display());
    let model = loader.ensure(&model_path.to_string_lossy())?;
    let options = DetectorOptions::from(&settings.detector);
    let mut detector = FaceMeshDetector::new(model, options);

    let assets = OverlayAssets::load(&settings.overlays);
    if !assets.wait_until_loaded(OVERLAY_LOAD_TIMEOUT) {
        warn!("Not every overlay image loaded; missing overlays are skipped");
    }

    let layout = OverlayLayout::from(&settings.layout);
    let mut compositor = Compositor::new(layout);
    fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("failed to create output directory {}", args.output_dir.display())
    })?;

    info!("Processing {} image(s)...", images.len());
    let mut records = Vec::with_capacity(images.len());
    for image_path in images {
        // Stills are unrelated to each other; start every image without a tracked face.
        detector.set_options(options);
        match compose_one(&image_path, args, &mut detector, &mut compositor, &assets) {
            Ok(record) => {
                info!(
                    "{} -> {} face(s), saved {}",
                    image_path.display(),
                    record.faces,
                    record.output
                );
                records.push(record);
            }
            Err(err) => warn!("Failed to process {}: {err:#}", image_path.display()),
        }
    }
    detector.close();

    if records.is_empty() {
        anyhow::bail!("every image failed; nothing was written");
    }
    write_records(args.json.as_deref(), &records)
}

fn compose_one(
    image_path: &Path,
    args: &TryOnArgs,
    detector: &mut FaceMeshDetector,
    compositor: &mut Compositor,
    assets: &OverlayAssets,
) -> Result<ImageRecord> {
    let _guard = timing_guard("tryon_cli::compose_image", log::Level::Debug);
    let image = load_image(image_path)?;
    let result = detector.send(image)?;
    let layout = *compositor.layout();
    let placements = plan(&layout, &result, assets)
        .iter()
        .filter_map(PlacementRecord::from_op)
        .collect();
    let anchors = result.primary_face().and_then(|face| face.anchors());

    let mut canvas = compositor.render(&result, assets).clone();
    if args.annotate
        && let Some(anchors) = anchors
    {
        mark_anchors(&mut canvas, &layout, anchors);
    }

    let output_path = output_path_for(image_path, &args.output_dir);
    canvas
        .save(&output_path)
        .with_context(|| format!("failed to save {}", output_path.display()))?;

    Ok(ImageRecord {
        image: image_path.display().to_string(),
        output: output_path.display().to_string(),
        faces: result.multi_face_landmarks.len(),
        anchors: anchors.map(AnchorRecord::from),
        placements,
    })
}

fn write_records(json_path: Option<&Path>, records: &[ImageRecord]) -> Result<()> {
    let Some(json_path) = json_path else {
        let json = serde_json::to_string_pretty(records).context("failed to serialize records")?;
        println!("{json}");
        return Ok(());
    };
    if let Some(dir) = json_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
    }
    let file = File::create(json_path)
        .with_context(|| format!("failed to create {}", json_path.display()))?;
    serde_json::to_writer_pretty(file, records)
        .with_context(|| format!("failed to write records to {}", json_path.display()))?;
    info!("Wrote anchor records to {}", json_path.display());
    Ok(())
}

/// `<output_dir>/<stem>_tryon.png`
pub fn output_path_for(image_path: &Path, output_dir: &Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    output_dir.join(format!("{stem}_tryon.png"))
}

/// Image files at `input`, sorted, or `input` itself when it is a file.
pub fn collect_images(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    anyhow::ensure!(
        input.is_dir(),
        "input path is neither file nor directory: {}",
        input.display()
    );

    let mut images: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_supported_image(path))
        .collect();
    images.sort();
    Ok(images)
}

fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}
