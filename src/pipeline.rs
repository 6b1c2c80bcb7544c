//! Export Pipeline - Single Entry Point
//!
//! settle → rasterize → place at physical size → persist. Each step is a
//! sequential suspension point; a failed step aborts the export and nothing
//! is left on disk.

use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use lopdf::{dictionary, Document, Object, Stream};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::config::LabelConfig;
use crate::hashing::{layout_fingerprint, sha256_hex};
use crate::layout::LabelLayout;
use crate::print::{PageSpec, Placement, SUPERSAMPLE};
use crate::raster::{BitmapRasterizer, RasterError, Rasterizer};
use crate::templates::LabelSize;

/// Shown for every capture or save failure; the two are not told apart.
pub const EXPORT_FAILURE_NOTICE: &str = "Failed to generate label PDF.";

const IMAGE_NAME: &str = "Im0";
const JPEG_QUALITY: u8 = 100;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Label layout is not mounted")]
    RenderUnavailable,

    #[error("An export is already in progress")]
    InProgress,

    #[error("Rasterization failed: {0}")]
    Rasterize(#[from] RasterError),

    #[error("Document encoding failed: {0}")]
    Encode(String),

    #[error("Failed to save {0}: {1}")]
    Persist(PathBuf, #[source] io::Error),
}

impl ExportError {
    /// One-line message for the operator.
    pub fn user_notice(&self) -> &'static str {
        match self {
            ExportError::RenderUnavailable => "Label preview is not ready.",
            ExportError::InProgress => "An export is already running.",
            ExportError::Rasterize(_) | ExportError::Encode(_) | ExportError::Persist(..) => {
                EXPORT_FAILURE_NOTICE
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub output_dir: PathBuf,
    pub settle_delay: Duration,
    pub supersample: u32,
    pub page: PageSpec,
}

impl ExportSettings {
    pub fn from_config(config: &LabelConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            settle_delay: config.settle_delay(),
            supersample: config.supersample,
            page: PageSpec::A4,
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            settle_delay: Duration::from_millis(50),
            supersample: SUPERSAMPLE,
            page: PageSpec::A4,
        }
    }
}

/// A persisted export. The bytes live on disk only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedDocument {
    pub id: String,
    pub filename: String,
    pub path: PathBuf,
    pub size: LabelSize,
    pub page: PageSpec,
    pub placement: Placement,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub created_at: DateTime<Utc>,
    pub sha256: String,
    pub layout_hash: String,
}

/// The export pipeline - the only operation in the crate that suspends.
pub struct ExportPipeline<R = BitmapRasterizer> {
    settings: ExportSettings,
    rasterizer: R,
    busy: AtomicBool,
}

impl ExportPipeline<BitmapRasterizer> {
    pub fn new(settings: ExportSettings) -> Self {
        Self::with_rasterizer(settings, BitmapRasterizer)
    }
}

impl<R: Rasterizer> ExportPipeline<R> {
    pub fn with_rasterizer(settings: ExportSettings, rasterizer: R) -> Self {
        Self {
            settings,
            rasterizer,
            busy: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Export the mounted layout as `Label_<hu>.pdf`.
    ///
    /// `layout` is `None` when nothing has been mounted yet. The busy flag is
    /// released on every exit path.
    #[instrument(skip(self, layout), fields(size = tracing::field::Empty))]
    pub async fn export(
        &self,
        layout: Option<&LabelLayout>,
        hu_number: &str,
    ) -> Result<ExportedDocument, ExportError> {
        let _busy = BusyGuard::acquire(&self.busy).ok_or(ExportError::InProgress)?;
        let layout = layout.ok_or(ExportError::RenderUnavailable)?;
        tracing::Span::current().record("size", tracing::field::display(layout.size));

        match self.run(layout, hu_number).await {
            Ok(doc) => {
                info!(
                    "Exported {} ({}x{} px, sha256 {})",
                    doc.path.display(),
                    doc.pixel_width,
                    doc.pixel_height,
                    doc.sha256
                );
                Ok(doc)
            }
            Err(e) => {
                error!("Export failed: {}", e);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        layout: &LabelLayout,
        hu_number: &str,
    ) -> Result<ExportedDocument, ExportError> {
        // let pending layout updates commit
        tokio::time::sleep(self.settings.settle_delay).await;

        let bitmap = self.rasterizer.rasterize(layout, self.settings.supersample)?;
        debug!("Rasterized {}x{}", bitmap.width(), bitmap.height());

        let placement = Placement::for_size(layout.size);
        let bytes = build_pdf(&bitmap, &placement, &self.settings.page)?;
        let layout_hash =
            layout_fingerprint(layout).map_err(|e| ExportError::Encode(e.to_string()))?;

        let filename = export_filename(hu_number);
        let path = self.settings.output_dir.join(&filename);
        persist(&self.settings.output_dir, &path, &bytes)
            .map_err(|e| ExportError::Persist(path.clone(), e))?;

        Ok(ExportedDocument {
            id: Uuid::new_v4().to_string(),
            filename,
            path,
            size: layout.size,
            page: self.settings.page,
            placement,
            pixel_width: bitmap.width(),
            pixel_height: bitmap.height(),
            created_at: Utc::now(),
            sha256: sha256_hex(&bytes),
            layout_hash,
        })
    }
}

struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// `Label_<hu>.pdf`, or `Label_Preview.pdf` without an identifier.
pub fn export_filename(hu_number: &str) -> String {
    let stem = hu_number.trim();
    let stem = if stem.is_empty() {
        "Preview".to_string()
    } else {
        stem.replace(['/', '\\'], "_")
    };
    format!("Label_{stem}.pdf")
}

/// Single-page document holding `bitmap` stretched over `placement`.
pub fn build_pdf(
    bitmap: &RgbImage,
    placement: &Placement,
    page: &PageSpec,
) -> Result<Vec<u8>, ExportError> {
    let mut jpeg = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
        encoder
            .encode_image(bitmap)
            .map_err(|e| ExportError::Encode(e.to_string()))?;
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(bitmap.width()),
            "Height" => i64::from(bitmap.height()),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    ));

    let ops = placement.to_pdf_rect(page).draw_image_ops(IMAGE_NAME);
    let content_id = doc.add_object(Stream::new(dictionary! {}, ops.into_bytes()));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { IMAGE_NAME => image_id },
        },
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "MediaBox" => vec![0.into(), 0.into(), page.width_pt.into(), page.height_pt.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(bytes)
}

/// Writes through a temp file in the target directory and renames on
/// success, so a failed save leaves no partial file behind.
fn persist(dir: &Path, path: &Path, bytes: &[u8]) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
