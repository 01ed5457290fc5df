use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage, ImageFormat, Luma};
use qrcode_generator::QrCodeEcc;

use crate::error::{QrError, Result};
use crate::json::to_ascii_json;
use crate::payload::Payload;

pub const DEFAULT_MODULE_SIZE: u32 = 10;
pub const DEFAULT_BORDER: u32 = 4;
/// Module count of a version 40 symbol.
pub const MAX_SYMBOL_MODULES: u32 = 177;
/// Largest accepted image edge in pixels.
pub const MAX_SIDE_PX: u32 = 16_384;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Raster parameters. Error correction is always the lowest level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrSettings {
    /// Pixels per module edge.
    pub module_size: u32,
    /// Quiet zone width in modules.
    pub border: u32,
}

impl Default for QrSettings {
    fn default() -> Self {
        Self {
            module_size: DEFAULT_MODULE_SIZE,
            border: DEFAULT_BORDER,
        }
    }
}

impl QrSettings {
    pub fn new(module_size: u32, border: u32) -> Result<Self> {
        if module_size == 0 {
            return Err(QrError::InvalidOption {
                name: "module size",
                value: module_size.to_string(),
            });
        }
        let settings = Self {
            module_size,
            border,
        };
        if settings.side_px(MAX_SYMBOL_MODULES).is_none() {
            return Err(QrError::InvalidOption {
                name: "qr size",
                value: format!(
                    "module size {module_size} with border {border} exceeds {MAX_SIDE_PX} px"
                ),
            });
        }
        Ok(settings)
    }

    /// Image edge for a symbol of `modules` modules, or `None` when it
    /// overflows or is larger than [`MAX_SIDE_PX`].
    pub fn side_px(&self, modules: u32) -> Option<u32> {
        self.border
            .checked_mul(2)
            .and_then(|quiet| quiet.checked_add(modules))
            .and_then(|total| total.checked_mul(self.module_size))
            .filter(|side| *side > 0 && *side <= MAX_SIDE_PX)
    }
}

/// A PNG written by [`QrWriter::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenCode {
    pub path: PathBuf,
    /// The exact string encoded in the symbol.
    pub json: String,
}

/// Module matrix of the smallest symbol holding `data`, row-major, `true`
/// for dark modules.
pub fn encode_matrix(data: &str) -> Result<Vec<Vec<bool>>> {
    qrcode_generator::to_matrix(data.as_bytes(), QrCodeEcc::Low)
        .map_err(|err| QrError::Encode(format!("{err:?}")))
}

pub fn render(matrix: &[Vec<bool>], settings: QrSettings) -> Result<GrayImage> {
    let side = u32::try_from(matrix.len())
        .ok()
        .and_then(|modules| settings.side_px(modules))
        .ok_or_else(|| QrError::InvalidOption {
            name: "qr size",
            value: format!(
                "{} modules at module size {} with border {}",
                matrix.len(),
                settings.module_size,
                settings.border
            ),
        })?;
    let mut img = GrayImage::from_pixel(side, side, LIGHT);
    for (row_idx, row) in matrix.iter().enumerate() {
        for (col_idx, dark) in row.iter().enumerate() {
            if !*dark {
                continue;
            }
            let x0 = (settings.border + col_idx as u32) * settings.module_size;
            let y0 = (settings.border + row_idx as u32) * settings.module_size;
            for y in y0..y0 + settings.module_size {
                for x in x0..x0 + settings.module_size {
                    img.put_pixel(x, y, DARK);
                }
            }
        }
    }
    Ok(img)
}

pub struct QrWriter {
    output_dir: PathBuf,
    settings: QrSettings,
}

impl QrWriter {
    pub fn new(output_dir: impl Into<PathBuf>, settings: QrSettings) -> Self {
        Self {
            output_dir: output_dir.into(),
            settings,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Creates the output directory and any missing parents.
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    pub fn path_for(&self, base_name: &str) -> PathBuf {
        self.output_dir.join(format!("{base_name}.png"))
    }

    /// Encodes `payload` and writes `<output_dir>/<base_name>.png`,
    /// replacing any file already there.
    pub fn write(&self, payload: &Payload, base_name: &str) -> Result<WrittenCode> {
        let json = to_ascii_json(payload)?;
        let matrix = encode_matrix(&json)?;
        let img = render(&matrix, self.settings)?;
        let path = self.path_for(base_name);
        img.save_with_format(&path, ImageFormat::Png)?;
        tracing::debug!(path = %path.display(), modules = matrix.len(), "wrote qr code");
        Ok(WrittenCode { path, json })
    }
}
