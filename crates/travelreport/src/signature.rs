//! Signature capture.
//!
//! A [`SignaturePad`] holds the raster of one signature surface. The drawing
//! itself happens elsewhere; a pad is filled from a PNG file or a PNG data
//! URL and only the rendered bitmap is kept. [`SignaturePad::to_image`]
//! snapshots the pad as an embeddable PNG, trimmed to the drawn area.

use std::io::Cursor;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use printpdf::image_crate::{self, DynamicImage, ImageFormat, ImageOutputFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Prefix of every signature data URL.
const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Channel value above which a pixel counts as paper rather than ink.
const PAPER_THRESHOLD: u8 = 240;

/// Alpha below which a pixel counts as transparent.
const ALPHA_THRESHOLD: u8 = 16;

/// Which party a signature belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureRole {
    /// The traveler filing the complaint.
    Traveler,
    /// The travel agent taking the report.
    Agent,
}

impl SignatureRole {
    /// Lowercase name used in messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Traveler => "traveler",
            Self::Agent => "agent",
        }
    }

    /// Caption printed under the signature.
    #[must_use]
    pub fn caption(self) -> &'static str {
        match self {
            Self::Traveler => "Traveler Signature",
            Self::Agent => "Agent Signature",
        }
    }
}

impl std::fmt::Display for SignatureRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A PNG signature snapshot, stored as a `data:image/png;base64,` URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureImage(String);

impl SignatureImage {
    /// Wrap encoded PNG bytes.
    #[must_use]
    pub fn from_png_bytes(png: &[u8]) -> Self {
        Self(format!("{PNG_DATA_URL_PREFIX}{}", BASE64.encode(png)))
    }

    /// The data URL.
    #[must_use]
    pub fn data_url(&self) -> &str {
        &self.0
    }

    /// Decode the URL back into PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not a base64 PNG data URL.
    pub fn png_bytes(&self) -> Result<Vec<u8>> {
        decode_data_url(&self.0).map_err(|message| Error::signature("stored", message))
    }

    /// Decode the URL into an image.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not a readable PNG.
    pub fn decode(&self) -> Result<DynamicImage> {
        let bytes = self.png_bytes()?;
        image_crate::load_from_memory_with_format(&bytes, ImageFormat::Png)
            .map_err(|e| Error::signature("stored", e.to_string()))
    }
}

fn decode_data_url(url: &str) -> std::result::Result<Vec<u8>, String> {
    let payload = url
        .strip_prefix(PNG_DATA_URL_PREFIX)
        .ok_or_else(|| "expected a data:image/png;base64 URL".to_string())?;
    BASE64
        .decode(payload.trim())
        .map_err(|e| format!("bad base64 payload: {e}"))
}

/// One signature surface.
#[derive(Debug, Clone)]
pub struct SignaturePad {
    role: SignatureRole,
    raster: Option<RgbaImage>,
}

impl SignaturePad {
    /// Create a blank pad.
    #[must_use]
    pub fn new(role: SignatureRole) -> Self {
        Self { role, raster: None }
    }

    /// The party this pad belongs to.
    #[must_use]
    pub fn role(&self) -> SignatureRole {
        self.role
    }

    /// Replace the pad contents with an encoded PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a PNG.
    pub fn load_png(&mut self, png: &[u8]) -> Result<()> {
        let image = image_crate::load_from_memory_with_format(png, ImageFormat::Png)
            .map_err(|e| Error::signature(self.role.name(), e.to_string()))?;
        let raster = image.to_rgba8();
        debug!(
            "Loaded {} signature ({}x{})",
            self.role,
            raster.width(),
            raster.height()
        );
        self.raster = Some(raster);
        Ok(())
    }

    /// Replace the pad contents with a PNG file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a PNG.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            Error::signature(self.role.name(), format!("{}: {e}", path.display()))
        })?;
        self.load_png(&bytes)
    }

    /// Replace the pad contents with a PNG data URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or the payload is not a PNG.
    pub fn load_data_url(&mut self, url: &str) -> Result<()> {
        let bytes = decode_data_url(url).map_err(|m| Error::signature(self.role.name(), m))?;
        self.load_png(&bytes)
    }

    /// Load from either a data URL or a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or decoded.
    pub fn load_source(&mut self, source: &str) -> Result<()> {
        if source.starts_with("data:") {
            self.load_data_url(source)
        } else {
            self.load_file(source)
        }
    }

    /// Erase the pad.
    pub fn clear(&mut self) {
        self.raster = None;
    }

    /// Check whether the pad carries any ink.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.raster
            .as_ref()
            .map_or(true, |raster| ink_bounds(raster).is_none())
    }

    /// Snapshot the pad as a PNG trimmed to the drawn area.
    ///
    /// Returns `None` for a blank pad.
    ///
    /// # Errors
    ///
    /// Returns an error if PNG encoding fails.
    pub fn to_image(&self) -> Result<Option<SignatureImage>> {
        let Some(raster) = &self.raster else {
            return Ok(None);
        };
        let Some((x, y, width, height)) = ink_bounds(raster) else {
            return Ok(None);
        };

        let trimmed = image_crate::imageops::crop_imm(raster, x, y, width, height).to_image();
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(trimmed)
            .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
            .map_err(|e| Error::signature(self.role.name(), e.to_string()))?;
        Ok(Some(SignatureImage::from_png_bytes(&png)))
    }
}

/// Bounding box `(x, y, width, height)` of the inked pixels.
fn ink_bounds(raster: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in raster.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let is_paper = r > PAPER_THRESHOLD && g > PAPER_THRESHOLD && b > PAPER_THRESHOLD;
        if a < ALPHA_THRESHOLD || is_paper {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds.map(|(x0, y0, x1, y1)| (x0, y0, x1 - x0 + 1, y1 - y0 + 1))
}

/// The traveler and agent pads, cleared together.
#[derive(Debug, Clone)]
pub struct SignaturePads {
    /// Traveler pad.
    pub traveler: SignaturePad,
    /// Agent pad.
    pub agent: SignaturePad,
}

impl Default for SignaturePads {
    fn default() -> Self {
        Self {
            traveler: SignaturePad::new(SignatureRole::Traveler),
            agent: SignaturePad::new(SignatureRole::Agent),
        }
    }
}

impl SignaturePads {
    /// Erase both pads.
    pub fn clear(&mut self) {
        self.traveler.clear();
        self.agent.clear();
    }

    /// Snapshot both pads as `(traveler, agent)`.
    ///
    /// # Errors
    ///
    /// Returns an error if either snapshot cannot be encoded.
    pub fn snapshot(&self) -> Result<(Option<SignatureImage>, Option<SignatureImage>)> {
        Ok((self.traveler.to_image()?, self.agent.to_image()?))
    }
}

/// Encode an RGBA raster as PNG bytes. Used by tests across the crate.
#[cfg(test)]
pub(crate) fn encode_png(raster: RgbaImage) -> Vec<u8> {
    let mut png = Vec::new();
    DynamicImage::ImageRgba8(raster)
        .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
        .expect("encode png");
    png
}

/// A white 250x100 canvas with a dark stroke from (40, 30) to (120, 60).
#[cfg(test)]
pub(crate) fn sample_signature_png() -> Vec<u8> {
    use image_crate::Rgba;

    let mut raster = RgbaImage::from_pixel(250, 100, Rgba([255, 255, 255, 255]));
    for x in 40..=120 {
        for y in 30..=60 {
            if (x + y) % 3 == 0 || x == 40 || x == 120 || y == 30 || y == 60 {
                raster.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
    }
    encode_png(raster)
}
