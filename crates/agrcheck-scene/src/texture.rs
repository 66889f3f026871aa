//! Texture images as seen by the rule catalogue.
//!
//! Images are resolved by the importer before a sweep; rules only read the
//! pre-computed header facts and the optional uniform-colour sample.

use crate::error::SceneError;
use serde::{Deserialize, Serialize};

/// A texture image referenced by a material or a UDIM tile set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextureImage {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub has_alpha: bool,
    /// Embedded in the geometry file rather than referenced externally.
    #[serde(default)]
    pub is_packed: bool,
    /// The node's alpha output socket is linked.
    #[serde(default)]
    pub alpha_output_linked: bool,
    /// Every pixel has the same colour at 3-decimal precision. `None` when
    /// the pixels were not sampled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uniform_color: Option<bool>,
}

impl TextureImage {
    pub fn new(file_name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            file_name: file_name.into(),
            width,
            height,
            ..Default::default()
        }
    }

    pub fn with_alpha(mut self, has_alpha: bool) -> Self {
        self.has_alpha = has_alpha;
        self
    }

    pub fn with_uniform_color(mut self, uniform: bool) -> Self {
        self.uniform_color = Some(uniform);
        self
    }

    pub fn packed(mut self) -> Self {
        self.is_packed = true;
        self
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// Largest side, the resolution used for density and tile checks.
    pub fn resolution(&self) -> u32 {
        self.width.max(self.height)
    }

    /// Reads dimensions and alpha presence from the PNG header only.
    pub fn from_png_header(file_name: impl Into<String>, bytes: &[u8]) -> Result<Self, SceneError> {
        let file_name = file_name.into();
        let decoder = png::Decoder::new(bytes);
        let reader = decoder
            .read_info()
            .map_err(|e| SceneError::png(&file_name, e))?;
        let info = reader.info();
        Ok(Self {
            width: info.width,
            height: info.height,
            has_alpha: color_type_has_alpha(info.color_type) || info.trns.is_some(),
            file_name,
            ..Default::default()
        })
    }

    /// Decodes the whole frame and samples pixels for the uniform-colour
    /// check.
    pub fn from_png(file_name: impl Into<String>, bytes: &[u8]) -> Result<Self, SceneError> {
        let file_name = file_name.into();
        let mut decoder = png::Decoder::new(bytes);
        decoder.set_transformations(png::Transformations::EXPAND);
        let mut reader = decoder
            .read_info()
            .map_err(|e| SceneError::png(&file_name, e))?;

        let mut pixels = vec![0u8; reader.output_buffer_size()];
        let info = reader
            .next_frame(&mut pixels)
            .map_err(|e| SceneError::png(&file_name, e))?;
        pixels.truncate(info.buffer_size());

        let uniform = is_uniform(&pixels, info.color_type, info.bit_depth);
        Ok(Self {
            width: info.width,
            height: info.height,
            has_alpha: color_type_has_alpha(info.color_type),
            uniform_color: Some(uniform),
            file_name,
            ..Default::default()
        })
    }
}

fn color_type_has_alpha(color_type: png::ColorType) -> bool {
    matches!(
        color_type,
        png::ColorType::GrayscaleAlpha | png::ColorType::Rgba
    )
}

/// Compares every pixel against the first one with channels normalised to
/// `[0, 1]` and rounded to 3 decimals.
fn is_uniform(pixels: &[u8], color_type: png::ColorType, bit_depth: png::BitDepth) -> bool {
    let wide = bit_depth == png::BitDepth::Sixteen;
    let bytes_per_sample = if wide { 2 } else { 1 };
    let channels = match color_type {
        png::ColorType::Grayscale | png::ColorType::Indexed => 1,
        png::ColorType::GrayscaleAlpha => 2,
        png::ColorType::Rgb => 3,
        png::ColorType::Rgba => 4,
    };
    let stride = channels * bytes_per_sample;
    if pixels.len() < stride {
        return true;
    }

    let quantize = |chunk: &[u8]| -> [i32; 4] {
        let mut out = [1000; 4];
        for (c, slot) in out.iter_mut().take(channels).enumerate() {
            let value = if wide {
                u16::from_be_bytes([chunk[c * 2], chunk[c * 2 + 1]]) as f64 / 65535.0
            } else {
                chunk[c] as f64 / 255.0
            };
            *slot = (value * 1000.0).round() as i32;
        }
        out
    };

    let first = quantize(&pixels[..stride]);
    pixels
        .chunks_exact(stride)
        .skip(1)
        .all(|chunk| quantize(chunk) == first)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_png(width: u32, height: u32, pixels: &[u8], color_type: png::ColorType) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buffer, width, height);
            encoder.set_color(color_type);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(pixels).unwrap();
        }
        buffer
    }

    #[test]
    fn test_header_reads_dimensions_and_alpha() {
        let data = encode_png(2, 1, &[0, 0, 0, 255, 10, 10, 10, 255], png::ColorType::Rgba);
        let tex = TextureImage::from_png_header("T_A_ERM_1.1001.png", &data).unwrap();
        assert_eq!((tex.width, tex.height), (2, 1));
        assert!(tex.has_alpha);
        assert_eq!(tex.uniform_color, None);
        assert!(!tex.is_square());
    }

    #[test]
    fn test_uniform_rgb_placeholder() {
        let pixels = [128u8, 64, 32].repeat(4);
        let data = encode_png(2, 2, &pixels, png::ColorType::Rgb);
        let tex = TextureImage::from_png("T_A_Diffuse_1.1002.png", &data).unwrap();
        assert!(!tex.has_alpha);
        assert_eq!(tex.uniform_color, Some(true));
    }

    #[test]
    fn test_multicolor_detected() {
        let pixels = [0u8, 0, 0, 0, 0, 0, 0, 0, 0, 255, 0, 0];
        let data = encode_png(2, 2, &pixels, png::ColorType::Rgb);
        let tex = TextureImage::from_png("T_A_Diffuse_1.1002.png", &data).unwrap();
        assert_eq!(tex.uniform_color, Some(false));
    }

    #[test]
    fn test_garbage_is_png_error() {
        let err = TextureImage::from_png_header("broken.png", b"not a png").unwrap_err();
        assert!(matches!(err, SceneError::Png { .. }));
    }
}
