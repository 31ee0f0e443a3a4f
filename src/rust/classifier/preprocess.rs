//! Image preprocessing matching the pipeline the weights were trained with:
//! resize the shorter side, center-crop, scale to `[0, 1]`, normalize per channel.

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use ndarray::Array4;

use super::error::ClassifierError;
use crate::models::{BuiltinModel, ModelCharacteristics};

/// Fixed preprocessing parameters for one model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessConfig {
    /// Target length of the shorter image side after resizing
    pub resize_shorter: u32,
    /// Side of the square center crop
    pub crop_size: u32,
    /// Per-channel mean subtracted after scaling to `[0, 1]`
    pub mean: [f32; 3],
    /// Per-channel standard deviation divided by after mean subtraction
    pub std: [f32; 3],
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self::from(&BuiltinModel::AnimeResNet50.characteristics())
    }
}

impl From<&ModelCharacteristics> for PreprocessConfig {
    fn from(characteristics: &ModelCharacteristics) -> Self {
        Self {
            resize_shorter: characteristics.resize_size,
            crop_size: characteristics.input_size,
            mean: characteristics.mean,
            std: characteristics.std,
        }
    }
}

/// Largest intermediate image, in pixels, that resizing may produce.
///
/// Enough for any ordinary screenshot or photo. Only extreme aspect ratios hit it,
/// e.g. a 1x100000 strip would otherwise be resized to 256x25600000.
pub const MAX_RESIZED_PIXELS: u64 = 1 << 24;

/// Dimensions after resizing so the shorter side equals `shorter`.
///
/// The longer side is scaled proportionally and truncated. Returns `None` when a
/// side is zero or the longer side does not fit in a `u32`.
pub fn resized_dimensions(width: u32, height: u32, shorter: u32) -> Option<(u32, u32)> {
    let (short, long) = if width <= height { (width, height) } else { (height, width) };
    let scaled = u64::from(shorter)
        .checked_mul(u64::from(long))?
        .checked_div(u64::from(short))?;
    let scaled = u32::try_from(scaled).ok()?;
    if width <= height {
        Some((shorter, scaled))
    } else {
        Some((scaled, shorter))
    }
}

/// Top-left corner of a centered `crop` x `crop` window, rounding half offsets to even.
pub fn center_crop_offsets(width: u32, height: u32, crop: u32) -> (u32, u32) {
    let offset = |dim: u32| (f64::from(dim.saturating_sub(crop)) / 2.0).round_ties_even() as u32;
    (offset(width), offset(height))
}

/// Resizes and center-crops an RGB image to the square input the network expects.
///
/// # Errors
/// - `DecodeError` if the image is empty or resizing would exceed [`MAX_RESIZED_PIXELS`]
pub fn resize_and_crop(
    image: &RgbImage,
    config: &PreprocessConfig,
) -> Result<RgbImage, ClassifierError> {
    let shorter = config.resize_shorter.max(config.crop_size);
    let (width, height) = image.dimensions();
    let too_large = || {
        ClassifierError::DecodeError(format!(
            "Image of {}x{} cannot be resized to a {} pixel shorter side",
            width, height, shorter
        ))
    };

    let (new_width, new_height) =
        resized_dimensions(width, height, shorter).ok_or_else(too_large)?;
    if u64::from(new_width) * u64::from(new_height) > MAX_RESIZED_PIXELS {
        return Err(too_large());
    }

    let resized;
    let source = if (new_width, new_height) == (width, height) {
        image
    } else {
        resized = imageops::resize(image, new_width, new_height, FilterType::Triangle);
        &resized
    };

    let (x, y) = center_crop_offsets(new_width, new_height, config.crop_size);
    Ok(imageops::crop_imm(source, x, y, config.crop_size, config.crop_size).to_image())
}

/// Converts an image into a normalized NCHW tensor of shape `[1, 3, crop, crop]`.
///
/// # Errors
/// - `DecodeError` if the image cannot be resized, see [`resize_and_crop`]
pub fn preprocess_image(
    image: &DynamicImage,
    config: &PreprocessConfig,
) -> Result<Array4<f32>, ClassifierError> {
    let rgb = image.to_rgb8();
    let cropped = resize_and_crop(&rgb, config)?;
    let side = config.crop_size as usize;

    let mut tensor = Array4::<f32>::zeros((1, 3, side, side));
    for (x, y, pixel) in cropped.enumerate_pixels() {
        for channel in 0..3 {
            let scaled = f32::from(pixel[channel]) / 255.0;
            tensor[[0, channel, y as usize, x as usize]] =
                (scaled - config.mean[channel]) / config.std[channel];
        }
    }
    Ok(tensor)
}
