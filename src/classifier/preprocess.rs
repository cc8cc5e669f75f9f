// Image preprocessing
// Decodes a captured still and builds the normalized NHWC tensor the models expect

use image::imageops::FilterType;
use ndarray::Array4;

use super::backend::ClassifierError;

/// Models were trained on pixels scaled to [-1, 1] around this midpoint
const PIXEL_CENTER: f32 = 127.5;

/// Decode `bytes`, resize to `size`x`size` and normalize into a `[1, size, size, 3]` tensor
pub fn image_to_tensor(bytes: &[u8], size: u32) -> Result<Array4<f32>, ClassifierError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| ClassifierError::ImageDecode(e.to_string()))?;

    let rgb = image::imageops::resize(&img.to_rgb8(), size, size, FilterType::Triangle);

    let data: Vec<f32> = rgb
        .into_raw()
        .into_iter()
        .map(|p| (p as f32 - PIXEL_CENTER) / PIXEL_CENTER)
        .collect();

    Array4::from_shape_vec((1, size as usize, size as usize, 3), data)
        .map_err(|e| ClassifierError::ImageDecode(format!("Failed to create tensor: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, ImageFormat::Png).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_tensor_shape() {
        let bytes = png_bytes(40, 30, [0, 0, 0]);
        let tensor = image_to_tensor(&bytes, 16).unwrap();
        assert_eq!(tensor.shape(), &[1, 16, 16, 3]);
    }

    #[test]
    fn test_normalization_range() {
        let black = image_to_tensor(&png_bytes(8, 8, [0, 0, 0]), 4).unwrap();
        assert!(black.iter().all(|v| (*v + 1.0).abs() < 1e-6));

        let white = image_to_tensor(&png_bytes(8, 8, [255, 255, 255]), 4).unwrap();
        assert!(white.iter().all(|v| (*v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_channel_order() {
        let red = image_to_tensor(&png_bytes(4, 4, [255, 0, 0]), 2).unwrap();
        assert!((red[[0, 1, 1, 0]] - 1.0).abs() < 1e-6);
        assert!((red[[0, 1, 1, 2]] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_garbage_bytes_fail() {
        let err = image_to_tensor(b"not an image", 4).unwrap_err();
        assert!(matches!(err, ClassifierError::ImageDecode(_)));
    }
}
