//! Reference image preparation
//!
//! The video engine only accepts reference images at the exact output
//! resolution. Arbitrary uploads are scaled to cover the target box and the
//! overflow is cropped around the centre ("crop-to-fill"), so the result is
//! never stretched.

use std::fmt;
use std::io::Cursor;

use bytes::Bytes;
use image::{
    DynamicImage, ImageDecoder, ImageError, ImageReader,
    codecs::jpeg::JpegEncoder,
    error::{ParameterError, ParameterErrorKind},
    imageops::FilterType,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{StudioError, StudioResult};

/// Resolution the video engine renders at and expects references in
pub const REFERENCE_RESOLUTION: Resolution = Resolution {
    width: 1280,
    height: 720,
};

/// JPEG quality used for prepared references
pub const JPEG_QUALITY: u8 = 95;

/// Content type of every prepared reference
pub const REFERENCE_CONTENT_TYPE: &str = "image/jpeg";

/// File name the reference is uploaded under
pub const REFERENCE_FILE_NAME: &str = "reference.jpg";

/// Pixel dimensions of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height
    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Where the scaled source lands on the target canvas
///
/// Offsets are negative on the cropped axis: the scaled source extends past
/// the canvas edge by the same amount on both sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverPlacement {
    pub draw_width: f64,
    pub draw_height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

/// Compute the crop-to-fill placement of a `src_width`×`src_height` image
///
/// A source that is relatively wider than the target is scaled to the target
/// height and cropped horizontally; anything else (including equal aspect
/// ratios) is scaled to the target width and cropped vertically.
pub fn cover_placement(src_width: u32, src_height: u32, target: Resolution) -> CoverPlacement {
    let target_width = target.width as f64;
    let target_height = target.height as f64;
    let image_aspect = src_width as f64 / src_height as f64;

    if image_aspect > target.aspect() {
        let draw_height = target_height;
        let draw_width = src_width as f64 * (target_height / src_height as f64);
        CoverPlacement {
            draw_width,
            draw_height,
            offset_x: (target_width - draw_width) / 2.0,
            offset_y: 0.0,
        }
    } else {
        let draw_width = target_width;
        let draw_height = src_height as f64 * (target_width / src_width as f64);
        CoverPlacement {
            draw_width,
            draw_height,
            offset_x: 0.0,
            offset_y: (target_height - draw_height) / 2.0,
        }
    }
}

/// Rectangle in source pixels: `(x, y, width, height)`
type SourceWindow = (u32, u32, u32, u32);

impl CoverPlacement {
    /// The part of the source that ends up visible on the canvas
    fn source_window(&self, src_width: u32, src_height: u32, target: Resolution) -> SourceWindow {
        let scale = self.draw_width / src_width as f64;

        let width = (target.width as f64 / scale)
            .round()
            .clamp(1.0, src_width as f64) as u32;
        let height = (target.height as f64 / scale)
            .round()
            .clamp(1.0, src_height as f64) as u32;

        let x = ((-self.offset_x / scale).round().max(0.0) as u32).min(src_width - width);
        let y = ((-self.offset_y / scale).round().max(0.0) as u32).min(src_height - height);

        (x, y, width, height)
    }
}

/// A reference image ready to be sent to the engine
#[derive(Debug, Clone)]
pub struct PreparedImage {
    bytes: Bytes,
    resolution: Resolution,
}

impl PreparedImage {
    /// Encoded JPEG payload
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn content_type(&self) -> &'static str {
        REFERENCE_CONTENT_TYPE
    }

    pub fn file_name(&self) -> &'static str {
        REFERENCE_FILE_NAME
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Resize and crop an encoded image to [`REFERENCE_RESOLUTION`]
pub fn prepare_reference_image(source: &[u8]) -> StudioResult<PreparedImage> {
    prepare_image(source, REFERENCE_RESOLUTION)
}

/// Same as [`prepare_reference_image`], off the async executor
pub async fn prepare_reference_image_async(source: Bytes) -> StudioResult<PreparedImage> {
    tokio::task::spawn_blocking(move || prepare_reference_image(&source))
        .await
        .map_err(|e| StudioError::ImageProcessing(ImageError::IoError(std::io::Error::other(e))))?
}

/// Resize and crop an encoded image to exactly `target`
///
/// The EXIF orientation is applied first, so the crop axis follows the image
/// as it is displayed rather than as it is stored.
pub fn prepare_image(source: &[u8], target: Resolution) -> StudioResult<PreparedImage> {
    let decoded = decode_oriented(source)?;
    let (src_width, src_height) = (decoded.width(), decoded.height());

    if src_width == 0 || src_height == 0 || target.width == 0 || target.height == 0 {
        return Err(StudioError::ImageProcessing(ImageError::Parameter(
            ParameterError::from_kind(ParameterErrorKind::DimensionMismatch),
        )));
    }

    let source_resolution = Resolution::new(src_width, src_height);
    let placement = cover_placement(src_width, src_height, target);
    let (x, y, width, height) = placement.source_window(src_width, src_height, target);
    debug!(
        "Cropping {} reference to {}x{} at ({}, {}) for {}",
        source_resolution, width, height, x, y, target
    );

    let cropped = decoded.crop_imm(x, y, width, height);
    let resized = cropped.resize_exact(target.width, target.height, FilterType::Lanczos3);
    let bytes = encode_jpeg(&resized)?;

    info!(
        "Prepared reference image {} -> {} ({} bytes)",
        source_resolution,
        target,
        bytes.len()
    );

    Ok(PreparedImage {
        bytes,
        resolution: target,
    })
}

fn decode_oriented(source: &[u8]) -> StudioResult<DynamicImage> {
    let mut decoder = ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| StudioError::ImageProcessing(ImageError::IoError(e)))?
        .into_decoder()
        .map_err(StudioError::ImageProcessing)?;
    let orientation = decoder.orientation().map_err(StudioError::ImageProcessing)?;

    let mut image = DynamicImage::from_decoder(decoder).map_err(StudioError::ImageProcessing)?;
    image.apply_orientation(orientation);
    Ok(image)
}

fn encode_jpeg(image: &DynamicImage) -> StudioResult<Bytes> {
    // JPEG has no alpha channel
    let rgb = image.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(StudioError::ImageProcessing)?;
    Ok(Bytes::from(out))
}

/// Read the dimensions of an encoded image without decoding the pixels
pub fn reference_dimensions(source: &[u8]) -> StudioResult<Resolution> {
    let (width, height) = ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| StudioError::ImageProcessing(ImageError::IoError(e)))?
        .into_dimensions()
        .map_err(StudioError::ImageProcessing)?;

    Ok(Resolution::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    const RED: Rgb<u8> = Rgb([220, 20, 20]);
    const BLUE: Rgb<u8> = Rgb([20, 20, 220]);
    const GREEN: Rgb<u8> = Rgb([20, 220, 20]);

    /// Blue canvas, red square in the middle, green bands on the outer 20%
    /// of the axis that crop-to-fill trims
    fn sample(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            let (cx, cy) = (width / 2, height / 2);
            let half = width.min(height) / 10;
            if x.abs_diff(cx) < half && y.abs_diff(cy) < half {
                return RED;
            }
            let band = if width as f64 / height as f64 > REFERENCE_RESOLUTION.aspect() {
                x < width / 5 || x >= width - width / 5
            } else {
                y < height / 5 || y >= height - height / 5
            };
            if band { GREEN } else { BLUE }
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn close_to(actual: &Rgb<u8>, expected: Rgb<u8>) -> bool {
        actual
            .0
            .iter()
            .zip(expected.0.iter())
            .all(|(a, e)| a.abs_diff(*e) < 40)
    }

    #[test]
    fn test_placement_for_wide_source_crops_width() {
        let placement = cover_placement(2560, 720, REFERENCE_RESOLUTION);
        assert_eq!(placement.draw_height, 720.0);
        assert_eq!(placement.draw_width, 2560.0);
        assert_eq!(placement.offset_x, -640.0);
        assert_eq!(placement.offset_y, 0.0);
    }

    #[test]
    fn test_placement_for_tall_source_crops_height() {
        let placement = cover_placement(3000, 2000, REFERENCE_RESOLUTION);
        assert_eq!(placement.draw_width, 1280.0);
        assert!((placement.draw_height - 853.333).abs() < 0.01);
        assert_eq!(placement.offset_x, 0.0);
        assert!((placement.offset_y + 66.666).abs() < 0.01);
    }

    #[test]
    fn test_placement_for_matching_aspect_has_no_offset() {
        let placement = cover_placement(1920, 1080, REFERENCE_RESOLUTION);
        assert_eq!(placement.draw_width, 1280.0);
        assert_eq!(placement.draw_height, 720.0);
        assert_eq!(placement.offset_x, 0.0);
        assert_eq!(placement.offset_y, 0.0);
    }

    #[test]
    fn test_output_is_always_reference_resolution() {
        for (width, height) in [(1920, 1080), (1000, 1000), (720, 1280), (3000, 2000)] {
            let prepared = prepare_reference_image(&sample(width, height)).unwrap();
            assert_eq!(prepared.resolution(), REFERENCE_RESOLUTION);

            let decoded = image::load_from_memory(prepared.bytes()).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (1280, 720));
            assert_eq!(
                image::guess_format(prepared.bytes()).unwrap(),
                ImageFormat::Jpeg
            );
        }
    }

    #[test]
    fn test_centre_of_source_stays_in_centre() {
        for (width, height) in [(1920, 1080), (1000, 1000), (720, 1280)] {
            let prepared = prepare_reference_image(&sample(width, height)).unwrap();
            let decoded = image::load_from_memory(prepared.bytes()).unwrap().to_rgb8();
            assert!(
                close_to(decoded.get_pixel(640, 360), RED),
                "centre lost for {}x{}",
                width,
                height
            );
        }
    }

    #[test]
    fn test_overflow_on_long_axis_is_cropped() {
        // Square and portrait sources lose their top and bottom bands
        for (width, height) in [(1000, 1000), (720, 1280)] {
            let prepared = prepare_reference_image(&sample(width, height)).unwrap();
            let decoded = image::load_from_memory(prepared.bytes()).unwrap().to_rgb8();
            for y in [0, 719] {
                assert!(
                    close_to(decoded.get_pixel(640, y), BLUE),
                    "band survived at row {} for {}x{}",
                    y,
                    width,
                    height
                );
            }
        }
    }

    #[test]
    fn test_wide_source_loses_side_bands() {
        let prepared = prepare_reference_image(&sample(2560, 720)).unwrap();
        let decoded = image::load_from_memory(prepared.bytes()).unwrap().to_rgb8();
        for x in [0, 1279] {
            assert!(
                close_to(decoded.get_pixel(x, 360), BLUE),
                "band survived at column {}",
                x
            );
        }
        assert!(close_to(decoded.get_pixel(640, 360), RED));
    }

    /// JPEG whose first segment is an EXIF block carrying `orientation`
    fn jpeg_with_orientation(img: RgbImage, orientation: u8) -> Vec<u8> {
        let mut encoded = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut encoded, ImageFormat::Jpeg)
            .unwrap();
        let encoded = encoded.into_inner();

        let mut tiff = b"MM\0\x2a\0\0\0\x08".to_vec();
        tiff.extend_from_slice(&[0, 1]);
        tiff.extend_from_slice(&[0x01, 0x12, 0, 3, 0, 0, 0, 1, 0, orientation, 0, 0]);
        tiff.extend_from_slice(&[0, 0, 0, 0]);

        let mut app1 = b"Exif\0\0".to_vec();
        app1.extend_from_slice(&tiff);
        let length = (app1.len() + 2) as u16;

        let mut out = encoded[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&length.to_be_bytes());
        out.extend_from_slice(&app1);
        out.extend_from_slice(&encoded[2..]);
        out
    }

    #[test]
    fn test_exif_rotation_is_applied_before_cropping() {
        // Stored landscape, red left and blue right. Orientation 6 turns it
        // into a portrait with red on top.
        let stored = RgbImage::from_fn(400, 200, |x, _| if x < 200 { RED } else { BLUE });
        let source = jpeg_with_orientation(stored, 6);

        let prepared = prepare_reference_image(&source).unwrap();
        let decoded = image::load_from_memory(prepared.bytes()).unwrap().to_rgb8();

        assert_eq!(decoded.dimensions(), (1280, 720));
        assert!(close_to(decoded.get_pixel(640, 50), RED));
        assert!(close_to(decoded.get_pixel(640, 670), BLUE));
        assert!(close_to(decoded.get_pixel(20, 50), RED));
        assert!(close_to(decoded.get_pixel(1260, 670), BLUE));
    }

    #[test]
    fn test_matching_aspect_is_not_cropped() {
        let prepared = prepare_reference_image(&sample(1920, 1080)).unwrap();
        let decoded = image::load_from_memory(prepared.bytes()).unwrap().to_rgb8();
        assert!(close_to(decoded.get_pixel(640, 5), GREEN));
        assert!(close_to(decoded.get_pixel(640, 714), GREEN));
    }

    #[test]
    fn test_undecodable_input_is_an_image_processing_error() {
        let err = prepare_reference_image(b"not an image").unwrap_err();
        assert!(matches!(err, StudioError::ImageProcessing(_)));
        assert_eq!(err.to_string(), "image processing failed");
    }

    #[test]
    fn test_reference_dimensions_reads_header() {
        let dims = reference_dimensions(&sample(640, 480)).unwrap();
        assert_eq!(dims, Resolution::new(640, 480));
        assert_eq!(dims.to_string(), "640x480");
    }

    #[tokio::test]
    async fn test_async_preparation_matches_sync() {
        let prepared = prepare_reference_image_async(Bytes::from(sample(800, 600)))
            .await
            .unwrap();
        assert_eq!(prepared.resolution(), REFERENCE_RESOLUTION);
        assert!(!prepared.is_empty());
    }
}
