//! Image processing utilities using opencv-match conversions

use crate::error::CalculationError;
use crate::Result;
use anyhow::Context;
use flagscope_core::Hsv;
use image::RgbImage;
use opencv::{
    core::{self, Mat, Scalar, Size, Vec3b},
    imgproc::{self, COLOR_HSV2RGB, COLOR_RGB2GRAY, COLOR_RGB2HSV, INTER_LINEAR},
    prelude::*,
};
use opencv_match::prelude::*;

/// Image utility functions leveraging opencv-match conversions
pub struct ImageUtils;

impl ImageUtils {
    /// Decode raw image bytes into a 3-channel raster. Gray and alpha
    /// inputs are normalized to RGB.
    pub fn decode(bytes: &[u8]) -> Result<RgbImage> {
        let rgb = image::load_from_memory(bytes)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(CalculationError::InvalidImage { width, height });
        }

        Ok(rgb)
    }

    /// Convert image::RgbImage to an RGB-ordered OpenCV Mat using opencv-match
    pub fn rgb_to_mat(rgb_image: &RgbImage) -> Result<Mat> {
        rgb_image
            .try_into_cv()
            .context("Failed to convert RGB image to OpenCV Mat")
            .map_err(CalculationError::Conversion)
    }

    /// Bilinear resample to `(width, height)`
    pub fn resize(mat: &Mat, width: u32, height: u32) -> Result<Mat> {
        let mut resized = Mat::default();
        imgproc::resize(
            mat,
            &mut resized,
            Size::new(width as i32, height as i32),
            0.0,
            0.0,
            INTER_LINEAR,
        )?;
        Ok(resized)
    }

    /// RGB Mat to HSV on the 8-bit OpenCV scale (hue in [0, 180))
    pub fn to_hsv(rgb: &Mat) -> Result<Mat> {
        let mut hsv = Mat::default();
        imgproc::cvt_color(rgb, &mut hsv, COLOR_RGB2HSV, 0)?;
        Ok(hsv)
    }

    pub fn to_gray(rgb: &Mat) -> Result<Mat> {
        let mut gray = Mat::default();
        imgproc::cvt_color(rgb, &mut gray, COLOR_RGB2GRAY, 0)?;
        Ok(gray)
    }

    /// Displayable RGB of one HSV sample
    pub fn hsv_to_rgb(hsv: Hsv) -> Result<[u8; 3]> {
        let pixel = Mat::new_rows_cols_with_default(
            1,
            1,
            core::CV_8UC3,
            Scalar::new(hsv.h as f64, hsv.s as f64, hsv.v as f64, 0.0),
        )?;
        let mut rgb = Mat::default();
        imgproc::cvt_color(&pixel, &mut rgb, COLOR_HSV2RGB, 0)?;

        let value = rgb.at_2d::<Vec3b>(0, 0)?;
        Ok([value[0], value[1], value[2]])
    }
}

/// Fixed-size resampling of a request's image with the color spaces every
/// stage reads. Owned by a single invocation.
pub struct StandardizedImage {
    pub rgb: Mat,
    pub hsv: Mat,
    pub gray: Mat,
    pub width: i32,
    pub height: i32,
}

impl StandardizedImage {
    /// Resample `original` to `size` and derive its HSV and intensity planes
    pub fn from_rgb(original: &RgbImage, size: (u32, u32)) -> Result<Self> {
        let (width, height) = original.dimensions();
        if width == 0 || height == 0 {
            return Err(CalculationError::InvalidImage { width, height });
        }
        if size.0 == 0 || size.1 == 0 {
            return Err(CalculationError::InvalidImage {
                width: size.0,
                height: size.1,
            });
        }

        let mat = ImageUtils::rgb_to_mat(original)?;
        let rgb = if (width, height) == size {
            mat
        } else {
            ImageUtils::resize(&mat, size.0, size.1)?
        };

        let hsv = ImageUtils::to_hsv(&rgb)?;
        let gray = ImageUtils::to_gray(&rgb)?;

        Ok(Self {
            rgb,
            hsv,
            gray,
            width: size.0 as i32,
            height: size.1 as i32,
        })
    }

    pub fn total_pixels(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    pub fn rgb_at(&self, x: i32, y: i32) -> Result<[u8; 3]> {
        let pixel = self.rgb.at_2d::<Vec3b>(y, x)?;
        Ok([pixel[0], pixel[1], pixel[2]])
    }

    pub fn hsv_at(&self, x: i32, y: i32) -> Result<Hsv> {
        let pixel = self.hsv.at_2d::<Vec3b>(y, x)?;
        Ok(Hsv::new(pixel[0], pixel[1], pixel[2]))
    }

    pub fn gray_at(&self, x: i32, y: i32) -> Result<u8> {
        Ok(*self.gray.at_2d::<u8>(y, x)?)
    }

    /// Every HSV pixel in row-major order
    pub fn hsv_pixels(&self) -> Result<Vec<Hsv>> {
        let pixels = self.hsv.data_typed::<Vec3b>()?;
        Ok(pixels.iter().map(|p| Hsv::new(p[0], p[1], p[2])).collect())
    }
}
