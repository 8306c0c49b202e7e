//! Gradient extraction with two fixed 3x3 kernels

use crate::calculation::config::ConvolutionConfig;
use crate::utils::StandardizedImage;
use crate::Result;
use opencv::{
    core::{self, Mat, Point, Vector},
    imgproc::{self, THRESH_BINARY},
    prelude::*,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kernels {
    pub horizontal_edge: [[i32; 3]; 3],
    pub vertical_edge: [[i32; 3]; 3],
}

/// Both gradient responses at one sample point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvolutionSample {
    pub region: String,
    /// 3x3 intensity neighborhood; empty when it would leave the image
    pub pixel_values: Vec<Vec<u8>>,
    pub horizontal_output: u8,
    pub vertical_output: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeStatistics {
    pub horizontal_edge_mean: f64,
    pub vertical_edge_mean: f64,
    pub horizontal_edge_std: f64,
    pub vertical_edge_std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvolutionAnalysis {
    pub kernels: Kernels,
    pub sample_results: Vec<ConvolutionSample>,
    pub edge_statistics: EdgeStatistics,
    pub edge_threshold: f64,
    /// Pixels of the combined response above `edge_threshold`
    pub thresholded_edge_pixels: i32,
    pub explanation: String,
}

pub struct EdgeSimulator<'a> {
    config: &'a ConvolutionConfig,
}

fn kernel_mat(kernel: &[[i32; 3]; 3]) -> Result<Mat> {
    let rows: Vec<[f32; 3]> = kernel
        .iter()
        .map(|row| [row[0] as f32, row[1] as f32, row[2] as f32])
        .collect();
    Ok(Mat::from_slice_2d(rows.as_slice())?)
}

/// Population mean and standard deviation of a single-channel plane
fn mean_and_std(plane: &Mat) -> Result<(f64, f64)> {
    if plane.empty() {
        return Ok((0.0, 0.0));
    }

    let mut mean = Vector::<f64>::new();
    let mut stddev = Vector::<f64>::new();
    core::mean_std_dev(plane, &mut mean, &mut stddev, &core::no_array())?;
    Ok((mean.get(0)?, stddev.get(0)?))
}

fn value_at(plane: &Mat, x: i32, y: i32) -> Result<u8> {
    if x < 0 || y < 0 || x >= plane.cols() || y >= plane.rows() {
        return Ok(0);
    }
    Ok(*plane.at_2d::<u8>(y, x)?)
}

impl<'a> EdgeSimulator<'a> {
    pub fn new(config: &'a ConvolutionConfig) -> Self {
        Self { config }
    }

    /// Apply one kernel with border replication, keeping the 8-bit depth
    pub fn convolve(&self, gray: &Mat, kernel: &[[i32; 3]; 3]) -> Result<Mat> {
        let mut output = Mat::default();
        imgproc::filter_2d(
            gray,
            &mut output,
            -1,
            &kernel_mat(kernel)?,
            Point::new(-1, -1),
            0.0,
            core::BORDER_REPLICATE,
        )?;
        Ok(output)
    }

    pub fn analyze(&self, image: &StandardizedImage) -> Result<ConvolutionAnalysis> {
        let gray = &image.gray;
        let horizontal = self.convolve(gray, &self.config.horizontal_kernel)?;
        let vertical = self.convolve(gray, &self.config.vertical_kernel)?;

        let mut combined = Mat::default();
        core::add_weighted(
            &horizontal,
            self.config.horizontal_weight,
            &vertical,
            self.config.vertical_weight,
            0.0,
            &mut combined,
            -1,
        )?;
        let mut mask = Mat::default();
        imgproc::threshold(&combined, &mut mask, self.config.edge_threshold, 255.0, THRESH_BINARY)?;
        let thresholded_edge_pixels = core::count_non_zero(&mask)?;

        let mut sample_results = Vec::with_capacity(self.config.sample_points.len());
        for &(x, y) in &self.config.sample_points {
            let inside = x >= 0 && y >= 0 && y < gray.rows() - 3 && x < gray.cols() - 3;
            let pixel_values = if inside {
                let mut region = Vec::with_capacity(3);
                for row in y..y + 3 {
                    let mut values = Vec::with_capacity(3);
                    for col in x..x + 3 {
                        values.push(*gray.at_2d::<u8>(row, col)?);
                    }
                    region.push(values);
                }
                region
            } else {
                Vec::new()
            };

            sample_results.push(ConvolutionSample {
                region: format!("({}:{},{}:{})", x, x + 2, y, y + 2),
                pixel_values,
                horizontal_output: value_at(&horizontal, x, y)?,
                vertical_output: value_at(&vertical, x, y)?,
            });
        }

        let (horizontal_edge_mean, horizontal_edge_std) = mean_and_std(&horizontal)?;
        let (vertical_edge_mean, vertical_edge_std) = mean_and_std(&vertical)?;

        log::debug!(
            "Convolution: horizontal mean {:.2}, vertical mean {:.2}, {} edge pixels",
            horizontal_edge_mean,
            vertical_edge_mean,
            thresholded_edge_pixels
        );

        Ok(ConvolutionAnalysis {
            kernels: Kernels {
                horizontal_edge: self.config.horizontal_kernel,
                vertical_edge: self.config.vertical_kernel,
            },
            sample_results,
            edge_statistics: EdgeStatistics {
                horizontal_edge_mean,
                vertical_edge_mean,
                horizontal_edge_std,
                vertical_edge_std,
            },
            edge_threshold: self.config.edge_threshold,
            thresholded_edge_pixels,
            explanation: "Convolution detects features like edges by applying filter kernels to \
                          the image. In a real CNN, hundreds of learned filters detect complex \
                          patterns."
                .to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::CalculationConfig;
    use image::{Rgb, RgbImage};

    fn black_over_white() -> RgbImage {
        RgbImage::from_fn(640, 640, |_, y| {
            if y < 320 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    #[test]
    fn test_horizontal_boundary_only_excites_horizontal_kernel() -> Result<()> {
        let config = CalculationConfig::default();
        let image = StandardizedImage::from_rgb(&black_over_white(), (640, 640))?;
        let analysis = EdgeSimulator::new(&config.convolution).analyze(&image)?;

        let stats = &analysis.edge_statistics;
        assert!(stats.horizontal_edge_mean > 0.0);
        assert_eq!(stats.vertical_edge_mean, 0.0);
        assert_eq!(stats.vertical_edge_std, 0.0);
        assert!(analysis.thresholded_edge_pixels > 0);
        Ok(())
    }

    #[test]
    fn test_sample_regions() -> Result<()> {
        let config = CalculationConfig::default();
        let image = StandardizedImage::from_rgb(&black_over_white(), (640, 640))?;
        let analysis = EdgeSimulator::new(&config.convolution).analyze(&image)?;

        assert_eq!(analysis.sample_results.len(), 4);
        let first = &analysis.sample_results[0];
        assert_eq!(first.region, "(10:12,10:12)");
        assert_eq!(first.pixel_values, vec![vec![0u8; 3]; 3]);
        assert_eq!(first.horizontal_output, 0);

        // (10,320) sits on the first white row, right under the boundary
        let boundary = &analysis.sample_results[2];
        assert_eq!(boundary.horizontal_output, 255);
        assert_eq!(boundary.vertical_output, 0);
        Ok(())
    }

    #[test]
    fn test_mean_and_std_of_two_level_plane() -> Result<()> {
        let rows: Vec<[u8; 2]> = vec![[0, 0], [100, 100]];
        let plane = Mat::from_slice_2d(rows.as_slice())?;
        let (mean, std) = mean_and_std(&plane)?;
        assert!((mean - 50.0).abs() < 1e-9);
        assert!((std - 50.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_samples_outside_small_images_are_empty() -> Result<()> {
        let config = CalculationConfig::default();
        let raster = RgbImage::from_pixel(64, 64, Rgb([128, 128, 128]));
        let image = StandardizedImage::from_rgb(&raster, (64, 64))?;
        let analysis = EdgeSimulator::new(&config.convolution).analyze(&image)?;

        let far = &analysis.sample_results[3];
        assert!(far.pixel_values.is_empty());
        assert_eq!(far.horizontal_output, 0);
        Ok(())
    }
}
