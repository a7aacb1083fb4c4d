use anyhow::{Context, ensure};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use tract_onnx::prelude::*;

pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

pub fn decode(bytes: &[u8]) -> TractResult<DynamicImage> {
    let image = image::load_from_memory(bytes).context("Decoding image")?;
    ensure!(
        image.width() > 0 && image.height() > 0,
        "Degenerate image ({}x{})",
        image.width(),
        image.height()
    );
    Ok(image)
}

/// Resize the shortest side, center crop, scale to [0, 1] then normalize each channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessing {
    pub resize: u32,
    pub crop: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for Preprocessing {
    fn default() -> Preprocessing {
        Preprocessing { resize: 256, crop: 224, mean: IMAGENET_MEAN, std: IMAGENET_STD }
    }
}

impl Preprocessing {
    /// Shape of the produced tensor (NCHW).
    pub fn input_shape(&self) -> [usize; 4] {
        [1, 3, self.crop as usize, self.crop as usize]
    }

    /// Dimensions after the aspect preserving resize. The long side is truncated.
    pub fn resized_dims(&self, width: u32, height: u32) -> (u32, u32) {
        let target = self.resize as u64;
        if width <= height {
            (self.resize, (target * height as u64 / width as u64) as u32)
        } else {
            ((target * width as u64 / height as u64) as u32, self.resize)
        }
    }

    /// Top-left corner of the centered crop window, for an image of the given dimensions.
    pub fn crop_offsets(&self, width: u32, height: u32) -> (u32, u32) {
        let offset =
            |len: u32| (len.saturating_sub(self.crop) as f32 / 2.0).round_ties_even() as u32;
        (offset(width), offset(height))
    }

    /// The `crop` x `crop` RGB view the network sees, before normalization.
    pub fn cropped(&self, image: &DynamicImage) -> TractResult<RgbImage> {
        ensure!(image.width() > 0 && image.height() > 0, "Can not preprocess an empty image");
        let (width, height) = self.resized_dims(image.width(), image.height());
        ensure!(
            width >= self.crop && height >= self.crop,
            "Resized image {width}x{height} is smaller than the {}x{} crop",
            self.crop,
            self.crop
        );
        trace!("Resizing {}x{} to {width}x{height}", image.width(), image.height());
        let resized = imageops::resize(&image.to_rgb8(), width, height, FilterType::Triangle);
        let (x, y) = self.crop_offsets(width, height);
        trace!("Cropping {}x{} at ({x}, {y})", self.crop, self.crop);
        Ok(imageops::crop_imm(&resized, x, y, self.crop, self.crop).to_image())
    }

    pub fn to_tensor(&self, image: &DynamicImage) -> TractResult<Tensor> {
        let cropped = self.cropped(image)?;
        Ok(self.normalize(&cropped))
    }

    pub fn normalize(&self, rgb: &RgbImage) -> Tensor {
        let shape = (1, 3, rgb.height() as usize, rgb.width() as usize);
        tract_ndarray::Array4::from_shape_fn(shape, |(_, c, y, x)| {
            (rgb[(x as _, y as _)][c] as f32 / 255.0 - self.mean[c]) / self.std[c]
        })
        .into()
    }

    pub fn bytes_to_tensor(&self, bytes: &[u8]) -> TractResult<Tensor> {
        self.to_tensor(&decode(bytes)?)
    }
}
