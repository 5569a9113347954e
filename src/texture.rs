//! The model's colour map.
//!
//! Decoding happens on the CPU through `image` and is kept apart from the
//! upload, so a bad file is reported before any GPU object exists.

use std::path::Path;

use image::{Rgba, RgbaImage};
use log::info;

use crate::gpu::GpuContext;

/// A 2D sRGB texture and the sampler the Phong pass reads it with.
#[derive(Debug)]
pub struct Texture {
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
}

/// Reads an image file into RGBA8 pixels. Any format `image` knows is accepted.
pub fn decode(path: impl AsRef<Path>) -> Result<RgbaImage, image::ImageError> {
    let path = path.as_ref();
    let pixels = image::open(path)?.to_rgba8();
    info!(
        "decoded texture {} ({}x{})",
        path.display(),
        pixels.width(),
        pixels.height()
    );
    Ok(pixels)
}

/// The stand-in for untextured models: one opaque white texel, so the
/// shaded colour is the lighting alone.
pub fn white_pixel() -> RgbaImage {
    RgbaImage::from_pixel(1, 1, Rgba([255; 4]))
}

impl Texture {
    /// Uploads `pixels` with a linear, repeating sampler. UVs outside [0, 1]
    /// wrap, which spherical mapping relies on at the seam.
    pub fn from_image(gpu: &GpuContext, pixels: &RgbaImage, label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let (width, height) = pixels.dimensions();
        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            pixels.as_raw(),
        );

        let wrap = wgpu::AddressMode::Repeat;
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label} Sampler")),
            address_mode_u: wrap,
            address_mode_v: wrap,
            address_mode_w: wrap,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            sampler,
        }
    }

    pub fn from_file(gpu: &GpuContext, path: impl AsRef<Path>) -> Result<Self, image::ImageError> {
        let path = path.as_ref();
        let pixels = decode(path)?;
        Ok(Self::from_image(gpu, &pixels, &path.display().to_string()))
    }

    pub fn white(gpu: &GpuContext) -> Self {
        Self::from_image(gpu, &white_pixel(), "White Texture")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png_pixels() {
        let path = std::env::temp_dir().join(format!("skylit-texture-{}.png", std::process::id()));
        let mut source = RgbaImage::new(3, 2);
        source.put_pixel(2, 1, Rgba([10, 20, 30, 255]));
        source.save(&path).unwrap();

        let decoded = decode(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1), &Rgba([10, 20, 30, 255]));
        assert_eq!(decoded.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(decode("no/such/texture.png").is_err());
    }

    #[test]
    fn white_pixel_is_one_opaque_white_texel() {
        let pixel = white_pixel();
        assert_eq!(pixel.dimensions(), (1, 1));
        assert_eq!(pixel.as_raw(), &vec![255u8; 4]);
    }
}
