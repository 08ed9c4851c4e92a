#![cfg(feature = "image")]

use super::{DataType, Raster, RasterError};
use image::{DynamicImage, ImageBuffer};

impl TryFrom<Raster> for DynamicImage {
    type Error = RasterError;

    fn try_from(raster: Raster) -> Result<Self, Self::Error> {
        let (width, height) = raster.dimensions;
        let data_type = raster.data_type();
        let bands = raster.bands();
        let Raster { buffer, endian, .. } = raster;

        match (data_type, bands) {
            (Some(DataType::UInt8), 1) => {
                ImageBuffer::from_raw(width, height, buffer).map(DynamicImage::ImageLuma8)
            }
            (Some(DataType::UInt8), 2) => {
                ImageBuffer::from_raw(width, height, buffer).map(DynamicImage::ImageLumaA8)
            }
            (Some(DataType::UInt8), 3) => {
                ImageBuffer::from_raw(width, height, buffer).map(DynamicImage::ImageRgb8)
            }
            (Some(DataType::UInt8), 4) => {
                ImageBuffer::from_raw(width, height, buffer).map(DynamicImage::ImageRgba8)
            }
            (Some(DataType::UInt16), 1) => endian.decode_all(&buffer).and_then(|buffer| {
                ImageBuffer::from_raw(width, height, buffer).map(DynamicImage::ImageLuma16)
            }),
            (Some(DataType::UInt16), 3) => endian.decode_all(&buffer).and_then(|buffer| {
                ImageBuffer::from_raw(width, height, buffer).map(DynamicImage::ImageRgb16)
            }),
            (Some(DataType::UInt16), 4) => endian.decode_all(&buffer).and_then(|buffer| {
                ImageBuffer::from_raw(width, height, buffer).map(DynamicImage::ImageRgba16)
            }),
            (Some(DataType::Float32), 3) => endian.decode_all(&buffer).and_then(|buffer| {
                ImageBuffer::from_raw(width, height, buffer).map(DynamicImage::ImageRgb32F)
            }),
            _ => None,
        }
        .ok_or(RasterError::NotSupported(format!(
            "{bands} bands of {data_type:?} as an image"
        )))
    }
}

impl Raster {
    pub fn into_image(self) -> Result<DynamicImage, RasterError> {
        self.try_into()
    }

    pub fn from_image(img: &DynamicImage) -> Result<Self, RasterError> {
        let dimensions = (img.width(), img.height());

        let (bands, data_type) = match img {
            DynamicImage::ImageLuma8(_) => (1, DataType::UInt8),
            DynamicImage::ImageLumaA8(_) => (2, DataType::UInt8),
            DynamicImage::ImageRgb8(_) => (3, DataType::UInt8),
            DynamicImage::ImageRgba8(_) => (4, DataType::UInt8),
            DynamicImage::ImageLuma16(_) => (1, DataType::UInt16),
            DynamicImage::ImageLumaA16(_) => (2, DataType::UInt16),
            DynamicImage::ImageRgb16(_) => (3, DataType::UInt16),
            DynamicImage::ImageRgba16(_) => (4, DataType::UInt16),
            DynamicImage::ImageRgb32F(_) => (3, DataType::Float32),
            DynamicImage::ImageRgba32F(_) => (4, DataType::Float32),
            other => {
                return Err(RasterError::NotSupported(format!(
                    "Image color type {:?}",
                    other.color()
                )))
            }
        };

        // as_bytes is native endian
        Self::from_samples(dimensions, bands, data_type, img.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn rgb_image_round_trips() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(2, 1, Rgb([10, 20, 30]));
        let dynamic = DynamicImage::ImageRgb8(img);

        let raster = Raster::from_image(&dynamic).unwrap();
        assert_eq!(raster.bands(), 3);
        assert_eq!(raster.data_type(), Some(DataType::UInt8));

        let back = raster.into_image().unwrap();
        assert_eq!(back.to_rgb8().get_pixel(2, 1), &Rgb([10, 20, 30]));
    }
}
