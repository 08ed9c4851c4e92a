use crate::tiff::Endian;
use std::fmt::Display;

mod image;
mod ops;
mod photometrics;

pub use photometrics::{
    DataType, ExtraSamples, PhotometricInterpretation, PlanarConfiguration, SampleFormat,
};

#[derive(Debug)]
pub enum RasterError {
    BufferSize((usize, (u32, u32), Vec<u16>)),
    NotSupported(String),
}

/// Interleaved (chunky) pixel buffer
#[derive(Clone, Debug)]
pub struct Raster {
    pub dimensions: (u32, u32),
    pub buffer: Vec<u8>,
    pub bits_per_sample: Vec<u16>,
    pub interpretation: PhotometricInterpretation,
    pub sample_format: Vec<SampleFormat>,
    pub extra_samples: Vec<ExtraSamples>,
    pub endian: Endian,
    bits_per_pixel: u32, // calculated from bits_per_sample and cached
}

impl Raster {
    pub fn new(
        dimensions: (u32, u32),
        buffer: Vec<u8>,
        bits_per_sample: Vec<u16>,
        interpretation: PhotometricInterpretation,
        sample_format: Vec<SampleFormat>,
        extra_samples: Vec<ExtraSamples>,
        endian: Endian,
    ) -> Result<Self, RasterError> {
        let bits_per_pixel = bits_per_sample.iter().map(|b| *b as u32).sum::<u32>();
        let required_bytes =
            dimensions.0 as usize * dimensions.1 as usize * bits_per_pixel as usize / 8;
        if buffer.len() != required_bytes {
            Err(RasterError::BufferSize((
                buffer.len(),
                dimensions,
                bits_per_sample,
            )))
        } else {
            Ok(Self {
                dimensions,
                buffer,
                bits_per_sample,
                interpretation,
                sample_format,
                extra_samples,
                endian,
                bits_per_pixel,
            })
        }
    }

    /// Native-endian raster of `bands` samples of `data_type` per pixel.
    ///
    /// Three or four bands are read as RGB(A), anything else as grey plus
    /// unspecified extra samples.
    pub fn from_samples(
        dimensions: (u32, u32),
        bands: u16,
        data_type: DataType,
        buffer: Vec<u8>,
    ) -> Result<Self, RasterError> {
        if bands == 0 {
            return Err(RasterError::NotSupported("Raster has no bands".into()));
        }
        let (interpretation, extra_samples) = match bands {
            3 => (PhotometricInterpretation::RGB, vec![]),
            4 => (
                PhotometricInterpretation::RGB,
                vec![ExtraSamples::UnassociatedAlpha],
            ),
            n => (
                PhotometricInterpretation::BlackIsZero,
                vec![ExtraSamples::Unspecified; n as usize - 1],
            ),
        };
        Self::new(
            dimensions,
            buffer,
            vec![data_type.bits(); bands as usize],
            interpretation,
            vec![data_type.sample_format(); bands as usize],
            extra_samples,
            Endian::native(),
        )
    }

    pub fn width(&self) -> u32 {
        self.dimensions.0
    }

    pub fn height(&self) -> u32 {
        self.dimensions.1
    }

    pub fn bands(&self) -> usize {
        self.bits_per_sample.len()
    }

    /// Common sample type, None for mixed or non byte aligned samples
    pub fn data_type(&self) -> Option<DataType> {
        let bits = *self.bits_per_sample.first()?;
        let format = *self.sample_format.first().unwrap_or(&SampleFormat::Unsigned);
        let uniform = self.bits_per_sample.iter().all(|b| *b == bits)
            && self.sample_format.iter().all(|f| *f == format);
        if uniform {
            DataType::from_format(bits, format)
        } else {
            None
        }
    }

    fn bytes_per_pixel(&self) -> Result<usize, RasterError> {
        if self.bits_per_pixel % 8 != 0 {
            return Err(RasterError::NotSupported(format!(
                "Pixel is not byte aligned: {} bits",
                self.bits_per_pixel
            )));
        }
        Ok((self.bits_per_pixel / 8) as usize)
    }

    fn row_size(&self) -> usize {
        (self.dimensions.0 as usize * self.bits_per_pixel as usize).div_ceil(8)
    }
}

impl Display for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Raster({}x{}, {:?}, {:?}, {}Bytes, {:?} Endian)",
            self.dimensions.0,
            self.dimensions.1,
            self.bits_per_sample,
            self.interpretation,
            self.buffer.len(),
            self.endian
        )
    }
}
