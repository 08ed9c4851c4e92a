use num_enum::{FromPrimitive, IntoPrimitive};

#[derive(Debug, PartialEq, Clone, Copy, IntoPrimitive, FromPrimitive)]
#[repr(u16)]
pub enum PhotometricInterpretation {
    WhiteIsZero = 0,
    BlackIsZero = 1,
    RGB = 2,
    RGBPalette = 3,
    TransparencyMask = 4,
    CMYK = 5,
    YCbCr = 6,

    #[num_enum(default)]
    Unknown = 0xFFFF,
}

#[derive(Debug, PartialEq, Clone, Copy, IntoPrimitive, FromPrimitive)]
#[repr(u16)]
pub enum SampleFormat {
    Unsigned = 1,
    Signed = 2,
    Float = 3,
    Undefined = 4,

    #[num_enum(default)]
    Unknown = 0xFFFF,
}

#[derive(Debug, PartialEq, Clone, Copy, IntoPrimitive, FromPrimitive)]
#[repr(u16)]
pub enum PlanarConfiguration {
    Chunky = 1,
    Planar = 2,

    #[num_enum(default)]
    Unknown = 0xFFFF,
}

#[derive(Debug, PartialEq, Clone, Copy, IntoPrimitive, FromPrimitive)]
#[repr(u16)]
pub enum ExtraSamples {
    Unspecified = 0,
    AssociatedAlpha = 1,
    UnassociatedAlpha = 2,

    #[num_enum(default)]
    Unknown = 0xFFFF,
}

/// Element type of a decoded pixel array
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DataType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
}

impl DataType {
    pub const fn bits(&self) -> u16 {
        match self {
            DataType::UInt8 | DataType::Int8 => 8,
            DataType::UInt16 | DataType::Int16 => 16,
            DataType::UInt32 | DataType::Int32 | DataType::Float32 => 32,
            DataType::Float64 => 64,
        }
    }

    pub const fn bytes(&self) -> usize {
        self.bits() as usize / 8
    }

    pub const fn sample_format(&self) -> SampleFormat {
        match self {
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 => SampleFormat::Unsigned,
            DataType::Int8 | DataType::Int16 | DataType::Int32 => SampleFormat::Signed,
            DataType::Float32 | DataType::Float64 => SampleFormat::Float,
        }
    }

    pub fn from_format(bits: u16, format: SampleFormat) -> Option<Self> {
        Some(match (bits, format) {
            (8, SampleFormat::Unsigned) => DataType::UInt8,
            (8, SampleFormat::Signed) => DataType::Int8,
            (16, SampleFormat::Unsigned) => DataType::UInt16,
            (16, SampleFormat::Signed) => DataType::Int16,
            (32, SampleFormat::Unsigned) => DataType::UInt32,
            (32, SampleFormat::Signed) => DataType::Int32,
            (32, SampleFormat::Float) => DataType::Float32,
            (64, SampleFormat::Float) => DataType::Float64,
            _ => return None,
        })
    }
}
