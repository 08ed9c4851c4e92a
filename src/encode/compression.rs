// https://en.wikipedia.org/wiki/TIFF#TIFF_Compression_Tag

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use num_enum::{FromPrimitive, IntoPrimitive};
use std::io::{self, Read, Write};

#[derive(Debug, PartialEq, Clone, Copy, IntoPrimitive, FromPrimitive)]
#[repr(u16)]
pub enum Compression {
    Uncompressed = 1,
    DeflateAdobe = 8,

    #[num_enum(default)]
    Unknown = 0x0000,
}

impl Default for Compression {
    fn default() -> Self {
        Self::DeflateAdobe
    }
}

impl Compression {
    pub fn encode(&self, bytes: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            Self::Uncompressed => Ok(bytes.to_vec()),
            Self::DeflateAdobe => {
                let mut encoder = ZlibEncoder::new(vec![], flate2::Compression::default());
                encoder.write_all(bytes)?;
                encoder.finish()
            }
            other => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("Compression not supported: {other:?}"),
            )),
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            Self::Uncompressed => Ok(bytes.to_vec()),
            Self::DeflateAdobe => {
                let mut buf = vec![];
                ZlibDecoder::new(bytes).read_to_end(&mut buf)?;
                Ok(buf)
            }
            other => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("Compression not supported: {other:?}"),
            )),
        }
    }
}
