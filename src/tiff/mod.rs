use std::fmt::Display;
use std::io::{self, Read, Seek};

mod endian;
mod error;
mod ifd;
mod tag;

pub use endian::Endian;
pub use error::TiffError;
pub use ifd::Ifd;
pub use tag::{Tag, TagData, TagId, TagType};

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum TiffVariant {
    Normal,
    Big,
}

impl TiffVariant {
    fn read_offset<R: Read>(&self, endian: Endian, stream: &mut R) -> io::Result<u64> {
        match self {
            TiffVariant::Normal => endian.read::<4, u32>(stream).map(|v| v as u64),
            TiffVariant::Big => endian.read(stream),
        }
    }

    fn encode_offset(&self, endian: Endian, offset: u64) -> Vec<u8> {
        match self {
            TiffVariant::Normal => endian.encode(offset as u32).to_vec(),
            TiffVariant::Big => endian.encode(offset).to_vec(),
        }
    }

    pub const fn offset_bytesize(&self) -> usize {
        match self {
            TiffVariant::Normal => 4,
            TiffVariant::Big => 8,
        }
    }

    pub const fn header_size(&self) -> u64 {
        match self {
            TiffVariant::Normal => 8,
            TiffVariant::Big => 16,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Tiff {
    pub endian: Endian,
    pub variant: TiffVariant,
    pub ifds: Vec<Ifd>,
}

impl Tiff {
    pub fn new(endian: Endian, variant: TiffVariant) -> Self {
        Self {
            endian,
            variant,
            ifds: vec![Ifd::new()],
        }
    }

    pub fn add_ifd(&mut self) -> &mut Ifd {
        self.ifds.push(Ifd::new());
        let n = self.ifds.len();
        &mut self.ifds[n - 1]
    }

    pub fn ifd0(&self) -> Result<&Ifd, TiffError> {
        self.ifds.first().ok_or(TiffError::NoIfd0)
    }

    pub fn open<R: Read + Seek>(stream: &mut R) -> Result<Self, TiffError> {
        // TIFF Header
        let mut buf = [0; 4];
        stream.read_exact(&mut buf)?;

        let endian = match &buf[..2] {
            b"II" => Endian::Little,
            b"MM" => Endian::Big,
            _ => return Err(TiffError::BadMagicBytes),
        };

        let variant = match &buf[2..4] {
            b"\0*" | b"*\0" => TiffVariant::Normal,
            b"\0+" | b"+\0" => TiffVariant::Big,
            _ => return Err(TiffError::BadMagicBytes),
        };

        if TiffVariant::Big == variant {
            // BigTIFFs have 4 extra bytes in the header
            let _offset_bytesize: u16 = endian.read(stream)?; // 0x0008
            let _: u16 = endian.read(stream)?; // 0x0000
        }

        // IFDs
        let mut ifds = vec![];
        let mut ifd_offset = variant.read_offset(endian, stream)?;
        while ifd_offset != 0 {
            let (ifd, next_offset) = Ifd::parse(stream, ifd_offset, endian, variant)?;
            ifd_offset = next_offset;
            ifds.push(ifd);
        }

        Ok(Self {
            endian,
            variant,
            ifds,
        })
    }

    /// File header pointing at the first IFD
    pub fn header(&self, first_ifd_offset: u64) -> Vec<u8> {
        let endian = self.endian;
        let mut header = endian.magic().to_vec();
        match self.variant {
            TiffVariant::Normal => header.extend(endian.encode(42_u16)),
            TiffVariant::Big => {
                header.extend(endian.encode(43_u16));
                header.extend(endian.encode(8_u16));
                header.extend(endian.encode(0_u16));
            }
        }
        header.extend(self.variant.encode_offset(endian, first_ifd_offset));
        header
    }
}

impl Display for Tiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, ifd) in self.ifds.iter().enumerate() {
            writeln!(f, "IFD {i}:")?;
            for tag in ifd.0.iter() {
                writeln!(f, "\t{}", tag)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_sizes_match_variant() {
        for variant in [TiffVariant::Normal, TiffVariant::Big] {
            let tiff = Tiff::new(Endian::Little, variant);
            assert_eq!(tiff.header(8).len() as u64, variant.header_size());
        }
    }

    #[test]
    fn rejects_bad_magic() {
        let mut cursor = io::Cursor::new(b"XX*\0\0\0\0\0".to_vec());
        assert!(matches!(
            Tiff::open(&mut cursor),
            Err(TiffError::BadMagicBytes)
        ));
    }
}
