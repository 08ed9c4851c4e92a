// refs
// https://web.archive.org/web/20220119170528/http://www.exif.org/Exif2-2.PDF
// https://www.awaresystems.be/imaging/tiff/specification/TIFF6.pdf

use super::Endian;
use num_enum::{FromPrimitive, IntoPrimitive};
use num_traits::NumCast;
use std::fmt::Display;

mod data;
mod id;

pub use data::TagData;
pub use id::TagId;

#[derive(Clone, Debug)]
pub struct Tag {
    pub code: u16,
    pub datatype: TagType,
    pub count: usize,
    pub data: Vec<u8>,
    pub endian: Endian,
}

impl Tag {
    pub fn new(id: TagId, data: TagData, endian: Endian) -> Self {
        Self {
            code: id.into(),
            datatype: data.tag_type(),
            count: data.len(),
            data: data.bytes(endian),
            endian,
        }
    }

    pub fn id(&self) -> Option<TagId> {
        TagId::try_from(self.code).ok()
    }

    /// Numeric values coerced into `T`, None if any value does not fit
    pub fn values<T: NumCast>(&self) -> Option<Vec<T>> {
        let endian = self.endian;
        let bytes = self.data.as_slice();
        match self.datatype {
            TagType::Byte | TagType::Ascii | TagType::Undefined => {
                endian.decode_all_to_primative::<1, u8, T>(bytes)
            }
            TagType::SByte => endian.decode_all_to_primative::<1, i8, T>(bytes),
            TagType::Short => endian.decode_all_to_primative::<2, u16, T>(bytes),
            TagType::SShort => endian.decode_all_to_primative::<2, i16, T>(bytes),
            TagType::Long | TagType::Ifd => endian.decode_all_to_primative::<4, u32, T>(bytes),
            TagType::SLong => endian.decode_all_to_primative::<4, i32, T>(bytes),
            TagType::Float => endian.decode_all_to_primative::<4, f32, T>(bytes),
            TagType::Double => endian.decode_all_to_primative::<8, f64, T>(bytes),
            TagType::Long8 | TagType::Ifd8 => endian.decode_all_to_primative::<8, u64, T>(bytes),
            TagType::SLong8 => endian.decode_all_to_primative::<8, i64, T>(bytes),
            TagType::Rational => endian
                .decode_all::<4, u32>(bytes)?
                .chunks_exact(2)
                .map(|pair| T::from(pair[0] as f64 / pair[1] as f64))
                .collect(),
            TagType::SRational => endian
                .decode_all::<4, i32>(bytes)?
                .chunks_exact(2)
                .map(|pair| T::from(pair[0] as f64 / pair[1] as f64))
                .collect(),
            TagType::Unknown => None,
        }
    }

    pub fn value<T: NumCast + Copy>(&self) -> Option<T> {
        self.values()?.first().copied()
    }

    pub fn try_to_string(&self) -> Option<String> {
        if self.datatype != TagType::Ascii {
            return None;
        }
        String::from_utf8(self.data.clone())
            .ok()
            .map(|s| s.trim_end_matches('\0').to_string())
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id_string = match self.id() {
            Some(id) => format!("{id:?}"),
            None => format!("Unknown({})", self.code),
        };
        let mut value_string = match self.try_to_string() {
            Some(s) => s.replace('\n', "\\n"),
            None => format!("{:?}", self.values::<f64>().unwrap_or_default()),
        };
        if value_string.len() > 100 {
            value_string = format!("{}...", &value_string[..98])
        }
        write!(
            f,
            "{} {:?}[{}]: {}",
            id_string, self.datatype, self.count, value_string
        )
    }
}

#[derive(Debug, PartialEq, Clone, Copy, IntoPrimitive, FromPrimitive)]
#[repr(u16)]
pub enum TagType {
    Byte = 1,
    Ascii = 2,
    Short = 3,
    Long = 4,
    Rational = 5,
    SByte = 6,
    Undefined = 7,
    SShort = 8,
    SLong = 9,
    SRational = 10,
    Float = 11,
    Double = 12,
    Ifd = 13,
    Long8 = 16,
    SLong8 = 17,
    Ifd8 = 18,

    #[num_enum(default)]
    Unknown = 0xFFFF,
}

impl TagType {
    pub fn size_in_bytes(&self) -> usize {
        match self {
            TagType::Byte => 1,
            TagType::Ascii => 1,
            TagType::Short => 2,
            TagType::Long => 4,
            TagType::Rational => 8,
            TagType::SByte => 1,
            TagType::Undefined => 1,
            TagType::SShort => 2,
            TagType::SLong => 4,
            TagType::SRational => 8,
            TagType::Float => 4,
            TagType::Double => 8,
            TagType::Ifd => 4,
            TagType::Long8 => 8,
            TagType::SLong8 => 8,
            TagType::Ifd8 => 8,

            TagType::Unknown => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_tags_are_nul_terminated() {
        let tag = Tag::new(TagId::Software, TagData::from_string("placecog"), Endian::Little);
        assert_eq!(tag.count, 9);
        assert_eq!(tag.try_to_string().as_deref(), Some("placecog"));
    }

    #[test]
    fn rational_values_are_divided() {
        let tag = Tag::new(
            TagId::ModelPixelScale,
            TagData::Rational(vec![(3, 2), (1, 4)]),
            Endian::Big,
        );
        assert_eq!(tag.values::<f64>(), Some(vec![1.5, 0.25]));
    }
}
