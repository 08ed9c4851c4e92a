use num_traits::NumCast;

use super::{Endian, Tag, TagData, TagId, TagType, TiffError, TiffVariant};
use std::io::{self, Read, Seek, SeekFrom};

#[derive(Clone, Debug, Default)]
pub struct Ifd(pub Vec<Tag>);

impl Ifd {
    pub fn new() -> Self {
        Self(vec![])
    }

    pub fn parse<R: Read + Seek>(
        stream: &mut R,
        offset: u64,
        endian: Endian,
        variant: TiffVariant,
    ) -> io::Result<(Ifd, u64)> {
        // IFD starts at offset
        stream.seek(SeekFrom::Start(offset))?;

        // IFD header is just the number of tags
        let tag_count = match variant {
            TiffVariant::Normal => endian.read::<2, u16>(stream)? as u64,
            TiffVariant::Big => endian.read(stream)?,
        };

        // Parse each tag in the IFD
        let mut tags = Vec::with_capacity(tag_count as usize);
        for _ in 0..tag_count {
            let code = endian.read(stream)?;
            let datatype: TagType = endian.read::<2, u16>(stream)?.into();
            let count = variant.read_offset(endian, stream)? as usize;

            let data_size = count * datatype.size_in_bytes();
            let offset_size = variant.offset_bytesize();
            let mut data: Vec<u8> = vec![0; data_size.max(offset_size)];

            if data_size > offset_size {
                let data_offset = variant.read_offset(endian, stream)?;
                let pos = stream.stream_position()?;
                stream.seek(SeekFrom::Start(data_offset))?;
                stream.read_exact(&mut data)?;
                stream.seek(SeekFrom::Start(pos))?;
            } else {
                stream.read_exact(&mut data)?;
                data.truncate(data_size);
            }

            tags.push(Tag {
                code,
                datatype,
                endian,
                count,
                data,
            });
        }

        let ifd = Ifd(tags);
        let next_ifd_offset = variant.read_offset(endian, stream)?;

        Ok((ifd, next_ifd_offset))
    }

    pub fn get_tag_by_code(&self, code: u16) -> Option<&Tag> {
        let Self(tags) = &self;
        tags.iter().find(|tag| tag.code == code)
    }

    pub fn get_tag(&self, id: TagId) -> Result<&Tag, TiffError> {
        self.get_tag_by_code(id.into())
            .ok_or(TiffError::MissingTag(id))
    }

    pub fn get_tag_values<T: NumCast>(&self, id: TagId) -> Result<Vec<T>, TiffError> {
        self.get_tag(id)?.values().ok_or(TiffError::BadTag(id))
    }

    pub fn get_tag_value<T: NumCast + Copy>(&self, id: TagId) -> Result<T, TiffError> {
        self.get_tag(id)?.value().ok_or(TiffError::BadTag(id))
    }

    /// Insert or replace a tag, keeping entries sorted by code as TIFF requires
    pub fn set_tag(&mut self, id: TagId, data: TagData, endian: Endian) {
        let tag = Tag::new(id, data, endian);
        let Self(tags) = self;
        match tags.binary_search_by_key(&tag.code, |t| t.code) {
            Ok(index) => tags[index] = tag,
            Err(index) => tags.insert(index, tag),
        }
    }

    /// Serialize this IFD as it would appear at `offset` in the file.
    ///
    /// Values that do not fit in an entry are written directly after the
    /// entry table, so the encoded length does not depend on `offset`.
    pub fn encode(
        &self,
        offset: u64,
        next_ifd_offset: u64,
        endian: Endian,
        variant: TiffVariant,
    ) -> Vec<u8> {
        let Self(tags) = self;
        let offset_size = variant.offset_bytesize();
        let (count_size, entry_size) = match variant {
            TiffVariant::Normal => (2, 12),
            TiffVariant::Big => (8, 20),
        };
        let table_size = count_size + tags.len() * entry_size + offset_size;

        let mut table = Vec::with_capacity(table_size);
        let mut overflow: Vec<u8> = vec![];

        match variant {
            TiffVariant::Normal => table.extend(endian.encode(tags.len() as u16)),
            TiffVariant::Big => table.extend(endian.encode(tags.len() as u64)),
        }

        for tag in tags {
            table.extend(endian.encode(tag.code));
            let datatype: u16 = tag.datatype.into();
            table.extend(endian.encode(datatype));
            table.extend(variant.encode_offset(endian, tag.count as u64));
            if tag.data.len() <= offset_size {
                let mut inline = tag.data.clone();
                inline.resize(offset_size, 0);
                table.extend(inline);
            } else {
                let data_offset = offset + (table_size + overflow.len()) as u64;
                table.extend(variant.encode_offset(endian, data_offset));
                overflow.extend(&tag.data);
                // Word alignment for the next value
                if overflow.len() % 2 == 1 {
                    overflow.push(0);
                }
            }
        }
        table.extend(variant.encode_offset(endian, next_ifd_offset));

        table.extend(overflow);
        table
    }

    pub fn encoded_len(&self, endian: Endian, variant: TiffVariant) -> u64 {
        self.encode(0, 0, endian, variant).len() as u64
    }
}
