// https://docs.ogc.org/is/19-008r4/19-008r4.html#_requirements_class_geokeydirectorytag

use std::fmt::Display;

use super::{GeoKeyId, GeoKeyValue, GeoTiffError};
use crate::tiff::{Endian, Ifd, TagData, TagId, TagType};

#[derive(Clone, Debug)]
pub struct GeoKeyDirectory {
    pub version: u16,
    pub revision: (u16, u16),
    pub keys: Vec<GeoKey>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeoKey {
    pub code: u16,
    pub value: GeoKeyValue,
}

impl GeoKey {
    pub fn id(&self) -> Option<GeoKeyId> {
        GeoKeyId::try_from(self.code).ok()
    }
}

impl Default for GeoKeyDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoKeyDirectory {
    pub fn new() -> Self {
        Self {
            version: 1,
            revision: (1, 0),
            keys: vec![],
        }
    }

    pub fn get(&self, id: GeoKeyId) -> Option<&GeoKeyValue> {
        let code: u16 = id.into();
        self.keys
            .iter()
            .find(|key| key.code == code)
            .map(|key| &key.value)
    }

    pub fn parse(ifd: &Ifd) -> Result<Self, GeoTiffError> {
        // Directory is a tiff tag
        let directory_values: Vec<u16> = ifd
            .get_tag_values(TagId::GeoKeyDirectory)
            .map_err(|_| GeoTiffError::MissingTag(TagId::GeoKeyDirectory))?;

        // Directory size validation
        if directory_values.len() < 4 {
            return Err(GeoTiffError::BadTag(TagId::GeoKeyDirectory));
        }

        // Directory header
        let version: u16 = directory_values[0];
        let revision: u16 = directory_values[1];
        let minor_revision: u16 = directory_values[2];
        let key_count: u16 = directory_values[3];

        // Directory size validation
        let min_valid_directory_size = 4 + key_count as usize * 4;
        if directory_values.len() < min_valid_directory_size {
            return Err(GeoTiffError::BadTag(TagId::GeoKeyDirectory));
        }

        // Parse keys
        let keys: Vec<GeoKey> = (0..key_count as usize)
            .map(|i| {
                let entry_offset = (i + 1) * 4;
                let code = directory_values[entry_offset];
                let location = directory_values[entry_offset + 1];
                let count = directory_values[entry_offset + 2];
                let offset = directory_values[entry_offset + 3];

                let value = if location == 0 {
                    GeoKeyValue::Short(vec![offset])
                } else {
                    let start = offset as usize;
                    let end = start + count as usize;
                    ifd.get_tag_by_code(location)
                        .and_then(|tag| match tag.datatype {
                            TagType::Ascii => tag.data.get(start..end).map(|bytes| {
                                GeoKeyValue::Ascii(
                                    String::from_utf8_lossy(bytes)
                                        .trim_end_matches(['|', '\0'])
                                        .to_string(),
                                )
                            }),
                            TagType::Short => tag
                                .values()
                                .and_then(|v: Vec<u16>| v.get(start..end).map(<[u16]>::to_vec))
                                .map(GeoKeyValue::Short),
                            TagType::Double => tag
                                .values()
                                .and_then(|v: Vec<f64>| v.get(start..end).map(<[f64]>::to_vec))
                                .map(GeoKeyValue::Double),
                            _ => None,
                        })
                        .unwrap_or(GeoKeyValue::Undefined)
                };

                GeoKey { code, value }
            })
            .collect();

        Ok(Self {
            version,
            revision: (revision, minor_revision),
            keys,
        })
    }

    pub fn add_to_ifd(&self, ifd: &mut Ifd, endian: Endian) {
        let (key_directory, ascii_params, double_params) = self.unparse();
        ifd.set_tag(
            TagId::GeoKeyDirectory,
            TagData::Short(key_directory),
            endian,
        );
        if !ascii_params.is_empty() {
            ifd.set_tag(
                TagId::GeoAsciiParams,
                TagData::from_string(&ascii_params),
                endian,
            );
        }
        if !double_params.is_empty() {
            ifd.set_tag(
                TagId::GeoDoubleParams,
                TagData::Double(double_params),
                endian,
            );
        }
    }

    /// Flatten into (GeoKeyDirectory, GeoAsciiParams, GeoDoubleParams) values
    pub fn unparse(&self) -> (Vec<u16>, String, Vec<f64>) {
        let mut directory = vec![];
        let mut shorts = vec![];
        let mut asciis = String::new();
        let mut doubles = vec![];
        let dir_size = 4 * (self.keys.len() + 1) as u16;

        // Keys must be written in ascending order
        let mut keys: Vec<&GeoKey> = self.keys.iter().collect();
        keys.sort_by_key(|key| key.code);

        // Directory header
        directory.push(self.version);
        directory.push(self.revision.0);
        directory.push(self.revision.1);
        directory.push(keys.len() as u16);

        for key in keys {
            directory.push(key.code);

            match &key.value {
                GeoKeyValue::Short(vec) => match vec.len() {
                    0 => directory.extend([0, 0, 0]),
                    1 => directory.extend([0, 1, vec[0]]),
                    n => {
                        directory.push(TagId::GeoKeyDirectory.into());
                        directory.push(n as u16);
                        directory.push(dir_size + shorts.len() as u16);
                        shorts.extend(vec);
                    }
                },
                GeoKeyValue::Ascii(s) => {
                    // Each ascii value is terminated by a pipe
                    directory.push(TagId::GeoAsciiParams.into());
                    directory.push(s.len() as u16 + 1);
                    directory.push(asciis.len() as u16);
                    asciis.push_str(s);
                    asciis.push('|');
                }
                GeoKeyValue::Double(vec) => {
                    directory.push(TagId::GeoDoubleParams.into());
                    directory.push(vec.len() as u16);
                    directory.push(doubles.len() as u16);
                    doubles.extend(vec);
                }
                GeoKeyValue::Undefined => directory.extend([0, 0, 0]),
            }
        }

        ([directory, shorts].concat(), asciis, doubles)
    }
}

impl Display for GeoKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id_string = match self.id() {
            Some(id) => format!("{id:?}"),
            None => format!("0x{:04X}", self.code),
        };
        write!(f, "{}: {}", id_string, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparse_sorts_keys_and_pipes_ascii() {
        let mut directory = GeoKeyDirectory::new();
        directory.keys.push(GeoKey {
            code: GeoKeyId::GeographicTypeGeoKey.into(),
            value: GeoKeyValue::short(4326),
        });
        directory.keys.push(GeoKey {
            code: GeoKeyId::GTCitationGeoKey.into(),
            value: GeoKeyValue::Ascii("WGS 84".into()),
        });

        let (shorts, ascii, doubles) = directory.unparse();
        assert_eq!(&shorts[..4], &[1, 1, 0, 2]);
        assert_eq!(&shorts[4..8], &[1026, 0x87B1, 7, 0]);
        assert_eq!(&shorts[8..12], &[2048, 0, 1, 4326]);
        assert_eq!(ascii, "WGS 84|");
        assert!(doubles.is_empty());
    }

    #[test]
    fn round_trips_through_an_ifd() {
        let mut directory = GeoKeyDirectory::new();
        directory.keys.push(GeoKey {
            code: GeoKeyId::GTCitationGeoKey.into(),
            value: GeoKeyValue::Ascii("drone".into()),
        });
        directory.keys.push(GeoKey {
            code: 4096,
            value: GeoKeyValue::Double(vec![0.5]),
        });

        let mut ifd = Ifd::new();
        directory.add_to_ifd(&mut ifd, Endian::Little);
        let parsed = GeoKeyDirectory::parse(&ifd).unwrap();

        assert_eq!(
            parsed.get(GeoKeyId::GTCitationGeoKey),
            Some(&GeoKeyValue::Ascii("drone".into()))
        );
        assert_eq!(parsed.keys[1].value, GeoKeyValue::Double(vec![0.5]));
    }
}
