use crate::georef::AffineTransform;
use crate::geotags::GeoTags;
use crate::raster::{PlanarConfiguration, Raster};
use crate::tiff::{TagData, TagId, Tiff, TiffVariant};
use std::collections::BTreeMap;
use std::io::Write;
use tracing::*;

mod compression;
mod error;

pub use compression::Compression;
pub use error::{EncodeError, EncodeResult};

pub const DEFAULT_TILE_SIZE: u16 = 512;

/// Tiled GeoTIFF writer laid out as a Cloud Optimized GeoTIFF.
///
/// All IFDs come first, followed by tile data from the smallest overview to
/// the full resolution image.
#[derive(Debug, Clone)]
pub struct Encoder {
    raster: Raster,
    geo_tags: Option<GeoTags>,
    variant: TiffVariant,
    compression: Compression,
    tile_size: u16,
    overviews: bool,
    nodata: Option<f64>,
    metadata: BTreeMap<String, String>,
}

impl Encoder {
    pub fn from_raster(raster: Raster) -> Self {
        Self {
            raster,
            geo_tags: None,
            variant: TiffVariant::Normal,
            compression: Compression::DeflateAdobe,
            tile_size: DEFAULT_TILE_SIZE,
            overviews: true,
            nodata: None,
            metadata: BTreeMap::new(),
        }
    }

    #[cfg(feature = "image")]
    pub fn from_image(img: &image::DynamicImage) -> EncodeResult<Self> {
        Ok(Self::from_raster(Raster::from_image(img)?))
    }

    pub fn with_geo_tags(mut self, geo_tags: GeoTags) -> Self {
        self.geo_tags = Some(geo_tags);
        self
    }

    /// Georeference with a pixel to map transform in the `epsg` system.
    ///
    /// North up transforms are written as tiepoint and pixel scale, anything
    /// else as a full model transformation.
    pub fn with_transform(self, epsg: u16, transform: &AffineTransform) -> Self {
        let geo_tags = if transform.is_north_up() {
            GeoTags::from_tiepoint_and_scale(
                [0.0, 0.0, 0.0, transform.c, transform.f, 0.0],
                [transform.a, -transform.e, 0.0],
            )
        } else {
            GeoTags::from_transformation(transform.to_model_transformation())
        };
        self.with_geo_tags(geo_tags.with_epsg(epsg))
    }

    pub fn with_tile_size(mut self, pixels: u16) -> Self {
        self.tile_size = pixels;
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_overviews(mut self, overviews: bool) -> Self {
        self.overviews = overviews;
        self
    }

    pub fn with_big_tiff(mut self, big: bool) -> Self {
        self.variant = if big {
            TiffVariant::Big
        } else {
            TiffVariant::Normal
        };
        self
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    /// Dimensions of every level, full resolution first
    pub fn level_dimensions(&self) -> Vec<(u32, u32)> {
        let tile_size = self.tile_size as u32;
        let mut levels = vec![self.raster.dimensions];
        if !self.overviews {
            return levels;
        }
        let mut dims = self.raster.dimensions;
        while dims.0 > tile_size || dims.1 > tile_size {
            dims = (dims.0.div_ceil(2), dims.1.div_ceil(2));
            levels.push(dims);
        }
        levels
    }

    pub fn encode_to_vec(&self) -> EncodeResult<Vec<u8>> {
        let mut buf = vec![];
        self.encode(&mut buf)?;
        Ok(buf)
    }

    pub fn encode<W: Write>(&self, writer: &mut W) -> EncodeResult<()> {
        if self.tile_size == 0 || self.tile_size % 16 != 0 {
            return Err(EncodeError::BadTileSize(self.tile_size));
        }
        let endian = self.raster.endian;
        let variant = self.variant;

        // Tile data for every level
        let levels = self.level_dimensions();
        let overviews = levels
            .iter()
            .skip(1)
            .map(|(width, height)| self.raster.resize(*width, *height))
            .collect::<Result<Vec<_>, _>>()?;
        let tiles = std::iter::once(&self.raster)
            .chain(overviews.iter())
            .map(|raster| self.compress_tiles(raster))
            .collect::<EncodeResult<Vec<_>>>()?;

        // IFDs with placeholder offsets, all the same encoded size as the final ones
        let mut tiff = Tiff::new(endian, variant);
        for (level, level_tiles) in tiles.iter().enumerate() {
            let ifd_raster = if level == 0 {
                &self.raster
            } else {
                &overviews[level - 1]
            };
            if level > 0 {
                tiff.add_ifd();
            }
            self.set_level_tags(&mut tiff, level, ifd_raster, level_tiles);
        }

        // Layout: header, IFDs, then tiles smallest level first
        let ifd_sizes: Vec<u64> = tiff
            .ifds
            .iter()
            .map(|ifd| ifd.encoded_len(endian, variant))
            .collect();
        let header_size = variant.header_size();
        let mut offset = header_size + ifd_sizes.iter().sum::<u64>();
        let mut tile_offsets = vec![vec![]; tiles.len()];
        for (level, level_tiles) in tiles.iter().enumerate().rev() {
            for tile in level_tiles {
                tile_offsets[level].push(offset);
                offset += tile.len() as u64;
            }
        }
        if variant == TiffVariant::Normal && offset > u32::MAX as u64 {
            return Err(EncodeError::TooLarge(offset));
        }
        for (ifd, offsets) in tiff.ifds.iter_mut().zip(tile_offsets) {
            let data = match variant {
                TiffVariant::Normal => TagData::Long(offsets.iter().map(|o| *o as u32).collect()),
                TiffVariant::Big => TagData::Long8(offsets),
            };
            ifd.set_tag(TagId::TileOffsets, data, endian);
        }

        // Write
        writer.write_all(&tiff.header(header_size))?;
        let mut ifd_offset = header_size;
        for (i, ifd) in tiff.ifds.iter().enumerate() {
            let next_ifd_offset = if i + 1 < tiff.ifds.len() {
                ifd_offset + ifd_sizes[i]
            } else {
                0
            };
            writer.write_all(&ifd.encode(ifd_offset, next_ifd_offset, endian, variant))?;
            ifd_offset += ifd_sizes[i];
        }
        for level_tiles in tiles.iter().rev() {
            for tile in level_tiles {
                writer.write_all(tile)?;
            }
        }
        writer.flush()?;

        info!(
            "Encoded {} with {} levels, {} bytes",
            self.raster,
            levels.len(),
            offset
        );
        Ok(())
    }

    fn set_level_tags(&self, tiff: &mut Tiff, level: usize, raster: &Raster, tiles: &[Vec<u8>]) {
        let endian = tiff.endian;
        let variant = tiff.variant;
        let Some(ifd) = tiff.ifds.get_mut(level) else {
            return;
        };
        let placeholder = match variant {
            TiffVariant::Normal => TagData::Long(vec![0; tiles.len()]),
            TiffVariant::Big => TagData::Long8(vec![0; tiles.len()]),
        };
        let byte_counts = tiles.iter().map(|t| t.len() as u32).collect();
        let bands = raster.bits_per_sample.len() as u16;

        ifd.set_tag(
            TagId::NewSubfileType,
            TagData::from_long(if level == 0 { 0 } else { 1 }),
            endian,
        );
        ifd.set_tag(TagId::ImageWidth, TagData::from_long(raster.width()), endian);
        ifd.set_tag(TagId::ImageHeight, TagData::from_long(raster.height()), endian);
        ifd.set_tag(
            TagId::BitsPerSample,
            TagData::Short(raster.bits_per_sample.clone()),
            endian,
        );
        ifd.set_tag(
            TagId::Compression,
            TagData::from_short(self.compression.into()),
            endian,
        );
        ifd.set_tag(
            TagId::PhotometricInterpretation,
            TagData::from_short(raster.interpretation.into()),
            endian,
        );
        ifd.set_tag(TagId::SamplesPerPixel, TagData::from_short(bands), endian);
        ifd.set_tag(
            TagId::PlanarConfiguration,
            TagData::from_short(PlanarConfiguration::Chunky.into()),
            endian,
        );
        ifd.set_tag(TagId::TileWidth, TagData::from_short(self.tile_size), endian);
        ifd.set_tag(TagId::TileLength, TagData::from_short(self.tile_size), endian);
        ifd.set_tag(TagId::TileOffsets, placeholder, endian);
        ifd.set_tag(TagId::TileByteCounts, TagData::Long(byte_counts), endian);
        if !raster.extra_samples.is_empty() {
            let extra = raster.extra_samples.iter().map(|e| (*e).into()).collect();
            ifd.set_tag(TagId::ExtraSamples, TagData::Short(extra), endian);
        }
        let formats = raster.sample_format.iter().map(|f| (*f).into()).collect();
        ifd.set_tag(TagId::SampleFormat, TagData::Short(formats), endian);

        // Georeferencing and metadata live on the full resolution image only
        if level != 0 {
            return;
        }
        if let Some(geo_tags) = &self.geo_tags {
            geo_tags.add_to_ifd(ifd, endian);
        }
        if let Some(nodata) = self.nodata {
            ifd.set_tag(
                TagId::GDALNoData,
                TagData::from_string(&nodata.to_string()),
                endian,
            );
        }
        if !self.metadata.is_empty() {
            ifd.set_tag(
                TagId::GDALMetadata,
                TagData::from_string(&gdal_metadata_xml(&self.metadata)),
                endian,
            );
        }
        for (key, id) in [("DateTime", TagId::DateTime), ("Software", TagId::Software)] {
            if let Some(value) = self.metadata.get(key) {
                ifd.set_tag(id, TagData::from_string(value), endian);
            }
        }
    }

    fn tile_origins(&self, dimensions: (u32, u32)) -> Vec<(u32, u32)> {
        let tile_size = self.tile_size as u32;
        let across = dimensions.0.div_ceil(tile_size);
        let down = dimensions.1.div_ceil(tile_size);
        (0..down)
            .flat_map(|row| (0..across).map(move |col| (col * tile_size, row * tile_size)))
            .collect()
    }

    fn compress_tiles(&self, raster: &Raster) -> EncodeResult<Vec<Vec<u8>>> {
        let tile_size = (self.tile_size as u32, self.tile_size as u32);
        let compression = self.compression;
        let compress = |origin: (u32, u32)| -> EncodeResult<Vec<u8>> {
            let tile = raster.tile(origin, tile_size)?;
            compression
                .encode(&tile)
                .map_err(EncodeError::CompressionError)
        };

        let origins = self.tile_origins(raster.dimensions);
        debug!("Compressing {} tiles of {}", origins.len(), raster);

        #[cfg(feature = "async")]
        let tiles: EncodeResult<Vec<Vec<u8>>> = {
            use rayon::iter::{IntoParallelIterator, ParallelIterator};
            origins.into_par_iter().map(compress).collect()
        };
        #[cfg(not(feature = "async"))]
        let tiles: EncodeResult<Vec<Vec<u8>>> = origins.into_iter().map(compress).collect();
        tiles
    }
}

/// `GDAL_METADATA` dataset items
fn gdal_metadata_xml(metadata: &BTreeMap<String, String>) -> String {
    let mut xml = String::from("<GDALMetadata>\n");
    for (key, value) in metadata {
        xml.push_str(&format!(
            "  <Item name=\"{}\">{}</Item>\n",
            escape_xml(key),
            escape_xml(value)
        ));
    }
    xml.push_str("</GDALMetadata>");
    xml
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geotags::GeoModel;
    use crate::raster::DataType;
    use std::io::Cursor;

    fn gradient(width: u32, height: u32) -> Raster {
        let buffer = (0..width * height)
            .flat_map(|i| [(i % 251) as u8, (i / 7 % 256) as u8, 9])
            .collect();
        Raster::from_samples((width, height), 3, DataType::UInt8, buffer).unwrap()
    }

    #[test]
    fn overviews_halve_until_one_tile() {
        let encoder = Encoder::from_raster(gradient(1200, 700)).with_tile_size(256);
        assert_eq!(
            encoder.level_dimensions(),
            vec![(1200, 700), (600, 350), (300, 175), (150, 88)]
        );
        let single = Encoder::from_raster(gradient(100, 50)).with_tile_size(256);
        assert_eq!(single.level_dimensions(), vec![(100, 50)]);
        assert_eq!(
            Encoder::from_raster(gradient(1200, 700))
                .with_overviews(false)
                .level_dimensions()
                .len(),
            1
        );
    }

    #[test]
    fn written_file_parses_back() {
        for big in [false, true] {
            let transform = AffineTransform::new(1e-5, 0.0, -4.0, 0.0, -1e-5, 5.4);
            let bytes = Encoder::from_raster(gradient(100, 60))
                .with_tile_size(32)
                .with_big_tiff(big)
                .with_transform(4326, &transform)
                .with_nodata(1.0)
                .encode_to_vec()
                .unwrap();

            let tiff = Tiff::open(&mut Cursor::new(&bytes)).unwrap();
            assert_eq!(tiff.ifds.len(), 3);
            let ifd0 = tiff.ifd0().unwrap();
            assert_eq!(ifd0.get_tag_value::<u32>(TagId::ImageWidth).unwrap(), 100);
            assert_eq!(ifd0.get_tag_value::<u32>(TagId::ImageHeight).unwrap(), 60);
            assert_eq!(
                ifd0.get_tag(TagId::GDALNoData).unwrap().try_to_string().as_deref(),
                Some("1")
            );

            let geo = GeoTags::parse(ifd0).unwrap();
            assert_eq!(geo.epsg(), Some(4326));
            assert!(matches!(geo.model, GeoModel::Scaled(_)));

            let overview = &tiff.ifds[1];
            assert_eq!(overview.get_tag_value::<u32>(TagId::NewSubfileType).unwrap(), 1);
            assert_eq!(overview.get_tag_value::<u32>(TagId::ImageWidth).unwrap(), 50);
        }
    }

    #[test]
    fn tiles_decode_to_source_pixels() {
        let raster = gradient(40, 20);
        let bytes = Encoder::from_raster(raster.clone())
            .with_tile_size(16)
            .encode_to_vec()
            .unwrap();
        let tiff = Tiff::open(&mut Cursor::new(&bytes)).unwrap();
        let ifd0 = tiff.ifd0().unwrap();
        let offsets = ifd0.get_tag_values::<u64>(TagId::TileOffsets).unwrap();
        let counts = ifd0.get_tag_values::<u64>(TagId::TileByteCounts).unwrap();
        assert_eq!(offsets.len(), 3 * 2);

        // Second tile of the first row starts at pixel (16, 0)
        let (start, len) = (offsets[1] as usize, counts[1] as usize);
        let tile = Compression::DeflateAdobe
            .decode(&bytes[start..start + len])
            .unwrap();
        assert_eq!(tile, raster.tile((16, 0), (16, 16)).unwrap());

        // Full resolution tiles come last
        let last_overview = tiff.ifds.last().unwrap();
        let overview_offset = last_overview.get_tag_values::<u64>(TagId::TileOffsets).unwrap()[0];
        assert!(overview_offset < offsets[0]);
    }

    #[test]
    fn rotated_transform_uses_model_transformation() {
        let transform = AffineTransform::new(1e-5, 2e-6, -4.0, 2e-6, -1e-5, 5.4);
        let mut metadata = BTreeMap::new();
        metadata.insert("Model".to_string(), "ILCE-6000".to_string());
        let bytes = Encoder::from_raster(gradient(20, 20))
            .with_tile_size(16)
            .with_compression(Compression::Uncompressed)
            .with_transform(4326, &transform)
            .with_metadata(metadata)
            .encode_to_vec()
            .unwrap();

        let tiff = Tiff::open(&mut Cursor::new(&bytes)).unwrap();
        let ifd0 = tiff.ifd0().unwrap();
        let geo = GeoTags::parse(ifd0).unwrap();
        match geo.model {
            GeoModel::Transformed(model) => {
                assert_eq!(model.transformation, transform.to_model_transformation())
            }
            other => panic!("Expected a model transformation, got {other:?}"),
        }
        let xml = ifd0.get_tag(TagId::GDALMetadata).unwrap().try_to_string().unwrap();
        assert!(xml.contains("<Item name=\"Model\">ILCE-6000</Item>"));
    }

    #[test]
    fn rejects_odd_tile_sizes() {
        let result = Encoder::from_raster(gradient(20, 20))
            .with_tile_size(100)
            .encode_to_vec();
        assert!(matches!(result, Err(EncodeError::BadTileSize(100))));
    }

    #[test]
    fn escapes_metadata() {
        let mut metadata = BTreeMap::new();
        metadata.insert("a&b".to_string(), "<1>".to_string());
        assert_eq!(
            gdal_metadata_xml(&metadata),
            "<GDALMetadata>\n  <Item name=\"a&amp;b\">&lt;1&gt;</Item>\n</GDALMetadata>"
        );
    }
}
