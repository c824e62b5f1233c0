//! Synthetic GeoTIFF files for tests.
//!
//! Written directly with the `tiff` encoder so that reader tests do not
//! depend on the workspace's own writer.

use std::io::Cursor;
use std::path::Path;

use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

/// Band-sequential sample data for a synthetic raster.
#[derive(Debug, Clone)]
pub enum Samples {
    U8(Vec<Vec<u8>>),
    U16(Vec<Vec<u16>>),
    I16(Vec<Vec<i16>>),
    F32(Vec<Vec<f32>>),
}

impl Samples {
    fn band_count(&self) -> usize {
        match self {
            Samples::U8(b) => b.len(),
            Samples::U16(b) => b.len(),
            Samples::I16(b) => b.len(),
            Samples::F32(b) => b.len(),
        }
    }

    fn bits(&self) -> u16 {
        match self {
            Samples::U8(_) => 8,
            Samples::U16(_) | Samples::I16(_) => 16,
            Samples::F32(_) => 32,
        }
    }

    /// TIFF SampleFormat: 1 unsigned, 2 signed, 3 float.
    fn sample_format(&self) -> u16 {
        match self {
            Samples::U8(_) | Samples::U16(_) => 1,
            Samples::I16(_) => 2,
            Samples::F32(_) => 3,
        }
    }

    /// Little-endian bytes of one pixel interleaved across bands, or zeros
    /// when the pixel lies in tile padding.
    fn pixel_bytes(&self, index: Option<usize>, out: &mut Vec<u8>) {
        macro_rules! push {
            ($bands:expr, $zero:expr) => {
                for band in $bands {
                    let v = index.map(|i| band[i]).unwrap_or($zero);
                    out.extend_from_slice(&v.to_le_bytes());
                }
            };
        }
        match self {
            Samples::U8(b) => push!(b, 0u8),
            Samples::U16(b) => push!(b, 0u16),
            Samples::I16(b) => push!(b, 0i16),
            Samples::F32(b) => push!(b, 0f32),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Layout {
    Strips { rows_per_strip: u32 },
    Tiles { tile_width: u32, tile_height: u32 },
}

/// Builder for small georeferenced TIFFs.
///
/// Defaults: EPSG:4326, origin (0, 0) at the top-left corner, 1x1 unit
/// pixels, one strip per 4 rows.
#[derive(Debug, Clone)]
pub struct GeoTiffBuilder {
    width: u32,
    height: u32,
    samples: Samples,
    origin: (f64, f64),
    pixel_size: (f64, f64),
    epsg: Option<u16>,
    georeferenced: bool,
    layout: Layout,
}

impl GeoTiffBuilder {
    pub fn new(width: u32, height: u32, samples: Samples) -> Self {
        Self {
            width,
            height,
            samples,
            origin: (0.0, 0.0),
            pixel_size: (1.0, 1.0),
            epsg: Some(4326),
            georeferenced: true,
            layout: Layout::Strips { rows_per_strip: 4 },
        }
    }

    pub fn u8(width: u32, height: u32, bands: Vec<Vec<u8>>) -> Self {
        Self::new(width, height, Samples::U8(bands))
    }

    pub fn u16(width: u32, height: u32, bands: Vec<Vec<u16>>) -> Self {
        Self::new(width, height, Samples::U16(bands))
    }

    pub fn i16(width: u32, height: u32, bands: Vec<Vec<i16>>) -> Self {
        Self::new(width, height, Samples::I16(bands))
    }

    pub fn f32(width: u32, height: u32, bands: Vec<Vec<f32>>) -> Self {
        Self::new(width, height, Samples::F32(bands))
    }

    /// World coordinate of the top-left corner of pixel (0, 0).
    pub fn origin(mut self, x: f64, y: f64) -> Self {
        self.origin = (x, y);
        self
    }

    /// Pixel size in CRS units (both positive; rows run southward).
    pub fn pixel_size(mut self, x: f64, y: f64) -> Self {
        self.pixel_size = (x, y);
        self
    }

    /// EPSG code written to the GeoKey directory; `None` writes no CRS key.
    pub fn epsg(mut self, epsg: Option<u16>) -> Self {
        self.epsg = epsg;
        self
    }

    /// Omit all GeoTIFF tags.
    pub fn without_georeference(mut self) -> Self {
        self.georeferenced = false;
        self
    }

    pub fn rows_per_strip(mut self, rows: u32) -> Self {
        self.layout = Layout::Strips {
            rows_per_strip: rows.max(1),
        };
        self
    }

    /// Use a tiled layout; tile sizes must be multiples of 16.
    pub fn tiled(mut self, tile_width: u32, tile_height: u32) -> Self {
        self.layout = Layout::Tiles {
            tile_width,
            tile_height,
        };
        self
    }

    /// Encode into an in-memory TIFF.
    pub fn to_bytes(&self) -> Vec<u8> {
        let bands = self.samples.band_count();
        assert!(bands > 0, "at least one band is required");

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut cursor).expect("tiff encoder");
            let mut dir = encoder.image_directory().expect("image directory");

            dir.write_tag(Tag::ImageWidth, self.width).unwrap();
            dir.write_tag(Tag::ImageLength, self.height).unwrap();
            let bits: Vec<u16> = vec![self.samples.bits(); bands];
            dir.write_tag(Tag::BitsPerSample, bits.as_slice()).unwrap();
            let formats: Vec<u16> = vec![self.samples.sample_format(); bands];
            dir.write_tag(Tag::SampleFormat, formats.as_slice()).unwrap();
            dir.write_tag(Tag::Compression, 1u16).unwrap();
            let rgb = bands == 3 || bands == 4;
            dir.write_tag(Tag::PhotometricInterpretation, if rgb { 2u16 } else { 1u16 })
                .unwrap();
            dir.write_tag(Tag::SamplesPerPixel, bands as u16).unwrap();
            dir.write_tag(Tag::PlanarConfiguration, 1u16).unwrap();

            let color_samples = if rgb { 3 } else { 1 };
            if bands > color_samples {
                let mut extra: Vec<u16> = vec![0; bands - color_samples];
                if bands == 4 {
                    // Unassociated alpha
                    extra[0] = 2;
                }
                dir.write_tag(Tag::ExtraSamples, extra.as_slice()).unwrap();
            }

            if self.georeferenced {
                let scale = [self.pixel_size.0, self.pixel_size.1, 0.0];
                dir.write_tag(Tag::ModelPixelScaleTag, &scale[..]).unwrap();
                let tiepoint = [0.0, 0.0, 0.0, self.origin.0, self.origin.1, 0.0];
                dir.write_tag(Tag::ModelTiepointTag, &tiepoint[..]).unwrap();
                let keys = self.geokeys();
                dir.write_tag(Tag::GeoKeyDirectoryTag, keys.as_slice()).unwrap();
            }

            let (offsets_tag, counts_tag) = match self.layout {
                Layout::Strips { rows_per_strip } => {
                    dir.write_tag(Tag::RowsPerStrip, rows_per_strip).unwrap();
                    (Tag::StripOffsets, Tag::StripByteCounts)
                }
                Layout::Tiles {
                    tile_width,
                    tile_height,
                } => {
                    dir.write_tag(Tag::TileWidth, tile_width).unwrap();
                    dir.write_tag(Tag::TileLength, tile_height).unwrap();
                    (Tag::TileOffsets, Tag::TileByteCounts)
                }
            };

            let mut offsets: Vec<u32> = Vec::new();
            let mut counts: Vec<u32> = Vec::new();
            for chunk in self.chunks() {
                let offset = dir.write_data(chunk.as_slice()).unwrap();
                offsets.push(u32::try_from(offset).expect("offset fits in u32"));
                counts.push(chunk.len() as u32);
            }
            dir.write_tag(offsets_tag, offsets.as_slice()).unwrap();
            dir.write_tag(counts_tag, counts.as_slice()).unwrap();
            dir.finish().unwrap();
        }
        cursor.into_inner()
    }

    /// Encode and write to disk.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_bytes())
    }

    fn geokeys(&self) -> Vec<u16> {
        let mut entries: Vec<[u16; 4]> = Vec::new();
        let geographic = matches!(self.epsg, Some(4326) | Some(4269) | Some(4258));
        // GTModelTypeGeoKey: 1 projected, 2 geographic
        entries.push([1024, 0, 1, if geographic { 2 } else { 1 }]);
        // GTRasterTypeGeoKey: PixelIsArea
        entries.push([1025, 0, 1, 1]);
        if let Some(code) = self.epsg {
            if geographic {
                entries.push([2048, 0, 1, code]);
            } else {
                entries.push([3072, 0, 1, code]);
            }
        }

        let mut keys = vec![1, 1, 0, entries.len() as u16];
        for entry in entries {
            keys.extend_from_slice(&entry);
        }
        keys
    }

    fn chunks(&self) -> Vec<Vec<u8>> {
        let (w, h) = (self.width as usize, self.height as usize);
        match self.layout {
            Layout::Strips { rows_per_strip } => {
                let rows = rows_per_strip as usize;
                (0..h)
                    .step_by(rows)
                    .map(|row0| {
                        let mut out = Vec::new();
                        for row in row0..(row0 + rows).min(h) {
                            for col in 0..w {
                                self.samples.pixel_bytes(Some(row * w + col), &mut out);
                            }
                        }
                        out
                    })
                    .collect()
            }
            Layout::Tiles {
                tile_width,
                tile_height,
            } => {
                let (tw, th) = (tile_width as usize, tile_height as usize);
                let mut chunks = Vec::new();
                for ty in 0..h.div_ceil(th) {
                    for tx in 0..w.div_ceil(tw) {
                        let mut out = Vec::new();
                        for r in 0..th {
                            for c in 0..tw {
                                let (row, col) = (ty * th + r, tx * tw + c);
                                let index = (row < h && col < w).then(|| row * w + col);
                                self.samples.pixel_bytes(index, &mut out);
                            }
                        }
                        chunks.push(out);
                    }
                }
                chunks
            }
        }
    }
}
