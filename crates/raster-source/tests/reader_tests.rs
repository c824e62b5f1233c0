//! Integration tests for opening, reading and writing GeoTIFFs.

use planner_common::{BoundingBox, Crs, PixelWindow};
use raster_source::{
    BandDataType, BandSamples, GeoTransform, RasterData, RasterError, RasterHandle, SampleType,
};
use test_utils::{assert_approx_eq, fixtures, rgb_bands, GeoTiffBuilder};

// ============================================================================
// Metadata
// ============================================================================

#[test]
fn test_open_rgb_from_disk() {
    let dir = fixtures::temp_dir();
    let path = fixtures::write_raster(&dir, "ortho.tif", &fixtures::rgb_wgs84_raster());

    let handle = RasterHandle::open(&path).unwrap();
    assert_eq!(handle.width(), 64);
    assert_eq!(handle.height(), 64);
    assert_eq!(handle.band_count(), 3);
    assert_eq!(handle.crs(), Some(Crs::WGS84));
    assert_eq!(handle.data_type(), BandDataType::UInt8);

    let bounds = handle.bounds();
    let (min_x, min_y, max_x, max_y) = fixtures::bbox::FIELD_WGS84;
    assert_approx_eq!(bounds.min_x, min_x, 1e-9);
    assert_approx_eq!(bounds.max_x, max_x, 1e-9);
    assert_approx_eq!(bounds.max_y, max_y, 1e-9);
    assert_approx_eq!(bounds.min_y, min_y, 1e-9);
}

#[test]
fn test_projected_crs_and_wide_ints() {
    let bytes = fixtures::multispectral_utm_raster().to_bytes();
    let handle = RasterHandle::from_bytes(bytes).unwrap();
    assert_eq!(handle.crs(), Some(Crs::from_epsg(32631)));
    assert_eq!(handle.band_count(), 5);
    assert_eq!(handle.info().sample_type, SampleType::U16);
    assert_eq!(handle.data_type(), BandDataType::WideInt);
}

#[test]
fn test_signed_ints_are_wide() {
    let bytes = GeoTiffBuilder::i16(2, 2, vec![vec![-3, 0, 5, 9]]).to_bytes();
    let mut handle = RasterHandle::from_bytes(bytes).unwrap();
    assert_eq!(handle.data_type(), BandDataType::WideInt);

    let raw = handle.read_window(PixelWindow::full(2, 2)).unwrap();
    assert_eq!(raw.bands[0], BandSamples::I16(vec![-3, 0, 5, 9]));
}

#[test]
fn test_single_band_float() {
    let bytes = fixtures::float_mercator_raster().to_bytes();
    let mut handle = RasterHandle::from_bytes(bytes).unwrap();
    assert_eq!(handle.band_count(), 1);
    assert_eq!(handle.info().sample_type, SampleType::F32);
    assert_eq!(handle.data_type(), BandDataType::Float);

    let raw = handle.read_window(PixelWindow::full(32, 32)).unwrap();
    assert_eq!(raw.bands.len(), 1);
    assert_eq!(raw.bands[0].len(), 32 * 32);
}

#[test]
fn test_gray_alpha_bands() {
    let gray = vec![10u8, 20, 30, 40];
    let alpha = vec![0u8, 255, 255, 0];
    let bytes = GeoTiffBuilder::u8(2, 2, vec![gray.clone(), alpha.clone()]).to_bytes();
    let mut handle = RasterHandle::from_bytes(bytes).unwrap();
    assert_eq!(handle.band_count(), 2);

    let raw = handle.read_window(PixelWindow::full(2, 2)).unwrap();
    assert_eq!(raw.bands[0], BandSamples::U8(gray));
    assert_eq!(raw.bands[1], BandSamples::U8(alpha));
}

#[test]
fn test_five_band_window() {
    let bytes = fixtures::multispectral_utm_raster().to_bytes();
    let mut handle = RasterHandle::from_bytes(bytes).unwrap();

    let raw = handle.read_window(PixelWindow::new(0, 31, 1, 1)).unwrap();
    assert_eq!(raw.band_count(), 5);
    // Bottom row of each ramp holds its maximum.
    for (i, band) in raw.bands.iter().enumerate() {
        assert_eq!(band.value(0), (20_000 + i * 1000) as f64);
    }
}

#[test]
fn test_missing_crs_is_undefined() {
    let bytes = GeoTiffBuilder::u8(2, 2, vec![vec![0; 4]]).epsg(None).to_bytes();
    let handle = RasterHandle::from_bytes(bytes).unwrap();
    assert_eq!(handle.crs(), None);
}

// ============================================================================
// Unreadable inputs
// ============================================================================

#[test]
fn test_not_a_tiff() {
    let err = RasterHandle::from_bytes(b"definitely not a tiff".to_vec()).unwrap_err();
    assert!(matches!(err, RasterError::Unreadable(_)), "{:?}", err);
}

#[test]
fn test_missing_georeference() {
    let bytes = GeoTiffBuilder::u8(2, 2, vec![vec![1; 4]])
        .without_georeference()
        .to_bytes();
    let err = RasterHandle::from_bytes(bytes).unwrap_err();
    assert!(err.to_string().contains("georeferencing"));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = RasterHandle::open("/nonexistent/raster.tif").unwrap_err();
    assert!(matches!(err, RasterError::Io(_)));
}

// ============================================================================
// Windowed reads
// ============================================================================

#[test]
fn test_partial_window_is_clamped() {
    let bytes = GeoTiffBuilder::u8(8, 8, rgb_bands(8, 8)).to_bytes();
    let mut handle = RasterHandle::from_bytes(bytes).unwrap();

    let raw = handle.read_window(PixelWindow::new(-4, 6, 8, 8)).unwrap();
    assert_eq!(raw.window, PixelWindow::new(0, 6, 4, 2));
    assert_eq!((raw.width, raw.height), (4, 2));
    assert_eq!(raw.band_count(), 3);
}

#[test]
fn test_window_without_overlap() {
    let bytes = GeoTiffBuilder::u8(8, 8, rgb_bands(8, 8)).to_bytes();
    let mut handle = RasterHandle::from_bytes(bytes).unwrap();

    let err = handle.read_window(PixelWindow::new(8, 0, 4, 4)).unwrap_err();
    assert!(err.is_out_of_range());
}

#[test]
fn test_strided_read_from_strips() {
    let band: Vec<u16> = (0..100).collect();
    let bytes = GeoTiffBuilder::u16(10, 10, vec![band])
        .rows_per_strip(3)
        .to_bytes();
    let mut handle = RasterHandle::from_bytes(bytes).unwrap();

    let raw = handle.read_window_strided(PixelWindow::full(10, 10), 4).unwrap();
    assert_eq!((raw.width, raw.height), (3, 3));
    let values: Vec<f64> = raw.bands[0].to_f64_vec();
    assert_eq!(values, vec![0.0, 4.0, 8.0, 40.0, 44.0, 48.0, 80.0, 84.0, 88.0]);
}

#[test]
fn test_window_for_bounds() {
    let bytes = GeoTiffBuilder::f32(10, 10, vec![vec![1.0; 100]])
        .origin(100.0, 200.0)
        .pixel_size(10.0, 10.0)
        .epsg(Some(3857))
        .to_bytes();
    let handle = RasterHandle::from_bytes(bytes).unwrap();

    let window = handle
        .window_for_bounds(&BoundingBox::new(125.0, 150.0, 500.0, 400.0))
        .unwrap();
    assert_eq!(window, PixelWindow::new(2, 0, 8, 5));

    let err = handle
        .window_for_bounds(&BoundingBox::new(0.0, 0.0, 50.0, 50.0))
        .unwrap_err();
    assert!(err.is_out_of_range());
}

// ============================================================================
// Writer
// ============================================================================

#[test]
fn test_write_then_read_multiband_float() {
    let width = 300;
    let height = 400;
    let bands: Vec<BandSamples> = (0..5)
        .map(|b| {
            BandSamples::F32(
                (0..width * height)
                    .map(|i| (i as f32) * 0.5 + b as f32)
                    .collect(),
            )
        })
        .collect();
    let data = RasterData {
        width: width as u32,
        height: height as u32,
        crs: Crs::WEB_MERCATOR,
        geographic: false,
        transform: GeoTransform::new(1000.0, 5000.0, 2.0, 2.0),
        bands,
    };

    let bytes = data.to_geotiff_bytes().unwrap();
    let mut handle = RasterHandle::from_bytes(bytes).unwrap();
    assert_eq!(handle.crs(), Some(Crs::WEB_MERCATOR));
    assert_eq!(handle.band_count(), 5);
    assert_eq!(*handle.transform(), GeoTransform::new(1000.0, 5000.0, 2.0, 2.0));

    let raw = handle.read_window(PixelWindow::new(299, 399, 1, 1)).unwrap();
    let last = (width * height - 1) as f64;
    assert_eq!(raw.bands[0].value(0), last * 0.5);
    assert_eq!(raw.bands[4].value(0), last * 0.5 + 4.0);
}

#[test]
fn test_write_geographic_rgba() {
    let mut planes = rgb_bands(4, 4);
    planes.push(vec![255; 16]);
    let data = RasterData {
        width: 4,
        height: 4,
        crs: Crs::WGS84,
        geographic: true,
        transform: GeoTransform::new(5.0, 52.0, 0.001, 0.001),
        bands: planes.into_iter().map(BandSamples::U8).collect(),
    };

    let handle = RasterHandle::from_bytes(data.to_geotiff_bytes().unwrap()).unwrap();
    assert_eq!(handle.crs(), Some(Crs::WGS84));
    assert_eq!(handle.band_count(), 4);
    assert_eq!(handle.data_type(), BandDataType::UInt8);
}
