// tests/gdal_io_tests.rs
use std::path::Path;

use chrono::NaiveDate;
use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager, Metadata};
use vi_series::catalog::{GdalCatalog, ImageCatalog, MemoryCatalog};
use vi_series::config::PipelineConfig;
use vi_series::image::{band, GeoInfo, Image};
use vi_series::io::{write_composite, Encoding, WriteOptions};
use vi_series::pipeline::Pipeline;
use vi_series::presenter;
use vi_series::processing::masks::{mask_empty_pixels, INTERNAL_CLOUD_FLAG_MASK};
use vi_series::processing::stats::total_obs_count;
use vi_series::processing::{Composite, ParallelProcessor};
use vi_series::region::{Bounds, PointFeature};
use vi_series::utils::gdal_ext::TypedBuffer;

const GEO_TRANSFORM: [f64; 6] = [35.0, 0.01, 0.0, -6.0, 0.0, -0.01];

/// Writes a 2x2 file with the default MOD09GA band order and no band descriptions.
fn write_granule(path: &Path, nir: i16, obs: [i16; 4], nodata_obs: Option<f64>) {
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut dataset = driver
        .create_with_band_type::<i16, _>(path, 2, 2, band::DEFAULT_ORDER.len())
        .unwrap();
    dataset.set_geo_transform(&GEO_TRANSFORM).unwrap();

    for (index, name) in band::DEFAULT_ORDER.iter().enumerate() {
        let values = match *name {
            band::SUR_REFL_B02 => vec![nir; 4],
            band::NUM_OBSERVATIONS_1KM => obs.to_vec(),
            band::STATE_1KM => vec![0; 4],
            _ => vec![1000; 4],
        };
        let mut raster_band = dataset.rasterband(index + 1).unwrap();
        if *name == band::NUM_OBSERVATIONS_1KM {
            raster_band.set_no_data_value(nodata_obs).unwrap();
        }
        let mut buffer = Buffer::new((2, 2), values);
        raster_band.write((0, 0), (2, 2), &mut buffer).unwrap();
    }
    dataset.flush_cache().unwrap();
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_gdal_catalog_reads_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_granule(&dir.path().join("MOD09GA_2011_01_01.tif"), 3000, [1, 1, 0, 1], None);
    write_granule(&dir.path().join("MOD09GA_2010_01_01.tif"), 2000, [1, 0, 0, -1], Some(-1.0));
    write_granule(&dir.path().join("MOD09GA_2021_01_01.tif"), 2000, [1, 1, 1, 1], None);
    std::fs::write(dir.path().join("notes.txt"), "not a raster").unwrap();

    let band_order = band::DEFAULT_ORDER.iter().map(|b| b.to_string()).collect();
    let catalog = GdalCatalog::new("MODIS/006/MOD09GA", dir.path(), band_order)
        .with_processor(ParallelProcessor::new(Some(2)));
    assert_eq!(catalog.entries().unwrap().len(), 3);

    let bounds = Bounds::new(34.0, -7.0, 36.0, -5.0);
    let collection = catalog
        .query(&bounds, date(2010, 1, 1), date(2020, 12, 31))
        .unwrap();

    assert_eq!(collection.len(), 2);
    let first = &collection.images()[0];
    assert_eq!(first.date(), date(2010, 1, 1));
    assert_eq!(first.band(band::SUR_REFL_B02).unwrap().value_f64(0), 2000.0);
    assert_eq!(first.band(band::STATE_1KM).unwrap().dtype_name(), "i16");
    // Nodata on the observation band starts the pixel masked.
    assert_eq!(first.mask(), &[true, true, true, false]);

    let observed = collection.map(mask_empty_pixels).unwrap();
    let total = total_obs_count(&observed).unwrap();
    assert_eq!(total.value(band::NUM_OBSERVATIONS_1KM, 0).unwrap(), Some(2.0));
    assert_eq!(total.value(band::NUM_OBSERVATIONS_1KM, 2).unwrap(), None);

    let out_path = dir.path().join("total_obs_count.tif");
    write_composite(&total, &out_path, Encoding::Float32, &WriteOptions::default()).unwrap();

    let written = Dataset::open(&out_path).unwrap();
    let out_band = written.rasterband(1).unwrap();
    assert_eq!(out_band.no_data_value(), Some(-999.0));
    let values = out_band.read_as::<f32>((0, 0), (2, 2), (2, 2), None).unwrap();
    assert_eq!(values.data(), &[2.0, 1.0, -999.0, 1.0]);
}

fn read_i16(path: &Path) -> (Vec<i16>, Option<String>) {
    let dataset = Dataset::open(path).unwrap();
    let raster_band = dataset.rasterband(1).unwrap();
    let values = raster_band.read_as::<i16>((0, 0), (2, 2), (2, 2), None).unwrap();
    (values.data().to_vec(), raster_band.metadata_item("SCALE", ""))
}

#[test]
fn test_fixed_point_keeps_full_range() {
    let dir = tempfile::tempdir().unwrap();
    let geo = GeoInfo {
        projection: String::new(),
        geo_transform: GEO_TRANSFORM,
        width: 2,
        height: 2,
    };
    let ratio = Composite::new(
        geo,
        vec![(
            band::NUM_OBSERVATIONS_1KM.to_string(),
            Buffer::new((2, 2), vec![1.0, 0.5, -1.0, 0.25]),
        )],
        vec![true, true, true, false],
    )
    .unwrap();

    let out_path = dir.path().join("clear_ratio.tif");
    let encoding = Encoding::FixedPoint { scale_factor: 10000 };
    write_composite(&ratio, &out_path, encoding, &WriteOptions::default()).unwrap();

    let (values, scale) = read_i16(&out_path);
    // -1.0 stays distinguishable from the -10000 nodata value.
    assert_eq!(values, [10000, 5000, -9999, -10000]);
    assert_eq!(scale.as_deref(), Some("0.0001"));
}

fn memory_image(day: NaiveDate, obs: [i16; 4], state: [i16; 4]) -> Image {
    let geo = GeoInfo {
        projection: String::new(),
        geo_transform: GEO_TRANSFORM,
        width: 2,
        height: 2,
    };
    band::DEFAULT_ORDER
        .iter()
        .fold(Image::new(format!("MOD09GA_{day}"), day, geo), |image, &name| {
            let values = match name {
                band::SUR_REFL_B01 => vec![1000; 4],
                band::SUR_REFL_B02 => vec![3000; 4],
                band::NUM_OBSERVATIONS_1KM => obs.to_vec(),
                band::STATE_1KM => state.to_vec(),
                _ => vec![500; 4],
            };
            image
                .with_band(name, TypedBuffer::I16(Buffer::new((2, 2), values)))
                .unwrap()
        })
}

#[test]
fn test_export_writes_layers() {
    let cloudy = INTERNAL_CLOUD_FLAG_MASK as i16;
    let catalog = MemoryCatalog::new(
        "MODIS/006/MOD09GA",
        vec![
            memory_image(date(2010, 1, 1), [1, 1, 0, 1], [0, 0, 0, cloudy]),
            memory_image(date(2011, 1, 1), [1, 1, 0, 1], [0, cloudy, 0, cloudy]),
        ],
    );
    let config = PipelineConfig::default();
    let features = [PointFeature::new("B22C0567-001", 35.005, -6.005)];
    let boundary = Bounds::new(34.0, -7.0, 36.0, -5.0);
    let output = Pipeline::new(&catalog, &config).run(&features, &boundary).unwrap();

    let dir = tempfile::tempdir().unwrap();
    presenter::export(
        &output,
        dir.path(),
        config.output.ratio_encoding(),
        &config.output.write_options(),
    )
    .unwrap();

    for name in [
        "nirv_mosaic.tif",
        "median.tif",
        "total_obs_count.tif",
        "clear_obs_count.tif",
        "clear_ratio_quicklook.tif",
        "map.json",
        "chart.json",
    ] {
        assert!(dir.path().join(name).is_file(), "missing {name}");
    }

    // Always clear, clear once out of twice, never observed, never clear.
    let (ratio, scale) = read_i16(&dir.path().join("clear_ratio.tif"));
    assert_eq!(ratio, [10000, 5000, -10000, 0]);
    assert_eq!(scale.as_deref(), Some("0.0001"));
}
