// tests/pipeline_tests.rs
use chrono::NaiveDate;
use gdal::raster::Buffer;
use vi_series::catalog::{ImageCatalog, MemoryCatalog};
use vi_series::config::PipelineConfig;
use vi_series::image::{band, GeoInfo, Image};
use vi_series::io::parse_acquisition_date;
use vi_series::pipeline::Pipeline;
use vi_series::presenter::{fit_linear_trend, render, VisParams};
use vi_series::processing::collection::Collection;
use vi_series::processing::indices::add_variables;
use vi_series::processing::masks::{mask_clouds, mask_empty_pixels, INTERNAL_CLOUD_FLAG_MASK};
use vi_series::processing::stats::{clear_obs_count, clear_ratio, total_obs_count};
use vi_series::region::{select_region, Bounds, PointFeature};
use vi_series::utils::gdal_ext::TypedBuffer;
use vi_series::Error;

const CLOUDY: u16 = INTERNAL_CLOUD_FLAG_MASK as u16;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 2x2 grid over lon 35.00..35.02, lat -6.00..-6.02
fn geo() -> GeoInfo {
    GeoInfo {
        projection: String::new(),
        geo_transform: [35.0, 0.01, 0.0, -6.0, 0.0, -0.01],
        width: 2,
        height: 2,
    }
}

fn modis_image(day: NaiveDate, b01: i16, b02: i16, b05: i16, obs: [u8; 4], state: [u16; 4]) -> Image {
    let i16_band = |v: i16| TypedBuffer::I16(Buffer::new((2, 2), vec![v; 4]));
    Image::new(format!("MOD09GA_{}", day.format("%Y_%m_%d")), day, geo())
        .with_band(band::SUR_REFL_B01, i16_band(b01))
        .unwrap()
        .with_band(band::SUR_REFL_B02, i16_band(b02))
        .unwrap()
        .with_band(band::SUR_REFL_B03, i16_band(300))
        .unwrap()
        .with_band(band::SUR_REFL_B04, i16_band(400))
        .unwrap()
        .with_band(band::SUR_REFL_B05, i16_band(b05))
        .unwrap()
        .with_band(band::NUM_OBSERVATIONS_1KM, TypedBuffer::U8(Buffer::new((2, 2), obs.to_vec())))
        .unwrap()
        .with_band(band::STATE_1KM, TypedBuffer::U16(Buffer::new((2, 2), state.to_vec())))
        .unwrap()
}

/// Pixel 0 always observed and clear, pixel 1 observed but cloudy on day 2,
/// pixel 2 never observed, pixel 3 observed once and always cloudy.
fn sample_images() -> Vec<Image> {
    vec![
        modis_image(date(2012, 7, 2), 1000, 3000, 500, [1, 1, 0, 1], [0, 0, 0, CLOUDY]),
        modis_image(date(2010, 1, 1), 1000, 2000, 1000, [2, 1, 0, 0], [0, CLOUDY, 0, 0]),
        modis_image(date(2011, 1, 1), 1000, 2500, 700, [1, 1, 0, 0], [0, 0, 0, 0]),
    ]
}

fn features() -> Vec<PointFeature> {
    vec![
        PointFeature::new("B22C0567-001", 35.005, -6.005),
        PointFeature::new("OTHER-002", 40.0, -3.0),
    ]
}

#[test]
fn test_collection_is_date_ordered() {
    let collection = Collection::new(sample_images());
    let dates: Vec<NaiveDate> = collection.iter().map(Image::date).collect();
    assert_eq!(dates, [date(2010, 1, 1), date(2011, 1, 1), date(2012, 7, 2)]);
}

#[test]
fn test_filter_date_end_is_exclusive() {
    let collection = Collection::new(sample_images());
    let filtered = collection.filter_date(date(2010, 1, 1), date(2012, 7, 2));
    assert_eq!(filtered.len(), 2);
    assert!(filtered.iter().all(|image| image.date() < date(2012, 7, 2)));
}

#[test]
fn test_filter_bounds() {
    let collection = Collection::new(sample_images());
    assert_eq!(collection.filter_bounds(&Bounds::new(35.01, -6.01, 36.0, -5.0)).len(), 3);
    assert!(collection.filter_bounds(&Bounds::new(10.0, 10.0, 11.0, 11.0)).is_empty());
}

#[test]
fn test_observation_counts() {
    let observed = Collection::new(sample_images()).map(mask_empty_pixels).unwrap();
    let cloud_masked = observed.map(mask_clouds).unwrap();

    let total = total_obs_count(&observed).unwrap();
    assert_eq!(total.value(band::NUM_OBSERVATIONS_1KM, 0).unwrap(), Some(3.0));
    assert_eq!(total.value(band::NUM_OBSERVATIONS_1KM, 1).unwrap(), Some(3.0));
    assert_eq!(total.value(band::NUM_OBSERVATIONS_1KM, 2).unwrap(), None);
    assert_eq!(total.value(band::NUM_OBSERVATIONS_1KM, 3).unwrap(), Some(1.0));

    let clear = clear_obs_count(&cloud_masked).unwrap();
    let counts = clear.band(band::NUM_OBSERVATIONS_1KM).unwrap();
    assert_eq!(counts, &[3.0, 2.0, 0.0, 0.0]);
    assert!(clear.mask().iter().all(|&valid| valid));

    let ratio = clear_ratio(&clear, &total).unwrap();
    assert_eq!(ratio.value(band::NUM_OBSERVATIONS_1KM, 0).unwrap(), Some(1.0));
    let r1 = ratio.value(band::NUM_OBSERVATIONS_1KM, 1).unwrap().unwrap();
    assert!((r1 - 2.0 / 3.0).abs() < 1e-6);
    // Never observed: the total is masked, so is the ratio.
    assert_eq!(ratio.value(band::NUM_OBSERVATIONS_1KM, 2).unwrap(), None);
    assert_eq!(ratio.value(band::NUM_OBSERVATIONS_1KM, 3).unwrap(), Some(0.0));
}

#[test]
fn test_mosaic_keeps_latest_clear_value() {
    let indexed = Collection::new(sample_images())
        .map(mask_empty_pixels)
        .unwrap()
        .map(mask_clouds)
        .unwrap()
        .map(add_variables)
        .unwrap();
    let mosaic = indexed.select(&[band::NIRV]).unwrap().mosaic().unwrap();

    // Pixel 0 is clear on all three dates; 2012 is drawn on top (0.5 * 0.3).
    let nirv_0 = mosaic.value(band::NIRV, 0).unwrap().unwrap();
    assert!((nirv_0 - 0.15).abs() < 1e-6);
    // Pixel 1 is cloudy in 2010 and clear in 2011 and 2012.
    let nirv_1 = mosaic.value(band::NIRV, 1).unwrap().unwrap();
    assert!((nirv_1 - 0.15).abs() < 1e-6);
    assert_eq!(mosaic.value(band::NIRV, 2).unwrap(), None);
    assert_eq!(mosaic.value(band::NIRV, 3).unwrap(), None);

    // Without the 2012 image the 2011 value wins: (1500 / 3500) * 0.25.
    let earlier = indexed
        .filter_date(date(2010, 1, 1), date(2012, 1, 1))
        .select(&[band::NIRV])
        .unwrap()
        .mosaic()
        .unwrap();
    let nirv_2011 = earlier.value(band::NIRV, 0).unwrap().unwrap();
    assert!((nirv_2011 - 1500.0 / 3500.0 * 0.25).abs() < 1e-6);
}

#[test]
fn test_median_and_empty_collection() {
    let cloud_masked = Collection::new(sample_images())
        .map(mask_empty_pixels)
        .unwrap()
        .map(mask_clouds)
        .unwrap();
    let median = cloud_masked.median().unwrap();

    // Pixel 0: b02 values 2000, 2500, 3000.
    assert_eq!(median.value(band::SUR_REFL_B02, 0).unwrap(), Some(2500.0));
    // Pixel 1: clear on 2011 and 2012 only, mean of the two middles.
    assert_eq!(median.value(band::SUR_REFL_B02, 1).unwrap(), Some(2750.0));
    assert_eq!(median.value(band::SUR_REFL_B02, 2).unwrap(), None);

    assert!(matches!(Collection::default().median(), Err(Error::EmptyCollection)));
    assert!(matches!(Collection::default().count(), Err(Error::EmptyCollection)));
}

#[test]
fn test_select_region() {
    let ids = vec!["B22C0567-001".to_string()];
    let region = select_region(&features(), &ids, 1000.0);
    assert_eq!(region.len(), 1);
    assert!(region.contains(35.005, -6.005));
    assert!(region.contains(35.005, -6.010));
    assert!(!region.contains(35.005, -6.02));

    let bounds = region.bounds().unwrap();
    assert!(bounds.contains(35.005, -6.005));
    assert!((bounds.max_y - bounds.min_y - 2.0 * 0.008993).abs() < 1e-4);
}

#[test]
fn test_select_region_without_match_is_empty() {
    let region = select_region(&features(), &["missing".to_string()], 1000.0);
    assert!(region.is_empty());
    assert!(region.bounds().is_none());
}

#[test]
fn test_memory_catalog_query() {
    let catalog = MemoryCatalog::new("MODIS/006/MOD09GA", sample_images());
    let bounds = Bounds::new(34.0, -7.0, 36.0, -5.0);
    let result = catalog.query(&bounds, date(2010, 6, 1), date(2020, 12, 31)).unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(catalog.collection_id(), "MODIS/006/MOD09GA");
}

#[test]
fn test_pipeline_run() {
    let catalog = MemoryCatalog::new("MODIS/006/MOD09GA", sample_images());
    let config = PipelineConfig::default();
    let boundary = Bounds::new(34.0, -7.0, 36.0, -5.0);

    let output = Pipeline::new(&catalog, &config).run(&features(), &boundary).unwrap();

    assert_eq!(output.region.len(), 1);
    assert_eq!(output.indexed.len(), 3);
    assert!(output
        .indexed
        .band_names()
        .iter()
        .any(|name| name == band::CONSTANT));

    // The point falls in pixel 0, clear on every date.
    let chart = &output.chart;
    assert_eq!(chart.series, [band::NDWI, band::NDVI, band::NIRV]);
    assert_eq!(chart.points.len(), 3);
    let ndvi_2012 = chart.points[2].values[band::NDVI];
    assert!((ndvi_2012 - 0.5).abs() < 1e-6);

    assert_eq!(chart.trendlines.len(), 1);
    assert_eq!(chart.trendlines[0].series, band::NDWI);
    assert_eq!(chart.trendlines[0].color, "CC0000");
    assert_eq!(chart.trendlines[0].fit.n, 3);

    let layer_names: Vec<&str> = output.map.layers.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(layer_names[0], "NIRv Mosaic");
    assert_eq!(layer_names[1], "ROI");
    assert!(output.map.layers[1].region.is_some());
    assert_eq!(output.map.zoom, 11);

    let summary = output.summary("MODIS/006/MOD09GA").to_string();
    assert!(summary.contains("3 elements"));
    assert!(summary.contains("2010-01-01 to 2012-07-02"));
}

#[test]
fn test_pipeline_reports_unmatched_wells() {
    let catalog = MemoryCatalog::new("MODIS/006/MOD09GA", sample_images());
    let config = PipelineConfig {
        well_ids: vec!["missing".to_string()],
        ..Default::default()
    };
    let boundary = Bounds::new(34.0, -7.0, 36.0, -5.0);

    let result = Pipeline::new(&catalog, &config).run(&features(), &boundary);
    assert!(matches!(result, Err(Error::NoMatchingFeatures { .. })));
}

#[test]
fn test_trend_fit_recovers_line() {
    let ts = [40.0, 40.5, 41.0, 42.0];
    let ys: Vec<f64> = ts.iter().map(|t| 0.2 + 0.01 * t).collect();
    let fit = fit_linear_trend(&ts, &ys).unwrap();
    assert!((fit.slope - 0.01).abs() < 1e-9);
    assert!((fit.intercept - 0.2).abs() < 1e-9);
    assert!((fit.r_squared - 1.0).abs() < 1e-9);

    assert!(fit_linear_trend(&[1.0], &[2.0]).is_none());
    assert!(fit_linear_trend(&[1.0, 1.0], &[2.0, 3.0]).is_none());
}

#[test]
fn test_palette_stretch() {
    let vis = VisParams {
        min: Some(0.1),
        max: Some(0.9),
        palette: Some(vec!["white".to_string(), "green".to_string()]),
        ..Default::default()
    };
    assert_eq!(vis.palette_color(vis.stretch(0.1)).unwrap(), [255, 255, 255]);
    assert_eq!(vis.palette_color(vis.stretch(0.9)).unwrap(), [0, 128, 0]);
    assert_eq!(vis.palette_color(vis.stretch(5.0)).unwrap(), [0, 128, 0]);

    let hex = VisParams {
        palette: Some(vec!["#CC0000".to_string()]),
        ..Default::default()
    };
    assert_eq!(hex.palette_color(0.3).unwrap(), [204, 0, 0]);

    let bad = VisParams {
        palette: Some(vec!["not-a-color".to_string()]),
        ..Default::default()
    };
    assert!(bad.palette_color(0.5).is_err());
}

#[test]
fn test_render_masks_are_transparent() {
    let observed = Collection::new(sample_images()).map(mask_empty_pixels).unwrap();
    let total = total_obs_count(&observed).unwrap();
    let vis = VisParams {
        min: Some(0.0),
        max: Some(3.0),
        ..Default::default()
    };
    let rgba = render(&total, &vis).unwrap();
    assert_eq!(rgba[0], [255, 255, 255, 255]);
    assert_eq!(rgba[2], [0, 0, 0, 0]);
}

#[test]
fn test_parse_acquisition_date() {
    assert_eq!(parse_acquisition_date("2010_01_01"), Some(date(2010, 1, 1)));
    assert_eq!(parse_acquisition_date("MOD09GA_2015_03_20"), Some(date(2015, 3, 20)));
    assert_eq!(parse_acquisition_date("mod09ga-2015-03-20"), Some(date(2015, 3, 20)));
    assert_eq!(
        parse_acquisition_date("MOD09GA.A2010032.h21v09.061.2020061120000"),
        Some(date(2010, 2, 1))
    );
    assert_eq!(parse_acquisition_date("readme"), None);
}

#[test]
fn test_config_defaults() {
    let config: PipelineConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, PipelineConfig::default());
    assert_eq!(config.id_field, "Well_id");
    assert_eq!(config.buffer_m, 1000.0);
    assert_eq!(config.start, date(2010, 1, 1));
    assert_eq!(config.end, date(2020, 12, 31));
    assert_eq!(config.layers.len(), 6);
    assert!(config.validate().is_ok());

    let bad = PipelineConfig {
        start: date(2021, 1, 1),
        ..Default::default()
    };
    assert!(matches!(bad.validate(), Err(Error::InvalidParameter { name: "end", .. })));

    let mut overflowing = PipelineConfig::default();
    overflowing.output.scale_factor = 40000;
    assert!(matches!(
        overflowing.validate(),
        Err(Error::InvalidParameter { name: "scale_factor", .. })
    ));
    overflowing.output.scale_factor = i16::MAX as i32;
    assert!(overflowing.validate().is_ok());
}
