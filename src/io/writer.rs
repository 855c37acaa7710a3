// src/io/writer.rs
use std::path::Path;

use gdal::raster::{Buffer, RasterCreationOptions};
use gdal::{Dataset, DriverManager, Metadata};
use tracing::debug;

use crate::error::Result;
use crate::image::GeoInfo;
use crate::processing::collection::Composite;
use crate::utils::fixed_point::{
    to_fixed_point, to_float_with_nodata, NODATA_VALUE_FLOAT, NODATA_VALUE_INT,
};

/// Sample encoding of a written layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Encoding {
    Float32,
    /// int16 scaled by `scale_factor`, for values in [-1, 1].
    FixedPoint { scale_factor: i32 },
}

#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub compress: String,
    pub compress_level: u8,
    pub tiled: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compress: "DEFLATE".to_string(),
            compress_level: 6,
            tiled: true,
        }
    }
}

impl WriteOptions {
    fn option_list(&self) -> Vec<String> {
        let mut options = Vec::new();

        // Add compression if not NONE
        let compress = self.compress.to_uppercase();
        if compress != "NONE" {
            options.push(format!("COMPRESS={compress}"));

            // Add compression level for supported algorithms
            match compress.as_str() {
                "DEFLATE" => options.push(format!("ZLEVEL={}", self.compress_level.min(9))),
                "ZSTD" => options.push(format!("ZSTD_LEVEL={}", self.compress_level.min(22))),
                _ => {}
            }
        }

        if self.tiled {
            options.push("TILED=YES".to_string());
        }

        options.push("NUM_THREADS=ALL_CPUS".to_string());
        options
    }
}

/// Writes every band of `composite` to a GeoTIFF. Masked pixels become nodata.
pub fn write_composite(
    composite: &Composite,
    output_path: &Path,
    encoding: Encoding,
    options: &WriteOptions,
) -> Result<()> {
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let creation_options = RasterCreationOptions::from_iter(options.option_list());
    let (width, height) = composite.shape();
    let names: Vec<&str> = composite.band_names().collect();

    let mut out_ds = match encoding {
        Encoding::FixedPoint { .. } => driver.create_with_band_type_with_options::<i16, _>(
            output_path,
            width,
            height,
            names.len(),
            &creation_options,
        )?,
        Encoding::Float32 => driver.create_with_band_type_with_options::<f32, _>(
            output_path,
            width,
            height,
            names.len(),
            &creation_options,
        )?,
    };
    set_georeference(&mut out_ds, composite.geo())?;

    for (index, name) in names.iter().enumerate() {
        let data = composite.band(name)?;
        let mut band = out_ds.rasterband(index + 1)?;
        match encoding {
            Encoding::FixedPoint { scale_factor } => {
                band.set_no_data_value(Some(NODATA_VALUE_INT as f64))?;
                band.set_metadata_item("SCALE", &format!("{}", 1.0 / scale_factor as f64), "")?;
                band.set_metadata_item("OFFSET", "0", "")?;
                band.set_description(&format!("{name} (scaled by {scale_factor})"))?;

                let fixed = to_fixed_point(data, composite.mask(), scale_factor, NODATA_VALUE_INT);
                let mut buffer = Buffer::new((width, height), fixed);
                band.write((0, 0), (width, height), &mut buffer)?;
            }
            Encoding::Float32 => {
                band.set_no_data_value(Some(NODATA_VALUE_FLOAT as f64))?;
                band.set_description(name)?;

                let values = to_float_with_nodata(data, composite.mask(), NODATA_VALUE_FLOAT);
                let mut buffer = Buffer::new((width, height), values);
                band.write((0, 0), (width, height), &mut buffer)?;
            }
        }
    }

    out_ds.flush_cache()?;
    debug!(path = %output_path.display(), bands = names.len(), "wrote composite");
    Ok(())
}

/// Writes an RGBA quicklook as a 4-band byte GeoTIFF.
pub fn write_rgba(
    rgba: &[[u8; 4]],
    geo: &GeoInfo,
    output_path: &Path,
    options: &WriteOptions,
) -> Result<()> {
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut option_list = options.option_list();
    option_list.push("PHOTOMETRIC=RGB".to_string());
    option_list.push("ALPHA=YES".to_string());
    let creation_options = RasterCreationOptions::from_iter(option_list);

    let (width, height) = geo.shape();
    let mut out_ds = driver.create_with_band_type_with_options::<u8, _>(
        output_path,
        width,
        height,
        4,
        &creation_options,
    )?;
    set_georeference(&mut out_ds, geo)?;

    for channel in 0..4 {
        let data: Vec<u8> = rgba.iter().map(|pixel| pixel[channel]).collect();
        let mut band = out_ds.rasterband(channel + 1)?;
        let mut buffer = Buffer::new((width, height), data);
        band.write((0, 0), (width, height), &mut buffer)?;
    }

    out_ds.flush_cache()?;
    Ok(())
}

fn set_georeference(dataset: &mut Dataset, geo: &GeoInfo) -> Result<()> {
    if !geo.projection.is_empty() {
        dataset.set_projection(&geo.projection)?;
    }
    dataset.set_geo_transform(&geo.geo_transform)?;
    Ok(())
}
