// src/utils/fixed_point.rs
pub const NODATA_VALUE_INT: i16 = -10000;
pub const NODATA_VALUE_FLOAT: f32 = -999.0;

/// Scales values in [-1, 1] to int16. Masked and NaN pixels become `nodata_value`.
///
/// Valid pixels never encode to `nodata_value` itself; a scaled -1.0 that would
/// collide with it is written one step above.
pub fn to_fixed_point(data: &[f32], mask: &[bool], scale_factor: i32, nodata_value: i16) -> Vec<i16> {
    let lowest = nodata_value as i32 + 1;
    data.iter()
        .zip(mask)
        .map(|(&value, &valid)| {
            if !valid || value.is_nan() {
                nodata_value
            } else {
                let scaled = (value.clamp(-1.0, 1.0) as f64 * scale_factor as f64).round() as i32;
                scaled.clamp(lowest, i16::MAX as i32) as i16
            }
        })
        .collect()
}

/// Float output with masked pixels set to `nodata_value`.
pub fn to_float_with_nodata(data: &[f32], mask: &[bool], nodata_value: f32) -> Vec<f32> {
    data.iter()
        .zip(mask)
        .map(|(&value, &valid)| if valid { value } else { nodata_value })
        .collect()
}
