// src/utils/gdal_ext.rs
use std::fmt;

use gdal::raster::{Buffer, GdalDataType, RasterBand};

/// A band buffer tagged with its storage type.
#[derive(Clone)]
pub enum TypedBuffer {
    U8(Buffer<u8>),
    I16(Buffer<i16>),
    U16(Buffer<u16>),
    I32(Buffer<i32>),
    F32(Buffer<f32>),
}

impl TypedBuffer {
    pub fn filled_f32(shape: (usize, usize), value: f32) -> Self {
        TypedBuffer::F32(Buffer::new(shape, vec![value; shape.0 * shape.1]))
    }

    pub fn filled_i32(shape: (usize, usize), value: i32) -> Self {
        TypedBuffer::I32(Buffer::new(shape, vec![value; shape.0 * shape.1]))
    }

    /// Reads a whole band, keeping the integer types MODIS products use.
    pub fn read_band(band: &RasterBand) -> gdal::errors::Result<Self> {
        let (width, height) = band.size();
        let window = (width, height);
        Ok(match band.band_type() {
            GdalDataType::UInt8 => TypedBuffer::U8(band.read_as::<u8>((0, 0), window, window, None)?),
            GdalDataType::Int16 => TypedBuffer::I16(band.read_as::<i16>((0, 0), window, window, None)?),
            GdalDataType::UInt16 => TypedBuffer::U16(band.read_as::<u16>((0, 0), window, window, None)?),
            GdalDataType::Int32 => TypedBuffer::I32(band.read_as::<i32>((0, 0), window, window, None)?),
            _ => TypedBuffer::F32(band.read_as::<f32>((0, 0), window, window, None)?),
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        match self {
            TypedBuffer::U8(b) => b.shape(),
            TypedBuffer::I16(b) => b.shape(),
            TypedBuffer::U16(b) => b.shape(),
            TypedBuffer::I32(b) => b.shape(),
            TypedBuffer::F32(b) => b.shape(),
        }
    }

    pub fn len(&self) -> usize {
        let (width, height) = self.shape();
        width * height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype_name(&self) -> &'static str {
        match self {
            TypedBuffer::U8(_) => "u8",
            TypedBuffer::I16(_) => "i16",
            TypedBuffer::U16(_) => "u16",
            TypedBuffer::I32(_) => "i32",
            TypedBuffer::F32(_) => "f32",
        }
    }

    pub fn as_f32(&self) -> Option<&Buffer<f32>> {
        match self {
            TypedBuffer::F32(b) => Some(b),
            _ => None,
        }
    }

    pub fn value_f64(&self, i: usize) -> f64 {
        match self {
            TypedBuffer::U8(b) => b.data()[i] as f64,
            TypedBuffer::I16(b) => b.data()[i] as f64,
            TypedBuffer::U16(b) => b.data()[i] as f64,
            TypedBuffer::I32(b) => b.data()[i] as f64,
            TypedBuffer::F32(b) => b.data()[i] as f64,
        }
    }

    /// Integer view of a pixel for bit tests. Float values are truncated.
    pub fn value_i64(&self, i: usize) -> i64 {
        match self {
            TypedBuffer::U8(b) => b.data()[i] as i64,
            TypedBuffer::I16(b) => b.data()[i] as i64,
            TypedBuffer::U16(b) => b.data()[i] as i64,
            TypedBuffer::I32(b) => b.data()[i] as i64,
            TypedBuffer::F32(b) => b.data()[i] as i64,
        }
    }

    pub fn to_f32_vec(&self) -> Vec<f32> {
        match self {
            TypedBuffer::U8(b) => b.data().iter().map(|&v| v as f32).collect(),
            TypedBuffer::I16(b) => b.data().iter().map(|&v| v as f32).collect(),
            TypedBuffer::U16(b) => b.data().iter().map(|&v| v as f32).collect(),
            TypedBuffer::I32(b) => b.data().iter().map(|&v| v as f32).collect(),
            TypedBuffer::F32(b) => b.data().to_vec(),
        }
    }

    pub fn to_f32(&self) -> TypedBuffer {
        match self {
            TypedBuffer::F32(_) => self.clone(),
            _ => TypedBuffer::F32(Buffer::new(self.shape(), self.to_f32_vec())),
        }
    }
}

impl fmt::Debug for TypedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedBuffer")
            .field("dtype", &self.dtype_name())
            .field("shape", &self.shape())
            .finish()
    }
}
