// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Data unit and metadata types.
//!
//! A [`DataUnit`] is the payload of one logical unit of a dataset (one plane,
//! one tile, one chunk). Samples are stored as little-endian bytes together
//! with their element type and shape, so drivers can move them without
//! knowing the element type.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use super::error::{DatasetError, Result};

/// Dataset-level or unit-level metadata.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Element type of a data unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// 8-bit unsigned integer
    UInt8,
    /// 16-bit unsigned integer
    UInt16,
    /// 32-bit unsigned integer
    UInt32,
    /// 8-bit signed integer
    Int8,
    /// 16-bit signed integer
    Int16,
    /// 32-bit signed integer
    Int32,
    /// 32-bit float
    Float32,
    /// 64-bit float
    Float64,
}

impl DataType {
    /// Size of one element in bytes.
    pub const fn size(self) -> usize {
        match self {
            DataType::UInt8 | DataType::Int8 => 1,
            DataType::UInt16 | DataType::Int16 => 2,
            DataType::UInt32 | DataType::Int32 | DataType::Float32 => 4,
            DataType::Float64 => 8,
        }
    }

    /// Bytes needed for a buffer of `shape`, or `None` if it overflows.
    pub fn buffer_len(self, shape: &[usize]) -> Option<usize> {
        shape
            .iter()
            .try_fold(self.size(), |acc, &extent| acc.checked_mul(extent))
    }

    /// Like [`buffer_len`](DataType::buffer_len), failing with
    /// [`DatasetError::InvalidArgument`] on overflow.
    pub fn checked_buffer_len(self, shape: &[usize]) -> Result<usize> {
        self.buffer_len(shape).ok_or_else(|| {
            DatasetError::invalid_argument(
                "unit_shape",
                format!("{shape:?} of {self} overflows usize"),
            )
        })
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::UInt8 => "uint8",
            DataType::UInt16 => "uint16",
            DataType::UInt32 => "uint32",
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DataType {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "uint8" | "u8" => Ok(DataType::UInt8),
            "uint16" | "u16" => Ok(DataType::UInt16),
            "uint32" | "u32" => Ok(DataType::UInt32),
            "int8" | "i8" => Ok(DataType::Int8),
            "int16" | "i16" => Ok(DataType::Int16),
            "int32" | "i32" => Ok(DataType::Int32),
            "float32" | "f32" => Ok(DataType::Float32),
            "float64" | "f64" => Ok(DataType::Float64),
            _ => Err(DatasetError::invalid_argument(
                "dtype",
                format!("unknown data type '{s}'"),
            )),
        }
    }
}

/// One logical unit of data.
///
/// Two units are equal when element type, shape and content match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUnit {
    dtype: DataType,
    shape: Vec<usize>,
    bytes: Vec<u8>,
}

impl DataUnit {
    /// Create a unit from raw little-endian bytes.
    ///
    /// Fails if the byte length does not match `shape` and `dtype`.
    pub fn new(dtype: DataType, shape: Vec<usize>, bytes: Vec<u8>) -> Result<Self> {
        let expected = dtype.checked_buffer_len(&shape)?;
        if bytes.len() != expected {
            return Err(DatasetError::invalid_argument(
                "bytes",
                format!(
                    "{} bytes given, {:?} of {} needs {}",
                    bytes.len(),
                    shape,
                    dtype,
                    expected
                ),
            ));
        }
        Ok(Self {
            dtype,
            shape,
            bytes,
        })
    }

    /// Create a zero-filled unit.
    pub fn zeros(dtype: DataType, shape: Vec<usize>) -> Result<Self> {
        let len = dtype.checked_buffer_len(&shape)?;
        Ok(Self {
            dtype,
            shape,
            bytes: vec![0; len],
        })
    }

    /// Create a unit of `u8` samples.
    pub fn from_u8(shape: Vec<usize>, samples: &[u8]) -> Result<Self> {
        Self::new(DataType::UInt8, shape, samples.to_vec())
    }

    /// Create a unit of `u16` samples.
    pub fn from_u16(shape: Vec<usize>, samples: &[u16]) -> Result<Self> {
        let mut bytes = vec![0u8; samples.len() * 2];
        LittleEndian::write_u16_into(samples, &mut bytes);
        Self::new(DataType::UInt16, shape, bytes)
    }

    /// Create a unit of `f32` samples.
    pub fn from_f32(shape: Vec<usize>, samples: &[f32]) -> Result<Self> {
        let mut bytes = vec![0u8; samples.len() * 4];
        LittleEndian::write_f32_into(samples, &mut bytes);
        Self::new(DataType::Float32, shape, bytes)
    }

    /// Element type.
    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    /// Shape, slowest axis first.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Raw little-endian bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the unit and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Check if the unit holds no element.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples as `u16`, if that is the element type.
    pub fn to_u16(&self) -> Option<Vec<u16>> {
        if self.dtype != DataType::UInt16 {
            return None;
        }
        let mut out = vec![0u16; self.len()];
        LittleEndian::read_u16_into(&self.bytes, &mut out);
        Some(out)
    }

    /// Samples as `f32`, if that is the element type.
    pub fn to_f32(&self) -> Option<Vec<f32>> {
        if self.dtype != DataType::Float32 {
            return None;
        }
        let mut out = vec![0f32; self.len()];
        LittleEndian::read_f32_into(&self.bytes, &mut out);
        Some(out)
    }

    /// Check that this unit matches an expected element type and shape.
    pub fn check_layout(&self, dtype: DataType, shape: &[usize]) -> Result<()> {
        if self.dtype != dtype {
            return Err(DatasetError::invalid_argument(
                "data",
                format!("expected {dtype}, got {}", self.dtype),
            ));
        }
        if self.shape != shape {
            return Err(DatasetError::invalid_argument(
                "data",
                format!("expected shape {shape:?}, got {:?}", self.shape),
            ));
        }
        Ok(())
    }
}
