//!
//! Numeric element types that can be stored in a [crate::CountMatrix].
//!
use std::fmt::{self, Debug, Display};
use std::ops::AddAssign;

use num_traits::{Num, NumCast};

///
/// Tag describing the element type of a matrix, mirroring the on-disk dtype names.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    I32,
    I64,
    U32,
    U64,
    F32,
    F64,
}

impl DType {
    pub fn is_integer(&self) -> bool {
        matches!(self, DType::I32 | DType::I64 | DType::U32 | DType::U64)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DType::I32 => "int32",
            DType::I64 => "int64",
            DType::U32 => "uint32",
            DType::U64 => "uint64",
            DType::F32 => "float32",
            DType::F64 => "float64",
        }
    }
}

impl Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

///
/// A value that can be stored as a matrix coefficient.
///
/// Implemented for the signed and unsigned 32/64-bit integers and both float widths.
/// The default count type is `i32`.
///
pub trait CountValue:
    Num + NumCast + Copy + Default + PartialOrd + AddAssign + Debug + Display + Send + Sync + 'static
{
    const DTYPE: DType;
}

macro_rules! impl_count_value {
    ($t:ty, $dtype:expr) => {
        impl CountValue for $t {
            const DTYPE: DType = $dtype;
        }
    };
}

impl_count_value!(i32, DType::I32);
impl_count_value!(i64, DType::I64);
impl_count_value!(u32, DType::U32);
impl_count_value!(u64, DType::U64);
impl_count_value!(f32, DType::F32);
impl_count_value!(f64, DType::F64);
