//! This module defines the data element API, which enables the loaders to
//! decode voxel values from raw bytes or text tokens and to read them back
//! as floating point numbers.
use crate::typedef::ElementType;
use crate::util::Endianness;
use bytemuck::Pod;
use num_traits::cast::{AsPrimitive, NumCast};

/// Trait type for characterizing a volume data element, implemented for
/// the primitive numeric types which are used by the crate to represent
/// voxel values.
pub trait DataElement:
    'static + Sized + Copy + Send + Sync + Pod + PartialOrd + NumCast + AsPrimitive<f32> + AsPrimitive<f64>
{
    /// The element type mapped to `Self`.
    const ELEMENT_TYPE: ElementType;

    /// Reverse the byte order of the value.
    fn swap_bytes(self) -> Self;

    /// Parse a single token of a text encoded data block.
    ///
    /// Integer types honour `radix`, floating point types always read
    /// decimal notation.
    fn from_token(token: &str, radix: u32) -> Option<Self>;

    /// Reinterpret a byte buffer as a vector of elements stored with the
    /// given byte order.
    ///
    /// Trailing bytes which do not form a whole element are ignored; the
    /// caller is responsible for checking the buffer length.
    fn from_raw_vec(bytes: &[u8], endianness: Endianness) -> Vec<Self> {
        let whole = bytes.len() - bytes.len() % std::mem::size_of::<Self>();
        let mut out: Vec<Self> = bytemuck::pod_collect_to_vec(&bytes[..whole]);
        if endianness != Endianness::native() {
            for v in &mut out {
                *v = v.swap_bytes();
            }
        }
        out
    }

    /// Convert the value to `f32`.
    #[inline]
    fn as_f32(self) -> f32 {
        AsPrimitive::<f32>::as_(self)
    }

    /// Convert the value to `f64`.
    #[inline]
    fn as_f64(self) -> f64 {
        AsPrimitive::<f64>::as_(self)
    }
}

fn parse_integer<T: NumCast>(token: &str, radix: u32) -> Option<T> {
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };
    let digits = if radix == 16 {
        digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
            .unwrap_or(digits)
    } else {
        digits
    };
    if digits.is_empty() || digits.starts_with(|c: char| c == '+' || c == '-') {
        return None;
    }
    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    let value = if negative { -magnitude } else { magnitude };
    NumCast::from(value)
}

macro_rules! impl_integer_element {
    ($t:ty, $e:ident) => {
        impl DataElement for $t {
            const ELEMENT_TYPE: ElementType = ElementType::$e;

            #[inline]
            fn swap_bytes(self) -> Self {
                <$t>::swap_bytes(self)
            }

            fn from_token(token: &str, radix: u32) -> Option<Self> {
                parse_integer(token, radix)
            }
        }
    };
}

impl_integer_element!(i8, Int8);
impl_integer_element!(u8, UInt8);
impl_integer_element!(i16, Int16);
impl_integer_element!(u16, UInt16);
impl_integer_element!(i32, Int32);
impl_integer_element!(u32, UInt32);

impl DataElement for f32 {
    const ELEMENT_TYPE: ElementType = ElementType::Float32;

    #[inline]
    fn swap_bytes(self) -> Self {
        f32::from_bits(self.to_bits().swap_bytes())
    }

    fn from_token(token: &str, _: u32) -> Option<Self> {
        token.parse().ok()
    }
}

impl DataElement for f64 {
    const ELEMENT_TYPE: ElementType = ElementType::Float64;

    #[inline]
    fn swap_bytes(self) -> Self {
        f64::from_bits(self.to_bits().swap_bytes())
    }

    fn from_token(token: &str, _: u32) -> Option<Self> {
        token.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_tokens() {
        assert_eq!(u8::from_token("255", 10), Some(255));
        assert_eq!(u8::from_token("256", 10), None);
        assert_eq!(i8::from_token("-128", 10), Some(-128));
        assert_eq!(u16::from_token("ff", 16), Some(255));
        assert_eq!(u16::from_token("0x1F", 16), Some(31));
        assert_eq!(i16::from_token("-10", 16), Some(-16));
        assert_eq!(u32::from_token("-1", 10), None);
        assert_eq!(i32::from_token("1.5", 10), None);
        assert_eq!(i32::from_token("--1", 10), None);
        assert_eq!(i32::from_token("", 10), None);
    }

    #[test]
    fn float_tokens() {
        assert_eq!(f32::from_token("1.5", 16), Some(1.5));
        assert_eq!(f64::from_token("-2e3", 10), Some(-2000.));
        assert_eq!(f32::from_token("abc", 10), None);
    }

    #[test]
    fn float_conversions() {
        assert_eq!(DataElement::as_f32(300u16), 300.);
        assert_eq!((-2i8).as_f64(), -2.);
        assert_eq!(u32::MAX.as_f64(), 4294967295.);
    }

    #[test]
    fn raw_vec_both_orders() {
        let le = [0x01, 0x02, 0x03, 0x04];
        assert_eq!(u16::from_raw_vec(&le, Endianness::Little), vec![0x0201, 0x0403]);
        assert_eq!(u16::from_raw_vec(&le, Endianness::Big), vec![0x0102, 0x0304]);
        // trailing partial element is dropped
        assert_eq!(u16::from_raw_vec(&le[..3], Endianness::Little), vec![0x0201]);

        let bytes = 1.25f32.to_be_bytes();
        assert_eq!(f32::from_raw_vec(&bytes, Endianness::Big), vec![1.25]);
    }
}
