//! Typed storage of decoded voxel values.
//!
//! A [`VolumeBuffer`] owns the values of every frame of a dataset in a single
//! contiguous vector of one of the storage element types. A [`FrameView`]
//! borrows a sub-range of it without copying.
use super::element::DataElement;
use crate::typedef::ElementType;

/// Owned, contiguous voxel values of a single element type.
#[derive(Debug, Clone, PartialEq)]
pub enum VolumeBuffer {
    /// signed char values
    Int8(Vec<i8>),
    /// unsigned char values
    UInt8(Vec<u8>),
    /// signed short values
    Int16(Vec<i16>),
    /// unsigned short values
    UInt16(Vec<u16>),
    /// signed int values
    Int32(Vec<i32>),
    /// unsigned int values
    UInt32(Vec<u32>),
    /// 32 bit float values
    Float32(Vec<f32>),
}

/// A borrowed run of voxel values, such as a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameView<'a> {
    /// signed char values
    Int8(&'a [i8]),
    /// unsigned char values
    UInt8(&'a [u8]),
    /// signed short values
    Int16(&'a [i16]),
    /// unsigned short values
    UInt16(&'a [u16]),
    /// signed int values
    Int32(&'a [i32]),
    /// unsigned int values
    UInt32(&'a [u32]),
    /// 32 bit float values
    Float32(&'a [f32]),
}

macro_rules! each_variant {
    ($ty:ident, $value:expr, $v:ident => $body:expr) => {
        match $value {
            $ty::Int8($v) => $body,
            $ty::UInt8($v) => $body,
            $ty::Int16($v) => $body,
            $ty::UInt16($v) => $body,
            $ty::Int32($v) => $body,
            $ty::UInt32($v) => $body,
            $ty::Float32($v) => $body,
        }
    };
}

fn min_max<T: DataElement>(values: &[T]) -> Option<(f64, f64)> {
    let mut it = values.iter();
    let first = it.next()?.as_f64();
    let (lo, hi) = it.fold((first, first), |(lo, hi), v| {
        let v = v.as_f64();
        (lo.min(v), hi.max(v))
    });
    Some((lo, hi))
}

fn as_typed<A: DataElement, T: DataElement>(values: &[A]) -> Option<&[T]> {
    if A::ELEMENT_TYPE == T::ELEMENT_TYPE {
        Some(bytemuck::cast_slice(values))
    } else {
        None
    }
}

impl VolumeBuffer {
    /// Narrow double precision values to the `Float32` storage type.
    pub fn from_f64(values: Vec<f64>) -> Self {
        VolumeBuffer::Float32(values.into_iter().map(|v| v as f32).collect())
    }

    /// The storage element type.
    pub fn element_type(&self) -> ElementType {
        each_variant!(VolumeBuffer, self, v => element_type_of(v.as_slice()))
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        each_variant!(VolumeBuffer, self, v => v.len())
    }

    /// Whether the buffer holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Minimum and maximum of all values, or `None` if empty.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.view().value_range()
    }

    /// Borrow the whole buffer.
    pub fn view(&self) -> FrameView<'_> {
        each_variant!(VolumeBuffer, self, v => FrameView::from(v.as_slice()))
    }

    /// Borrow the values in `start..start + len`, or `None` when out of range.
    pub fn slice(&self, start: usize, len: usize) -> Option<FrameView<'_>> {
        let end = start.checked_add(len)?;
        if end > self.len() {
            return None;
        }
        Some(each_variant!(VolumeBuffer, self, v => FrameView::from(&v[start..end])))
    }
}

fn element_type_of<T: DataElement>(_: &[T]) -> ElementType {
    T::ELEMENT_TYPE
}

impl<'a> FrameView<'a> {
    /// The storage element type.
    pub fn element_type(&self) -> ElementType {
        each_variant!(FrameView, *self, v => element_type_of(v))
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        each_variant!(FrameView, *self, v => v.len())
    }

    /// Whether the view holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch the value at `index` as `f32`.
    #[inline]
    pub fn get_f32(&self, index: usize) -> Option<f32> {
        each_variant!(FrameView, *self, v => v.get(index).map(|x| x.as_f32()))
    }

    /// Borrow the values with their concrete type, if it is `T`.
    pub fn as_slice<T: DataElement>(&self) -> Option<&'a [T]> {
        each_variant!(FrameView, *self, v => as_typed(v))
    }

    /// Copy all values out as `f32`.
    pub fn to_f32_vec(&self) -> Vec<f32> {
        each_variant!(FrameView, *self, v => v.iter().map(|x| x.as_f32()).collect())
    }

    /// Minimum and maximum of the values, or `None` if empty.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        each_variant!(FrameView, *self, v => min_max(v))
    }
}

macro_rules! impl_from {
    ($t:ty, $e:ident) => {
        impl From<Vec<$t>> for VolumeBuffer {
            fn from(v: Vec<$t>) -> Self {
                VolumeBuffer::$e(v)
            }
        }

        impl<'a> From<&'a [$t]> for FrameView<'a> {
            fn from(v: &'a [$t]) -> Self {
                FrameView::$e(v)
            }
        }
    };
}

impl_from!(i8, Int8);
impl_from!(u8, UInt8);
impl_from!(i16, Int16);
impl_from!(u16, UInt16);
impl_from!(i32, Int32);
impl_from!(u32, UInt32);
impl_from!(f32, Float32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_alias_the_buffer() {
        let buffer = VolumeBuffer::from(vec![1u16, 2, 3, 4, 5, 6]);
        let view = buffer.slice(2, 2).unwrap();
        assert_eq!(view.len(), 2);
        assert_eq!(view.get_f32(1), Some(4.));
        assert_eq!(view.get_f32(2), None);
        let typed = view.as_slice::<u16>().unwrap();
        assert_eq!(typed, &[3, 4]);
        match &buffer {
            VolumeBuffer::UInt16(v) => assert_eq!(typed.as_ptr(), v[2..].as_ptr()),
            _ => unreachable!(),
        }
        assert!(view.as_slice::<i16>().is_none());
        assert!(buffer.slice(5, 2).is_none());
    }

    #[test]
    fn ranges() {
        let buffer = VolumeBuffer::from(vec![-3i8, 7, 0]);
        assert_eq!(buffer.element_type(), ElementType::Int8);
        assert_eq!(buffer.value_range(), Some((-3., 7.)));
        assert_eq!(VolumeBuffer::from(Vec::<f32>::new()).value_range(), None);
    }

    #[test]
    fn float_access() {
        let buffer = VolumeBuffer::from(vec![0u32, 70000, 3]);
        let view = buffer.slice(1, 2).unwrap();
        assert_eq!(view.get_f32(0), Some(70000.));
        assert_eq!(view.get_f32(2), None);
        assert_eq!(view.to_f32_vec(), vec![70000., 3.]);
        assert_eq!(view.value_range(), Some((3., 70000.)));
    }

    #[test]
    fn narrowing() {
        let buffer = VolumeBuffer::from_f64(vec![0.5, -1e3]);
        assert_eq!(buffer, VolumeBuffer::Float32(vec![0.5, -1000.]));
    }
}
