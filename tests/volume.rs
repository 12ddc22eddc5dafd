extern crate flate2;
extern crate volren;
#[macro_use]
extern crate pretty_assertions;
#[macro_use]
extern crate approx;

use flate2::write::GzEncoder;
use flate2::Compression;
use nalgebra::{Point3, Vector3};
use std::io::Write;
use volren::error::ErrorKind;
use volren::{parse_nrrd, ElementType, FrameView, NrrdObject, VolumeBuffer, VolumeError};

mod util;

use util::{nrrd_file, nrrd_header, u16_le_bytes, MINIMAL_NRRD_HEADER};

#[test]
fn minimal_end_to_end() {
    let volume = parse_nrrd(&nrrd_file(MINIMAL_NRRD_HEADER, &[10, 20, 30, 40])).unwrap();
    assert_eq!(volume.dimensions(), [2, 2, 1]);
    assert_eq!(volume.frame_count(), 1);
    assert_eq!(volume.value_range(), (10., 40.));
    assert_eq!(volume.source_type(), ElementType::UInt8);
    assert_eq!(volume.density_range(), (0., 255.));
    assert_eq!(volume.voxel(1, 1, 0, 0), Some(40.));
    assert_eq!(volume.voxel(2, 0, 0, 0), None);
    assert_eq!(volume.scale(), Vector3::new(1., 1., 0.5));
}

#[test]
fn raw_u16_round_trip() {
    let values: Vec<u16> = (0..60).map(|v| v * 1000 + 7).collect();
    let header = nrrd_header("ushort", "raw", &[5, 4, 3]);
    let volume = parse_nrrd(&nrrd_file(&header, &u16_le_bytes(&values))).unwrap();
    assert_eq!(volume.dimensions(), [5, 4, 3]);
    assert_eq!(volume.data(), &VolumeBuffer::UInt16(values.clone()));
    assert_eq!(volume.frame(0).unwrap().as_slice::<u16>(), Some(&values[..]));
    assert_eq!(volume.value_range(), (7., 59007.));
}

#[test]
fn gzip_round_trip() {
    let values: Vec<u16> = (0..64).map(|v| v * 3).collect();
    let raw = u16_le_bytes(&values);
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw).unwrap();
    let compressed = encoder.finish().unwrap();

    for encoding in &["gzip", "gz"] {
        let header = nrrd_header("uint16", encoding, &[4, 4, 4]);
        let obj = NrrdObject::from_bytes(&nrrd_file(&header, &compressed)).unwrap();
        let got = obj.volume().frame(0).unwrap().as_slice::<u16>().unwrap();
        let got_bytes: Vec<u8> = got.iter().flat_map(|v| v.to_le_bytes().to_vec()).collect();
        assert_eq!(got_bytes, raw);
    }
}

#[test]
fn corrupted_gzip_is_a_format_error() {
    let header = nrrd_header("uint8", "gzip", &[2, 2, 1]);
    let err = parse_nrrd(&nrrd_file(&header, b"not gzip at all")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn huge_declared_sizes_fail_cleanly() {
    // nothing is allocated up front for the declared size
    let header = nrrd_header("uchar", "gzip", &[1_000_000, 1_000_000, 100_000]);
    let err = parse_nrrd(&nrrd_file(&header, &[0x1f, 0x8b])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&[1, 2, 3, 4]).unwrap();
    let err = parse_nrrd(&nrrd_file(&header, &encoder.finish().unwrap())).unwrap_err();
    match err {
        VolumeError::SizeMismatch(expected, 4) => assert_eq!(expected, 100_000_000_000_000_000),
        other => panic!("unexpected error {:?}", other),
    }

    let header = "NRRD0004\ntype: uchar\nsizes: 4294967296 4294967296 2\nencoding: raw\n\n";
    match parse_nrrd(&nrrd_file(header, &[0; 8])) {
        Err(VolumeError::InvalidField(field, _)) => assert_eq!(field, "sizes"),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn text_encodings() {
    let header = nrrd_header("short", "ascii", &[2, 2, 1]);
    let volume = parse_nrrd(&nrrd_file(&header, b"-3 4\n\t5\r\n  -6\n")).unwrap();
    assert_eq!(volume.data(), &VolumeBuffer::Int16(vec![-3, 4, 5, -6]));
    assert_eq!(volume.density_range(), (-32768., 32767.));

    let header = nrrd_header("uchar", "hex", &[2, 2, 1]);
    let volume = parse_nrrd(&nrrd_file(&header, b"0a ff 10 0")).unwrap();
    assert_eq!(volume.data(), &VolumeBuffer::UInt8(vec![10, 255, 16, 0]));

    let header = nrrd_header("float", "text", &[3, 1, 1]);
    let volume = parse_nrrd(&nrrd_file(&header, b"0.5 -1.25 2e3")).unwrap();
    assert_eq!(volume.value_range(), (-1.25, 2000.));
    assert_eq!(volume.density_range(), (-1.25, 2000.));
}

#[test]
fn bad_tokens_and_sizes() {
    let header = nrrd_header("short", "ascii", &[2, 1, 1]);
    match parse_nrrd(&nrrd_file(&header, b"1 banana")) {
        Err(VolumeError::InvalidDataToken(token)) => assert_eq!(token, "banana"),
        other => panic!("unexpected result {:?}", other),
    }
    let err = parse_nrrd(&nrrd_file(&header, b"1 2 3")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);

    let header = nrrd_header("ushort", "raw", &[2, 2, 1]);
    match parse_nrrd(&nrrd_file(&header, &[0; 7])) {
        Err(VolumeError::SizeMismatch(..)) => {}
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn doubles_are_stored_as_floats() {
    let values = [0.25f64, -8., 1e10, 3.];
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes().to_vec()).collect();
    let header = nrrd_header("double", "raw", &[2, 2, 1]);
    let volume = parse_nrrd(&nrrd_file(&header, &bytes)).unwrap();
    assert_eq!(volume.source_type(), ElementType::Float64);
    assert_eq!(volume.element_type(), ElementType::Float32);
    assert_eq!(volume.voxel(0, 1, 0, 0), Some(1e10));
}

#[test]
fn frames_alias_the_buffer() {
    let header = nrrd_header("uchar", "raw", &[2, 2, 2, 4]);
    let data: Vec<u8> = (0..32).collect();
    let volume = parse_nrrd(&nrrd_file(&header, &data)).unwrap();
    assert_eq!(volume.frame_count(), 4);
    assert_eq!(volume.frame_size(), 8);

    let all = match volume.data() {
        VolumeBuffer::UInt8(v) => v.as_ptr(),
        other => panic!("unexpected buffer {:?}", other),
    };
    for i in 0..4 {
        let frame = volume.frame(i).unwrap();
        let start = i * 8;
        assert_eq!(frame, FrameView::UInt8(&data[start..start + 8]));
        let slice = frame.as_slice::<u8>().unwrap();
        assert_eq!(slice.as_ptr(), all.wrapping_add(start));
    }
    let err = volume.frame(4).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Index);
    assert_eq!(volume.voxel(1, 1, 1, 3), Some(31.));
}

#[test]
fn spatial_placement() {
    let header = "NRRD0004\ntype: uchar\ndimension: 3\nsizes: 4 2 2\n\
                  space: left-posterior-superior\n\
                  space directions: (2,0,0) (0,3,0) (0,0,4)\n\
                  space origin: (10,20,30)\nencoding: raw\n\n";
    let volume = parse_nrrd(&nrrd_file(header, &[0; 16])).unwrap();
    let ras = volume.voxel_to_physical(&Point3::new(1., 1., 1.));
    assert_abs_diff_eq!(ras, Point3::new(-12., -23., 34.), epsilon = 1e-5);
    let ijk = volume.physical_to_voxel(&ras);
    assert_abs_diff_eq!(ijk, Point3::new(1., 1., 1.), epsilon = 1e-5);
    // extents 8, 6 and 8
    assert_abs_diff_eq!(volume.scale(), Vector3::new(1., 0.75, 1.), epsilon = 1e-6);

    let header = "NRRD0004\ntype: uchar\nsizes: 1 1 1\n\
                  space directions: (1,0,0) none (0,0,1)\nencoding: raw\n\n";
    match parse_nrrd(&nrrd_file(header, &[0])) {
        Err(VolumeError::NonInvertibleTransform) => {}
        other => panic!("unexpected result {:?}", other),
    }
}

#[cfg(feature = "ndarray_volumes")]
mod ndarray_volumes {
    use super::util::{nrrd_file, nrrd_header};
    use volren::volume::ndarray::frame_array_view;
    use volren::{parse_nrrd, IntoNdArray};

    #[test]
    fn frame_as_array() {
        let header = nrrd_header("short", "ascii", &[3, 2, 1, 2]);
        let volume =
            parse_nrrd(&nrrd_file(&header, b"0 1 2 3 4 5 10 11 12 13 14 15")).unwrap();
        let arr = volume.to_ndarray(1).unwrap();
        assert_eq!(arr.shape(), &[1, 2, 3]);
        assert_eq!(arr[[0, 1, 2]], 15.);
        assert_eq!(arr[[0, 0, 1]], 11.);

        let frame = volume.frame(0).unwrap();
        let view = frame_array_view::<i16>(&frame, volume.dimensions()).unwrap();
        assert_eq!(view[[0, 1, 0]], 3);
        assert!(volume.to_ndarray(2).is_err());
    }
}
