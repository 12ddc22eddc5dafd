extern crate volren;
#[macro_use]
extern crate pretty_assertions;

use std::sync::Mutex;
use volren::dicom::{assemble, assemble_with, DicomOptions, DicomSlice};
use volren::error::ErrorKind;
use volren::{ElementType, SliceProgress, VolumeBuffer, VolumeError};

mod util;

use util::SliceSpec;

fn series(count: u16) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| SliceSpec::ramp(2, 3, i * 100).to_file())
        .collect()
}

#[test]
fn single_slice() {
    let file = SliceSpec::ramp(2, 3, 1000).with_thickness("2.5").to_file();
    let slice = DicomSlice::parse(&file).unwrap();
    assert_eq!(slice.dimensions(), (2, 3));
    assert_eq!(slice.bits_allocated, 16);
    assert_eq!(slice.bits_stored, Some(12));
    assert_eq!(slice.high_bit, Some(11));
    assert_eq!(slice.slice_thickness, Some(2.5));
    assert_eq!(slice.pixels, vec![1000., 1001., 1002., 1003., 1004., 1005.]);
    assert_eq!(slice.value_range(), Some((1000., 1005.)));
}

#[test]
fn three_slices() {
    let volume = assemble(&series(3)).unwrap();
    assert_eq!(volume.dimensions(), [3, 2, 3]);
    assert_eq!(volume.frame_count(), 1);
    assert_eq!(volume.source_type(), ElementType::Float32);
    assert_eq!(volume.value_range(), (0., 205.));
    assert_eq!(volume.density_range(), (0., 205.));
    assert_eq!(volume.voxel(2, 1, 2, 0), Some(205.));
    assert_eq!(volume.voxel(0, 0, 1, 0), Some(100.));
}

#[test]
fn mismatched_slice_fails_the_series() {
    let mut files = series(3);
    files.push(SliceSpec::ramp(2, 4, 0).to_file());
    for parallel in &[true, false] {
        let options = DicomOptions::default().with_parallel(*parallel);
        let err = assemble_with(&files, &options, &|_: SliceProgress| {}).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        match err {
            VolumeError::InconsistentSlices(..) => {}
            other => panic!("unexpected error {:?}", other),
        }
    }
}

#[test]
fn broken_slice_fails_the_series() {
    let mut files = series(2);
    let mut bad = SliceSpec::ramp(2, 3, 0);
    bad.bits_allocated = 8;
    files.push(bad.to_file());
    let err = assemble(&files).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);

    let mut files = series(2);
    let mut truncated = SliceSpec::ramp(2, 3, 0).to_file();
    truncated.truncate(truncated.len() - 3);
    files.push(truncated);
    assert_eq!(assemble(&files).unwrap_err().kind(), ErrorKind::Format);

    let empty: Vec<Vec<u8>> = Vec::new();
    match assemble(&empty) {
        Err(VolumeError::NoSlices) => {}
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn progress_is_monotonic() {
    let files = series(8);
    let seen = Mutex::new(Vec::new());
    let sink = |p: SliceProgress| seen.lock().unwrap().push(p);
    let _ = assemble_with(&files, &DicomOptions::default(), &sink).unwrap();

    let seen = seen.into_inner().unwrap();
    assert_eq!(seen.len(), 8);
    let fractions: Vec<f32> = seen.iter().map(SliceProgress::fraction).collect();
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
    assert!(fractions[..7].iter().all(|f| *f < 1.));
    assert_eq!(fractions[7], 1.);
    assert!(seen[7].is_complete());
}

#[test]
fn parallel_and_sequential_agree() {
    let files = series(6);
    let options = DicomOptions::default();
    let parallel = assemble_with(&files, &options, &|_: SliceProgress| {}).unwrap();
    let sequential =
        assemble_with(&files, &options.with_parallel(false), &|_: SliceProgress| {}).unwrap();
    assert_eq!(parallel, sequential);
    match parallel.data() {
        VolumeBuffer::Float32(v) => assert_eq!(v.len(), 36),
        other => panic!("unexpected buffer {:?}", other),
    }
}

#[test]
fn slice_thickness_scales_z() {
    let files: Vec<Vec<u8>> = (0..2)
        .map(|i| SliceSpec::ramp(4, 4, i).with_thickness("4").to_file())
        .collect();
    let volume = assemble(&files).unwrap();
    // extents 4, 4 and 8
    assert_eq!(volume.scale(), nalgebra::Vector3::new(0.5, 0.5, 1.));

    let flat = assemble_with(
        &files,
        &DicomOptions::default().with_slice_thickness(false),
        &|_: SliceProgress| {},
    )
    .unwrap();
    assert_eq!(flat.scale(), nalgebra::Vector3::new(1., 1., 0.5));
}
