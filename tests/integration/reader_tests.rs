//! End-to-end tests of opening `.flim` files from disk.
//!
//! Tests verify:
//! - Files open through the extension check, TIFF decode and header parse
//! - Header errors abort the open
//! - Frame metadata and timestamps come back per request

use flim_reader::{
    FlimError, FlimReader, FlimUnits, GroupKind, Instrument, ParamValue, ReaderConfig,
};

use super::test_utils::{frame_description, pattern_frame, standard_file, Acquisition, FlimFileBuilder};

// =============================================================================
// Opening Files
// =============================================================================

#[test]
fn test_open_standard_file() {
    let dir = tempfile::tempdir().unwrap();
    let (acq, builder) = standard_file();
    let path = builder.write_to(dir.path(), "session.flim");

    let reader = FlimReader::open(&path, &ReaderConfig::default()).unwrap();
    assert_eq!(reader.num_frames(), 3);
    assert_eq!(reader.info().tensor_shape(), [1, acq.channels, acq.rows, acq.cols, acq.bins]);
    assert_eq!(reader.info().volume_size(), 2);
    assert!(reader.parameters().warnings().is_empty());

    let acq_group = reader.parameters().group(GroupKind::Acquisition);
    assert_eq!(acq_group.get_float("zoom").unwrap(), Some(12.5));
    assert_eq!(
        reader.parameters().group(GroupKind::MotorStage).get_float_seq("motorPosition").unwrap(),
        Some(vec![100.5, -20.25, 3000.0])
    );
    assert_eq!(
        reader.parameters().group(GroupKind::PhotonCounting).get("spcData.acq_mode"),
        &ParamValue::Text("histogram".to_string())
    );
}

#[test]
fn test_wrong_extension_rejected_before_reading() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does_not_exist.tif");

    match FlimReader::open(&missing, &ReaderConfig::default()) {
        Err(FlimError::UnsupportedFileType { extension }) => assert_eq!(extension, ".tif"),
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("gone.flim");
    assert!(matches!(
        FlimReader::open(&missing, &ReaderConfig::default()),
        Err(FlimError::Io(_))
    ));
}

#[test]
fn test_not_a_tiff() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.flim");
    std::fs::write(&path, b"this is not a tiff file at all").unwrap();
    assert!(matches!(
        FlimReader::open(&path, &ReaderConfig::default()),
        Err(FlimError::Tiff(_))
    ));
}

#[test]
fn test_wrong_marker_is_malformed_header() {
    let dir = tempfile::tempdir().unwrap();
    let acq = Acquisition::new(1, 2, 2, 4);
    let header = acq.header_text().replace("FLIMimage parameters", "SIimage parameters");
    let path = FlimFileBuilder::new(header)
        .add_frame(frame_description(0, "2023-01-01T00:00:00.000"), vec![0; acq.frame_len()])
        .write_to(dir.path(), "other.flim");

    assert!(matches!(
        FlimReader::open(&path, &ReaderConfig::default()),
        Err(FlimError::MalformedHeader { .. })
    ));
}

#[test]
fn test_missing_shape_field_is_incomplete() {
    let dir = tempfile::tempdir().unwrap();
    let acq = Acquisition::new(1, 2, 2, 4);
    let header = acq.header_text().replace("State.Acq.linesPerFrame = 2;\r\n", "");
    let path = FlimFileBuilder::new(header).write_to(dir.path(), "incomplete.flim");

    match FlimReader::open(&path, &ReaderConfig::default()) {
        Err(FlimError::IncompleteMetadata { field }) => assert_eq!(field, "State.Acq.linesPerFrame"),
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_missing_resolution_only_fails_on_time_axis() {
    let dir = tempfile::tempdir().unwrap();
    let acq = Acquisition::new(2, 2, 2, 4);
    let header = acq.header_text().replace("State.Spc.spcData.resolution", "State.Spc.spcData.unused");
    let path = FlimFileBuilder::new(header)
        .add_frame(frame_description(0, "2023-01-01T00:00:00.000"), vec![1; acq.frame_len()])
        .write_to(dir.path(), "no_resolution.flim");

    let reader = FlimReader::open(&path, &ReaderConfig::default()).unwrap();
    assert_eq!(reader.get_histogram(&[0], 1).unwrap().sum(), 4 * 4);
    match reader.histogram_time_axis(FlimUnits::Picoseconds, 0) {
        Err(FlimError::IncompleteMetadata { field }) => assert_eq!(field, "State.Spc.spcData.resolution"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_bad_literal_is_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let acq = Acquisition::new(1, 2, 2, 4);
    let header = acq
        .header_text()
        .replace("State.Acq.zoom = 12.5;", "State.Acq.zoom = eval('12.5');");
    let path = FlimFileBuilder::new(header).write_to(dir.path(), "warn.flim");

    let reader = FlimReader::open(&path, &ReaderConfig::default()).unwrap();
    assert_eq!(reader.num_frames(), 0);
    assert_eq!(reader.parameters().warnings().len(), 1);
    assert!(!reader.parameters().acquisition.is_set("zoom"));
}

#[test]
fn test_z_stack_shape() {
    let dir = tempfile::tempdir().unwrap();
    let acq = Acquisition::new(1, 2, 3, 4).with_slices(5);
    let path = FlimFileBuilder::new(acq.header_text())
        .add_frame(frame_description(0, "2023-01-01T00:00:00.000"), pattern_frame(acq.frame_len(), 9))
        .write_to(dir.path(), "stack.flim");

    let reader = FlimReader::open(&path, &ReaderConfig::default()).unwrap();
    assert_eq!(reader.info().tensor_shape(), [5, 1, 2, 3, 4]);
    assert_eq!(reader.info().volume_size(), 5);
    assert_eq!(reader.get_flim_frame(0).unwrap().shape(), &[5, 1, 2, 3, 4]);
}

// =============================================================================
// Frame Metadata
// =============================================================================

#[test]
fn test_frame_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let (acq, builder) = standard_file();
    let path = builder.write_to(dir.path(), "session.flim");
    let reader = FlimReader::open(&path, &ReaderConfig::default()).unwrap();

    let infos = reader.get_metadata(&[1, 2]).unwrap();
    assert_eq!(infos.len(), 2);
    assert_eq!(infos[0].frame_number, 1);
    assert_eq!(infos[0].attribute("Frame"), Some("1"));
    assert_eq!(infos[1].width(), Some(acq.frame_len() as u64));
    assert_eq!(infos[1].strip_offsets().map(<[u64]>::len), Some(4));
    assert_eq!(infos[0].strip_byte_counts(), Some(&[acq.frame_len() as u64 * 2][..]));
}

#[test]
fn test_frame_times() {
    let dir = tempfile::tempdir().unwrap();
    let (_, builder) = standard_file();
    let path = builder.write_to(dir.path(), "session.flim");
    let reader = FlimReader::open(&path, &ReaderConfig::default()).unwrap();

    let seconds = reader.get_time(&reader.all_frames(), None).unwrap();
    assert_eq!(seconds, vec![0.0, 1.5, 4.25]);

    let from_second = reader.get_time(&[2], reader.get_datetime(&[1]).unwrap().first().copied());
    assert_eq!(from_second.unwrap(), vec![2.75]);
}

#[test]
fn test_malformed_timestamp_scoped_to_request() {
    let dir = tempfile::tempdir().unwrap();
    let acq = Acquisition::new(1, 2, 2, 4);
    let path = FlimFileBuilder::new(acq.header_text())
        .add_frame(frame_description(0, "2023-01-01T00:00:00.000"), vec![1; acq.frame_len()])
        .add_frame(frame_description(1, "yesterday"), vec![2; acq.frame_len()])
        .write_to(dir.path(), "times.flim");
    let reader = FlimReader::open(&path, &ReaderConfig::default()).unwrap();

    assert!(reader.get_datetime(&[0]).is_ok());
    assert!(matches!(
        reader.get_datetime(&[0, 1]),
        Err(FlimError::MalformedTimestamp { frame: 1, .. })
    ));
    assert_eq!(reader.get_intensity_frame(1).unwrap().sum(), 2 * 16);
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_instrument_sets_conversion() {
    let dir = tempfile::tempdir().unwrap();
    let (_, builder) = standard_file();
    let path = builder.write_to(dir.path(), "session.flim");

    let multiharp = FlimReader::open(&path, &ReaderConfig::for_instrument(Instrument::Multiharp)).unwrap();
    let timeharp = FlimReader::open(&path, &ReaderConfig::for_instrument(Instrument::Timeharp)).unwrap();

    let one_bin_mh = multiharp
        .unit_converter()
        .convert(1.0, FlimUnits::ArrivalBins, FlimUnits::Picoseconds)
        .unwrap();
    let one_bin_th = timeharp
        .unit_converter()
        .convert(1.0, FlimUnits::ArrivalBins, FlimUnits::Picoseconds)
        .unwrap();
    assert_eq!(one_bin_mh, 20.0);
    assert_eq!(one_bin_th, 200.0);

    // The histogram axis follows the per-channel resolution recorded in the file.
    assert_eq!(
        multiharp.histogram_time_axis(FlimUnits::Picoseconds, 1).unwrap()[2],
        500.0
    );
}

#[test]
fn test_directory_cap_limits_frames() {
    let dir = tempfile::tempdir().unwrap();
    let (_, builder) = standard_file();
    let path = builder.write_to(dir.path(), "session.flim");

    let config = ReaderConfig {
        max_directories: 2,
        ..ReaderConfig::default()
    };
    let reader = FlimReader::open(&path, &config).unwrap();
    assert_eq!(reader.num_frames(), 1);
}
