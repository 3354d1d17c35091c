//! Scoring lifetime models against histograms read from disk.
//!
//! Tests verify:
//! - The generating model scores better than a wrong one
//! - Models in time units must be converted before scoring
//! - Pooling identical frames scales both scores predictably

use flim_reader::{
    monoexponential_probability, Exp, FlimError, FlimParams, FlimReader, FlimUnits, Irf,
    ReaderConfig,
};

use super::test_utils::{frame_description, Acquisition, FlimFileBuilder};

const BINS: usize = 64;
const PHOTONS: f64 = 20_000.0;
const TAU_BINS: f64 = 8.0;
const SIGMA_BINS: f64 = 1.5;
const OFFSET_BINS: f64 = 6.0;

/// Channel 0 is flat; channel 1 follows a single exponential decay.
fn decay_frame() -> Vec<u16> {
    let flat = vec![5u16; BINS];
    let decay = (0..BINS).map(|bin| {
        let p = monoexponential_probability(bin as f64 - OFFSET_BINS, TAU_BINS, SIGMA_BINS, true);
        (PHOTONS * p).round() as u16
    });
    flat.into_iter().chain(decay).collect()
}

fn open_decay_file(dir: &std::path::Path, frames: usize) -> flim_reader::FlimFileReader {
    let acq = Acquisition::new(2, 1, 1, BINS);
    let mut builder = FlimFileBuilder::new(acq.header_text());
    for frame in 0..frames {
        let timestamp = format!("2023-01-01T00:00:{:02}.000", frame);
        builder = builder.add_frame(frame_description(frame, &timestamp), decay_frame());
    }
    let path = builder.write_to(dir, "decay.flim");

    let config = ReaderConfig {
        base_resolution_ps: Some(acq.resolution_ps),
        ..ReaderConfig::default()
    };
    FlimReader::open(&path, &config).unwrap()
}

fn model(tau: f64) -> FlimParams {
    FlimParams::new(
        vec![Exp::new(tau, 1.0)],
        Irf::new(SIGMA_BINS, OFFSET_BINS),
        1,
        FlimUnits::ArrivalBins,
    )
}

#[test]
fn test_generating_model_scores_best() {
    let dir = tempfile::tempdir().unwrap();
    let reader = open_decay_file(dir.path(), 1);

    let truth = model(TAU_BINS);
    let wrong = model(3.0);

    let chi_truth = reader.chi_squared(&truth, &[0]).unwrap();
    let chi_wrong = reader.chi_squared(&wrong, &[0]).unwrap();
    assert!(chi_truth >= 0.0);
    assert!(chi_truth < chi_wrong);

    let ll_truth = reader.log_likelihood(&truth, &[0]).unwrap();
    let ll_wrong = reader.log_likelihood(&wrong, &[0]).unwrap();
    assert!(ll_truth < 0.0);
    assert!(ll_truth > ll_wrong);
}

#[test]
fn test_time_unit_models_need_conversion() {
    let dir = tempfile::tempdir().unwrap();
    let reader = open_decay_file(dir.path(), 1);

    // 250 ps bins: 2 ns decay, 0.375 ns IRF width, 1.5 ns offset
    let in_ns = FlimParams::new(
        vec![Exp::new(2.0, 1.0)],
        Irf::new(0.375, 1.5),
        1,
        FlimUnits::Nanoseconds,
    );
    assert!(matches!(
        reader.chi_squared(&in_ns, &[0]),
        Err(FlimError::IncompatibleUnits { from: FlimUnits::Nanoseconds, to: FlimUnits::ArrivalBins })
    ));

    let in_bins = in_ns
        .convert_units(FlimUnits::ArrivalBins, &reader.unit_converter())
        .unwrap();
    assert_eq!(in_bins.param_vec(), vec![TAU_BINS, 1.0, SIGMA_BINS, OFFSET_BINS]);
    assert_eq!(
        reader.chi_squared(&in_bins, &[0]).unwrap(),
        reader.chi_squared(&model(TAU_BINS), &[0]).unwrap()
    );
}

#[test]
fn test_pooled_frames_scale_scores() {
    let dir = tempfile::tempdir().unwrap();
    let reader = open_decay_file(dir.path(), 2);
    let wrong = model(4.0);

    let single = reader.chi_squared(&wrong, &[0]).unwrap();
    let pooled = reader.chi_squared(&wrong, &[0, 1]).unwrap();
    // Doubling every count quadruples each squared residual.
    assert!((pooled - 4.0 * single).abs() < 1e-6 * pooled.abs().max(1.0));

    let ll_single = reader.log_likelihood(&wrong, &[0]).unwrap();
    let ll_pooled = reader.log_likelihood(&wrong, &[0, 1]).unwrap();
    assert!((ll_pooled - 2.0 * ll_single).abs() < 1e-6 * ll_pooled.abs());
}

#[test]
fn test_scoring_channel_out_of_range() {
    let dir = tempfile::tempdir().unwrap();
    let reader = open_decay_file(dir.path(), 1);

    let params = FlimParams::new(
        vec![Exp::new(TAU_BINS, 1.0)],
        Irf::new(SIGMA_BINS, OFFSET_BINS),
        2,
        FlimUnits::ArrivalBins,
    );
    assert!(matches!(
        reader.log_likelihood(&params, &[0]),
        Err(FlimError::ChannelOutOfRange { channel: 2, channels: 2 })
    ));
}
