//! Experiment description and loop timeline.

use tracing::debug;

use super::model::{Experiment, ExperimentLoop};
use crate::format::{Field, Variant};

/// Loop type code of a stimulation loop.
const STIMULATION_LOOP_TYPE: u64 = 6;

/// Parse the experiment from the image metadata section.
///
/// Without an `SLxExperiment` tree the description is "unknown" and there
/// are no loops.
pub fn parse_experiment(image_metadata: Option<&Variant>) -> Experiment {
    let mut experiment = Experiment::default();

    let Some(raw) = image_metadata.and_then(|m| m.field(Field::Experiment)) else {
        debug!("No experiment tree in image metadata");
        return experiment;
    };

    if let Some(description) = raw
        .field(Field::ApplicationDescription)
        .and_then(Variant::as_str)
    {
        experiment.description = description.to_string();
    }

    if let Some(loop_pars) = raw.field(Field::LoopParameters) {
        experiment.loops = parse_loops(loop_pars);
    }

    experiment
}

/// Parse the `uLoopPars` tree into loops with cumulative start offsets.
///
/// The loop records are the first entry of `pPeriod`. If any record is
/// incomplete the whole timeline is dropped, since later start offsets
/// depend on every earlier duration.
pub fn parse_loops(loop_pars: &Variant) -> Vec<ExperimentLoop> {
    let period_count = loop_pars.u64_field(Field::PeriodCount).unwrap_or(0);
    if period_count == 0 {
        return Vec::new();
    }

    let Some((_, group)) = loop_pars
        .field(Field::Periods)
        .and_then(Variant::entries)
        .and_then(|entries| entries.first())
    else {
        return Vec::new();
    };

    let records: &[Variant] = match group {
        Variant::List(items) => items,
        single @ Variant::Map(_) => std::slice::from_ref(single),
        other => {
            debug!(kind = other.kind_name(), "Unexpected loop group node, no loops");
            return Vec::new();
        }
    };

    let mut loops = Vec::with_capacity(records.len());
    let mut start = 0.0;
    for (index, record) in records.iter().enumerate() {
        let Some(parsed) = parse_loop(record, start) else {
            debug!(index, "Incomplete loop record, dropping loop timeline");
            return Vec::new();
        };
        start += parsed.duration;
        loops.push(parsed);
    }

    loops
}

fn parse_loop(record: &Variant, start: f64) -> Option<ExperimentLoop> {
    Some(ExperimentLoop {
        start,
        duration: record.f64_field(Field::Duration)?,
        stimulation: record.u64_field(Field::LoopType)? == STIMULATION_LOOP_TYPE,
        sampling_interval: record.f64_field(Field::AveragePeriodDiff)?,
    })
}
