pub mod core;
mod defaults;
pub mod errors;
mod external_conditions;
pub mod input;
pub mod output;
pub mod reference_data;
pub mod store;

#[cfg(test)]
mod tests;

use crate::core::assessment::{Assessment, GainCategory, LossCategory};
use crate::core::monthly::MonthVector;
use crate::core::pipeline::Pipeline;
use crate::errors::{BemError, OutputError};
use crate::input::{ingest_for_processing, InputForProcessing};
use crate::output::Output;
use crate::reference_data::ReferenceData;
use bitflags::bitflags;
use csv::WriterBuilder;
use itertools::Itertools;
use std::borrow::Cow;
use std::io::Read;
use strum::IntoEnumIterator;
use tracing::debug;

pub const RESULTS_LOCATION_KEY: &str = "results";
pub const MONTHLY_LOCATION_KEY: &str = "monthly";
pub const PREPROCESSED_LOCATION_KEY: &str = "preproc";

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct ProjectFlags: u8 {
        /// Write out the input with every default filled in, and stop there.
        const PREPROCESS_ONLY = 0b1;
        const WRITE_MONTHLY_CSV = 0b10;
    }
}

/// Assess the dwelling described by the JSON `input`, writing results to `output`.
///
/// The completed input (defaults merged in) is always written. Unless only preprocessing was
/// asked for, the full assessment record follows, plus the monthly table if flagged, and the
/// record is returned.
pub fn run_project(
    input: impl Read,
    output: impl Output,
    reference_data: &ReferenceData,
    flags: &ProjectFlags,
) -> Result<Option<Assessment>, BemError> {
    let pipeline = Pipeline::standard();
    let mut input_for_processing = ingest_for_processing(input)?;
    pipeline.apply_defaults(&mut input_for_processing, reference_data);

    if !output.is_noop() {
        write_preprocessed_input(&output, &input_for_processing)
            .map_err(|e| BemError::ErrorInOutput(OutputError::new(e)))?;
    }

    if flags.contains(ProjectFlags::PREPROCESS_ONLY) {
        return Ok(None);
    }

    let input = input_for_processing.finalize()?;
    let assessment = pipeline.run(input, reference_data)?;
    debug!(
        "Assessment complete with rating {:.1}",
        assessment.sap.rating
    );

    if !output.is_noop() {
        write_results(&output, &assessment)
            .map_err(|e| BemError::ErrorInOutput(OutputError::new(e)))?;
        if flags.contains(ProjectFlags::WRITE_MONTHLY_CSV) {
            write_monthly_output_file(&output, &assessment)
                .map_err(|e| BemError::ErrorInOutput(OutputError::new(e)))?;
        }
    }

    Ok(Some(assessment))
}

/// Assess an input without writing anything out.
pub fn calculate(
    input: InputForProcessing,
    reference_data: &ReferenceData,
) -> Result<Assessment, BemError> {
    let pipeline = Pipeline::standard();
    let input = pipeline.prepare(input, reference_data)?;

    Ok(pipeline.run(input, reference_data)?)
}

fn write_preprocessed_input(
    output: &impl Output,
    input: &InputForProcessing,
) -> anyhow::Result<()> {
    let writer = output.writer_for_location_key(PREPROCESSED_LOCATION_KEY, "json")?;
    serde_json::to_writer_pretty(writer, input.as_json())?;

    Ok(())
}

fn write_results(output: &impl Output, assessment: &Assessment) -> anyhow::Result<()> {
    let writer = output.writer_for_location_key(RESULTS_LOCATION_KEY, "json")?;
    serde_json::to_writer_pretty(writer, assessment)?;

    Ok(())
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Write a heading row, a units row, then one row per month.
fn write_monthly_output_file(output: &impl Output, assessment: &Assessment) -> anyhow::Result<()> {
    let writer = output.writer_for_location_key(MONTHLY_LOCATION_KEY, "csv")?;
    let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);

    let mut columns: Vec<(Cow<'static, str>, &'static str, MonthVector)> = vec![
        (
            "External temperature".into(),
            "[deg C]",
            assessment.external_temperature,
        ),
        (
            "Internal temperature".into(),
            "[deg C]",
            assessment.internal_temperature,
        ),
    ];
    for category in LossCategory::iter() {
        columns.push((
            format!("{category} heat loss").into(),
            "[W/K]",
            assessment
                .losses
                .get(category)
                .copied()
                .unwrap_or_default(),
        ));
    }
    for category in GainCategory::iter() {
        columns.push((
            format!("{category} gains").into(),
            "[W]",
            assessment.gains.get(category).copied().unwrap_or_default(),
        ));
    }
    let space_heating = &assessment.space_heating;
    columns.extend([
        (
            "Utilisation factor".into(),
            "[ratio]",
            space_heating.utilisation_factor,
        ),
        ("Useful gains".into(), "[W]", space_heating.useful_gains),
        (
            "Space heat demand".into(),
            "[kWh]",
            space_heating.heat_demand_kwh,
        ),
        (
            "Space cool demand".into(),
            "[kWh]",
            space_heating.cooling_demand_kwh,
        ),
        (
            "Hot water heater output".into(),
            "[kWh]",
            assessment.water_heating.hot_water_heater_output,
        ),
    ]);

    let headings = ["Month"]
        .into_iter()
        .chain(columns.iter().map(|(heading, _, _)| heading.as_ref()))
        .collect_vec();
    let units_row = ["[month]"]
        .into_iter()
        .chain(columns.iter().map(|(_, units, _)| *units))
        .collect_vec();
    writer.write_record(&headings)?;
    writer.write_record(&units_row)?;

    for (month_idx, month) in MONTH_NAMES.iter().enumerate() {
        let row = [month.to_string()]
            .into_iter()
            .chain(
                columns
                    .iter()
                    .map(|(_, _, values)| values[month_idx].to_string()),
            )
            .collect_vec();
        writer.write_record(&row)?;
    }

    writer.flush()?;

    Ok(())
}
