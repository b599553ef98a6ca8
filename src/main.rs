extern crate bem;

use anyhow::{anyhow, bail};
use bem::output::FileOutput;
use bem::reference_data::ReferenceData;
use bem::{run_project, ProjectFlags};
use clap::Parser;
use rayon::prelude::*;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Default, Debug)]
#[clap(author, version, about, long_about = None)]
struct BemArgs {
    /// Assessment input JSON files; several are assessed in parallel
    #[arg(required = true)]
    input_files: Vec<PathBuf>,
    /// Reference data bundle in JSON, in place of the built-in SAP 2012 tables
    #[arg(long, short)]
    reference_data: Option<PathBuf>,
    /// Directory for results, by default alongside each input file
    #[arg(long, short)]
    output_dir: Option<PathBuf>,
    /// Only write out the input with defaults filled in
    #[arg(long, short, default_value_t = false)]
    preprocess_only: bool,
    /// Skip the monthly CSV table
    #[arg(long, default_value_t = false)]
    no_csv: bool,
}

fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = BemArgs::parse();

    let reference_data = match &args.reference_data {
        Some(path) => ReferenceData::from_json(BufReader::new(File::open(path)?))?,
        None => ReferenceData::sap_2012()?,
    };

    let mut flags = ProjectFlags::empty();
    if args.preprocess_only {
        flags.insert(ProjectFlags::PREPROCESS_ONLY);
    }
    if !args.no_csv {
        flags.insert(ProjectFlags::WRITE_MONTHLY_CSV);
    }

    let failures = args
        .input_files
        .par_iter()
        .filter_map(|input_file| {
            run_input_file(input_file, args.output_dir.as_deref(), &reference_data, &flags)
                .map_err(|e| error!("{}: {e:#}", input_file.display()))
                .err()
        })
        .count();

    if failures > 0 {
        bail!("{failures} of {} assessments failed", args.input_files.len());
    }

    Ok(())
}

fn run_input_file(
    input_file: &Path,
    output_dir: Option<&Path>,
    reference_data: &ReferenceData,
    flags: &ProjectFlags,
) -> anyhow::Result<()> {
    let input_stem = input_file
        .file_stem()
        .ok_or_else(|| anyhow!("Could not determine input file name"))?
        .to_string_lossy()
        .to_string();
    let output_path = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => input_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    std::fs::create_dir_all(&output_path)?;

    let file_output = FileOutput::new(output_path, format!("{input_stem}__{{}}.{{}}"));

    info!("Assessing {}", input_file.display());
    let assessment = run_project(
        BufReader::new(File::open(input_file)?),
        &file_output,
        reference_data,
        flags,
    )?;

    if let Some(assessment) = assessment {
        info!(
            "{input_stem}: rating {:.0}, {:.0} kWh/year delivered, £{:.2}/year net",
            assessment.sap.rating, assessment.energy_use, assessment.net_cost
        );
    }

    Ok(())
}
