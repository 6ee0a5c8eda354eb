// ========================================================================================
//
//                      THE COMMAND-LINE ENTRY POINT: PHENOFAM
//
// ========================================================================================
//
// Parses arguments, layers the optional config file and flags over the built-in
// defaults, runs the pipeline, and turns its outcome into an exit status. All real
// work lives in the library; this file owns only process-level concerns.

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use phenofam::config::{RunConfig, Settings};
use phenofam::pipeline::{self, EXIT_USAGE};
use phenofam::types::PhenotypeCoding;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

// ========================================================================================
//                         COMMAND-LINE INTERFACE DEFINITION
// ========================================================================================

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CodingCli {
    /// Cases are written as unaffected (1), controls as affected (2)
    Legacy,
    /// Cases are written as affected (2), controls as unaffected (1)
    Conventional,
}

impl From<CodingCli> for PhenotypeCoding {
    fn from(value: CodingCli) -> Self {
        match value {
            CodingCli::Legacy => PhenotypeCoding::Legacy,
            CodingCli::Conventional => PhenotypeCoding::Conventional,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "phenofam",
    version,
    about = "Fill the phenotype column of a PLINK .fam file from case and control ID lists."
)]
struct Args {
    /// Path to the PLINK .fam file to annotate.
    fam_path: PathBuf,

    /// Case ID list, one source-namespace ID per line [default: cases.IDs]
    #[arg(long, value_name = "PATH")]
    cases: Option<PathBuf>,

    /// Control ID list, one source-namespace ID per line [default: controls.IDs]
    #[arg(long, value_name = "PATH")]
    controls: Option<PathBuf>,

    /// Tab-separated source-to-target ID mapping with a header row [default: dbGap2ngID.mapping]
    #[arg(long, value_name = "PATH")]
    mapping: Option<PathBuf>,

    /// Where to write the annotated .fam [default: <FAM_PATH> with extension pheno.fam]
    #[arg(long, short, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Which code cases and controls receive
    #[arg(long, value_enum)]
    coding: Option<CodingCli>,

    /// TOML file providing any of the settings above; flags take precedence
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Args {
    fn settings(&self) -> Settings {
        Settings {
            cases: self.cases.clone(),
            controls: self.controls.clone(),
            mapping: self.mapping.clone(),
            output: self.output.clone(),
            coding: self.coding.map(PhenotypeCoding::from),
        }
    }
}

// ========================================================================================
//                           THE MAIN ORCHESTRATION LOGIC
// ========================================================================================

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let start_time = Instant::now();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{err}");
                process::exit(0);
            }
            _ => {
                print!("{err}");
                process::exit(EXIT_USAGE);
            }
        },
    };

    let file_settings = match &args.config {
        Some(path) => match Settings::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(EXIT_USAGE);
            }
        },
        None => Settings::default(),
    };

    let config = RunConfig::new(&args.fam_path)
        .apply(&file_settings)
        .apply(&args.settings());

    eprintln!("> Annotating {}", config.fam.display());
    eprintln!(
        "> Cases: {}  Controls: {}  Mapping: {}",
        config.cases.display(),
        config.controls.display(),
        config.mapping.display()
    );

    match pipeline::run(&config) {
        Ok(summary) => {
            eprintln!(
                "> Classified {} unaffected and {} affected individual(s) from {} ID translation(s).",
                summary.classified_unaffected, summary.classified_affected, summary.translations
            );
            eprintln!(
                "> Wrote {} record(s) to {}: {} unaffected, {} affected, {} missing.",
                summary.annotation.records,
                summary.output.display(),
                summary.annotation.unaffected,
                summary.annotation.affected,
                summary.annotation.missing
            );
            eprintln!("> Finished in {:.2?}.", start_time.elapsed());
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(e.exit_code());
        }
    }
}
