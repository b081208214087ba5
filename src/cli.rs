//! Command-line front-ends for the three tools.
//!
//! Each binary calls one `run_*` function. Usage errors exit with 1 rather
//! than clap's default of 2 so that every user/input error shares a code.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, ValueEnum};

use crate::check::{check_listing, CheckOptions};
use crate::convert::{convert_directory, ConvertOptions, MappingSource};
use crate::error::LabelOpsError;
use crate::progress::{CancelFlag, RunContext, StderrProgress};
use crate::transform::{
    transform_labels, ShiftSpec, TransformOptions, TransformSource, TransformSpec, TransformTarget,
};

const DEFAULT_PROGRESS_EVERY: usize = 1000;

/// Classify an image list by image/label state and count annotations per class.
#[derive(Parser, Debug)]
#[command(name = "dataset-check", version)]
pub struct DatasetCheckArgs {
    /// Image list file, one image path per line.
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Directory that receives the bucket lists and summary.
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    /// Resolve relative list entries against this directory.
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// How to print the report on stdout ('text' or 'json').
    #[arg(long = "report-format", value_enum, default_value = "text")]
    pub report_format: ReportFormat,

    /// Print a progress line every N entries (0 disables).
    #[arg(long = "progress-every", default_value_t = DEFAULT_PROGRESS_EVERY)]
    pub progress_every: usize,

    /// Enable debug logging.
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum InputMode {
    /// `-i` is an image list file.
    File,
    /// `-i` is a directory walked for images.
    Folder,
}

/// Remap, shift, delete, or select class ids across YOLO label files.
#[derive(Parser, Debug)]
#[command(name = "label-transform", version)]
#[command(group(ArgGroup::new("target").required(true).args(["output", "in_place"])))]
pub struct LabelTransformArgs {
    /// Whether `-i` names a list file or a folder.
    #[arg(long = "input-mode", value_enum, default_value = "file")]
    pub input_mode: InputMode,

    /// Image list file or image folder.
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Output root; labels are written to OUTPUT/labels/.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Rewrite labels where they are.
    #[arg(long = "in-place")]
    pub in_place: bool,

    /// Keep a one-time `<label>.bak` copy when rewriting in place.
    #[arg(long, requires = "in_place")]
    pub backup: bool,

    /// Class remapping, e.g. "0:2,5:1".
    #[arg(long = "class-mapping")]
    pub class_mapping: Option<String>,

    /// First class id affected by the shift.
    #[arg(long = "shift-start", requires = "shift_value")]
    pub shift_start: Option<u32>,

    /// Amount added to shifted class ids (may be negative).
    #[arg(long = "shift-value", allow_negative_numbers = true)]
    pub shift_value: Option<i64>,

    /// Rows whose shifted id exceeds this are dropped.
    #[arg(long = "shift-max", requires = "shift_value")]
    pub shift_max: Option<u32>,

    /// Drop rows with these final class ids, e.g. "3,4".
    #[arg(long = "delete-classes")]
    pub delete_classes: Option<String>,

    /// Keep only rows with these final class ids, e.g. "0,1".
    #[arg(long = "select-classes")]
    pub select_classes: Option<String>,

    /// Resolve relative list entries against this directory.
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Also look for labels under labels_Correct/.
    #[arg(long = "search-corrected")]
    pub search_corrected: bool,

    /// Print a progress line every N entries (0 disables).
    #[arg(long = "progress-every", default_value_t = DEFAULT_PROGRESS_EVERY)]
    pub progress_every: usize,

    /// Enable debug logging.
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl LabelTransformArgs {
    pub fn spec(&self) -> Result<TransformSpec, LabelOpsError> {
        let shift = self.shift_value.map(|value| ShiftSpec {
            start: self.shift_start.unwrap_or(0),
            value,
            max: self.shift_max,
        });

        TransformSpec::from_args(
            self.class_mapping.as_deref(),
            shift,
            self.delete_classes.as_deref(),
            self.select_classes.as_deref(),
        )
    }

    pub fn options(&self) -> TransformOptions {
        let source = match self.input_mode {
            InputMode::File => TransformSource::List {
                path: self.input.clone(),
                root: self.root.clone(),
            },
            InputMode::Folder => TransformSource::Folder(self.input.clone()),
        };

        let target = match &self.output {
            Some(root) if !self.in_place => TransformTarget::OutputRoot(root.clone()),
            _ => TransformTarget::InPlace {
                backup: self.backup,
            },
        };

        TransformOptions {
            source,
            target,
            search_corrected: self.search_corrected,
        }
    }
}

/// Convert per-image JSON annotations into YOLO label files.
#[derive(Parser, Debug)]
#[command(name = "json-to-yolo", version)]
pub struct JsonToYoloArgs {
    /// Directory of JSON annotation files.
    pub input_dir: PathBuf,

    /// Directory that receives the label files, classes.txt, and class_mapping.json.
    pub output_dir: PathBuf,

    /// Class mapping file (.json, data.yaml, or classes.txt).
    #[arg(long, conflicts_with = "default_mapping")]
    pub mapping: Option<PathBuf>,

    /// Use class_mapping.json from the input directory.
    #[arg(long = "default-mapping")]
    pub default_mapping: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,

    /// Print a progress line every N files (0 disables).
    #[arg(long = "progress-every", default_value_t = DEFAULT_PROGRESS_EVERY)]
    pub progress_every: usize,
}

impl JsonToYoloArgs {
    pub fn options(&self) -> ConvertOptions {
        let mapping = match (&self.mapping, self.default_mapping) {
            (Some(path), _) => MappingSource::File(path.clone()),
            (None, true) => MappingSource::InputDefault,
            (None, false) => MappingSource::Discover,
        };
        ConvertOptions { mapping }
    }
}

/// Parse arguments, printing help/version with exit 0 and usage errors with exit 1.
fn parse_args<T: Parser>() -> T {
    match T::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

fn run_context(progress_every: usize) -> RunContext {
    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    if let Err(err) = ctrlc::set_handler(move || handler_flag.cancel()) {
        log::warn!("could not install Ctrl-C handler: {err}");
    }
    RunContext::new(Box::new(StderrProgress::new(progress_every)), cancel)
}

/// Entry point for `dataset-check`.
pub fn run_dataset_check() -> Result<(), LabelOpsError> {
    let args: DatasetCheckArgs = parse_args();
    init_logging(args.verbose);

    let opts = CheckOptions {
        root: args.root.clone(),
    };
    let mut ctx = run_context(args.progress_every);
    let report = check_listing(&args.input, &args.output, &opts, &mut ctx)?;

    match args.report_format {
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&report).map_err(|source| {
                LabelOpsError::JsonWrite {
                    path: PathBuf::from("<stdout>"),
                    source,
                }
            })?;
            println!("{json}");
        }
        ReportFormat::Text => print!("{report}"),
    }

    Ok(())
}

/// Entry point for `label-transform`.
pub fn run_label_transform() -> Result<(), LabelOpsError> {
    let args: LabelTransformArgs = parse_args();
    init_logging(args.verbose);

    let spec = args.spec()?;
    if spec.is_identity() {
        log::warn!("no transform stage given; labels will only be normalized");
    }

    let opts = args.options();
    let mut ctx = run_context(args.progress_every);
    let stats = transform_labels(&spec, &opts, &mut ctx)?;

    print!("{stats}");
    Ok(())
}

/// Entry point for `json-to-yolo`.
pub fn run_json_to_yolo() -> Result<(), LabelOpsError> {
    let args: JsonToYoloArgs = parse_args();
    init_logging(args.debug);

    let opts = args.options();
    let mut ctx = run_context(args.progress_every);
    let report = convert_directory(&args.input_dir, &args.output_dir, &opts, &mut ctx)?;

    print!("{report}");
    Ok(())
}
