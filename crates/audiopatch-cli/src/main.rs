use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use audiopatch_core::config_file::{self, ConfigFile};
use audiopatch_ingest::ExtractionOptions;
use audiopatch_parsing::{ParsingConfigBuilder, SoundvisionExtractor};
use audiopatch_store::{PredictionStore, RecordBuilder, UnspecifiedBumperAngle};

mod logging;
mod output;

use output::ColorMode;

/// Soundvision prediction importer - parse loudspeaker prediction reports into arrays and cabinets
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the prediction database
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Extra config file, applied over the cascaded config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Append log events to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty prediction and print its id
    NewPrediction {
        /// Display name of the prediction
        name: String,

        /// Source file name to keep regardless of what imported reports say
        #[arg(long)]
        file_name: Option<String>,
    },

    /// Parse a report and replace a prediction's arrays with its contents
    Import {
        /// Prediction to import into
        prediction_id: i64,

        /// Path to the report PDF, or a .txt file of already-extracted text
        file_path: PathBuf,
    },

    /// Parse a report and print what would be imported, without touching the database
    DryRun {
        /// Path to the report PDF, or a .txt file of already-extracted text
        file_path: PathBuf,

        /// Print the parsed document as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a stored prediction with its arrays and cabinets
    Show {
        /// Prediction to show
        prediction_id: i64,
    },

    /// List stored predictions
    List,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = config_file::load_config();
    if let Some(path) = &cli.config {
        let Some(extra) = config_file::load_from_path(path) else {
            anyhow::bail!("Config file not found or invalid: {}", path.display());
        };
        config = config_file::merge(config, extra);
    }

    let log_section = config.logging.clone().unwrap_or_default();
    let log_file = cli
        .log_file
        .clone()
        .or_else(|| log_section.file.as_ref().map(PathBuf::from));
    let _log_guard = logging::init(log_section.level.as_deref(), log_file.as_deref())?;

    let color = ColorMode(!cli.no_color);
    let mut stdout = std::io::stdout();

    match cli.command {
        Command::DryRun { file_path, json } => {
            dry_run(&file_path, json, &config, color, &mut stdout)
        }
        Command::NewPrediction { name, file_name } => {
            let store = open_store(cli.db, &config)?;
            let id = store.create_prediction(&name, file_name.as_deref())?;
            writeln!(stdout, "{}", id)?;
            Ok(())
        }
        Command::Import {
            prediction_id,
            file_path,
        } => {
            let store = open_store(cli.db, &config)?;
            import(&store, prediction_id, &file_path, &config, color, &mut stdout)
        }
        Command::Show { prediction_id } => {
            let store = open_store(cli.db, &config)?;
            let prediction = store.get_prediction(prediction_id)?;
            let summary = store.summary(prediction_id)?;
            let arrays = store.list_arrays(prediction_id)?;
            output::print_prediction(&mut stdout, &prediction, &summary, &arrays, color)?;
            Ok(())
        }
        Command::List => {
            let store = open_store(cli.db, &config)?;
            for prediction in store.list_predictions()? {
                let summary = store.summary(prediction.id)?;
                output::print_prediction_line(&mut stdout, &prediction, &summary, color)?;
            }
            Ok(())
        }
    }
}

/// Resolve the database path: CLI flag > `AUDIOPATCH_DB` > config file > platform data dir.
fn database_path(flag: Option<PathBuf>, config: &ConfigFile) -> PathBuf {
    flag.or_else(|| std::env::var("AUDIOPATCH_DB").ok().map(PathBuf::from))
        .or_else(|| config.database_path())
        .or_else(|| dirs::data_dir().map(|d| d.join("audiopatch").join("audiopatch.db")))
        .unwrap_or_else(|| PathBuf::from("audiopatch.db"))
}

fn open_store(flag: Option<PathBuf>, config: &ConfigFile) -> anyhow::Result<PredictionStore> {
    let path = database_path(flag, config);
    tracing::debug!(path = %path.display(), "opening prediction database");
    Ok(PredictionStore::open(&path)?)
}

fn extractor(config: &ConfigFile) -> anyhow::Result<SoundvisionExtractor> {
    let builder = match &config.parsing {
        Some(section) => ParsingConfigBuilder::from_section(section),
        None => ParsingConfigBuilder::new(),
    };
    Ok(SoundvisionExtractor::with_config(builder.build()?))
}

fn import(
    store: &PredictionStore,
    prediction_id: i64,
    file_path: &Path,
    config: &ConfigFile,
    color: ColorMode,
    writer: &mut dyn Write,
) -> anyhow::Result<()> {
    if !file_path.exists() {
        anyhow::bail!("File not found: {}", file_path.display());
    }
    let catalog = config.catalog();
    let builder = RecordBuilder::new(&catalog, &UnspecifiedBumperAngle);
    let outcome = audiopatch_ingest::import_report(
        store,
        prediction_id,
        file_path,
        &extractor(config)?,
        &ExtractionOptions::from_config(config),
        &builder,
    )?;
    output::print_import_outcome(writer, &outcome, color)?;
    Ok(())
}

fn dry_run(
    file_path: &Path,
    json: bool,
    config: &ConfigFile,
    color: ColorMode,
    writer: &mut dyn Write,
) -> anyhow::Result<()> {
    if !file_path.exists() {
        anyhow::bail!("File not found: {}", file_path.display());
    }

    let doc = audiopatch_ingest::parse_report(
        file_path,
        &extractor(config)?,
        &ExtractionOptions::from_config(config),
    )?;
    if json {
        serde_json::to_writer_pretty(&mut *writer, &doc)?;
        writeln!(writer)?;
        return Ok(());
    }

    let file_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.display().to_string());

    output::print_dry_run_header(writer, &file_name, &doc, color)?;
    for (i, array) in doc.arrays.iter().enumerate() {
        output::print_parsed_array(writer, i, array, color)?;
    }
    Ok(())
}
