// Luminance CLI - settings registry, settings file and format drivers

mod exit_codes;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;

use luminance_config::keys::{self, KEY_RECENT_PATH_SAVE_LDR};
use luminance_config::recent::remember_dir;
use luminance_config::{
    ConfigError, Group, RecentFiles, SettingValue, SettingsKey, SettingsStore, LUMINANCEVERSION,
    TMOSETTINGSVERSION,
};
use luminance_io::{FormatDrivers, FormatError, Frame, InputFormat, LdrOptions, RawConversionOptions};

use exit_codes::{config_exit_code, format_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

const SAVE_LDR_DIR: &SettingsKey = keys::key_for(KEY_RECENT_PATH_SAVE_LDR);

#[derive(Parser)]
#[command(name = "luminance")]
#[command(about = "Luminance HDR settings and image format drivers (headless)")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Settings file to use instead of the per-user one
    #[arg(long, global = true, env = "LUMINANCE_SETTINGS", value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Log progress to stderr (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the settings keys
    #[command(after_help = "\
Examples:
  luminance keys
  luminance keys --group raw-conversion
  luminance keys --group Raw_Conversion_Options --json")]
    Keys {
        /// Only keys of this group (label or section name)
        #[arg(long, short = 'g')]
        group: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the key registry for collisions and malformed entries
    Check,

    /// Print a stored setting
    Get {
        /// Constant name (KEY_GUI_LANG) or persisted token (UserInterfaceLanguage)
        key: String,
    },

    /// Store a setting; several values store a list
    #[command(after_help = "\
Examples:
  luminance set KEY_NUM_BATCH_THREADS 4
  luminance set use_black true
  luminance set KEY_RECENT_FILES a.hdr b.hdr")]
    Set {
        key: String,

        #[arg(required = true, num_args = 1..)]
        values: Vec<String>,
    },

    /// Remove a stored setting
    Unset { key: String },

    /// Read an image and print a summary of the frame
    Info {
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read an image and write it as LDR (or .pfs)
    #[command(after_help = "\
Examples:
  luminance convert IMG_0001.CR2 out.png
  luminance convert scan.tif out.jpg --quality 90
  luminance convert photo.jpg frame.pfs")]
    Convert {
        input: PathBuf,
        output: PathBuf,

        /// JPEG quality
        #[arg(long, short = 'q', default_value_t = 100, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: u8,

        /// 16 bits per sample for PNG and TIFF output
        #[arg(long)]
        sixteen_bit: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\ntarget: ", env!("TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let settings = cli.settings.as_deref();
    let result = match cli.command {
        Commands::Keys { group, json } => cmd_keys(group, json),
        Commands::Check => cmd_check(),
        Commands::Get { key } => cmd_get(settings, &key),
        Commands::Set { key, values } => cmd_set(settings, &key, values),
        Commands::Unset { key } => cmd_unset(settings, &key),
        Commands::Info { file, json } => cmd_info(settings, &file, json),
        Commands::Convert {
            input,
            output,
            quality,
            sixteen_bit,
        } => cmd_convert(settings, &input, &output, LdrOptions { quality, sixteen_bit }),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self { code: config_exit_code(&err), message: err.to_string(), hint: None }
    }
}

impl From<FormatError> for CliError {
    fn from(err: FormatError) -> Self {
        Self { code: format_exit_code(&err), message: err.to_string(), hint: None }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

fn cmd_keys(group: Option<String>, json: bool) -> Result<(), CliError> {
    let selected: Vec<&SettingsKey> = match group.as_deref() {
        None => keys::KEYS.iter().collect(),
        Some(label) => match Group::from_label(label) {
            Some(group) => keys::keys_in(group).collect(),
            // a section name such as General covers several groups
            None => keys::keys_in_section(label).collect(),
        },
    };
    if let (Some(label), true) = (&group, selected.is_empty()) {
        let labels: Vec<_> = Group::ALL.iter().map(|g| g.label()).collect();
        return Err(CliError::usage(format!("unknown group '{}'", label))
            .with_hint(format!("groups: {}, or a section name", labels.join(", "))));
    }

    if json {
        let entries: Vec<_> = selected
            .iter()
            .map(|k| {
                json!({
                    "name": k.name,
                    "key": k.key,
                    "group": k.group.label(),
                    "section": k.section_name(),
                })
            })
            .collect();
        println!("{}", serde_json::Value::Array(entries));
    } else {
        for k in selected {
            println!("{:<44} {:<36} {}", k.name, k.key, k.section_name());
        }
    }
    Ok(())
}

fn cmd_check() -> Result<(), CliError> {
    let problems = keys::validate();
    if problems.is_empty() {
        println!(
            "ok: {} keys, {} groups, version {}, tmo settings {}",
            keys::KEYS.len(),
            keys::GROUPS.len(),
            LUMINANCEVERSION,
            TMOSETTINGSVERSION
        );
        return Ok(());
    }
    for problem in &problems {
        println!("{}", problem);
    }
    Err(CliError::failed(format!("{} registry problem(s)", problems.len())))
}

// ---------------------------------------------------------------------------
// Settings file
// ---------------------------------------------------------------------------

fn open_store(settings: Option<&Path>) -> Result<SettingsStore, CliError> {
    let store = match settings {
        Some(path) => SettingsStore::load_from(path)?,
        None => SettingsStore::load().map_err(|e| {
            CliError::from(e).with_hint("pass --settings <PATH> or set LUMINANCE_SETTINGS")
        })?,
    };
    Ok(store)
}

fn resolve_key(name: &str) -> Result<&'static SettingsKey, CliError> {
    keys::resolve(name).ok_or_else(|| {
        CliError::from(ConfigError::UnknownKey(name.to_string()))
            .with_hint("run `luminance keys` to list valid keys")
    })
}

fn cmd_get(settings: Option<&Path>, name: &str) -> Result<(), CliError> {
    let key = resolve_key(name)?;
    let store = open_store(settings)?;
    match store.get(key) {
        Some(SettingValue::List(items)) => {
            for item in items {
                println!("{}", item);
            }
            Ok(())
        }
        Some(value) => {
            println!("{}", value);
            Ok(())
        }
        None => Err(CliError::failed(format!("{} is not set", key.name))),
    }
}

fn cmd_set(settings: Option<&Path>, name: &str, mut values: Vec<String>) -> Result<(), CliError> {
    let key = resolve_key(name)?;
    let mut store = open_store(settings)?;
    let value = if values.len() == 1 {
        SettingValue::from_input(&values.remove(0))
    } else {
        SettingValue::List(values)
    };
    log::info!("{}/{} = {}", key.section_name(), key.key, value);
    store.set(key, value);
    store.save()?;
    Ok(())
}

fn cmd_unset(settings: Option<&Path>, name: &str) -> Result<(), CliError> {
    let key = resolve_key(name)?;
    let mut store = open_store(settings)?;
    if store.remove(key).is_none() {
        log::info!("{} was not set", key.name);
        return Ok(());
    }
    store.save()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// Settings are optional for image commands: fall back to defaults
fn store_or_default(settings: Option<&Path>) -> SettingsStore {
    match open_store(settings) {
        Ok(store) => store,
        Err(e) => {
            log::warn!("using default settings: {}", e.message);
            SettingsStore::new()
        }
    }
}

fn read_input(drivers: &FormatDrivers, store: &SettingsStore, path: &Path) -> Result<Frame, CliError> {
    if !path.exists() {
        return Err(CliError::usage(format!("{}: no such file", path.display())));
    }
    if InputFormat::from_path(path).is_none() {
        return Err(CliError::usage(format!("{}: unsupported input format", path.display()))
            .with_hint("supported: TIFF, JPEG, camera RAW, PFS"));
    }
    let options = RawConversionOptions::from_store(store);
    Ok(drivers.read(path, &options)?)
}

fn cmd_info(settings: Option<&Path>, path: &Path, json: bool) -> Result<(), CliError> {
    let store = store_or_default(settings);
    let frame = read_input(&FormatDrivers::default(), &store, path)?;
    let channels: Vec<&str> = frame.channels().iter().map(|c| c.name()).collect();
    let range = frame.range();

    if json {
        let summary = json!({
            "file": path.display().to_string(),
            "width": frame.width(),
            "height": frame.height(),
            "channels": channels,
            "tags": frame.tags(),
            "min": range.map(|r| r.0),
            "max": range.map(|r| r.1),
        });
        println!("{}", summary);
        return Ok(());
    }

    println!("{}", path.display());
    println!("  size:     {}x{}", frame.width(), frame.height());
    println!("  channels: {}", channels.join(" "));
    if let Some((lo, hi)) = range {
        println!("  range:    {} .. {}", lo, hi);
    }
    for (tag, value) in frame.tags() {
        println!("  {}={}", tag, value);
    }
    Ok(())
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|e| {
        log::warn!("{}: {}", path.display(), e);
        path.to_path_buf()
    })
}

fn cmd_convert(settings: Option<&Path>, input: &Path, output: &Path, options: LdrOptions) -> Result<(), CliError> {
    let mut store = store_or_default(settings);
    let drivers = FormatDrivers::default();

    let frame = read_input(&drivers, &store, input)?;
    drivers.write_ldr(&frame, output, &options)?;
    eprintln!("wrote {} ({}x{})", output.display(), frame.width(), frame.height());

    // stored paths must not depend on the working directory
    let mut recent = RecentFiles::load(&store);
    recent.push(&absolute(input));
    recent.save(&mut store);
    remember_dir(&mut store, SAVE_LDR_DIR, &absolute(output));

    // the image is written, a settings failure is only worth a warning
    if store.path().is_some() {
        if let Err(e) = store.save() {
            log::warn!("recent files not saved: {}", e);
        }
    }
    Ok(())
}
