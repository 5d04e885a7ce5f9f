use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};
use crate::core::backup::DEFAULT_BACKUP_DIR;

/// Config file names probed in the working directory, first match wins
pub const CONFIG_FILES: [&str; 4] = ["uic.toml", "uic.yaml", "uic.json", ".uic.toml"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Where pre-write copies of annotated files are mirrored
    pub backup_dir: PathBuf,

    /// Keep the backup directory after a successful write
    pub keep_backup: bool,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self { backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR), keep_backup: false }
    }
}

/// Load config from the current directory and `UIC__*` environment variables
pub fn load_config() -> Result<Config>
{
    load_config_from(Path::new("."))
}

/// Load config from `dir` and `UIC__*` environment variables
pub fn load_config_from(dir: &Path) -> Result<Config>
{
    let mut builder = config::Config::builder();

    // Load from config files in priority order
    for name in &CONFIG_FILES
    {
        let path = dir.join(name);
        if path.exists()
        {
            // `.uic.toml` has no recognisable extension for the config crate
            let source = match path
                .extension()
                .and_then(|e| e.to_str())
            {
                Some("yaml") => config::File::from(path).format(config::FileFormat::Yaml),
                Some("json") => config::File::from(path).format(config::FileFormat::Json),
                _ => config::File::from(path).format(config::FileFormat::Toml),
            };
            builder = builder.add_source(source);
            break;
        }
    }

    // Double underscore keeps `backup_dir` from being split into a nested key
    builder = builder.add_source(
        config::Environment::with_prefix("UIC")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join("uic.toml");

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        eprintln!("Created config file at {}", config_path.display());
    }
    Ok(())
}
