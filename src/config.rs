use std::{
    env, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use dirs::config_dir;
use log::LevelFilter;
use serde::Deserialize;

use crate::sort::SortStrategy;

pub const DEFAULT_KIB_LABEL: &str = "KiB";
pub const DEFAULT_MIB_LABEL: &str = "MiB";
const DEFAULT_NAME_LENGTH: usize = 30;
const DEFAULT_MAX_TORRENTS: usize = 10;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub active_only: bool,
    pub case_sensitive_filter: bool,
    pub fetch_details: bool,
    pub filter_file: Option<PathBuf>,
    pub kib_label: String,
    pub mib_label: String,
    pub name_length: usize,
    pub max_torrents: usize,
    pub reverse_sort: bool,
    pub sort: SortStrategy,
    pub template_dir: PathBuf,
    pub log_level: LevelFilter,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Render Transmission activity as text for desktop widgets", long_about = None)]
pub struct Cli {
    #[arg(long, action = ArgAction::SetTrue)]
    pub active_only: bool,
    #[arg(long, action = ArgAction::SetTrue)]
    pub case_sensitive: bool,
    #[arg(long, action = ArgAction::SetTrue)]
    pub details: bool,
    #[arg(long)]
    pub filter_file: Option<PathBuf>,
    #[arg(long)]
    pub kib_label: Option<String>,
    #[arg(long)]
    pub mib_label: Option<String>,
    #[arg(long)]
    pub name_length: Option<usize>,
    #[arg(long)]
    pub max_torrents: Option<usize>,
    #[arg(long, action = ArgAction::SetTrue)]
    pub reverse: bool,
    #[arg(long)]
    pub sort: Option<String>,
    #[arg(long)]
    pub template_dir: Option<PathBuf>,
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    active_only: Option<bool>,
    case_sensitive_filter: Option<bool>,
    details: Option<bool>,
    filter_file: Option<PathBuf>,
    kib_label: Option<String>,
    mib_label: Option<String>,
    name_length: Option<usize>,
    max_torrents: Option<usize>,
    reverse_sort: Option<bool>,
    sort: Option<String>,
    template_dir: Option<PathBuf>,
    log_level: Option<String>,
}

pub fn build_config(cli: &Cli) -> Result<AppConfig> {
    let file_config = load_file_config(cli.config.as_deref())?;
    let file = file_config.unwrap_or_default();

    let active_only = cli.active_only
        || env_bool("TRANSMISSION_WIDGET_ACTIVE_ONLY")
            .or(file.active_only)
            .unwrap_or(false);

    let case_sensitive_filter = cli.case_sensitive
        || env_bool("TRANSMISSION_WIDGET_CASE_SENSITIVE")
            .or(file.case_sensitive_filter)
            .unwrap_or(false);

    let fetch_details = cli.details
        || env_bool("TRANSMISSION_WIDGET_DETAILS")
            .or(file.details)
            .unwrap_or(false);

    let filter_file = cli
        .filter_file
        .clone()
        .or_else(|| env::var("TRANSMISSION_WIDGET_FILTER_FILE").ok().map(PathBuf::from))
        .or(file.filter_file);

    let kib_label = cli
        .kib_label
        .clone()
        .or_else(|| env::var("TRANSMISSION_WIDGET_KIB_LABEL").ok())
        .or(file.kib_label)
        .unwrap_or_else(|| DEFAULT_KIB_LABEL.to_string());

    let mib_label = cli
        .mib_label
        .clone()
        .or_else(|| env::var("TRANSMISSION_WIDGET_MIB_LABEL").ok())
        .or(file.mib_label)
        .unwrap_or_else(|| DEFAULT_MIB_LABEL.to_string());

    let name_length = cli
        .name_length
        .or_else(|| env_var_parse("TRANSMISSION_WIDGET_NAME_LENGTH"))
        .or(file.name_length)
        .unwrap_or(DEFAULT_NAME_LENGTH);

    if name_length == 0 {
        anyhow::bail!("name length must be at least 1");
    }

    let max_torrents = cli
        .max_torrents
        .or_else(|| env_var_parse("TRANSMISSION_WIDGET_MAX_TORRENTS"))
        .or(file.max_torrents)
        .unwrap_or(DEFAULT_MAX_TORRENTS);

    let reverse_sort = cli.reverse
        || env_bool("TRANSMISSION_WIDGET_REVERSE")
            .or(file.reverse_sort)
            .unwrap_or(false);

    let sort = cli
        .sort
        .clone()
        .or_else(|| env::var("TRANSMISSION_WIDGET_SORT").ok())
        .or(file.sort)
        .map(|raw| SortStrategy::parse(&raw))
        .unwrap_or_default();

    let template_dir = cli
        .template_dir
        .clone()
        .or_else(|| env::var("TRANSMISSION_WIDGET_TEMPLATE_DIR").ok().map(PathBuf::from))
        .or(file.template_dir)
        .or_else(default_template_dir)
        .context("no template directory; pass --template-dir")?;

    let log_level_str = cli
        .log_level
        .clone()
        .or_else(|| env::var("TRANSMISSION_WIDGET_LOG_LEVEL").ok())
        .or(file.log_level)
        .unwrap_or_else(|| "info".to_string());
    let log_level = LevelFilter::from_str(&log_level_str).unwrap_or(LevelFilter::Info);

    Ok(AppConfig {
        active_only,
        case_sensitive_filter,
        fetch_details,
        filter_file,
        kib_label,
        mib_label,
        name_length,
        max_torrents,
        reverse_sort,
        sort,
        template_dir,
        log_level,
    })
}

fn default_template_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("transmission-widget").join("templates"))
}

fn load_file_config(path: Option<&Path>) -> Result<Option<FileConfig>> {
    if let Some(path) = path {
        return read_file_config(path);
    }

    if let Ok(env_path) = env::var("TRANSMISSION_WIDGET_CONFIG") {
        return read_file_config(Path::new(&env_path));
    }

    if let Some(dir) = config_dir() {
        let modern_path = dir.join("transmission-widget").join("config.toml");
        if let Some(cfg) = read_file_config(&modern_path)? {
            return Ok(Some(cfg));
        }

        let legacy_path = dir.join("transmission-widget.toml");
        return read_file_config(&legacy_path);
    }

    Ok(None)
}

fn read_file_config(path: &Path) -> Result<Option<FileConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let parsed: FileConfig = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    Ok(Some(parsed))
}

fn env_var_parse<T>(name: &str) -> Option<T>
where
    T: FromStr,
{
    env::var(name).ok().and_then(|value| value.parse().ok())
}

fn env_bool(name: &str) -> Option<bool> {
    env::var(name)
        .ok()
        .and_then(|value| match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

#[cfg(test)]
pub fn test_config() -> AppConfig {
    AppConfig {
        active_only: false,
        case_sensitive_filter: false,
        fetch_details: false,
        filter_file: None,
        kib_label: DEFAULT_KIB_LABEL.to_string(),
        mib_label: DEFAULT_MIB_LABEL.to_string(),
        name_length: DEFAULT_NAME_LENGTH,
        max_torrents: DEFAULT_MAX_TORRENTS,
        reverse_sort: false,
        sort: SortStrategy::Progress,
        template_dir: PathBuf::from("templates"),
        log_level: LevelFilter::Info,
    }
}
