use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::AppConfig;
use crate::detail;
use crate::model::{clip_name, format_speed, GlobalStats, Status, TorrentRecord};

pub const LAYOUT_TEMPLATE: &str = "layout";
pub const GLOBALS_TEMPLATE: &str = "globals";
pub const DEFAULT_TEMPLATE: &str = "torrent";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("missing required template '{name}': {source}")]
    Missing {
        name: String,
        #[source]
        source: io::Error,
    },
}

pub trait TemplateSource {
    fn read(&self, name: &str) -> io::Result<String>;
}

pub struct TemplateDir {
    dir: PathBuf,
}

impl TemplateDir {
    pub fn new(dir: PathBuf) -> Self {
        TemplateDir { dir }
    }
}

impl TemplateSource for TemplateDir {
    fn read(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.dir.join(name))
    }
}

type FieldValue = fn(&TorrentRecord) -> Option<String>;

const RECORD_FIELDS: &[(&str, FieldValue)] = &[
    ("[:ID:]", |r| Some(r.id.to_string())),
    ("[:PERCENT:]", |r| Some(r.percent.to_string())),
    ("[:ETA:]", |r| r.eta.clone()),
    ("[:ETA_SECONDS:]", |r| Some(r.eta_seconds.to_string())),
    ("[:RATE_UP:]", |r| r.rate_up.clone()),
    ("[:RATE_DOWN:]", |r| r.rate_down.clone()),
    ("[:RATIO:]", |r| r.ratio.clone()),
    ("[:STATUS:]", |r| {
        r.status.as_ref().map(|s| s.as_str().to_string())
    }),
    ("[:NAME:]", |r| r.name.clone()),
    ("[:LOCATION:]", |r| r.extra.location.clone()),
    ("[:AVAILABILITY:]", |r| r.extra.availability.clone()),
    ("[:TOTAL_SIZE:]", |r| r.extra.total_size.clone()),
    ("[:DOWNLOADED:]", |r| r.extra.downloaded.clone()),
    ("[:UPLOADED:]", |r| r.extra.uploaded.clone()),
    ("[:RATIO_LIMIT:]", |r| r.extra.ratio_limit.clone()),
    ("[:CORRUPT:]", |r| r.extra.corrupt.clone()),
    ("[:PEERS_CONNECTED:]", |r| r.extra.peers_connected.clone()),
    ("[:PEERS_UPLOADING:]", |r| r.extra.peers_uploading.clone()),
    ("[:PEERS_DOWNLOADING:]", |r| {
        r.extra.peers_downloading.clone()
    }),
    ("[:DATE_ADDED:]", |r| {
        r.extra.date_added.as_ref().map(detail::format_timestamp)
    }),
    ("[:DATE_STARTED:]", |r| {
        r.extra.date_started.as_ref().map(detail::format_timestamp)
    }),
    ("[:LATEST_ACTIVITY:]", |r| {
        r.extra
            .latest_activity
            .as_ref()
            .map(detail::format_timestamp)
    }),
    ("[:PUBLIC:]", |r| r.extra.public.clone()),
    ("[:PIECE_COUNT:]", |r| r.extra.piece_count.clone()),
    ("[:PIECE_SIZE:]", |r| r.extra.piece_size.clone()),
];

// Caches live for one render pass. A fresh engine is built per invocation,
// so template edits show up on the next run without any restart.
#[derive(Debug)]
pub struct TemplateEngine<'a, S> {
    source: &'a S,
    config: &'a AppConfig,
    loaded: HashMap<String, String>,
    missing: HashSet<String>,
}

impl<'a, S: TemplateSource> TemplateEngine<'a, S> {
    // The layout, globals, and default torrent templates must all exist.
    // They are loaded up front, so a broken template directory aborts the
    // run even when nothing would be rendered.
    pub fn new(source: &'a S, config: &'a AppConfig) -> Result<Self, TemplateError> {
        let mut engine = TemplateEngine {
            source,
            config,
            loaded: HashMap::new(),
            missing: HashSet::new(),
        };
        engine.load(LAYOUT_TEMPLATE)?;
        engine.load(GLOBALS_TEMPLATE)?;
        engine.load(DEFAULT_TEMPLATE)?;
        Ok(engine)
    }

    pub fn render(
        &mut self,
        records: &[TorrentRecord],
        totals: &GlobalStats,
    ) -> Result<String, TemplateError> {
        let mut fragments = String::new();
        for record in records {
            fragments.push_str(&self.render_record(record)?);
        }
        if fragments.is_empty() {
            return Ok(String::new());
        }
        let globals = self.render_globals(totals)?;
        let layout = self.load(LAYOUT_TEMPLATE)?;
        Ok(layout
            .replace("[:TORRENTS:]", fragments.trim_end_matches('\n'))
            .replace("[:GLOBALS:]", globals.trim_end_matches('\n')))
    }

    fn render_record(&mut self, record: &TorrentRecord) -> Result<String, TemplateError> {
        let key = record.status.as_ref().map(Status::template_key);
        let template = self.variant(key.as_deref())?;
        Ok(substitute_record(&template, record, self.config))
    }

    fn render_globals(&mut self, totals: &GlobalStats) -> Result<String, TemplateError> {
        let template = self.load(GLOBALS_TEMPLATE)?;
        Ok(template
            .replace(
                "[:G_UP:]",
                &format_speed(&totals.rate_up, &self.config.kib_label, &self.config.mib_label),
            )
            .replace(
                "[:G_DOWN:]",
                &format_speed(&totals.rate_down, &self.config.kib_label, &self.config.mib_label),
            )
            .replace("[:G_UP_KBPS:]", &totals.rate_up)
            .replace("[:G_DOWN_KBPS:]", &totals.rate_down))
    }

    // Per-status variant with fallback. The first failed lookup marks the
    // status missing for the rest of the run, so each absent file costs a
    // single read attempt no matter how many records share the status.
    fn variant(&mut self, key: Option<&str>) -> Result<String, TemplateError> {
        let Some(key) = key else {
            return self.load(DEFAULT_TEMPLATE);
        };
        if self.missing.contains(key) {
            return self.load(DEFAULT_TEMPLATE);
        }
        if let Some(text) = self.loaded.get(key) {
            return Ok(text.clone());
        }
        match self.source.read(key) {
            Ok(text) => {
                self.loaded.insert(key.to_string(), text.clone());
                Ok(text)
            }
            Err(_) => {
                self.missing.insert(key.to_string());
                self.load(DEFAULT_TEMPLATE)
            }
        }
    }

    fn load(&mut self, name: &str) -> Result<String, TemplateError> {
        if let Some(text) = self.loaded.get(name) {
            return Ok(text.clone());
        }
        match self.source.read(name) {
            Ok(text) => {
                self.loaded.insert(name.to_string(), text.clone());
                Ok(text)
            }
            Err(source) => Err(TemplateError::Missing {
                name: name.to_string(),
                source,
            }),
        }
    }
}

fn substitute_record(template: &str, record: &TorrentRecord, config: &AppConfig) -> String {
    // clip the name on a scratch copy; the stored record keeps the full one
    let mut display = record.clone();
    display.name = record
        .name
        .as_deref()
        .map(|name| clip_name(name, config.name_length));

    let mut text = template.to_string();
    for (placeholder, value) in RECORD_FIELDS {
        text = text.replace(placeholder, &value(&display).unwrap_or_default());
    }
    text = text.replace(
        "[:UP_KBPS:]",
        &formatted_rate(display.rate_up.as_deref(), config),
    );
    text.replace(
        "[:DOWN_KBPS:]",
        &formatted_rate(display.rate_down.as_deref(), config),
    )
}

fn formatted_rate(raw: Option<&str>, config: &AppConfig) -> String {
    raw.map(|value| format_speed(value, &config.kib_label, &config.mib_label))
        .unwrap_or_default()
}
