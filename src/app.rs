use anyhow::Result;
use log::{debug, warn};

use crate::config::AppConfig;
use crate::detail;
use crate::filter::{self, FilterList};
use crate::model::TorrentRecord;
use crate::parse;
use crate::remote;
use crate::sort;
use crate::template::{TemplateDir, TemplateEngine, TemplateSource};

pub fn run(config: &AppConfig) -> Result<String> {
    // missing required templates are fatal, checked before anything runs
    let source = TemplateDir::new(config.template_dir.clone());
    let mut engine = TemplateEngine::new(&source, config)?;
    let lines = remote::listing().unwrap_or_else(|err| {
        // a dead daemon means an empty widget, not a broken one
        warn!("torrent listing unavailable: {err:#}");
        Vec::new()
    });
    render_listing(config, &mut engine, &lines, remote::detail)
}

fn render_listing<S, F>(
    config: &AppConfig,
    engine: &mut TemplateEngine<'_, S>,
    lines: &[String],
    fetch_detail: F,
) -> Result<String>
where
    S: TemplateSource,
    F: Fn(i64) -> Result<Vec<String>>,
{
    // the first line is the column header, the last the running totals
    if lines.len() < 2 {
        return Ok(String::new());
    }
    let totals = parse::parse_totals(&lines[lines.len() - 1]);

    let mut records: Vec<TorrentRecord> = Vec::new();
    for line in &lines[1..lines.len() - 1] {
        match parse::parse_record(line) {
            Ok(record) => records.push(record),
            Err(err) => debug!("skipping listing line: {err}"),
        }
    }

    if config.fetch_details {
        for record in &mut records {
            match fetch_detail(record.id) {
                Ok(lines) => detail::enrich(record, &lines),
                Err(err) => warn!("no extra info for torrent {}: {err:#}", record.id),
            }
        }
    }

    let filter_list = match &config.filter_file {
        Some(path) => match FilterList::load(path, config.case_sensitive_filter) {
            Ok(list) => list,
            Err(err) => {
                warn!("{err:#}");
                FilterList::new(config.case_sensitive_filter)
            }
        },
        None => FilterList::new(config.case_sensitive_filter),
    };
    filter::retain_visible(&mut records, &filter_list, config.active_only);

    sort::sort_records(&mut records, config.sort, config.reverse_sort);
    records.truncate(config.max_torrents);

    Ok(engine.render(&records, &totals)?)
}
