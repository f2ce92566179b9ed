use std::cmp::Ordering;

use log::debug;

use crate::model::{Status, TorrentRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortStrategy {
    Percent,
    Eta,
    Down,
    Up,
    Ratio,
    Status,
    Name,
    #[default]
    Progress,
}

impl SortStrategy {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "percent" => SortStrategy::Percent,
            "eta" => SortStrategy::Eta,
            "down" => SortStrategy::Down,
            "up" => SortStrategy::Up,
            "ratio" => SortStrategy::Ratio,
            "status" => SortStrategy::Status,
            "name" => SortStrategy::Name,
            "progress" => SortStrategy::Progress,
            other => {
                debug!("unknown sort strategy '{other}', using progress");
                SortStrategy::Progress
            }
        }
    }
}

pub fn sort_records(records: &mut [TorrentRecord], strategy: SortStrategy, reverse: bool) {
    if strategy == SortStrategy::Progress {
        // reversing the composite sort flips the finished order wholesale,
        // ties included, instead of flipping the comparator
        records.sort_by(|a, b| compare(strategy, a, b));
        if reverse {
            records.reverse();
        }
        return;
    }
    records.sort_by(|a, b| {
        let ordering = compare(strategy, a, b);
        if reverse {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

// Rates and ratio are kept as the raw listing text, and they order as
// text too, so "10.2" sorts ahead of "9.5".
fn compare(strategy: SortStrategy, a: &TorrentRecord, b: &TorrentRecord) -> Ordering {
    match strategy {
        SortStrategy::Percent => a.percent.cmp(&b.percent),
        SortStrategy::Eta => a.eta_seconds.cmp(&b.eta_seconds),
        SortStrategy::Down => text_key(&a.rate_down).cmp(text_key(&b.rate_down)),
        SortStrategy::Up => text_key(&a.rate_up).cmp(text_key(&b.rate_up)),
        SortStrategy::Ratio => text_key(&a.ratio).cmp(text_key(&b.ratio)),
        SortStrategy::Status => status_key(a).cmp(status_key(b)),
        SortStrategy::Name => name_key(a).cmp(name_key(b)),
        SortStrategy::Progress => b
            .percent
            .cmp(&a.percent)
            .then_with(|| text_key(&b.ratio).cmp(text_key(&a.ratio))),
    }
}

fn text_key(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("")
}

fn status_key(record: &TorrentRecord) -> &str {
    record.status.as_ref().map_or("", Status::as_str)
}

fn name_key(record: &TorrentRecord) -> &str {
    record.name.as_deref().unwrap_or("")
}
