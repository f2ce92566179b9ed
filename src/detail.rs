use log::debug;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::PrimitiveDateTime;

use crate::model::TorrentRecord;

// the daemon prints ctime-style stamps, e.g. "Fri Jun 25 12:12:33 2021"
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[weekday repr:short] [month repr:short] [day padding:space] [hour]:[minute]:[second] [year]"
);

// placeholders render them back as "2021-06-25 12:12:33"
const TIMESTAMP_DISPLAY: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

type Extractor = fn(&mut TorrentRecord, &str) -> bool;

// first matching label consumes the line
const EXTRACTORS: &[Extractor] = &[
    take_location,
    take_availability,
    take_total_size,
    take_downloaded,
    take_uploaded,
    take_ratio_limit,
    take_corrupt,
    take_peers,
    take_date_added,
    take_date_started,
    take_latest_activity,
    take_public,
    take_piece_count,
    take_piece_size,
];

pub fn enrich(record: &mut TorrentRecord, lines: &[String]) {
    for line in lines {
        for extractor in EXTRACTORS {
            if extractor(record, line) {
                break;
            }
        }
    }
}

fn labeled<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    line.trim_start().strip_prefix(label).map(str::trim)
}

fn set_once(slot: &mut Option<String>, value: &str) {
    if slot.is_none() {
        *slot = Some(value.to_string());
    }
}

fn take_location(record: &mut TorrentRecord, line: &str) -> bool {
    let Some(value) = labeled(line, "Location:") else {
        return false;
    };
    set_once(&mut record.extra.location, value);
    true
}

fn take_availability(record: &mut TorrentRecord, line: &str) -> bool {
    let Some(value) = labeled(line, "Availability:") else {
        return false;
    };
    set_once(&mut record.extra.availability, value);
    true
}

// "Total size: 977.8 MB (977.8 MB wanted)" keeps only the wanted amount
fn take_total_size(record: &mut TorrentRecord, line: &str) -> bool {
    if labeled(line, "Total size:").is_none() {
        return false;
    }
    if let (Some(open), Some(close)) = (line.find('('), line.find(')')) {
        if close > open {
            let inner = &line[open + 1..close];
            let wanted = inner.strip_suffix(" wanted").unwrap_or(inner);
            set_once(&mut record.extra.total_size, wanted);
        }
    }
    true
}

fn take_downloaded(record: &mut TorrentRecord, line: &str) -> bool {
    let Some(value) = labeled(line, "Downloaded:") else {
        return false;
    };
    set_once(&mut record.extra.downloaded, value);
    true
}

fn take_uploaded(record: &mut TorrentRecord, line: &str) -> bool {
    let Some(value) = labeled(line, "Uploaded:") else {
        return false;
    };
    set_once(&mut record.extra.uploaded, value);
    true
}

fn take_ratio_limit(record: &mut TorrentRecord, line: &str) -> bool {
    let Some(value) = labeled(line, "Ratio Limit:") else {
        return false;
    };
    set_once(&mut record.extra.ratio_limit, value);
    true
}

fn take_corrupt(record: &mut TorrentRecord, line: &str) -> bool {
    let Some(value) = labeled(line, "Corrupt DL:") else {
        return false;
    };
    set_once(&mut record.extra.corrupt, value);
    true
}

// Only the first comma-separated chunk is inspected, so the usual
// "connected to N, uploading to N, downloading from N" line fills
// exactly one of the three counters.
fn take_peers(record: &mut TorrentRecord, line: &str) -> bool {
    let Some(value) = labeled(line, "Peers:") else {
        return false;
    };
    let first = value.split(", ").next().unwrap_or("");
    if first.contains("connected to ") {
        set_once(
            &mut record.extra.peers_connected,
            &first.replace("connected to ", ""),
        );
    }
    if first.contains("uploading to ") {
        set_once(
            &mut record.extra.peers_uploading,
            &first.replace("uploading to ", ""),
        );
    }
    if first.contains("downloading from ") {
        set_once(
            &mut record.extra.peers_downloading,
            &first.replace("downloading from ", ""),
        );
    }
    true
}

fn take_date_added(record: &mut TorrentRecord, line: &str) -> bool {
    let Some(value) = labeled(line, "Date added:") else {
        return false;
    };
    if record.extra.date_added.is_none() {
        record.extra.date_added = parse_timestamp(value);
    }
    true
}

fn take_date_started(record: &mut TorrentRecord, line: &str) -> bool {
    let Some(value) = labeled(line, "Date started:") else {
        return false;
    };
    if record.extra.date_started.is_none() {
        record.extra.date_started = parse_timestamp(value);
    }
    true
}

fn take_latest_activity(record: &mut TorrentRecord, line: &str) -> bool {
    let Some(value) = labeled(line, "Latest activity:") else {
        return false;
    };
    if record.extra.latest_activity.is_none() {
        record.extra.latest_activity = parse_timestamp(value);
    }
    true
}

fn take_public(record: &mut TorrentRecord, line: &str) -> bool {
    let Some(value) = labeled(line, "Public torrent:") else {
        return false;
    };
    set_once(&mut record.extra.public, value);
    true
}

fn take_piece_count(record: &mut TorrentRecord, line: &str) -> bool {
    let Some(value) = labeled(line, "Piece Count:") else {
        return false;
    };
    set_once(&mut record.extra.piece_count, value);
    true
}

fn take_piece_size(record: &mut TorrentRecord, line: &str) -> bool {
    let Some(value) = labeled(line, "Piece Size:") else {
        return false;
    };
    set_once(&mut record.extra.piece_size, value);
    true
}

fn parse_timestamp(value: &str) -> Option<PrimitiveDateTime> {
    match PrimitiveDateTime::parse(value, TIMESTAMP_FORMAT) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            debug!("unparseable detail timestamp '{value}': {err}");
            None
        }
    }
}

pub fn format_timestamp(value: &PrimitiveDateTime) -> String {
    value.format(TIMESTAMP_DISPLAY).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::model::ExtraInfo;

    fn bare_record() -> TorrentRecord {
        TorrentRecord {
            id: 1,
            percent: 100,
            eta: Some("Done".to_string()),
            eta_seconds: 0,
            rate_up: Some("0.0".to_string()),
            rate_down: Some("0.0".to_string()),
            ratio: Some("1.0".to_string()),
            status: None,
            name: Some("example".to_string()),
            extra: ExtraInfo::default(),
        }
    }

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn extracts_a_typical_detail_block() {
        let mut record = bare_record();
        enrich(
            &mut record,
            &lines(&[
                "NAME",
                "  Id: 1",
                "  Name: example",
                "TRANSFER",
                "  Location: /var/lib/torrents",
                "  Percent Done: 100%",
                "  Availability: 100%",
                "  Total size: 977.8 MB (977.8 MB wanted)",
                "  Downloaded: 996.5 MB",
                "  Uploaded: 2.74 GB",
                "  Ratio Limit: Default",
                "  Corrupt DL: None",
                "  Peers: connected to 12, uploading to 3, downloading from 0",
                "HISTORY",
                "  Date added:       Fri Jun 25 12:12:33 2021",
                "  Date started:     Fri Jun 25 12:12:44 2021",
                "  Latest activity:  Sat Jun 26 07:50:58 2021",
                "ORIGINS",
                "  Public torrent: Yes",
                "  Piece Count: 3730",
                "  Piece Size: 256.0 KiB",
            ]),
        );

        assert_eq!(record.extra.location.as_deref(), Some("/var/lib/torrents"));
        assert_eq!(record.extra.availability.as_deref(), Some("100%"));
        assert_eq!(record.extra.total_size.as_deref(), Some("977.8 MB"));
        assert_eq!(record.extra.downloaded.as_deref(), Some("996.5 MB"));
        assert_eq!(record.extra.uploaded.as_deref(), Some("2.74 GB"));
        assert_eq!(record.extra.ratio_limit.as_deref(), Some("Default"));
        assert_eq!(record.extra.corrupt.as_deref(), Some("None"));
        assert_eq!(record.extra.peers_connected.as_deref(), Some("12"));
        assert_eq!(record.extra.date_added, Some(datetime!(2021-06-25 12:12:33)));
        assert_eq!(record.extra.date_started, Some(datetime!(2021-06-25 12:12:44)));
        assert_eq!(
            record.extra.latest_activity,
            Some(datetime!(2021-06-26 07:50:58))
        );
        assert_eq!(record.extra.public.as_deref(), Some("Yes"));
        assert_eq!(record.extra.piece_count.as_deref(), Some("3730"));
        assert_eq!(record.extra.piece_size.as_deref(), Some("256.0 KiB"));
    }

    #[test]
    fn peers_line_fills_only_the_leading_counter() {
        let mut record = bare_record();
        enrich(
            &mut record,
            &lines(&["  Peers: connected to 12, uploading to 3, downloading from 2"]),
        );
        assert_eq!(record.extra.peers_connected.as_deref(), Some("12"));
        assert!(record.extra.peers_uploading.is_none());
        assert!(record.extra.peers_downloading.is_none());
    }

    #[test]
    fn peers_line_without_the_connected_prefix_fills_the_matching_counter() {
        let mut record = bare_record();
        enrich(&mut record, &lines(&["  Peers: uploading to 7"]));
        assert!(record.extra.peers_connected.is_none());
        assert_eq!(record.extra.peers_uploading.as_deref(), Some("7"));
    }

    #[test]
    fn repeated_fields_keep_the_first_occurrence() {
        let mut record = bare_record();
        enrich(
            &mut record,
            &lines(&["  Location: /first", "  Location: /second"]),
        );
        assert_eq!(record.extra.location.as_deref(), Some("/first"));
    }

    #[test]
    fn total_size_without_parentheses_stays_unset() {
        let mut record = bare_record();
        enrich(&mut record, &lines(&["  Total size: 977.8 MB"]));
        assert!(record.extra.total_size.is_none());
    }

    #[test]
    fn unparseable_timestamps_stay_unset() {
        let mut record = bare_record();
        enrich(&mut record, &lines(&["  Date added: a while back"]));
        assert!(record.extra.date_added.is_none());
    }

    #[test]
    fn unknown_lines_are_ignored() {
        let mut record = bare_record();
        enrich(
            &mut record,
            &lines(&["  Magnet: magnet:?xt=urn:btih:abc", ""]),
        );
        assert!(record.extra.location.is_none());
        assert!(record.extra.availability.is_none());
    }

    #[test]
    fn timestamps_render_iso_style() {
        let stamp = datetime!(2021-06-25 12:12:33);
        assert_eq!(format_timestamp(&stamp), "2021-06-25 12:12:33");
    }

    #[test]
    fn space_padded_single_digit_days_still_parse() {
        let mut record = bare_record();
        enrich(
            &mut record,
            &lines(&["  Date added:    Sat Jun  5 01:02:03 2021"]),
        );
        assert_eq!(record.extra.date_added, Some(datetime!(2021-06-05 01:02:03)));
    }

    #[test]
    fn listing_fields_survive_enrichment() {
        let mut record = bare_record();
        enrich(&mut record, &lines(&["  Location: /x"]));
        assert_eq!(record.percent, 100);
        assert_eq!(record.eta_seconds, 0);
        assert_eq!(record.name.as_deref(), Some("example"));
    }
}
