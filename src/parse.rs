use thiserror::Error;

use crate::model::{parse_rate, ExtraInfo, GlobalStats, Status, TorrentRecord, ETA_UNKNOWN};

// below this the corresponding direction counts as stalled
const RATE_IDLE_THRESHOLD: f64 = 0.1;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("malformed {field} field '{value}' in listing line")]
    MalformedRecord { field: &'static str, value: String },
}

impl ParseError {
    fn malformed(field: &'static str, value: &str) -> Self {
        ParseError::MalformedRecord {
            field,
            value: value.to_string(),
        }
    }
}

// Columns are whatever survives splitting on runs of two or more spaces,
// so single spaces inside a value ("2 hrs", "Up & Down") do not split it.
pub fn split_columns(line: &str) -> Vec<&str> {
    line.split("  ")
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

pub fn parse_record(line: &str) -> Result<TorrentRecord, ParseError> {
    let columns = split_columns(line);

    let raw_id = columns.first().copied().unwrap_or("");
    let id = raw_id
        .trim_matches('*')
        .parse::<i64>()
        .map_err(|_| ParseError::malformed("id", raw_id))?;

    let raw_percent = columns.get(1).copied().unwrap_or("");
    let percent = raw_percent
        .trim_end_matches('%')
        .parse::<i64>()
        .map_err(|_| ParseError::malformed("percent", raw_percent))?;

    // column 2 is the "Have" amount, which never reaches the output
    let raw_eta = columns.get(3).copied();
    let eta = raw_eta.map(|raw| {
        if raw == "Unknown" {
            "?".to_string()
        } else {
            raw.to_string()
        }
    });
    let eta_seconds = raw_eta.map_or(ETA_UNKNOWN, eta_to_seconds);

    let mut record = TorrentRecord {
        id,
        percent,
        eta,
        eta_seconds,
        rate_up: columns.get(4).map(|s| s.to_string()),
        rate_down: columns.get(5).map(|s| s.to_string()),
        ratio: columns.get(6).map(|s| s.to_string()),
        status: columns.get(7).map(|s| Status::parse(s)),
        name: columns.get(8).map(|s| s.to_string()),
        extra: ExtraInfo::default(),
    };
    reconcile_status(&mut record);
    Ok(record)
}

pub fn parse_totals(line: &str) -> GlobalStats {
    let columns = split_columns(line);
    GlobalStats {
        rate_up: columns
            .get(2)
            .map_or_else(|| "0.0".to_string(), |s| s.to_string()),
        rate_down: columns
            .get(3)
            .map_or_else(|| "0.0".to_string(), |s| s.to_string()),
    }
}

pub fn eta_to_seconds(raw: &str) -> i64 {
    if raw.contains("Done") {
        return 0;
    }
    let Some(number) = raw
        .split_whitespace()
        .next()
        .and_then(|token| token.parse::<i64>().ok())
    else {
        return ETA_UNKNOWN;
    };
    if raw.contains("secs") {
        number
    } else if raw.contains("min") {
        number.saturating_mul(60)
    } else if raw.contains("hrs") {
        number.saturating_mul(3_600)
    } else if raw.contains("days") {
        number.saturating_mul(86_400)
    } else {
        ETA_UNKNOWN
    }
}

// The daemon keeps reporting the transfer direction a torrent is configured
// for, not the one it is achieving. Demote the claimed status wherever the
// matching rate is effectively zero. Both passes read the status the previous
// pass may have written, so a fully stalled "Up & Down" lands on Idle.
pub fn reconcile_status(record: &mut TorrentRecord) {
    let up = record.rate_up.as_deref().map_or(0.0, parse_rate);
    let down = record.rate_down.as_deref().map_or(0.0, parse_rate);

    if record.status == Some(Status::UpAndDown) && down < RATE_IDLE_THRESHOLD {
        record.status = Some(Status::Seeding);
    } else if record.status == Some(Status::UpAndDown) && up < RATE_IDLE_THRESHOLD {
        record.status = Some(Status::Downloading);
    }

    if record.status == Some(Status::Seeding) && up < RATE_IDLE_THRESHOLD {
        record.status = Some(Status::Idle);
    } else if record.status == Some(Status::Downloading) && down < RATE_IDLE_THRESHOLD {
        record.status = Some(Status::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_LINE: &str = "   1    47%    1.06 GB       2 hrs     12.0     99.0     0.1  Up & Down    ubuntu mate 21.04 desktop";

    fn parsed(line: &str) -> TorrentRecord {
        parse_record(line).unwrap()
    }

    #[test]
    fn splits_on_runs_of_two_or_more_spaces() {
        let columns = split_columns("  a   b c    d  ");
        assert_eq!(columns, vec!["a", "b c", "d"]);
    }

    #[test]
    fn parses_every_column_of_a_full_line() {
        let record = parsed(FULL_LINE);
        assert_eq!(record.id, 1);
        assert_eq!(record.percent, 47);
        assert_eq!(record.eta.as_deref(), Some("2 hrs"));
        assert_eq!(record.eta_seconds, 7_200);
        assert_eq!(record.rate_up.as_deref(), Some("12.0"));
        assert_eq!(record.rate_down.as_deref(), Some("99.0"));
        assert_eq!(record.ratio.as_deref(), Some("0.1"));
        assert_eq!(record.status, Some(Status::UpAndDown));
        assert_eq!(record.name.as_deref(), Some("ubuntu mate 21.04 desktop"));
    }

    #[test]
    fn strips_the_verify_marker_from_the_id() {
        let record = parsed("  *3*   100%   1.0 GB   Done   0.0   0.0   1.2  Idle   archive");
        assert_eq!(record.id, 3);
    }

    #[test]
    fn short_lines_leave_trailing_fields_unset() {
        let record = parsed("   7   42%   1.2 GB   13 mins");
        assert_eq!(record.id, 7);
        assert_eq!(record.percent, 42);
        assert_eq!(record.eta_seconds, 780);
        assert!(record.rate_up.is_none());
        assert!(record.rate_down.is_none());
        assert!(record.ratio.is_none());
        assert!(record.status.is_none());
        assert!(record.name.is_none());
    }

    #[test]
    fn rejects_lines_without_a_numeric_id() {
        let err = parse_record("ID   Done   Have   ETA   Up   Down   Ratio   Status   Name").unwrap_err();
        assert_eq!(err, ParseError::malformed("id", "ID"));
        assert!(parse_record("").is_err());
    }

    #[test]
    fn rejects_unfinished_percent_markers() {
        let err = parse_record("   2   n/a    1.0 GB   Unknown   0.0   0.0   0.0  Stopped   stalled")
            .unwrap_err();
        assert_eq!(err, ParseError::malformed("percent", "n/a"));
    }

    #[test]
    fn unknown_eta_renders_as_a_question_mark() {
        let record = parsed("   4   10%   1.0 GB   Unknown   0.0   5.0   0.0  Downloading   slow one");
        assert_eq!(record.eta.as_deref(), Some("?"));
        assert_eq!(record.eta_seconds, ETA_UNKNOWN);
    }

    #[test]
    fn eta_units_convert_to_seconds() {
        assert_eq!(eta_to_seconds("30 secs"), 30);
        assert_eq!(eta_to_seconds("5 mins"), 300);
        assert_eq!(eta_to_seconds("1 min"), 60);
        assert_eq!(eta_to_seconds("2 hrs"), 7_200);
        assert_eq!(eta_to_seconds("1 days"), 86_400);
        assert_eq!(eta_to_seconds("Done"), 0);
        assert_eq!(eta_to_seconds("Unknown"), ETA_UNKNOWN);
        assert_eq!(eta_to_seconds("5 fortnights"), ETA_UNKNOWN);
    }

    #[test]
    fn absurd_eta_values_clamp_instead_of_overflowing() {
        assert_eq!(eta_to_seconds("999999999999999999 days"), ETA_UNKNOWN);
    }

    #[test]
    fn totals_line_yields_the_two_rates() {
        let totals = parse_totals("Sum:            4.59 GB              15.5    99.0");
        assert_eq!(totals.rate_up, "15.5");
        assert_eq!(totals.rate_down, "99.0");
    }

    #[test]
    fn truncated_totals_fall_back_to_zero() {
        let totals = parse_totals("Sum:  4.59 GB");
        assert_eq!(totals.rate_up, "0.0");
        assert_eq!(totals.rate_down, "0.0");
    }

    fn record_with(status: Status, up: &str, down: &str) -> TorrentRecord {
        TorrentRecord {
            id: 1,
            percent: 50,
            eta: None,
            eta_seconds: ETA_UNKNOWN,
            rate_up: Some(up.to_string()),
            rate_down: Some(down.to_string()),
            ratio: None,
            status: Some(status),
            name: None,
            extra: ExtraInfo::default(),
        }
    }

    #[test]
    fn up_and_down_with_no_download_becomes_seeding() {
        let mut record = record_with(Status::UpAndDown, "5.0", "0.0");
        reconcile_status(&mut record);
        assert_eq!(record.status, Some(Status::Seeding));
    }

    #[test]
    fn up_and_down_with_no_upload_becomes_downloading() {
        let mut record = record_with(Status::UpAndDown, "0.0", "5.0");
        reconcile_status(&mut record);
        assert_eq!(record.status, Some(Status::Downloading));
    }

    #[test]
    fn fully_stalled_up_and_down_lands_on_idle() {
        let mut record = record_with(Status::UpAndDown, "0.0", "0.0");
        reconcile_status(&mut record);
        assert_eq!(record.status, Some(Status::Idle));
    }

    #[test]
    fn stalled_seeding_and_downloading_become_idle() {
        let mut seeding = record_with(Status::Seeding, "0.05", "0.0");
        reconcile_status(&mut seeding);
        assert_eq!(seeding.status, Some(Status::Idle));

        let mut downloading = record_with(Status::Downloading, "0.0", "0.09");
        reconcile_status(&mut downloading);
        assert_eq!(downloading.status, Some(Status::Idle));
    }

    #[test]
    fn moving_torrents_keep_their_status() {
        let mut record = record_with(Status::UpAndDown, "0.1", "0.1");
        reconcile_status(&mut record);
        assert_eq!(record.status, Some(Status::UpAndDown));

        let mut seeding = record_with(Status::Seeding, "2.0", "0.0");
        reconcile_status(&mut seeding);
        assert_eq!(seeding.status, Some(Status::Seeding));
    }

    #[test]
    fn reconciliation_is_idempotent() {
        let mut record = record_with(Status::UpAndDown, "5.0", "0.0");
        reconcile_status(&mut record);
        let once = record.status.clone();
        reconcile_status(&mut record);
        assert_eq!(record.status, once);
    }

    #[test]
    fn missing_rates_count_as_stalled() {
        let mut record = record_with(Status::Seeding, "", "");
        record.rate_up = None;
        record.rate_down = None;
        reconcile_status(&mut record);
        assert_eq!(record.status, Some(Status::Idle));
    }
}
