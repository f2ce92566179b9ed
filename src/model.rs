use time::PrimitiveDateTime;

// ETA for torrents the upstream cannot estimate; sorts after every finite value.
pub const ETA_UNKNOWN: i64 = i64::MAX;

#[derive(Debug, Clone)]
pub struct TorrentRecord {
    pub id: i64,
    pub percent: i64,
    pub eta: Option<String>,
    pub eta_seconds: i64,
    pub rate_up: Option<String>,
    pub rate_down: Option<String>,
    pub ratio: Option<String>,
    pub status: Option<Status>,
    pub name: Option<String>,
    pub extra: ExtraInfo,
}

#[derive(Debug, Clone, Default)]
pub struct ExtraInfo {
    pub location: Option<String>,
    pub availability: Option<String>,
    pub total_size: Option<String>,
    pub downloaded: Option<String>,
    pub uploaded: Option<String>,
    pub ratio_limit: Option<String>,
    pub corrupt: Option<String>,
    pub peers_connected: Option<String>,
    pub peers_uploading: Option<String>,
    pub peers_downloading: Option<String>,
    pub date_added: Option<PrimitiveDateTime>,
    pub date_started: Option<PrimitiveDateTime>,
    pub latest_activity: Option<PrimitiveDateTime>,
    pub public: Option<String>,
    pub piece_count: Option<String>,
    pub piece_size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Seeding,
    Downloading,
    UpAndDown,
    Idle,
    Other(String),
}

impl Status {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Seeding" => Status::Seeding,
            "Downloading" => Status::Downloading,
            "Up & Down" => Status::UpAndDown,
            "Idle" => Status::Idle,
            other => Status::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Status::Seeding => "Seeding",
            Status::Downloading => "Downloading",
            Status::UpAndDown => "Up & Down",
            Status::Idle => "Idle",
            Status::Other(raw) => raw,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Status::Seeding | Status::Downloading | Status::UpAndDown)
    }

    pub fn template_key(&self) -> String {
        self.as_str().to_lowercase().replace(' ', "_")
    }
}

#[derive(Debug, Clone)]
pub struct GlobalStats {
    pub rate_up: String,
    pub rate_down: String,
}

pub fn parse_rate(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(0.0)
}

pub fn format_speed(raw: &str, kib_label: &str, mib_label: &str) -> String {
    let value = parse_rate(raw);
    let (scaled, label) = if value > 1024.0 {
        (value / 1024.0, mib_label)
    } else {
        (value, kib_label)
    };
    // round to two decimals, then show only the first of them
    let mut rounded = format!("{scaled:.2}");
    if let Some(dot) = rounded.find('.') {
        rounded.truncate(dot + 2);
    }
    format!("{rounded} {label}")
}

pub fn clip_name(name: &str, max: usize) -> String {
    name.chars().take(max).collect()
}
