use serde::{Serialize, Serializer};

/// A track as reported by the music player.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Playback position in seconds.
    pub position: f64,
    /// Track length in seconds.
    pub duration: f64,
}

impl Track {
    pub fn format_position(&self) -> String {
        format!(
            "{} / {}",
            format_duration(self.position),
            format_duration(self.duration)
        )
    }
}

fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Activity type shown by Discord ("Playing", "Listening to", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivityKind {
    #[default]
    Playing = 0,
    Streaming = 1,
    Listening = 2,
    Watching = 3,
    Custom = 4,
    Competing = 5,
}

impl Serialize for ActivityKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl TryFrom<u8> for ActivityKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ActivityKind::Playing),
            1 => Ok(ActivityKind::Streaming),
            2 => Ok(ActivityKind::Listening),
            3 => Ok(ActivityKind::Watching),
            4 => Ok(ActivityKind::Custom),
            5 => Ok(ActivityKind::Competing),
            _ => Err(format!("Invalid activity type: {value}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Assets {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub large_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub large_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub small_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub small_text: Option<String>,
}

impl Assets {
    pub fn is_empty(&self) -> bool {
        self.large_image.is_none()
            && self.large_text.is_none()
            && self.small_image.is_none()
            && self.small_text.is_none()
    }
}

/// Start/end of the activity in Unix epoch seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Timestamps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
}

impl Timestamps {
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// What Discord should display. Serializes to the `activity` object of a
/// `SET_ACTIVITY` command.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Status {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub details: String,
    pub state: String,
    #[serde(skip_serializing_if = "Assets::is_empty")]
    pub assets: Assets,
    #[serde(skip_serializing_if = "Timestamps::is_empty")]
    pub timestamps: Timestamps,
}

impl Status {
    pub fn new(kind: ActivityKind, details: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            kind,
            details: details.into(),
            state: state.into(),
            ..Default::default()
        }
    }

    pub fn with_assets(mut self, assets: Assets) -> Self {
        self.assets = assets;
        self
    }

    pub fn with_timestamps(mut self, timestamps: Timestamps) -> Self {
        self.timestamps = timestamps;
        self
    }

    /// "Listening to" presence for a track, with a progress bar anchored at `now`.
    pub fn listening(track: &Track, artwork: &str, now: i64) -> Self {
        let position = track.position.max(0.0) as i64;
        let remaining = (track.duration - track.position).max(0.0) as i64;

        Status::new(
            ActivityKind::Listening,
            track.title.clone(),
            format!("by {}", track.artist),
        )
        .with_assets(Assets {
            large_image: Some(artwork.to_string()),
            large_text: Some(track.album.clone()),
            ..Default::default()
        })
        .with_timestamps(Timestamps {
            start: Some(now - position),
            end: Some(now + remaining),
        })
    }
}
