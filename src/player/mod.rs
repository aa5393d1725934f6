use anyhow::{Context, Result, bail};
use std::process::Command;

use crate::models::Track;

const NOT_RUNNING: &str = "App not running";

/// What the player reported on one poll.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerReport {
    Playing(Track),
    NotRunning,
}

pub trait NowPlaying {
    fn now_playing(&self) -> Result<PlayerReport>;
}

/// Reads the current track from Apple Music through `osascript`.
pub struct AppleMusic {
    app: String,
}

impl AppleMusic {
    pub fn new(app: impl Into<String>) -> Self {
        Self { app: app.into() }
    }

    pub fn check_dependencies() -> Result<()> {
        let osascript = Command::new("osascript").arg("-e").arg("return 1").output();

        if osascript.is_err() {
            bail!("osascript is not available. Now-playing detection requires macOS.");
        }

        Ok(())
    }

    fn script(&self) -> String {
        format!(
            r#"
on is_running(appName)
	tell application "System Events" to (name of processes) contains appName
end is_running

if is_running("{app}") then
	tell application "{app}"
		set trackName to name of current track
		set trackArtist to artist of current track
		set trackAlbum to album of current track
		set playerPosition to player position
		set trackDuration to duration of current track

		set rPosition to (round (playerPosition * 100)) / 100
		set rDuration to (round (trackDuration * 100)) / 100

		return trackName & "|" & trackArtist & "|" & rPosition & "|" & rDuration & "|" & trackAlbum
	end tell
else
	return "{NOT_RUNNING}"
end if
"#,
            app = self.app
        )
    }
}

impl NowPlaying for AppleMusic {
    fn now_playing(&self) -> Result<PlayerReport> {
        let output = Command::new("osascript")
            .args(["-e", &self.script()])
            .output()
            .with_context(|| "Failed to run osascript")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("osascript failed: {}", stderr.trim());
        }

        parse_report(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse `title|artist|position|duration|album` as printed by the script.
pub fn parse_report(output: &str) -> Result<PlayerReport> {
    let output = output.trim_end_matches(['\r', '\n']);
    if output.contains(NOT_RUNNING) {
        return Ok(PlayerReport::NotRunning);
    }

    let fields: Vec<&str> = output.split('|').collect();
    if fields.len() < 5 {
        bail!("Unexpected player output: {output:?}");
    }

    Ok(PlayerReport::Playing(Track {
        title: fields[0].to_string(),
        artist: fields[1].to_string(),
        position: parse_seconds(fields[2]),
        duration: parse_seconds(fields[3]),
        // Album names may themselves contain '|'.
        album: fields[4..].join("|"),
    }))
}

// AppleScript formats reals with the locale's decimal separator.
fn parse_seconds(s: &str) -> f64 {
    s.trim().replace(',', ".").parse().unwrap_or(0.0)
}
