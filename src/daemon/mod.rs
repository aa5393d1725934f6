use anyhow::Result;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::artwork::ArtworkLookup;
use crate::ipc::Session;
use crate::models::{Status, Track};
use crate::player::{NowPlaying, PlayerReport};

/// Polls the player and mirrors what it reports into Discord.
pub struct Daemon<P, A> {
    session: Session,
    player: P,
    artwork: Option<A>,
    fallback_key: String,
    interval: Duration,
}

impl<P: NowPlaying, A: ArtworkLookup> Daemon<P, A> {
    pub fn new(
        session: Session,
        player: P,
        artwork: Option<A>,
        fallback_key: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            session,
            player,
            artwork,
            fallback_key: fallback_key.into(),
            interval,
        }
    }

    /// Runs until the process is terminated. A failed tick is logged and
    /// retried on the next one.
    pub fn run(&mut self) -> Result<()> {
        info!("Polling player every {}s", self.interval.as_secs());

        loop {
            if let Err(e) = self.tick() {
                error!("Presence update failed: {e:#}");
            }
            thread::sleep(self.interval);
        }
    }

    pub fn tick(&mut self) -> Result<()> {
        match self.player.now_playing()? {
            PlayerReport::NotRunning => {
                debug!("Player not running, clearing presence");
                self.session.clear_status()?;
            }
            PlayerReport::Playing(track) => {
                debug!(
                    "Now playing: {} - {} ({})",
                    track.artist,
                    track.title,
                    track.format_position()
                );
                let artwork = self.artwork_for(&track);
                let status = Status::listening(&track, &artwork, chrono::Utc::now().timestamp());
                self.session.set_status(&status)?;
            }
        }
        Ok(())
    }

    fn artwork_for(&self, track: &Track) -> String {
        let Some(lookup) = &self.artwork else {
            return self.fallback_key.clone();
        };

        match lookup.artwork_url(&track.title, &track.artist) {
            Ok(Some(url)) => url,
            Ok(None) => {
                debug!("No artwork found for {} - {}", track.artist, track.title);
                self.fallback_key.clone()
            }
            Err(e) => {
                warn!("Artwork lookup failed: {e:#}");
                self.fallback_key.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::SessionConfig;
    use crate::ipc::codec::{self, Opcode};
    use crate::ipc::locator::{DEFAULT_PREFIX, Locator};
    use anyhow::bail;
    use interprocess::local_socket::prelude::*;
    use interprocess::local_socket::{GenericFilePath, ListenerOptions};
    use serde_json::{Value, json};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io::Write;
    use std::sync::mpsc::{self, Receiver};
    use tempfile::TempDir;

    struct ScriptedPlayer {
        reports: RefCell<VecDeque<Result<PlayerReport>>>,
    }

    impl ScriptedPlayer {
        fn new(reports: Vec<Result<PlayerReport>>) -> Self {
            Self {
                reports: RefCell::new(reports.into()),
            }
        }
    }

    impl NowPlaying for ScriptedPlayer {
        fn now_playing(&self) -> Result<PlayerReport> {
            self.reports
                .borrow_mut()
                .pop_front()
                .unwrap_or(Ok(PlayerReport::NotRunning))
        }
    }

    struct FixedArtwork(Option<&'static str>);

    impl ArtworkLookup for FixedArtwork {
        fn artwork_url(&self, _title: &str, _artist: &str) -> Result<Option<String>> {
            match self.0 {
                Some("error") => bail!("network down"),
                other => Ok(other.map(str::to_string)),
            }
        }
    }

    /// Accepts one connection, answers everything, and forwards message payloads.
    fn start_endpoint() -> (TempDir, Receiver<Value>) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("discord-ipc-0");
        let name = path.as_os_str().to_fs_name::<GenericFilePath>().unwrap();
        let listener = ListenerOptions::new().name(name).create_sync().unwrap();

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let Ok(mut stream) = listener.accept() else {
                return;
            };
            while let Ok(frame) = codec::read_frame(&mut stream) {
                let payload = frame.json().unwrap();
                let is_set = !payload["args"]["activity"].is_null();
                if frame.opcode == Opcode::Message.as_u32() {
                    let _ = tx.send(payload);
                }
                if frame.opcode == Opcode::Handshake.as_u32() || is_set {
                    let reply = codec::encode(Opcode::Message, &json!({"evt": null})).unwrap();
                    let _ = stream.write_all(&reply);
                }
            }
        });

        (dir, rx)
    }

    fn open_session(dir: &TempDir) -> Session {
        let config = SessionConfig::new("client", Locator::new(dir.path(), DEFAULT_PREFIX));
        Session::open(config).unwrap()
    }

    fn playing() -> PlayerReport {
        PlayerReport::Playing(Track {
            title: "Song".to_string(),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            position: 10.0,
            duration: 100.0,
        })
    }

    #[test]
    fn test_tick_sets_and_clears() {
        let (dir, rx) = start_endpoint();
        let player = ScriptedPlayer::new(vec![Ok(playing()), Ok(PlayerReport::NotRunning)]);
        let mut daemon = Daemon::new(
            open_session(&dir),
            player,
            Some(FixedArtwork(Some("https://x/512x512.jpg"))),
            "music",
            Duration::from_secs(5),
        );

        daemon.tick().unwrap();
        let payload = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let activity = &payload["args"]["activity"];
        assert_eq!(activity["type"], 2);
        assert_eq!(activity["details"], "Song");
        assert_eq!(activity["state"], "by Artist");
        assert_eq!(activity["assets"]["large_image"], "https://x/512x512.jpg");
        assert_eq!(activity["assets"]["large_text"], "Album");

        daemon.tick().unwrap();
        let payload = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(payload["args"]["activity"].is_null());
    }

    #[test]
    fn test_artwork_fallback() {
        let (dir, rx) = start_endpoint();
        let player = ScriptedPlayer::new(vec![Ok(playing()), Ok(playing())]);
        let mut daemon = Daemon::new(
            open_session(&dir),
            player,
            Some(FixedArtwork(Some("error"))),
            "music",
            Duration::from_secs(5),
        );

        daemon.tick().unwrap();
        let payload = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(payload["args"]["activity"]["assets"]["large_image"], "music");

        daemon.artwork = Some(FixedArtwork(None));
        daemon.tick().unwrap();
        let payload = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(payload["args"]["activity"]["assets"]["large_image"], "music");
    }

    #[test]
    fn test_player_error_skips_tick() {
        let (dir, rx) = start_endpoint();
        let player = ScriptedPlayer::new(vec![Err(anyhow::anyhow!("osascript failed"))]);
        let mut daemon: Daemon<_, FixedArtwork> =
            Daemon::new(open_session(&dir), player, None, "music", Duration::from_secs(5));

        assert!(daemon.tick().is_err());
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }
}
