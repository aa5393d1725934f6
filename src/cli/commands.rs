use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::artwork::{ArtworkLookup, ITunesSearch};
use crate::config::Config;
use crate::daemon::Daemon;
use crate::ipc::{Locator, Session};
use crate::models::{ActivityKind, Assets, Status, Timestamps};
use crate::player::{AppleMusic, NowPlaying, PlayerReport};

pub struct App {
    pub config: Config,
}

impl App {
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        Ok(Self { config })
    }

    fn open_session(&self) -> Result<Session> {
        Session::open(self.config.session_config())
            .with_context(|| "Could not connect to Discord. Is it running?")
    }

    fn artwork(&self) -> Option<ITunesSearch> {
        let artwork = &self.config.artwork;
        if !artwork.enabled {
            return None;
        }
        let timeout = Duration::from_secs(artwork.timeout_secs);
        Some(ITunesSearch::new(artwork.size, timeout))
    }

    // Command implementations

    pub fn run(&self) -> Result<()> {
        AppleMusic::check_dependencies()?;

        let session = self.open_session()?;
        println!("Connected to Discord!");

        let mut daemon = Daemon::new(
            session,
            AppleMusic::new(&self.config.player.app),
            self.artwork(),
            &self.config.artwork.fallback_key,
            self.config.poll_interval(),
        );
        daemon.run()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn set(
        &self,
        details: &str,
        state: &str,
        kind: u8,
        image: Option<String>,
        image_text: Option<String>,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<()> {
        let kind = ActivityKind::try_from(kind).map_err(anyhow::Error::msg)?;
        let status = Status::new(kind, details, state)
            .with_assets(Assets {
                large_image: image,
                large_text: image_text,
                ..Default::default()
            })
            .with_timestamps(Timestamps { start, end });

        let mut session = self.open_session()?;
        session.set_status(&status)?;
        println!("Status set: {details}");

        // Discord drops the presence as soon as the socket closes, so keep
        // the connection open and re-send after any reconnect.
        println!("Press Ctrl-C to clear it.");
        loop {
            std::thread::sleep(self.config.poll_interval());
            session.set_status(&status)?;
        }
    }

    pub fn clear(&self) -> Result<()> {
        let mut session = self.open_session()?;
        session.clear_status()?;
        println!("Status cleared");
        Ok(())
    }

    pub fn locate(&self, base_dir: Option<PathBuf>) -> Result<()> {
        let locator = match base_dir {
            Some(dir) => Locator::new(dir, self.config.ipc.prefix.clone()),
            None => self.config.locator(),
        };

        match locator.locate() {
            Some(path) => {
                println!("{}", path.display());
                Ok(())
            }
            None => bail!(
                "No Discord IPC socket found in {}",
                locator.base_dir().display()
            ),
        }
    }

    pub fn now_playing(&self) -> Result<()> {
        AppleMusic::check_dependencies()?;

        let player = AppleMusic::new(&self.config.player.app);
        let track = match player.now_playing()? {
            PlayerReport::Playing(track) => track,
            PlayerReport::NotRunning => {
                println!("{} is not running.", self.config.player.app);
                return Ok(());
            }
        };

        println!("Track:    {}", track.title);
        println!("Artist:   {}", track.artist);
        println!("Album:    {}", track.album);
        println!("Position: {}", track.format_position());

        if let Some(lookup) = self.artwork() {
            match lookup.artwork_url(&track.title, &track.artist)? {
                Some(url) => println!("Artwork:  {url}"),
                None => println!("Artwork:  no artwork found"),
            }
        }

        Ok(())
    }

    pub fn show_config(&self, save: bool) -> Result<()> {
        print!("{}", self.config.to_toml()?);

        if save {
            self.config.save()?;
            println!("\nSaved to {}", Config::config_path().display());
        }

        Ok(())
    }
}
