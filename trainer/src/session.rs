use std::{path::PathBuf, time::Instant};

use sim::{
    EpisodeConfig, RasterTrack, StartPose, TrackSurface, Vehicle, VehicleConfig,
    track::TrackError,
};

use crate::track_file::TrackFile;

/// A loaded track plus everything needed to start episodes on it.
#[derive(Debug, Clone)]
pub struct Session {
    pub track: RasterTrack,
    pub start: StartPose,
    pub vehicle: VehicleConfig,
    pub episode: EpisodeConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("IOError: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Track: {0}")]
    TrackError(#[from] TrackError),
    #[error("Deserialize: {0}")]
    DeserializeError(#[from] serde_norway::Error),
}

impl Session {
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, SessionError> {
        let path = path.as_ref();
        log::debug!("Loading {path:?}");

        let file = std::fs::File::open(path)?;
        let track_file: TrackFile = serde_norway::from_reader(file)?;

        let path = PathBuf::from(path).canonicalize()?;
        let image_path = if let Some(parent) = path.parent() {
            parent.join(&track_file.track)
        } else {
            PathBuf::from("/").join(&track_file.track)
        };

        let start = Instant::now();
        let track = RasterTrack::open(&image_path, track_file.road_color)?;
        let size = track.size();

        log::info!(
            "Track {image_path:?}: Width: {}, Height: {}, loaded in {} ms",
            size.x,
            size.y,
            start.elapsed().as_millis()
        );

        Ok(Self::new(track, &track_file))
    }

    pub fn new(track: RasterTrack, track_file: &TrackFile) -> Self {
        Self {
            track,
            start: track_file.start,
            vehicle: track_file.vehicle,
            episode: track_file.episode,
        }
    }

    /// Whether a fresh vehicle on the start pose survives its first collision check.
    pub fn start_is_valid(&self) -> bool {
        let vehicle = Vehicle::new(self.start, self.vehicle);
        self.track.is_road_at(self.start.position()) && !vehicle.is_off_track(&self.track)
    }
}
