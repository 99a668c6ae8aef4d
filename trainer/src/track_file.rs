use sim::{EpisodeConfig, StartPose, VehicleConfig, track::RoadColor};

/// On-disk description of a training scenario.
///
/// ```yaml
/// track: track.png
/// road_color: [130, 130, 130]
/// start: { x: 500, y: 350, angle_deg: 0 }
/// vehicle: { footprint: [48, 24], scale: 0.6 }
/// episode: { max_frames: 1000 }
/// ```
#[derive(Debug, serde::Deserialize)]
pub struct TrackFile {
    /// Relative paths are resolved against the track file's directory.
    pub track: std::path::PathBuf,
    #[serde(default)]
    pub road_color: RoadColor,
    #[serde(default = "default_start")]
    pub start: StartPose,
    #[serde(default)]
    pub vehicle: VehicleConfig,
    #[serde(default)]
    pub episode: EpisodeConfig,
}

fn default_start() -> StartPose {
    StartPose {
        x: 500.,
        y: 350.,
        angle_deg: 0.,
    }
}

#[cfg(test)]
mod test {
    use crate::track_file::TrackFile;

    #[test]
    fn test_minimal_file() {
        let file: TrackFile = serde_norway::from_str("track: track.png\n").unwrap();

        assert_eq!(file.track, std::path::PathBuf::from("track.png"));
        assert_eq!(file.road_color.0, [130, 130, 130]);
        assert_eq!((file.start.x, file.start.y, file.start.angle_deg), (500., 350., 0.));
        assert_eq!(file.vehicle, sim::VehicleConfig::default());
        assert_eq!(file.episode, sim::EpisodeConfig::default());
    }

    #[test]
    fn test_full_file() {
        let yaml = r#"
track: maps/oval.png
road_color: [120, 120, 120]
start: { x: 42.5, y: 17, angle_deg: -90 }
vehicle:
  footprint: [30, 14]
  scale: 0.5
episode:
  max_frames: 400
  spin: { interval: 30 }
"#;
        let file: TrackFile = serde_norway::from_str(yaml).unwrap();

        assert_eq!(file.road_color.0, [120, 120, 120]);
        assert_eq!(file.start.angle_deg, -90.);
        assert_eq!(file.vehicle.footprint, glam::dvec2(30., 14.));
        assert_eq!(file.vehicle.scale, 0.5);
        assert_eq!(file.vehicle.initial_speed, 2.);
        assert_eq!(file.episode.max_frames, 400);
        assert_eq!(file.episode.spin.interval, 30);
        assert_eq!(file.episode.spin.lookback, 2);
    }
}
