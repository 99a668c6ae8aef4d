pub mod controller;
pub mod episode;
pub mod math;
pub mod sensors;
pub mod track;
pub mod vehicle;

pub use controller::Controller;
pub use episode::{Episode, EpisodeConfig, EpisodeOutcome, Watermark};
pub use sensors::rangefinder::RangeFinder;
pub use track::{OpenTrack, RasterTrack, TrackSurface};
pub use vehicle::{StartPose, Vehicle, VehicleConfig};
