use crate::{track::TrackSurface, vehicle::VehicleState};

pub mod rangefinder;

pub use rangefinder::{MAX_SENSOR_DISTANCE, RangeFinder, SENSOR_ANGLES, SENSOR_COUNT, SensorReadings};

pub trait Sensor2D {
    type Reading;

    fn sense(&self, state: &VehicleState, track: &dyn TrackSurface) -> Self::Reading;
}
