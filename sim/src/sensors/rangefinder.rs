use crate::{
    math::{heading_direction, truncate_to_cell},
    sensors::Sensor2D,
    track::TrackSurface,
    vehicle::VehicleState,
};

pub const SENSOR_COUNT: usize = 5;
pub const SENSOR_ANGLES: [f64; SENSOR_COUNT] = [-60., -30., 0., 30., 60.];
pub const MAX_SENSOR_DISTANCE: u32 = 200;

/// Distances in pixels, ordered like [`SENSOR_ANGLES`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorReadings(pub [f64; SENSOR_COUNT]);

impl SensorReadings {
    pub fn normalized(&self) -> [f64; SENSOR_COUNT] {
        self.0.map(|d| d / MAX_SENSOR_DISTANCE as f64)
    }
}

/// Marches rays outward one pixel at a time until they leave the road.
#[derive(Debug, Clone)]
pub struct RangeFinder {
    pub angles: [f64; SENSOR_COUNT],
    pub max_distance: u32,
}

impl Default for RangeFinder {
    fn default() -> Self {
        Self {
            angles: SENSOR_ANGLES,
            max_distance: MAX_SENSOR_DISTANCE,
        }
    }
}

impl RangeFinder {
    /// Distance to the first wall along `absolute_deg`, or `max_distance` if the ray never
    /// hits one. The last sampled step is `max_distance - 1`.
    pub fn cast_ray(&self, state: &VehicleState, absolute_deg: f64, track: &dyn TrackSurface) -> f64 {
        let dir = heading_direction(absolute_deg);

        for step in 1..self.max_distance {
            let cell = truncate_to_cell(state.position + dir * step as f64);

            if !track.in_bounds(cell) || !track.is_road(cell) {
                log::trace!("Ray at {absolute_deg} deg stopped at {cell} after {step}");
                return step as f64;
            }
        }

        self.max_distance as f64
    }
}

impl Sensor2D for RangeFinder {
    type Reading = SensorReadings;

    fn sense(&self, state: &VehicleState, track: &dyn TrackSurface) -> SensorReadings {
        SensorReadings(
            self.angles
                .map(|relative| self.cast_ray(state, state.heading_deg + relative, track)),
        )
    }
}
