use glam::DVec2;

use crate::{
    controller::{ACTION_SIZE, OBSERVATION_SIZE, Observation},
    math::{OrientedBox2D, heading_direction, normalize_degrees},
    sensors::{RangeFinder, SENSOR_COUNT, Sensor2D, SensorReadings},
    track::TrackSurface,
};

pub const ACTIVATION_THRESHOLD: f64 = 0.5;
pub const STEERING_RATE_DEG: f64 = 3.;
pub const ACCELERATION: f64 = 0.2;
pub const BRAKING: f64 = 0.2;
pub const FRICTION: f64 = 0.02;
pub const MAX_SPEED: f64 = 8.;
/// Minimum speed for [`Vehicle::steer`] to turn the wheels.
pub const MIN_STEERING_SPEED: f64 = 0.5;
/// Shrinks the rendered body into a more forgiving hitbox.
pub const HITBOX_SHRINK: f64 = 0.4;
pub const SPEED_NORMALIZATION: f64 = 10.;

/// Where every vehicle of an episode starts.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StartPose {
    pub x: f64,
    pub y: f64,
    pub angle_deg: f64,
}

impl StartPose {
    #[inline]
    pub fn position(&self) -> DVec2 {
        glam::dvec2(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    /// Rendered body size in pixels before scaling.
    pub footprint: DVec2,
    pub scale: f64,
    pub initial_speed: f64,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            footprint: glam::dvec2(48., 24.),
            scale: 1.,
            initial_speed: 2.,
        }
    }
}

impl VehicleConfig {
    pub fn with_scale(scale: f64) -> Self {
        Self {
            scale,
            ..Default::default()
        }
    }

    /// The scaled body is rounded down to whole pixels before shrinking.
    #[inline]
    pub fn hitbox_half_extent(&self) -> DVec2 {
        (self.footprint * self.scale).trunc() / 2. * HITBOX_SHRINK
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleState {
    pub position: DVec2,
    /// Degrees in `[0, 360)`, measured from +X towards +Y.
    pub heading_deg: f64,
    /// Always within `[0, MAX_SPEED]`.
    pub speed: f64,
}

/// Thresholded intent decoded from a raw activation vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Action {
    pub steer_left: bool,
    pub steer_right: bool,
    pub accelerate: bool,
    pub brake: bool,
}

impl Action {
    pub fn decode(activations: &[f64; ACTION_SIZE]) -> Self {
        let [left, right, accelerate, brake] = activations.map(|a| a > ACTIVATION_THRESHOLD);

        Self {
            steer_left: left,
            steer_right: right,
            accelerate,
            brake,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steer {
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct Vehicle {
    config: VehicleConfig,
    state: VehicleState,
    alive: bool,
    readings: SensorReadings,
    distance_traveled: f64,
    rangefinder: RangeFinder,
}

impl Vehicle {
    pub fn new(pose: StartPose, config: VehicleConfig) -> Self {
        Self {
            config,
            state: VehicleState {
                position: pose.position(),
                heading_deg: normalize_degrees(pose.angle_deg),
                speed: config.initial_speed.clamp(0., MAX_SPEED),
            },
            alive: true,
            readings: SensorReadings::default(),
            distance_traveled: 0.,
            rangefinder: RangeFinder::default(),
        }
    }

    #[inline]
    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    #[inline]
    pub fn position(&self) -> DVec2 {
        self.state.position
    }

    #[inline]
    pub fn heading_deg(&self) -> f64 {
        self.state.heading_deg
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.state.speed
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    #[inline]
    pub fn readings(&self) -> &SensorReadings {
        &self.readings
    }

    #[inline]
    pub fn distance_traveled(&self) -> f64 {
        self.distance_traveled
    }

    /// Forces the speed, clamped into `[0, MAX_SPEED]`. Ignored once dead.
    pub fn set_speed(&mut self, speed: f64) {
        if self.alive {
            self.state.speed = speed.clamp(0., MAX_SPEED);
        }
    }

    /// Permanent; nothing brings a vehicle back.
    pub fn kill(&mut self) {
        self.alive = false;
    }

    /// Normalized sensor distances followed by the scaled speed.
    pub fn observation(&self) -> Observation {
        let mut observation = [0.; OBSERVATION_SIZE];
        observation[..SENSOR_COUNT].copy_from_slice(&self.readings.normalized());
        observation[SENSOR_COUNT] = self.state.speed / SPEED_NORMALIZATION;

        observation
    }

    pub fn apply_control(&mut self, activations: &[f64; ACTION_SIZE]) {
        if !self.alive {
            return;
        }

        let action = Action::decode(activations);
        let state = &mut self.state;

        if action.steer_left {
            state.heading_deg -= STEERING_RATE_DEG;
        }
        if action.steer_right {
            state.heading_deg += STEERING_RATE_DEG;
        }
        state.heading_deg = normalize_degrees(state.heading_deg);

        if action.accelerate {
            state.speed = (state.speed + ACCELERATION).min(MAX_SPEED);
        }
        if action.brake {
            state.speed = (state.speed - BRAKING).max(0.);
        }
        if !action.accelerate && !action.brake {
            state.speed = (state.speed - FRICTION).max(0.);
        }
    }

    /// Manual steering, which only bites while the vehicle is rolling.
    pub fn steer(&mut self, direction: Steer) {
        if !self.alive || self.state.speed.abs() <= MIN_STEERING_SPEED {
            return;
        }

        let delta = match direction {
            Steer::Left => -STEERING_RATE_DEG,
            Steer::Right => STEERING_RATE_DEG,
        };
        self.state.heading_deg = normalize_degrees(self.state.heading_deg + delta);
    }

    /// Advances one tick. Without a track only the motion is integrated.
    pub fn update(&mut self, track: Option<&dyn TrackSurface>) {
        if !self.alive {
            return;
        }

        let VehicleState {
            heading_deg, speed, ..
        } = self.state;

        self.state.position += heading_direction(heading_deg) * speed;
        self.distance_traveled += speed.abs();

        if let Some(track) = track {
            self.readings = self.rangefinder.sense(&self.state, track);
            self.check_collision(track);
        }
    }

    pub fn hitbox(&self) -> OrientedBox2D {
        OrientedBox2D {
            center: self.state.position,
            half_extent: self.config.hitbox_half_extent(),
            heading_deg: self.state.heading_deg,
        }
    }

    #[inline]
    pub fn corners(&self) -> [DVec2; 4] {
        self.hitbox().corners()
    }

    /// True as soon as any hitbox corner sits outside the map or off the road.
    pub fn is_off_track(&self, track: &dyn TrackSurface) -> bool {
        self.corners().into_iter().any(|corner| {
            let off = !track.is_road_at(corner);
            if off {
                log::trace!("Corner {corner} is off track");
            }
            off
        })
    }

    /// Kills the vehicle if it is off track. Returns whether it is still alive.
    pub fn check_collision(&mut self, track: &dyn TrackSurface) -> bool {
        if self.alive && self.is_off_track(track) {
            log::debug!("Vehicle left the track at {}", self.state.position);
            self.alive = false;
        }

        self.alive
    }
}

#[cfg(test)]
mod test {
    use crate::{
        sensors::MAX_SENSOR_DISTANCE,
        track::{OpenTrack, RasterTrack},
        vehicle::{Action, MAX_SPEED, StartPose, Steer, Vehicle, VehicleConfig},
    };

    const ACCELERATE: [f64; 4] = [0., 0., 1., 0.];
    const BRAKE: [f64; 4] = [0., 0., 0., 1.];
    const COAST: [f64; 4] = [0., 0., 0., 0.];

    fn vehicle_at(x: f64, y: f64, angle_deg: f64) -> Vehicle {
        Vehicle::new(StartPose { x, y, angle_deg }, VehicleConfig::default())
    }

    #[test]
    fn test_decode_thresholds() {
        assert_eq!(Action::decode(&[0.5, 0.5, 0.5, 0.5]), Action::default());
        assert_eq!(
            Action::decode(&[0.51, -3., 7., 0.500001]),
            Action {
                steer_left: true,
                steer_right: false,
                accelerate: true,
                brake: true,
            }
        );
    }

    #[test]
    fn test_steering_wraps() {
        let mut vehicle = vehicle_at(0., 0., 0.);

        vehicle.apply_control(&[1., 0., 0., 0.]);
        assert_eq!(vehicle.heading_deg(), 357.);

        vehicle.apply_control(&[0., 1., 0., 0.]);
        assert_eq!(vehicle.heading_deg(), 0.);

        // Both at once cancel out.
        vehicle.apply_control(&[1., 1., 0., 0.]);
        assert_eq!(vehicle.heading_deg(), 0.);

        for _ in 0..1000 {
            vehicle.apply_control(&[0., 1., 0., 0.]);
            assert!((0.0..360.).contains(&vehicle.heading_deg()));
        }
    }

    #[test]
    fn test_start_heading_is_normalized() {
        assert_eq!(vehicle_at(0., 0., -90.).heading_deg(), 270.);
        assert_eq!(vehicle_at(0., 0., 720.).heading_deg(), 0.);
    }

    #[test]
    fn test_accelerate_until_clamped() {
        let mut vehicle = vehicle_at(0., 0., 0.);
        assert_eq!(vehicle.speed(), 2.);

        for tick in 1..=29 {
            vehicle.apply_control(&ACCELERATE);
            assert!(vehicle.speed() < MAX_SPEED, "clamped early at tick {tick}");
        }

        vehicle.apply_control(&ACCELERATE);
        assert!((vehicle.speed() - MAX_SPEED).abs() < 1e-9);

        for _ in 0..10 {
            vehicle.apply_control(&ACCELERATE);
            assert_eq!(vehicle.speed(), MAX_SPEED);
        }
    }

    #[test]
    fn test_brake_and_friction_floor() {
        let mut vehicle = vehicle_at(0., 0., 0.);

        vehicle.apply_control(&BRAKE);
        assert!((vehicle.speed() - 1.8).abs() < 1e-12);

        vehicle.apply_control(&COAST);
        assert!((vehicle.speed() - 1.78).abs() < 1e-12);

        // Accelerate and brake together skip friction.
        vehicle.apply_control(&[0., 0., 1., 1.]);
        assert!((vehicle.speed() - 1.78).abs() < 1e-12);

        for _ in 0..100 {
            vehicle.apply_control(&BRAKE);
            assert!(vehicle.speed() >= 0.);
        }
        assert_eq!(vehicle.speed(), 0.);

        vehicle.apply_control(&COAST);
        assert_eq!(vehicle.speed(), 0.);
    }

    #[test]
    fn test_update_integrates_motion() {
        let mut vehicle = vehicle_at(10., 10., 90.);
        vehicle.update(None);

        assert!((vehicle.position() - glam::dvec2(10., 12.)).length() < 1e-9);
        assert_eq!(vehicle.distance_traveled(), 2.);
        // No track means no sensing.
        assert_eq!(vehicle.readings().0, [0.; 5]);
        assert!(vehicle.is_alive());
    }

    #[test]
    fn test_open_track_sensors_are_clear() {
        let mut vehicle = vehicle_at(0., 0., 0.);
        vehicle.update(Some(&OpenTrack));

        assert_eq!(vehicle.readings().0, [MAX_SENSOR_DISTANCE as f64; 5]);
        assert!(vehicle.is_alive());
    }

    #[test]
    fn test_corner_past_right_edge_kills() {
        let track = RasterTrack::from_fn(glam::usizevec2(100, 100), |_| true);

        // Half extent is (9.6, 4.8); the right corners land on column 100.
        let mut vehicle = vehicle_at(90.9, 50., 0.);
        vehicle.set_speed(0.);
        vehicle.update(Some(&track));
        assert!(!vehicle.is_alive());

        // One pixel further in, every corner is on road.
        let mut vehicle = vehicle_at(89.9, 50., 0.);
        vehicle.set_speed(0.);
        vehicle.update(Some(&track));
        assert!(vehicle.is_alive());
    }

    #[test]
    fn test_collision_is_deterministic() {
        let track = RasterTrack::from_fn(glam::usizevec2(200, 200), |cell| cell.x + cell.y < 220);

        for (x, y, heading) in [(100., 100., 0.), (100., 115., 45.), (110., 107., 300.)] {
            let vehicle = vehicle_at(x, y, heading);
            let first = vehicle.is_off_track(&track);
            for _ in 0..10 {
                assert_eq!(vehicle.is_off_track(&track), first);
            }
        }
    }

    #[test]
    fn test_dead_vehicle_is_frozen() {
        let track = RasterTrack::from_fn(glam::usizevec2(100, 100), |_| true);
        let mut vehicle = vehicle_at(50., 50., 30.);
        vehicle.update(Some(&track));
        vehicle.kill();

        let state = *vehicle.state();
        let readings = *vehicle.readings();
        let distance = vehicle.distance_traveled();

        for _ in 0..5 {
            vehicle.apply_control(&[1., 0., 1., 0.]);
            vehicle.update(Some(&track));
            vehicle.update(None);
            vehicle.steer(Steer::Right);
            vehicle.set_speed(5.);
            assert!(!vehicle.check_collision(&OpenTrack));
        }

        assert_eq!(*vehicle.state(), state);
        assert_eq!(*vehicle.readings(), readings);
        assert_eq!(vehicle.distance_traveled(), distance);
    }

    #[test]
    fn test_manual_steer_needs_speed() {
        let mut vehicle = vehicle_at(0., 0., 10.);
        vehicle.set_speed(0.5);
        vehicle.steer(Steer::Left);
        assert_eq!(vehicle.heading_deg(), 10.);

        vehicle.set_speed(0.6);
        vehicle.steer(Steer::Left);
        assert_eq!(vehicle.heading_deg(), 7.);
    }

    #[test]
    fn test_observation_layout() {
        let mut vehicle = vehicle_at(0., 0., 0.);
        vehicle.set_speed(4.);
        vehicle.update(Some(&OpenTrack));

        assert_eq!(vehicle.observation(), [1., 1., 1., 1., 1., 0.4]);
    }

    #[test]
    fn test_scaled_hitbox() {
        let config = VehicleConfig::with_scale(0.5);
        assert!((config.hitbox_half_extent() - glam::dvec2(4.8, 2.4)).length() < 1e-12);

        // 48x24 at 0.6 renders as 28x14, not 28.8x14.4.
        let config = VehicleConfig::with_scale(0.6);
        assert!((config.hitbox_half_extent() - glam::dvec2(5.6, 2.8)).length() < 1e-12);

        let pose = StartPose {
            x: 0.,
            y: 0.,
            angle_deg: 0.,
        };
        let vehicle = Vehicle::new(pose, config);
        assert_eq!(vehicle.config(), &config);
        assert!((vehicle.hitbox().size() - glam::dvec2(11.2, 5.6)).length() < 1e-12);
    }
}
