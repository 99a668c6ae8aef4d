//! The boundary between the simulation and whatever drives the vehicles.
//!
//! A controller sees `[sensor_0 .. sensor_4, speed]` (sensors divided by
//! [`MAX_SENSOR_DISTANCE`](crate::sensors::MAX_SENSOR_DISTANCE), speed divided by 10) and answers
//! with four activations: steer left, steer right, accelerate, brake. Anything above 0.5 counts.

pub mod manual;
pub mod network;

pub use manual::ManualInput;
pub use network::FeedForwardNetwork;

pub const OBSERVATION_SIZE: usize = 6;
pub const ACTION_SIZE: usize = 4;

pub type Observation = [f64; OBSERVATION_SIZE];

pub trait Controller: Send + Sync {
    /// Has to be pure. The output length is checked at the call site.
    fn activate(&self, observation: &Observation) -> Vec<f64>;
}

impl<T: Controller + ?Sized> Controller for &T {
    fn activate(&self, observation: &Observation) -> Vec<f64> {
        (**self).activate(observation)
    }
}

impl<T: Controller + ?Sized> Controller for Box<T> {
    fn activate(&self, observation: &Observation) -> Vec<f64> {
        (**self).activate(observation)
    }
}

/// Always answers with the same activations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantController(pub [f64; ACTION_SIZE]);

impl Controller for ConstantController {
    fn activate(&self, _observation: &Observation) -> Vec<f64> {
        self.0.to_vec()
    }
}

pub struct FnController<F>(pub F);

impl<F> Controller for FnController<F>
where
    F: Fn(&Observation) -> Vec<f64> + Send + Sync,
{
    fn activate(&self, observation: &Observation) -> Vec<f64> {
        (self.0)(observation)
    }
}

impl<F> std::fmt::Debug for FnController<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnController")
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error("Action Shape: Controller for vehicle {vehicle} produced {got} activations, expected {expected}")]
    ActionShape {
        vehicle: usize,
        expected: usize,
        got: usize,
    },
    #[error("Network Shape: {0}")]
    NetworkShape(String),
}

/// Rejects anything that is not exactly [`ACTION_SIZE`] long instead of padding or truncating.
pub fn validate_action(vehicle: usize, activations: Vec<f64>) -> Result<[f64; ACTION_SIZE], ControlError> {
    <[f64; ACTION_SIZE]>::try_from(activations).map_err(|rejected| ControlError::ActionShape {
        vehicle,
        expected: ACTION_SIZE,
        got: rejected.len(),
    })
}

#[cfg(test)]
mod test {
    use crate::controller::{
        ConstantController, ControlError, Controller, FnController, validate_action,
    };

    #[test]
    fn test_validate_action() {
        assert_eq!(validate_action(0, vec![0., 1., 0., 1.]), Ok([0., 1., 0., 1.]));
        assert_eq!(
            validate_action(3, vec![0., 1., 0.]),
            Err(ControlError::ActionShape {
                vehicle: 3,
                expected: 4,
                got: 3
            })
        );
        assert!(validate_action(0, vec![0.; 5]).is_err());
    }

    #[test]
    fn test_dyn_controllers() {
        let controllers: Vec<Box<dyn Controller>> = vec![
            Box::new(ConstantController([0., 0., 1., 0.])),
            Box::new(FnController(|observation: &[f64; 6]| {
                vec![observation[0], 0., 0., observation[5]]
            })),
        ];

        let observation = [0.25, 1., 1., 1., 1., 0.75];
        assert_eq!(controllers[0].activate(&observation), vec![0., 0., 1., 0.]);
        assert_eq!(controllers[1].activate(&observation), vec![0.25, 0., 0., 0.75]);
    }
}
