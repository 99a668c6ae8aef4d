use crate::controller::{ACTION_SIZE, Controller, Observation};

/// Arrow-key state of a human driver, read once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManualInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl ManualInput {
    pub fn activations(&self) -> [f64; ACTION_SIZE] {
        [self.left, self.right, self.up, self.down].map(|pressed| if pressed { 1. } else { 0. })
    }
}

impl Controller for ManualInput {
    fn activate(&self, _observation: &Observation) -> Vec<f64> {
        self.activations().to_vec()
    }
}
