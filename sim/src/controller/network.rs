//! Fixed-topology feed-forward network, the persisted form of an evolved driver.

use crate::controller::{ACTION_SIZE, ControlError, Controller, OBSERVATION_SIZE, Observation};

/// Steepened logistic curve with the input clamped so `exp` never overflows.
#[inline]
pub fn sigmoid(z: f64) -> f64 {
    let z = (5. * z).clamp(-60., 60.);
    1. / (1. + (-z).exp())
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Layer {
    /// One row per output neuron.
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
}

impl Layer {
    pub fn from_fn(inputs: usize, outputs: usize, mut init: impl FnMut() -> f64) -> Self {
        Self {
            weights: (0..outputs)
                .map(|_| (0..inputs).map(|_| init()).collect())
                .collect(),
            biases: (0..outputs).map(|_| init()).collect(),
        }
    }

    #[inline]
    pub fn inputs(&self) -> usize {
        self.weights.first().map_or(0, Vec::len)
    }

    #[inline]
    pub fn outputs(&self) -> usize {
        self.biases.len()
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(row, bias)| {
                let z: f64 = row.iter().zip(input).map(|(w, x)| w * x).sum();
                sigmoid(z + bias)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FeedForwardNetwork {
    layers: Vec<Layer>,
}

impl FeedForwardNetwork {
    pub fn new(layers: Vec<Layer>) -> Result<Self, ControlError> {
        let network = Self { layers };
        network.check_shape()?;

        Ok(network)
    }

    /// `sizes` lists every layer width, input first. Each weight and bias comes from `init`.
    pub fn from_fn(sizes: &[usize], mut init: impl FnMut() -> f64) -> Result<Self, ControlError> {
        let layers = sizes
            .windows(2)
            .map(|pair| Layer::from_fn(pair[0], pair[1], &mut init))
            .collect();

        Self::new(layers)
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn parameters_mut(&mut self) -> impl Iterator<Item = &mut f64> {
        self.layers.iter_mut().flat_map(|layer| {
            layer
                .weights
                .iter_mut()
                .flat_map(|row| row.iter_mut())
                .chain(layer.biases.iter_mut())
        })
    }

    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| layer.outputs() * (layer.inputs() + 1))
            .sum()
    }

    /// Checks rows against biases, widths between consecutive layers, and the
    /// observation/action sizes at the two ends.
    pub fn check_shape(&self) -> Result<(), ControlError> {
        let (Some(first), Some(last)) = (self.layers.first(), self.layers.last()) else {
            return Err(ControlError::NetworkShape("network has no layers".into()));
        };

        for (i, layer) in self.layers.iter().enumerate() {
            if layer.weights.len() != layer.biases.len() {
                return Err(ControlError::NetworkShape(format!(
                    "layer {i} has {} weight rows but {} biases",
                    layer.weights.len(),
                    layer.biases.len()
                )));
            }

            if layer.weights.iter().any(|row| row.len() != layer.inputs()) {
                return Err(ControlError::NetworkShape(format!("layer {i} has ragged weight rows")));
            }
        }

        for (i, pair) in self.layers.windows(2).enumerate() {
            if pair[0].outputs() != pair[1].inputs() {
                return Err(ControlError::NetworkShape(format!(
                    "layer {i} emits {} values but layer {} takes {}",
                    pair[0].outputs(),
                    i + 1,
                    pair[1].inputs()
                )));
            }
        }

        if first.inputs() != OBSERVATION_SIZE || last.outputs() != ACTION_SIZE {
            return Err(ControlError::NetworkShape(format!(
                "network maps {} -> {}, expected {OBSERVATION_SIZE} -> {ACTION_SIZE}",
                first.inputs(),
                last.outputs()
            )));
        }

        Ok(())
    }
}

impl Controller for FeedForwardNetwork {
    fn activate(&self, observation: &Observation) -> Vec<f64> {
        self.layers
            .iter()
            .fold(observation.to_vec(), |signal, layer| layer.forward(&signal))
    }
}
