//! Deliberately small elitist search over network weights.

use rand::{Rng, SeedableRng, rngs::StdRng};
use sim::controller::{ACTION_SIZE, ControlError, FeedForwardNetwork, OBSERVATION_SIZE};

#[derive(Debug, Clone, Copy)]
pub struct EvolutionConfig {
    pub population: usize,
    /// Width of the single hidden layer. Zero wires sensors straight to the pedals.
    pub hidden: usize,
    pub elite_fraction: f64,
    pub init_scale: f64,
    pub mutation_rate: f64,
    pub mutation_scale: f64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population: 50,
            hidden: 0,
            elite_fraction: 0.2,
            init_scale: 1.,
            mutation_rate: 0.2,
            mutation_scale: 0.5,
        }
    }
}

impl EvolutionConfig {
    pub fn layer_sizes(&self) -> Vec<usize> {
        if self.hidden == 0 {
            vec![OBSERVATION_SIZE, ACTION_SIZE]
        } else {
            vec![OBSERVATION_SIZE, self.hidden, ACTION_SIZE]
        }
    }

    fn elite_count(&self) -> usize {
        ((self.population as f64 * self.elite_fraction).ceil() as usize).clamp(1, self.population.max(1))
    }
}

pub struct Population {
    pub networks: Vec<FeedForwardNetwork>,
    config: EvolutionConfig,
    rng: StdRng,
}

impl Population {
    pub fn random(config: EvolutionConfig, seed: Option<u64>) -> Result<Self, ControlError> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        let sizes = config.layer_sizes();
        let scale = config.init_scale;
        let networks = (0..config.population)
            .map(|_| FeedForwardNetwork::from_fn(&sizes, || rng.random_range(-scale..=scale)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            networks,
            config,
            rng,
        })
    }

    /// Keeps the fittest networks unchanged and refills the rest with mutated copies of them.
    pub fn next_generation(&mut self, fitness: &[f64]) {
        let mut ranked: Vec<usize> = (0..self.networks.len()).collect();
        ranked.sort_by(|&a, &b| {
            let fa = fitness.get(a).copied().unwrap_or(f64::NEG_INFINITY);
            let fb = fitness.get(b).copied().unwrap_or(f64::NEG_INFINITY);
            fb.total_cmp(&fa)
        });

        let elite_count = self.config.elite_count().min(ranked.len());
        if elite_count == 0 {
            return;
        }

        let elites: Vec<FeedForwardNetwork> = ranked[..elite_count]
            .iter()
            .map(|&i| self.networks[i].clone())
            .collect();

        let mut next = elites.clone();
        while next.len() < self.config.population {
            let parent = &elites[self.rng.random_range(0..elite_count)];
            let child = self.mutate(parent.clone());
            next.push(child);
        }

        self.networks = next;
    }

    fn mutate(&mut self, mut network: FeedForwardNetwork) -> FeedForwardNetwork {
        let EvolutionConfig {
            mutation_rate,
            mutation_scale,
            ..
        } = self.config;

        for parameter in network.parameters_mut() {
            if self.rng.random_bool(mutation_rate.clamp(0., 1.)) {
                *parameter += self.rng.random_range(-mutation_scale..=mutation_scale);
            }
        }

        network
    }
}
