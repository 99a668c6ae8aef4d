//! Per-frame rules that retire vehicles which stop, stall near the start, or circle in place.

use glam::DVec2;
use smallvec::SmallVec;

use crate::{episode::history::PositionHistory, vehicle::Vehicle};

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StoppedRule {
    /// Only frames strictly after this one are checked.
    pub after_frame: u32,
    pub min_speed: f64,
    pub penalty: f64,
}

impl Default for StoppedRule {
    fn default() -> Self {
        Self {
            after_frame: 50,
            min_speed: 0.5,
            penalty: 5.,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StagnationRule {
    /// The single frame on which the check runs.
    pub at_frame: u32,
    pub min_displacement: f64,
    pub penalty: f64,
}

impl Default for StagnationRule {
    fn default() -> Self {
        Self {
            at_frame: 100,
            min_displacement: 50.,
            penalty: 10.,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SpinRule {
    /// Checkpoint spacing in frames. Zero disables the rule.
    pub interval: u32,
    /// How many checkpoints back the newest one is compared against.
    pub lookback: usize,
    pub min_displacement: f64,
    pub penalty: f64,
}

impl Default for SpinRule {
    fn default() -> Self {
        Self {
            interval: 60,
            lookback: 2,
            min_displacement: 50.,
            penalty: 5.,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    pub max_frames: u32,
    /// Fitness is `distance_traveled * distance_fitness_factor`, recomputed every frame.
    pub distance_fitness_factor: f64,
    pub stopped: StoppedRule,
    pub stagnation: StagnationRule,
    pub spin: SpinRule,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            max_frames: 1000,
            distance_fitness_factor: 0.1,
            stopped: Default::default(),
            stagnation: Default::default(),
            spin: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Infraction {
    Stopped,
    Stagnant,
    Spinning,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Verdict {
    pub infractions: SmallVec<[Infraction; 3]>,
    pub penalty: f64,
}

impl Verdict {
    #[inline]
    pub fn is_fatal(&self) -> bool {
        !self.infractions.is_empty()
    }

    fn charge(&mut self, infraction: Infraction, penalty: f64) {
        self.infractions.push(infraction);
        self.penalty += penalty;
    }
}

impl EpisodeConfig {
    pub fn history(&self) -> PositionHistory {
        PositionHistory::with_capacity(self.spin.lookback + 1)
    }

    /// Runs every rule for `frame`. Rules stack: one frame can charge several penalties.
    /// Records a spin checkpoint into `history` on checkpoint frames.
    pub fn judge(
        &self,
        frame: u32,
        start: DVec2,
        vehicle: &Vehicle,
        history: &mut PositionHistory,
    ) -> Verdict {
        let mut verdict = Verdict::default();
        let position = vehicle.position();

        let StoppedRule {
            after_frame,
            min_speed,
            penalty,
        } = self.stopped;
        if frame > after_frame && vehicle.speed() < min_speed {
            verdict.charge(Infraction::Stopped, penalty);
        }

        let StagnationRule {
            at_frame,
            min_displacement,
            penalty,
        } = self.stagnation;
        if frame == at_frame && position.distance(start) < min_displacement {
            verdict.charge(Infraction::Stagnant, penalty);
        }

        let SpinRule {
            interval,
            lookback,
            min_displacement,
            penalty,
        } = self.spin;
        if interval > 0 && frame % interval == 0 {
            history.push(position);

            if let Some(previous) = history.back(lookback)
                && position.distance(previous) < min_displacement
            {
                verdict.charge(Infraction::Spinning, penalty);
            }
        }

        verdict
    }
}
