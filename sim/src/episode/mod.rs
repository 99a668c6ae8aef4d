//! Runs a population of vehicles in lockstep and scores them.
//!
//! An [`Episode`] goes `Init -> Running -> Terminated`. Each [`Episode::step`] is one shared
//! frame: every live vehicle asks its controller for an action, moves, senses, and is judged.
//! Dead vehicles are skipped for the rest of the episode.

use std::sync::atomic::{AtomicBool, Ordering};

use glam::DVec2;
use itertools::Itertools;
use rayon::prelude::*;

use crate::{
    controller::{ACTION_SIZE, ControlError, Controller, validate_action},
    track::TrackSurface,
    vehicle::{StartPose, Vehicle, VehicleConfig},
};

pub mod history;
pub mod policy;

pub use history::PositionHistory;
pub use policy::{EpisodeConfig, Infraction, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    AllInactive,
    FrameBudget,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodePhase {
    Init,
    Running,
    Terminated(Termination),
}

/// Best fitness seen so far. Owned by whoever runs the generations.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Watermark {
    best: f64,
}

impl Watermark {
    #[inline]
    pub fn best(&self) -> f64 {
        self.best
    }

    /// Raises the mark if `fitness` beats it.
    pub fn observe(&mut self, fitness: f64) -> bool {
        if fitness > self.best {
            self.best = fitness;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Champion {
    pub index: usize,
    pub fitness: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeOutcome {
    pub frames: u32,
    pub termination: Termination,
    /// Final fitness per controller, in controller order.
    pub fitness: Vec<f64>,
    pub champion: Option<Champion>,
}

impl EpisodeOutcome {
    /// Whether the champion deserves to be persisted against `watermark`.
    pub fn is_record(&self, watermark: &Watermark) -> bool {
        self.champion
            .is_some_and(|champion| champion.fitness >= watermark.best())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EpisodeError {
    #[error(transparent)]
    Control(#[from] ControlError),
}

#[derive(Debug, Clone)]
pub struct Entrant {
    pub vehicle: Vehicle,
    pub fitness: f64,
    pub history: PositionHistory,
}

impl Entrant {
    /// Asks the controller for this frame's action without touching the vehicle.
    fn decide<C: Controller>(
        &self,
        index: usize,
        controller: &C,
    ) -> Result<[f64; ACTION_SIZE], ControlError> {
        let observation = self.vehicle.observation();
        validate_action(index, controller.activate(&observation))
    }

    fn advance(
        &mut self,
        index: usize,
        frame: u32,
        activations: &[f64; ACTION_SIZE],
        track: Option<&dyn TrackSurface>,
        start: DVec2,
        config: &EpisodeConfig,
    ) {
        self.vehicle.apply_control(activations);
        self.vehicle.update(track);

        // Overwritten every frame, so only the last frame's value survives.
        self.fitness = self.vehicle.distance_traveled() * config.distance_fitness_factor;

        let verdict = config.judge(frame, start, &self.vehicle, &mut self.history);
        if verdict.is_fatal() {
            log::debug!(
                "Vehicle {index} retired at frame {frame}: {:?} (-{})",
                verdict.infractions,
                verdict.penalty
            );
            self.vehicle.kill();
            self.fitness -= verdict.penalty;
        }
    }
}

pub struct Episode<'a, C> {
    controllers: &'a [C],
    track: Option<&'a dyn TrackSurface>,
    start: StartPose,
    vehicle_config: VehicleConfig,
    config: EpisodeConfig,
    entrants: Vec<Entrant>,
    frame: u32,
    phase: EpisodePhase,
}

impl<'a, C: Controller> Episode<'a, C> {
    /// One vehicle per controller, all on `start`. Runs without a track until
    /// [`Episode::with_track`] is called.
    pub fn new(controllers: &'a [C], start: StartPose) -> Self {
        Self {
            controllers,
            track: None,
            start,
            vehicle_config: VehicleConfig::default(),
            config: EpisodeConfig::default(),
            entrants: Vec::new(),
            frame: 0,
            phase: EpisodePhase::Init,
        }
    }

    pub fn with_track(mut self, track: &'a dyn TrackSurface) -> Self {
        self.track = Some(track);
        self
    }

    pub fn with_vehicle_config(mut self, vehicle_config: VehicleConfig) -> Self {
        self.vehicle_config = vehicle_config;
        self
    }

    pub fn with_config(mut self, config: EpisodeConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    pub fn phase(&self) -> EpisodePhase {
        self.phase
    }

    /// Frames completed so far.
    #[inline]
    pub fn frame(&self) -> u32 {
        self.frame
    }

    #[inline]
    pub fn entrants(&self) -> &[Entrant] {
        &self.entrants
    }

    pub fn alive_count(&self) -> usize {
        self.entrants
            .iter()
            .filter(|entrant| entrant.vehicle.is_alive())
            .count()
    }

    fn reset(&mut self) {
        self.entrants = self
            .controllers
            .iter()
            .map(|_| Entrant {
                vehicle: Vehicle::new(self.start, self.vehicle_config),
                fitness: 0.,
                history: self.config.history(),
            })
            .collect();
        self.frame = 0;
        self.phase = EpisodePhase::Running;

        log::info!(
            "Starting episode with {} vehicles at ({}, {}) heading {}",
            self.entrants.len(),
            self.start.x,
            self.start.y,
            self.start.angle_deg
        );
    }

    fn terminate(&mut self, termination: Termination) -> EpisodePhase {
        self.phase = EpisodePhase::Terminated(termination);
        log::info!(
            "Episode ended after {} frames: {termination:?}",
            self.frame
        );

        self.phase
    }

    /// Advances one shared frame. Leaves `Init` on the first call and does nothing once
    /// terminated. On a controller error no vehicle moves and the frame is not counted.
    pub fn step(&mut self, watermark: &mut Watermark) -> Result<EpisodePhase, EpisodeError> {
        match self.phase {
            EpisodePhase::Terminated(_) => return Ok(self.phase),
            EpisodePhase::Init => self.reset(),
            EpisodePhase::Running => {}
        }

        if self.frame >= self.config.max_frames {
            return Ok(self.terminate(Termination::FrameBudget));
        }

        let active: Vec<usize> = self
            .entrants
            .iter()
            .positions(|entrant| entrant.vehicle.is_alive())
            .collect();

        if active.is_empty() {
            return Ok(self.terminate(Termination::AllInactive));
        }

        let Self {
            controllers,
            track,
            start,
            config,
            entrants,
            frame,
            ..
        } = self;
        let (frame, track, start, config) = (*frame, *track, start.position(), &*config);

        // All actions are validated before any vehicle moves.
        let actions: Vec<Option<[f64; ACTION_SIZE]>> = entrants
            .par_iter()
            .zip(controllers.par_iter())
            .enumerate()
            .map(|(index, (entrant, controller))| {
                if entrant.vehicle.is_alive() {
                    entrant.decide(index, controller).map(Some)
                } else {
                    Ok(None)
                }
            })
            .collect::<Result<_, _>>()?;

        entrants
            .par_iter_mut()
            .zip(actions.par_iter())
            .enumerate()
            .for_each(|(index, (entrant, activations))| {
                if let Some(activations) = activations {
                    entrant.advance(index, frame, activations, track, start, config);
                }
            });

        for index in active {
            if watermark.observe(self.entrants[index].fitness) {
                log::trace!(
                    "Vehicle {index} raised the watermark to {}",
                    watermark.best()
                );
            }
        }

        self.frame += 1;

        Ok(self.phase)
    }

    pub fn run(&mut self, watermark: &mut Watermark) -> Result<EpisodeOutcome, EpisodeError> {
        self.run_until(watermark, &AtomicBool::new(false))
    }

    /// Like [`Episode::run`], but checks `cancel` between frames.
    pub fn run_until(
        &mut self,
        watermark: &mut Watermark,
        cancel: &AtomicBool,
    ) -> Result<EpisodeOutcome, EpisodeError> {
        loop {
            if let EpisodePhase::Terminated(_) = self.phase {
                break;
            }

            if cancel.load(Ordering::Relaxed) {
                if self.phase == EpisodePhase::Init {
                    self.reset();
                }
                self.terminate(Termination::Cancelled);
                break;
            }

            self.step(watermark)?;
        }

        Ok(self.outcome())
    }

    /// Snapshot of the scores so far. The termination reads `Cancelled` while still running.
    pub fn outcome(&self) -> EpisodeOutcome {
        let fitness: Vec<f64> = self.entrants.iter().map(|entrant| entrant.fitness).collect();
        let champion = fitness
            .iter()
            .position_max_by(|a, b| a.total_cmp(b))
            .map(|index| Champion {
                index,
                fitness: fitness[index],
            });

        let termination = match self.phase {
            EpisodePhase::Terminated(termination) => termination,
            EpisodePhase::Init | EpisodePhase::Running => Termination::Cancelled,
        };

        EpisodeOutcome {
            frames: self.frame,
            termination,
            fitness,
            champion,
        }
    }
}
