use std::path::{Path, PathBuf};

use anyhow::Context;
use kdam::BarExt;
use sim::{
    Episode, EpisodeOutcome, Watermark,
    controller::FeedForwardNetwork,
    episode::Termination,
};

use crate::{
    evolve::{EvolutionConfig, Population},
    session::Session,
};

pub struct Trainer {
    session: Session,
    population: Population,
    watermark: Watermark,
    generation: u32,
    out: PathBuf,
}

impl Trainer {
    pub fn new(
        session: Session,
        evolution: EvolutionConfig,
        seed: Option<u64>,
        out: PathBuf,
    ) -> anyhow::Result<Self> {
        let population = Population::random(evolution, seed)?;

        Ok(Self {
            session,
            population,
            watermark: Watermark::default(),
            generation: 0,
            out,
        })
    }

    #[inline]
    pub fn watermark(&self) -> Watermark {
        self.watermark
    }

    /// Runs one episode with the current population, saves the champion if it holds the
    /// record, then breeds the next population.
    pub fn run_generation(&mut self) -> anyhow::Result<EpisodeOutcome> {
        self.generation += 1;

        let Session {
            track,
            start,
            vehicle,
            episode,
        } = &self.session;

        let outcome = Episode::new(&self.population.networks, *start)
            .with_track(track)
            .with_vehicle_config(*vehicle)
            .with_config(*episode)
            .run(&mut self.watermark)?;

        if outcome.is_record(&self.watermark)
            && let Some(champion) = outcome.champion
        {
            save_controller(&self.out, &self.population.networks[champion.index])?;
            log::info!(
                "Generation {}: saved new best controller (fitness {:.1}) to {:?}",
                self.generation,
                champion.fitness,
                self.out
            );
        }

        self.population.next_generation(&outcome.fitness);

        Ok(outcome)
    }

    pub fn run(&mut self, generations: u32) -> anyhow::Result<()> {
        let mut pb = kdam::tqdm!(total = generations as usize, desc = "Generations");

        for _ in 0..generations {
            let outcome = self.run_generation()?;
            let best = outcome.champion.map_or(f64::NAN, |c| c.fitness);

            pb.set_postfix(format!(
                "best={best:.1}, record={:.1}, frames={}",
                self.watermark.best(),
                outcome.frames
            ));
            pb.update(1)?;
        }

        Ok(())
    }
}

pub fn save_controller(path: &Path, network: &FeedForwardNetwork) -> anyhow::Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("creating {path:?}"))?;
    serde_norway::to_writer(file, network).with_context(|| format!("writing {path:?}"))?;

    Ok(())
}

pub fn load_controller(path: &Path) -> anyhow::Result<FeedForwardNetwork> {
    let file = std::fs::File::open(path).with_context(|| format!("opening {path:?}"))?;
    let network: FeedForwardNetwork =
        serde_norway::from_reader(file).with_context(|| format!("parsing {path:?}"))?;
    network.check_shape()?;

    Ok(network)
}

/// Drives a single persisted controller around the track.
pub fn replay(session: &Session, network: FeedForwardNetwork) -> anyhow::Result<EpisodeOutcome> {
    let controllers = [network];
    let mut watermark = Watermark::default();

    let outcome = Episode::new(&controllers, session.start)
        .with_track(&session.track)
        .with_vehicle_config(session.vehicle)
        .with_config(session.episode)
        .run(&mut watermark)?;

    match outcome.termination {
        Termination::FrameBudget => log::info!("Controller survived all {} frames", outcome.frames),
        Termination::AllInactive => log::info!("Controller was retired after {} frames", outcome.frames),
        Termination::Cancelled => log::warn!("Replay cancelled at frame {}", outcome.frames),
    }

    Ok(outcome)
}
