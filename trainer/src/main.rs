mod evolve;
mod session;
mod track_file;
mod trainer;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::{evolve::EvolutionConfig, session::Session, trainer::Trainer};

#[derive(Parser, Debug)]
#[command(
    name = "trainer",
    version,
    about = "Evolve and replay controllers for raster race tracks"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evolve a population of networks and keep the best one on disk.
    Train {
        /// YAML track file.
        track_file: PathBuf,
        #[arg(long, default_value_t = 50)]
        generations: u32,
        #[arg(long, default_value_t = 50)]
        population: usize,
        /// Hidden layer width; 0 for a direct sensor-to-pedal network.
        #[arg(long, default_value_t = 0)]
        hidden: usize,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value = "best_controller.yaml")]
        out: PathBuf,
    },
    /// Run a saved controller through one episode.
    Replay {
        track_file: PathBuf,
        controller: PathBuf,
    },
    /// Report on a track file without running anything.
    Inspect { track_file: PathBuf },
}

fn load_session(path: &PathBuf) -> anyhow::Result<Session> {
    Session::load(path).with_context(|| format!("loading track file {path:?}"))
}

pub fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Train {
            track_file,
            generations,
            population,
            hidden,
            seed,
            out,
        } => {
            let session = load_session(&track_file)?;
            if !session.start_is_valid() {
                anyhow::bail!("Start pose {:?} is not on the road", session.start);
            }

            let evolution = EvolutionConfig {
                population,
                hidden,
                ..Default::default()
            };

            let mut trainer = Trainer::new(session, evolution, seed, out.clone())?;
            trainer.run(generations)?;

            println!(
                "Best fitness {:.1}; best controller in {out:?}",
                trainer.watermark().best()
            );
        }
        Command::Replay {
            track_file,
            controller,
        } => {
            let session = load_session(&track_file)?;
            let network = trainer::load_controller(&controller)?;
            let outcome = trainer::replay(&session, network)?;

            println!(
                "Fitness {:.1} after {} frames ({:?})",
                outcome.fitness.first().copied().unwrap_or_default(),
                outcome.frames,
                outcome.termination
            );
        }
        Command::Inspect { track_file } => {
            let session = load_session(&track_file)?;
            let size = session.track.size();

            println!("Size: {} x {}", size.x, size.y);
            println!("Road: {:.1}%", session.track.road_fraction() * 100.);
            println!(
                "Start: ({}, {}) heading {} ({})",
                session.start.x,
                session.start.y,
                session.start.angle_deg,
                if session.start_is_valid() { "on road" } else { "OFF ROAD" }
            );
        }
    }

    Ok(())
}
