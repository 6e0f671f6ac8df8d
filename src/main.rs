// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::{Arc, Mutex};

use clap::Parser;
use log::info;

use mwa_hyperflag::imagesets::SyntheticImageSet;
use mwa_hyperflag::strategy::{LogProgressListener, ProgressBarListener, ProgressListener};
use mwa_hyperflag::{ArtifactSet, BaselineSelection, DefaultStrategySetup, HyperflagError, ImageSet};

/// Run the default RFI flagging strategy over synthesised visibilities and
/// report the flag occupancy per baseline.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Number of time steps to synthesise.
    #[clap(long, default_value = "512")]
    timesteps: usize,

    /// Number of frequency channels to synthesise.
    #[clap(long, default_value = "256")]
    channels: usize,

    /// Number of antennas; baselines are all antenna pairs.
    #[clap(long, default_value = "8")]
    antennas: usize,

    /// Number of baseline worker threads.
    #[clap(short, long, default_value = "4")]
    threads: usize,

    /// Seed for the synthetic noise.
    #[clap(long, default_value = "1")]
    seed: u64,

    /// Also flag auto-correlations.
    #[clap(long)]
    autos: bool,

    /// Don't draw a progress bar.
    #[clap(long)]
    no_progress: bool,

    /// The verbosity of the program. The default is to print high-level
    /// information.
    #[clap(short, long, parse(from_occurrences))]
    verbosity: u8,
}

fn main() -> Result<(), HyperflagError> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(match args.verbosity {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .init();

    let set = SyntheticImageSet::new(args.antennas, args.timesteps, args.channels, args.seed);
    let baseline_count = set.baseline_count();
    info!(
        "Synthesised {} ({} baselines)",
        set.description(),
        baseline_count
    );
    let concrete = Arc::new(Mutex::new(set));

    let selection = if args.autos {
        BaselineSelection::All
    } else {
        BaselineSelection::CrossCorrelations
    };
    let strategy = DefaultStrategySetup::default().full_strategy(selection, args.threads);
    let mut artifacts = ArtifactSet::with_image_set(concrete.clone());

    let bar = (!args.no_progress).then(|| ProgressBarListener::new("Flagging"));
    let log = LogProgressListener::default();
    let listener: &dyn ProgressListener = match &bar {
        Some(bar) => bar,
        None => &log,
    };
    strategy.perform(&mut artifacts, listener)?;
    if let Some(bar) = &bar {
        bar.finish();
    }

    let set = concrete.lock().expect("no worker thread panicked");
    let mut total_flagged = 0_usize;
    let mut total_samples = 0_usize;
    for index in 0..baseline_count {
        if let Some(masks) = set.stored_flags(index) {
            let (a1, a2) = set.antennas_of(index)?;
            let flagged: usize = masks
                .iter()
                .map(|m| mwa_hyperflag::grid::count_flagged(&m.view()))
                .sum();
            let samples: usize = masks.iter().map(|m| m.len()).sum();
            info!(
                "Baseline {a1:3} x {a2:3}: {:5.2}% flagged",
                100.0 * flagged as f64 / samples as f64
            );
            total_flagged += flagged;
            total_samples += samples;
        }
    }
    if total_samples > 0 {
        info!(
            "Overall: {:5.2}% of {} samples flagged",
            100.0 * total_flagged as f64 / total_samples as f64,
            total_samples
        );
    }
    Ok(())
}
