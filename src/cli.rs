/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Command line interface of the `fdsm` binary.

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};

use crate::config::{
    Config, GraphKind, GtMissingPolicy, SampleCount, Side, SwapAlgorithm, SwapCount,
};
use crate::dispatch::run_single_process;
use crate::graph::load::{load, load_binary, LoadedGraph};
use crate::heuristics::sample::ExternalGroundTruth;
use crate::output;

/// Extension marking a binary graph file.
const BINARY_GRAPH_EXTENSION: &str = "gbin";

#[derive(Parser, Debug)]
#[command(
    name = "fdsm",
    version,
    about = "Estimates the significance of pairwise co-occurrences under the fixed degree \
             sequence model.",
    long_about = None
)]
pub struct Cli {
    /// The input graph file name (text, or binary with extension .gbin).
    #[arg(long = "in")]
    pub input: String,

    /// Directory of the input file.
    #[arg(long = "inpath", default_value = ".")]
    pub inpath: PathBuf,

    /// The output file name; defaults to the input name.
    #[arg(long = "out")]
    pub out: Option<String>,

    /// Directory of the output file.
    #[arg(long = "outpath", default_value = ".")]
    pub outpath: PathBuf,

    /// Append the sample and swap counts to the output file name.
    #[arg(long = "appendruninfo", default_value_t = true, action = ArgAction::Set, num_args = 1)]
    pub appendruninfo: bool,

    /// Date string appended to the output file name.
    #[arg(long = "date")]
    pub date: Option<String>,

    /// Run index appended to the output file name.
    #[arg(long = "index")]
    pub index: Option<String>,

    /// After loading, write the canonical graph in binary form next to the
    /// input.
    #[arg(long = "writebinarygraph")]
    pub writebinarygraph: bool,

    /// External ground-truth file: one pair of event names per line.
    #[arg(long = "gt")]
    pub gt: Option<PathBuf>,

    /// Keep ground-truth pairs naming events absent from the input.
    #[arg(long = "includegtmissingnodes", conflicts_with_all = ["ignoregtmissingnodes", "disallowgtmissingnodes"])]
    pub includegtmissingnodes: bool,

    /// Drop ground-truth pairs naming events absent from the input.
    #[arg(long = "ignoregtmissingnodes", conflicts_with = "disallowgtmissingnodes")]
    pub ignoregtmissingnodes: bool,

    /// Fail on ground-truth pairs naming events absent from the input
    /// (the default).
    #[arg(long = "disallowgtmissingnodes")]
    pub disallowgtmissingnodes: bool,

    /// Random seed; defaults to the monotonic clock.
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// The input is bipartite (the default).
    #[arg(long = "bipartite", conflicts_with = "nonbipartite")]
    pub bipartite: bool,

    /// The input is a general undirected graph.
    #[arg(long = "nonbipartite")]
    pub nonbipartite: bool,

    /// Which side of a bipartite input holds the events: l or r.
    #[arg(long = "sideofinterest", default_value = "l", value_parser = ["l", "r"])]
    pub sideofinterest: String,

    /// Co-occurrence contributed by a direct edge of a general graph.
    #[arg(long = "directedgevalue", default_value_t = 1)]
    pub directedgevalue: u32,

    /// Swaps per sample: "elne" for |E| ln |E|, or a fixed count; defaults
    /// to the swap heuristic.
    #[arg(long = "swaps")]
    pub swaps: Option<String>,

    /// Randomize with Curveball trades (the default for bipartite inputs).
    #[arg(long = "curveball", conflicts_with = "singleswitch")]
    pub curveball: bool,

    /// Randomize with single edge switches.
    #[arg(long = "singleswitch")]
    pub singleswitch: bool,

    /// Number of distinct degrees used by the theta validation.
    #[arg(long = "degrees", default_value_t = 9)]
    pub degrees: usize,

    /// Number of events per degree used by the theta validation.
    #[arg(long = "eventsperdegree", default_value_t = 6)]
    pub eventsperdegree: usize,

    /// Validate the calibrated swap count against this theta threshold.
    #[arg(long = "theta")]
    pub theta: Option<f64>,

    /// Minimum original co-occurrence for a pair to be reported.
    #[arg(long = "mincooc", default_value_t = 1)]
    pub mincooc: u32,

    /// Fixed number of samples; defaults to the sample heuristic.
    #[arg(long = "samples")]
    pub samples: Option<u32>,

    /// Sample cap for the sample heuristic.
    #[arg(long = "maxsamples", default_value_t = 10_000)]
    pub maxsamples: u32,

    /// Fraction of the relevant pairs kept as internal ground truth.
    #[arg(long = "ratiogtpairs", default_value_t = 2e-3)]
    pub ratiogtpairs: f64,

    /// Internal PPV threshold that stops the sampling.
    #[arg(long = "internalppv", default_value_t = 0.95)]
    pub internalppv: f64,

    /// Number of worker-local graph copies.
    #[arg(long = "workers", default_value_t = 16)]
    pub workers: usize,
}

impl Cli {
    fn to_config(&self) -> Result<Config> {
        let seed = match self.seed {
            Some(seed) => seed,
            None => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .context("system clock is before the epoch")?
                .subsec_nanos() as u64,
        };
        let swaps = match self.swaps.as_deref() {
            None => SwapCount::Heuristic,
            Some("elne") => SwapCount::ElnE,
            Some(n) => SwapCount::Fixed(
                n.parse()
                    .with_context(|| format!("--swaps takes \"elne\" or a count, got {n:?}"))?,
            ),
        };
        Ok(Config {
            kind: if self.nonbipartite {
                GraphKind::General
            } else {
                GraphKind::Bipartite
            },
            side_of_interest: if self.sideofinterest == "r" {
                Side::Right
            } else {
                Side::Left
            },
            direct_edge_weight: self.directedgevalue,
            seed,
            algorithm: if self.singleswitch {
                SwapAlgorithm::SingleSwitch
            } else {
                SwapAlgorithm::Curveball
            },
            swaps,
            theta: self.theta,
            degrees_swap_heuristic: self.degrees,
            events_per_degree_swap_heuristic: self.eventsperdegree,
            min_cooc: self.mincooc,
            samples: match self.samples {
                Some(n) => SampleCount::Fixed(n),
                None => SampleCount::Heuristic,
            },
            max_samples: self.maxsamples,
            ratio_gt_pairs: self.ratiogtpairs,
            internal_ppv_threshold: self.internalppv,
            gt_missing_policy: if self.includegtmissingnodes {
                GtMissingPolicy::Include
            } else if self.ignoregtmissingnodes {
                GtMissingPolicy::Ignore
            } else {
                GtMissingPolicy::Disallow
            },
            workers: self.workers,
        })
    }
}

/// Initializes the logger from the environment, defaulting to `info`.
pub fn init_env_logger() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init()?;
    Ok(())
}

fn log_run_settings(cli: &Cli, config: &Config) {
    log::info!("input file: {}", cli.inpath.join(&cli.input).display());
    log::info!(
        "graph kind: {}",
        match config.kind {
            GraphKind::Bipartite => "bipartite",
            GraphKind::General => "general",
        }
    );
    if config.kind == GraphKind::Bipartite {
        log::info!(
            "side of interest: {}",
            match config.side_of_interest {
                Side::Left => "left",
                Side::Right => "right",
            }
        );
    } else {
        log::info!("direct edge co-occurrence: {}", config.direct_edge_weight);
    }
    log::info!(
        "randomization: {}",
        match config.effective_algorithm() {
            SwapAlgorithm::Curveball => "curveball",
            SwapAlgorithm::SingleSwitch => "single switch",
        }
    );
    match config.swaps {
        SwapCount::Heuristic => log::info!("swaps per sample: swap heuristic"),
        SwapCount::ElnE => log::info!("swaps per sample: |E| ln |E|"),
        SwapCount::Fixed(n) => log::info!("swaps per sample: {n}"),
    }
    match config.samples {
        SampleCount::Heuristic => log::info!(
            "samples: heuristic (cap {}, ground-truth ratio {}, PPV threshold {})",
            config.max_samples,
            config.ratio_gt_pairs,
            config.internal_ppv_threshold
        ),
        SampleCount::Fixed(n) => log::info!("samples: {n}"),
    }
    log::info!("minimum relevant co-occurrence: {}", config.min_cooc);
    log::info!("seed: {}", config.seed);
    log::info!("workers: {}", config.workers);
}

/// Parses the arguments and runs the whole pipeline.
pub fn cli_main<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let config = cli.to_config()?;
    config.validate()?;
    log_run_settings(&cli, &config);

    let input_path = cli.inpath.join(&cli.input);
    let is_binary = input_path
        .extension()
        .is_some_and(|ext| ext == BINARY_GRAPH_EXTENSION);

    let LoadedGraph {
        info,
        graph,
        original_cooc,
    } = if is_binary {
        load_binary(&input_path, &config)?
    } else {
        let file = File::open(&input_path)
            .with_context(|| format!("could not read {}", input_path.display()))?;
        load(BufReader::new(file), &config)?
    };
    log::info!(
        "graph: {} events, {} actors, {} edges, co-occurrence sum {}, {} relevant pairs",
        info.num_events,
        info.num_actors,
        info.num_edges,
        info.cooc_sum,
        info.num_relevant_pairs
    );

    if cli.writebinarygraph && !is_binary {
        let binary_path = input_path.with_extension(BINARY_GRAPH_EXTENSION);
        log::info!("writing binary graph to {}", binary_path.display());
        crate::graph::binary::write_binary(&binary_path, &info, &graph, &config)?;
    }

    let external_gt = match &cli.gt {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("could not read ground truth {}", path.display()))?;
            Some(ExternalGroundTruth::parse(
                BufReader::new(file),
                &info,
                &original_cooc,
                &config,
            )?)
        }
        None => None,
    };

    let outcome = run_single_process(&graph, &info, &original_cooc, &config, external_gt.as_ref())?;
    log::info!("{} samples done", outcome.num_samples);

    let stem = match &cli.out {
        Some(out) => out
            .rsplit_once('.')
            .map(|(stem, _)| stem.to_owned())
            .unwrap_or_else(|| out.clone()),
        None => input_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| cli.input.clone()),
    };
    let results_name = output::results_file_name(
        &stem,
        cli.appendruninfo,
        outcome.num_samples,
        outcome.num_swaps,
        cli.date.as_deref(),
        cli.index.as_deref(),
    );
    let results_path = cli.outpath.join(&results_name);
    let results_file = File::create(&results_path)
        .with_context(|| format!("could not create {}", results_path.display()))?;
    output::write_results(
        BufWriter::new(results_file),
        &info,
        &original_cooc,
        &outcome.accumulator,
        &outcome.pairs,
        outcome.num_samples,
    )?;
    log::info!("results written to {}", results_path.display());
    Ok(())
}
