//! CLI options.

use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};
use streaming_mf::model::FallbackPolicy;
use streaming_mf::Params;

pub mod parsers;

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Opts {
    /// Sentry DSN
    #[arg(long, env = "SENTRY_DSN")]
    pub sentry_dsn: Option<String>,

    /// Performance traces sample rate for Sentry (0.0 to 1.0)
    #[arg(long, default_value = "0")]
    pub traces_sample_rate: f32,

    #[command(subcommand)]
    pub subcommand: Subcommand,
}

#[derive(clap::Subcommand)]
pub enum Subcommand {
    Initialize(InitializeOpts),
    Predict(PredictOpts),
}

/// Instantiates a model from a ratings batch, or merges the batch into a prior model
#[derive(Args)]
pub struct InitializeOpts {
    /// Ratings batch, one JSON object per line
    #[arg(short, long)]
    pub ratings: PathBuf,

    /// Prior model snapshot to merge the batch into
    #[arg(long)]
    pub prior: Option<PathBuf>,

    /// Produce a streaming model, which tracks the number of observed ratings
    #[arg(long)]
    pub streaming: bool,

    #[command(flatten)]
    pub params: ParamsOpts,

    /// Output model snapshot
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Model initialization parameters.
#[derive(Args, Copy, Clone)]
pub struct ParamsOpts {
    /// Latent vector length
    #[arg(long, default_value = "10", env = "STREAMING_MF_RANK", value_parser = parsers::non_zero_usize)]
    pub rank: usize,

    /// Base seed of the random latent factors
    #[arg(long, default_value = "42", env = "STREAMING_MF_SEED")]
    pub seed: u64,

    /// Number of partitions
    #[arg(
        long = "partitions",
        default_value = "4",
        env = "STREAMING_MF_PARTITIONS",
        value_parser = parsers::non_zero_usize,
    )]
    pub n_partitions: usize,
}

impl From<ParamsOpts> for Params {
    fn from(opts: ParamsOpts) -> Self {
        Self {
            rank: opts.rank,
            seed: opts.seed,
            n_partitions: opts.n_partitions,
        }
    }
}

/// Predicts ratings for a single user and item, or for a batch of pairs
#[derive(Args)]
pub struct PredictOpts {
    /// Model snapshot
    #[arg(short, long)]
    pub model: PathBuf,

    /// User ID
    #[arg(long, requires = "item", conflicts_with = "pairs", allow_negative_numbers = true)]
    pub user: Option<i64>,

    /// Item ID
    #[arg(long, requires = "user", allow_negative_numbers = true)]
    pub item: Option<i64>,

    /// User and item pairs, one JSON object per line
    #[arg(long, required_unless_present = "user")]
    pub pairs: Option<PathBuf>,

    /// Overrides the model's policy for unknown users and items
    #[arg(long, value_enum)]
    pub fallback: Option<FallbackArg>,

    /// Number of partitions for the batch prediction
    #[arg(
        long = "partitions",
        default_value = "4",
        env = "STREAMING_MF_PARTITIONS",
        value_parser = parsers::non_zero_usize,
    )]
    pub n_partitions: usize,
}

/// Command-line spelling of [`FallbackPolicy`].
#[derive(ValueEnum, Debug, Copy, Clone, PartialEq, Eq)]
pub enum FallbackArg {
    /// Global bias plus whichever side's bias is known
    Estimate,

    /// Constant zero
    Zero,
}

impl From<FallbackArg> for FallbackPolicy {
    fn from(arg: FallbackArg) -> Self {
        match arg {
            FallbackArg::Estimate => Self::Estimate,
            FallbackArg::Zero => Self::Zero,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_ok() {
        Opts::command().debug_assert();
    }

    #[test]
    fn parse_initialize_ok() -> streaming_mf::Result {
        let opts = Opts::try_parse_from([
            "streaming-mf",
            "initialize",
            "--ratings",
            "ratings.jsonl",
            "--streaming",
            "--rank",
            "3",
            "--output",
            "model.json",
        ])?;
        match opts.subcommand {
            Subcommand::Initialize(opts) => {
                assert!(opts.streaming);
                assert!(opts.prior.is_none());
                assert_eq!(opts.params.rank, 3);
                assert_eq!(opts.params.seed, 42);
            }
            Subcommand::Predict(_) => unreachable!(),
        }
        Ok(())
    }

    #[test]
    fn parse_zero_rank_fails() {
        let result = Opts::try_parse_from([
            "streaming-mf",
            "initialize",
            "-r",
            "ratings.jsonl",
            "-o",
            "model.json",
            "--rank",
            "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_predict_pair_ok() -> streaming_mf::Result {
        let opts = Opts::try_parse_from([
            "streaming-mf",
            "predict",
            "-m",
            "model.json",
            "--user",
            "-1",
            "--item",
            "2",
            "--fallback",
            "zero",
        ])?;
        match opts.subcommand {
            Subcommand::Predict(opts) => {
                assert_eq!((opts.user, opts.item), (Some(-1), Some(2)));
                assert_eq!(opts.fallback.map(FallbackPolicy::from), Some(FallbackPolicy::Zero));
            }
            Subcommand::Initialize(_) => unreachable!(),
        }
        Ok(())
    }

    #[test]
    fn fallback_arg_maps_to_policy() -> streaming_mf::Result {
        for (value, expected) in [("estimate", FallbackPolicy::Estimate), ("zero", FallbackPolicy::Zero)] {
            let arg = FallbackArg::from_str(value, false).map_err(anyhow::Error::msg)?;
            assert_eq!(FallbackPolicy::from(arg), expected);
        }
        Ok(())
    }

    #[test]
    fn parse_predict_requires_input() {
        assert!(Opts::try_parse_from(["streaming-mf", "predict", "-m", "model.json"]).is_err());
        assert!(Opts::try_parse_from(["streaming-mf", "predict", "-m", "m.json", "--user", "1"]).is_err());
    }
}
