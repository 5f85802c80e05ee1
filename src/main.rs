use clap::Parser;
use streaming_mf::helpers::tracing::init as init_tracing;

mod commands;
mod opts;

fn main() -> streaming_mf::Result {
    let opts = opts::Opts::parse();
    let _sentry_guard = init_tracing(opts.sentry_dsn.clone(), opts.traces_sample_rate)?;

    match opts.subcommand {
        opts::Subcommand::Initialize(opts) => commands::initialize::run(opts),
        opts::Subcommand::Predict(opts) => commands::predict::run(opts),
    }
}
