use std::io::Write;

use streaming_mf::ingest::read_ratings;
use streaming_mf::metrics::Stopwatch;
use streaming_mf::model::snapshot::{read_model, write_model};
use streaming_mf::prelude::*;
use streaming_mf::{Initializer, Params};

use crate::commands::{create, open};
use crate::opts::InitializeOpts;

#[instrument(skip_all)]
pub fn run(opts: InitializeOpts) -> Result {
    sentry::configure_scope(|scope| scope.set_tag("app", "initialize"));
    let _stopwatch = Stopwatch::new("initialize finished");

    let params = Params::from(opts.params);
    let ratings = read_ratings(open(&opts.ratings)?, params.n_partitions)?;
    let prior = match &opts.prior {
        Some(path) => Some(
            read_model(open(path)?)
                .with_context(|| format!("failed to load the prior model `{}`", path.display()))?,
        ),
        None => None,
    };

    let (model, n_ratings) =
        Initializer::new(params).initialize(&ratings, prior.as_ref(), opts.streaming)?;

    let mut writer = create(&opts.output)?;
    write_model(&mut writer, &model)?;
    writer.flush()?;
    info!(path = %opts.output.display(), "saved the model");

    println!("ratings: {}", n_ratings);
    println!("global bias: {}", model.global_bias());
    if let Some(observed_examples) = model.observed_examples() {
        println!("observed examples: {}", observed_examples);
    }
    Ok(())
}
