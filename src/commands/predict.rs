use std::io::{stdout, Write};

use streaming_mf::ingest::read_pairs;
use streaming_mf::metrics::Stopwatch;
use streaming_mf::model::snapshot::read_model;
use streaming_mf::prelude::*;
use streaming_mf::Predict;

use crate::commands::open;
use crate::opts::PredictOpts;

#[instrument(skip_all)]
pub fn run(opts: PredictOpts) -> Result {
    sentry::configure_scope(|scope| scope.set_tag("app", "predict"));
    let _stopwatch = Stopwatch::new("predict finished");

    let mut model = read_model(open(&opts.model)?)
        .with_context(|| format!("failed to load the model `{}`", opts.model.display()))?;
    if let Some(fallback) = opts.fallback {
        model.factors_mut().fallback = fallback.into();
    }

    match (opts.user, opts.item, &opts.pairs) {
        (Some(user), Some(item), _) => {
            println!("{}", model.predict(user, item)?);
        }
        (_, _, Some(path)) => {
            let pairs = read_pairs(open(path)?, opts.n_partitions)?;
            let predictions = model.predict_all(pairs)?;
            let mut stdout = stdout().lock();
            for prediction in predictions.iter() {
                serde_json::to_writer(&mut stdout, prediction)?;
                writeln!(stdout)?;
            }
            stdout.flush()?;
            info!(n_predictions = predictions.len(), "done");
        }
        _ => {
            return Err(anyhow!("either a user and an item, or a pairs file must be given"));
        }
    }
    Ok(())
}
