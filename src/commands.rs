use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use streaming_mf::prelude::*;

pub mod initialize;
pub mod predict;

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("failed to open `{}`", path.display()))?;
    Ok(BufReader::new(file))
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("failed to create `{}`", path.display()))?;
    Ok(BufWriter::new(file))
}
