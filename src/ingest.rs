//! Reads ratings and prediction pairs, one JSON object per line.

use std::io::BufRead;

use serde::de::DeserializeOwned;

use crate::partition::Partitioned;
use crate::prelude::*;
use crate::rating::{Pair, Rating};

pub fn read_ratings(reader: impl BufRead, n_partitions: usize) -> Result<Partitioned<Rating>> {
    let ratings = read_lines(reader, n_partitions)?;
    info!(n_ratings = ratings.len(), n_partitions, "read the ratings");
    Ok(ratings)
}

pub fn read_pairs(reader: impl BufRead, n_partitions: usize) -> Result<Partitioned<Pair>> {
    let pairs = read_lines(reader, n_partitions)?;
    info!(n_pairs = pairs.len(), n_partitions, "read the pairs");
    Ok(pairs)
}

fn read_lines<T: DeserializeOwned>(
    reader: impl BufRead,
    n_partitions: usize,
) -> Result<Partitioned<T>> {
    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line_number = i + 1;
        let line = line.with_context(|| format!("failed to read line {}", line_number))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .with_context(|| format!("malformed record on line {}", line_number))?;
        records.push(record);
    }
    Ok(Partitioned::round_robin(records, n_partitions)?)
}
