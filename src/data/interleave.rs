use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use super::record::JsonRecord;

/// One element of the final training corpus
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TrainingExample {
    /// A marker-wrapped text chunk
    Chunk(String),
    /// A JSON record copied verbatim from the input
    Record(JsonRecord),
}

/// Seeded RNG when `seed` is given, entropy-seeded otherwise
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Mix text chunks with JSON records
///
/// The chunk list is repeated `replication` times, the records are
/// shuffled, the two are concatenated and the result is shuffled again.
/// The two shuffles always run in that order, so a seeded `rng` gives a
/// reproducible corpus.
pub fn interleave<R: Rng + ?Sized>(
    chunks: Vec<String>,
    mut records: Vec<JsonRecord>,
    replication: usize,
    rng: &mut R,
) -> Vec<TrainingExample> {
    records.shuffle(rng);

    let mut combined = Vec::with_capacity(chunks.len() * replication + records.len());
    for _ in 0..replication {
        combined.extend(chunks.iter().cloned().map(TrainingExample::Chunk));
    }
    combined.extend(records.into_iter().map(TrainingExample::Record));

    combined.shuffle(rng);
    combined
}
