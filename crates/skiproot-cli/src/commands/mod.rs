//! Subcommand implementations.

pub mod bench;
pub mod build;
pub mod prove;
pub mod verify;

use clap::Args;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use skiproot_core::{AuthSkipList, CoinFlips, RecomputeStrategy, SkipListConfig};
use thiserror::Error;

/// Input errors detected before the list is built.
#[derive(Debug, Error)]
pub enum InputError {
    /// Neither explicit keys nor a sample size was given.
    #[error("either --keys or --count is required")]
    MissingKeys,
    /// `--heights` does not pair up with `--keys`.
    #[error("{heights} heights given for {keys} keys")]
    HeightCountMismatch { keys: usize, heights: usize },
    /// The sampling range cannot supply enough distinct keys.
    #[error("cannot sample {count} distinct keys from {low}..{high}")]
    RangeTooSmall { count: usize, low: u64, high: u64 },
}

/// Options shared by every command that builds a list.
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Comma-separated keys, inserted in the given order
    #[arg(long, value_delimiter = ',', conflicts_with = "count")]
    pub keys: Option<Vec<u64>>,
    /// Comma-separated tower heights, one per key
    #[arg(long, value_delimiter = ',', requires = "keys")]
    pub heights: Option<Vec<usize>>,
    /// Sample this many distinct keys instead of passing --keys
    #[arg(long)]
    pub count: Option<usize>,
    /// Lowest sampled key (inclusive)
    #[arg(long, default_value_t = 1000)]
    pub low: u64,
    /// Upper bound for sampled keys (exclusive)
    #[arg(long, default_value_t = 9999)]
    pub high: u64,
    /// Seed for key sampling and tower coin flips
    #[arg(long, default_value_t = 1)]
    pub seed: u64,
    /// Highest level index
    #[arg(long, default_value_t = 5)]
    pub max_level: usize,
    /// Patch ranks and labels along the insert path instead of recomputing everything
    #[arg(long)]
    pub incremental: bool,
}

impl ListArgs {
    fn config(&self) -> SkipListConfig {
        SkipListConfig {
            max_level: self.max_level,
            recompute: if self.incremental {
                RecomputeStrategy::Incremental
            } else {
                RecomputeStrategy::Full
            },
        }
    }

    /// Builds the list these options describe.
    ///
    /// Sampled keys are sorted before insertion, and the coin that draws
    /// tower heights continues the same seeded stream that sampled them.
    pub fn build(&self) -> Result<AuthSkipList<u64>, Box<dyn std::error::Error>> {
        let config = self.config();
        let list = match (&self.keys, &self.heights, self.count) {
            (Some(keys), Some(heights), _) => {
                if keys.len() != heights.len() {
                    return Err(InputError::HeightCountMismatch {
                        keys: keys.len(),
                        heights: heights.len(),
                    }
                    .into());
                }
                let mut list = AuthSkipList::with_config(config);
                for (&key, &height) in keys.iter().zip(heights) {
                    list.insert_with_height(key, height)?;
                }
                list
            }
            (Some(keys), None, _) => {
                let mut list = AuthSkipList::with_sampler(config, CoinFlips::seeded(self.seed));
                for &key in keys {
                    list.insert(key)?;
                }
                list
            }
            (None, _, Some(count)) => {
                let mut rng = StdRng::seed_from_u64(self.seed);
                let keys = sample_keys(&mut rng, self.low, self.high, count)?;
                let mut list = AuthSkipList::with_sampler(config, CoinFlips::new(rng));
                for key in keys {
                    list.insert(key)?;
                }
                list
            }
            (None, _, None) => return Err(InputError::MissingKeys.into()),
        };

        info!(
            "built list with {} keys over {} levels",
            list.len(),
            list.max_level() + 1
        );
        Ok(list)
    }
}

/// `count` distinct keys from `low..high`, ascending.
fn sample_keys(
    rng: &mut StdRng,
    low: u64,
    high: u64,
    count: usize,
) -> Result<Vec<u64>, InputError> {
    let span = high
        .checked_sub(low)
        .and_then(|span| usize::try_from(span).ok())
        .filter(|&span| span >= count)
        .ok_or(InputError::RangeTooSmall { count, low, high })?;

    let mut keys: Vec<u64> = rand::seq::index::sample(rng, span, count)
        .into_iter()
        .map(|offset| low + offset as u64)
        .collect();
    keys.sort_unstable();
    Ok(keys)
}
