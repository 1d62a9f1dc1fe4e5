//! Bench command implementation.
//!
//! Samples a list, proves and verifies every rank, and reports hashing work,
//! timings and proof sizes.

use std::time::Instant;

use chrono::Utc;
use log::debug;
use serde::Serialize;
use skiproot_core::{verify_proof, VerifyMode};

use super::ListArgs;
use crate::output::{format_json, print_table_header};

/// Sample size when neither `--keys` nor `--count` is given.
const DEFAULT_COUNT: usize = 32;

/// Mean, population standard deviation and maximum of a sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
struct Spread {
    mean: f64,
    std: f64,
    max: f64,
}

impl Spread {
    fn of(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let max = samples.iter().copied().fold(f64::MIN, f64::max);
        Self {
            mean,
            std: var.sqrt(),
            max,
        }
    }
}

#[derive(Debug, Serialize)]
struct RankRow {
    rank: u64,
    valid: bool,
    bytes_hashed: usize,
}

#[derive(Debug, Serialize)]
struct Summary {
    generated_at: String,
    root: String,
    count: u64,
    max_level: usize,
    mode: VerifyMode,
    average_bytes_hashed: f64,
    all_verified: bool,
    prove_micros: Spread,
    verify_micros: Spread,
    proof_bytes: Spread,
    ranks: Vec<RankRow>,
}

pub fn run(
    mut args: ListArgs,
    mode: VerifyMode,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.keys.is_none() && args.count.is_none() {
        args.count = Some(DEFAULT_COUNT);
    }
    let list = args.build()?;
    let root = list.get_root()?;

    let n = list.len() as usize;
    let mut rows = Vec::with_capacity(n);
    let mut prove_times = Vec::with_capacity(n);
    let mut verify_times = Vec::with_capacity(n);
    let mut sizes = Vec::with_capacity(n);

    for rank in 1..=list.len() {
        let started = Instant::now();
        let proof = list.prove_at_rank(rank)?;
        prove_times.push(started.elapsed().as_secs_f64() * 1e6);

        let started = Instant::now();
        let outcome = verify_proof(&root, &proof, mode)?;
        verify_times.push(started.elapsed().as_secs_f64() * 1e6);

        sizes.push(proof.serialized_len()? as f64);
        debug!(
            "rank {}: {} steps, valid={}",
            rank,
            proof.steps.len(),
            outcome.valid
        );
        rows.push(RankRow {
            rank,
            valid: outcome.valid,
            bytes_hashed: outcome.bytes_hashed,
        });
    }

    let total: usize = rows.iter().map(|r| r.bytes_hashed).sum();
    let summary = Summary {
        generated_at: Utc::now().to_rfc3339(),
        root: root.to_hex(),
        count: list.len(),
        max_level: list.max_level(),
        mode,
        average_bytes_hashed: total as f64 / rows.len().max(1) as f64,
        all_verified: rows.iter().all(|r| r.valid),
        prove_micros: Spread::of(&prove_times),
        verify_micros: Spread::of(&verify_times),
        proof_bytes: Spread::of(&sizes),
        ranks: rows,
    };

    if json_output {
        println!("{}", format_json(&summary)?);
        return Ok(());
    }

    println!("Root: {}", summary.root);
    print_table_header(&[("Rank", 6), ("Valid", 8), ("Bytes Hashed", 12)]);
    for row in &summary.ranks {
        println!("{:<6} {:<8} {}", row.rank, row.valid, row.bytes_hashed);
    }
    println!();
    println!("Average bytes hashed: {}", summary.average_bytes_hashed);
    println!("All verified? {}", summary.all_verified);
    println!(
        "Proof computation (us): mean {:.3}, std {:.3}, max {:.3}",
        summary.prove_micros.mean, summary.prove_micros.std, summary.prove_micros.max
    );
    println!(
        "Verification ({}) (us): mean {:.3}, std {:.3}, max {:.3}",
        mode, summary.verify_micros.mean, summary.verify_micros.std, summary.verify_micros.max
    );
    println!(
        "Proof size (bytes): mean {:.1}, max {}",
        summary.proof_bytes.mean, summary.proof_bytes.max
    );
    Ok(())
}
