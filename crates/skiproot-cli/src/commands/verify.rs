//! Verify command implementation.

use std::fs;
use std::io::{self, Read};

use serde_json::json;
use skiproot_canonical::Digest;
use skiproot_core::{verify_proof, RankProof, VerifyMode};

use crate::output::{format_json, truncate};

pub fn run(
    proof_path: Option<String>,
    root: String,
    mode: VerifyMode,
    strict: bool,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = Digest::from_hex(&root).map_err(|e| format!("Invalid root: {}", e))?;

    let text = match proof_path {
        Some(path) => fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read proof {}: {}", path, e))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let proof = RankProof::from_json(&text)?;
    let outcome = verify_proof(&root, &proof, mode)?;

    if json_output {
        let result = json!({
            "rank": proof.rank,
            "leaf": proof.leaf.to_hex(),
            "valid": outcome.valid,
            "bytes_hashed": outcome.bytes_hashed,
            "mode": outcome.mode,
        });
        println!("{}", format_json(&result)?);
    } else {
        println!("Rank:         {}", proof.rank);
        println!("Leaf:         {}", truncate(&proof.leaf.to_hex(), 19));
        println!("Mode:         {}", outcome.mode);
        println!("Valid:        {}", outcome.valid);
        println!("Bytes hashed: {}", outcome.bytes_hashed);
    }

    if strict && !outcome.valid {
        std::process::exit(1);
    }

    Ok(())
}
