//! Prove command implementation.

use std::fs;

use log::info;

use super::ListArgs;

pub fn run(
    args: ListArgs,
    rank: u64,
    output: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let list = args.build()?;
    let proof = list.prove_at_rank(rank)?;
    info!(
        "rank {} proof has {} steps under root {}",
        rank,
        proof.steps.len(),
        list.get_root()?
    );

    let text = proof.to_json()?;
    match output {
        Some(path) => {
            fs::write(&path, text + "\n")
                .map_err(|e| format!("Failed to write proof to {}: {}", path, e))?;
        }
        None => println!("{}", text),
    }
    Ok(())
}
