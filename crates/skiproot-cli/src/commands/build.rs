//! Build command implementation.

use serde_json::json;

use super::ListArgs;
use crate::output::{format_json, print_table_header};

pub fn run(args: ListArgs, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let list = args.build()?;
    let root = list.get_root()?;

    // Real cells per level, heads excluded.
    let levels: Vec<usize> = (0..=list.max_level())
        .map(|level| list.level_nodes(level).count() - 1)
        .collect();
    let stats = list.stats();

    if json_output {
        let summary = json!({
            "root": root.to_hex(),
            "count": list.len(),
            "max_level": list.max_level(),
            "levels": levels,
            "stats": stats,
        });
        println!("{}", format_json(&summary)?);
        return Ok(());
    }

    println!("Root:  {}", root);
    println!("Count: {}", list.len());
    println!();
    print_table_header(&[("LEVEL", 6), ("NODES", 6)]);
    for (level, nodes) in levels.iter().enumerate().rev() {
        println!("{:<6} {}", level, nodes);
    }
    println!();
    println!(
        "{} labels hashed over {} recomputes ({} bytes)",
        stats.nodes_hashed, stats.recomputes, stats.bytes_hashed
    );
    Ok(())
}
