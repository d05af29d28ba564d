//! osmelt-audit: read-only audits of an OSM XML extract
//!
//! Usage:
//!   # Element and tag-key frequencies
//!   osmelt-audit tags region.osm
//!
//!   # addr:street values ending in an unexpected street type
//!   osmelt-audit streets region.osm
//!
//!   # Machine-readable output
//!   osmelt-audit tags region.osm --json

use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use osmelt::export::audit::{audit_street_types, audit_tags, EXPECTED_STREET_TYPES};

#[derive(Parser, Debug)]
#[command(name = "osmelt-audit")]
#[command(about = "Audit an OSM XML extract before exporting it", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count element names, node tag keys and way tag keys
    Tags {
        /// Input OSM XML file
        #[arg(value_name = "FILE")]
        input: String,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Group addr:street values by unexpected trailing street type
    Streets {
        /// Input OSM XML file
        #[arg(value_name = "FILE")]
        input: String,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn open(input: &str) -> Result<BufReader<File>> {
    let file =
        File::open(input).with_context(|| format!("Failed to open input file: {}", input))?;
    Ok(BufReader::new(file))
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Tags { input, json } => {
            let audit = audit_tags(open(&input)?).context("Audit aborted")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&audit)?);
            } else {
                println!("TOP LEVEL ELEMENTS:");
                for (name, count) in &audit.element_counts {
                    println!("{:>8}  {}", count, name);
                }
                println!("\nNODE TAG KEYS:");
                for (key, count) in &audit.node_tag_keys {
                    println!("{:>8}  {}", count, key);
                }
                println!("\nWAY TAG KEYS:");
                for (key, count) in &audit.way_tag_keys {
                    println!("{:>8}  {}", count, key);
                }
            }
        }
        Command::Streets { input, json } => {
            let audit = audit_street_types(open(&input)?, &EXPECTED_STREET_TYPES)
                .context("Audit aborted")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&audit)?);
            } else if audit.unexpected.is_empty() {
                println!("All street types look as expected.");
            } else {
                for (street_type, names) in &audit.unexpected {
                    println!("{}:", street_type);
                    for name in names {
                        println!("  {}", name);
                    }
                }
            }
        }
    }

    Ok(())
}
