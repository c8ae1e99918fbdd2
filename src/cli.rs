//! Command-line interface for the chart-report client.
//!
//! The CLI is intentionally thin: flags map one-to-one onto `RunConfig`
//! fields, and the numeric thresholds are range-checked here so misuse is
//! reported before any network traffic.

use crate::config::{
    RunConfig, DEFAULT_CATEGORIES, DEFAULT_ENDPOINT, DEFAULT_IDENTIFIER, DEFAULT_SPECIES,
};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "david-chart",
    version,
    about = "Fetch a DAVID functional-annotation chart report for a gene list",
    after_help = "Examples:\n  david-chart --input-file genes.txt --auth-email you@example.org\n  david-chart --input-file genes.txt --auth-email you@example.org \\\n      --identifier OFFICIAL_GENE_SYMBOL --species 9606,10090\n  RUST_LOG=debug david-chart --input-file genes.txt --auth-email you@example.org"
)]
pub struct Args {
    /// Identifier list: tab-delimited, no header, first column used
    #[arg(long, value_name = "PATH")]
    pub input_file: PathBuf,

    /// Report destination; overwritten if it exists
    #[arg(long, value_name = "PATH", default_value = "chartReport.tsv")]
    pub output_file: PathBuf,

    /// Email address registered with the DAVID web service
    #[arg(long, value_name = "EMAIL")]
    pub auth_email: String,

    /// Identifier kind of the submitted list (e.g. ENTREZ_GENE_ID,
    /// OFFICIAL_GENE_SYMBOL)
    #[arg(long, value_name = "KIND", default_value = DEFAULT_IDENTIFIER)]
    pub identifier: String,

    /// EASE p-value threshold for reported terms
    #[arg(long, value_name = "P", default_value_t = 0.1, value_parser = parse_p_value)]
    pub p_value: f64,

    /// Minimum number of list genes per reported term
    #[arg(long, value_name = "N", default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    pub min_count: u32,

    /// Comma-separated category filter; empty string keeps all categories
    #[arg(long, value_name = "LIST", default_value = DEFAULT_CATEGORIES)]
    pub category: String,

    /// Comma-separated numeric species IDs; empty string keeps all species.
    /// Only applied for gene-symbol identifier kinds.
    #[arg(long, value_name = "LIST", default_value = DEFAULT_SPECIES, value_parser = parse_species_list)]
    pub species: String,

    /// Skip checking the identifier kind against the service vocabulary
    #[arg(long)]
    pub skip_identifier_check: bool,

    /// Web service endpoint
    #[arg(long, value_name = "URL", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

impl Args {
    pub fn into_config(self) -> RunConfig {
        RunConfig {
            endpoint: self.endpoint,
            input_file: self.input_file,
            output_file: self.output_file,
            identifier: self.identifier,
            auth_email: self.auth_email,
            p_value: self.p_value,
            min_count: self.min_count,
            categories: split_filter(&self.category),
            species: split_filter(&self.species),
            check_identifier_kind: !self.skip_identifier_check,
        }
    }
}

fn parse_p_value(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("{raw:?} is not a number"))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("p-value must be within [0, 1], got {value}"));
    }
    Ok(value)
}

fn parse_species_list(raw: &str) -> Result<String, String> {
    for id in split_filter(raw) {
        if id.parse::<u64>().is_err() {
            return Err(format!("species must be numeric taxonomy IDs, got {id:?}"));
        }
    }
    Ok(raw.to_string())
}

fn split_filter(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ToString::to_string)
        .collect()
}
