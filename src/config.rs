//! Run configuration and the species-filter policy.
//!
//! `RunConfig` is built once from CLI input and read-only afterward. Filter
//! lists are kept as vectors here and joined back into the service's
//! comma-separated wire form at call time.

use std::path::PathBuf;

/// Published endpoint of the DAVID web service.
pub const DEFAULT_ENDPOINT: &str =
    "https://david.ncifcrf.gov/webservice/services/DAVIDWebService";

/// Default identifier kind. Accession-type, so no species disambiguation.
pub const DEFAULT_IDENTIFIER: &str = "ENTREZ_GENE_ID";

/// Default chart sources: the three direct GO ontologies plus KEGG.
pub const DEFAULT_CATEGORIES: &str =
    "GOTERM_BP_DIRECT,GOTERM_CC_DIRECT,GOTERM_MF_DIRECT,KEGG_PATHWAY";

/// Default species filter: Homo sapiens (NCBI taxonomy ID).
pub const DEFAULT_SPECIES: &str = "9606";

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub endpoint: String,
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub identifier: String,
    pub auth_email: String,
    pub p_value: f64,
    pub min_count: u32,
    /// Category filter; empty means the server default (all categories).
    pub categories: Vec<String>,
    /// Numeric species IDs; empty means all species.
    pub species: Vec<String>,
    /// Check the identifier kind against the service vocabulary before
    /// submitting the list.
    pub check_identifier_kind: bool,
}

impl RunConfig {
    pub fn category_filter(&self) -> String {
        self.categories.join(",")
    }

    pub fn species_filter(&self) -> String {
        self.species.join(",")
    }
}

/// Whether a species filter is meaningful for an identifier kind.
///
/// Gene symbols are ambiguous across organisms, so the service needs a
/// species to resolve them. Accession kinds (ENTREZ_GENE_ID, UNIPROT_ID and
/// the rest) already name an organism-specific record; setting a species for
/// those may be rejected or silently ignored by the service.
pub fn species_filter_applies(kind: &str) -> bool {
    kind.ends_with("GENE_SYMBOL")
}
