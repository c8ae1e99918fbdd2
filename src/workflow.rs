//! Run orchestration: the fixed operation sequence and the retry loop.
//!
//! One attempt = open a fresh session, run the configuration calls, fetch
//! the chart and write the report. Validation failures abort the whole run
//! immediately; anything else is treated as transient and retried on a new
//! session after a fixed pause.

use crate::client::EnrichmentService;
use crate::config::{species_filter_applies, RunConfig};
use crate::error::RunError;
use crate::identifiers::IdentifierList;
use crate::report;
use std::time::Duration;

/// Internal name the submitted list is stored under on the service side.
const LIST_NAME: &str = "david_chart_list";

/// addList flag: 0 = do not overwrite an existing list of the same name.
const KEEP_EXISTING_LIST: u32 = 0;

const MAX_ATTEMPTS: u32 = 5;
const RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub records: usize,
}

/// One full attempt against an open session.
pub fn run_once<S: EnrichmentService>(
    service: &S,
    config: &RunConfig,
    ids: &IdentifierList,
) -> Result<RunOutcome, RunError> {
    service.authenticate(&config.auth_email)?;

    if config.check_identifier_kind {
        let supported = service.conversion_types()?;
        if !supported.iter().any(|kind| *kind == config.identifier) {
            return Err(RunError::UnsupportedIdentifierKind {
                kind: config.identifier.clone(),
                supported,
            });
        }
    }

    service.set_categories(&config.category_filter())?;

    if species_filter_applies(&config.identifier) && !config.species.is_empty() {
        service.set_current_species(&config.species_filter())?;
    }

    println!(
        "Submitting {} identifiers as {}",
        ids.len(),
        config.identifier
    );
    service.add_list(&ids.joined(), &config.identifier, LIST_NAME, KEEP_EXISTING_LIST)?;

    let records = service.chart_report(config.p_value, config.min_count)?;
    if records.is_empty() {
        println!("Chart report is empty; writing header-only file");
    } else {
        println!("Chart report has {} records", records.len());
    }
    report::write_report(&config.output_file, &records)?;
    Ok(RunOutcome {
        records: records.len(),
    })
}

/// Bounded retry around connect + run_once. `connect` builds a fresh
/// session per attempt; `sleep` is injected so tests can observe the fixed
/// backoff instead of waiting it out.
pub fn run_with_retry<S, C>(
    mut connect: C,
    config: &RunConfig,
    ids: &IdentifierList,
    mut sleep: impl FnMut(Duration),
) -> Result<RunOutcome, RunError>
where
    S: EnrichmentService,
    C: FnMut() -> Result<S, RunError>,
{
    let mut attempt = 1;
    loop {
        match connect().and_then(|service| run_once(&service, config, ids)) {
            Ok(outcome) => return Ok(outcome),
            Err(err) if err.is_validation() => return Err(err),
            Err(err) if attempt == MAX_ATTEMPTS => {
                return Err(RunError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }
            Err(err) => {
                tracing::warn!(attempt, max_attempts = MAX_ATTEMPTS, error = %err, "attempt failed, retrying");
                eprintln!("Attempt {attempt}/{MAX_ATTEMPTS} failed ({err}), retrying...");
                attempt += 1;
                sleep(RETRY_DELAY);
            }
        }
    }
}
