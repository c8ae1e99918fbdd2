//! Session client for the DAVID enrichment service.
//!
//! The operation surface is a trait so the pipeline and the retry
//! controller can run against scripted stubs in tests. `SoapSession` is the
//! production implementation: one cookie-carrying agent per session, since
//! the service keeps the submitted list and filters in servlet-session
//! state between calls.

use crate::error::RunError;
use crate::report::ChartRecord;
use crate::soap::{self, SoapArg};
use std::collections::BTreeMap;
use std::time::Duration;
use ureq::Agent;

/// Upper bound on any single remote call. The service enforces no timeout
/// of its own; without this a hung call would block the process forever.
const CALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Session-scoped operations exposed by the service.
pub trait EnrichmentService {
    fn authenticate(&self, email: &str) -> Result<(), RunError>;
    fn conversion_types(&self) -> Result<Vec<String>, RunError>;
    fn set_categories(&self, categories: &str) -> Result<(), RunError>;
    fn set_current_species(&self, species: &str) -> Result<(), RunError>;
    fn add_list(
        &self,
        ids: &str,
        kind: &str,
        name: &str,
        overwrite_flag: u32,
    ) -> Result<(), RunError>;
    fn chart_report(&self, p_value: f64, min_count: u32) -> Result<Vec<ChartRecord>, RunError>;
}

pub struct SoapSession {
    agent: Agent,
    endpoint: String,
}

impl SoapSession {
    /// Open a session: fetch the service description to prove the endpoint
    /// is reachable and actually speaks this contract.
    pub fn connect(endpoint: &str) -> Result<Self, RunError> {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(CALL_TIMEOUT))
            .http_status_as_error(false)
            .build()
            .into();
        let session = SoapSession {
            agent,
            endpoint: endpoint.to_string(),
        };
        session.check_service_description()?;
        Ok(session)
    }

    fn check_service_description(&self) -> Result<(), RunError> {
        let wsdl_url = format!("{}?wsdl", self.endpoint);
        let mut response = self
            .agent
            .get(&wsdl_url)
            .call()
            .map_err(|source| RunError::Connectivity {
                endpoint: self.endpoint.clone(),
                source: Box::new(source),
            })?;
        let status = response.status();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|source| RunError::Connectivity {
                endpoint: self.endpoint.clone(),
                source: Box::new(source),
            })?;
        if !status.is_success() {
            return Err(RunError::ServiceFault {
                operation: "wsdl",
                message: format!("HTTP status {}", status.as_u16()),
            });
        }
        if !body.contains("definitions") {
            return Err(RunError::MalformedResponse {
                operation: "wsdl",
                detail: "no service definitions in endpoint description".to_string(),
            });
        }
        tracing::debug!(endpoint = %self.endpoint, "service description ok");
        Ok(())
    }

    fn call(&self, operation: &'static str, args: &[SoapArg<'_>]) -> Result<String, RunError> {
        let envelope = soap::request_envelope(operation, args);
        tracing::debug!(operation, "soap call");
        let mut response = self
            .agent
            .post(&self.endpoint)
            .header("content-type", "text/xml; charset=utf-8")
            .header("soapaction", "")
            .send(envelope.as_str())
            .map_err(|source| RunError::Connectivity {
                endpoint: self.endpoint.clone(),
                source: Box::new(source),
            })?;
        let status = response.status();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|source| RunError::Connectivity {
                endpoint: self.endpoint.clone(),
                source: Box::new(source),
            })?;
        if let Some(message) = soap::fault_message(&body) {
            return Err(RunError::ServiceFault { operation, message });
        }
        if !status.is_success() {
            return Err(RunError::ServiceFault {
                operation,
                message: format!("HTTP status {}", status.as_u16()),
            });
        }
        Ok(body)
    }
}

impl EnrichmentService for SoapSession {
    /// The service reports authentication failure only through later calls
    /// failing, so the return value is not interpreted here.
    fn authenticate(&self, email: &str) -> Result<(), RunError> {
        self.call("authenticate", &[SoapArg::Str(email)])?;
        Ok(())
    }

    fn conversion_types(&self) -> Result<Vec<String>, RunError> {
        let body = self.call("getConversionTypes", &[])?;
        let values = soap::scalar_returns(&body, "getConversionTypesReturn").map_err(|err| {
            RunError::MalformedResponse {
                operation: "getConversionTypes",
                detail: format!("{err:#}"),
            }
        })?;
        // Tolerate both repeated return elements and a single joined string.
        let kinds: Vec<String> = values
            .iter()
            .flat_map(|value| value.split([',', '\n']))
            .map(str::trim)
            .filter(|kind| !kind.is_empty())
            .map(ToString::to_string)
            .collect();
        if kinds.is_empty() {
            return Err(RunError::MalformedResponse {
                operation: "getConversionTypes",
                detail: "empty identifier-kind vocabulary".to_string(),
            });
        }
        Ok(kinds)
    }

    fn set_categories(&self, categories: &str) -> Result<(), RunError> {
        self.call("setCategories", &[SoapArg::Str(categories)])?;
        Ok(())
    }

    fn set_current_species(&self, species: &str) -> Result<(), RunError> {
        self.call("setCurrentSpecies", &[SoapArg::Str(species)])?;
        Ok(())
    }

    fn add_list(
        &self,
        ids: &str,
        kind: &str,
        name: &str,
        overwrite_flag: u32,
    ) -> Result<(), RunError> {
        self.call(
            "addList",
            &[
                SoapArg::Str(ids),
                SoapArg::Str(kind),
                SoapArg::Str(name),
                SoapArg::Int(overwrite_flag),
            ],
        )?;
        Ok(())
    }

    fn chart_report(&self, p_value: f64, min_count: u32) -> Result<Vec<ChartRecord>, RunError> {
        let body = self.call(
            "getChartReport",
            &[SoapArg::Double(p_value), SoapArg::Int(min_count)],
        )?;
        let raw = soap::record_returns(&body, "getChartReportReturn").map_err(|err| {
            RunError::MalformedResponse {
                operation: "getChartReport",
                detail: format!("{err:#}"),
            }
        })?;
        raw.iter().map(record_from_fields).collect()
    }
}

fn record_from_fields(fields: &BTreeMap<String, String>) -> Result<ChartRecord, RunError> {
    Ok(ChartRecord {
        category_name: text_field(fields, "categoryName"),
        term_name: text_field(fields, "termName"),
        list_hits: numeric_field(fields, "listHits")?,
        percent: numeric_field(fields, "percent")?,
        ease: numeric_field(fields, "ease")?,
        gene_ids: text_field(fields, "geneIds"),
        list_totals: numeric_field(fields, "listTotals")?,
        pop_hits: numeric_field(fields, "popHits")?,
        pop_totals: numeric_field(fields, "popTotals")?,
        fold_enrichment: numeric_field(fields, "foldEnrichment")?,
        bonferroni: numeric_field(fields, "bonferroni")?,
        benjamini: numeric_field(fields, "benjamini")?,
        fdr: numeric_field(fields, "afdr")?,
    })
}

fn text_field(fields: &BTreeMap<String, String>, name: &str) -> String {
    fields.get(name).cloned().unwrap_or_default()
}

fn numeric_field<T: std::str::FromStr>(
    fields: &BTreeMap<String, String>,
    name: &'static str,
) -> Result<T, RunError> {
    let raw = fields
        .get(name)
        .ok_or_else(|| RunError::MalformedResponse {
            operation: "getChartReport",
            detail: format!("record is missing {name}"),
        })?;
    raw.trim()
        .parse()
        .map_err(|_| RunError::MalformedResponse {
            operation: "getChartReport",
            detail: format!("{name} is not numeric: {raw:?}"),
        })
}
