//! Minimal SOAP plumbing for the DAVID session service.
//!
//! The service contract is fixed and small (RPC-style operations in the
//! `http://service.session.sample` namespace with positional `argsN`
//! parameters), so envelopes are assembled from templates and responses are
//! walked event-by-event, matching elements by local name to stay
//! independent of whatever namespace prefixes the server emits.

use anyhow::{Context, Result};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;

const ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const SESSION_NS: &str = "http://service.session.sample";

/// A positional operation parameter with its wire type.
#[derive(Debug, Clone, Copy)]
pub enum SoapArg<'a> {
    Str(&'a str),
    Int(u32),
    Double(f64),
}

/// Build a request envelope for one operation call.
pub fn request_envelope(operation: &str, args: &[SoapArg<'_>]) -> String {
    let mut params = String::new();
    for (index, arg) in args.iter().enumerate() {
        match arg {
            SoapArg::Str(value) => params.push_str(&format!(
                r#"<args{index} xsi:type="xsd:string">{}</args{index}>"#,
                escape(*value)
            )),
            SoapArg::Int(value) => params.push_str(&format!(
                r#"<args{index} xsi:type="xsd:int">{value}</args{index}>"#
            )),
            SoapArg::Double(value) => params.push_str(&format!(
                r#"<args{index} xsi:type="xsd:double">{value}</args{index}>"#
            )),
        }
    }
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<soapenv:Envelope xmlns:soapenv="{envelope_ns}""#,
            r#" xmlns:xsd="http://www.w3.org/2001/XMLSchema""#,
            r#" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            r#"<soapenv:Body>"#,
            r#"<ns1:{operation} xmlns:ns1="{session_ns}">{params}</ns1:{operation}>"#,
            r#"</soapenv:Body>"#,
            r#"</soapenv:Envelope>"#
        ),
        envelope_ns = ENVELOPE_NS,
        session_ns = SESSION_NS,
        operation = operation,
        params = params,
    )
}

/// Extract a SOAP fault message, if the body carries one.
pub fn fault_message(xml: &str) -> Option<String> {
    scalar_return(xml, "faultstring")
        .ok()
        .flatten()
        .filter(|message| !message.is_empty())
}

/// Text content of the first element with the given local name.
pub fn scalar_return(xml: &str, element: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut capturing = false;
    let mut text = String::new();
    loop {
        match reader.read_event().context("read XML event")? {
            Event::Start(start) if !capturing => {
                if start.local_name().as_ref() == element.as_bytes() {
                    capturing = true;
                }
            }
            Event::Empty(empty) if !capturing => {
                if empty.local_name().as_ref() == element.as_bytes() {
                    return Ok(Some(String::new()));
                }
            }
            Event::Text(t) if capturing => {
                text.push_str(&t.unescape().context("unescape XML text")?);
            }
            Event::CData(raw) if capturing => {
                text.push_str(&String::from_utf8_lossy(&raw.into_inner()));
            }
            Event::End(end) if capturing => {
                if end.local_name().as_ref() == element.as_bytes() {
                    return Ok(Some(text));
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// All texts of elements with the given local name, in document order.
pub fn scalar_returns(xml: &str, element: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut values = Vec::new();
    let mut capturing = false;
    let mut text = String::new();
    loop {
        match reader.read_event().context("read XML event")? {
            Event::Start(start) if !capturing => {
                if start.local_name().as_ref() == element.as_bytes() {
                    capturing = true;
                    text.clear();
                }
            }
            Event::Empty(empty) if !capturing => {
                if empty.local_name().as_ref() == element.as_bytes() {
                    values.push(String::new());
                }
            }
            Event::Text(t) if capturing => {
                text.push_str(&t.unescape().context("unescape XML text")?);
            }
            Event::CData(raw) if capturing => {
                text.push_str(&String::from_utf8_lossy(&raw.into_inner()));
            }
            Event::End(end) if capturing => {
                if end.local_name().as_ref() == element.as_bytes() {
                    values.push(std::mem::take(&mut text));
                    capturing = false;
                }
            }
            Event::Eof => return Ok(values),
            _ => {}
        }
    }
}

/// Structured returns: every element with the given local name becomes a map
/// of child-element local name to text content.
pub fn record_returns(xml: &str, element: &str) -> Result<Vec<BTreeMap<String, String>>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut records = Vec::new();
    let mut current: Option<BTreeMap<String, String>> = None;
    let mut field: Option<String> = None;
    let mut text = String::new();
    loop {
        match reader.read_event().context("read XML event")? {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                if current.is_none() {
                    if name == element {
                        current = Some(BTreeMap::new());
                    }
                } else if field.is_none() {
                    field = Some(name);
                    text.clear();
                }
            }
            Event::Empty(empty) => {
                if let Some(record) = current.as_mut() {
                    if field.is_none() {
                        let name =
                            String::from_utf8_lossy(empty.local_name().as_ref()).into_owned();
                        record.insert(name, String::new());
                    }
                }
            }
            Event::Text(t) => {
                if field.is_some() {
                    text.push_str(&t.unescape().context("unescape XML text")?);
                }
            }
            Event::CData(raw) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&raw.into_inner()));
                }
            }
            Event::End(end) => {
                let name = String::from_utf8_lossy(end.local_name().as_ref()).into_owned();
                if let Some(open) = field.as_ref() {
                    if *open == name {
                        if let Some(record) = current.as_mut() {
                            record.insert(open.clone(), std::mem::take(&mut text));
                        }
                        field = None;
                    }
                } else if name == element {
                    if let Some(record) = current.take() {
                        records.push(record);
                    }
                }
            }
            Event::Eof => return Ok(records),
            _ => {}
        }
    }
}
