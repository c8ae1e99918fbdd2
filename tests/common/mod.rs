//! Shared test infrastructure: an in-process stub of the DAVID SOAP service.
//!
//! The stub listens on a loopback port, answers the WSDL probe and the six
//! session operations with canned envelopes, and records the order of
//! operations it saw so tests can assert on sequencing and retry counts.
//! Responses carry `Connection: close` so every call arrives on its own
//! connection.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::process::{Command, Output};
use std::sync::{Arc, Mutex};
use std::thread;

const SESSION_NS: &str = "http://service.session.sample";

pub struct StubServer {
    addr: SocketAddr,
    ops: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    /// Spawn a stub accepting any of the session operations.
    ///
    /// `chart_faults` getChartReport calls answer with a SOAP fault before
    /// the canned `records` are served; pass `u32::MAX` to fault forever.
    pub fn spawn(conversion_types: &[&str], chart_faults: u32, records: Vec<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub listener");
        let addr = listener.local_addr().expect("stub local addr");
        let ops = Arc::new(Mutex::new(Vec::new()));
        let types: Vec<String> = conversion_types.iter().map(ToString::to_string).collect();
        let faults = Arc::new(Mutex::new(chart_faults));
        let seen = Arc::clone(&ops);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                handle_connection(stream, &types, &faults, &records, &seen);
            }
        });
        StubServer { addr, ops }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}/DAVIDWebService", self.addr)
    }

    /// Operations seen so far, in arrival order.
    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().expect("ops lock").clone()
    }

    pub fn count_of(&self, op: &str) -> usize {
        self.ops().iter().filter(|seen| *seen == op).count()
    }
}

fn handle_connection(
    stream: TcpStream,
    conversion_types: &[String],
    chart_faults: &Arc<Mutex<u32>>,
    records: &[String],
    seen: &Arc<Mutex<Vec<String>>>,
) {
    let Ok(read_half) = stream.try_clone() else {
        return;
    };
    let mut reader = BufReader::new(read_half);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() || request_line.is_empty() {
        return;
    }
    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).is_err() || header.trim().is_empty() {
            break;
        }
        let lower = header.to_ascii_lowercase();
        if let Some(value) = lower.strip_prefix("content-length:") {
            content_length = value.trim().parse().unwrap_or(0);
        }
    }
    let mut body = vec![0u8; content_length];
    if content_length > 0 && reader.read_exact(&mut body).is_err() {
        return;
    }
    let body = String::from_utf8_lossy(&body).into_owned();

    let (op, status, payload) = if request_line.starts_with("GET") {
        ("wsdl".to_string(), "200 OK", wsdl_body())
    } else {
        dispatch(&body, conversion_types, chart_faults, records)
    };
    seen.lock().expect("ops lock").push(op);
    respond(stream, status, &payload);
}

fn dispatch(
    body: &str,
    conversion_types: &[String],
    chart_faults: &Arc<Mutex<u32>>,
    records: &[String],
) -> (String, &'static str, String) {
    if body.contains("getChartReport") {
        let mut remaining = chart_faults.lock().expect("faults lock");
        if *remaining > 0 {
            *remaining = remaining.saturating_sub(1);
            return (
                "getChartReport".to_string(),
                "500 Internal Server Error",
                fault_body("stubbed outage"),
            );
        }
        let inner = format!(
            r#"<ns1:getChartReportResponse xmlns:ns1="{SESSION_NS}">{}</ns1:getChartReportResponse>"#,
            records.concat()
        );
        return ("getChartReport".to_string(), "200 OK", envelope(&inner));
    }
    if body.contains("getConversionTypes") {
        let returns: String = conversion_types
            .iter()
            .map(|kind| format!("<getConversionTypesReturn>{kind}</getConversionTypesReturn>"))
            .collect();
        let inner = format!(
            r#"<ns1:getConversionTypesResponse xmlns:ns1="{SESSION_NS}">{returns}</ns1:getConversionTypesResponse>"#
        );
        return ("getConversionTypes".to_string(), "200 OK", envelope(&inner));
    }
    for op in ["setCurrentSpecies", "setCategories", "addList", "authenticate"] {
        if body.contains(op) {
            let inner = format!(
                r#"<ns1:{op}Response xmlns:ns1="{SESSION_NS}"><{op}Return>true</{op}Return></ns1:{op}Response>"#
            );
            return (op.to_string(), "200 OK", envelope(&inner));
        }
    }
    ("unknown".to_string(), "500 Internal Server Error", fault_body("unknown operation"))
}

fn respond(mut stream: TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/xml; charset=utf-8\r\nContent-Length: {}\r\nSet-Cookie: JSESSIONID=stub-session; Path=/\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn envelope(inner: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"><soapenv:Body>{inner}</soapenv:Body></soapenv:Envelope>"#
    )
}

fn fault_body(message: &str) -> String {
    envelope(&format!(
        "<soapenv:Fault><faultcode>soapenv:Server</faultcode><faultstring>{message}</faultstring></soapenv:Fault>"
    ))
}

fn wsdl_body() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/" targetNamespace="{SESSION_NS}"/>"#
    )
}

/// A full chart record with fixed numeric fields; tests vary the text ones.
pub fn chart_record_xml(category: &str, term: &str, gene_ids: &str) -> String {
    format!(
        "<getChartReportReturn>\
         <categoryName>{category}</categoryName>\
         <termName>{term}</termName>\
         <listHits>5</listHits>\
         <percent>26.3</percent>\
         <ease>0.0012</ease>\
         <geneIds>{gene_ids}</geneIds>\
         <listTotals>19</listTotals>\
         <popHits>124</popHits>\
         <popTotals>6879</popTotals>\
         <foldEnrichment>4.2</foldEnrichment>\
         <bonferroni>0.03</bonferroni>\
         <benjamini>0.01</benjamini>\
         <afdr>0.9</afdr>\
         </getChartReportReturn>"
    )
}

/// Run the real binary against the stub with a freshly written input file.
pub fn run_chart(server: &StubServer, dir: &std::path::Path, extra: &[&str]) -> Output {
    let input = dir.join("genes.txt");
    std::fs::write(&input, "7157\tTP53\n672\tBRCA1\n7157\tdup\n").expect("write input");
    let output_file = dir.join("report.tsv");
    Command::new(env!("CARGO_BIN_EXE_david-chart"))
        .arg("--input-file")
        .arg(&input)
        .arg("--output-file")
        .arg(&output_file)
        .args(["--auth-email", "it@example.org", "--endpoint"])
        .arg(server.endpoint())
        .args(extra)
        .output()
        .expect("run david-chart")
}
