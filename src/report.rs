use std::io::Write;

use color_eyre::Result;
use color_eyre::eyre::{Report as ErrorReport, WrapErr};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::collector::{self, Probe};
use crate::process::ProcessSnapshot;
use crate::system::SystemSnapshot;

const INDENT: &[u8] = b"    ";

#[derive(Clone, Debug, Serialize)]
pub struct Report {
    pub process: ProcessSnapshot,
    pub system: SystemSnapshot,
}

/// Runs every collection step in order, stopping at the first failure.
pub fn collect(probe: &impl Probe) -> Result<Report> {
    let process = collector::collect_process(probe)?;
    let system = collector::collect_system(probe)?;
    Ok(Report { process, system })
}

/// Indented JSON document with a trailing newline.
pub fn render(report: &Report) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(1024);
    let mut ser =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    report
        .serialize(&mut ser)
        .wrap_err("failed to marshal result")?;
    buf.push(b'\n');
    Ok(buf)
}

/// Collects, renders and writes the document. `out` is untouched unless
/// every step succeeded.
pub fn run(probe: &impl Probe, out: &mut impl Write) -> Result<()> {
    let report = collect(probe)?;
    let doc = render(&report)?;

    #[cfg(feature = "perf-tracing")]
    let _span = tracing::debug_span!("report.write", bytes = doc.len()).entered();

    out.write_all(&doc).wrap_err("failed to write result")?;
    out.flush().wrap_err("failed to write result")?;
    Ok(())
}

/// The error chain on a single line, outermost context first.
pub fn diagnostic_line(err: &ErrorReport) -> String {
    err.chain()
        .map(|cause| cause.to_string().replace('\n', " "))
        .collect::<Vec<_>>()
        .join(": ")
}
