use std::io::{self, Write};

use crate::config::OutputFormat;
use crate::pipeline::Summary;

/// Write the summary to `out`. Markdown output is the completion text as-is.
pub fn render<W: Write>(summary: &Summary, format: OutputFormat, mut out: W) -> io::Result<()> {
    match format {
        OutputFormat::Markdown => {
            out.write_all(summary.markdown.as_bytes())?;
            if !summary.markdown.ends_with('\n') {
                out.write_all(b"\n")?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, summary)?;
            out.write_all(b"\n")?;
        }
    }
    out.flush()
}
