//! The host I/O adapter (spec §1/§6): the external collaborator that owns
//! actual stdout/stdin and fatal-error reporting. The interpreter core never
//! touches a stream directly — `output`/`read_line`/`report_error` are
//! decoupled from the evaluator the same way a `PrintWriter` seam decouples
//! output from a VM.

use crate::error::InterpError;

/// Implemented by whatever embeds this interpreter. `report_error` is called
/// at most once per run, at the point a fatal error (§7) unwinds all the way
/// out of [`crate::runner::Runner::run`]; the interpreter does not assume
/// the process exits afterwards, since that decision belongs to the host.
pub trait HostIo {
    /// Writes one line of `print` output, without a trailing newline
    /// (the caller appends it — see [`StdIo`] for the convention).
    fn output(&mut self, line: &str);

    /// Blocks for one line of input (`inputi`/`inputs`).
    fn read_line(&mut self) -> String;

    /// Reports a fatal error (§7). Called once, immediately before
    /// execution unwinds out of the top-level run.
    fn report_error(&mut self, err: &InterpError);
}

/// Default adapter: real stdout/stdin.
#[derive(Debug, Default)]
pub struct StdIo;

impl HostIo for StdIo {
    fn output(&mut self, line: &str) {
        println!("{line}");
    }

    fn read_line(&mut self) -> String {
        let mut buf = String::new();
        std::io::stdin().read_line(&mut buf).unwrap_or(0);
        buf.trim_end_matches(['\n', '\r']).to_owned()
    }

    fn report_error(&mut self, err: &InterpError) {
        eprintln!("{err}");
    }
}

/// Test double: captures `print` output and serves canned input lines in
/// order, recording the last reported error instead of printing it.
#[derive(Debug, Default)]
pub struct CapturingIo {
    pub output_lines: Vec<String>,
    pub input_lines: std::collections::VecDeque<String>,
    pub last_error: Option<InterpError>,
}

impl CapturingIo {
    #[must_use]
    pub fn with_inputs(inputs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            output_lines: Vec::new(),
            input_lines: inputs.into_iter().map(Into::into).collect(),
            last_error: None,
        }
    }

    #[must_use]
    pub fn joined_output(&self) -> String {
        self.output_lines.join("\n")
    }
}

impl HostIo for CapturingIo {
    fn output(&mut self, line: &str) {
        self.output_lines.push(line.to_owned());
    }

    fn read_line(&mut self) -> String {
        self.input_lines.pop_front().unwrap_or_default()
    }

    fn report_error(&mut self, err: &InterpError) {
        self.last_error = Some(err.clone());
    }
}
