//! Text report written to the client: banner, key table and warning lines.

/// Terminal line ending used for everything written to a session channel.
pub const LINE_END: &str = "\r\n";

pub const BANNER: &str = "The public keys presented by your SSH client are:";
pub const AGENT_WARNING: &str = "WARNING: SSH agent forwarding is enabled";
pub const X11_WARNING: &str = "WARNING: X11 forwarding is enabled";

const HEADER: [&str; 3] = ["Bits", "Type", "Fingerprint"];
const MIN_CELL_WIDTH: usize = 5;
const CELL_PADDING: usize = 2;

/// One table row. `bits` is `None` when the key size could not be computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub bits: Option<usize>,
    pub algorithm: String,
    pub fingerprint: String,
}

impl ReportRow {
    fn cells(&self) -> [String; 3] {
        [
            self.bits
                .map(|b| b.to_string())
                .unwrap_or_else(|| "?".to_string()),
            self.algorithm.clone(),
            self.fingerprint.clone(),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub rows: Vec<ReportRow>,
    pub agent_forwarding: bool,
    pub x11_forwarding: bool,
    /// Fingerprints to call out individually; empty unless client warnings are enabled.
    pub blacklisted: Vec<String>,
}

impl Report {
    /// Full channel output: banner, blank line, table, then warnings.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(BANNER);
        out.push_str(LINE_END);
        out.push_str(LINE_END);
        out.push_str(&self.render_table());

        if self.agent_forwarding {
            out.push_str(AGENT_WARNING);
            out.push_str(LINE_END);
        }
        if self.x11_forwarding {
            out.push_str(X11_WARNING);
            out.push_str(LINE_END);
        }
        for fingerprint in &self.blacklisted {
            out.push_str(&format!("WARNING: key {} is blacklisted", fingerprint));
            out.push_str(LINE_END);
        }
        out
    }

    /// Header plus one aligned line per row.
    pub fn render_table(&self) -> String {
        let mut lines: Vec<[String; 3]> = Vec::with_capacity(self.rows.len() + 1);
        lines.push(HEADER.map(str::to_string));
        lines.extend(self.rows.iter().map(ReportRow::cells));

        let mut widths = [MIN_CELL_WIDTH; 3];
        for line in &lines {
            for (width, cell) in widths.iter_mut().zip(line.iter()) {
                *width = (*width).max(cell.chars().count() + CELL_PADDING);
            }
        }

        let mut out = String::new();
        for line in &lines {
            let mut text = String::new();
            for (cell, width) in line.iter().zip(widths) {
                text.push_str(&format!("{:<width$}", cell, width = width));
            }
            out.push_str(text.trim_end());
            out.push_str(LINE_END);
        }
        out
    }
}
