use std::fmt;
use std::io::IsTerminal;

use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use crate::config::types::LogFormat;

/// Event formatter adding a colored [ALLOW]/[DENY] tag derived from the message
/// and highlighting known field names.
pub struct PrefixedFormatter<E> {
    inner: E,
    ansi: bool,
}

impl<E> PrefixedFormatter<E> {
    pub fn new(inner: E, ansi: bool) -> Self {
        Self { inner, ansi }
    }
}

impl<S, N, E> FormatEvent<S, N> for PrefixedFormatter<E>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
    E: FormatEvent<S, N>,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut visitor = MessageVisitor {
            message: String::new(),
        };
        event.record(&mut visitor);
        let msg_lower = visitor.message.to_lowercase();

        if is_deny_pattern(&msg_lower) {
            if self.ansi {
                write!(writer, "\x1b[31m[DENY]\x1b[0m ")?;
            } else {
                write!(writer, "[DENY] ")?;
            }
        } else if is_allow_pattern(&msg_lower) {
            if self.ansi {
                write!(writer, "\x1b[34m[ALLOW]\x1b[0m ")?;
            } else {
                write!(writer, "[ALLOW] ")?;
            }
        }

        if self.ansi {
            let mut buf = String::new();
            let buf_writer = Writer::new(&mut buf);
            self.inner.format_event(ctx, buf_writer, event)?;
            let colorized = colorize_fields(&buf);
            write!(writer, "{}", colorized)?;
            Ok(())
        } else {
            self.inner.format_event(ctx, writer, event)
        }
    }
}

/// Colorize known field names in a log line.
fn colorize_fields(line: &str) -> String {
    let mut result = line.to_string();
    for (field, color) in FIELD_COLORS {
        let pattern = format!("{}=", field);
        if result.contains(&pattern) {
            let colored = format!("\x1b[{}m{}=\x1b[0m", color, field);
            result = result.replace(&pattern, &colored);
        }
    }
    result
}

/// Field name to ANSI color code.
const FIELD_COLORS: &[(&str, &str)] = &[
    ("user", "36"),
    ("algorithm", "33"),
    ("fingerprint", "33"),
    ("peer", "35"),
    ("conn_id", "2"),
    ("channel", "2"),
    ("keys", "32"),
    ("error", "31"),
];

/// Visitor that extracts the message field from a tracing event.
struct MessageVisitor {
    message: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

fn is_deny_pattern(msg: &str) -> bool {
    msg.contains("denied")
        || msg.contains("rejected")
        || msg.contains("blacklisted")
}

fn is_allow_pattern(msg: &str) -> bool {
    msg.contains("auth success") || msg.contains("report written")
}

/// Initialize the global tracing subscriber.
///
/// Pretty mode wraps the default formatter with `PrefixedFormatter`; JSON mode
/// uses the stock JSON formatter.
pub fn setup_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
        LogFormat::Pretty => {
            let ansi = std::io::stdout().is_terminal();
            let default_format = tracing_subscriber::fmt::format::Format::default();
            tracing_subscriber::fmt()
                .event_format(PrefixedFormatter::new(default_format, ansi))
                .with_env_filter(filter)
                .init();
        }
    }
}
