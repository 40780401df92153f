//! Colored log output
//!
//! Each line carries the time, the running command and the level:
//! `14:02:11 [ORGANIZE] INFO  created a video at ...`. Colors are dropped
//! when stderr is not a terminal, e.g. when logs are redirected to a file.

use owo_colors::{OwoColorize, Style};
use std::fmt;
use std::io::{self, IsTerminal};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::{
    format::{FormatEvent, FormatFields, Writer},
    FmtContext,
};
use tracing_subscriber::registry::LookupSpan;

/// Command identifier for prefixing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Setup,
    Organize,
    Status,
    Check,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Setup => "SETUP",
            Component::Organize => "ORGANIZE",
            Component::Status => "STATUS",
            Component::Check => "CHECK",
        }
    }
}

/// Level tag padded to a fixed width, with its color
fn level_tag(level: &Level) -> (&'static str, Style) {
    match *level {
        Level::ERROR => ("ERROR", Style::new().red().bold()),
        Level::WARN => ("WARN ", Style::new().yellow().bold()),
        Level::INFO => ("INFO ", Style::new().green().bold()),
        // ffmpeg chatter lands here with --verbose
        _ => ("DEBUG", Style::new().dimmed()),
    }
}

fn paint(text: &str, style: Style, ansi: bool) -> String {
    if ansi {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

/// Formatter writing `time [COMMAND] LEVEL message`
pub struct ColoredFormatter {
    pub component: Component,
    pub ansi: bool,
}

impl ColoredFormatter {
    fn prefix(&self, level: &Level) -> String {
        let time = chrono::Local::now().format("%H:%M:%S").to_string();
        let component = format!("[{:8}]", self.component.as_str());
        let (tag, tag_style) = level_tag(level);
        format!(
            "{} {} {} ",
            paint(&time, Style::new().dimmed(), self.ansi),
            paint(&component, Style::new().cyan().bold(), self.ansi),
            paint(tag, tag_style, self.ansi)
        )
    }
}

impl<S, N> FormatEvent<S, N> for ColoredFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(writer, "{}", self.prefix(event.metadata().level()))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Initialize logging for the given command
///
/// Logs go to stderr so stdout stays clean for `status --json`.
/// `RUST_LOG` directives still apply on top of the chosen level.
pub fn init_component_logger(component: Component, verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let ansi = io::stderr().is_terminal();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .event_format(ColoredFormatter { component, ansi })
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
