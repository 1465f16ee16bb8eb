//! Log formatting that stamps every line with the simulation tick it was emitted on.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use time::macros::format_description;
use time::{format_description::FormatItem, OffsetDateTime};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields};
use tracing_subscriber::registry::LookupSpan;

/// Number of simulation ticks run so far, across every game in the process.
static SIM_TICKS: AtomicU64 = AtomicU64::new(0);

/// Only the low 24 bits are shown; at 60 ticks per second that wraps after about three days.
const TICK_DISPLAY_MASK: u64 = 0xFF_FFFF;

const TIMESTAMP_FORMAT: &[FormatItem<'static>] = format_description!("[hour]:[minute]:[second].[subsecond digits:4]");

/// ANSI styles used by [`TickFormatter`].
#[derive(Clone, Copy)]
enum Style {
    Dim,
    Bold,
    Level(Level),
}

impl Style {
    fn code(self) -> &'static str {
        match self {
            Style::Dim => "2",
            Style::Bold => "1",
            Style::Level(Level::TRACE) => "35",
            Style::Level(Level::DEBUG) => "34",
            Style::Level(Level::INFO) => "32",
            Style::Level(Level::WARN) => "33",
            Style::Level(Level::ERROR) => "31",
        }
    }

    fn paint(self, writer: &mut Writer<'_>, value: impl fmt::Display) -> fmt::Result {
        if writer.has_ansi_escapes() {
            write!(writer, "\x1b[{}m{}\x1b[0m", self.code(), value)
        } else {
            write!(writer, "{}", value)
        }
    }
}

/// Formats events as `time tick level spans target: fields`, with the tick in hexadecimal.
pub struct TickFormatter;

impl<S, N> FormatEvent<S, N> for TickFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let meta = event.metadata();

        let timestamp = OffsetDateTime::now_utc().format(&TIMESTAMP_FORMAT).map_err(|_| fmt::Error)?;
        Style::Dim.paint(&mut writer, timestamp)?;
        writer.write_char(' ')?;

        Style::Dim.paint(&mut writer, format_args!("t{:06X}", tick_count() & TICK_DISPLAY_MASK))?;
        writer.write_char(' ')?;

        Style::Level(*meta.level()).paint(&mut writer, format_args!("{:>5}", meta.level().as_str()))?;
        writer.write_char(' ')?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                Style::Bold.paint(&mut writer, span.metadata().name())?;
                if let Some(fields) = span.extensions().get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{}}}", fields)?;
                    }
                }
                writer.write_char(':')?;
            }
            writer.write_char(' ')?;
        }

        Style::Dim.paint(&mut writer, format_args!("{}:", meta.target()))?;
        writer.write_char(' ')?;

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Advances the tick shown in log lines. Called once per simulated tick.
pub fn increment_tick() {
    SIM_TICKS.fetch_add(1, Ordering::Relaxed);
}

pub fn tick_count() -> u64 {
    SIM_TICKS.load(Ordering::Relaxed)
}
