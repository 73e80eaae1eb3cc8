use std::collections::BTreeMap;

use colored::{Color, ColoredString, Colorize};
use crossterm::terminal;

use crate::bench::{ResultsTable, Verdict};

#[macro_export]
macro_rules! print_success {
    ($fmt:literal, $($e:tt)*) => {
        use ::colored::Colorize as _;
        println!("{}", format!($fmt, $($e)*).green())
    }
}

pub fn is_truecolor_supported() -> bool {
    let Ok(v) = std::env::var("COLORTERM") else {
        return false
    };
    matches!(v.as_str(), "truecolor" | "24bit")
}

pub trait ColorTheme {
    fn color(&self) -> Color;
}

impl ColorTheme for log::Level {
    fn color(&self) -> Color {
        use log::Level::*;
        match self {
            Error => Color::BrightRed,
            Warn => Color::BrightYellow,
            Info => Color::Cyan,
            Debug => Color::Magenta,
            Trace => Color::Blue,
        }
    }
}

impl ColorTheme for Verdict {
    fn color(&self) -> Color {
        use Verdict::*;
        if !self::is_truecolor_supported() {
            return match self {
                Success => Color::Green,
                Timeout => Color::Red,
                ProcessFailed(_) => Color::Magenta,
                ToolUnavailable => Color::BrightBlack,
                CompileFailed => Color::Yellow,
            };
        }

        match self {
            Success => Color::TrueColor {
                r: 30,
                g: 180,
                b: 40,
            },
            Timeout => Color::TrueColor {
                r: 220,
                g: 42,
                b: 42,
            },
            ProcessFailed(_) => Color::TrueColor {
                r: 171,
                g: 40,
                b: 200,
            },
            ToolUnavailable => Color::TrueColor {
                r: 110,
                g: 110,
                b: 110,
            },
            CompileFailed => Color::TrueColor {
                r: 210,
                g: 138,
                b: 4,
            },
        }
    }
}

/// Padded so that badges line up in a column.
pub fn verdict_badge(verdict: Verdict) -> ColoredString {
    let fg = if is_truecolor_supported() {
        Color::TrueColor {
            r: 255,
            g: 255,
            b: 255,
        }
    } else {
        Color::BrightBlack
    };
    format!(" {:<3} ", verdict.code())
        .on_color(verdict.color())
        .bold()
        .color(fg)
}

pub fn horizontal_rule() -> ColoredString {
    let (cols, _) = terminal::size().unwrap_or((40, 40));
    "━".repeat(cols as usize).blue().bold()
}

/// Count of cells per verdict, over both dimensions of every pair.
pub fn count_verdicts(table: &ResultsTable) -> BTreeMap<&'static str, usize> {
    let mut count = BTreeMap::new();
    for row in table.cases().iter().flat_map(|t| t.rows()) {
        for stat in [&row.cycle, &row.hanoi] {
            *count.entry(stat.verdict().code()).or_default() += 1;
        }
    }
    count
}

/// Printed to stderr so that a report on stdout stays machine-readable.
pub fn print_bench_summary(table: &ResultsTable) {
    let bar = "-".repeat(5);
    eprint!("{} ", bar);

    let count = self::count_verdicts(table);
    let num_total = count.values().sum::<usize>();
    let num_measured = count.get(Verdict::Success.code()).copied().unwrap_or(0);

    if num_measured == num_total {
        eprint!("{}", format!("All {} measurements succeeded", num_total).green());
    } else {
        let detail = count
            .iter()
            .filter(|(&code, _)| code != Verdict::Success.code())
            .map(|(code, cnt)| {
                format!(
                    "{}{}{}",
                    code.bright_red().bold(),
                    "x".dimmed(),
                    cnt.to_string().bold().bright_white(),
                )
            })
            .collect::<Vec<String>>()
            .join(", ");
        eprint!(
            "{} ({})",
            format!("{}/{} measurements dead", num_total - num_measured, num_total)
                .bright_red(),
            detail
        );
    }

    eprintln!(" {}", bar);
}
