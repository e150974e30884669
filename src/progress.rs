//! Progress reporter fed by per-request completion signals.
use std::io::{IsTerminal, Write};
use std::time::Duration;

use crossterm::{
    cursor, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::metrics::ProgressSignal;

/// Minimum time between two redraws of the progress line.
const RENDER_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
pub struct ProgressOptions {
    pub enabled: bool,
    pub no_color: bool,
}

impl Default for ProgressOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            no_color: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressTally {
    pub completed: usize,
    pub failed: usize,
}

/// Counts completion signals until `total` is reached or the channel closes.
///
/// Rendering happens on stderr only when enabled and stderr is a terminal;
/// signals are drained either way so senders never block.
#[must_use]
pub fn setup_progress_reporter(
    total: usize,
    options: ProgressOptions,
    mut progress_rx: mpsc::UnboundedReceiver<ProgressSignal>,
) -> JoinHandle<ProgressTally> {
    let render = options.enabled && std::io::stderr().is_terminal();
    let style = ProgressStyle::new(30);

    tokio::spawn(async move {
        let mut tally = ProgressTally::default();
        let mut last_render: Option<Instant> = None;

        while let Some(signal) = progress_rx.recv().await {
            tally.completed = tally.completed.saturating_add(1);
            if signal == ProgressSignal::Failure {
                tally.failed = tally.failed.saturating_add(1);
            }
            let done = tally.completed >= total;

            if render {
                let due = last_render.is_none_or(|at| at.elapsed() >= RENDER_INTERVAL);
                if (due || done)
                    && render_progress_line(&style, tally, total, options.no_color).is_ok()
                {
                    last_render = Some(Instant::now());
                }
            }
            if done {
                break;
            }
        }

        if render {
            drop(finish_progress_line(tally, total));
        }
        tally
    })
}

fn render_progress_line(
    style: &ProgressStyle,
    tally: ProgressTally,
    total: usize,
    no_color: bool,
) -> Result<(), std::io::Error> {
    let line = build_progress_line(style, tally, total, no_color);

    let mut out = std::io::stderr();
    queue!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))?;
    for segment in line {
        if let Some(color) = segment.color {
            queue!(
                out,
                SetForegroundColor(color),
                Print(&segment.text),
                ResetColor
            )?;
        } else {
            queue!(out, Print(&segment.text))?;
        }
    }
    out.flush()?;
    Ok(())
}

fn finish_progress_line(tally: ProgressTally, total: usize) -> Result<(), std::io::Error> {
    let mut out = std::io::stderr();
    out.write_all(b"\n")?;
    if tally.completed >= total {
        out.write_all(b"All requests completed.\n")?;
    }
    out.flush()?;
    Ok(())
}

fn build_progress_line(
    style: &ProgressStyle,
    tally: ProgressTally,
    total: usize,
    no_color: bool,
) -> Vec<ProgressSegment> {
    let size = style.size.max(1);
    let goal = total.max(1);
    let current = tally.completed.min(goal);

    let current_u128 = u128::from(u64::try_from(current).unwrap_or(u64::MAX));
    let size_u128 = u128::from(u64::try_from(size).unwrap_or(u64::MAX));
    let goal_u128 = u128::from(u64::try_from(goal).unwrap_or(u64::MAX));

    let scaled = current_u128
        .saturating_mul(size_u128)
        .checked_div(goal_u128)
        .unwrap_or(0);
    let complete_size = usize::try_from(scaled).unwrap_or(size).min(size);
    let incomplete_size = size.saturating_sub(complete_size);

    let percent_x100 = current_u128
        .saturating_mul(10_000)
        .checked_div(goal_u128)
        .unwrap_or(0);
    let percent_whole = percent_x100.checked_div(100).unwrap_or(0);
    let percent_frac = percent_x100.checked_rem(100).unwrap_or(0);

    let progress_bar = format!(
        "{}{}{}{}",
        style.begin,
        style.fill.repeat(complete_size),
        style.empty.repeat(incomplete_size),
        style.end
    );
    let count_text = format!(" Progress: {}/{}", current, goal);
    let percent_text = format!(" {}.{:02}%", percent_whole, percent_frac);
    let failed_text = format!(" | {} failed", tally.failed);

    if no_color {
        vec![
            ProgressSegment::plain(progress_bar),
            ProgressSegment::plain(count_text),
            ProgressSegment::plain(percent_text),
            ProgressSegment::plain(failed_text),
        ]
    } else {
        let failed_color = if tally.failed > 0 {
            Color::Red
        } else {
            Color::DarkGrey
        };
        vec![
            ProgressSegment::plain(progress_bar),
            ProgressSegment::plain(count_text),
            ProgressSegment::colored(percent_text, Color::Cyan),
            ProgressSegment::colored(failed_text, failed_color),
        ]
    }
}

struct ProgressStyle {
    size: usize,
    begin: String,
    end: String,
    fill: String,
    empty: String,
}

impl ProgressStyle {
    fn new(size: usize) -> Self {
        Self {
            size,
            begin: "[".to_owned(),
            end: "]".to_owned(),
            fill: "#".to_owned(),
            empty: "-".to_owned(),
        }
    }
}

struct ProgressSegment {
    text: String,
    color: Option<Color>,
}

impl ProgressSegment {
    const fn plain(text: String) -> Self {
        Self { text, color: None }
    }

    const fn colored(text: String, color: Color) -> Self {
        Self {
            text,
            color: Some(color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(tally: ProgressTally, total: usize) -> String {
        build_progress_line(&ProgressStyle::new(10), tally, total, true)
            .into_iter()
            .map(|segment| segment.text)
            .collect()
    }

    fn run_async_test<F>(future: F) -> Result<(), String>
    where
        F: std::future::Future<Output = Result<(), String>>,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| format!("Failed to build runtime: {}", err))?;
        runtime.block_on(future)
    }

    #[test]
    fn progress_line_shows_counts_and_failures() -> Result<(), String> {
        let text = line_text(
            ProgressTally {
                completed: 5,
                failed: 2,
            },
            10,
        );
        let expected = "[#####-----] Progress: 5/10 50.00% | 2 failed";
        if text != expected {
            return Err(format!("Unexpected line '{}'", text));
        }
        Ok(())
    }

    #[test]
    fn progress_line_clamps_to_total() -> Result<(), String> {
        let text = line_text(
            ProgressTally {
                completed: 12,
                failed: 0,
            },
            10,
        );
        if !text.starts_with("[##########] Progress: 10/10 100.00%") {
            return Err(format!("Unexpected line '{}'", text));
        }
        Ok(())
    }

    #[test]
    fn reporter_counts_failures_and_stops_at_total() -> Result<(), String> {
        run_async_test(async {
            let (progress_tx, progress_rx) = mpsc::unbounded_channel();
            let handle = setup_progress_reporter(3, ProgressOptions::default(), progress_rx);
            for signal in [
                ProgressSignal::Response,
                ProgressSignal::Failure,
                ProgressSignal::Response,
            ] {
                progress_tx
                    .send(signal)
                    .map_err(|err| format!("send failed: {}", err))?;
            }
            let tally = handle
                .await
                .map_err(|err| format!("reporter join failed: {}", err))?;
            if tally
                != (ProgressTally {
                    completed: 3,
                    failed: 1,
                })
            {
                return Err(format!("Unexpected tally {:?}", tally));
            }
            Ok(())
        })
    }

    #[test]
    fn reporter_returns_partial_tally_when_channel_closes() -> Result<(), String> {
        run_async_test(async {
            let (progress_tx, progress_rx) = mpsc::unbounded_channel();
            let handle = setup_progress_reporter(10, ProgressOptions::default(), progress_rx);
            progress_tx
                .send(ProgressSignal::Failure)
                .map_err(|err| format!("send failed: {}", err))?;
            drop(progress_tx);
            let tally = handle
                .await
                .map_err(|err| format!("reporter join failed: {}", err))?;
            if tally.completed != 1 || tally.failed != 1 {
                return Err(format!("Unexpected tally {:?}", tally));
            }
            Ok(())
        })
    }
}
