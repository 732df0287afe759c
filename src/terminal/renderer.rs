//! Renderer: Repaints the board in place at a bounded rate.
//!
//! The renderer owns a pair of frames. `update` paints the next frame and
//! marks it pending; the pending frame is diffed against the visible one
//! and flushed in a single write once the refresh slot comes due. Updates
//! that arrive faster than the refresh rate are coalesced, so a burst of
//! messages costs one repaint.
//!
//! It runs on the coordinator's thread; there is no render thread.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::board::{BoardView, FRAME_HEIGHT, FRAME_WIDTH};
use crate::buffer::diff::{render_diff, render_full, DiffState};
use crate::buffer::Buffer;

/// Minimum spacing between repaints.
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    /// Allow at most `per_second` repaints per second. Zero disables throttling.
    pub fn per_second(per_second: u32) -> Self {
        let interval = if per_second == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(1) / per_second
        };
        Self {
            interval,
            last: None,
        }
    }

    /// Minimum spacing between repaints.
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Time until the next repaint is allowed, zero if allowed now.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.last.map_or(Duration::ZERO, |last| {
            self.interval.saturating_sub(now.saturating_duration_since(last))
        })
    }

    /// Whether a repaint is allowed at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.remaining(now).is_zero()
    }

    /// Record a repaint at `now`.
    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }
}

/// Render statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frames written to the terminal.
    pub frames: u64,
    /// Updates folded into a later frame by the throttle.
    pub coalesced: u64,
    /// Cells rewritten across all frames.
    pub cells_changed: u64,
    /// Bytes written to the terminal.
    pub bytes_written: u64,
}

/// Throttled, double-buffered board renderer writing to `W`.
pub struct Renderer<W: Write> {
    out: W,
    current: Buffer,
    next: Buffer,
    diff_state: DiffState,
    output: Vec<u8>,
    throttle: Throttle,
    pending: bool,
    needs_full_redraw: bool,
    stats: RenderStats,
}

impl<W: Write> Renderer<W> {
    /// Create a renderer writing to `out`, repainting at most
    /// `refresh_per_second` times per second.
    pub fn new(out: W, refresh_per_second: u32) -> Self {
        Self {
            out,
            current: Buffer::new(FRAME_WIDTH, FRAME_HEIGHT),
            next: Buffer::new(FRAME_WIDTH, FRAME_HEIGHT),
            diff_state: DiffState::new(),
            output: Vec::with_capacity(4096),
            throttle: Throttle::per_second(refresh_per_second),
            pending: false,
            needs_full_redraw: true,
            stats: RenderStats::default(),
        }
    }

    /// Stage `view` for display and repaint if the refresh slot is open.
    pub fn update(&mut self, view: &BoardView) {
        if self.pending {
            self.stats.coalesced += 1;
        }
        self.next.clear();
        view.paint(&mut self.next);
        self.pending = true;
        self.tick();
    }

    /// Repaint a staged frame if its slot has come due.
    pub fn tick(&mut self) {
        let now = Instant::now();
        if self.pending && self.throttle.is_due(now) {
            self.flush(now);
        }
    }

    /// Repaint a staged frame immediately, ignoring the throttle.
    pub fn flush_now(&mut self) {
        if self.pending {
            self.flush(Instant::now());
        }
    }

    /// How long until a staged frame can be shown, `None` if nothing is staged.
    pub fn pending_for(&self) -> Option<Duration> {
        self.pending.then(|| self.throttle.remaining(Instant::now()))
    }

    /// The frame currently on screen.
    pub const fn visible(&self) -> &Buffer {
        &self.current
    }

    /// Render statistics.
    pub const fn stats(&self) -> RenderStats {
        self.stats
    }

    /// The underlying writer.
    pub const fn get_ref(&self) -> &W {
        &self.out
    }

    fn flush(&mut self, now: Instant) {
        self.output.clear();
        if self.needs_full_redraw {
            render_full(&self.next, &mut self.output, &mut self.diff_state);
            self.needs_full_redraw = false;
        } else {
            let result = render_diff(
                &self.current,
                &self.next,
                &mut self.output,
                &mut self.diff_state,
            );
            self.stats.cells_changed += result.cells_changed as u64;
        }

        if !self.output.is_empty() {
            // The terminal is best effort; a failed write forces a clean
            // repaint next time instead of diffing against an unknown screen.
            if let Err(e) = self.write_output() {
                debug!(error = %e, "terminal write failed");
                self.needs_full_redraw = true;
            }
        }

        self.current.copy_from(&self.next);
        self.pending = false;
        self.throttle.mark(now);
        self.stats.frames += 1;
        self.stats.bytes_written += self.output.len() as u64;
    }

    fn write_output(&mut self) -> io::Result<()> {
        self.out.write_all(&self.output)?;
        self.out.flush()
    }
}
