//! Surface: RAII ownership of the terminal while the board is live.

use std::io::{self, Write};

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::board::FRAME_HEIGHT;

/// Terminal state held for the lifetime of the viewer.
///
/// Entering hides the cursor and, optionally, switches to the alternate
/// screen. Dropping restores both, on every exit path. Raw mode is never
/// enabled, so Ctrl+C still reaches the process as a signal.
pub struct Surface {
    alternate_screen: bool,
    released: bool,
}

impl Surface {
    /// Take over stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal rejects the setup sequences.
    pub fn enter(alternate_screen: bool) -> io::Result<Self> {
        let mut stdout = io::stdout();
        if alternate_screen {
            execute!(stdout, EnterAlternateScreen)?;
        }
        execute!(stdout, cursor::Hide, Clear(ClearType::All), cursor::MoveTo(0, 0))?;
        Ok(Self {
            alternate_screen,
            released: false,
        })
    }

    /// Restore the terminal now instead of at drop.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let mut stdout = io::stdout();
        let _ = execute!(stdout, crossterm::style::ResetColor, cursor::Show);
        if self.alternate_screen {
            let _ = execute!(stdout, LeaveAlternateScreen);
        } else {
            // Leave the last frame visible and put the prompt below it.
            let _ = execute!(stdout, cursor::MoveTo(0, FRAME_HEIGHT));
            let _ = writeln!(stdout);
        }
        let _ = stdout.flush();
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        self.release();
    }
}
