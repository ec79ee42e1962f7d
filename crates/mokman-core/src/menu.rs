//! Cursor-driven menu engine.
//!
//! A menu is a list of coloured rows, each carrying a typed action or
//! nothing at all; a row without an action exits the menu ("Continue
//! boot", "Exit", ".."). The engine owns only the interaction loop and is
//! generic over the context the activations run against, so the screens
//! decide what an action means.
//!
//! The top menu runs with a wall-clock countdown that auto-exits; any
//! keystroke cancels the countdown for the rest of the menu's life.

use mokman_efi::console::chars;
use mokman_efi::{Colour, Console, ScanCode};

/// Context a menu runs against: anything that can lend the console.
pub trait HasConsole {
    fn console(&mut self) -> &mut dyn Console;
}

/// One menu row.
#[derive(Debug)]
pub struct MenuItem<A> {
    pub label: String,
    pub colour: Colour,
    /// `None` marks an exit row.
    pub action: Option<A>,
}

impl<A> MenuItem<A> {
    pub fn new(label: impl Into<String>, colour: Colour, action: A) -> Self {
        Self {
            label: label.into(),
            colour,
            action: Some(action),
        }
    }

    pub fn exit(label: impl Into<String>, colour: Colour) -> Self {
        Self {
            label: label.into(),
            colour,
            action: None,
        }
    }
}

/// How a menu invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOutcome {
    /// An exit row was activated.
    Exited,
    /// The countdown ran out with no key pressed.
    TimedOut,
}

/// Rows between the top of the screen and the first item (title + blank).
const HEADER_ROWS: usize = 2;

/// Runs the menu until an exit row is chosen or the countdown lapses.
///
/// Cursor up/down move the highlight (clamped); Enter activates. After an
/// action runs the menu is redrawn with the highlight back on the first
/// row. `timeout_secs` of zero means no countdown.
pub fn run<Ctx, A, F>(
    ctx: &mut Ctx,
    title: &str,
    items: &[MenuItem<A>],
    timeout_secs: u32,
    mut activate: F,
) -> MenuOutcome
where
    Ctx: HasConsole,
    F: FnMut(&mut Ctx, &A),
{
    let mut pos = 0usize;
    let mut timeout = timeout_secs;

    loop {
        draw(ctx.console(), title, items, pos, timeout);

        let key = if timeout > 0 {
            match ctx.console().poll_key(1000) {
                None => {
                    timeout -= 1;
                    if timeout == 0 {
                        return MenuOutcome::TimedOut;
                    }
                    continue;
                }
                Some(key) => {
                    // First keystroke cancels the countdown for good.
                    timeout = 0;
                    key
                }
            }
        } else {
            ctx.console().read_key()
        };

        match key.scan {
            ScanCode::Up => {
                pos = pos.saturating_sub(1);
                continue;
            }
            ScanCode::Down => {
                if pos + 1 < items.len() {
                    pos += 1;
                }
                continue;
            }
            _ => {}
        }

        if key.unicode == chars::CARRIAGE_RETURN || key.unicode == chars::LINEFEED {
            match &items[pos].action {
                None => return MenuOutcome::Exited,
                Some(action) => {
                    activate(ctx, action);
                    pos = 0;
                }
            }
        }
    }
}

fn draw<A>(con: &mut dyn Console, title: &str, items: &[MenuItem<A>], pos: usize, timeout: u32) {
    con.clear();
    con.set_colour(Colour::White);
    con.write(&format!("{title}\n\n"));
    for item in items {
        con.set_colour(item.colour);
        con.write(&format!("  {}\n", item.label));
    }
    con.set_colour(Colour::White);
    if timeout > 0 {
        con.set_cursor(0, items.len() + 1 + HEADER_ROWS);
        if timeout == 1 {
            con.write("Booting in 1 second\n");
        } else {
            con.write(&format!("Booting in {timeout} seconds\n"));
        }
    }
    con.set_cursor(0, pos + HEADER_ROWS);
    con.enable_cursor(true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use mokman_efi::Key;
    use mokman_efi::sim::SimConsole;

    struct Ctx {
        con: SimConsole,
        hits: Vec<&'static str>,
    }

    impl HasConsole for Ctx {
        fn console(&mut self) -> &mut dyn Console {
            &mut self.con
        }
    }

    fn ctx() -> Ctx {
        Ctx {
            con: SimConsole::new(),
            hits: Vec::new(),
        }
    }

    fn items() -> Vec<MenuItem<&'static str>> {
        vec![
            MenuItem::exit("Continue boot", Colour::White),
            MenuItem::new("Enroll MOK", Colour::White, "enroll"),
            MenuItem::new("Delete MOK", Colour::White, "delete"),
        ]
    }

    #[test]
    fn test_timeout_exits_after_ten_ticks() {
        let mut ctx = ctx();
        let items = items();
        let outcome = run(&mut ctx, "title", &items, 10, |ctx, &a| ctx.hits.push(a));
        assert_eq!(outcome, MenuOutcome::TimedOut);
        assert!(ctx.hits.is_empty());
        // One redraw per countdown second.
        assert_eq!(ctx.con.clear_count(), 10);
        assert!(ctx.con.contains("Booting in 10 seconds"));
        assert!(ctx.con.contains("Booting in 1 second"));
    }

    #[test]
    fn test_key_press_cancels_countdown() {
        let mut ctx = ctx();
        ctx.con.script_scan(ScanCode::Down);
        ctx.con.script_keys([Key::enter()]);
        // Script ends; the sim console then feeds Enter on the highlight,
        // which has been reset to the exit row.
        let items = items();
        let outcome = run(&mut ctx, "title", &items, 10, |ctx, &a| ctx.hits.push(a));
        assert_eq!(outcome, MenuOutcome::Exited);
        assert_eq!(ctx.hits, vec!["enroll"]);
        assert!(!ctx.con.contains("Booting in 9 seconds"));
    }

    #[test]
    fn test_highlight_clamps() {
        {
            let mut ctx = ctx();
            for _ in 0..5 {
                ctx.con.script_scan(ScanCode::Down);
            }
            ctx.con.script_keys([Key::enter()]);
            // Highlight pinned to the last row despite extra Downs.
            let items = items();
            run(&mut ctx, "title", &items, 0, |ctx, &a| ctx.hits.push(a));
            assert_eq!(ctx.hits, vec!["delete"]);
        }

        let mut ctx2 = ctx();
        ctx2.con.script_scan(ScanCode::Up);
        ctx2.con.script_keys([Key::enter()]);
        let items2 = items();
        let outcome = run(&mut ctx2, "title", &items2, 0, |ctx, &a| ctx.hits.push(a));
        assert_eq!(outcome, MenuOutcome::Exited);
        assert!(ctx2.hits.is_empty());
    }

    #[test]
    fn test_other_keys_ignored() {
        let mut ctx = ctx();
        ctx.con.script_text("zq");
        ctx.con.script_keys([Key::enter()]);
        let items = items();
        let outcome = run(&mut ctx, "title", &items, 0, |ctx, &a| ctx.hits.push(a));
        assert_eq!(outcome, MenuOutcome::Exited);
        assert!(ctx.hits.is_empty());
    }

    #[test]
    fn test_highlight_resets_after_activation() {
        let mut ctx = ctx();
        ctx.con.script_scan(ScanCode::Down);
        ctx.con.script_keys([Key::enter()]);
        ctx.con.script_keys([Key::enter()]);
        let items = items();
        let outcome = run(&mut ctx, "title", &items, 0, |ctx, &a| ctx.hits.push(a));
        // Second Enter lands on the exit row, not "Enroll MOK" again.
        assert_eq!(outcome, MenuOutcome::Exited);
        assert_eq!(ctx.hits, vec!["enroll"]);
    }
}
