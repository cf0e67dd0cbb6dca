//! Rendering helpers for widget tests.

use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;

use crate::components::Component;

pub const TEST_WIDTH: u16 = 80;
pub const TEST_HEIGHT: u16 = 24;

/// Wrapper around a `TestBackend` terminal.
pub struct TestTerminal {
    pub terminal: Terminal<TestBackend>,
}

impl TestTerminal {
    pub fn new() -> Self {
        Self::with_size(TEST_WIDTH, TEST_HEIGHT)
    }

    pub fn with_size(width: u16, height: u16) -> Self {
        let backend = TestBackend::new(width, height);
        let terminal = Terminal::new(backend).expect("Failed to create test terminal");
        Self { terminal }
    }

    pub fn render_component<C: Component>(&mut self, component: &C) {
        self.terminal
            .draw(|frame| component.render(frame, frame.area()))
            .expect("Failed to draw");
    }

    pub fn draw_with(&mut self, f: impl FnOnce(&mut ratatui::Frame, Rect)) {
        self.terminal
            .draw(|frame| {
                let area = frame.area();
                f(frame, area)
            })
            .expect("Failed to draw");
    }

    /// Whole buffer as text, one line per row.
    pub fn buffer_to_string(&self) -> String {
        let buffer = self.terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    pub fn buffer_contains(&self, text: &str) -> bool {
        self.buffer_to_string().contains(text)
    }
}
