//! Text-mode plot surface.

use std::fmt::Write as _;
use std::io::Write;

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Color, Stylize};
use crossterm::terminal::{Clear, ClearType};
use probviz::context::UiScale;
use probviz_experiments::plot::{series_color, Axis, PlotFrame, PlotSurface, SeriesKind};

const MARKS: [char; 6] = ['*', '+', 'o', 'x', '#', '@'];

/// Renders frames onto a character grid and writes them to `out`.
pub struct TextPlot<W: Write> {
    out: W,
    width: usize,
    height: usize,
    /// Clear the terminal before every frame.
    clear: bool,
    color: bool,
    /// Raw terminal mode: lines end in CR LF.
    raw: bool,
    /// Lines written under every screen.
    footer: Vec<String>,
    frames: u64,
}

impl<W: Write> TextPlot<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            width: 72,
            height: 20,
            clear: false,
            color: false,
            raw: false,
            footer: Vec::new(),
            frames: 0,
        }
    }

    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width.max(8);
        self.height = height.max(4);
        self
    }

    /// Grows the plot area by the interface scale; `Auto` keeps the size.
    pub fn with_scale(self, scale: UiScale) -> Self {
        match scale.factor() {
            Some(f) => {
                let (w, h) = (self.width as f32 * f, self.height as f32 * f);
                self.with_size(w.round() as usize, h.round() as usize)
            }
            None => self,
        }
    }

    pub fn with_raw_mode(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    pub fn set_footer(&mut self, lines: Vec<String>) {
        self.footer = lines;
    }

    /// Enables screen clearing and colored marks.
    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.clear = ansi;
        self.color = ansi;
        self
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn render(&self, frame: &PlotFrame, dark: bool) -> String {
        let (w, h) = (self.width, self.height);
        let mut grid = vec![vec![(' ', None::<usize>); w]; h];

        let (x0, x1) = frame.x_range;
        let (y0, y1) = frame.y_range;
        let col = |x: f64| -> Option<usize> {
            let t = (x - x0) / (x1 - x0);
            (t.is_finite() && (0.0..=1.0).contains(&t))
                .then(|| ((t * (w - 1) as f64).round()) as usize)
        };
        let row = |y: f64| -> Option<usize> {
            let t = (y - y0) / (y1 - y0);
            (t.is_finite() && (0.0..=1.0).contains(&t))
                .then(|| h - 1 - ((t * (h - 1) as f64).round()) as usize)
        };

        for line in &frame.reference_lines {
            match line.axis {
                Axis::Horizontal => {
                    if let Some(r) = row(line.value) {
                        grid[r].iter_mut().for_each(|cell| *cell = ('-', None));
                    }
                }
                Axis::Vertical => {
                    if let Some(c) = col(line.value) {
                        grid.iter_mut().for_each(|r| r[c] = (':', None));
                    }
                }
            }
        }

        let base = row(y0.max(0.0).min(y1)).unwrap_or(h - 1);
        for (i, series) in frame.series.iter().enumerate() {
            let mark = MARKS[i % MARKS.len()];
            for &(x, y) in &series.points {
                let (Some(c), Some(r)) = (col(x), row(y.clamp(y0, y1))) else {
                    continue;
                };
                if series.kind == SeriesKind::Bars {
                    let (top, bottom) = (r.min(base), r.max(base));
                    for cell in grid.iter_mut().take(bottom + 1).skip(top) {
                        cell[c] = ('|', Some(i));
                    }
                }
                grid[r][c] = (mark, Some(i));
            }
        }

        let mut out = String::new();
        let _ = writeln!(out, "{}", frame.title);
        for (r, cells) in grid.iter().enumerate() {
            let label = match r {
                0 => format!("{y1:>9.3}"),
                _ if r == h - 1 => format!("{y0:>9.3}"),
                _ => " ".repeat(9),
            };
            let _ = write!(out, "{label} |");
            for &(ch, series) in cells {
                match series.filter(|_| self.color) {
                    Some(i) => {
                        let _ = write!(out, "{}", ch.with(palette_color(i, dark)));
                    }
                    None => out.push(ch),
                }
            }
            out.push('\n');
        }
        let _ = writeln!(out, "{} +{}", " ".repeat(9), "-".repeat(w));
        let _ = writeln!(
            out,
            "{}  {:<half$}{:>half$}",
            " ".repeat(9),
            format!("{x0:.3}"),
            format!("{x1:.3}"),
            half = w / 2
        );
        let _ = writeln!(out, "{}  x: {}   y: {}", " ".repeat(9), frame.x_label, frame.y_label);
        for (i, series) in frame.series.iter().enumerate() {
            let _ = writeln!(out, "  {} {}", MARKS[i % MARKS.len()], series.label);
        }
        for line in &frame.reference_lines {
            let mark = if line.axis == Axis::Horizontal { '-' } else { ':' };
            let _ = writeln!(out, "  {mark} {} ({:.4})", line.label, line.value);
        }
        for note in &frame.notes {
            let _ = writeln!(out, "  {note}");
        }
        out
    }
}

fn palette_color(series: usize, dark: bool) -> Color {
    let hex = series_color(series, dark).trim_start_matches('#');
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
            .unwrap_or(255)
    };
    Color::Rgb {
        r: channel(0),
        g: channel(2),
        b: channel(4),
    }
}

impl<W: Write> TextPlot<W> {
    /// Replaces the screen with plain text followed by the footer.
    pub fn show_text(&mut self, text: &str) {
        self.present(format!("{}\n", text.trim_end()));
    }

    fn present(&mut self, mut text: String) {
        for line in &self.footer {
            text.push_str(line);
            text.push('\n');
        }
        if self.raw {
            text = text.replace('\n', "\r\n");
        }
        let mut paint = || -> std::io::Result<()> {
            if self.clear {
                queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
            }
            write!(self.out, "{text}")?;
            self.out.flush()
        };
        // A closed stdout only loses the picture, the run itself continues.
        let _ = paint();
    }
}

impl<W: Write> PlotSurface for TextPlot<W> {
    fn redraw(&mut self, frame: &PlotFrame, dark: bool) {
        let text = self.render(frame, dark);
        self.present(text);
        self.frames += 1;
    }
}
