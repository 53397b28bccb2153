//! Backend-neutral plot frames.
//!
//! A [`PlotFrame`] is a complete redraw instruction: surfaces clear and paint
//! the whole frame every time, so no incremental plot state is kept anywhere.

use serde::Serialize;

/// Series colors, light theme first, cycled by series index.
pub const SERIES_COLORS: [&str; 6] = [
    "#3b82f6", // blue
    "#f59e0b", // amber
    "#22c55e", // green
    "#ef4444", // red
    "#a855f7", // purple
    "#06b6d4", // cyan
];

pub const SERIES_COLORS_DARK: [&str; 6] = [
    "#7aa2ff", "#fbbf24", "#4ade80", "#fb7185", "#a78bfa", "#22d3ee",
];

pub fn series_color(index: usize, dark: bool) -> &'static str {
    let palette = if dark { &SERIES_COLORS_DARK } else { &SERIES_COLORS };
    palette[index % palette.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Line,
    Bars,
    /// Scatter; points are not joined.
    Points,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub kind: SeriesKind,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    pub fn line(label: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.into(),
            kind: SeriesKind::Line,
            points,
        }
    }

    pub fn bars(label: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.into(),
            kind: SeriesKind::Bars,
            points,
        }
    }

    pub fn points(label: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.into(),
            kind: SeriesKind::Points,
            points,
        }
    }

    /// Line through `values`, with x = 1, 2, 3, ... (trial index).
    pub fn indexed(label: impl Into<String>, values: &[f64]) -> Self {
        let points = values
            .iter()
            .enumerate()
            .map(|(i, &v)| ((i + 1) as f64, v))
            .collect();
        Self::line(label, points)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Constant guide line, e.g. a theoretical probability or a critical value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub label: String,
    pub axis: Axis,
    pub value: f64,
}

impl ReferenceLine {
    pub fn horizontal(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            axis: Axis::Horizontal,
            value,
        }
    }

    pub fn vertical(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            axis: Axis::Vertical,
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotFrame {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub series: Vec<Series>,
    pub reference_lines: Vec<ReferenceLine>,
    /// Free-form annotations (computed probabilities, parameter echoes).
    pub notes: Vec<String>,
}

impl PlotFrame {
    pub fn new(title: impl Into<String>, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            x_range: (0.0, 1.0),
            y_range: (0.0, 1.0),
            series: Vec::new(),
            reference_lines: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn with_series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn with_reference(mut self, line: ReferenceLine) -> Self {
        self.reference_lines.push(line);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_ranges(mut self, x_range: (f64, f64), y_range: (f64, f64)) -> Self {
        self.x_range = x_range;
        self.y_range = y_range;
        self
    }

    /// Sets both ranges to the data extent (bars anchored at zero), padding
    /// the y axis by 5%.
    pub fn fit_to_data(mut self) -> Self {
        let mut x = (f64::INFINITY, f64::NEG_INFINITY);
        let mut y = (f64::INFINITY, f64::NEG_INFINITY);
        for s in &self.series {
            if s.kind == SeriesKind::Bars {
                y.0 = y.0.min(0.0);
            }
            for &(px, py) in s.points.iter().filter(|(a, b)| a.is_finite() && b.is_finite()) {
                x = (x.0.min(px), x.1.max(px));
                y = (y.0.min(py), y.1.max(py));
            }
        }
        for r in self.reference_lines.iter().filter(|r| r.value.is_finite()) {
            match r.axis {
                Axis::Horizontal => y = (y.0.min(r.value), y.1.max(r.value)),
                Axis::Vertical => x = (x.0.min(r.value), x.1.max(r.value)),
            }
        }
        if x.0 > x.1 {
            return self;
        }
        if x.0 == x.1 {
            x = (x.0 - 0.5, x.1 + 0.5);
        }
        if y.0 == y.1 {
            y = (y.0 - 0.5, y.1 + 0.5);
        }
        let pad = (y.1 - y.0) * 0.05;
        self.x_range = x;
        self.y_range = (if y.0 == 0.0 { 0.0 } else { y.0 - pad }, y.1 + pad);
        self
    }
}

/// Anything that can display a plot frame.
pub trait PlotSurface {
    /// Clears the surface and paints `frame` in full.
    fn redraw(&mut self, frame: &PlotFrame, dark: bool);
}

/// Evenly spaced points over `[lo, hi]`, both ends included.
pub fn linspace(lo: f64, hi: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (count - 1) as f64;
            (0..count).map(|i| lo + step * i as f64).collect()
        }
    }
}

/// Samples `f` over `[lo, hi]` into a line series.
pub fn curve(label: impl Into<String>, lo: f64, hi: f64, f: impl Fn(f64) -> f64) -> Series {
    let points = linspace(lo, hi, 200).into_iter().map(|x| (x, f(x))).collect();
    Series::line(label, points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexed_series_starts_at_one() {
        let s = Series::indexed("freq", &[1.0, 0.5]);
        assert_eq!(s.points, vec![(1.0, 1.0), (2.0, 0.5)]);
        assert_eq!(s.kind, SeriesKind::Line);
    }

    #[test]
    fn fit_to_data_covers_series_and_references() {
        let frame = PlotFrame::new("t", "x", "y")
            .with_series(Series::bars("pmf", vec![(0.0, 0.2), (4.0, 0.4)]))
            .with_reference(ReferenceLine::vertical("crit", 6.0))
            .fit_to_data();
        assert_eq!(frame.x_range, (0.0, 6.0));
        assert_eq!(frame.y_range.0, 0.0);
        assert!(frame.y_range.1 > 0.4);
    }

    #[test]
    fn empty_frame_keeps_default_ranges() {
        let frame = PlotFrame::new("t", "x", "y").fit_to_data();
        assert_eq!(frame.x_range, (0.0, 1.0));
    }

    #[test]
    fn linspace_includes_both_ends() {
        assert_eq!(linspace(0.0, 1.0, 3), vec![0.0, 0.5, 1.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(curve("c", -1.0, 1.0, |x| x).points.len(), 200);
    }

    #[test]
    fn frames_serialize_with_snake_case_kinds() {
        let frame = PlotFrame::new("t", "x", "y").with_series(Series::bars("b", vec![(1.0, 2.0)]));
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains(r#""kind":"bars""#));
    }
}
