use std::fmt::Write;

use nu_ansi_term::{Color, Style};
use tract_onnx::prelude::*;

use crate::ranking::Prediction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartOptions {
    /// Width of the longest bar, in characters.
    pub width: usize,
    pub color: bool,
}

impl Default for ChartOptions {
    fn default() -> ChartOptions {
        ChartOptions { width: 40, color: true }
    }
}

/// Number of full cells for a bar, scaled so the most likely class spans the whole width.
fn bar_len(probability: f32, max: f32, width: usize) -> usize {
    if max <= 0.0 {
        return 0;
    }
    ((probability / max) * width as f32).round().clamp(0.0, width as f32) as usize
}

/// Horizontal bar chart of probabilities expressed as percentages.
pub fn bar_chart(predictions: &[Prediction], options: &ChartOptions) -> String {
    let label_width = predictions.iter().map(|p| p.label.chars().count()).max().unwrap_or(0);
    let max = predictions.iter().map(|p| p.probability).fold(0.0, f32::max);
    let mut out = String::new();
    for (ix, p) in predictions.iter().enumerate() {
        let bar = "█".repeat(bar_len(p.probability, max, options.width));
        let style = if !options.color {
            Style::new()
        } else if ix == 0 {
            Color::Green.bold()
        } else {
            Color::Blue.normal()
        };
        let _ = writeln!(
            out,
            "{:>label_width$} │{} {:6.2}%",
            p.label,
            style.paint(bar),
            p.percent()
        );
    }
    out
}

/// Ranked table, one class per line.
pub fn table(predictions: &[Prediction]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>4} {:>5} {:>11}  label", "rank", "id", "probability");
    for (rank, p) in predictions.iter().enumerate() {
        let _ = writeln!(out, "{:>4} {:>5} {:>11.6}  {}", rank + 1, p.id, p.probability, p.label);
    }
    out
}

pub fn json(predictions: &[Prediction]) -> TractResult<String> {
    Ok(serde_json::to_string_pretty(predictions)?)
}
