//! Red/green cell shading for term bible tables.
//!
//! Values at or above the 75th percentile shade from light to dark green as
//! they approach the maximum; values at or below the 25th percentile shade
//! from light to dark red as they approach the minimum. Everything between
//! stays white.

use crate::config::MONTH_ABBR;
use crate::models::TermBibleRow;

const HIGH_NEAR: Rgb = Rgb(0x66, 0xBB, 0x6A);
const HIGH_FAR: Rgb = Rgb(0x1B, 0x5E, 0x20);
const LOW_NEAR: Rgb = Rgb(0xEF, 0x53, 0x50);
const LOW_FAR: Rgb = Rgb(0xB7, 0x1C, 0x1C);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rgb(u8, u8, u8);

impl Rgb {
    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| -> u8 {
            let v = (1.0 - t) * f64::from(a) + t * f64::from(b);
            v.clamp(0.0, 255.0) as u8
        };
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }

    fn hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Computed style for one table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellStyle {
    pub background: String,
    pub color: Option<&'static str>,
}

impl CellStyle {
    /// Inline CSS declaration list for the cell.
    pub fn css(&self) -> String {
        match self.color {
            Some(color) => format!("background-color: {}; color: {}", self.background, color),
            None => format!("background-color: {}", self.background),
        }
    }
}

/// Shading thresholds derived from a set of values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientScale {
    pub min: f64,
    pub q25: f64,
    pub q75: f64,
    pub max: f64,
}

impl GradientScale {
    /// Thresholds over the finite values given, or `None` if there are none.
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);
        Some(Self {
            min: sorted[0],
            q25: percentile(&sorted, 25.0),
            q75: percentile(&sorted, 75.0),
            max: sorted[sorted.len() - 1],
        })
    }

    /// Thresholds across every month cell of a term bible.
    pub fn from_term_bible(rows: &[TermBibleRow]) -> Option<Self> {
        Self::from_values(rows.iter().flat_map(|r| r.months.iter().flatten().copied()))
    }

    pub fn cell_style(&self, value: Option<f64>) -> CellStyle {
        let v = match value {
            Some(v) if !v.is_nan() => v,
            _ => {
                return CellStyle {
                    background: "white".to_string(),
                    color: None,
                }
            }
        };

        let (near, far, t) = if v >= self.q75 {
            (HIGH_NEAR, HIGH_FAR, factor(v - self.q75, self.max - self.q75))
        } else if v <= self.q25 {
            (LOW_NEAR, LOW_FAR, factor(v - self.q25, self.min - self.q25))
        } else {
            return CellStyle {
                background: "white".to_string(),
                color: Some("black"),
            };
        };

        CellStyle {
            background: near.lerp(far, t).hex(),
            color: Some(if t > 0.5 { "white" } else { "black" }),
        }
    }
}

/// Position within a band, clamped to [0, 1]. A zero-width band is 0.
fn factor(offset: f64, width: f64) -> f64 {
    if width == 0.0 {
        return 0.0;
    }
    (offset / width).clamp(0.0, 1.0)
}

/// Percentile with linear interpolation between closest ranks.
///
/// `sorted` must be non-empty and ascending.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Render a term bible as an HTML table with shaded, bold cells.
///
/// The year column has a blank header.
pub fn render_term_bible_html(rows: &[TermBibleRow]) -> String {
    let scale = GradientScale::from_term_bible(rows);
    let header: String = MONTH_ABBR.iter().map(|m| format!("<th>{}</th>", m)).collect();

    let mut html = String::from("<table class=\"term-bible\">\n<thead>\n");
    html.push_str(&format!("<tr><th></th>{}</tr>\n", header));
    html.push_str("</thead>\n<tbody>\n");
    for row in rows {
        html.push_str(&render_row(row, scale.as_ref()));
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

fn render_row(row: &TermBibleRow, scale: Option<&GradientScale>) -> String {
    let cells: String = row
        .months
        .iter()
        .map(|value| {
            let css = scale
                .map(|s| s.cell_style(*value).css())
                .unwrap_or_else(|| "background-color: white".to_string());
            let text = value.map(|v| format!("{:.3}", v)).unwrap_or_default();
            format!("<td style=\"{}; font-weight: bold\">{}</td>", css, text)
        })
        .collect();
    format!(
        "<tr><td style=\"font-weight: bold\">{}</td>{}</tr>\n",
        escape_html(&row.year),
        cells
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
