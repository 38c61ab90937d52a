//! SVG trend chart: last 30 closes with MA5/MA10/MA20 overlays.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::adapters::text_report::file_stem;
use crate::domain::analysis::AnalysisReport;
use crate::domain::error::StockevalError;
use crate::domain::indicator::IndicatorType;
use crate::domain::technical::{TechnicalAnalysis, MA_PERIODS};
use crate::ports::report_port::ReportPort;

pub const CHART_WINDOW: usize = 30;

const WIDTH: f64 = 600.0;
const HEIGHT: f64 = 300.0;
const PADDING: f64 = 40.0;

const CLOSE_COLOUR: &str = "#1f77b4";
const MA_COLOURS: [&str; 3] = ["#ff7f0e", "#2ca02c", "#d62728"];

pub fn chart_file_name(stock_name: &str) -> String {
    format!("{}_走势图.svg", file_stem(stock_name))
}

struct Frame {
    min: f64,
    max: f64,
    count: usize,
}

impl Frame {
    fn x(&self, i: usize) -> f64 {
        let plot_w = WIDTH - 2.0 * PADDING;
        if self.count <= 1 {
            PADDING + plot_w / 2.0
        } else {
            PADDING + (i as f64 / (self.count - 1) as f64) * plot_w
        }
    }

    fn y(&self, value: f64) -> f64 {
        let plot_h = HEIGHT - 2.0 * PADDING;
        let range = self.max - self.min;
        let range = if range == 0.0 { 1.0 } else { range };
        PADDING + plot_h - ((value - self.min) / range) * plot_h
    }
}

/// Points for one line; warmup gaps are skipped rather than drawn at zero.
fn polyline_points(frame: &Frame, values: &[Option<f64>]) -> String {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| format!("{:.1},{:.1}", frame.x(i), frame.y(v))))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render the trend chart, or `None` when there are no candles.
pub fn render_trend_svg(analysis: &TechnicalAnalysis, title: &str) -> Option<String> {
    let total = analysis.candles.len();
    if total == 0 {
        return None;
    }
    let start = total.saturating_sub(CHART_WINDOW);
    let window = &analysis.candles[start..];

    let closes: Vec<Option<f64>> = window.iter().map(|c| Some(c.close)).collect();
    let averages: Vec<(usize, Vec<Option<f64>>)> = MA_PERIODS
        .iter()
        .map(|&p| {
            let values = analysis
                .series(&IndicatorType::Sma(p))
                .map(|s| s.simple_values().split_off(start))
                .unwrap_or_default();
            (p, values)
        })
        .collect();

    let all = closes
        .iter()
        .chain(averages.iter().flat_map(|(_, v)| v.iter()))
        .flatten();
    let min = all.clone().copied().fold(f64::INFINITY, f64::min);
    let max = all.copied().fold(f64::NEG_INFINITY, f64::max);
    let frame = Frame {
        min,
        max,
        count: window.len(),
    };

    let mut svg = render_frame(title, min, max);
    svg.push_str(&format!(
        "<polyline fill=\"none\" stroke=\"{}\" stroke-width=\"2\" points=\"{}\"/>\n",
        CLOSE_COLOUR,
        polyline_points(&frame, &closes)
    ));
    for ((period, values), colour) in averages.iter().zip(MA_COLOURS) {
        let points = polyline_points(&frame, values);
        if points.is_empty() {
            continue;
        }
        svg.push_str(&format!(
            "<polyline fill=\"none\" stroke=\"{}\" stroke-width=\"1\" points=\"{}\" data-series=\"MA{}\"/>\n",
            colour, points, period
        ));
    }
    svg.push_str(&render_legend());
    if let (Some(first), Some(last)) = (window.first(), window.last()) {
        svg.push_str(&render_date_axis(first.date, last.date));
    }
    svg.push_str("</svg>\n");
    Some(svg)
}

fn render_frame(title: &str, min: f64, max: f64) -> String {
    let mut output = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
        w = WIDTH,
        h = HEIGHT
    );
    output.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    output.push_str(&format!(
        "<text x=\"{:.1}\" y=\"24\" font-size=\"16\" text-anchor=\"middle\">{}</text>\n",
        WIDTH / 2.0,
        escape(title)
    ));
    output.push_str(&format!(
        "<rect x=\"{p}\" y=\"{p}\" width=\"{pw}\" height=\"{ph}\" fill=\"none\" stroke=\"#cccccc\"/>\n",
        p = PADDING,
        pw = WIDTH - 2.0 * PADDING,
        ph = HEIGHT - 2.0 * PADDING
    ));
    output.push_str(&format!(
        "<text x=\"4\" y=\"{:.1}\" font-size=\"10\">{:.2}</text>\n",
        PADDING + 4.0,
        max
    ));
    output.push_str(&format!(
        "<text x=\"4\" y=\"{:.1}\" font-size=\"10\">{:.2}</text>\n",
        HEIGHT - PADDING,
        min
    ));
    output
}

fn render_legend() -> String {
    let legend = std::iter::once(("收盘价".to_string(), CLOSE_COLOUR)).chain(
        MA_PERIODS
            .iter()
            .zip(MA_COLOURS)
            .map(|(p, c)| (format!("MA{}", p), c)),
    );
    let mut output = String::new();
    for (i, (label, colour)) in legend.enumerate() {
        let x = PADDING + i as f64 * 90.0;
        let y = HEIGHT - 12.0;
        output.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"12\" height=\"4\" fill=\"{}\"/><text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\">{}</text>\n",
            x,
            y - 4.0,
            colour,
            x + 16.0,
            y,
            label
        ));
    }
    output
}

fn render_date_axis(first: NaiveDate, last: NaiveDate) -> String {
    let y = HEIGHT - PADDING + 14.0;
    let mut output = format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"10\">{}</text>\n",
        PADDING,
        y,
        first.format("%Y-%m-%d")
    );
    output.push_str(&format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"10\" text-anchor=\"end\">{}</text>\n",
        WIDTH - PADDING,
        y,
        last.format("%Y-%m-%d")
    ));
    output
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Writes `{name}_走势图.svg` next to the text report.
#[derive(Default)]
pub struct SvgChartAdapter;

impl ReportPort for SvgChartAdapter {
    fn write(&self, report: &AnalysisReport, output_dir: &Path) -> Result<PathBuf, StockevalError> {
        let title = format!("{} 近{}日走势", report.target.name, CHART_WINDOW);
        let svg = render_trend_svg(&report.technical, &title).ok_or_else(|| {
            StockevalError::Report {
                reason: format!("no candles to chart for {}", report.target.code),
            }
        })?;
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(chart_file_name(&report.target.name));
        fs::write(&path, svg)?;
        info!(path = %path.display(), "trend chart written");
        Ok(path)
    }
}
