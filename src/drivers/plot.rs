use std::io::Cursor;
use std::path::PathBuf;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::LineSeries;
use plotters::prelude::*;
use crate::drivers::error::PipelineError;
use crate::types::{ActuatorState, VisualFrame};
/// Receives one frame per tick for display.
pub trait FrameSink {
    fn present(&mut self, frame: &VisualFrame) -> Result<(), PipelineError>;
}
impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn present(&mut self, frame: &VisualFrame) -> Result<(), PipelineError> {
        (**self).present(frame)
    }
}
/// Drops every frame.
#[derive(Debug, Default)]
pub struct NullSink;
impl FrameSink for NullSink {
    fn present(&mut self, _frame: &VisualFrame) -> Result<(), PipelineError> {
        Ok(())
    }
}
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub raw_color: RGBColor,
    pub alpha_color: RGBColor,
    pub beta_color: RGBColor,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 600,
            background: RGBColor(10, 10, 10),
            raw_color: CYAN,
            alpha_color: BLUE,
            beta_color: RED,
        }
    }
}
/// Overwrites a PNG file with the latest frame on every tick.
pub struct PngSink {
    path: PathBuf,
    style: PlotStyle,
}
impl PngSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            style: PlotStyle::default(),
        }
    }
    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}
impl FrameSink for PngSink {
    fn present(&mut self, frame: &VisualFrame) -> Result<(), PipelineError> {
        if frame.raw.is_empty() {
            return Ok(());
        }
        let png = render_frame_png(frame, &self.style)?;
        std::fs::write(&self.path, png)
            .map_err(|e| PipelineError::Plot(format!("{}: {e}", self.path.display())))
    }
}
/// Two stacked charts: the raw epoch on top, alpha/beta power history below.
pub fn render_frame_png(frame: &VisualFrame, style: &PlotStyle) -> Result<Vec<u8>, PipelineError> {
    if frame.raw.is_empty() {
        return Err(PipelineError::Plot("frame has no raw samples".into()));
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let areas = root.split_evenly((2, 1));
        let (upper, lower) = (&areas[0], &areas[1]);
        let raw_bounds = value_bounds(frame.raw.iter().copied(), (-10.0, 10.0));
        let mut raw_chart = ChartBuilder::on(upper)
            .margin(10)
            .caption(raw_caption(frame), ("sans-serif", 20).into_font().color(&WHITE))
            .set_label_area_size(LabelAreaPosition::Left, 45)
            .set_label_area_size(LabelAreaPosition::Bottom, 30)
            .build_cartesian_2d(0f64..frame.raw.len() as f64, raw_bounds.0..raw_bounds.1)?;
        raw_chart
            .configure_mesh()
            .light_line_style(&WHITE.mix(0.1))
            .y_desc("Amplitude")
            .draw()?;
        raw_chart.draw_series(LineSeries::new(
            frame.raw.iter().enumerate().map(|(i, v)| (i as f64, *v)),
            &style.raw_color,
        ))?;
        let power_bounds = value_bounds(
            frame.alpha.iter().chain(&frame.beta).copied(),
            (0.0, 1.0),
        );
        let epochs = frame.alpha.len().max(2) as f64;
        let mut power_chart = ChartBuilder::on(lower)
            .margin(10)
            .caption(
                "Alpha and Beta Bandpower (Welch)",
                ("sans-serif", 20).into_font().color(&WHITE),
            )
            .set_label_area_size(LabelAreaPosition::Left, 45)
            .set_label_area_size(LabelAreaPosition::Bottom, 30)
            .build_cartesian_2d(0f64..epochs, 0f64..power_bounds.1.max(1e-3))?;
        power_chart
            .configure_mesh()
            .light_line_style(&WHITE.mix(0.1))
            .x_desc("Epoch")
            .y_desc("Power")
            .draw()?;
        for (label, series, color) in [
            ("Alpha", &frame.alpha, style.alpha_color),
            ("Beta", &frame.beta, style.beta_color),
        ] {
            power_chart
                .draw_series(LineSeries::new(
                    series.iter().enumerate().map(|(i, v)| (i as f64, *v)),
                    &color,
                ))?
                .label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
        }
        power_chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .border_style(&WHITE.mix(0.2))
            .background_style(&style.background)
            .draw()?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
fn raw_caption(frame: &VisualFrame) -> String {
    let state = match frame.state {
        ActuatorState::Idle => "idle",
        ActuatorState::Engaged => "walking",
    };
    format!("Raw EEG [{state}]")
}
/// Min/max of the values, or `fallback` when they are all equal (or absent).
fn value_bounds(values: impl Iterator<Item = f64>, fallback: (f64, f64)) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min >= max {
        fallback
    } else {
        (min, max)
    }
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, PipelineError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| PipelineError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
