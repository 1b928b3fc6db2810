//! Motion detection for video stabilization
//!
//! [`StabilizeFilter`] measures, for every frame, the similarity transform
//! that maps it onto its predecessor and hands the resulting stream to a
//! [`TransformSink`]. Frames pass through unchanged unless the debug
//! overlay is enabled.
//!
//! The field path works in four steps:
//! 1. score every grid field by contrast on the current frame
//! 2. keep the best fields, spread over the frame ([`FieldSelector`])
//! 3. block-match each kept field against the previous frame
//!    ([`FieldMatcher`])
//! 4. combine the displacements into translation and rotation
//!    ([`TransformAggregator`])

pub mod aggregate;
pub mod compare;
pub mod config;
pub mod contrast;
pub mod field;
pub mod matcher;
pub mod overlay;
pub mod select;
pub mod sink;
pub mod transform;

pub use aggregate::{clean_mean, MatchedField, TransformAggregator};
pub use config::{Algorithm, StabilizeOptions, StabilizeParams};
pub use field::{Field, FieldGrid};
pub use matcher::FieldMatcher;
pub use select::{ContrastIndex, FieldSelector};
pub use sink::{open_sink, read_transforms, JsonSink, MemorySink, StreamHeader, TextSink, TransformSink};
pub use transform::Transform;

use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

use super::Filter;
use crate::error::{Error, Result};
use crate::frame::{PlaneView, VideoFrame};
use crate::util::PixelFormat;
use contrast::michelson_contrast;
use overlay::{draw_overlay, Canvas};

/// Lifecycle of a [`StabilizeFilter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Ready,
    Running,
    Stopped,
}

/// Everything that depends on the frame size
#[derive(Debug, Clone)]
struct Geometry {
    params: StabilizeParams,
    /// Absent for the brute-force search
    grid: Option<FieldGrid>,
    selector: FieldSelector,
    matcher: FieldMatcher,
    aggregator: TransformAggregator,
}

impl Geometry {
    fn new(options: &StabilizeOptions, width: usize, height: usize) -> Result<Self> {
        let params = StabilizeParams::derive(options, width, height);
        let (grid, max_fields, rows) = match params.algo {
            Algorithm::Fields => {
                let grid = FieldGrid::new(width, height, params.max_shift, params.step_size, params.field_size)?;
                let max_fields = params.max_fields(grid.len());
                let rows = grid.rows();
                (Some(grid), max_fields, rows)
            }
            Algorithm::BruteForce => (None, 0, 0),
        };

        Ok(Geometry {
            selector: FieldSelector::new(params.min_contrast, max_fields, rows),
            matcher: FieldMatcher::new(params.max_shift, params.step_size, params.allow_max),
            aggregator: TransformAggregator::new(params.max_shift, params.max_angle_variation, width, height),
            grid,
            params,
        })
    }

    fn log(&self) {
        info!(
            "Fieldsize: {}, Maximal translation: {} pixel",
            self.params.field_size, self.params.max_shift
        );
        if let Some(grid) = &self.grid {
            info!(
                "Number of used measurement fields: {} out of {}",
                self.selector.max_fields,
                grid.len()
            );
        }
    }

    fn dimensions(&self) -> (usize, usize) {
        (self.params.width, self.params.height)
    }

    /// Estimate the transform from `prev` to `curr`, returning the fields
    /// that took part
    fn estimate(&self, curr: &PlaneView<'_>, prev: &PlaneView<'_>, index: u64) -> (Transform, Vec<MatchedField>) {
        let grid = match &self.grid {
            Some(grid) => grid,
            None => return (self.matcher.match_frame(curr, prev), Vec::new()),
        };

        let fields = grid.fields();
        let selected = self.selector.select(fields, |field| michelson_contrast(curr, field));
        let match_one = |choice: &ContrastIndex| {
            let field = fields[choice.index];
            MatchedField {
                field,
                transform: self.matcher.match_field(curr, prev, &field),
            }
        };
        let matched: Vec<MatchedField> = if self.params.parallel {
            selected.par_iter().map(match_one).collect()
        } else {
            selected.iter().map(match_one).collect()
        };

        let transform = match self.aggregator.aggregate(&matched) {
            Some(t) => t,
            None => {
                warn!("too low contrast, no field remains (no translation detected in frame {})", index);
                Transform::identity()
            }
        };
        (transform, matched)
    }
}

/// Per-frame motion detection filter
pub struct StabilizeFilter {
    options: StabilizeOptions,
    state: PipelineState,
    format: PixelFormat,
    geometry: Option<Geometry>,
    sink: Option<Box<dyn TransformSink + Send>>,
    /// Analysis plane of the last frame, tightly packed
    prev: Vec<u8>,
    has_prev: bool,
    transforms: Vec<Transform>,
    frame_index: u64,
}

impl StabilizeFilter {
    /// Create an unconfigured filter
    pub fn new(options: StabilizeOptions) -> Self {
        StabilizeFilter {
            options,
            state: PipelineState::Uninitialized,
            format: PixelFormat::Unknown,
            geometry: None,
            sink: None,
            prev: Vec::new(),
            has_prev: false,
            transforms: Vec::new(),
            frame_index: 0,
        }
    }

    /// Validate the options for a `width` x `height` stream of `format` and
    /// attach the sink that receives the transforms on [`stop`](Self::stop)
    pub fn configure(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
        sink: Box<dyn TransformSink + Send>,
    ) -> Result<()> {
        if self.state != PipelineState::Uninitialized {
            return Err(Error::invalid_state(format!("cannot configure in state {:?}", self.state)));
        }
        if format.analysis_bytes_per_pixel().is_none() {
            return Err(Error::unsupported(format!("pixel format {}", format)));
        }

        self.options.normalize();
        self.options.validate()?;
        self.log_settings();

        let geometry = Geometry::new(&self.options, width as usize, height as usize)?;
        geometry.log();

        self.geometry = Some(geometry);
        self.format = format;
        self.sink = Some(sink);
        self.state = PipelineState::Ready;
        Ok(())
    }

    /// Configure with a file sink at the result path, which defaults to a
    /// name derived from `input`
    pub fn configure_file(&mut self, width: u32, height: u32, format: PixelFormat, input: Option<&Path>) -> Result<()> {
        let path = self.options.result_path(input);
        if self.options.result.is_none() {
            self.options.result = Some(path.clone());
        }
        let sink = open_sink(&path)?;
        self.configure(width, height, format, sink)
    }

    fn log_settings(&self) {
        let options = &self.options;
        info!("Image Stabilization Settings:");
        info!("     shakiness = {}", options.shakiness);
        info!("      accuracy = {}", options.accuracy);
        info!("      stepsize = {}", options.stepsize);
        info!("          algo = {}", options.algo.id());
        info!("   mincontrast = {:.6}", options.mincontrast);
        info!("          show = {}", options.show);
        info!("        result = {}", self.result_label());
    }

    fn result_label(&self) -> String {
        self.options.result_path(None).display().to_string()
    }

    /// Analyse one frame, returning it (with the overlay drawn if enabled)
    pub fn process(&mut self, mut frame: VideoFrame) -> Result<VideoFrame> {
        match self.state {
            PipelineState::Ready | PipelineState::Running => {}
            state => {
                return Err(Error::invalid_state(format!("cannot process frames in state {:?}", state)));
            }
        }
        let index = self.frame_index;
        if frame.format != self.format {
            return Err(Error::in_frame(
                index,
                Error::unsupported(format!("pixel format {} (configured for {})", frame.format, self.format)),
            ));
        }

        let size = (frame.width as usize, frame.height as usize);
        let resized = self.geometry.as_ref().map(Geometry::dimensions) != Some(size);
        if resized {
            warn!(
                "frame {} changed size to {}x{}, restarting detection",
                index, frame.width, frame.height
            );
            let geometry = Geometry::new(&self.options, size.0, size.1).map_err(|e| Error::in_frame(index, e))?;
            geometry.log();
            self.geometry = Some(geometry);
            self.has_prev = false;
        }

        let (transform, matched) = {
            let curr = frame.analysis_plane().map_err(|e| Error::in_frame(index, e))?;
            let result = match (&self.geometry, self.has_prev) {
                (Some(geometry), true) => {
                    let prev = PlaneView::packed(&self.prev, curr.width(), curr.height(), curr.bytes_per_pixel())
                        .map_err(|e| Error::in_frame(index, e))?;
                    geometry.estimate(&curr, &prev, index)
                }
                _ => (Transform::identity(), Vec::new()),
            };
            curr.copy_packed_into(&mut self.prev);
            result
        };
        self.has_prev = true;

        debug!(
            "frame {} (pts {}): x={:.4} y={:.4} alpha={:.5} ({} fields)",
            index,
            frame.pts,
            transform.x,
            transform.y,
            transform.alpha,
            matched.len()
        );
        self.transforms.push(transform);

        let show = self.options.show;
        if show > 0 && !matched.is_empty() {
            if let Some(geometry) = &self.geometry {
                draw_on_frame(&mut frame, &matched, geometry.params.max_shift, show)
                    .map_err(|e| Error::in_frame(index, e))?;
            }
        }

        self.frame_index += 1;
        self.state = PipelineState::Running;
        Ok(frame)
    }

    /// Write the header and one record per frame to the sink and release
    /// the frame buffer
    pub fn stop(&mut self) -> Result<()> {
        match self.state {
            PipelineState::Ready | PipelineState::Running => {}
            state => return Err(Error::invalid_state(format!("cannot stop in state {:?}", state))),
        }
        self.state = PipelineState::Stopped;
        self.prev = Vec::new();
        self.has_prev = false;

        let (Some(geometry), Some(mut sink)) = (self.geometry.as_ref(), self.sink.take()) else {
            return Ok(());
        };
        let header = StreamHeader::new(&geometry.params, self.result_label());
        sink.write_header(&header)?;
        for (index, transform) in self.transforms.iter().enumerate() {
            sink.write_record(index as u64, transform)?;
        }
        sink.finish()?;
        info!("wrote {} transforms", self.transforms.len());
        Ok(())
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Options after normalization
    pub fn options(&self) -> &StabilizeOptions {
        &self.options
    }

    /// Parameters for the current frame size
    pub fn params(&self) -> Option<&StabilizeParams> {
        self.geometry.as_ref().map(|g| &g.params)
    }

    pub fn grid(&self) -> Option<&FieldGrid> {
        self.geometry.as_ref().and_then(|g| g.grid.as_ref())
    }

    /// Number of fields that vote per frame
    pub fn max_fields(&self) -> usize {
        self.geometry.as_ref().map(|g| g.selector.max_fields).unwrap_or(0)
    }

    /// Transforms measured so far, one per frame
    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_index
    }
}

impl Filter for StabilizeFilter {
    fn filter(&mut self, input: VideoFrame) -> Result<Vec<VideoFrame>> {
        Ok(vec![self.process(input)?])
    }

    fn flush(&mut self) -> Result<Vec<VideoFrame>> {
        self.stop()?;
        Ok(Vec::new())
    }
}

fn draw_on_frame(frame: &mut VideoFrame, matched: &[MatchedField], max_shift: usize, show: u32) -> Result<()> {
    let bytes_per_pixel = frame
        .format
        .analysis_bytes_per_pixel()
        .ok_or_else(|| Error::unsupported(format!("pixel format {}", frame.format)))?;
    let (width, height) = (frame.width as usize, frame.height as usize);
    let stride = frame.linesize.first().copied().unwrap_or(width * bytes_per_pixel);
    let plane = frame
        .data
        .first()
        .ok_or_else(|| Error::invalid_input("frame has no planes"))?;

    let mut pixels = plane.to_mut();
    draw_overlay(
        &mut Canvas::new(pixels.as_mut(), width, height, stride, bytes_per_pixel),
        matched,
        max_shift,
        show,
    );
    frame.data[0] = pixels.freeze();
    Ok(())
}
