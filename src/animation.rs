// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Animation rendering
//!
//! An animation is a run of frames, each rendered by a `TileRenderer`
//! with its own plane window, its own coloring function and its own
//! presentation delay.  The window shrinks by a constant zoom factor
//! after every frame; frame 0 uses the configured window as is.
//!
//! Two schedulers produce identical buffers.  `render` draws the
//! frames one after the other.  `render_parallel` keeps up to
//! `max_jobs` frames in flight at once, each on its own scoped thread
//! (and each of those fans out into slice workers of its own).  Frames
//! come back in whatever order the hardware finishes them; they wait
//! in a holding area until every earlier frame has been emitted, so the
//! buffer only ever grows in frame order.  The zoom state advances
//! when a frame is dispatched, never when one completes, so the window
//! of every frame is the same no matter how the jobs interleave.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use crossbeam::channel;
use log::{debug, info, warn};
use num::Complex;

use crate::error::{RenderError, Result};
use crate::planes::{PlaneWindow, RasterDimensions};
use crate::pool::Pool;
use crate::raster::Raster;
use crate::tiles::TileRenderer;

/// Everything about an animation except the functions that color and
/// time its frames.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AnimationConfig {
    /// Number of frames to render.
    pub frames: usize,
    /// Size of every frame.
    pub dimensions: RasterDimensions,
    /// Window of frame 0.
    pub window: PlaneWindow,
    /// Per-frame multiplier applied to the window's width and height.
    /// Use 1 for animations that do not zoom.
    pub zoom_factor: f64,
    /// Width of the vertical slices inside each frame.  `None` picks
    /// one slice per CPU.
    pub slice_width: Option<usize>,
    /// Log a line for every frame added to the animation.
    pub progress: bool,
}

impl AnimationConfig {
    /// A non-zooming animation with default slicing and no progress
    /// output.
    pub fn new(frames: usize, dimensions: RasterDimensions, window: PlaneWindow) -> Self {
        AnimationConfig {
            frames,
            dimensions,
            window,
            zoom_factor: 1.0,
            slice_width: None,
            progress: false,
        }
    }

    fn validate(&self) -> Result<usize> {
        if self.frames == 0 {
            return Err(RenderError::NoFrames);
        }
        if !self.zoom_factor.is_finite() || self.zoom_factor <= 0.0 {
            return Err(RenderError::InvalidZoom(self.zoom_factor));
        }
        match self.slice_width {
            Some(0) => Err(RenderError::ZeroSliceWidth),
            Some(s) => Ok(s),
            None => Ok(TileRenderer::default_slice_width(self.dimensions.width())),
        }
    }
}

/// One finished frame, as it sits in the animation.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedFrame<T> {
    /// Position of the frame in the animation.
    pub id: usize,
    /// The plane window the frame was drawn with.
    pub window: PlaneWindow,
    /// The pixels.
    pub raster: Raster<T>,
    /// How long the frame stays up, in hundredths of a second.
    pub delay: u32,
}

/// Finished frames in animation order.  Appending anything but the
/// next frame in sequence is refused.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationBuffer<T> {
    frames: Vec<RenderedFrame<T>>,
}

impl<T> AnimationBuffer<T> {
    /// An empty buffer with room for `capacity` frames.
    pub fn with_capacity(capacity: usize) -> Self {
        AnimationBuffer {
            frames: Vec::with_capacity(capacity),
        }
    }

    /// Appends the next frame.
    pub fn push(&mut self, frame: RenderedFrame<T>) -> Result<()> {
        if frame.id != self.frames.len() {
            return Err(RenderError::OutOfOrder {
                expected: self.frames.len(),
                found: frame.id,
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Number of frames emitted so far.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True before the first frame lands.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The frames, in order.
    pub fn frames(&self) -> &[RenderedFrame<T>] {
        &self.frames
    }

    /// Hands the frames over to an encoder.
    pub fn into_frames(self) -> Vec<RenderedFrame<T>> {
        self.frames
    }
}

/// Issues the window of each frame in turn.  Shared by both schedulers
/// so they agree bit for bit.
#[derive(Clone, Debug)]
struct ZoomSchedule {
    window: PlaneWindow,
    factor: f64,
    issued: usize,
}

impl ZoomSchedule {
    fn new(window: PlaneWindow, factor: f64) -> Self {
        ZoomSchedule {
            window,
            factor,
            issued: 0,
        }
    }

    fn advance(&mut self) -> Result<PlaneWindow> {
        if self.issued != 0 {
            self.window = self.window.zoomed(self.factor)?;
        }
        self.issued += 1;
        Ok(self.window)
    }
}

/// A frame in flight: what to draw, who draws it, and where.
struct FrameJob<T> {
    id: usize,
    window: PlaneWindow,
    renderer: TileRenderer,
    raster: Raster<T>,
}

/// States of the bounded scheduler's loop.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum SchedulerState {
    /// Nothing to dispatch or emit; wait for a job to finish.
    Idle,
    /// Start the next frame if there is capacity and work left.
    Dispatching,
    /// Pick up every finished job without waiting.
    Collecting,
    /// Move the head-of-line frame from the holding area to the buffer.
    Draining,
    /// Every frame has been emitted.
    Done,
}

/// Renders animations.  `G` produces the coloring function of a frame
/// from its id; `D` produces its delay.
pub struct AnimationRenderer<G, D> {
    config: AnimationConfig,
    slice_width: usize,
    color_fn_gen: G,
    frame_delay_fn: D,
}

impl<G, D> std::fmt::Debug for AnimationRenderer<G, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationRenderer")
            .field("config", &self.config)
            .field("slice_width", &self.slice_width)
            .finish()
    }
}

impl<G, D> AnimationRenderer<G, D>
where
    D: Fn(usize) -> u32,
{
    /// Validates the configuration up front: no frames, a zero slice
    /// width or an unusable zoom factor fail here, before any work.
    pub fn new(config: AnimationConfig, color_fn_gen: G, frame_delay_fn: D) -> Result<Self> {
        let slice_width = config.validate()?;
        Ok(AnimationRenderer {
            config,
            slice_width,
            color_fn_gen,
            frame_delay_fn,
        })
    }

    /// The configuration this renderer was built with.
    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// Renders every frame in order on the calling thread (the slices
    /// of each frame still run in parallel).
    pub fn render<F, T>(&self) -> Result<AnimationBuffer<T>>
    where
        G: Fn(usize) -> F,
        F: Fn(Complex<f64>) -> T + Sync,
        T: Copy + Default + Send,
    {
        self.render_with_progress(|_, _| {})
    }

    /// As `render`, calling `progress(done, total)` after each frame is
    /// appended.
    pub fn render_with_progress<F, T, P>(&self, mut progress: P) -> Result<AnimationBuffer<T>>
    where
        G: Fn(usize) -> F,
        F: Fn(Complex<f64>) -> T + Sync,
        T: Copy + Default + Send,
        P: FnMut(usize, usize),
    {
        let frames = self.config.frames;
        let mut renderer =
            TileRenderer::new(self.config.dimensions, self.config.window, self.slice_width)?;
        let mut zoom = ZoomSchedule::new(self.config.window, self.config.zoom_factor);
        let mut buffer = AnimationBuffer::with_capacity(frames);

        for id in 0..frames {
            let window = zoom.advance()?;
            renderer.set_window(window);
            let color_fn = generate_color_fn(&self.color_fn_gen, id)?;
            let raster = renderer.render(&color_fn)?;
            buffer.push(RenderedFrame {
                id,
                window,
                raster,
                delay: (self.frame_delay_fn)(id),
            })?;
            self.report(id + 1, &mut progress);
        }
        Ok(buffer)
    }

    /// Renders up to `max_jobs` frames at once.  The result is the
    /// same as `render`'s.
    pub fn render_parallel<F, T>(&self, max_jobs: usize) -> Result<AnimationBuffer<T>>
    where
        G: Fn(usize) -> F + Sync,
        F: Fn(Complex<f64>) -> T + Sync,
        T: Copy + Default + Send,
    {
        self.render_parallel_with_progress(max_jobs, |_, _| {})
    }

    /// As `render_parallel`, calling `progress(done, total)` once per
    /// frame emitted into the buffer (not per frame completed).
    pub fn render_parallel_with_progress<F, T, P>(
        &self,
        max_jobs: usize,
        mut progress: P,
    ) -> Result<AnimationBuffer<T>>
    where
        G: Fn(usize) -> F + Sync,
        F: Fn(Complex<f64>) -> T + Sync,
        T: Copy + Default + Send,
        P: FnMut(usize, usize),
    {
        if max_jobs == 0 {
            return Err(RenderError::ZeroJobs);
        }
        let frames = self.config.frames;
        let dimensions = self.config.dimensions;
        let base = TileRenderer::new(dimensions, self.config.window, self.slice_width)?;
        let renderers = Pool::new(move || base.clone());
        let (done_tx, done_rx) = channel::unbounded::<(usize, Result<FrameJob<T>>)>();
        let color_fn_gen = &self.color_fn_gen;

        let outcome = crossbeam::scope(|spawner| -> Result<AnimationBuffer<T>> {
            let mut zoom = ZoomSchedule::new(self.config.window, self.config.zoom_factor);
            let mut holding: HashMap<usize, (PlaneWindow, Raster<T>)> = HashMap::new();
            let mut buffer = AnimationBuffer::with_capacity(frames);
            let mut running = 0;
            let mut next_frame_id = 0;
            let mut next_frame_needed = 0;

            let mut state = SchedulerState::Dispatching;
            loop {
                state = match state {
                    SchedulerState::Dispatching => {
                        if running < max_jobs && next_frame_id < frames {
                            let window = zoom.advance()?;
                            let mut renderer = renderers.checkout();
                            renderer.set_window(window);
                            let job = FrameJob {
                                id: next_frame_id,
                                window,
                                renderer,
                                raster: Raster::new(dimensions)?,
                            };
                            let done_tx = done_tx.clone();
                            spawner.spawn(move |_| {
                                let id = job.id;
                                let result =
                                    panic::catch_unwind(AssertUnwindSafe(|| {
                                        run_frame_job(job, color_fn_gen)
                                    }))
                                    .unwrap_or(Err(RenderError::FramePanicked(id)));
                                // The receiver outlives every job in this scope.
                                let _ = done_tx.send((id, result));
                            });
                            debug!("frame {} dispatched", next_frame_id);
                            next_frame_id += 1;
                            running += 1;
                        }
                        SchedulerState::Collecting
                    }

                    SchedulerState::Collecting => {
                        while let Ok(finished) = done_rx.try_recv() {
                            running -= 1;
                            hold(finished, &mut holding, &renderers)?;
                        }
                        if holding.contains_key(&next_frame_needed) {
                            SchedulerState::Draining
                        } else if running < max_jobs && next_frame_id < frames {
                            SchedulerState::Dispatching
                        } else {
                            SchedulerState::Idle
                        }
                    }

                    SchedulerState::Idle => {
                        debug_assert!(running > 0, "idle with no frame in flight");
                        match done_rx.recv() {
                            Ok(finished) => {
                                running -= 1;
                                hold(finished, &mut holding, &renderers)?;
                            }
                            Err(_) => return Err(RenderError::FramePanicked(next_frame_needed)),
                        }
                        SchedulerState::Collecting
                    }

                    SchedulerState::Draining => match holding.remove(&next_frame_needed) {
                        Some((window, raster)) => {
                            let id = next_frame_needed;
                            buffer.push(RenderedFrame {
                                id,
                                window,
                                raster,
                                delay: (self.frame_delay_fn)(id),
                            })?;
                            next_frame_needed += 1;
                            debug!("frame {} emitted, {} held", id, holding.len());
                            self.report(next_frame_needed, &mut progress);

                            if next_frame_needed == frames {
                                SchedulerState::Done
                            } else if holding.contains_key(&next_frame_needed) {
                                SchedulerState::Collecting
                            } else {
                                SchedulerState::Dispatching
                            }
                        }
                        None => SchedulerState::Dispatching,
                    },

                    SchedulerState::Done => break,
                };
            }
            Ok(buffer)
        });

        match outcome {
            Ok(result) => result,
            Err(_) => Err(RenderError::WorkerPanicked),
        }
    }

    fn report<P: FnMut(usize, usize)>(&self, done: usize, progress: &mut P) {
        if self.config.progress {
            info!("Rendered {} of {} frames", done, self.config.frames);
        }
        progress(done, self.config.frames);
    }
}

/// Files a finished job in the holding area and recycles its renderer.
/// A failed job ends the animation.
fn hold<T>(
    (id, result): (usize, Result<FrameJob<T>>),
    holding: &mut HashMap<usize, (PlaneWindow, Raster<T>)>,
    renderers: &Pool<TileRenderer>,
) -> Result<()> {
    let job = result.map_err(|e| {
        warn!("frame {} failed, abandoning the animation: {}", id, e);
        e
    })?;
    debug!("frame {} finished", job.id);
    holding.insert(job.id, (job.window, job.raster));
    renderers.give_back(job.renderer);
    Ok(())
}

/// Calls the generator, turning a panic into an error for that frame.
fn generate_color_fn<G, F>(color_fn_gen: &G, id: usize) -> Result<F>
where
    G: Fn(usize) -> F,
{
    panic::catch_unwind(AssertUnwindSafe(|| color_fn_gen(id)))
        .map_err(|_| RenderError::FramePanicked(id))
}

/// The body of a frame job: fill the job's raster with the frame's
/// coloring function, then hand the job back.
fn run_frame_job<G, F, T>(mut job: FrameJob<T>, color_fn_gen: &G) -> Result<FrameJob<T>>
where
    G: Fn(usize) -> F,
    F: Fn(Complex<f64>) -> T + Sync,
    T: Copy + Send,
{
    let color_fn = generate_color_fn(color_fn_gen, job.id)?;
    job.renderer.render_into(&mut job.raster, &color_fn)?;
    Ok(job)
}
