//! The render worker: a thread that owns the scene and produces frames,
//! decoupled from whichever thread displays them and collects input.

use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};

use crate::controls::{Axis, Controls};
use crate::pipeline::{FrameStats, Renderer};
use crate::render_target::RenderTarget;
use crate::world::World;

/// Source of per-frame elapsed time.
pub trait FrameClock: Send {
    /// Seconds since the previous tick (or since creation).
    fn tick(&mut self) -> f32;
}

/// Wall clock.
pub struct SystemClock {
    last: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { last: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for SystemClock {
    fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        dt
    }
}

/// Constant step, for headless runs and tests.
#[derive(Debug, Copy, Clone)]
pub struct FixedClock {
    pub step: f32,
}

impl FrameClock for FixedClock {
    fn tick(&mut self) -> f32 {
        self.step
    }
}

/// Receives each finished frame as tightly packed RGBA rows.
pub trait PresentationSink: Send {
    /// Returns `false` once the sink can take no more frames, which stops
    /// the worker.
    fn present(&mut self, pixels: &[u8], stride: usize, stats: &FrameStats) -> bool;
}

/// An owned copy of one frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub pixels: Vec<u8>,
    pub stride: usize,
    pub stats: FrameStats,
}

/// Forwards frames over a channel, typically to a UI thread. On a bounded
/// channel, frames the receiver has no room for are dropped; the worker
/// never blocks on the display.
pub struct ChannelSink {
    frames: Sender<Frame>,
}

impl ChannelSink {
    pub fn new(frames: Sender<Frame>) -> Self {
        Self { frames }
    }
}

impl PresentationSink for ChannelSink {
    fn present(&mut self, pixels: &[u8], stride: usize, stats: &FrameStats) -> bool {
        let frame = Frame { pixels: pixels.to_vec(), stride, stats: *stats };
        !matches!(self.frames.try_send(frame), Err(TrySendError::Disconnected(_)))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    Start(Axis),
    Stop(Axis),
    Shutdown,
}

/// Everything the worker thread owns.
pub struct WorkerParts<C, S> {
    pub world: World,
    pub renderer: Renderer,
    pub target: RenderTarget,
    pub clock: C,
    pub sink: S,
    /// Stop on its own after this many frames.
    pub max_frames: Option<u64>,
}

/// Handle to a running render worker. Dropping it shuts the worker down.
pub struct RenderWorker {
    commands: Sender<Command>,
    thread: Option<JoinHandle<u64>>,
}

impl RenderWorker {
    pub fn spawn<C, S>(parts: WorkerParts<C, S>) -> Result<Self>
    where
        C: FrameClock + 'static,
        S: PresentationSink + 'static,
    {
        let (commands, rx) = crossbeam_channel::unbounded();
        let thread = thread::Builder::new()
            .name("render-worker".into())
            .spawn(move || run(parts, rx))
            .context("failed to spawn render worker")?;
        Ok(Self { commands, thread: Some(thread) })
    }

    pub fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| anyhow!("render worker has stopped"))
    }

    pub fn start(&self, axis: Axis) -> Result<()> {
        self.send(Command::Start(axis))
    }

    pub fn stop(&self, axis: Axis) -> Result<()> {
        self.send(Command::Stop(axis))
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Ask the worker to stop and wait for it. Returns the number of frames
    /// it rendered.
    pub fn shutdown(mut self) -> Result<u64> {
        self.join()
    }

    fn join(&mut self) -> Result<u64> {
        // the worker may already be gone
        let _ = self.commands.send(Command::Shutdown);
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| anyhow!("render worker panicked")),
            None => Ok(0),
        }
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        if let Err(e) = self.join() {
            log::warn!("{e}");
        }
    }
}

fn run<C: FrameClock, S: PresentationSink>(parts: WorkerParts<C, S>, commands: Receiver<Command>) -> u64 {
    let WorkerParts { mut world, renderer, mut target, mut clock, mut sink, max_frames } = parts;
    let mut controls = Controls::default();
    let mut frames = 0u64;
    log::info!("render worker started, {}x{}", target.width(), target.height());

    'frames: loop {
        loop {
            match commands.try_recv() {
                Ok(Command::Start(axis)) => controls.start(axis),
                Ok(Command::Stop(axis)) => controls.stop(axis),
                Ok(Command::Shutdown) | Err(TryRecvError::Disconnected) => break 'frames,
                Err(TryRecvError::Empty) => break,
            }
        }
        if max_frames.is_some_and(|max| frames >= max) {
            break;
        }

        let dt = clock.tick();
        world.update(dt, &controls);
        target.clear();
        let stats = renderer.render_frame(&world, &target);
        let stride = target.stride();
        if !sink.present(target.resolve(), stride, &stats) {
            log::info!("presentation sink closed");
            break;
        }
        frames += 1;
    }

    log::info!("render worker stopped after {frames} frames");
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_is_constant() {
        let mut clock = FixedClock { step: 0.02 };
        assert_eq!(clock.tick(), 0.02);
        assert_eq!(clock.tick(), 0.02);
    }

    #[test]
    fn system_clock_moves_forward() {
        let mut clock = SystemClock::new();
        thread::sleep(std::time::Duration::from_millis(5));
        assert!(clock.tick() >= 0.004);
        assert!(clock.tick() < 1.0);
    }

    #[test]
    fn channel_sink_reports_a_closed_receiver() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut sink = ChannelSink::new(tx);
        assert!(sink.present(&[1, 2, 3, 4], 4, &FrameStats::default()));
        assert_eq!(rx.recv().unwrap().pixels, vec![1, 2, 3, 4]);
        drop(rx);
        assert!(!sink.present(&[0; 4], 4, &FrameStats::default()));
    }

    #[test]
    fn channel_sink_drops_frames_when_full() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let mut sink = ChannelSink::new(tx);
        assert!(sink.present(&[1; 4], 4, &FrameStats::default()));
        assert!(sink.present(&[2; 4], 4, &FrameStats::default()));
        assert_eq!(rx.recv().unwrap().pixels, vec![1; 4]);
        assert!(rx.try_recv().is_err());
    }
}
