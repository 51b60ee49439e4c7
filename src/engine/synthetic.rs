use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
    thread::{self, JoinHandle},
    time::Instant,
};

use log::{debug, info};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::{Counter, EngineFactory, EngineSession, Frame, SessionRequest};
use crate::core::{EngineError, Scene};
use crate::session::{FatalReporter, Severity};

/// Rays traced per sample; only feeds the ray counter.
const BOUNCE_DEPTH: u64 = 4;
/// Passes between two published frames.
const PUBLISH_EVERY: u64 = 8;

/// Builds [`SyntheticEngine`] sessions. The device selection is a string of `0`/`1`
/// flags, one per device; every enabled device contributes one worker thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct SyntheticEngineFactory;

impl EngineFactory for SyntheticEngineFactory {
    fn create(
        &self,
        request: &SessionRequest,
        reporter: FatalReporter,
    ) -> Result<Box<dyn EngineSession>, EngineError> {
        let threads = parse_selection(&request.device_selection)?;
        let mut builder =
            ThreadPoolBuilder::new().thread_name(|i| format!("render-bench-worker-{}", i));
        if let Some(n) = threads {
            builder = builder.num_threads(n);
        }
        let pool = builder
            .build()
            .map_err(|e| EngineError::Runtime(e.to_string()))?;
        debug!(
            "synthetic engine for {} with {} worker(s)",
            request.scene,
            pool.current_num_threads()
        );
        Ok(Box::new(SyntheticEngine::new(request.scene, pool, reporter)))
    }
}

/// Number of enabled devices in `selection`, `None` when nothing was selected yet.
pub fn parse_selection(selection: &str) -> Result<Option<usize>, EngineError> {
    if selection.is_empty() {
        return Ok(None);
    }
    let mut enabled = 0;
    for ch in selection.chars() {
        match ch {
            '1' => enabled += 1,
            '0' => {}
            other => {
                return Err(EngineError::Runtime(format!(
                    "malformed device selection {:?}: unexpected {:?}",
                    selection, other
                )))
            }
        }
    }
    if enabled == 0 {
        return Err(EngineError::device("no compute device selected", -1));
    }
    Ok(Some(enabled))
}

struct Film {
    width: usize,
    height: usize,
    seed: u64,
    accum: Vec<[f32; 3]>,
}

impl Film {
    fn new(scene: Scene) -> Self {
        let (width, height) = scene.film_size();
        Self {
            width,
            height,
            seed: scene as u64 + 1,
            accum: vec![[0.0; 3]; width * height],
        }
    }

    /// Adds one jittered sample to every pixel, one row per task.
    fn accumulate(&mut self, pass: u64) {
        let (width, height, seed) = (self.width, self.height, self.seed);
        self.accum
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.iter_mut().enumerate() {
                    let s = shade(x, y, width, height, pass, seed);
                    px[0] += s[0];
                    px[1] += s[1];
                    px[2] += s[2];
                }
            });
    }

    fn tonemap(&self, passes: u64, out: &mut Frame) {
        if out.width != self.width || out.height != self.height {
            *out = Frame::new(self.width, self.height);
        }
        let inv = 1.0 / passes.max(1) as f32;
        out.pixels
            .par_chunks_mut(3)
            .zip(self.accum.par_iter())
            .for_each(|(dst, src)| {
                for c in 0..3 {
                    dst[c] = ((src[c] * inv).clamp(0.0, 1.0) * 255.0) as u8;
                }
            });
    }

    fn samples_per_pass(&self) -> u64 {
        (self.width * self.height) as u64
    }
}

fn splitmix(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

fn shade(x: usize, y: usize, width: usize, height: usize, pass: u64, seed: u64) -> [f32; 3] {
    let h = splitmix(seed ^ (pass << 40) ^ ((y as u64) << 20) ^ x as u64);
    let jx = (h & 0xFFFF) as f32 / 65535.0;
    let jy = ((h >> 16) & 0xFFFF) as f32 / 65535.0;
    let u = (x as f32 + jx) / width as f32;
    let v = (y as f32 + jy) / height as f32;
    let d = ((u - 0.5) * (u - 0.5) + (v - 0.5) * (v - 0.5)).sqrt();
    let ball = if d < 0.3 { 1.0 - d / 0.3 } else { 0.0 };
    [0.2 + 0.8 * ball, 0.2 + 0.6 * ball * v, 0.3 + 0.4 * (1.0 - v)]
}

struct Shared {
    stop: AtomicBool,
    passes: AtomicU64,
    samples: AtomicU64,
    frame: Mutex<Frame>,
}

/// Progressive, data-parallel stand-in for a real renderer. Useful to exercise the
/// harness end to end; the numbers it produces only measure this machine's CPU.
pub struct SyntheticEngine {
    scene: Scene,
    pool: Arc<ThreadPool>,
    shared: Arc<Shared>,
    started: Option<Instant>,
    worker: Option<JoinHandle<()>>,
    reporter: FatalReporter,
}

impl SyntheticEngine {
    pub fn new(scene: Scene, pool: ThreadPool, reporter: FatalReporter) -> Self {
        let (width, height) = scene.film_size();
        Self {
            scene,
            pool: Arc::new(pool),
            shared: Arc::new(Shared {
                stop: AtomicBool::new(false),
                passes: AtomicU64::new(0),
                samples: AtomicU64::new(0),
                frame: Mutex::new(Frame::new(width, height)),
            }),
            started: None,
            worker: None,
            reporter,
        }
    }

    fn render_loop(scene: Scene, pool: Arc<ThreadPool>, shared: Arc<Shared>) {
        let mut film = Film::new(scene);
        let mut pass = 0;
        while !shared.stop.load(Ordering::Acquire) {
            pool.install(|| film.accumulate(pass));
            pass += 1;
            shared.passes.store(pass, Ordering::Release);
            shared
                .samples
                .fetch_add(film.samples_per_pass(), Ordering::Relaxed);

            if pass == 1 || pass % PUBLISH_EVERY == 0 {
                let mut guard = shared.frame.lock().unwrap_or_else(PoisonError::into_inner);
                let frame: &mut Frame = &mut guard;
                pool.install(|| film.tonemap(pass, frame));
            }
        }
        debug!("synthetic engine stopped after {} passes", pass);
    }
}

impl EngineSession for SyntheticEngine {
    fn start(&mut self) -> Result<(), EngineError> {
        if self.started.is_some() {
            return Err(EngineError::Runtime("session already started".into()));
        }
        let (scene, pool, shared) = (self.scene, self.pool.clone(), self.shared.clone());
        let worker = thread::Builder::new()
            .name("synthetic-engine".into())
            .spawn(move || Self::render_loop(scene, pool, shared))
            .map_err(|e| EngineError::Runtime(e.to_string()))?;
        self.worker = Some(worker);
        self.started = Some(Instant::now());
        self.reporter
            .report(Severity::Info, &format!("rendering {} started", self.scene));
        Ok(())
    }

    fn stop(&mut self) {
        self.shared.stop.store(true, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                self.reporter
                    .report(Severity::Severe, "synthetic render worker panicked");
            } else {
                info!("synthetic engine for {} released", self.scene);
            }
        }
    }

    fn is_ready(&self) -> bool {
        self.shared.passes.load(Ordering::Acquire) > 0
    }

    fn pull_frame(&self) -> Frame {
        self.shared
            .frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn pull_counter(&self, counter: Counter) -> f64 {
        match counter {
            Counter::SampleCount => self.shared.samples.load(Ordering::Relaxed) as f64,
            Counter::ElapsedTime => self
                .started
                .map(|t| t.elapsed().as_secs_f64())
                .unwrap_or(0.0),
            Counter::RayCount => {
                (self.shared.samples.load(Ordering::Relaxed) * BOUNCE_DEPTH) as f64
            }
            Counter::TriangleCount => self.scene.triangle_count() as f64,
        }
    }
}

impl Drop for SyntheticEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Mode;
    use std::time::Duration;

    #[test]
    fn empty_selection_uses_default_pool() {
        assert_eq!(parse_selection("").unwrap(), None);
    }

    #[test]
    fn selection_counts_enabled_devices() {
        assert_eq!(parse_selection("1011").unwrap(), Some(3));
    }

    #[test]
    fn all_disabled_is_a_device_error() {
        let err = parse_selection("000").unwrap_err();
        assert!(matches!(err, EngineError::Device { code: -1, .. }));
    }

    #[test]
    fn garbage_selection_is_a_runtime_error() {
        assert!(matches!(
            parse_selection("1x0"),
            Err(EngineError::Runtime(_))
        ));
    }

    #[test]
    fn tonemap_averages_passes() {
        let mut film = Film::new(Scene::LuxBall);
        film.accum.iter_mut().for_each(|px| *px = [1.0, 0.5, 4.0]);
        let mut frame = Frame::default();
        film.tonemap(2, &mut frame);
        assert_eq!((frame.width, frame.height), Scene::LuxBall.film_size());
        assert_eq!(&frame.pixels[..3], &[127, 63, 255]);
    }

    #[test]
    fn engine_renders_until_stopped() {
        let request = SessionRequest {
            scene: Scene::LuxBall,
            mode: Mode::Interactive,
            device_selection: "1".into(),
        };
        let mut engine = SyntheticEngineFactory
            .create(&request, FatalReporter::detached())
            .unwrap();
        engine.start().unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while !engine.is_ready() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(engine.is_ready());
        assert!(engine.pull_counter(Counter::SampleCount) >= (512 * 512) as f64);
        let frame = engine.pull_frame();
        assert_eq!(frame.pixels.len(), 512 * 512 * 3);

        engine.stop();
        let samples = engine.pull_counter(Counter::SampleCount);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(engine.pull_counter(Counter::SampleCount), samples);
        assert_eq!(
            engine.pull_counter(Counter::RayCount),
            samples * BOUNCE_DEPTH as f64
        );
        // second stop is harmless
        engine.stop();
    }

    #[test]
    fn double_start_is_rejected() {
        let pool = ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let mut engine = SyntheticEngine::new(Scene::Sala, pool, FatalReporter::detached());
        engine.start().unwrap();
        assert!(engine.start().is_err());
    }
}
