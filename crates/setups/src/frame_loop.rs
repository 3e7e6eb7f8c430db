use cosmos_input::CosmicEntropy;
use cosmos_solver::SolveReport;
use cosmos_view::{
    Frame, FramePublisher, FrameSubscriber, VisibilityJob, WorkerPool, frame_channel,
};
use std::fmt;
use std::time::{Duration, Instant};

use crate::{AppConfig, LoopSettings, Setup, SetupError};

/// Phases of one rendered frame, always run in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FramePhase {
    Input,
    ReloadViewables,
    AdvanceSetup,
    EnqueueRenderJobs,
    Present,
}

impl fmt::Display for FramePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FramePhase::Input => "input",
            FramePhase::ReloadViewables => "reload-viewables",
            FramePhase::AdvanceSetup => "advance-setup",
            FramePhase::EnqueueRenderJobs => "enqueue-render-jobs",
            FramePhase::Present => "present",
        })
    }
}

#[derive(Debug, Default)]
pub struct FrameOutcome {
    /// Reports of the logic steps run this frame.
    pub steps: Vec<SolveReport>,
    /// Whether the audiovisual state was resampled.
    pub resampled: bool,
    /// Step of the frame handed to presentation.
    pub presented: u64,
    pub phases: Vec<(FramePhase, Duration)>,
}

impl FrameOutcome {
    fn timed<R>(&mut self, phase: FramePhase, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let result = f();
        self.phases.push((phase, start.elapsed()));
        result
    }
}

/// Drives the active setup at a fixed logic rate from variable-length
/// rendered frames, and publishes one [`Frame`] per rendered frame.
pub struct FrameLoop {
    setup: Setup,
    publisher: FramePublisher<Frame>,
    pool: WorkerPool,
    settings: LoopSettings,
    tick_seconds: f64,
    accumulator: f64,
    input: CosmicEntropy,
}

impl FrameLoop {
    /// The subscriber is the presentation side's only way to see frames.
    pub fn new(setup: Setup, config: &AppConfig) -> Result<(Self, FrameSubscriber<Frame>), SetupError> {
        let pool = WorkerPool::new(config.frame.worker_threads)?;
        let (publisher, subscriber) = frame_channel();
        let tick_seconds = f64::from(setup.viewed_cosmos().delta().ms) / 1000.0;
        Ok((
            Self {
                setup,
                publisher,
                pool,
                settings: config.frame_loop,
                tick_seconds,
                accumulator: 0.0,
                input: CosmicEntropy::new(),
            },
            subscriber,
        ))
    }

    /// Collect input for the next logic step.
    pub fn queue_input(&mut self, entropy: CosmicEntropy) {
        self.input.merge(entropy);
    }

    /// Run every phase once for a frame that took `dt` seconds.
    pub fn run_frame(&mut self, dt: f32) -> Result<FrameOutcome, SetupError> {
        let mut outcome = FrameOutcome::default();

        let mut input = outcome.timed(FramePhase::Input, || std::mem::take(&mut self.input));

        outcome.resampled = outcome.timed(FramePhase::ReloadViewables, || {
            self.setup.reload_viewables()
        });

        let steps = outcome.timed(FramePhase::AdvanceSetup, || {
            self.advance_setup(&mut input, dt)
        })?;
        outcome.steps = steps;
        if !input.is_empty() {
            // No step ran this frame; keep the input for the next one.
            self.input = input;
        }

        let step = outcome.timed(FramePhase::EnqueueRenderJobs, || self.fill_back_buffer());

        outcome.timed(FramePhase::Present, || self.publisher.present(step));
        outcome.presented = step;
        Ok(outcome)
    }

    fn advance_setup(
        &mut self,
        input: &mut CosmicEntropy,
        dt: f32,
    ) -> Result<Vec<SolveReport>, SetupError> {
        let _span = tracing::debug_span!("advance_setup", kind = %self.setup.kind()).entered();
        self.accumulator += f64::from(dt);
        let mut steps = Vec::new();
        while self.accumulator >= self.tick_seconds {
            if steps.len() as u32 >= self.settings.max_steps_per_frame {
                tracing::debug!(
                    behind_s = self.accumulator,
                    "frame loop falling behind, dropping time"
                );
                self.accumulator = 0.0;
                break;
            }
            self.accumulator -= self.tick_seconds;
            // Input belongs to the first step of the frame only.
            let entropy = std::mem::take(input);
            if let Some(report) = self.setup.advance(&entropy)? {
                steps.push(report);
            }
        }
        self.setup.advance_audiovisual(dt);
        Ok(steps)
    }

    fn fill_back_buffer(&self) -> u64 {
        let cosmos = self.setup.viewed_cosmos();
        let audiovisual = self.setup.audiovisual();
        let visible = VisibilityJob::for_sentient(cosmos, self.settings.visibility_range)
            .run(cosmos, &self.pool);
        self.publisher.buffer().write(|frame| {
            frame.fill_from(cosmos, audiovisual);
            frame.visible = visible;
        });
        cosmos.step()
    }

    pub fn setup(&self) -> &Setup {
        &self.setup
    }

    pub fn setup_mut(&mut self) -> &mut Setup {
        &mut self.setup
    }

    pub fn worker_threads(&self) -> usize {
        self.pool.threads()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestSceneSetup;
    use cosmos_input::{Intent, IntentKind};
    use cosmos_view::{DebugTextRenderer, RenderView, Renderer};

    fn frame_loop() -> (FrameLoop, FrameSubscriber<Frame>) {
        let mut config = AppConfig::default();
        config.frame.worker_threads = 2;
        let setup = Setup::TestScene(TestSceneSetup::new(&config).unwrap());
        FrameLoop::new(setup, &config).unwrap()
    }

    #[test]
    fn phases_run_in_order() {
        let (mut frames, _subscriber) = frame_loop();
        let outcome = frames.run_frame(0.016).unwrap();
        let order: Vec<FramePhase> = outcome.phases.iter().map(|(p, _)| *p).collect();
        assert_eq!(
            order,
            vec![
                FramePhase::Input,
                FramePhase::ReloadViewables,
                FramePhase::AdvanceSetup,
                FramePhase::EnqueueRenderJobs,
                FramePhase::Present,
            ]
        );
        assert!(order.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn fixed_rate_from_variable_frames() {
        let (mut frames, _subscriber) = frame_loop();
        assert_eq!(frames.run_frame(0.010).unwrap().steps.len(), 0);
        assert_eq!(frames.run_frame(0.010).unwrap().steps.len(), 1);
        assert_eq!(frames.run_frame(0.040).unwrap().steps.len(), 2);
        assert_eq!(frames.setup().viewed_cosmos().step(), 3);
    }

    #[test]
    fn catch_up_is_bounded() {
        let (mut frames, _subscriber) = frame_loop();
        let outcome = frames.run_frame(10.0).unwrap();
        assert_eq!(outcome.steps.len(), 5);
        assert_eq!(frames.run_frame(0.0).unwrap().steps.len(), 0);
    }

    #[test]
    fn input_waits_for_a_step() {
        let (mut frames, _subscriber) = frame_loop();
        let player = frames.setup().viewed_character().unwrap();
        frames.queue_input(
            CosmicEntropy::new().with_intent(player, Intent::pressed(IntentKind::MoveRight)),
        );
        let outcome = frames.run_frame(0.001).unwrap();
        assert!(outcome.steps.is_empty());

        let outcome = frames.run_frame(0.020).unwrap();
        assert_eq!(outcome.steps.len(), 1);
        assert_eq!(outcome.steps[0].profile.entropy_length, 1);
    }

    #[test]
    fn presentation_sees_published_frames() {
        let (mut frames, subscriber) = frame_loop();
        frames.run_frame(0.020).unwrap();
        assert_eq!(subscriber.wait_next(Duration::from_secs(1)), Some(1));

        let frame = subscriber.latest();
        assert_eq!(frame.step, 1);
        assert!(!frame.entities.is_empty());
        assert!(!frame.visible.is_empty());
        let text = DebugTextRenderer::new().render(&frame, &RenderView::default());
        assert!(text.contains("step=1"));
    }

    #[test]
    fn first_frame_consumes_nothing_to_resample() {
        let (mut frames, _subscriber) = frame_loop();
        assert!(!frames.run_frame(0.0).unwrap().resampled);
        if let Setup::TestScene(s) = frames.setup_mut() {
            s.restart().unwrap();
        }
        assert!(frames.run_frame(0.0).unwrap().resampled);
    }
}
