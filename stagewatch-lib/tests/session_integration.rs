//! Full sessions: a worker, a display loop drawing into memory, and scripted keys.

use core::time::Duration;
use ohno::app_err;
use stagewatch_lib::interactive::{
    ControllerOptions, InputSource, InteractiveController, KeyInput, ScriptedInput, SessionOutcome, SessionReport, Surface, supervise,
};
use stagewatch_lib::progress::{JobState, ProgressTracker, Stage};
use stagewatch_lib::render::{RenderOptions, RenderStyle, Renderer};
use stagewatch_lib::simulate;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tick::Clock;

/// A writer whose contents stay readable after the display loop takes ownership of it.
#[derive(Debug, Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

async fn run<F>(tracker: &ProgressTracker, style: RenderStyle, keys: Option<ScriptedInput>, worker: F) -> (SessionReport, String)
where
    F: Future<Output = stagewatch_lib::Result<()>> + Send + 'static,
{
    let input = keys.map(|keys| Box::new(keys) as Box<dyn InputSource>);
    run_with_input(tracker, style, input, worker).await
}

async fn run_with_input<F>(
    tracker: &ProgressTracker,
    style: RenderStyle,
    input: Option<Box<dyn InputSource>>,
    worker: F,
) -> (SessionReport, String)
where
    F: Future<Output = stagewatch_lib::Result<()>> + Send + 'static,
{
    let out = SharedBuffer::default();
    let options = ControllerOptions {
        refresh: Duration::from_millis(10),
        clear_on_complete: false,
    };
    let controller = InteractiveController::new(tracker.clone(), Renderer::new(style, RenderOptions::default()), options);
    let handle = controller.start(Surface::writer(out.clone()), input).unwrap();

    let report = supervise(tracker, handle, worker).await.unwrap();
    (report, out.text())
}

#[tokio::test]
async fn test_worker_success_completes_job() {
    let tracker = ProgressTracker::new("nightly crawl", &Clock::new_tokio());
    let worker = simulate(tracker.clone(), Duration::from_millis(120), None);

    let (report, out) = run(&tracker, RenderStyle::Detailed, None, worker).await;

    assert_eq!(report.outcome, SessionOutcome::Finished(JobState::Completed));
    assert_eq!(report.snapshot.state, JobState::Completed);
    assert_eq!(report.snapshot.remaining, Some(Duration::ZERO));
    assert!(out.contains("nightly crawl [Completed]"), "{out}");
}

#[tokio::test]
async fn test_worker_error_fails_job() {
    let tracker = ProgressTracker::new("nightly crawl", &Clock::new_tokio());
    let worker = async { Err::<(), _>(app_err!("connection timeout")) };

    let (report, out) = run(&tracker, RenderStyle::Minimal, None, worker).await;

    assert_eq!(report.outcome, SessionOutcome::Finished(JobState::Failed));
    assert!(report.snapshot.errors.iter().any(|e| e.contains("connection timeout")));
    assert!(out.contains("Failed"), "{out}");
    assert!(out.contains("error: connection timeout"), "{out}");
}

#[tokio::test]
async fn test_worker_panic_fails_job() {
    let tracker = ProgressTracker::new("nightly crawl", &Clock::new_tokio());
    let worker = async {
        let nothing: Option<()> = None;
        nothing.expect("worker blew up");
        Ok::<(), ohno::AppError>(())
    };

    let (report, _) = run(&tracker, RenderStyle::Compact, None, worker).await;

    assert_eq!(report.snapshot.state, JobState::Failed);
    assert!(report.snapshot.last_error().unwrap().starts_with("worker stopped unexpectedly"));
}

#[tokio::test]
async fn test_simulated_failure_names_the_stage() {
    let tracker = ProgressTracker::new("nightly crawl", &Clock::new_tokio());
    let worker = simulate(tracker.clone(), Duration::from_millis(120), Some(Stage::Analysis));

    let (report, _) = run(&tracker, RenderStyle::Animated, None, worker).await;

    assert_eq!(report.snapshot.state, JobState::Failed);
    assert_eq!(report.snapshot.stage, Stage::Analysis);
    assert_eq!(report.snapshot.last_error(), Some("simulated failure in Analysis"));
}

#[tokio::test]
async fn test_operator_cancel_stops_worker() {
    let tracker = ProgressTracker::new("nightly crawl", &Clock::new_tokio());
    let worker = simulate(tracker.clone(), Duration::from_secs(30), None);
    let keys = ScriptedInput::default().then_after(Duration::from_millis(50), KeyInput::Char('c'));

    let (report, out) = run(&tracker, RenderStyle::Detailed, Some(keys), worker).await;

    assert_eq!(report.outcome, SessionOutcome::Finished(JobState::Cancelled));
    assert_eq!(report.snapshot.state, JobState::Cancelled);
    assert_eq!(report.snapshot.remaining, None);
    assert!(out.contains("[Cancelled]"), "{out}");
}

#[tokio::test]
async fn test_ctrl_c_cancels() {
    let tracker = ProgressTracker::new("nightly crawl", &Clock::new_tokio());
    let worker = simulate(tracker.clone(), Duration::from_secs(30), None);
    let keys = ScriptedInput::new([KeyInput::CtrlC]);

    let (report, _) = run(&tracker, RenderStyle::Minimal, Some(keys), worker).await;
    assert_eq!(report.snapshot.state, JobState::Cancelled);
}

#[tokio::test]
async fn test_quit_detaches_and_job_finishes() {
    let tracker = ProgressTracker::new("nightly crawl", &Clock::new_tokio());
    let worker = simulate(tracker.clone(), Duration::from_millis(200), None);
    let keys = ScriptedInput::default().then_after(Duration::from_millis(20), KeyInput::Char('q'));

    let (report, _) = run(&tracker, RenderStyle::Minimal, Some(keys), worker).await;

    assert_eq!(report.outcome, SessionOutcome::Detached);
    assert_eq!(report.snapshot.state, JobState::Completed);
}

#[tokio::test]
async fn test_quit_while_paused_resumes_job() {
    let tracker = ProgressTracker::new("nightly crawl", &Clock::new_tokio());
    let worker = simulate(tracker.clone(), Duration::from_millis(200), None);
    let keys = ScriptedInput::default()
        .then_after(Duration::from_millis(20), KeyInput::Char('p'))
        .then_after(Duration::from_millis(20), KeyInput::Char('q'));

    let (report, _) = run(&tracker, RenderStyle::Minimal, Some(keys), worker).await;

    assert_eq!(report.outcome, SessionOutcome::Detached);
    assert_eq!(report.snapshot.state, JobState::Completed);
}

#[tokio::test]
async fn test_pause_holds_worker_back() {
    let tracker = ProgressTracker::new("nightly crawl", &Clock::new_tokio());
    let worker = simulate(tracker.clone(), Duration::from_millis(600), None);
    let keys = ScriptedInput::default()
        .then_after(Duration::from_millis(30), KeyInput::Char(' '))
        .then_after(Duration::from_millis(220), KeyInput::Char(' '));

    let watcher = tracker.clone();
    let observer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let first = watcher.snapshot();
        tokio::time::sleep(Duration::from_millis(60)).await;
        let second = watcher.snapshot();
        (first, second)
    });

    let (report, _) = run(&tracker, RenderStyle::Minimal, Some(keys), worker).await;
    let (first, second) = observer.await.unwrap();

    assert_eq!(first.state, JobState::Paused);
    assert_eq!(second.state, JobState::Paused);
    assert_eq!(first.completed_steps, second.completed_steps);
    assert_eq!(report.snapshot.state, JobState::Completed);
}

/// Presses one key, then keeps the reader thread busy well after the display has ended.
#[derive(Debug)]
struct LingeringInput {
    key: Option<KeyInput>,
}

impl InputSource for LingeringInput {
    fn poll_key(&mut self, _timeout: Duration) -> io::Result<Option<KeyInput>> {
        if let Some(key) = self.key.take() {
            return Ok(Some(key));
        }
        std::thread::sleep(Duration::from_millis(300));
        Ok(None)
    }
}

#[tokio::test]
async fn test_worker_ending_while_display_winds_down() {
    let tracker = ProgressTracker::new("nightly crawl", &Clock::new_tokio());
    let worker = {
        let tracker = tracker.clone();
        async move {
            while !tracker.is_cancelled() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            Ok(())
        }
    };
    let input = LingeringInput {
        key: Some(KeyInput::Char('c')),
    };

    let (report, out) = run_with_input(&tracker, RenderStyle::Minimal, Some(Box::new(input)), worker).await;

    assert_eq!(report.outcome, SessionOutcome::Finished(JobState::Cancelled));
    assert_eq!(report.snapshot.state, JobState::Cancelled);
    assert!(out.contains("Cancelled"), "{out}");
}

#[tokio::test]
async fn test_start_leaves_paused_job_paused() {
    let tracker = ProgressTracker::new("nightly crawl", &Clock::new_tokio());
    let _ = tracker.start();
    let _ = tracker.pause();

    assert!(!tracker.start().is_applied());
    assert_eq!(tracker.state(), JobState::Paused);

    // a late start from the session must not undo an operator pause either
    let worker = {
        let tracker = tracker.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            let state = tracker.state();
            if state != JobState::Paused {
                return Err(app_err!("job was {state}"));
            }
            let _ = tracker.cancel();
            Ok(())
        }
    };

    let (report, _) = run(&tracker, RenderStyle::Minimal, None, worker).await;
    assert_eq!(report.snapshot.state, JobState::Cancelled);
    assert!(report.snapshot.errors.is_empty(), "{:?}", report.snapshot.errors);
}
