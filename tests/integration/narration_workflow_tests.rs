/*!
 * Integration tests for narration driven by the headless clock media
 */

use std::sync::Arc;
use std::time::Duration;

use histomap::app_config::Config;
use histomap::app_controller::{Controller, ViewerCommand};
use histomap::event_model::{Cue, Event};
use histomap::media::clock::ClockMediaBackend;
use histomap::playback::PlaybackState;
use histomap::temporal_range::{ResponseOutcome, YearBounds};
use crate::common::{self, mock_sources::StaticSource, recording_surface::RecordingSurface};

const TICK: Duration = Duration::from_millis(250);

fn short_narration() -> Event {
    Event {
        audio_url: Some("https://audio.example/sacre.mp3".to_string()),
        subtitles: Some(vec![Cue::new(0.0, 0.5, "A"), Cue::new(0.5, 1.0, "B")]),
        ..common::event("Sacre de Napoléon", 1804)
    }
}

async fn controller_with(backend: ClockMediaBackend) -> Controller<RecordingSurface> {
    let source = Arc::new(StaticSource::new(vec![short_narration()]));
    let mut controller = Controller::with_parts(
        Config::default(),
        source,
        Arc::new(backend),
        YearBounds { min: -300, max: 2024 },
        RecordingSurface::new(),
    )
    .unwrap();
    controller.start();
    assert!(matches!(controller.settle().await, Some(ResponseOutcome::Applied { count: 1 })));
    controller
}

fn cue_text(controller: &Controller<RecordingSurface>) -> Option<String> {
    let view = controller.view_for_marker(0)?;
    controller
        .presenter()
        .surface()
        .last_detail(view)
        .and_then(|detail| detail.cue_text.clone())
}

#[tokio::test(start_paused = true)]
async fn test_narration_withClockMedia_shouldFollowCuesAndStopOnClose() {
    common::init_logger();
    let mut controller = controller_with(ClockMediaBackend::new(TICK)).await;

    controller.execute(ViewerCommand::Open(0));
    let view = controller.view_for_marker(0).unwrap();
    assert_eq!(cue_text(&controller).as_deref(), Some("A"));

    controller.execute(ViewerCommand::Toggle(0));
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(controller.drain_ticks(), 2);

    // 0.5 sits on the shared boundary, the earlier cue wins
    let session = controller.playback().session(view).unwrap();
    assert_eq!(session.current_time(), 0.5);
    assert_eq!(session.active_cue().map(|c| c.text.as_str()), Some("A"));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(controller.drain_ticks(), 1);
    assert_eq!(controller.playback().session(view).unwrap().current_time(), 0.75);
    assert_eq!(cue_text(&controller).as_deref(), Some("B"));

    controller.execute(ViewerCommand::Close(0));
    assert!(controller.playback().session(view).is_none());

    // The ticker is gone, nothing more is delivered
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(controller.drain_ticks(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_narration_pausedMidway_shouldFreezePosition() {
    let mut controller = controller_with(ClockMediaBackend::new(TICK)).await;

    controller.execute(ViewerCommand::Open(0));
    let view = controller.view_for_marker(0).unwrap();
    controller.execute(ViewerCommand::Toggle(0));
    tokio::time::sleep(Duration::from_millis(300)).await;
    controller.drain_ticks();

    controller.execute(ViewerCommand::Toggle(0));
    let session = controller.playback().session(view).unwrap();
    assert_eq!(session.state(), PlaybackState::Paused);
    assert_eq!(session.current_time(), 0.25);

    tokio::time::sleep(Duration::from_secs(1)).await;
    controller.drain_ticks();
    assert_eq!(controller.playback().session(view).unwrap().current_time(), 0.25);

    // Resuming continues from the paused position
    controller.execute(ViewerCommand::Toggle(0));
    tokio::time::sleep(Duration::from_millis(300)).await;
    controller.drain_ticks();
    assert_eq!(controller.playback().session(view).unwrap().current_time(), 0.5);
}

#[tokio::test(start_paused = true)]
async fn test_narration_reachingEnd_shouldPauseKeepLastCueAndReplayFromStart() {
    let backend = ClockMediaBackend::new(TICK).with_duration(Duration::from_secs(1));
    let mut controller = controller_with(backend).await;

    controller.execute(ViewerCommand::Open(0));
    let view = controller.view_for_marker(0).unwrap();
    controller.execute(ViewerCommand::Toggle(0));
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(controller.drain_ticks(), 4);

    let session = controller.playback().session(view).unwrap();
    assert_eq!(session.current_time(), 1.0);
    assert_eq!(session.state(), PlaybackState::Paused);
    // The last cue still covers its inclusive end
    assert_eq!(session.active_cue().map(|c| c.text.as_str()), Some("B"));
    let detail = controller.presenter().surface().last_detail(view).unwrap();
    assert_eq!(detail.narration.as_ref().unwrap().button_label, "Play narration");

    // Playing again starts over
    controller.execute(ViewerCommand::Toggle(0));
    let session = controller.playback().session(view).unwrap();
    assert_eq!(session.state(), PlaybackState::Playing);
    assert_eq!(session.current_time(), 0.0);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(controller.drain_ticks(), 1);
    assert_eq!(controller.playback().session(view).unwrap().current_time(), 0.25);
    assert_eq!(cue_text(&controller).as_deref(), Some("A"));
}
