/*!
 * Integration tests for the viewer controller over mock sources and media
 */

use std::sync::Arc;

use histomap::app_config::Config;
use histomap::app_controller::{Controller, Flow, ViewerCommand};
use histomap::errors::{AppError, FetchError};
use histomap::playback::PlaybackState;
use histomap::temporal_range::{ResponseOutcome, TemporalRange, YearBounds};
use crate::common::{
    self,
    mock_media::RecordingBackend,
    mock_sources::{GatedSource, StaticSource},
    recording_surface::RecordingSurface,
};

const BOUNDS: YearBounds = YearBounds { min: -300, max: 2024 };

fn corpus() -> Vec<histomap::Event> {
    vec![
        common::narrated_event("Fondation de Lutèce", -250),
        common::event("Prise de la Bastille", 1789),
        common::narrated_event("Commune de Paris", 1871),
    ]
}

fn titles(controller: &Controller<RecordingSurface>) -> Vec<String> {
    controller
        .presenter()
        .surface()
        .markers
        .iter()
        .map(|m| m.title.clone())
        .collect()
}

#[tokio::test]
async fn test_viewer_lifecycle_withStaticSource_shouldQueryRenderAndRelease() {
    common::init_logger();
    let source = Arc::new(StaticSource::new(corpus()));
    let tracker = source.tracker();
    let backend = Arc::new(RecordingBackend::new());
    let mut controller =
        Controller::with_parts(Config::default(), source.clone(), backend.clone(), BOUNDS, RecordingSurface::new())
            .unwrap();

    assert_eq!(controller.presenter().surface().view, Some((48.8566, 2.3522, 12)));

    // Initial query covers the full window
    controller.start();
    assert!(matches!(controller.settle().await, Some(ResponseOutcome::Applied { count: 3 })));
    assert_eq!(tracker.lock().unwrap().ranges, vec![TemporalRange::new(-300, 2024)]);
    assert_eq!(tracker.lock().unwrap().last_limit, Some(500));
    assert_eq!(titles(&controller).len(), 3);

    // Open and play the first narrated event
    assert_eq!(controller.execute(ViewerCommand::Open(0)), Flow::Continue);
    let view = controller.view_for_marker(0).unwrap();
    controller.execute(ViewerCommand::Toggle(0));
    assert_eq!(controller.playback().session(view).unwrap().state(), PlaybackState::Playing);

    // Narrowing the range re-renders markers, the open view survives
    controller.execute(ViewerCommand::From(1700));
    assert!(matches!(controller.settle().await, Some(ResponseOutcome::Applied { count: 2 })));
    assert_eq!(titles(&controller), vec!["Prise de la Bastille", "Commune de Paris"]);
    assert_eq!(controller.presenter().open_views(), 1);

    // Out-of-window years are clamped
    controller.execute(ViewerCommand::To(5000));
    controller.settle().await;
    assert_eq!(controller.range().range(), TemporalRange::new(1700, 2024));

    controller.shutdown();
    assert!(controller.playback().is_empty());
    assert_eq!(controller.presenter().open_views(), 0);
    let tap = backend.last_tap().unwrap();
    assert_eq!(tap.stop_calls(), 1);
    assert_eq!(tap.listener_count(), 0);
}

#[tokio::test]
async fn test_viewer_withFailingQuery_shouldKeepDisplayedMarkers() {
    let source = Arc::new(StaticSource::new(corpus()));
    let backend = Arc::new(RecordingBackend::new());
    let mut controller =
        Controller::with_parts(Config::default(), source.clone(), backend, BOUNDS, RecordingSurface::new())
            .unwrap();

    controller.start();
    controller.settle().await;
    source.fail_from_now();

    controller.execute(ViewerCommand::To(1800));
    let outcome = controller.settle().await;
    assert!(matches!(
        outcome,
        Some(ResponseOutcome::Failed(FetchError::Status { status_code: 503, .. }))
    ));
    assert_eq!(titles(&controller).len(), 3);
    assert_eq!(controller.range().events().len(), 3);
}

#[tokio::test]
async fn test_viewer_withResponsesInAnyOrder_shouldRenderLatestQuery() {
    let source = Arc::new(GatedSource::new());
    let first = source.gate(TemporalRange::new(-300, 2024));
    let second = source.gate(TemporalRange::new(1800, 2024));
    let backend = Arc::new(RecordingBackend::new());
    let mut controller =
        Controller::with_parts(Config::default(), source.clone(), backend, BOUNDS, RecordingSurface::new())
            .unwrap();

    controller.start();
    controller.execute(ViewerCommand::From(1800));

    // The older query completes last in wall time but may be received first
    second.send(Ok(vec![common::event("Commune de Paris", 1871)])).unwrap();
    first.send(Ok(corpus())).unwrap();

    assert!(matches!(controller.settle().await, Some(ResponseOutcome::Applied { count: 1 })));
    assert_eq!(titles(&controller), vec!["Commune de Paris"]);
    assert_eq!(controller.range().applied_seq(), Some(2));
}

#[tokio::test]
async fn test_viewer_commandsOnUnknownMarkers_shouldContinue() {
    let source = Arc::new(StaticSource::new(corpus()));
    let backend = Arc::new(RecordingBackend::new());
    let mut controller =
        Controller::with_parts(Config::default(), source, backend.clone(), BOUNDS, RecordingSurface::new())
            .unwrap();

    controller.start();
    controller.settle().await;

    assert_eq!(controller.execute(ViewerCommand::Open(42)), Flow::Continue);
    assert_eq!(controller.execute(ViewerCommand::Toggle(1)), Flow::Continue);
    assert_eq!(controller.execute(ViewerCommand::Close(1)), Flow::Continue);
    assert_eq!(controller.execute(ViewerCommand::List), Flow::Continue);
    assert_eq!(controller.execute(ViewerCommand::Quit), Flow::Quit);
    assert!(backend.taps().is_empty());
}

#[tokio::test]
async fn test_run_withScriptedInput_shouldStopOnQuit() {
    common::init_logger();
    let source = Arc::new(StaticSource::new(corpus()));
    let tracker = source.tracker();
    let backend = Arc::new(RecordingBackend::new());
    let mut controller =
        Controller::with_parts(Config::default(), source, backend, BOUNDS, RecordingSurface::new())
            .unwrap();

    let input: &[u8] = b"\nbogus command\nlist\nquit\nfrom 0\n";
    controller.run(input).await.unwrap();

    // The line after quit is never executed
    assert_eq!(controller.range().range(), TemporalRange::new(-300, 2024));
    assert_eq!(controller.range().latest_seq(), 1);
    assert!(tracker.lock().unwrap().ranges.len() <= 1);
    assert!(controller.playback().is_empty());
}

#[test]
fn test_with_parts_withInvalidConfig_shouldFail() {
    let config = Config {
        query_limit: 0,
        ..Config::default()
    };
    let result = Controller::with_parts(
        config,
        Arc::new(StaticSource::new(Vec::new())),
        Arc::new(RecordingBackend::new()),
        BOUNDS,
        RecordingSurface::new(),
    );
    assert!(result.is_err());
}

#[test]
fn test_with_config_shouldBuildHttpAndClockStack() {
    let result = tokio_test::block_on(async {
        let config = Config {
            backend_url: "http://127.0.0.1:9".to_string(),
            ..Config::default()
        };
        Controller::with_config(config, RecordingSurface::new())
    });

    let controller = result.unwrap();
    assert_eq!(controller.config().backend_url, "http://127.0.0.1:9");
    assert_eq!(controller.range().latest_seq(), 0);
    assert!(controller.playback().is_empty());

    let bad = Config {
        backend_url: "not a url".to_string(),
        ..Config::default()
    };
    assert!(Controller::with_config(bad, RecordingSurface::new()).is_err());
}

#[tokio::test]
async fn test_open_afterRangeChange_shouldShowEventNowAtThatMarker() {
    let source = Arc::new(StaticSource::new(corpus()));
    let backend = Arc::new(RecordingBackend::new());
    let mut controller =
        Controller::with_parts(Config::default(), source, backend.clone(), BOUNDS, RecordingSurface::new())
            .unwrap();

    controller.start();
    controller.settle().await;
    controller.execute(ViewerCommand::Open(0));
    let lutece = controller.view_for_marker(0).unwrap();

    controller.execute(ViewerCommand::From(1700));
    controller.settle().await;
    assert_eq!(titles(&controller)[0], "Prise de la Bastille");
    assert_eq!(controller.view_for_marker(0), None);

    controller.execute(ViewerCommand::Open(0));
    let bastille = controller.view_for_marker(0).unwrap();
    assert_ne!(bastille, lutece);
    let shown = controller.presenter().surface().last_detail(bastille).unwrap();
    assert_eq!(shown.title, "Prise de la Bastille");

    // Toggle and close by marker leave the detached view alone
    controller.execute(ViewerCommand::Toggle(0));
    controller.execute(ViewerCommand::Close(0));
    assert_eq!(controller.playback().session(lutece).unwrap().state(), PlaybackState::Idle);
    assert_eq!(controller.presenter().open_views(), 1);

    controller.execute(ViewerCommand::CloseAll);
    assert_eq!(controller.presenter().open_views(), 0);
    assert!(controller.playback().is_empty());
    assert_eq!(backend.last_tap().unwrap().stop_calls(), 1);
}

#[tokio::test]
async fn test_run_withInputReadError_shouldReleaseSessionsThenFail() {
    let source = Arc::new(StaticSource::new(corpus()));
    let backend = Arc::new(RecordingBackend::new());
    let mut controller =
        Controller::with_parts(Config::default(), source, backend.clone(), BOUNDS, RecordingSurface::new())
            .unwrap();
    controller.start();
    controller.settle().await;

    let input = tokio_test::io::Builder::new()
        .read(b"open 0\n")
        .read_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin closed"))
        .build();
    let result = controller.run(tokio::io::BufReader::new(input)).await;

    assert!(matches!(result, Err(AppError::Io(_))));
    assert!(controller.playback().is_empty());
    assert_eq!(controller.presenter().open_views(), 0);
    let tap = backend.last_tap().unwrap();
    assert_eq!(tap.stop_calls(), 1);
    assert_eq!(tap.listener_count(), 0);
}
