mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Desk, FakeBackend, InputEvent, RecordingDriver, png_files};
use onboard_runner::core::{Bounds, Clock, ManualClock, RelativePoint};
use onboard_runner::input::ClipboardService;
use onboard_runner::runner::{Mode, REPORT_FILE, Runner};
use onboard_runner::{ActionStep, Config, Error};

fn config(dir: &std::path::Path) -> Config {
    Config {
        gateway_url: "ws://gateway.local:18789".to_string(),
        gateway_token: "977f8e028fcc5811a625c63e1141a221e13ef1783bc46338".to_string(),
        screenshot_dir: dir.to_path_buf(),
        ..Config::default()
    }
}

#[tokio::test]
async fn missing_window_aborts_without_screenshots() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = Arc::new(ManualClock::new());
    let backend = FakeBackend::new(clock.clone(), "Moltz", Bounds::new(0, 0, 800, 600), None);
    let desk = Desk::with(backend, clock, RecordingDriver::default());

    let runner = Runner::new(config(dir.path()), desk.platform());
    let err = runner.run(Mode::Auto, None).await.unwrap_err();

    assert!(matches!(err, Error::NotFound { .. }));
    assert!(png_files(dir.path()).is_empty());
    assert!(desk.driver.events().is_empty());
    assert!(desk.clock.now() <= Duration::from_millis(30_500));
}

#[tokio::test]
async fn manual_mode_only_takes_initial_screenshot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let desk = Desk::moltz();

    let runner = Runner::new(config(dir.path()), desk.platform());
    let report = runner.run(Mode::ScreenshotOnly, None).await.unwrap();

    assert_eq!(png_files(dir.path()), vec!["01_initial.png"]);
    assert_eq!(report.steps_run, 0);
    assert!(desk.driver.events().is_empty());
}

#[tokio::test]
async fn custom_steps_run_after_initial_screenshot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let desk = Desk::moltz();
    let steps = vec![
        ActionStep::Screenshot {
            name: "before".into(),
        },
        ActionStep::Click {
            point: RelativePoint::new(911, 415),
            description: "token field".into(),
        },
        ActionStep::TypeText {
            content: "tok".into(),
            description: "token field".into(),
        },
        ActionStep::Screenshot {
            name: "after".into(),
        },
    ];

    let mut cfg = config(dir.path());
    cfg.screenshot_dir = dir.path().join("shots");
    let shots = cfg.screenshot_dir.clone();

    let runner = Runner::new(cfg, desk.platform());
    let report = runner.run(Mode::Auto, Some(steps)).await.unwrap();

    assert_eq!(
        png_files(&shots),
        vec!["01_initial.png", "after.png", "before.png"]
    );
    assert_eq!(report.steps_run, 4);
    assert!(report.failures.is_empty());
    assert_eq!(
        desk.driver.events(),
        vec![
            InputEvent::Click(1011, 465),
            InputEvent::Key("ctrl+a".into()),
            InputEvent::Key("ctrl+v".into()),
        ]
    );
    assert_eq!(desk.clipboard.set_count(), 1);
}

#[tokio::test]
async fn auto_mode_runs_gateway_setup() {
    let dir = tempfile::tempdir().expect("tempdir");
    let desk = Desk::moltz();
    let cfg = config(dir.path());
    let token = cfg.gateway_token.clone();

    let runner = Runner::new(cfg, desk.platform());
    let report = runner.run(Mode::Auto, None).await.unwrap();
    runner.write_report(&report).await.unwrap();

    assert_eq!(
        png_files(dir.path()),
        vec![
            "01_initial.png",
            "02_token_field_clicked.png",
            "03_token_entered.png",
            "04_after_test.png",
            "05_final_state.png",
        ]
    );
    assert!(!report.aborted);
    assert_eq!(desk.clipboard.get().await.unwrap(), token);
    assert_eq!(
        desk.driver.events(),
        vec![
            InputEvent::Click(100 + 911, 50 + 414),
            InputEvent::Key("ctrl+a".into()),
            InputEvent::Key("ctrl+v".into()),
            InputEvent::Click(100 + 911, 50 + 514),
        ]
    );

    let saved = std::fs::read_to_string(dir.path().join(REPORT_FILE)).unwrap();
    let json: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(json["screenshots"].as_array().unwrap().len(), 5);
    assert!(!saved.contains(&token));
}

#[tokio::test]
async fn clipboard_failure_aborts_remaining_steps() {
    let dir = tempfile::tempdir().expect("tempdir");
    let desk = Desk::moltz();
    desk.clipboard.fail_next_set();

    let runner = Runner::new(config(dir.path()), desk.platform());
    let report = runner.run(Mode::Auto, None).await.unwrap();

    assert!(report.aborted);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].fatal);
    assert!(report.failures[0].error.contains("clipboard"));
    assert_eq!(
        png_files(dir.path()),
        vec!["01_initial.png", "02_token_field_clicked.png"]
    );
    // no paste and no click on the test button
    assert_eq!(
        desk.driver.events(),
        vec![InputEvent::Click(1011, 464), InputEvent::Key("ctrl+a".into())]
    );
}

#[tokio::test]
async fn activation_failure_is_only_a_warning() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = Arc::new(ManualClock::new());
    let mut backend = FakeBackend::new(
        clock.clone(),
        "Moltz",
        Bounds::new(100, 50, 1822, 1256),
        Some(Duration::ZERO),
    );
    backend.focus_fails = true;
    let desk = Desk::with(backend, clock, RecordingDriver::default());

    let runner = Runner::new(config(dir.path()), desk.platform());
    let report = runner.run(Mode::Auto, None).await.unwrap();

    assert!(!report.aborted);
    assert_eq!(report.failures.len(), 1);
    assert!(!report.failures[0].fatal);
    assert_eq!(png_files(dir.path()).len(), 5);
}

#[tokio::test]
async fn click_outside_window_is_rejected_before_input() {
    let dir = tempfile::tempdir().expect("tempdir");
    let desk = Desk::moltz();
    let steps = vec![
        ActionStep::Click {
            point: RelativePoint::new(5000, 10),
            description: "off the edge".into(),
        },
        ActionStep::Screenshot {
            name: "never".into(),
        },
    ];

    let runner = Runner::new(config(dir.path()), desk.platform());
    let report = runner.run(Mode::Auto, Some(steps)).await.unwrap();

    assert!(report.aborted);
    assert_eq!(report.steps_run, 1);
    assert!(desk.driver.events().is_empty());
    assert_eq!(png_files(dir.path()), vec!["01_initial.png"]);
}

#[tokio::test]
async fn failing_input_driver_aborts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = Arc::new(ManualClock::new());
    let backend = FakeBackend::new(
        clock.clone(),
        "Moltz",
        Bounds::new(0, 0, 1822, 1256),
        Some(Duration::ZERO),
    );
    let desk = Desk::with(backend, clock, RecordingDriver::failing());

    let runner = Runner::new(config(dir.path()), desk.platform());
    let report = runner.run(Mode::Auto, None).await.unwrap();

    assert!(report.aborted);
    assert_eq!(report.steps_run, 1);
    assert!(report.failures[0].error.contains("ydotool"));
}
