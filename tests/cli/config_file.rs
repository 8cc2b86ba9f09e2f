//! Configuration file tests

use std::time::Duration;

use clap::Parser;

use listscan::app::cli::{Args, LookupProvider};
use listscan::decoder::Symbology;
use listscan::session::ScanMode;

use crate::common::temp_file;

const CONFIG: &str = r#"
mode = "simulated"
timeout-ms = 4000
zoom = 2.0
symbologies = ["ean13", "upc_e"]
lookup = "simulated"
seed = 42
simulate-delay-ms = 500
color = false
log-file = "none"
"#;

#[tokio::test]
async fn test_config_file_fills_options_and_cli_wins() {
    let file = temp_file(CONFIG);
    let path = file.path().to_string_lossy().to_string();
    let mut args =
        Args::try_parse_from(["listscan", "-c", path.as_str(), "--timeout-ms", "2500"]).unwrap();

    assert_eq!(args.merge_config_file().await.unwrap(), Some(file.path().to_path_buf()));
    let config = args.resolve().await.unwrap();

    assert_eq!(config.mode, ScanMode::Simulated);
    assert_eq!(config.options.timeout, Some(Duration::from_millis(2500)));
    assert_eq!(config.options.zoom_level, Some(2.0));
    assert_eq!(config.options.simulation.seed, Some(42));
    assert_eq!(config.options.simulation.delay, Duration::from_millis(500));
    assert_eq!(config.symbologies, vec![Symbology::Ean13, Symbology::UpcE]);
    assert_eq!(config.lookup, LookupProvider::Simulated);
    assert_eq!(args.color_choice(), Some(false));
    assert_eq!(args.log_file_path(), None);
}

#[tokio::test]
async fn test_explicit_config_file_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.toml");
    let mut args = Args::default();
    args.config_file = Some(missing);

    let error = args.merge_config_file().await.unwrap_err();
    assert!(error.message().contains("does not exist"));
}

#[tokio::test]
async fn test_config_file_errors_name_the_file() {
    let broken = temp_file("mode = \n");
    let mut args = Args::default();
    args.config_file = Some(broken.path().to_path_buf());
    let error = args.merge_config_file().await.unwrap_err();
    assert!(error.message().starts_with("Error parsing configuration file"));

    let bad_zoom = temp_file("zoom = 9.5\n");
    let mut args = Args::default();
    args.config_file = Some(bad_zoom.path().to_path_buf());
    let error = args.merge_config_file().await.unwrap_err();
    assert!(error.message().contains("zoom"));
}

#[tokio::test]
async fn test_frames_file_extends_frame_arguments() {
    let frames = temp_file("\nean_13:7891234567890\n");
    let path = frames.path().to_string_lossy().to_string();
    let args = Args::try_parse_from([
        "listscan",
        "--frame",
        "code_39:ABC",
        "--frames-file",
        path.as_str(),
        "--frame-interval-ms",
        "40",
    ])
    .unwrap();

    let config = args.resolve().await.unwrap();
    assert_eq!(
        config.frames,
        vec![
            b"code_39:ABC".to_vec(),
            Vec::new(),
            b"ean_13:7891234567890".to_vec()
        ]
    );
    assert_eq!(config.frame_interval, Duration::from_millis(40));
}
