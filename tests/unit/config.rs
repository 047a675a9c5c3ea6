use super::*;
use crate::key::params::KeyMode;

#[test]
fn empty_object_takes_defaults() {
    let cfg = KeyConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, KeyConfig::default());
    assert_eq!(cfg.session.fps, Fps::DISPLAY);
    assert_eq!(cfg.pump_opts().reveal_after, Some(Duration::from_millis(4000)));
    assert!(cfg.compositor_opts().parallel);
}

#[test]
fn nested_sections_parse() {
    let cfg = KeyConfig::from_json_str(
        r#"{
            "keying": {
                "similarityThreshold": 0.35,
                "smoothnessWidth": 0.12,
                "spillSuppression": true,
                "cropFraction": 0.1,
                "mode": { "kind": "ratio", "ratio": 1.5 }
            },
            "session": { "fps": { "num": 30, "den": 1 }, "revealAfterMs": null, "parallel": false }
        }"#,
    )
    .unwrap();

    assert_eq!(cfg.keying.similarity_threshold, 0.35);
    assert!(cfg.keying.spill_suppression);
    assert_eq!(
        cfg.keying.mode,
        KeyMode::Ratio {
            min_green: 100,
            ratio: 1.5
        }
    );
    assert_eq!(cfg.session.fps, Fps::new(30, 1).unwrap());
    assert_eq!(cfg.pump_opts().reveal_after, None);
    assert!(!cfg.compositor_opts().parallel);
}

#[test]
fn unknown_fields_are_rejected() {
    let err = KeyConfig::from_json_str(r#"{ "keying": { "threshold": 0.4 } }"#).unwrap_err();
    assert!(matches!(err, GreenkeyError::Validation(_)));
    assert!(KeyConfig::from_json_str(r#"{ "extra": 1 }"#).is_err());
}

#[test]
fn out_of_range_values_are_rejected() {
    assert!(KeyConfig::from_json_str(r#"{ "keying": { "smoothnessWidth": 0 } }"#).is_err());
    assert!(KeyConfig::from_json_str(r#"{ "keying": { "cropFraction": 1.0 } }"#).is_err());
    assert!(KeyConfig::from_json_str(r#"{ "session": { "fps": { "num": 0, "den": 1 } } }"#).is_err());
}

#[test]
fn from_path_reads_file() {
    let dir = std::path::PathBuf::from("target").join("config_unit");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("key.json");
    std::fs::write(&path, r#"{ "keying": { "cropFraction": 0.25 } }"#).unwrap();

    let cfg = KeyConfig::from_path(&path).unwrap();
    assert_eq!(cfg.keying.crop_fraction, 0.25);

    let missing = KeyConfig::from_path(dir.join("missing.json")).unwrap_err();
    assert!(missing.to_string().contains("missing.json"));
}
