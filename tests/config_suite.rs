use clap::Parser;
use tui_starfield::config::{
    Background, Cli, ColorPatch, ConfigError, ConfigPatch, HueSpec, RendererMode, SizePatch,
    StarCount, StarfieldConfig,
};
use tui_starfield::surface::Rgb;

#[test]
fn defaults_match_documented_values() {
    let cfg = StarfieldConfig::default();
    assert_eq!(cfg.star_count, StarCount::Auto);
    assert_eq!(cfg.max_star_count, 5000);
    assert_eq!(cfg.speed, 0.5);
    assert_eq!(cfg.focal_length, 300.0);
    assert_eq!(cfg.trail_effect, 0.3);
    assert_eq!((cfg.star_size.min, cfg.star_size.max), (0.5, 2.0));
    assert_eq!(cfg.star_colors.hue, HueSpec::Range(200.0, 260.0));
    assert_eq!(cfg.star_colors.saturation, 80.0);
    assert_eq!(cfg.star_colors.lightness, 85.0);
    assert_eq!(cfg.device_detection.mobile, 300);
    assert_eq!(cfg.device_detection.desktop, 1000);
    assert!(!cfg.debug);
    match cfg.background {
        Background::Gradient(g) => {
            assert_eq!(g.stops(), &[Rgb::new(0, 0, 0x11), Rgb::BLACK]);
        }
        Background::Disabled => panic!("background should default to a gradient"),
    }
}

#[test]
fn parse_reads_every_key() {
    let text = r#"
        # tuned for a slow laptop
        star_count = 400
        max_star_count = 2000
        speed = 1.5
        focal_length = 250
        trail_effect = 0
        star_size.min = 0.8
        star_size.max = 3
        star_colors.hue = 10, 50
        star_colors.saturation = 60
        star_colors.lightness = 70
        device_detection.mobile = 150
        device_detection.desktop = 800
        debug = yes
        background = none
    "#;
    let patch = ConfigPatch::parse(text).expect("parse should succeed");
    let cfg = StarfieldConfig::default().apply(&patch).unwrap();

    assert_eq!(cfg.star_count, StarCount::Fixed(400));
    assert_eq!(cfg.max_star_count, 2000);
    assert_eq!(cfg.speed, 1.5);
    assert_eq!(cfg.focal_length, 250.0);
    assert_eq!(cfg.trail_effect, 0.0);
    assert_eq!((cfg.star_size.min, cfg.star_size.max), (0.8, 3.0));
    assert_eq!(cfg.star_colors.hue, HueSpec::Range(10.0, 50.0));
    assert_eq!(cfg.star_colors.saturation, 60.0);
    assert_eq!(cfg.star_colors.lightness, 70.0);
    assert_eq!(cfg.device_detection.mobile, 150);
    assert_eq!(cfg.device_detection.desktop, 800);
    assert!(cfg.debug);
    assert_eq!(cfg.background, Background::Disabled);
}

#[test]
fn parse_reports_line_numbers() {
    let err = ConfigPatch::parse("speed = 1\nwarp = 9\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { line: 2, .. }), "{err:?}");

    let err = ConfigPatch::parse("speed 1").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { line: 1, .. }));

    let err = ConfigPatch::parse("\n\nfocal_length = far").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { line: 3, .. }));

    let err = ConfigPatch::parse("star_colors.hue = red").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { line: 1, .. }));
}

#[test]
fn out_of_range_values_are_rejected() {
    let cases = [
        ("speed = 0", "speed"),
        ("speed = 11", "speed"),
        ("focal_length = 49", "focal_length"),
        ("focal_length = 1001", "focal_length"),
        ("trail_effect = 1.2", "trail_effect"),
        ("star_count = 0", "star_count"),
        ("star_count = 10001", "star_count"),
        ("max_star_count = 99", "max_star_count"),
        ("max_star_count = 50001", "max_star_count"),
        ("star_size.min = 0.05", "star_size.min"),
        ("star_colors.saturation = 101", "star_colors.saturation"),
        ("star_colors.lightness = -1", "star_colors.lightness"),
        ("device_detection.mobile = 0", "device_detection.mobile"),
    ];
    for (text, expected) in cases {
        let patch = ConfigPatch::parse(text).unwrap();
        match StarfieldConfig::default().apply(&patch) {
            Err(ConfigError::OutOfRange { field, .. }) => assert_eq!(field, expected, "{text}"),
            other => panic!("{text}: expected OutOfRange, got {other:?}"),
        }
    }
}

#[test]
fn boundary_values_are_accepted() {
    let text = "speed = 0.01\nfocal_length = 1000\ntrail_effect = 1\nstar_count = 10000\nmax_star_count = 100";
    let patch = ConfigPatch::parse(text).unwrap();
    let cfg = StarfieldConfig::default().apply(&patch).unwrap();
    assert_eq!(cfg.speed, 0.01);
    assert_eq!(cfg.max_star_count, 100);
}

#[test]
fn hue_ranges_are_checked() {
    let patch = ConfigPatch {
        star_colors: ColorPatch {
            hue: Some(HueSpec::Range(300.0, 20.0)),
            ..ColorPatch::default()
        },
        ..ConfigPatch::default()
    };
    assert!(matches!(
        StarfieldConfig::default().apply(&patch),
        Err(ConfigError::InvalidHueRange(_))
    ));

    let patch = ConfigPatch {
        star_colors: ColorPatch {
            hue: Some(HueSpec::Range(0.0, 400.0)),
            ..ColorPatch::default()
        },
        ..ConfigPatch::default()
    };
    assert!(matches!(
        StarfieldConfig::default().apply(&patch),
        Err(ConfigError::InvalidHueRange(_))
    ));

    assert_eq!("42".parse::<HueSpec>().unwrap(), HueSpec::Single(42.0));
    assert!("1,2,3".parse::<HueSpec>().is_err());
}

#[test]
fn inverted_size_range_is_rejected_after_merge() {
    // Valid on its own, but above the default max of 2.0.
    let patch = ConfigPatch {
        star_size: SizePatch {
            min: Some(3.0),
            max: None,
        },
        ..ConfigPatch::default()
    };
    assert!(matches!(
        StarfieldConfig::default().apply(&patch),
        Err(ConfigError::InvertedRange { field: "star_size", .. })
    ));
}

#[test]
fn rejected_patch_applies_nothing() {
    let base = StarfieldConfig::default();
    let patch = ConfigPatch {
        speed: Some(2.0),
        focal_length: Some(5.0),
        ..ConfigPatch::default()
    };
    assert!(base.apply(&patch).is_err());
    assert_eq!(base, StarfieldConfig::default());
}

#[test]
fn overlay_prefers_top_fields() {
    let file = ConfigPatch::parse("speed = 2\ntrail_effect = 0.5").unwrap();
    let flags = ConfigPatch {
        speed: Some(3.0),
        ..ConfigPatch::default()
    };
    let merged = file.overlay(flags);
    assert_eq!(merged.speed, Some(3.0));
    assert_eq!(merged.trail_effect, Some(0.5));
    assert!(ConfigPatch::default().is_empty());
    assert!(!merged.is_empty());
}

#[test]
fn star_count_and_background_parse() {
    assert_eq!("AUTO".parse::<StarCount>().unwrap(), StarCount::Auto);
    assert_eq!(" 250 ".parse::<StarCount>().unwrap(), StarCount::Fixed(250));
    assert!("lots".parse::<StarCount>().is_err());

    assert_eq!("off".parse::<Background>().unwrap(), Background::Disabled);
    match "#102030,#000".parse::<Background>().unwrap() {
        Background::Gradient(g) => {
            assert_eq!(g.stops(), &[Rgb::new(0x10, 0x20, 0x30), Rgb::BLACK]);
        }
        Background::Disabled => panic!("expected gradient"),
    }
    assert!("sunset".parse::<Background>().is_err());
}

#[test]
fn cli_flags_resolve_over_defaults() {
    let cli = Cli::try_parse_from([
        "tui-starfield",
        "--renderer",
        "braille",
        "--star-count",
        "700",
        "--hue",
        "0,60",
        "--background",
        "none",
        "--debug",
    ])
    .unwrap();
    assert_eq!(cli.renderer, RendererMode::Braille);
    let cfg = cli.resolve().unwrap();
    assert_eq!(cfg.star_count, StarCount::Fixed(700));
    assert_eq!(cfg.star_colors.hue, HueSpec::Range(0.0, 60.0));
    assert_eq!(cfg.background, Background::Disabled);
    assert!(cfg.debug);
    assert_eq!(cfg.speed, 0.5);
}

#[test]
fn cli_rejects_bad_values() {
    assert!(Cli::try_parse_from(["tui-starfield", "--star-count", "many"]).is_err());

    let cli = Cli::try_parse_from(["tui-starfield", "--speed", "50"]).unwrap();
    assert!(matches!(
        cli.resolve(),
        Err(ConfigError::OutOfRange { field: "speed", .. })
    ));
}

#[test]
fn renderer_aliases() {
    for name in ["half-block", "halfblock", "hb"] {
        let cli = Cli::try_parse_from(["tui-starfield", "--renderer", name]).unwrap();
        assert_eq!(cli.renderer, RendererMode::HalfBlock);
    }
}

#[test]
fn config_file_is_layered_under_flags() {
    let dir = std::env::temp_dir().join(format!("tui_starfield_cfg_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("starfield.conf");
    std::fs::write(&path, "speed = 2\nfocal_length = 400\n").unwrap();

    let cli = Cli::try_parse_from([
        "tui-starfield",
        "--config",
        path.to_str().unwrap(),
        "--speed",
        "0.25",
    ])
    .unwrap();
    let cfg = cli.resolve().unwrap();
    assert_eq!(cfg.speed, 0.25);
    assert_eq!(cfg.focal_length, 400.0);

    let missing = Cli::try_parse_from(["tui-starfield", "--config", "/nonexistent/starfield.conf"])
        .unwrap();
    assert!(matches!(missing.resolve(), Err(ConfigError::Io(_))));

    let _ = std::fs::remove_dir_all(&dir);
}
