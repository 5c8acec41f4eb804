use super::*;
use semver::Version;

#[test]
fn parse_plain_version_output() {
    let version = parse_version_output("Python 3.11.4").expect("must parse");
    assert_eq!(version, Version::new(3, 11, 4));
}

#[test]
fn parse_two_component_version_output() {
    let version = parse_version_output("Python 3.10").expect("must parse");
    assert_eq!(version, Version::new(3, 10, 0));
}

#[test]
fn parse_prerelease_version_output() {
    let version = parse_version_output("Python 3.13.0rc1").expect("must parse");
    assert_eq!(version, Version::new(3, 13, 0));
}

#[test]
fn parse_rejects_non_version_output() {
    assert!(parse_version_output("command not found").is_none());
    assert!(parse_version_output("").is_none());
}

#[test]
fn range_is_inclusive_on_both_bounds() {
    let range = RuntimeRange::supported();
    assert!(range.contains(&Version::new(3, 10, 0)));
    assert!(range.contains(&Version::new(3, 11, 9)));
    assert!(range.contains(&Version::new(3, 12, 7)));
    assert!(!range.contains(&Version::new(3, 9, 18)));
    assert!(!range.contains(&Version::new(3, 13, 0)));
}

#[test]
fn unbounded_range_accepts_any_newer_version() {
    let range = RuntimeRange::new(Version::new(3, 10, 0), None);
    assert!(range.contains(&Version::new(4, 0, 0)));
    assert!(!range.contains(&Version::new(3, 9, 0)));
}

#[test]
fn range_display_names_both_bounds() {
    assert_eq!(RuntimeRange::supported().to_string(), "3.10 through 3.12");
    let open = RuntimeRange::new(Version::new(3, 10, 0), None);
    assert_eq!(open.to_string(), "3.10 or newer");
}

#[test]
fn bundled_manifest_parses_and_pins_flx4py_binary_only() {
    let manifest = DependencyManifest::bundled().expect("bundled manifest must parse");
    let flx4py = manifest
        .pins
        .iter()
        .find(|pin| pin.name == "flx4py")
        .expect("flx4py pin present");
    assert!(flx4py.binary_only);
    assert_eq!(flx4py.requirement(), "flx4py==0.3.1");
}

#[test]
fn manifest_filters_windows_only_pins_on_unix() {
    let manifest = DependencyManifest::from_toml_str(
        r#"
[[pin]]
name = "pycaw"
constraint = "==20240210"
platform = "windows-only"

[[pin]]
name = "numpy"
constraint = ">=1.26,<3"

[[pin]]
name = "sounddevice"
constraint = "==0.5.1"
"#,
    )
    .expect("must parse");

    let filtered = manifest.for_platform(Platform::Linux);
    let names: Vec<&str> = filtered.iter().map(|pin| pin.name.as_str()).collect();
    assert_eq!(names, vec!["numpy", "sounddevice"]);

    let on_windows = manifest.for_platform(Platform::Windows);
    assert_eq!(on_windows.len(), 3);
}

#[test]
fn manifest_rejects_duplicate_and_empty_entries() {
    let duplicate = r#"
[[pin]]
name = "numpy"
constraint = "==1"

[[pin]]
name = "NumPy"
constraint = "==2"
"#;
    assert!(DependencyManifest::from_toml_str(duplicate).is_err());

    let unconstrained = r#"
[[pin]]
name = "numpy"
constraint = ""
"#;
    assert!(DependencyManifest::from_toml_str(unconstrained).is_err());
}

#[test]
fn layout_projects_venv_interpreters_per_platform() {
    let layout = InstallLayout::new("/opt/flx4control");
    assert_eq!(
        layout.venv_python(Platform::Linux),
        layout.venv_dir().join("bin").join("python")
    );
    assert_eq!(
        layout.venv_python(Platform::Windows),
        layout.venv_dir().join("Scripts").join("python.exe")
    );
    assert_eq!(
        layout.venv_pythonw(Platform::Windows),
        layout.venv_dir().join("Scripts").join("pythonw.exe")
    );
    // No separate windowless interpreter outside Windows.
    assert_eq!(
        layout.venv_pythonw(Platform::Macos),
        layout.venv_python(Platform::Macos)
    );
}

#[test]
fn layout_launcher_and_bundle_names_use_display_name() {
    let layout = InstallLayout::new("/opt/flx4control");
    assert_eq!(
        layout.launcher_path(Platform::Windows),
        layout.root().join("FLX4 Control.bat")
    );
    assert_eq!(
        layout.launcher_path(Platform::Linux),
        layout.root().join("flx4control.sh")
    );
    assert_eq!(layout.bundle_path(), layout.root().join("FLX4 Control.app"));
}

#[test]
fn setup_error_messages_distinguish_permission_from_disk() {
    let permission = SetupError::FileSync {
        cause: FileSyncCause::Permission,
        path: "/opt/flx4control".into(),
        detail: "permission denied".to_string(),
    };
    assert!(permission.to_string().contains("permission denied"));
    assert!(permission
        .remediation()
        .expect("has remediation")
        .contains("administrator"));

    let disk = SetupError::FileSync {
        cause: FileSyncCause::Io,
        path: "/opt/flx4control".into(),
        detail: "no space left on device".to_string(),
    };
    assert!(disk.to_string().contains("file copy failed"));
    assert!(disk
        .remediation()
        .expect("has remediation")
        .contains("disk space"));
}

#[test]
fn no_binary_artifact_remediation_names_supported_range() {
    let error = SetupError::NoBinaryArtifact {
        package: "flx4py".to_string(),
        runtime: "3.13.0".to_string(),
    };
    assert!(error.to_string().contains("flx4py"));
    assert!(error
        .remediation()
        .expect("has remediation")
        .contains("3.10 through 3.12"));
}

#[test]
fn scope_round_trips_through_parse() {
    assert_eq!(
        InstallScope::parse("user").expect("must parse"),
        InstallScope::User
    );
    assert_eq!(
        InstallScope::parse("system").expect("must parse"),
        InstallScope::System
    );
    assert!(InstallScope::parse("global").is_err());
}
