use std::{fs, path::PathBuf};

use tempfile::tempdir;

use quire_cli::{Args, parse_attribute, run};

/// Collects all .adoc files from a directory
fn collect_adoc_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("adoc")
            })
            .collect()
    } else {
        Vec::new()
    };

    // Sort for consistent test output
    files.sort();
    files
}

/// Demo documents live at the workspace root
fn demos_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

fn args_for(input: &PathBuf, output: PathBuf) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: output.to_string_lossy().to_string(),
        config: None,
        attributes: Vec::new(),
        pretty: false,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let valid_demos = collect_adoc_files(demos_path());
    assert!(!valid_demos.is_empty(), "No valid demos found in demos/");

    let mut failed_demos = Vec::new();

    for demo_path in &valid_demos {
        let output_filename = format!(
            "{}.json",
            demo_path.file_stem().unwrap().to_string_lossy()
        );
        let output_path = temp_dir.path().join(output_filename);

        match run(&args_for(demo_path, output_path.clone())) {
            Ok(()) => {
                let json = fs::read_to_string(&output_path).expect("output written");
                assert_json_object(&json, demo_path);
            }
            Err(e) => failed_demos.push((demo_path.clone(), e)),
        }
    }

    if !failed_demos.is_empty() {
        eprintln!("\nValid demos that failed:");
        for (path, err) in &failed_demos {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} valid demo(s) failed unexpectedly", failed_demos.len());
    }
}

fn assert_json_object(json: &str, path: &PathBuf) {
    assert!(
        json.starts_with('{') && json.trim_end().ends_with('}'),
        "{} did not produce a JSON object",
        path.display()
    );
}

#[test]
fn e2e_smoke_test_error_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let error_demos = collect_adoc_files(demos_path().join("errors"));
    assert!(
        !error_demos.is_empty(),
        "No error demos found in demos/errors/"
    );

    let mut unexpectedly_succeeded = Vec::new();

    for demo_path in &error_demos {
        let output_filename = format!(
            "error_{}.json",
            demo_path.file_stem().unwrap().to_string_lossy()
        );
        let output_path = temp_dir.path().join(output_filename);

        if run(&args_for(demo_path, output_path)).is_ok() {
            unexpectedly_succeeded.push(demo_path.clone());
        }
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError demos that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error demo(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }
}

#[test]
fn e2e_attribute_override_and_config() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = temp_dir.path().join("input.adoc");
    let config = temp_dir.path().join("config.toml");
    let output = temp_dir.path().join("out.json");

    fs::write(&input, "Made by {team} with {tool}.\n").expect("write input");
    fs::write(
        &config,
        "[attributes]\nteam = \"docs\"\ntool = \"pens\"\n",
    )
    .expect("write config");

    let mut args = args_for(&input, output.clone());
    args.config = Some(config.to_string_lossy().to_string());
    args.attributes = vec![parse_attribute("tool=Quire").expect("valid attribute")];
    args.pretty = true;

    run(&args).expect("run succeeds");

    let json = fs::read_to_string(&output).expect("output written");
    assert!(json.contains("Made by docs with Quire."), "{json}");
    assert!(json.starts_with("{\n"));
}

#[test]
fn e2e_missing_input_is_io_error() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let args = args_for(
        &temp_dir.path().join("absent.adoc"),
        temp_dir.path().join("out.json"),
    );

    let err = run(&args).unwrap_err();
    assert!(matches!(err, quire::QuireError::Io(_)));
}
