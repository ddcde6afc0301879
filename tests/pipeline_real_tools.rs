// tests/pipeline_real_tools.rs
#![cfg(unix)]

mod common;

use std::fs;
use std::path::Path;
use std::time::Duration;

use common::*;
use scalepipe::archive::{ArchiveBundle, Archiver, DirectoryArchiver, MANIFEST_FILE};
use scalepipe::cli::CliArgs;
use scalepipe::config::Tool;
use scalepipe::errors::PipelineError;
use scalepipe::exec::RealExecutor;
use scalepipe::pipeline::{files, run_pipeline, run_pipeline_with, PipelineController, Stage};

fn bin_dir(root: &Path) -> std::path::PathBuf {
    let bin = root.join("bin");
    fs::create_dir_all(&bin).expect("creating bin dir");
    bin
}

fn new_work_dir(root: &Path, name: &str) -> std::path::PathBuf {
    sized_work_dir(root, name, 80, 60)
}

fn sized_work_dir(root: &Path, name: &str, width: u32, height: u32) -> std::path::PathBuf {
    let work = root.join(name);
    fs::create_dir_all(&work).expect("creating work dir");
    fixtures::write_input(&work, width, height);
    work
}

#[tokio::test]
async fn full_run_produces_every_artifact() -> TestResult {
    init_tracing();
    let _serial = serial_guard();
    let tmp = tempfile::tempdir()?;
    let bin = bin_dir(tmp.path());
    let tools = fixtures::install_fake_tools(&bin);
    let work = new_work_dir(tmp.path(), "req-1");
    let params = ParametersBuilder::new().threshold(128.0).min_size(5.0).build();

    let report = with_timeout(run_pipeline(&work, &params, &tools)).await?;

    assert_eq!(report.input_dimensions.width, 80);
    assert_eq!(report.input_dimensions.height, 60);
    for name in [
        files::CONVERTED,
        files::CONTOUR,
        files::INFO,
        files::BACKGROUND,
        files::FIGURE,
        files::RENDERED,
        files::NOISE_LEVELS,
        files::COMMANDS,
    ] {
        assert!(work.join(name).is_file(), "{name} missing");
    }

    assert_eq!(
        fs::read_to_string(work.join(files::CONTOUR))?,
        "contour -threshold 128 -min_size 5\n"
    );
    assert_eq!(
        fs::read_to_string(work.join(files::NOISE_LEVELS))?,
        "noise 1 contour -threshold 128 -min_size 5\n"
    );

    let info = fs::read_to_string(work.join(files::INFO))?;
    let lib = std::path::absolute(&bin)?;
    assert!(info.starts_with("pgm2freeman -threshold 128 -min_size 5\n"), "{info}");
    assert!(info.contains(&format!("lib={}\n", lib.display())), "{info}");
    assert!(info.ends_with("rendered noiseLevel.fig\n"), "{info}");

    let commands = fs::read_to_string(work.join(files::COMMANDS))?;
    assert_eq!(commands.lines().count(), 5);
    assert_eq!(commands.lines().collect::<Vec<_>>(), report.commands);
    Ok(())
}

#[tokio::test]
async fn archived_bundle_holds_exactly_the_run_files() -> TestResult {
    let _serial = serial_guard();
    let tmp = tempfile::tempdir()?;
    let tools = fixtures::install_fake_tools(&bin_dir(tmp.path()));
    let work = sized_work_dir(tmp.path(), "req-2", 100, 100);
    let params = ParametersBuilder::new()
        .auto()
        .min_size(5.0)
        .timeout(Duration::from_secs(30))
        .build();

    let report = with_timeout(run_pipeline(&work, &params, &tools)).await?;
    let bundle = ArchiveBundle::for_run("req-2", &report, &params);
    let dir = DirectoryArchiver::new(tmp.path().join("archive")).archive(&bundle)?;

    let mut names: Vec<String> = fs::read_dir(&dir)?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_, _>>()?;
    names.sort();
    assert_eq!(
        names,
        [
            "commands.txt",
            "index.toml",
            "info.txt",
            "inputContour.txt",
            "noiseLevels.txt",
            "original.png",
            "resu.png",
        ]
    );
    assert_eq!(
        fs::read(dir.join("original.png"))?,
        fs::read(work.join(files::INPUT))?
    );

    let manifest: toml::Table = toml::from_str(&fs::read_to_string(dir.join(MANIFEST_FILE))?)?;
    let meta = manifest["metadata"].as_table().unwrap();
    assert_eq!(meta["threshold_auto"].as_bool(), Some(true));
    assert_eq!(meta["min_contour_size"].as_float(), Some(5.0));
    assert_eq!(meta["input_width"].as_integer(), Some(100));
    assert_eq!(meta["input_height"].as_integer(), Some(100));
    assert_eq!(
        fs::read_to_string(dir.join(files::CONTOUR))?,
        "contour -min_size 5\n"
    );
    Ok(())
}

#[tokio::test]
async fn same_input_same_outputs() -> TestResult {
    let _serial = serial_guard();
    let tmp = tempfile::tempdir()?;
    let tools = fixtures::install_fake_tools(&bin_dir(tmp.path()));
    let params = ParametersBuilder::new().threshold(100.0).build();

    let a = new_work_dir(tmp.path(), "a");
    let b = new_work_dir(tmp.path(), "b");
    with_timeout(run_pipeline(&a, &params, &tools)).await?;
    with_timeout(run_pipeline(&b, &params, &tools)).await?;

    // commands.txt differs only in the absolute backdrop path.
    for name in [files::CONTOUR, files::NOISE_LEVELS, files::INFO, files::RENDERED, files::FIGURE] {
        assert_eq!(fs::read(a.join(name))?, fs::read(b.join(name))?, "{name} differs");
    }
    Ok(())
}

#[tokio::test]
async fn blank_image_with_silent_extractor_is_an_empty_result() -> TestResult {
    let _serial = serial_guard();
    let tmp = tempfile::tempdir()?;
    let bin = bin_dir(tmp.path());
    let tools = fixtures::install_fake_tools(&bin);
    // Same program name, but it finds nothing.
    fixtures::install_script(&bin, "pgm2freeman", "cat > /dev/null");

    let work = tmp.path().join("blank");
    fs::create_dir(&work)?;
    fixtures::write_blank_input(&work, 32, 32);
    let params = ParametersBuilder::new().threshold(200.0).min_size(5.0).build();

    let mut ctl = PipelineController::new(RealExecutor::default(), tools, &work, params);
    let err = with_timeout(ctl.run()).await.unwrap_err();

    assert!(matches!(err, PipelineError::EmptyResult { .. }), "{err:?}");
    assert_eq!(err.code(), "badparams");
    assert_eq!(
        err.user_message(),
        "The parameters given produce no contours, please change them."
    );
    assert_eq!(
        ctl.command_log().entries()[1],
        "pgm2freeman -threshold 200 -min_size 5 < tmp.pgm > inputContour.txt 2> info.txt"
    );
    assert_eq!(fs::metadata(work.join(files::CONTOUR))?.len(), 0);
    assert!(!work.join(files::BACKGROUND).exists());
    Ok(())
}

#[tokio::test]
async fn hung_extractor_times_out_without_orphans() -> TestResult {
    let _serial = serial_guard();
    let tmp = tempfile::tempdir()?;
    let bin = bin_dir(tmp.path());
    let mut tools = fixtures::install_fake_tools(&bin);
    let hung = fixtures::install_script(
        &bin,
        "hung-extract",
        "echo $$ > extractor.pid\nsleep 30 &\necho $! > sleeper.pid\nwait",
    );
    fixtures::override_tool(&mut tools, Tool::Extract, &hung);

    let work = new_work_dir(tmp.path(), "slow");
    let params = ParametersBuilder::new().timeout(Duration::from_secs(1)).build();

    let err = with_timeout(run_pipeline_with(
        RealExecutor::new(Duration::from_millis(200)),
        &work,
        &params,
        &tools,
    ))
    .await
    .unwrap_err();

    assert!(
        matches!(err, PipelineError::Timeout { step: Stage::ExtractContour, .. }),
        "{err:?}"
    );
    assert_eq!(err.code(), "timeout");
    for pid_file in ["extractor.pid", "sleeper.pid"] {
        let pid = fixtures::read_pid(&work.join(pid_file));
        assert!(
            fixtures::wait_until_gone(pid, Duration::from_secs(2)),
            "{pid_file} ({pid}) still alive"
        );
    }
    Ok(())
}

#[tokio::test]
async fn concurrent_runs_do_not_interfere() -> TestResult {
    let _serial = serial_guard();
    let tmp = tempfile::tempdir()?;
    let tools = fixtures::install_fake_tools(&bin_dir(tmp.path()));
    let one = new_work_dir(tmp.path(), "one");
    let two = new_work_dir(tmp.path(), "two");
    let p1 = ParametersBuilder::new().threshold(10.0).build();
    let p2 = ParametersBuilder::new().auto().min_size(3.0).build();

    let (r1, r2) = with_timeout(async {
        tokio::join!(
            run_pipeline(&one, &p1, &tools),
            run_pipeline(&two, &p2, &tools)
        )
    })
    .await;
    r1?;
    r2?;

    assert_eq!(
        fs::read_to_string(one.join(files::CONTOUR))?,
        "contour -threshold 10 -min_size 5\n"
    );
    assert_eq!(
        fs::read_to_string(two.join(files::CONTOUR))?,
        "contour -min_size 3\n"
    );
    Ok(())
}

#[tokio::test]
async fn cli_entry_point_runs_and_archives() -> TestResult {
    let _serial = serial_guard();
    let tmp = tempfile::tempdir()?;
    let bin = bin_dir(tmp.path());
    fixtures::install_fake_tools(&bin);
    let work = new_work_dir(tmp.path(), "cli-run");
    let archive = tmp.path().join("archive");

    let config = tmp.path().join("Scalepipe.toml");
    fs::write(
        &config,
        format!(
            "[run]\ntimeout_secs = 5\ngrace_period_ms = 100\n\n[tools]\nbin_dir = {:?}\n\n[archive]\nroot = {:?}\n",
            bin.display().to_string(),
            archive.display().to_string(),
        ),
    )?;

    let args = CliArgs {
        work_dir: work.clone(),
        threshold: "128".to_string(),
        min_size: "5".to_string(),
        auto_threshold: false,
        timeout: None,
        key: None,
        config: Some(config),
        no_archive: false,
        log_level: None,
        dry_run: false,
    };
    with_timeout(scalepipe::run(args)).await?;

    assert!(work.join(files::RENDERED).is_file());
    assert!(archive.join("cli-run").join(MANIFEST_FILE).is_file());
    Ok(())
}

#[tokio::test]
async fn cli_rejects_bad_parameters_before_running() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let work = new_work_dir(tmp.path(), "bad");
    let config = tmp.path().join("Scalepipe.toml");
    fs::write(&config, "[archive]\nenabled = false\n")?;

    let args = CliArgs {
        work_dir: work.clone(),
        threshold: "abc".to_string(),
        min_size: "5".to_string(),
        auto_threshold: false,
        timeout: None,
        key: None,
        config: Some(config),
        no_archive: false,
        log_level: None,
        dry_run: false,
    };
    let err = scalepipe::run(args).await.unwrap_err();

    match err {
        scalepipe::errors::ScalepipeError::Pipeline(p) => assert_eq!(p.code(), "badparams"),
        other => panic!("expected pipeline error, got {other:?}"),
    }
    assert!(!work.join(files::CONVERTED).exists());
    Ok(())
}
