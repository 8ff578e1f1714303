mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bundle_obfuscator::config::{InjectRules, PluginConfig};
use bundle_obfuscator::errors::PluginError;
use bundle_obfuscator::filter::Filter;
use bundle_obfuscator::host::{BuildResult, Message, OutputFile, Plugin};
use bundle_obfuscator::metrics::Metrics;
use bundle_obfuscator::plugin::ObfuscatorPlugin;
use common::{FakeEngine, FakeTranspiler, TestBuild, OBFUSCATED_MARK};
use prometheus::Registry;

fn output_config() -> PluginConfig {
    PluginConfig {
        obfuscate_output: true,
        ..PluginConfig::default()
    }
}

fn setup(config: PluginConfig, engine: FakeEngine) -> (TestBuild, Arc<FakeTranspiler>, Arc<FakeEngine>) {
    let transpiler = Arc::new(FakeTranspiler::default());
    let engine = Arc::new(engine);
    let plugin = ObfuscatorPlugin::new(config, transpiler.clone(), engine.clone());
    let mut build = TestBuild::default();
    plugin.setup(&mut build).unwrap();
    (build, transpiler, engine)
}

fn outputs(dir: &Path, names: &[&str]) -> Vec<OutputFile> {
    names
        .iter()
        .map(|name| OutputFile::new(dir.join(name), format!("var {} = 1;", name.replace(['.', '/'], "_"))))
        .collect()
}

fn built(outputs: Vec<OutputFile>) -> BuildResult {
    BuildResult {
        output_files: Some(outputs),
        ..BuildResult::default()
    }
}

fn read(path: PathBuf) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn switches_host_to_buffered_output() {
    let (build, _, _) = setup(output_config(), FakeEngine::default());
    assert!(!build.options.write);
    assert!(build.loaders.is_empty());
    assert_eq!(build.end_handlers.len(), 1);
}

#[tokio::test]
async fn rewrites_every_output() {
    let dir = tempfile::tempdir().unwrap();
    let (build, transpiler, engine) = setup(output_config(), FakeEngine::default());

    build
        .end(&built(outputs(dir.path(), &["a.js", "chunks/b.js"])))
        .await
        .unwrap();

    assert_eq!(read(dir.path().join("a.js")), format!("{OBFUSCATED_MARK}var a_js = 1;"));
    assert_eq!(
        read(dir.path().join("chunks/b.js")),
        format!("{OBFUSCATED_MARK}var chunks_b_js = 1;")
    );
    assert_eq!(engine.call_count(), 2);
    assert!(transpiler.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_build_leaves_disk_untouched() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.js"), "previous build").unwrap();
    let (build, _, engine) = setup(output_config(), FakeEngine::default());

    let result = BuildResult {
        errors: vec![Message::new("Could not resolve \"./missing\"")],
        ..built(outputs(dir.path(), &["a.js", "b.js"]))
    };
    build.end(&result).await.unwrap();

    assert_eq!(read(dir.path().join("a.js")), "previous build");
    assert!(!dir.path().join("b.js").exists());
    assert_eq!(engine.call_count(), 0);
}

#[tokio::test]
async fn empty_or_missing_outputs_do_nothing() {
    let (build, _, engine) = setup(output_config(), FakeEngine::default());
    build.end(&BuildResult::default()).await.unwrap();
    build.end(&built(Vec::new())).await.unwrap();
    assert_eq!(engine.call_count(), 0);
}

/// A rejected output is skipped on its own; later outputs are still obfuscated.
#[tokio::test]
async fn rejected_output_does_not_stop_later_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let config = PluginConfig {
        filter: Filter::predicate(|path| Ok(!path.ends_with("b.js"))),
        ..output_config()
    };
    let (build, _, engine) = setup(config, FakeEngine::default());

    build
        .end(&built(outputs(dir.path(), &["a.js", "b.js", "c.js"])))
        .await
        .unwrap();

    assert_eq!(read(dir.path().join("a.js")), format!("{OBFUSCATED_MARK}var a_js = 1;"));
    assert_eq!(read(dir.path().join("b.js")), "var b_js = 1;");
    assert_eq!(read(dir.path().join("c.js")), format!("{OBFUSCATED_MARK}var c_js = 1;"));
    assert_eq!(engine.call_count(), 2);
}

#[tokio::test]
async fn filter_failure_aborts_remaining_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let config = PluginConfig {
        filter: Filter::predicate(|path| {
            if path.ends_with("b.js") {
                Err("cannot classify b.js".into())
            } else {
                Ok(true)
            }
        }),
        ..output_config()
    };
    let (build, _, engine) = setup(config, FakeEngine::default());

    let err = build
        .end(&built(outputs(dir.path(), &["a.js", "b.js", "c.js"])))
        .await
        .unwrap_err();

    assert!(matches!(err, PluginError::Filter { ref path, .. } if path.ends_with("b.js")));
    assert_eq!(read(dir.path().join("a.js")), format!("{OBFUSCATED_MARK}var a_js = 1;"));
    assert!(!dir.path().join("b.js").exists());
    assert!(!dir.path().join("c.js").exists());
    assert_eq!(engine.call_count(), 1);
}

#[tokio::test]
async fn pattern_filter_selects_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let config = PluginConfig {
        filter: Filter::patterns(["*.js"]).unwrap(),
        ..output_config()
    };
    let (build, _, engine) = setup(config, FakeEngine::default());

    build
        .end(&built(outputs(dir.path(), &["app.js", "app.css", "app.js.map"])))
        .await
        .unwrap();

    assert!(read(dir.path().join("app.js")).starts_with(OBFUSCATED_MARK));
    assert_eq!(read(dir.path().join("app.css")), "var app_css = 1;");
    assert_eq!(read(dir.path().join("app.js.map")), "var app_js_map = 1;");
    assert_eq!(engine.call_count(), 1);
}

#[tokio::test]
async fn inject_is_ignored_in_output_mode() {
    let dir = tempfile::tempdir().unwrap();
    let config = PluginConfig {
        inject: InjectRules::new().rule("*.js", "const X = 1;").unwrap(),
        ..output_config()
    };
    let (build, _, engine) = setup(config, FakeEngine::default());

    build.end(&built(outputs(dir.path(), &["a.js"]))).await.unwrap();

    assert_eq!(engine.inputs(), vec!["var a_js = 1;".to_string()]);
}

#[tokio::test]
async fn obfuscation_failure_aborts_remaining_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let (build, _, engine) = setup(output_config(), FakeEngine::failing_on("b_js"));

    let err = build
        .end(&built(outputs(dir.path(), &["a.js", "b.js", "c.js"])))
        .await
        .unwrap_err();

    assert!(matches!(err, PluginError::Obfuscate { ref path, .. } if path.ends_with("b.js")));
    assert!(dir.path().join("a.js").exists());
    assert!(!dir.path().join("b.js").exists());
    assert!(!dir.path().join("c.js").exists());
    assert_eq!(engine.call_count(), 2);
}

#[tokio::test]
async fn write_failure_propagates() {
    let dir = tempfile::tempdir().unwrap();
    // a directory in place of the output file makes the write fail
    fs::create_dir(dir.path().join("a.js")).unwrap();
    let (build, _, engine) = setup(output_config(), FakeEngine::default());

    let err = build
        .end(&built(outputs(dir.path(), &["a.js", "b.js"])))
        .await
        .unwrap_err();

    assert!(matches!(err, PluginError::Write { .. }));
    assert!(!dir.path().join("b.js").exists());
    assert_eq!(engine.call_count(), 1);
}

#[tokio::test]
async fn non_utf8_output_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (build, _, engine) = setup(output_config(), FakeEngine::default());

    let err = build
        .end(&built(vec![OutputFile::new(dir.path().join("bin.js"), vec![0xff, 0xfe])]))
        .await
        .unwrap_err();

    assert!(matches!(err, PluginError::OutputEncoding { .. }));
    assert_eq!(engine.call_count(), 0);
}

#[tokio::test]
async fn counts_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Registry::new();
    let metrics = Metrics::new(&registry).unwrap();
    let config = PluginConfig {
        filter: Filter::patterns(["*.js"]).unwrap(),
        ..output_config()
    };
    let plugin = ObfuscatorPlugin::new(
        config,
        Arc::new(FakeTranspiler::default()),
        Arc::new(FakeEngine::default()),
    )
    .with_metrics(metrics.clone());
    let mut build = TestBuild::default();
    plugin.setup(&mut build).unwrap();

    build
        .end(&built(outputs(dir.path(), &["a.js", "a.css", "b.js"])))
        .await
        .unwrap();

    assert_eq!(metrics.files_obfuscated.get(), 2);
    assert_eq!(metrics.files_skipped.get(), 1);
    assert_eq!(metrics.outputs_written.get(), 3);
}
