//! Integration tests for `microlift html`.

use std::io::Write;
use std::process::Command;

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-q", "-p", "microlift-cli", "--bin", "microlift", "--"]);
    cmd
}

const PAGE: &str = r#"<!DOCTYPE html><html><head>
    <script crossorigin="" src="/assets/vendor.js"></script>
</head><body>
    <div id="app"></div>
    <script type="module" src="/src/main.ts"></script>
</body></html>"#;

fn write_page(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".html")
        .tempfile()
        .expect("create temp html");
    file.write_all(contents.as_bytes()).expect("write temp html");
    file
}

#[test]
fn test_html_rewrites_entry_scripts() {
    let page = write_page(PAGE);
    let output = cargo_bin()
        .args(["html", page.path().to_str().unwrap(), "--name", "app1"])
        .output()
        .expect("failed to run html command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("import('/assets/vendor.js')"));
    assert!(stdout.contains("import('/src/main.ts')"));
    assert!(!stdout.contains(r#"src="/src/main.ts""#));
    assert!(!stdout.contains(r#"type="module""#));
    // Exactly the last matched script carries the continuation.
    assert_eq!(stdout.matches(".finally(").count(), 1);
    assert!(stdout.contains("moudleQiankunAppLifeCycles['app1']"));
    assert!(stdout.contains("global.qiankunName = 'app1';"));
}

#[test]
fn test_html_without_matches_passes_through() {
    let page = write_page("<html><body><script src=\"/plain.js\"></script></body></html>");
    let output = cargo_bin()
        .args([
            "--json",
            "html",
            page.path().to_str().unwrap(),
            "--name",
            "app1",
        ])
        .output()
        .expect("failed to run html command");

    assert!(output.status.success());
    let json: serde_json::Value =
        serde_json::from_str(&String::from_utf8_lossy(&output.stdout))
            .expect("stdout should be valid JSON");
    assert_eq!(json["ok"].as_bool(), Some(true));
    assert_eq!(json["changed"].as_bool(), Some(false));
}

#[test]
fn test_html_json_report_shape() {
    let page = write_page(PAGE);
    let output = cargo_bin()
        .args([
            "--json",
            "html",
            page.path().to_str().unwrap(),
            "--name",
            "app1",
        ])
        .output()
        .expect("failed to run html command");

    assert!(output.status.success());
    let json: serde_json::Value =
        serde_json::from_str(&String::from_utf8_lossy(&output.stdout))
            .expect("stdout should be valid JSON");

    assert_eq!(json["ok"].as_bool(), Some(true));
    assert_eq!(json["changed"].as_bool(), Some(true));
    assert!(json["bytes_in"].as_u64().is_some(), "missing bytes_in");
    assert!(json["bytes_out"].as_u64().is_some(), "missing bytes_out");
    assert!(json["duration_ms"].as_u64().is_some(), "missing duration_ms");
}

#[test]
fn test_html_outfile_receives_transform() {
    let page = write_page(PAGE);
    let out = tempfile::NamedTempFile::new().expect("create outfile");
    let output = cargo_bin()
        .args([
            "html",
            page.path().to_str().unwrap(),
            "--name",
            "app1",
            "-o",
            out.path().to_str().unwrap(),
        ])
        .output()
        .expect("failed to run html command");

    assert!(output.status.success());
    let written = std::fs::read_to_string(out.path()).expect("read outfile");
    assert!(written.contains("import('/src/main.ts')"));
}

#[test]
fn test_missing_input_reports_path() {
    let output = cargo_bin()
        .args(["--json", "html", "/no/such/page.html", "--name", "app1"])
        .output()
        .expect("failed to run html command");

    assert!(!output.status.success());
    let json: serde_json::Value =
        serde_json::from_str(&String::from_utf8_lossy(&output.stdout))
            .expect("stdout should be valid JSON");
    assert_eq!(json["ok"].as_bool(), Some(false));
    let error = json["error"].as_str().expect("missing error");
    assert!(error.starts_with("Failed to read /no/such/page.html"), "{error}");
}

#[test]
fn test_html_dev_mode_prefixes_imports() {
    let page = write_page(PAGE);
    let output = cargo_bin()
        .args([
            "html",
            page.path().to_str().unwrap(),
            "--name",
            "app1",
            "--dev",
        ])
        .output()
        .expect("failed to run html command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("__INJECTED_PUBLIC_PATH_BY_QIANKUN__"));
}
