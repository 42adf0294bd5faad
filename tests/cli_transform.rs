mod util;

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use funnel_extrapolation::base_query::{BaseEventQuery, Scope};
use funnel_extrapolation::model::{
    ActionRequest, ActionResponse, BucketCount, CountRequest, CountResponse, HistogramRequest,
    HistogramResponse, Period,
};
use funnel_extrapolation::{ExtrapolationConfig, ReplayFixture};
use predicates::str::contains;
use tempfile::TempDir;
use util::{funnel, funnel_filter};

fn base_cmd(temp_home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("funnelx"));
    // Isolate from any user config and environment overrides
    cmd.env("XDG_CONFIG_HOME", temp_home.join(".config"));
    cmd.env_remove("FUNNELX_BASE_EVENT_TYPE");
    cmd.env_remove("FUNNELX_MISSING_FUNNEL");
    cmd.env_remove("FUNNELX_LOG");
    cmd
}

fn write_json(dir: &Path, name: &str, value: &impl serde::Serialize) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

fn count_request() -> ActionRequest {
    ActionRequest::Count(CountRequest::new("events", vec![funnel_filter(7)]))
}

/// Fixture answering the two base counts of `request`: 1000 total, 80 sampled.
fn count_fixture(request: &ActionRequest) -> ReplayFixture {
    let config = ExtrapolationConfig::default();
    let funnel = funnel("7", 10.0);
    let query = BaseEventQuery::new(&config, &funnel, request.filters());
    let table = request.table().unwrap();

    let mut fixture = ReplayFixture {
        funnels: vec![funnel.clone()],
        executions: Vec::new(),
    };
    fixture.record(
        query.count_request(table, Scope::Total),
        ActionResponse::Count(CountResponse { count: 1000 }),
    );
    fixture.record(
        query.count_request(table, Scope::Funnel),
        ActionResponse::Count(CountResponse { count: 80 }),
    );
    fixture
}

#[test]
fn help_lists_subcommands() {
    let tmp = TempDir::new().unwrap();
    base_cmd(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("transform"))
        .stdout(contains("factor"));
}

#[test]
fn transform_scales_recorded_count() {
    let tmp = TempDir::new().unwrap();
    let request = count_request();
    let fixture = write_json(tmp.path(), "fixture.json", &count_fixture(&request));
    let request_path = write_json(tmp.path(), "request.json", &request);
    let response_path = write_json(
        tmp.path(),
        "response.json",
        &ActionResponse::Count(CountResponse { count: 40 }),
    );

    let output = base_cmd(tmp.path())
        .arg("transform")
        .arg("--fixture")
        .arg(&fixture)
        .arg("--request")
        .arg(&request_path)
        .arg("--response")
        .arg(&response_path)
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let scaled: ActionResponse = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(scaled, ActionResponse::Count(CountResponse { count: 5000 }));
}

#[test]
fn factor_reports_scalar_factor() {
    let tmp = TempDir::new().unwrap();
    let request = count_request();
    let fixture = write_json(tmp.path(), "fixture.json", &count_fixture(&request));
    let request_path = write_json(tmp.path(), "request.json", &request);

    let output = base_cmd(tmp.path())
        .arg("factor")
        .arg("--fixture")
        .arg(&fixture)
        .arg("--request")
        .arg(&request_path)
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["funnelId"], "7");
    assert_eq!(report["factor"].as_f64(), Some(125.0));
}

#[test]
fn factor_reports_one_factor_per_bucket() {
    let tmp = TempDir::new().unwrap();
    let config = ExtrapolationConfig::default();
    let funnel = funnel("7", 100.0);
    let request = ActionRequest::Histogram(HistogramRequest::new(
        "events",
        vec![funnel_filter(7)],
        "_timestamp",
        Period::Hours,
    ));
    let query = BaseEventQuery::new(&config, &funnel, request.filters());
    let (total, scoped) = query.histogram_pair("events", "_timestamp", Period::Hours);
    let mut fixture = ReplayFixture {
        funnels: vec![funnel.clone()],
        executions: Vec::new(),
    };
    fixture.record(
        total,
        ActionResponse::Histogram(HistogramResponse {
            counts: vec![BucketCount::new(0, 20), BucketCount::new(3_600_000, 10)],
        }),
    );
    fixture.record(
        scoped,
        ActionResponse::Histogram(HistogramResponse {
            counts: vec![BucketCount::new(0, 10), BucketCount::new(3_600_000, 10)],
        }),
    );
    let fixture = write_json(tmp.path(), "fixture.json", &fixture);
    let request_path = write_json(tmp.path(), "request.json", &request);

    let output = base_cmd(tmp.path())
        .arg("factor")
        .arg("--fixture")
        .arg(&fixture)
        .arg("--request")
        .arg(&request_path)
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let factors = report["factors"].as_array().unwrap();
    assert_eq!(factors.len(), 2);
    assert_eq!(factors[0]["bucketKey"], 0);
    assert_eq!(factors[0]["scale"].as_f64(), Some(2.0));
    assert_eq!(factors[1]["scale"].as_f64(), Some(1.0));
}

#[test]
fn unknown_funnel_fails_with_message() {
    let tmp = TempDir::new().unwrap();
    let request = count_request();
    let fixture = write_json(tmp.path(), "fixture.json", &ReplayFixture::default());
    let request_path = write_json(tmp.path(), "request.json", &request);
    let response_path = write_json(
        tmp.path(),
        "response.json",
        &ActionResponse::Count(CountResponse { count: 40 }),
    );

    base_cmd(tmp.path())
        .arg("transform")
        .arg("--fixture")
        .arg(&fixture)
        .arg("--request")
        .arg(&request_path)
        .arg("--response")
        .arg(&response_path)
        .assert()
        .failure()
        .stderr(contains("7"));
}

#[test]
fn bypass_policy_from_environment_returns_sampled_response() {
    let tmp = TempDir::new().unwrap();
    let request = count_request();
    let fixture = write_json(tmp.path(), "fixture.json", &ReplayFixture::default());
    let request_path = write_json(tmp.path(), "request.json", &request);
    let response_path = write_json(
        tmp.path(),
        "response.json",
        &ActionResponse::Count(CountResponse { count: 40 }),
    );

    let output = base_cmd(tmp.path())
        .env("FUNNELX_MISSING_FUNNEL", "bypass")
        .arg("transform")
        .arg("--fixture")
        .arg(&fixture)
        .arg("--request")
        .arg(&request_path)
        .arg("--response")
        .arg(&response_path)
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let scaled: ActionResponse = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(scaled, ActionResponse::Count(CountResponse { count: 40 }));
}

#[test]
fn config_file_selects_base_event() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("funnelx.toml");
    std::fs::write(&config_path, "base_event_type = \"SESSION_START\"\n").unwrap();

    // Fixture recorded for the default base event does not match.
    let request = count_request();
    let fixture = write_json(tmp.path(), "fixture.json", &count_fixture(&request));
    let request_path = write_json(tmp.path(), "request.json", &request);

    base_cmd(tmp.path())
        .arg("--config")
        .arg(&config_path)
        .arg("factor")
        .arg("--fixture")
        .arg(&fixture)
        .arg("--request")
        .arg(&request_path)
        .assert()
        .failure()
        .stderr(contains("count"));
}
