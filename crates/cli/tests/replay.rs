use config::{AcceptList, Config};
use perfmap::{EventBus, PerfMap};
use perfmap_cli::{
    error::Error,
    replay::{ReplayReport, replay, replay_input},
};
use pretty_assertions::assert_eq;
use std::{fs, sync::Arc, time::Duration};

const LOG: &str = "\
# kind\taddress\tprevious\tsize\tcomment\tfunction\tscript\tline\tcolumn
Function\t10\t10\t4\t\tf\t\t0\t0
Builtin\t20\t20\t8\tb\t\t\t0\t0

Script\t30\t30\tc\t\ts\t\t0\t0
Lambda\t40\t40\t4\t\tbogus\t\t0\t0
LazyCompile\t0x50\t0x48\t0x10\t\tg\tapp.js\t12\t3\r
";

fn capture(accept: Option<&str>) -> (tempfile::TempDir, Arc<EventBus>, PerfMap) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.output.path = Some(dir.path().join("perf.map"));
    config.capture.accept = accept.map(AcceptList::from);
    config.capture.flush_interval = Duration::ZERO;

    let bus = Arc::new(EventBus::new());
    let perf_map = PerfMap::new(&config, bus.clone());
    perf_map.enable().unwrap();
    (dir, bus, perf_map)
}

#[test]
fn replays_a_recorded_log() {
    let (_dir, bus, perf_map) = capture(None);

    let report = replay(LOG.as_bytes(), &bus).unwrap();
    perf_map.close();

    assert_eq!(
        report,
        ReplayReport {
            lines: 7,
            emitted: 4,
            skipped: 1,
        }
    );
    assert_eq!(
        fs::read_to_string(perf_map.path()).unwrap(),
        "10 4 Function:f\n\
         20 8 Builtin:b\n\
         30 c Script:s\n\
         50 10 LazyCompile:g app.js:12\n"
    );
}

#[test]
fn replay_honours_accept_list() {
    let (_dir, bus, perf_map) = capture(Some("Function,Script"));

    replay(LOG.as_bytes(), &bus).unwrap();
    perf_map.close();

    assert_eq!(
        fs::read_to_string(perf_map.path()).unwrap(),
        "10 4 Function:f\n30 c Script:s\n"
    );
}

#[test]
fn replay_from_file() {
    let (dir, bus, perf_map) = capture(None);
    let log = dir.path().join("events.tsv");
    fs::write(&log, "RegExp\tff\tff\t10\tRegExp: a+\t\t\t0\t0\n").unwrap();

    let report = replay_input(Some(&log), &bus).unwrap();
    perf_map.close();

    assert_eq!(report.emitted, 1);
    assert_eq!(
        fs::read_to_string(perf_map.path()).unwrap(),
        "ff 10 RegExp:RegExp: a+\n"
    );
}

#[test]
fn missing_log_is_an_error() {
    let (dir, bus, _perf_map) = capture(None);
    let missing = dir.path().join("missing.tsv");

    let err = replay_input(Some(&missing), &bus).unwrap_err();
    assert!(matches!(err, Error::OpenInput { path, .. } if path == missing));
}
