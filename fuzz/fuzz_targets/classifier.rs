#![no_main]

use logparser::config::MarkerConfig;
use logparser::Classifier;
use libfuzzer_sys::fuzz_target;

const MAX_LINE_LEN: usize = 1024;
const MAX_LINES: usize = 256;

// Marker fragments spliced into lines so the error-block state is reached often
const FRAGMENTS: [&str; 5] = [
    "[01Jan23_00:00:00.000] - ERROR - ",
    "Hitch reported on thread: [Main] with a duration of: 1.0ms",
    "memory footprint: 1.0 MiB at run time: 2.0",
    "[",
    "",
];

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let control = data[0];
    let lines = build_lines(&data[1..], control);
    let markers = MarkerConfig::default();
    let mut classifier = Classifier::new(&markers, "fuzz.log");

    let mut covered = 0;
    for line in &lines {
        for unit in classifier.feed_line(line) {
            assert!(unit.line <= unit.end_line);
            assert_eq!(unit.line, covered + 1, "units must tile the input");
            covered = unit.end_line;
        }
    }
    if let Some(unit) = classifier.finish() {
        assert_eq!(unit.line, covered + 1);
        covered = unit.end_line;
    }

    assert_eq!(covered, lines.len());
    assert_eq!(classifier.lines_consumed(), lines.len());
});

fn build_lines(bytes: &[u8], control: u8) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    let mut lines = Vec::new();

    for (i, chunk) in text.split('\n').enumerate() {
        if lines.len() == MAX_LINES {
            break;
        }
        let mut line = String::new();
        if control & 0x1 == 0x1 {
            line.push_str(FRAGMENTS[(i + control as usize) % FRAGMENTS.len()]);
        }
        line.extend(chunk.chars().take(MAX_LINE_LEN));
        lines.push(line);
    }

    lines
}
