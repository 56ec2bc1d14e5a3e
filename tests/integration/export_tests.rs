use linedupe::duplicates::{DuplicateFinder, DuplicateLine, ReportOrder, ScanSummary};
use linedupe::error::ExitCode;
use linedupe::output::{CsvOutput, JsonOutput, Report, TextOutput};
use linedupe::scanner::SourceId;
use std::io::Cursor;

fn scan(inputs: &[(&str, &str)]) -> (Vec<DuplicateLine>, ScanSummary) {
    let inputs = inputs
        .iter()
        .map(|(name, body)| (SourceId::from_arg(name), Cursor::new(body.to_string())))
        .collect();
    let finder = DuplicateFinder::with_defaults();
    let (mut lines, summary) = finder.find_duplicates_from_readers(inputs).unwrap();
    ReportOrder::Count.sort_lines(&mut lines);
    (lines, summary)
}

#[test]
fn test_json_export_matches_scan() {
    let (lines, summary) = scan(&[("a.txt", "k\nm\nk\n"), ("b.txt", "m\nk\n")]);
    let output = JsonOutput::new(Report::Lines(&lines), &summary, ExitCode::Success);
    let parsed: serde_json::Value = serde_json::from_str(&output.to_json_pretty().unwrap()).unwrap();

    let duplicates = parsed["duplicates"].as_array().unwrap();
    assert_eq!(duplicates.len(), 2);
    assert_eq!(duplicates[0]["text"], "k");
    assert_eq!(duplicates[0]["count"], 3);
    assert_eq!(duplicates[0]["locations"][0]["lines"], serde_json::json!([1, 3]));
    assert_eq!(duplicates[1]["text"], "m");

    assert_eq!(parsed["summary"]["sources"], 2);
    assert_eq!(parsed["summary"]["lines_read"], 5);
    assert_eq!(parsed["summary"]["duplicate_lines"], 2);
}

#[test]
fn test_csv_export_row_per_occurrence() {
    let (lines, _) = scan(&[("a.txt", "k\nk\n"), ("b.txt", "k\n")]);
    let csv_str = CsvOutput::new(Report::Lines(&lines)).render().unwrap();

    let mut reader = csv::Reader::from_reader(csv_str.as_bytes());
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| &r[3] == "k" && &r[1] == "3"));
    assert_eq!(&rows[2][4], "b.txt");
}

#[test]
fn test_text_export_hashed_line() {
    let long = "0123456789abcdef0123456789abcdef";
    let body = format!("{long}\n{long}\n");
    let (lines, _) = scan(&[("a.txt", body.as_str())]);
    let text = TextOutput::new(Report::Lines(&lines)).render().unwrap();

    assert!(text.starts_with("2\t<sha256:"));
    assert!(text.ends_with("\ta.txt: [1, 2]\n"));
}
