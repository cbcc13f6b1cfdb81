//! CLI integration tests.
//!
//! Runs the actual binary against papers built in a temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

mod common;
use common::*;

fn anonymizer_cmd() -> Command {
    assert_cmd::cargo::cargo_bin_cmd!("paper-anonymizer")
}

mod argument_parsing {
    use super::*;

    #[test]
    fn test_help_flag() {
        anonymizer_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--input"))
            .stdout(predicate::str::contains("--output"))
            .stdout(predicate::str::contains("--no-names"))
            .stdout(predicate::str::contains("--backend"));
    }

    #[test]
    fn test_version_flag() {
        anonymizer_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("paper-anonymizer"));
    }

    #[test]
    fn test_missing_output_argument() {
        anonymizer_cmd()
            .args(["--input", "paper.pdf"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--output is required"));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        anonymizer_cmd()
            .args(["--backend", "ocr", "info"])
            .assert()
            .failure();
    }
}

mod info_command {
    use super::*;

    #[test]
    fn test_info_default_backend() {
        anonymizer_cmd()
            .arg("info")
            .assert()
            .success()
            .stdout(predicate::str::contains("status: ok"))
            .stdout(predicate::str::contains("backend: overlay"))
            .stdout(predicate::str::contains("library: mupdf"));
    }

    #[test]
    fn test_info_content_stream_backend() {
        anonymizer_cmd()
            .args(["--backend", "content-stream", "info"])
            .assert()
            .success()
            .stdout(predicate::str::contains("backend: content-stream"))
            .stdout(predicate::str::contains("library: lopdf"));
    }
}

mod anonymize_command {
    use super::*;

    #[test]
    fn test_missing_input_exits_with_two() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("does_not_exist.pdf");
        let output = temp_dir.path().join("out.pdf");

        anonymizer_cmd()
            .arg("--input")
            .arg(&missing)
            .arg("--output")
            .arg(&output)
            .assert()
            .code(2)
            .stderr(predicate::str::contains("does not exist"));
        assert!(!output.exists());
    }

    #[test]
    fn test_content_stream_run_writes_codes() {
        let temp_dir = TempDir::new().unwrap();
        let input = sample_paper()
            .build_to(&temp_dir.path().join("paper.pdf"))
            .unwrap();
        let output = temp_dir.path().join("anonymized.pdf");

        anonymizer_cmd()
            .args(["--backend", "content-stream"])
            .arg("-i")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .assert()
            .success()
            .stdout(predicate::str::contains("Anonymized 2 instance(s)"));

        let pages = page_texts(&fs::read(&output).unwrap()).unwrap();
        assert_preserved(&pages[0], "[AUTHOR_1]");
        assert_preserved(&pages[1], "Jane Doe");
    }

    #[test]
    fn test_no_names_keeps_names() {
        let temp_dir = TempDir::new().unwrap();
        let input = sample_paper()
            .build_to(&temp_dir.path().join("paper.pdf"))
            .unwrap();
        let output = temp_dir.path().join("anonymized.pdf");

        anonymizer_cmd()
            .args(["--backend", "content-stream", "--no-names"])
            .arg("-i")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .assert()
            .success();

        let pages = page_texts(&fs::read(&output).unwrap()).unwrap();
        assert_preserved(&pages[0], "Jane Doe wrote this paper.");
        assert_redacted(&pages[0], "jane.doe@lab.org");
    }

    #[test]
    fn test_nothing_to_anonymize() {
        let temp_dir = TempDir::new().unwrap();
        let input = PaperPdfBuilder::new()
            .with_page(&["nothing identifying here."])
            .build_to(&temp_dir.path().join("plain.pdf"))
            .unwrap();
        let output = temp_dir.path().join("out.pdf");

        anonymizer_cmd()
            .args(["--backend", "content-stream"])
            .arg("-i")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .assert()
            .success()
            .stdout(predicate::str::contains("No identifying information"));
        assert!(output.exists());
    }

    #[test]
    fn test_verbose_summary() {
        let temp_dir = TempDir::new().unwrap();
        let input = sample_paper()
            .build_to(&temp_dir.path().join("paper.pdf"))
            .unwrap();
        let output = temp_dir.path().join("anonymized.pdf");

        anonymizer_cmd()
            .args(["--backend", "content-stream", "-v"])
            .arg("-i")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .assert()
            .success()
            .stdout(predicate::str::contains("Anonymization Summary"))
            .stdout(predicate::str::contains("Pages processed:    2"));
    }

    #[test]
    fn test_garbage_input_fails() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("broken.pdf");
        fs::write(&input, b"definitely not a pdf").unwrap();
        let output = temp_dir.path().join("out.pdf");

        anonymizer_cmd()
            .args(["--backend", "content-stream"])
            .arg("-i")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("Error"));
    }

    #[test]
    fn test_unwritable_output_reports_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let input = sample_paper()
            .build_to(&temp_dir.path().join("paper.pdf"))
            .unwrap();
        let output = temp_dir.path().join("missing_dir").join("out.pdf");

        anonymizer_cmd()
            .args(["--backend", "content-stream"])
            .arg("-i")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("IO error"))
            .stderr(predicate::str::contains("missing_dir"));
    }

    #[test]
    fn test_size_limit_enforced() {
        let temp_dir = TempDir::new().unwrap();
        let input = sample_paper()
            .build_to(&temp_dir.path().join("paper.pdf"))
            .unwrap();
        let output = temp_dir.path().join("out.pdf");

        anonymizer_cmd()
            .args(["--backend", "content-stream", "--max-size", "64"])
            .arg("-i")
            .arg(&input)
            .arg("-o")
            .arg(&output)
            .assert()
            .failure()
            .stderr(predicate::str::contains("byte limit"));
    }
}

mod report_commands {
    use super::*;

    #[test]
    fn test_extract_prints_json() {
        let temp_dir = TempDir::new().unwrap();
        let input = sample_paper()
            .build_to(&temp_dir.path().join("paper.pdf"))
            .unwrap();

        anonymizer_cmd()
            .args(["--backend", "content-stream", "extract", "-i"])
            .arg(&input)
            .assert()
            .success()
            .stdout(predicate::str::contains("\"names\""))
            .stdout(predicate::str::contains("Jane Doe"))
            .stdout(predicate::str::contains("jane.doe@lab.org"))
            .stdout(predicate::str::contains("excludedRegions"));
    }

    #[test]
    fn test_extract_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let input = sample_paper()
            .build_to(&temp_dir.path().join("paper.pdf"))
            .unwrap();
        let report = temp_dir.path().join("report.json");

        anonymizer_cmd()
            .args(["--backend", "content-stream", "extract", "-i"])
            .arg(&input)
            .arg("-o")
            .arg(&report)
            .assert()
            .success();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
        assert_eq!(json["emails"][0], "jane.doe@lab.org");
    }

    #[test]
    fn test_text_dump_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let input = sample_paper()
            .build_to(&temp_dir.path().join("paper.pdf"))
            .unwrap();
        let dump = temp_dir.path().join("paper.txt");

        anonymizer_cmd()
            .args(["text", "-i"])
            .arg(&input)
            .arg("-o")
            .arg(&dump)
            .assert()
            .success()
            .stdout(predicate::str::contains("Wrote"));
        assert!(dump.exists());
    }

    #[test]
    fn test_extract_missing_input() {
        anonymizer_cmd()
            .args(["extract", "-i", "/nonexistent/paper.pdf"])
            .assert()
            .code(2);
    }
}
