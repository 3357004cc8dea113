//! Page extraction: ask for a range, pick an output file, run `qpdf`.
//!
//! The flow talks to the user only through [`Dialogs`] and to the outside
//! world only through a [`PageExtractor`], so it runs unchanged against
//! scripted dialogs and a recording extractor in tests.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use log::{info, warn};

use crate::dialog::{self, Dialogs, Response};

const TITLE: &str = "Extract pages";

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Pages out of range.\nExpected 1 <= start <= end <= {page_count}")]
    OutOfRange { page_count: usize },
    #[error("Invalid range: start ({start}) must not be after end ({end})")]
    InvertedRange { start: u32, end: u32 },
    #[error("Refusing to overwrite the source file")]
    DestinationIsSource,
    #[error("Extraction failed: cannot run {program}.\nCheck that qpdf is installed: sudo apt install qpdf")]
    ToolUnavailable {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("Extraction failed ({status}).\nCheck that qpdf is installed: sudo apt install qpdf")]
    ToolFailed { status: ExitStatus },
}

/// Inclusive, 1-based, validated page range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    start: u32,
    end: u32,
}

impl PageRange {
    /// Check a user-entered range against the document's page count.
    ///
    /// Bounds are checked before ordering, so `0..5` on a 3-page document
    /// reports out of range rather than inverted.
    pub fn validate(start: u32, end: u32, page_count: usize) -> Result<Self, ExtractionError> {
        let in_range = |n: u32| (1..=page_count).contains(&(n as usize));
        if !in_range(start) || !in_range(end) {
            return Err(ExtractionError::OutOfRange { page_count });
        }
        if end < start {
            return Err(ExtractionError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// `a-b`, as understood by `qpdf --pages`.
    pub fn to_arg(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

/// `<stem>_p<a>-p<b>.pdf` next to the source file.
pub fn default_output_name(source: &Path, range: PageRange) -> String {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "score.pdf".to_string());
    let stem = strip_pdf_suffix(&name);
    format!("{stem}_p{}-p{}.pdf", range.start, range.end)
}

fn strip_pdf_suffix(name: &str) -> &str {
    let split = name.len().saturating_sub(4);
    match (name.get(..split), name.get(split..)) {
        (Some(stem), Some(tail)) if tail.eq_ignore_ascii_case(".pdf") => stem,
        _ => name,
    }
}

/// Append `.pdf` unless the path already ends with it (case-sensitive).
pub fn with_pdf_extension(path: PathBuf) -> PathBuf {
    if path.as_os_str().to_string_lossy().ends_with(".pdf") {
        return path;
    }
    let mut s: OsString = path.into_os_string();
    s.push(".pdf");
    PathBuf::from(s)
}

/// Capability that writes `range` of `source` into `dest`.
pub trait PageExtractor {
    fn extract(&self, source: &Path, range: PageRange, dest: &Path) -> Result<(), ExtractionError>;
}

/// Runs `<program> <src> --pages <src> <a>-<b> -- <dest>`.
#[derive(Debug, Clone)]
pub struct QpdfExtractor {
    program: String,
}

impl QpdfExtractor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl PageExtractor for QpdfExtractor {
    fn extract(&self, source: &Path, range: PageRange, dest: &Path) -> Result<(), ExtractionError> {
        info!(
            "extract: {} {} --pages {} {} -- {}",
            self.program,
            source.display(),
            source.display(),
            range.to_arg(),
            dest.display()
        );
        let status = Command::new(&self.program)
            .arg(source)
            .arg("--pages")
            .arg(source)
            .arg(range.to_arg())
            .arg("--")
            .arg(dest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| ExtractionError::ToolUnavailable {
                program: self.program.clone(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(ExtractionError::ToolFailed { status })
        }
    }
}

/// How an extraction session ended.
#[derive(Debug)]
pub enum ExtractOutcome {
    /// The user backed out of one of the prompts.
    Cancelled,
    /// Input was rejected before anything ran.
    Rejected(ExtractionError),
    /// The extractor ran and failed.
    Failed(ExtractionError),
    Written(PathBuf),
}

/// Interactive extraction of a page range of `source` (an absolute path).
///
/// Every rejection and the final result are reported to the user through
/// `dialogs`; the returned outcome is for the caller's logging.
pub fn run_extraction<D, E>(
    dialogs: &mut D,
    extractor: &E,
    source: &Path,
    page_count: usize,
) -> io::Result<ExtractOutcome>
where
    D: Dialogs + ?Sized,
    E: PageExtractor + ?Sized,
{
    if page_count == 0 {
        return Ok(ExtractOutcome::Cancelled);
    }

    let Some(start) = dialog::ask_page_number(dialogs, TITLE, "Start page (1..N):")? else {
        return Ok(ExtractOutcome::Cancelled);
    };
    let Some(end) = dialog::ask_page_number(dialogs, TITLE, "End page (1..N):")? else {
        return Ok(ExtractOutcome::Cancelled);
    };

    let range = match PageRange::validate(start, end, page_count) {
        Ok(r) => r,
        Err(e) => return reject(dialogs, e),
    };

    let dir = source.parent().unwrap_or_else(|| Path::new("."));
    let default_path = dir.join(default_output_name(source, range));
    let answer = dialogs.prompt(TITLE, "Save as:", &default_path.to_string_lossy())?;
    let dest = match answer {
        Response::Submit(text) if !text.trim().is_empty() => {
            with_pdf_extension(PathBuf::from(text.trim()))
        }
        _ => return Ok(ExtractOutcome::Cancelled),
    };

    if is_same_file(&dest, source) {
        return reject(dialogs, ExtractionError::DestinationIsSource);
    }
    if dest.exists() {
        let question = format!("{} already exists. Overwrite?", dest.display());
        if !dialogs.confirm(&question)? {
            return Ok(ExtractOutcome::Cancelled);
        }
    }

    match extractor.extract(source, range, &dest) {
        Ok(()) => {
            info!("extract: wrote {}", dest.display());
            dialogs.message(&format!("Extracted PDF saved:\n{}", dest.display()))?;
            Ok(ExtractOutcome::Written(dest))
        }
        Err(e) => {
            warn!("extract: {e}");
            dialogs.message(&e.to_string())?;
            Ok(ExtractOutcome::Failed(e))
        }
    }
}

fn is_same_file(dest: &Path, source: &Path) -> bool {
    if dest == source {
        return true;
    }
    match (dest.canonicalize(), source.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn reject<D: Dialogs + ?Sized>(dialogs: &mut D, e: ExtractionError) -> io::Result<ExtractOutcome> {
    info!("extract: rejected: {e}");
    dialogs.message(&e.to_string())?;
    Ok(ExtractOutcome::Rejected(e))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::dialog::testing::ScriptedDialogs;

    #[derive(Default)]
    struct RecordingExtractor {
        calls: RefCell<Vec<(PathBuf, PageRange, PathBuf)>>,
        fail: bool,
    }

    impl PageExtractor for RecordingExtractor {
        fn extract(&self, source: &Path, range: PageRange, dest: &Path) -> Result<(), ExtractionError> {
            self.calls
                .borrow_mut()
                .push((source.to_path_buf(), range, dest.to_path_buf()));
            if self.fail {
                Err(ExtractionError::ToolUnavailable {
                    program: "qpdf".into(),
                    source: io::Error::from(io::ErrorKind::NotFound),
                })
            } else {
                Ok(())
            }
        }
    }

    fn range(a: u32, b: u32) -> PageRange {
        PageRange::validate(a, b, 100).expect("valid range")
    }

    #[test]
    fn default_name_strips_pdf_suffix() {
        let src = Path::new("/scores/Meditation.pdf");
        assert_eq!(default_output_name(src, range(24, 30)), "Meditation_p24-p30.pdf");
        let upper = Path::new("/scores/Etude.PDF");
        assert_eq!(default_output_name(upper, range(1, 2)), "Etude_p1-p2.pdf");
        let bare = Path::new("/scores/notes");
        assert_eq!(default_output_name(bare, range(3, 3)), "notes_p3-p3.pdf");
    }

    #[test]
    fn pdf_extension_is_appended_when_missing() {
        assert_eq!(with_pdf_extension("/tmp/out".into()), PathBuf::from("/tmp/out.pdf"));
        assert_eq!(with_pdf_extension("/tmp/out.pdf".into()), PathBuf::from("/tmp/out.pdf"));
        assert_eq!(with_pdf_extension("/tmp/out.PDF".into()), PathBuf::from("/tmp/out.PDF.pdf"));
    }

    #[test]
    fn validate_rejects_out_of_range_and_inverted() {
        assert!(matches!(
            PageRange::validate(0, 3, 10),
            Err(ExtractionError::OutOfRange { page_count: 10 })
        ));
        assert!(matches!(
            PageRange::validate(2, 11, 10),
            Err(ExtractionError::OutOfRange { .. })
        ));
        assert!(matches!(
            PageRange::validate(5, 4, 10),
            Err(ExtractionError::InvertedRange { start: 5, end: 4 })
        ));
        assert_eq!(PageRange::validate(4, 4, 10).unwrap().to_arg(), "4-4");
    }

    #[test]
    fn inverted_range_never_reaches_extractor() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("score.pdf");
        let mut dialogs = ScriptedDialogs::answering([Some("5"), Some("3")]);
        let ex = RecordingExtractor::default();

        let out = run_extraction(&mut dialogs, &ex, &src, 10).unwrap();
        assert!(matches!(out, ExtractOutcome::Rejected(ExtractionError::InvertedRange { .. })));
        assert!(ex.calls.borrow().is_empty());
        assert_eq!(dialogs.messages.len(), 1);
        assert!(dialogs.messages[0].starts_with("Invalid range"));
    }

    #[test]
    fn out_of_range_never_reaches_extractor() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("score.pdf");
        let mut dialogs = ScriptedDialogs::answering([Some("1"), Some("40")]);
        let ex = RecordingExtractor::default();

        let out = run_extraction(&mut dialogs, &ex, &src, 30).unwrap();
        assert!(matches!(out, ExtractOutcome::Rejected(ExtractionError::OutOfRange { .. })));
        assert!(ex.calls.borrow().is_empty());
        assert!(dialogs.messages[0].contains("<= 30"));
    }

    #[test]
    fn accepted_default_path_is_extracted() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("Meditation.pdf");
        let expected = dir.path().join("Meditation_p24-p30.pdf");
        let mut dialogs = ScriptedDialogs::answering([
            Some("24".to_string()),
            Some("30".to_string()),
            Some(expected.to_string_lossy().into_owned()),
        ]);
        let ex = RecordingExtractor::default();

        let out = run_extraction(&mut dialogs, &ex, &src, 40).unwrap();
        match out {
            ExtractOutcome::Written(p) => assert_eq!(p, expected),
            other => panic!("unexpected outcome: {other:?}"),
        }
        // The save prompt was prefilled with the default path.
        assert_eq!(dialogs.asked[2].1, expected.to_string_lossy());
        let calls = ex.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, range(24, 30));
        assert!(dialogs.messages[0].starts_with("Extracted PDF saved"));
    }

    #[test]
    fn destination_equal_to_source_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("score.pdf");
        std::fs::write(&src, b"%PDF").unwrap();
        let mut dialogs = ScriptedDialogs::answering([
            Some("1".to_string()),
            Some("2".to_string()),
            Some(dir.path().join("score").to_string_lossy().into_owned()),
        ]);
        let ex = RecordingExtractor::default();

        let out = run_extraction(&mut dialogs, &ex, &src, 5).unwrap();
        assert!(matches!(out, ExtractOutcome::Rejected(ExtractionError::DestinationIsSource)));
        assert!(ex.calls.borrow().is_empty());
    }

    #[test]
    fn existing_destination_needs_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("score.pdf");
        let dest = dir.path().join("part.pdf");
        std::fs::write(&dest, b"old").unwrap();
        let answers = || {
            [
                Some("1".to_string()),
                Some("2".to_string()),
                Some(dest.to_string_lossy().into_owned()),
            ]
        };
        let ex = RecordingExtractor::default();

        let mut declined = ScriptedDialogs::answering(answers());
        declined.confirms.push_back(false);
        let out = run_extraction(&mut declined, &ex, &src, 5).unwrap();
        assert!(matches!(out, ExtractOutcome::Cancelled));
        assert!(ex.calls.borrow().is_empty());

        let mut accepted = ScriptedDialogs::answering(answers());
        accepted.confirms.push_back(true);
        let out = run_extraction(&mut accepted, &ex, &src, 5).unwrap();
        assert!(matches!(out, ExtractOutcome::Written(_)));
        assert_eq!(ex.calls.borrow().len(), 1);
    }

    #[test]
    fn tool_failure_names_the_dependency() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("score.pdf");
        let mut dialogs = ScriptedDialogs::answering([
            Some("1".to_string()),
            Some("1".to_string()),
            Some(dir.path().join("one.pdf").to_string_lossy().into_owned()),
        ]);
        let ex = RecordingExtractor {
            fail: true,
            ..RecordingExtractor::default()
        };

        let out = run_extraction(&mut dialogs, &ex, &src, 3).unwrap();
        assert!(matches!(out, ExtractOutcome::Failed(_)));
        let last = dialogs.messages.last().unwrap();
        assert!(last.contains("sudo apt install qpdf"), "{last}");
    }

    #[test]
    fn cancel_at_any_prompt_stops_quietly() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("score.pdf");
        let ex = RecordingExtractor::default();
        for answers in [vec![None], vec![Some("1"), None], vec![Some("1"), Some("2"), None]] {
            let mut dialogs = ScriptedDialogs::answering(answers);
            let out = run_extraction(&mut dialogs, &ex, &src, 5).unwrap();
            assert!(matches!(out, ExtractOutcome::Cancelled));
            assert!(dialogs.messages.is_empty());
        }
        assert!(ex.calls.borrow().is_empty());
    }
}
