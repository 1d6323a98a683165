//! CSV export for match, derivative and upload results.

use crate::core::derivative::DerivativeResult;
use crate::core::matcher::MatchCandidate;
use crate::core::upload::UploadRecord;
use std::borrow::Cow;
use std::io::Write;
use std::path::Path;

/// Quote a field if it holds a comma, quote or line break
pub fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

fn path_field(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}

/// Export match results to CSV
///
/// CSV columns: target, matched_path, score, accepted
pub fn export_matches_csv<'a, W, I>(candidates: I, mut writer: W) -> std::io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a MatchCandidate>,
{
    writeln!(writer, "target,matched_path,score,accepted")?;

    for candidate in candidates {
        writeln!(
            writer,
            "{},{},{},{}",
            escape(&candidate.target_name),
            escape(&path_field(candidate.best_path.as_deref())),
            candidate.score,
            candidate.is_match()
        )?;
    }

    Ok(())
}

/// Export derivative results to CSV
///
/// CSV columns: source, kind, output, success, error
pub fn export_derivatives_csv<W: Write>(results: &[DerivativeResult], mut writer: W) -> std::io::Result<()> {
    writeln!(writer, "source,kind,output,success,error")?;

    for result in results {
        writeln!(
            writer,
            "{},{},{},{},{}",
            escape(&result.source_path.display().to_string()),
            result.kind,
            escape(&path_field(result.output_path.as_deref())),
            result.success,
            escape(result.error.as_deref().unwrap_or(""))
        )?;
    }

    Ok(())
}

/// Export upload records to CSV
///
/// CSV columns: local_path, container, key, outcome, error
pub fn export_uploads_csv<W: Write>(records: &[UploadRecord], mut writer: W) -> std::io::Result<()> {
    writeln!(writer, "local_path,container,key,outcome,error")?;

    for record in records {
        writeln!(
            writer,
            "{},{},{},{},{}",
            escape(&record.local_path.display().to_string()),
            record.container,
            escape(&record.key),
            record.outcome,
            escape(record.error.as_deref().unwrap_or(""))
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::derivative::DerivativeKind;
    use crate::core::upload::{Container, UploadOutcome};
    use std::path::PathBuf;

    fn to_string(buffer: Vec<u8>) -> String {
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn matches_csv_has_header_and_rows() {
        let candidates = vec![
            MatchCandidate {
                target_name: "photo1.jpg".to_string(),
                best_path: Some(PathBuf::from("/scans/Photo1.JPG")),
                score: 100,
            },
            MatchCandidate::miss("missing.jpg", 45),
        ];
        let mut buffer = Vec::new();

        export_matches_csv(&candidates, &mut buffer).unwrap();

        let csv = to_string(buffer);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "target,matched_path,score,accepted");
        assert_eq!(lines[1], "photo1.jpg,/scans/Photo1.JPG,100,true");
        assert_eq!(lines[2], "missing.jpg,,45,false");
    }

    #[test]
    fn fields_with_commas_and_quotes_are_quoted() {
        assert_eq!(escape("plain.jpg"), "plain.jpg");
        assert_eq!(escape("a,b.jpg"), "\"a,b.jpg\"");
        assert_eq!(escape("say \"hi\".jpg"), "\"say \"\"hi\"\".jpg\"");
    }

    #[test]
    fn derivatives_csv_includes_errors() {
        let results = vec![DerivativeResult {
            source_path: PathBuf::from("/in/a b.png"),
            output_path: None,
            kind: DerivativeKind::Thumbnail,
            success: false,
            error: Some("contains spaces, rename it".to_string()),
        }];
        let mut buffer = Vec::new();

        export_derivatives_csv(&results, &mut buffer).unwrap();

        let csv = to_string(buffer);
        assert!(csv.contains("/in/a b.png,thumbnail,,false,\"contains spaces, rename it\""));
    }

    #[test]
    fn uploads_csv_uses_outcome_names() {
        let records = vec![UploadRecord {
            local_path: PathBuf::from("/in/a_TN.jpg"),
            container: Container::Thumbs,
            key: "a_TN.jpg".to_string(),
            outcome: UploadOutcome::Exists,
            error: None,
        }];
        let mut buffer = Vec::new();

        export_uploads_csv(&records, &mut buffer).unwrap();

        assert!(to_string(buffer).contains("/in/a_TN.jpg,thumbs,a_TN.jpg,EXISTS,"));
    }
}
