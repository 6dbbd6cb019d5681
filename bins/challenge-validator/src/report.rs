// Verdict output: output.json for the judge plus a terminal summary
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use validator_common::types::Verdict;

/// Write the evaluated test cases as a JSON array, replacing any previous file
pub fn write_output(verdict: &Verdict, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(&verdict.test_cases)
        .context("Failed to serialize evaluated test cases")?;

    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

/// Render a per-case table plus totals
pub fn render_table(verdict: &Verdict) -> String {
    let id_width = verdict
        .test_cases
        .iter()
        .map(|tc| tc.id.len())
        .max()
        .unwrap_or(0)
        .max("id".len());

    let mut out = String::new();
    out.push_str(&format!(
        "{:<id_width$}  {:>9}  {:>12}  {:>6}\n",
        "id", "maxPoints", "actualPoints", "solved"
    ));
    for tc in &verdict.test_cases {
        out.push_str(&format!(
            "{:<id_width$}  {:>9}  {:>12}  {:>6}\n",
            tc.id, tc.max_points, tc.actual_points, tc.solved
        ));
    }
    out.push_str(&format!(
        "Score: {} / {}  ({})\n",
        verdict.total_points,
        verdict.max_points(),
        if verdict.passed { "passed" } else { "failed" }
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator_common::types::EvaluatedTestCase;

    fn verdict() -> Verdict {
        Verdict::from_cases(vec![
            EvaluatedTestCase {
                id: "TEST_1".to_string(),
                max_points: 10.0,
                actual_points: 10.0,
                solved: true,
            },
            EvaluatedTestCase {
                id: "TEST_2".to_string(),
                max_points: 90.0,
                actual_points: 0.0,
                solved: false,
            },
        ])
    }

    #[test]
    fn test_write_output_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.json");

        write_output(&verdict(), &path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            written,
            serde_json::json!([
                {"id": "TEST_1", "maxPoints": 10, "actualPoints": 10, "solved": true},
                {"id": "TEST_2", "maxPoints": 90, "actualPoints": 0, "solved": false}
            ])
        );
    }

    #[test]
    fn test_write_output_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("output.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "stale content that is much longer than the new output ....").unwrap();

        let empty = Verdict::from_cases(vec![]);
        write_output(&empty, &path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn test_render_table() {
        let table = render_table(&verdict());
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("id"));
        assert!(lines[1].starts_with("TEST_1"));
        assert!(lines[1].trim_end().ends_with("true"));
        assert!(lines[2].trim_end().ends_with("false"));
        assert_eq!(lines[3], "Score: 10 / 100  (failed)");
    }
}
