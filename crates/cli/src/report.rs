use minify_core::{Reduction, SourceSet};
use std::path::Path;
use std::time::Duration;

pub fn render_reduction_report(
    package: &Path,
    deadline: Duration,
    sources: &SourceSet,
    reductions: &[Reduction],
) -> String {
    let mut md = String::new();
    md.push_str("# Minify report\n\n");
    md.push_str(&format!("- Package: `{}`\n", package.display()));
    md.push_str(&format!("- Attempt deadline: `{deadline:?}`\n"));
    md.push_str(&format!("- Files: `{}`\n\n", reductions.len()));

    md.push_str("## Files\n\n");
    md.push_str("| file | candidates | removed | attempts | passes |\n");
    md.push_str("|---|---:|---:|---:|---:|\n");
    for reduction in reductions {
        md.push_str(&format!(
            "| `{}` | `{}` | `{}` | `{}` | `{}` |\n",
            reduction.file,
            reduction.candidates,
            reduction.removed.len(),
            reduction.attempts,
            reduction.passes,
        ));
    }
    md.push('\n');

    for reduction in reductions.iter().filter(|r| !r.removed.is_empty()) {
        let original: Vec<&str> = sources
            .get(&reduction.file)
            .map(|content| content.split('\n').collect())
            .unwrap_or_default();

        md.push_str(&format!("## Removed from `{}`\n\n", reduction.file));
        md.push_str("| line | text |\n");
        md.push_str("|---:|---|\n");
        let mut removed = reduction.removed.clone();
        removed.sort_unstable();
        for index in removed {
            let text = original.get(index).copied().unwrap_or_default();
            md.push_str(&format!(
                "| `{}` | `{}` |\n",
                index + 1,
                escape_cell(&truncate_one_line(text, 120)),
            ));
        }
        md.push('\n');
    }

    md
}

fn truncate_one_line(text: &str, max_chars: usize) -> String {
    let s = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if s.chars().count() <= max_chars {
        return s;
    }
    let truncated: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{truncated}…")
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_removed_lines_in_file_order() {
        let sources: SourceSet = [(
            "a.go",
            "// +gobra\n\t//@ assert x || y\n\t//@ assert z\n",
        )]
        .into_iter()
        .collect();
        let reductions = vec![Reduction {
            file: "a.go".to_string(),
            candidates: 2,
            removed: vec![2, 1],
            attempts: 3,
            passes: 3,
            single_passes: 3,
            content: String::new(),
        }];

        let md = render_reduction_report(
            Path::new("pkg"),
            Duration::from_secs(11),
            &sources,
            &reductions,
        );

        assert!(md.contains("- Package: `pkg`"));
        assert!(md.contains("| `a.go` | `2` | `2` | `3` | `3` |"));
        let first = md.find("| `2` | `//@ assert x \\|\\| y` |").unwrap();
        let second = md.find("| `3` | `//@ assert z` |").unwrap();
        assert!(first < second);
    }

    #[test]
    fn files_without_removals_have_no_section() {
        let sources: SourceSet = [("a.go", "// +gobra\n")].into_iter().collect();
        let reductions = vec![Reduction {
            file: "a.go".to_string(),
            candidates: 0,
            removed: vec![],
            attempts: 0,
            passes: 1,
            single_passes: 1,
            content: "// +gobra\n".to_string(),
        }];

        let md = render_reduction_report(Path::new("pkg"), Duration::from_secs(1), &sources, &reductions);
        assert!(!md.contains("## Removed from"));
    }
}
