use crate::Result;
use crate::compdb::command::{CompileCommand, read_compile_commands, write_compile_commands};
use crate::compdb::path::NormalizedPath;
use crate::compdb::rules::FilterRules;
use std::path::Path;
use tracing::{debug, trace};

/// Outcome of one filter run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSummary {
    pub total: usize,
    pub kept: usize,
}

/// Decides per entry whether it belongs to the project.
#[derive(Debug, Clone)]
pub struct SourceMatcher<'a> {
    roots: Vec<NormalizedPath>,
    rules: &'a FilterRules,
}

impl<'a> SourceMatcher<'a> {
    pub fn new(source_root: &Path, rules: &'a FilterRules) -> Self {
        let fold = rules.case_insensitive;
        let base = NormalizedPath::new(&source_root.to_string_lossy(), fold);
        let roots = rules
            .include_dirs
            .iter()
            .map(|dir| base.join(dir, fold))
            .collect();
        Self { roots, rules }
    }

    /// Kept iff the file lies under an include root and matches no exclusion
    /// pattern. Relative files are resolved against the entry's `directory`.
    pub fn keeps(&self, command: &CompileCommand) -> bool {
        let fold = self.rules.case_insensitive;
        let Some(file) = command.file().filter(|f| !f.is_empty()) else {
            trace!("entry without a file field");
            return false;
        };

        let mut path = NormalizedPath::new(file, fold);
        if path.is_relative() {
            if let Some(dir) = command.directory() {
                path = NormalizedPath::new(dir, fold).join(file, fold);
            }
        }

        if !self.roots.iter().any(|root| path.starts_with(root)) {
            trace!(file, "outside source roots");
            return false;
        }

        let normalized = path.to_string();
        if let Some(pattern) = self.rules.excluded_by(&normalized) {
            trace!(file, pattern, "excluded");
            return false;
        }
        true
    }
}

/// Select the project's own compilation units, preserving order.
pub fn filter_commands(
    commands: &[CompileCommand],
    source_root: &Path,
    rules: &FilterRules,
) -> Vec<CompileCommand> {
    let matcher = SourceMatcher::new(source_root, rules);
    commands
        .iter()
        .filter(|c| matcher.keeps(c))
        .cloned()
        .collect()
}

/// Read `input`, filter it, and write the result to `output`.
///
/// The input is fully parsed before `output` is opened, so a malformed
/// database leaves `output` untouched.
pub fn filter_file(
    input: &Path,
    output: &Path,
    source_root: &Path,
    rules: &FilterRules,
) -> Result<FilterSummary> {
    let commands = read_compile_commands(input)?;
    let kept = filter_commands(&commands, source_root, rules);
    write_compile_commands(output, &kept)?;

    debug!(
        input = %input.display(),
        output = %output.display(),
        total = commands.len(),
        kept = kept.len(),
        "filtered compilation database"
    );

    Ok(FilterSummary {
        total: commands.len(),
        kept: kept.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compdb::command::parse_compile_commands;
    use pretty_assertions::assert_eq;

    fn rules() -> FilterRules {
        FilterRules {
            case_insensitive: false,
            ..FilterRules::default()
        }
    }

    fn files(commands: &[CompileCommand]) -> Vec<&str> {
        commands.iter().filter_map(CompileCommand::file).collect()
    }

    #[test]
    fn keeps_src_and_app_drops_deps() {
        let db = parse_compile_commands(
            r#"[{"file":"/proj/src/a.cpp"}, {"file":"/proj/build/_deps/x.cpp"}, {"file":"/proj/app/b.cpp"}]"#,
        )
        .unwrap();

        let kept = filter_commands(&db, Path::new("/proj"), &rules());
        assert_eq!(files(&kept), vec!["/proj/src/a.cpp", "/proj/app/b.cpp"]);
    }

    #[test]
    fn sibling_with_shared_prefix_is_not_under_root() {
        let db = parse_compile_commands(
            r#"[{"file":"/proj/srcfoo/a.cpp"}, {"file":"/proj/application/b.cpp"}, {"file":"/proj/src/ok.cpp"}]"#,
        )
        .unwrap();

        let kept = filter_commands(&db, Path::new("/proj"), &rules());
        assert_eq!(files(&kept), vec!["/proj/src/ok.cpp"]);
    }

    #[test]
    fn every_default_pattern_excludes() {
        let db = parse_compile_commands(
            r#"[
                {"file":"/proj/src/thirdparty/a.cpp"},
                {"file":"/proj/src/_deps/a.cpp"},
                {"file":"/proj/src/external/a.cpp"},
                {"file":"/proj/app/third_party/a.cpp"},
                {"file":"/proj/app/build/gen.cpp"},
                {"file":"/proj/app/main.cpp"}
            ]"#,
        )
        .unwrap();

        let kept = filter_commands(&db, Path::new("/proj"), &rules());
        assert_eq!(files(&kept), vec!["/proj/app/main.cpp"]);
    }

    #[test]
    fn dot_segments_are_resolved_before_matching() {
        let db = parse_compile_commands(
            r#"[{"file":"/proj/tools/../src/a.cpp"}, {"file":"/proj/src/../tools/b.cpp"}]"#,
        )
        .unwrap();

        let kept = filter_commands(&db, Path::new("/proj/./"), &rules());
        assert_eq!(files(&kept), vec!["/proj/tools/../src/a.cpp"]);
    }

    #[test]
    fn relative_files_resolve_against_directory() {
        let db = parse_compile_commands(
            r#"[
                {"directory":"/proj/out","file":"../src/a.cpp"},
                {"directory":"/proj/out","file":"gen/b.cpp"},
                {"file":"src/c.cpp"},
                {"directory":"/proj/src"}
            ]"#,
        )
        .unwrap();

        let kept = filter_commands(&db, Path::new("/proj"), &rules());
        assert_eq!(files(&kept), vec!["../src/a.cpp"]);
    }

    #[test]
    fn custom_rules_replace_defaults() {
        let db = parse_compile_commands(
            r#"[{"file":"/proj/lib/a.cpp"}, {"file":"/proj/lib/vendor/b.cpp"}, {"file":"/proj/src/c.cpp"}]"#,
        )
        .unwrap();
        let rules = FilterRules {
            include_dirs: vec!["lib".to_string()],
            exclude_patterns: vec!["vendor".to_string()],
            case_insensitive: false,
        };

        let kept = filter_commands(&db, Path::new("/proj"), &rules);
        assert_eq!(files(&kept), vec!["/proj/lib/a.cpp"]);
    }
}
