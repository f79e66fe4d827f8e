//! Static analysis over the script sources.
//!
//! Every file is checked and every problem collected before the report is
//! printed; the task fails afterwards if anything was found.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use oxc_allocator::Allocator;
use oxc_ast::ast::VariableDeclarationKind;
use oxc_ast::AstKind;
use oxc_diagnostics::OxcDiagnostic;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::{GetSpan, SourceType};

use crate::config::{LintConfig, ScriptsConfig};
use crate::scripts::discover_sources;
use crate::task::{Task, TaskError, TaskFuture};

/// A single lint problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: PathBuf,
    pub line: usize,
    pub column: usize,
    pub rule: &'static str,
    pub message: String,
}

/// All problems found in one lint run.
#[derive(Debug, Default)]
pub struct LintReport {
    pub files: usize,
    pub violations: Vec<Violation>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for LintReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut current: Option<&Path> = None;
        for v in &self.violations {
            if current != Some(v.path.as_path()) {
                if current.is_some() {
                    writeln!(f)?;
                }
                writeln!(f, "{}", v.path.display())?;
                current = Some(v.path.as_path());
            }
            writeln!(
                f,
                "  {}:{}  error  {}  {}",
                v.line, v.column, v.message, v.rule
            )?;
        }

        let count = self.violations.len();
        if count > 0 {
            writeln!(f)?;
            let (noun, errors) = if count == 1 {
                ("problem", "error")
            } else {
                ("problems", "errors")
            };
            write!(f, "\u{2716} {count} {noun} ({count} {errors}, 0 warnings)")?;
        }
        Ok(())
    }
}

/// Lints every script source.
pub struct LintTask {
    scripts: ScriptsConfig,
    config: LintConfig,
}

impl LintTask {
    pub fn new(scripts: ScriptsConfig, config: LintConfig) -> Self {
        Self { scripts, config }
    }
}

impl Task for LintTask {
    fn name(&self) -> &str {
        "lint"
    }

    fn run(&self) -> TaskFuture<'_> {
        let src = self.scripts.src.clone();
        let config = self.config.clone();
        Box::pin(async move {
            let report = tokio::task::spawn_blocking(move || lint_tree(&src, &config))
                .await
                .map_err(|e| TaskError::Join(e.to_string()))?;

            if report.is_clean() {
                tracing::info!("Linted {} files, no problems", report.files);
                return Ok(());
            }

            tracing::error!("\n{}", report);
            Err(TaskError::Lint {
                count: report.violations.len(),
            })
        })
    }
}

/// Lint all sources below `src`.
pub fn lint_tree(src: &Path, config: &LintConfig) -> LintReport {
    let sources = discover_sources(src);
    let mut report = LintReport {
        files: sources.len(),
        violations: Vec::new(),
    };

    for path in &sources {
        match fs::read_to_string(path) {
            Ok(source) => report.violations.extend(
                lint_source(path, &source)
                    .into_iter()
                    .filter(|v| !config.allow.iter().any(|rule| rule == v.rule)),
            ),
            Err(e) => report.violations.push(Violation {
                path: path.clone(),
                line: 0,
                column: 0,
                rule: "io",
                message: e.to_string(),
            }),
        }
    }

    report
}

/// Lint a single source file.
pub fn lint_source(path: &Path, source: &str) -> Vec<Violation> {
    let at = |offset: u32, rule: &'static str, message: String| {
        let (line, column) = line_col(source, offset as usize);
        Violation {
            path: path.to_path_buf(),
            line,
            column,
            rule,
            message,
        }
    };

    let Ok(source_type) = SourceType::from_path(path) else {
        return vec![at(0, "syntax", "Unsupported file type".to_string())];
    };

    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, source_type).parse();
    if !parsed.errors.is_empty() {
        return parsed
            .errors
            .iter()
            .map(|e| at(label_offset(e), "syntax", e.to_string()))
            .collect();
    }

    let built = SemanticBuilder::new()
        .with_check_syntax_error(true)
        .build(&parsed.program);
    let mut violations: Vec<Violation> = built
        .errors
        .iter()
        .map(|e| at(label_offset(e), "syntax", e.to_string()))
        .collect();

    for node in built.semantic.nodes().iter() {
        let kind = node.kind();
        match kind {
            AstKind::DebuggerStatement(_) => violations.push(at(
                kind.span().start,
                "no-debugger",
                "Unexpected 'debugger' statement".to_string(),
            )),
            AstKind::VariableDeclaration(decl) if decl.kind == VariableDeclarationKind::Var => {
                violations.push(at(
                    kind.span().start,
                    "no-var",
                    "Unexpected var, use let or const instead".to_string(),
                ))
            }
            AstKind::BinaryExpression(expr) => {
                let op = expr.operator.as_str();
                if op == "==" || op == "!=" {
                    violations.push(at(
                        kind.span().start,
                        "eqeqeq",
                        format!("Expected '{op}=' and instead saw '{op}'"),
                    ));
                }
            }
            _ => {}
        }
    }

    violations.sort_by_key(|v| (v.line, v.column));
    violations
}

/// Start of the first labelled span of a diagnostic, or 0 if it has none.
fn label_offset(diagnostic: &OxcDiagnostic) -> u32 {
    diagnostic
        .labels
        .as_ref()
        .and_then(|labels| labels.first())
        .map_or(0, |label| label.offset() as u32)
}

/// One-based line and column of a byte offset.
fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset.min(source.len())];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map_or(before.chars().count(), |i| before[i + 1..].chars().count())
        + 1;
    (line, column)
}
