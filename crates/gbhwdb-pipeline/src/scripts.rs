//! Script compilation: TypeScript/TSX sources to JavaScript with inline source maps.
//!
//! Transpiling only strips types; type errors come from the configured
//! checker command, which runs after every file has been attempted.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{TransformOptions, Transformer};
use rayon::prelude::*;
use tokio::process::Command;
use walkdir::WalkDir;

use crate::config::ScriptsConfig;
use crate::task::{Task, TaskError, TaskFuture};

/// Compiles every script source into the scripts output directory.
pub struct ScriptsTask {
    config: ScriptsConfig,
}

impl ScriptsTask {
    pub fn new(config: ScriptsConfig) -> Self {
        Self { config }
    }
}

impl Task for ScriptsTask {
    fn name(&self) -> &str {
        "scripts"
    }

    fn run(&self) -> TaskFuture<'_> {
        let config = self.config.clone();
        Box::pin(async move {
            let compiled = tokio::task::spawn_blocking(move || compile_all(&config))
                .await
                .map_err(|e| TaskError::Join(e.to_string()))?;
            let type_errors = type_check(&self.config.check).await?;

            let errors = match compiled {
                Ok(count) => {
                    tracing::info!("Compiled {} scripts", count);
                    type_errors
                }
                Err(TaskError::Compile { count }) => count + type_errors,
                Err(e) => return Err(e),
            };
            if errors > 0 {
                return Err(TaskError::Compile { count: errors });
            }
            Ok(())
        })
    }
}

/// Run the type-checker command, logging its diagnostics.
///
/// Returns the number of type errors; a non-zero exit counts as at least one.
async fn type_check(command: &[String]) -> Result<usize, TaskError> {
    let Some((program, args)) = command.split_first() else {
        return Ok(0);
    };
    let command_line = command.join(" ");
    tracing::debug!("Type checking with `{}`", command_line);

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| TaskError::Spawn {
            command: command_line.clone(),
            source,
        })?;

    if output.status.success() {
        return Ok(0);
    }

    let mut errors = 0;
    for stream in [&output.stdout, &output.stderr] {
        for line in String::from_utf8_lossy(stream).lines() {
            if line.trim().is_empty() {
                continue;
            }
            tracing::error!("{}", line);
            if line.contains("error TS") {
                errors += 1;
            }
        }
    }
    tracing::error!("`{}` failed: {}", command_line, output.status);
    Ok(errors.max(1))
}

/// Find `.ts` / `.tsx` sources below `src`, skipping declaration files.
pub(crate) fn discover_sources(src: &Path) -> Vec<PathBuf> {
    let mut sources: Vec<PathBuf> = WalkDir::new(src)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            (ext == "ts" || ext == "tsx") && !name.ends_with(".d.ts")
        })
        .collect();
    sources.sort();
    sources
}

/// Compile every source, attempting all files before reporting failure.
fn compile_all(config: &ScriptsConfig) -> Result<usize, TaskError> {
    if !config.src.exists() {
        tracing::warn!("Script source directory {} not found", config.src.display());
        return Ok(0);
    }

    let sources = discover_sources(&config.src);
    let results: Vec<Result<(), usize>> = sources
        .par_iter()
        .map(|path| compile_file(config, path))
        .collect();

    let errors: usize = results.iter().filter_map(|r| r.as_ref().err()).sum();
    if errors > 0 {
        return Err(TaskError::Compile { count: errors });
    }
    Ok(sources.len())
}

/// Compile one file, logging its diagnostics. Returns the number of errors.
fn compile_file(config: &ScriptsConfig, path: &Path) -> Result<(), usize> {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            tracing::error!("{}: {}", path.display(), e);
            return Err(1);
        }
    };

    let code = transpile(path, &source).map_err(|diagnostics| {
        for message in &diagnostics {
            tracing::error!("{}: {}", path.display(), message);
        }
        diagnostics.len()
    })?;

    let relative = path.strip_prefix(&config.src).unwrap_or(path);
    let target = config.out.join(relative).with_extension("js");
    let written = target
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|()| fs::write(&target, code));
    if let Err(e) = written {
        tracing::error!("Failed to write {}: {}", target.display(), e);
        return Err(1);
    }

    tracing::debug!("Compiled {} -> {}", path.display(), target.display());
    Ok(())
}

/// Strip types and transform JSX, returning JavaScript with an inline source map.
///
/// Parse, syntax and transform diagnostics are returned as messages.
pub fn transpile(path: &Path, source: &str) -> Result<String, Vec<String>> {
    let source_type = SourceType::from_path(path)
        .map_err(|_| vec![format!("unsupported file type: {}", path.display())])?;

    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, source_type).parse();
    if !parsed.errors.is_empty() {
        return Err(parsed.errors.iter().map(|e| e.to_string()).collect());
    }
    let mut program = parsed.program;

    let semantic = SemanticBuilder::new()
        .with_check_syntax_error(true)
        .build(&program);
    if !semantic.errors.is_empty() {
        return Err(semantic.errors.iter().map(|e| e.to_string()).collect());
    }
    let scoping = semantic.semantic.into_scoping();

    let options = TransformOptions::default();
    let transformed =
        Transformer::new(&allocator, path, &options).build_with_scoping(scoping, &mut program);
    if !transformed.errors.is_empty() {
        return Err(transformed.errors.iter().map(|e| e.to_string()).collect());
    }

    let generated = Codegen::new()
        .with_options(CodegenOptions {
            source_map_path: Some(path.to_path_buf()),
            ..CodegenOptions::default()
        })
        .build(&program);

    let mut code = generated.code;
    if let Some(map) = generated.map {
        if !code.ends_with('\n') {
            code.push('\n');
        }
        code.push_str("//# sourceMappingURL=");
        code.push_str(&map.to_data_url());
        code.push('\n');
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn strips_type_annotations() {
        let js = transpile(
            Path::new("util.ts"),
            "export function add(a: number, b: number): number { return a + b }\n",
        )
        .unwrap();

        assert!(js.contains("function add(a, b)"));
        assert!(!js.contains(": number"));
        assert!(js.contains("//# sourceMappingURL=data:application/json;"));
    }

    #[test]
    fn reports_syntax_errors() {
        let errors = transpile(Path::new("broken.tsx"), "const = ;\n").unwrap_err();

        assert!(!errors.is_empty());
    }

    #[test]
    fn discovers_sources_without_declarations() {
        let temp = tempdir().unwrap();
        let src = temp.path();
        fs::create_dir_all(src.join("site/pages")).unwrap();
        fs::write(src.join("site/Site.tsx"), "").unwrap();
        fs::write(src.join("site/pages/Game.tsx"), "").unwrap();
        fs::write(src.join("config.ts"), "").unwrap();
        fs::write(src.join("globals.d.ts"), "").unwrap();
        fs::write(src.join("site/gbhwdb.scss"), "").unwrap();

        let sources = discover_sources(src);

        let names: Vec<_> = sources
            .iter()
            .map(|p| p.strip_prefix(src).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["config.ts", "site/Site.tsx", "site/pages/Game.tsx"]);
    }

    #[test]
    fn compiles_tree_into_output_directory() {
        let temp = tempdir().unwrap();
        let config = ScriptsConfig {
            src: temp.path().join("src"),
            out: temp.path().join("build/scripts"),
            check: Vec::new(),
        };
        fs::create_dir_all(config.src.join("builder")).unwrap();
        fs::write(
            config.src.join("builder/builder.ts"),
            "const pages: string[] = [];\nexport default pages;\n",
        )
        .unwrap();

        let compiled = compile_all(&config).unwrap();

        assert_eq!(compiled, 1);
        let js = fs::read_to_string(config.out.join("builder/builder.js")).unwrap();
        assert!(!js.contains("string[]"));
    }

    #[test]
    fn fails_after_attempting_every_file() {
        let temp = tempdir().unwrap();
        let config = ScriptsConfig {
            src: temp.path().join("src"),
            out: temp.path().join("out"),
            check: Vec::new(),
        };
        fs::create_dir_all(&config.src).unwrap();
        fs::write(config.src.join("a.ts"), "let = 1;\n").unwrap();
        fs::write(config.src.join("b.ts"), "export const b = 1;\n").unwrap();

        let result = compile_all(&config);

        assert!(matches!(result, Err(TaskError::Compile { count }) if count >= 1));
        assert!(config.out.join("b.js").exists());
        assert!(!config.out.join("a.js").exists());
    }

    #[test]
    fn missing_source_directory_is_empty() {
        let temp = tempdir().unwrap();
        let config = ScriptsConfig {
            src: temp.path().join("nope"),
            out: temp.path().join("out"),
            check: Vec::new(),
        };

        assert_eq!(compile_all(&config).unwrap(), 0);
    }

    #[cfg(unix)]
    fn checked(temp: &Path, check: &str) -> ScriptsTask {
        let src = temp.join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.ts"), "const x: number = \"not a number\";\n").unwrap();
        ScriptsTask::new(ScriptsConfig {
            src,
            out: temp.join("out"),
            check: vec!["sh".to_string(), "-c".to_string(), check.to_string()],
        })
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn type_errors_fail_the_task() {
        let temp = tempdir().unwrap();
        let task = checked(
            temp.path(),
            "echo \"src/a.ts(1,7): error TS2322: Type 'string' is not assignable to type 'number'.\"; exit 2",
        );

        let result = task.run().await;

        assert!(matches!(result, Err(TaskError::Compile { count: 1 })));
        assert!(temp.path().join("out/a.js").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_checker_without_diagnostics_still_fails() {
        let temp = tempdir().unwrap();

        let result = checked(temp.path(), "exit 1").run().await;

        assert!(matches!(result, Err(TaskError::Compile { count: 1 })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn passing_checker_succeeds() {
        let temp = tempdir().unwrap();

        assert!(checked(temp.path(), "exit 0").run().await.is_ok());
    }

    #[tokio::test]
    async fn missing_checker_is_spawn_error() {
        let temp = tempdir().unwrap();
        let task = ScriptsTask::new(ScriptsConfig {
            src: temp.path().join("src"),
            out: temp.path().join("out"),
            check: vec!["gbhwdb-no-such-checker".to_string()],
        });

        assert!(matches!(task.run().await, Err(TaskError::Spawn { .. })));
    }
}
