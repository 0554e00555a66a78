// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Module that finds the nondeterministic calls of a benchmark.
//!
//! Witnesses record values at many positions that are not nondeterministic calls (loop
//! conditions, branch decisions, ...). Only the values recorded where the program asks the
//! `Verifier` for a value belong in the replay trace, so we scan the sources for those calls.

use crate::util;
use anyhow::{Context, Result};
use polywit_metadata::{NondetType, Position, SourceLanguage};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;
use walkdir::WalkDir;

/// Maps every position holding a nondeterministic call to the type it requests.
pub type PositionTypeMap = HashMap<Position, NondetType>;

/// Name of the class whose accessors are replayed. Its own source is never scanned.
const VERIFIER_CLASS: &str = "Verifier";

static NONDET_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bVerifier\s*\.\s*(nondet[A-Za-z]+)\s*\(").unwrap());
static RETURN_STATEMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\breturn\b").unwrap());
static JAVA_METHOD_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[\w<>\[\],.?]+\s+)+(\w+)\s*\([^;]*\)\s*(?:throws\s+[\w.,\s]+)?\{?").unwrap()
});
static KOTLIN_FUNCTION_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bfun\s+(?:<[^>]*>\s*)?(\w+)\s*\(").unwrap());
static KOTLIN_EXPRESSION_BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\)\s*(?::\s*[\w<>?,.\s]+)?=\s*").unwrap());

/// A source file of the benchmark.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// The file stem, which is how witnesses refer to the file.
    pub name: String,
    pub lines: Vec<String>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: &str) -> Self {
        SourceFile { name: name.into(), lines: content.lines().map(str::to_string).collect() }
    }

    fn read(path: &Path) -> Result<Option<SourceFile>> {
        let Some(name) = util::file_stem(path) else { return Ok(None) };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read source file `{}`", path.display()))?;
        Ok(Some(SourceFile::new(name, &content)))
    }
}

/// All the files with the language's extension under the benchmark and package directories,
/// in a stable order.
pub fn source_files(
    benchmark: &Path,
    packages: &[PathBuf],
    language: SourceLanguage,
) -> Result<Vec<PathBuf>> {
    let mut files = vec![];
    for root in std::iter::once(benchmark).chain(packages.iter().map(PathBuf::as_path)) {
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to scan `{}`", root.display()))?;
            if entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == language.extension())
            {
                files.push(entry.into_path());
            }
        }
    }
    debug!(n = files.len(), "source_files");
    Ok(files)
}

/// Scan the benchmark sources and build their position type map.
pub fn extract_position_type_map(
    benchmark: &Path,
    packages: &[PathBuf],
    language: SourceLanguage,
) -> Result<PositionTypeMap> {
    let mut sources = vec![];
    for path in source_files(benchmark, packages, language)? {
        if let Some(source) = SourceFile::read(&path)? {
            if source.name != VERIFIER_CLASS {
                sources.push(source);
            }
        }
    }
    Ok(position_type_map(&sources, language))
}

/// Find the nondeterministic calls of `sources`.
///
/// Direct calls such as `Verifier.nondetInt()` are found first. A method whose body starts by
/// returning a direct call is a nondeterministic function, and every call to it is recorded
/// with the type of the call it returns.
pub fn position_type_map(sources: &[SourceFile], language: SourceLanguage) -> PositionTypeMap {
    let mut map = PositionTypeMap::new();
    for source in sources {
        for (idx, line) in source.lines.iter().enumerate() {
            for captures in NONDET_CALL.captures_iter(line) {
                if let Some(ty) = NondetType::from_accessor(&captures[1]) {
                    map.insert(Position::new(&source.name, idx as u64 + 1), ty);
                }
            }
        }
    }

    let mut functions: HashMap<String, NondetType> = HashMap::new();
    let mut declarations: HashSet<Position> = HashSet::new();
    for source in sources {
        for idx in 0..source.lines.len() {
            let Some(ty) = map.get(&Position::new(&source.name, idx as u64 + 1)).copied() else {
                continue;
            };
            if let Some((name, header_idx)) = nondet_function(source, idx, language) {
                debug!(%name, %ty, "nondet_function");
                functions.insert(name, ty);
                declarations.insert(Position::new(&source.name, header_idx as u64 + 1));
            }
        }
    }
    if functions.is_empty() {
        return map;
    }

    // Names are escaped, so the pattern is always valid.
    let calls = Regex::new(&format!(
        r"\b({})\s*\(",
        functions.keys().map(|name| regex::escape(name)).collect::<Vec<_>>().join("|")
    ))
    .unwrap();
    for source in sources {
        for (idx, line) in source.lines.iter().enumerate() {
            let position = Position::new(&source.name, idx as u64 + 1);
            if declarations.contains(&position) || map.contains_key(&position) {
                continue;
            }
            if let Some(captures) = calls.captures(line) {
                map.insert(position, functions[&captures[1]]);
            }
        }
    }
    map
}

/// If the nondeterministic call on line `idx` is the first statement of a function body,
/// return the function name and the line of its header.
fn nondet_function(
    source: &SourceFile,
    idx: usize,
    language: SourceLanguage,
) -> Option<(String, usize)> {
    let line = &source.lines[idx];
    let call_start = NONDET_CALL.find(line)?.start();
    let before_call = &line[..call_start];

    if language == SourceLanguage::Kotlin {
        // `fun f(): Int = Verifier.nondetInt()`
        if let Some(header) = KOTLIN_FUNCTION_HEADER.captures(before_call) {
            if KOTLIN_EXPRESSION_BODY.is_match(before_call) {
                return Some((header[1].to_string(), idx));
            }
        }
    }

    let return_at = RETURN_STATEMENT.find(before_call)?;
    let before_return = before_call[..return_at.start()].trim_end();
    // `int f() { return Verifier.nondetInt(); }`
    if let Some(opening) = before_return.strip_suffix('{') {
        if let Some(name) = function_name(opening, language) {
            return Some((name, idx));
        }
    }
    if !before_return.is_empty() {
        return None;
    }
    // The return starts its line: walk back over blank lines and a lone `{` to the header.
    let mut header_idx = idx;
    let mut saw_brace = false;
    while header_idx > 0 {
        header_idx -= 1;
        let previous = source.lines[header_idx].trim();
        if previous.is_empty() {
            continue;
        }
        if previous == "{" && !saw_brace {
            saw_brace = true;
            continue;
        }
        if !saw_brace && !previous.ends_with('{') {
            return None;
        }
        return function_name(previous.trim_end_matches('{'), language).map(|name| (name, header_idx));
    }
    None
}

fn function_name(header: &str, language: SourceLanguage) -> Option<String> {
    let regex = match language {
        SourceLanguage::Java => &*JAVA_METHOD_HEADER,
        SourceLanguage::Kotlin => &*KOTLIN_FUNCTION_HEADER,
    };
    let name = regex.captures(header)?.get(1)?.as_str();
    // Control flow statements look like headers to the regex above.
    if matches!(name, "if" | "for" | "while" | "switch" | "catch" | "synchronized" | "when") {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAVA_MAIN: &str = r#"import org.sosy_lab.sv_benchmarks.Verifier;

public class Main {
  static int pick() {
    return Verifier.nondetInt();
  }

  static boolean flip() { return Verifier.nondetBoolean(); }

  public static void main(String[] args) {
    int x = Verifier.nondetInt();
    String s = Verifier.nondetString();
    if (x > 0) {
      return;
    }
    int y = pick();
    boolean b = flip();
    assert x != y;
  }
}
"#;

    fn type_at(map: &PositionTypeMap, file: &str, line: u64) -> Option<NondetType> {
        map.get(&Position::new(file, line)).copied()
    }

    #[test]
    fn check_java_calls() {
        let sources = vec![SourceFile::new("Main", JAVA_MAIN)];
        let map = position_type_map(&sources, SourceLanguage::Java);
        assert_eq!(type_at(&map, "Main", 5), Some(NondetType::Int));
        assert_eq!(type_at(&map, "Main", 8), Some(NondetType::Boolean));
        assert_eq!(type_at(&map, "Main", 11), Some(NondetType::Int));
        assert_eq!(type_at(&map, "Main", 12), Some(NondetType::String));
        assert_eq!(type_at(&map, "Main", 16), Some(NondetType::Int));
        assert_eq!(type_at(&map, "Main", 17), Some(NondetType::Boolean));
        // Declarations of nondet functions are not calls.
        assert_eq!(type_at(&map, "Main", 4), None);
        assert_eq!(map.len(), 6);
    }

    #[test]
    fn check_calls_across_files() {
        let helper = "class Helper {\n  static long next()\n  {\n    return Verifier.nondetLong();\n  }\n}\n";
        let main = "class Main {\n  void run() {\n    long l = Helper.next();\n  }\n}\n";
        let sources = vec![SourceFile::new("Helper", helper), SourceFile::new("Main", main)];
        let map = position_type_map(&sources, SourceLanguage::Java);
        assert_eq!(type_at(&map, "Helper", 4), Some(NondetType::Long));
        assert_eq!(type_at(&map, "Main", 3), Some(NondetType::Long));
        assert_eq!(type_at(&map, "Helper", 2), None);
    }

    #[test]
    fn check_returns_that_are_not_first_statement() {
        let source = "class Main {\n  static int f() {\n    int a = 1;\n    return Verifier.nondetInt();\n  }\n  void g() { int z = f(); }\n}\n";
        let map = position_type_map(&[SourceFile::new("Main", source)], SourceLanguage::Java);
        assert_eq!(type_at(&map, "Main", 4), Some(NondetType::Int));
        assert_eq!(type_at(&map, "Main", 6), None);
    }

    #[test]
    fn check_kotlin_calls() {
        let source = "fun pick(): Int = Verifier.nondetInt()\n\nfun main() {\n    val c = Verifier.nondetChar()\n    val x = pick()\n}\n";
        let map = position_type_map(&[SourceFile::new("Main", source)], SourceLanguage::Kotlin);
        assert_eq!(type_at(&map, "Main", 1), Some(NondetType::Int));
        assert_eq!(type_at(&map, "Main", 4), Some(NondetType::Char));
        assert_eq!(type_at(&map, "Main", 5), Some(NondetType::Int));
    }

    #[test]
    fn check_extract_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let package = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("org/sosy_lab/sv_benchmarks")).unwrap();
        std::fs::write(
            dir.path().join("org/sosy_lab/sv_benchmarks/Verifier.java"),
            "class Verifier {\n  static int nondetInt() { return Verifier.nondetInt(); }\n}\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("Main.java"), JAVA_MAIN).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "Verifier.nondetInt()").unwrap();
        std::fs::write(package.path().join("Lib.java"), "class Lib {\n  int v = Verifier.nondetShort();\n}\n")
            .unwrap();

        let packages = vec![package.path().to_path_buf()];
        let files = source_files(dir.path(), &packages, SourceLanguage::Java).unwrap();
        assert_eq!(files.len(), 3);

        let map = extract_position_type_map(dir.path(), &packages, SourceLanguage::Java).unwrap();
        assert_eq!(type_at(&map, "Lib", 2), Some(NondetType::Short));
        assert_eq!(type_at(&map, "Verifier", 2), None);
        assert_eq!(type_at(&map, "Main", 11), Some(NondetType::Int));
    }
}
