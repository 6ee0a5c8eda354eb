use grep::regex::RegexMatcher;
use grep::searcher::{Searcher, Sink, SinkMatch};
use std::error::Error;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// Directories that never hold sources of this crate.
const SKIPPED_DIRS: [&str; 3] = ["./target", "./examples", "./.git"];

// Collects every matching line of one file so the build error can list them all.
struct ViolationCollector {
    violations: Vec<String>,
    file_path: PathBuf,
    skip_comments_and_strings: bool,
}

impl ViolationCollector {
    fn new(file_path: &Path, skip_comments_and_strings: bool) -> Self {
        Self {
            violations: Vec::new(),
            file_path: file_path.to_path_buf(),
            skip_comments_and_strings,
        }
    }

    fn check_and_get_error_message(&self, rule: &Rule) -> Option<String> {
        if self.violations.is_empty() {
            return None;
        }

        let file_name = self.file_path.to_str().unwrap_or("?");
        let mut error_msg = format!(
            "\n❌ ERROR: Found {} {} in {}:\n",
            self.violations.len(),
            rule.what,
            file_name
        );
        for violation in &self.violations {
            error_msg.push_str(&format!("   {violation}\n"));
        }
        error_msg.push_str(&format!(
            "\n⚠️ {} are STRICTLY FORBIDDEN in this project.\n",
            rule.what
        ));
        error_msg.push_str(&format!("   {}\n", rule.advice));

        Some(error_msg)
    }
}

impl Sink for ViolationCollector {
    type Error = std::io::Error;

    fn matched(&mut self, _: &Searcher, mat: &SinkMatch) -> Result<bool, Self::Error> {
        let line_number = mat.line_number().unwrap_or(0);
        let line_text = std::str::from_utf8(mat.bytes()).unwrap_or("").trim_end();

        if self.skip_comments_and_strings {
            let is_pure_comment = line_text.trim_start().starts_with("//");
            let is_in_string = line_text
                .split('"')
                .enumerate()
                .any(|(i, part)| i % 2 == 1 && part.contains('_'));
            if is_pure_comment || is_in_string {
                return Ok(true);
            }
        }

        self.violations.push(format!("{line_number}:{line_text}"));
        Ok(true)
    }
}

struct Rule {
    pattern: &'static str,
    what: &'static str,
    advice: &'static str,
    skip_comments_and_strings: bool,
}

const RULES: [Rule; 3] = [
    Rule {
        pattern: r"\b(_[a-zA-Z0-9_]+)\b",
        what: "underscore-prefixed variables",
        advice: "Either use the variable or remove it completely. Underscore prefixes are NOT allowed.",
        skip_comments_and_strings: true,
    },
    Rule {
        pattern: r"#\s*\[\s*allow\s*\(\s*dead_code\s*\)\s*\]",
        what: "#[allow(dead_code)] attributes",
        advice: "Either use the code (removing the attribute) or remove it completely.",
        skip_comments_and_strings: false,
    },
    Rule {
        pattern: r"(//|/\*).*(?:FIXED|CORRECTED|FIX|FIXES|CHANGED|MODIFIED|UPDATED)",
        what: "changelog-style comments",
        advice: "Comments describe the code as it is, not how it got there.",
        skip_comments_and_strings: false,
    },
];

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=pheno");
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-changed=tests");

    for rule in &RULES {
        if let Err(e) = scan(rule) {
            // Printed through stderr so the reason shows up in cargo's output.
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

fn scan(rule: &Rule) -> Result<(), Box<dyn Error>> {
    let matcher = RegexMatcher::new_line_matcher(rule.pattern)?;
    let mut searcher = Searcher::new();

    for entry in WalkDir::new(".")
        .into_iter()
        .filter_entry(|e| !SKIPPED_DIRS.iter().any(|dir| e.path().starts_with(dir)))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name() != "build.rs")
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
    {
        let path = entry.path();
        let mut collector = ViolationCollector::new(path, rule.skip_comments_and_strings);
        searcher.search_path(&matcher, path, &mut collector)?;

        if let Some(error_message) = collector.check_and_get_error_message(rule) {
            return Err(error_message.into());
        }
    }

    Ok(())
}
