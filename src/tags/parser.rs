//! Code parsers producing source elements from a directory of sources

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::errors::{BrewError, Result};
use crate::models::{ElementKind, SourceElement};

/// Extracts source elements from every file under a directory
#[async_trait]
pub trait CodeParser: Send + Sync {
    async fn parse(&self, dir: &Path) -> Result<Vec<SourceElement>>;
}

/// Parser backed by an Exuberant/Universal ctags executable
#[derive(Debug, Clone)]
pub struct CtagsParser {
    program: PathBuf,
}

impl CtagsParser {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl CodeParser for CtagsParser {
    async fn parse(&self, dir: &Path) -> Result<Vec<SourceElement>> {
        log::debug!("Running {} over {}", self.program.display(), dir.display());

        let output = Command::new(&self.program)
            .current_dir(dir)
            .args(["-R", "-f", "-", "--fields=+nKS", "--excmd=pattern", "."])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                BrewError::Parser(format!("Failed to run {}: {}", self.program.display(), e))
            })?;

        if !output.status.success() {
            return Err(BrewError::Parser(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let elements = parse_ctags_output(&String::from_utf8_lossy(&output.stdout));
        log::debug!("Parsed {} element(s)", elements.len());
        Ok(elements)
    }
}

/// Convert ctags output (`name<TAB>file<TAB>excmd;"<TAB>fields...`) into
/// source elements. Pseudo tags and malformed lines are skipped.
pub fn parse_ctags_output(text: &str) -> Vec<SourceElement> {
    text.lines().filter_map(parse_tag_line).collect()
}

fn parse_tag_line(line: &str) -> Option<SourceElement> {
    if line.starts_with("!_TAG_") {
        return None;
    }

    let mut head = line.splitn(3, '\t');
    let name = head.next().filter(|n| !n.is_empty())?;
    let file = head.next()?;
    let rest = head.next()?;

    // The search pattern may itself contain tabs, so locate its terminator
    let (excmd, fields) = match rest.find(";\"\t") {
        Some(pos) => (&rest[..pos], &rest[pos + 3..]),
        None => (rest.strip_suffix(";\"")?, ""),
    };

    let mut kind = ElementKind::Unknown;
    let mut is_local = false;
    for field in fields.split('\t').filter(|f| !f.is_empty()) {
        match field.split_once(':') {
            Some(("kind", value)) => kind = kind_from_ctags(value),
            Some(("file", _)) => is_local = true,
            Some(_) => {}
            None => kind = kind_from_ctags(field),
        }
    }

    Some(SourceElement {
        text: name.to_string(),
        file_name: file.strip_prefix("./").unwrap_or(file).to_string(),
        expression: pattern_text(excmd),
        kind,
        is_local,
    })
}

fn kind_from_ctags(kind: &str) -> ElementKind {
    match kind {
        "d" | "macro" => ElementKind::Define,
        "e" | "enumerator" | "g" | "enum" => ElementKind::Enum,
        "f" | "function" | "p" | "prototype" => ElementKind::Function,
        "v" | "variable" | "x" | "externvar" => ElementKind::Variable,
        "t" | "typedef" => ElementKind::Typedef,
        _ => ElementKind::Unknown,
    }
}

/// Source text of a `/^...$/` search pattern; line-number commands yield ""
fn pattern_text(excmd: &str) -> String {
    let body = excmd
        .strip_prefix('/')
        .and_then(|b| b.strip_suffix('/'))
        .or_else(|| excmd.strip_prefix('?').and_then(|b| b.strip_suffix('?')));
    let Some(body) = body else {
        return String::new();
    };
    let body = body.strip_prefix('^').unwrap_or(body);
    let body = body.strip_suffix('$').unwrap_or(body);
    body.replace("\\/", "/").replace("\\\\", "\\").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "!_TAG_FILE_FORMAT\t2\t/extended format/\n\
LED_PIN\t./board.h\t/^#define LED_PIN 13$/;\"\tmacro\tline:1\n\
setup\t./blink.c\t/^void setup(void)$/;\"\tfunction\tline:3\tsignature:(void)\n\
counter\t./blink.c\t/^static int counter = 0;$/;\"\tvariable\tline:2\tfile:\n\
state_t\t./board.h\t/^typedef enum { ON, OFF } state_t;$/;\"\ttypedef\tline:4\n\
ON\t./board.h\t/^typedef enum { ON, OFF } state_t;$/;\"\tkind:e\tline:4\n\
mystery\t./board.h\t/^struct mystery {$/;\"\tstruct\tline:6\n";

    #[test]
    fn test_parse_sample_output() {
        let elements = parse_ctags_output(SAMPLE);
        assert_eq!(elements.len(), 6);

        let define = &elements[0];
        assert_eq!(define.text, "LED_PIN");
        assert_eq!(define.file_name, "board.h");
        assert_eq!(define.expression, "#define LED_PIN 13");
        assert_eq!(define.kind, ElementKind::Define);
        assert!(!define.is_local);

        assert_eq!(elements[1].kind, ElementKind::Function);
        assert_eq!(elements[1].expression, "void setup(void)");

        assert_eq!(elements[2].kind, ElementKind::Variable);
        assert!(elements[2].is_local);

        assert_eq!(elements[3].kind, ElementKind::Typedef);
        assert_eq!(elements[4].kind, ElementKind::Enum);
        assert_eq!(elements[5].kind, ElementKind::Unknown);
    }

    #[test]
    fn test_pattern_with_tab_and_escapes() {
        let line = "path\tmain.c\t/^const char *path = \"a\\/b\";\t\\/\\/ c$/;\"\tv";
        let element = parse_tag_line(line).unwrap();
        assert_eq!(element.kind, ElementKind::Variable);
        assert_eq!(element.expression, "const char *path = \"a/b\";\t// c");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        assert!(parse_tag_line("just-a-name").is_none());
        assert!(parse_tag_line("name\tfile\tno terminator").is_none());
        assert!(parse_tag_line("\tfile\t/^x$/;\"\tf").is_none());
    }

    #[test]
    fn test_line_number_excmd_has_no_expression() {
        let element = parse_tag_line("main\tmain.c\t12;\"\tf").unwrap();
        assert_eq!(element.expression, "");
        assert_eq!(element.kind, ElementKind::Function);
    }
}
