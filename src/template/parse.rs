use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::{info, warn};

use crate::error::{JobError, JobResult};

/// How a placeholder renders its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// `d` (or `i`): a non-negative decimal integer
    Integer,
    /// `s`: the value's text as-is
    Text,
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Conversion::Integer => write!(f, "integer (%d)"),
            Conversion::Text => write!(f, "string (%s)"),
        }
    }
}

/// Widest field a placeholder may ask for
pub const MAX_WIDTH: usize = u16::MAX as usize;

/// printf-style flags and width between `)` and the conversion character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatSpec {
    pub zero_pad: bool,
    pub left_align: bool,
    pub width: usize,
}

impl FormatSpec {
    /// Pad an already formatted value out to the minimum width
    pub fn pad(&self, body: String, conversion: Conversion) -> String {
        let width = self.width;
        if body.chars().count() >= width {
            body
        } else if self.left_align {
            format!("{body:<width$}")
        } else if self.zero_pad && conversion == Conversion::Integer {
            format!("{body:0>width$}")
        } else {
            format!("{body:>width$}")
        }
    }
}

/// A named, typed substitution marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    pub spec: FormatSpec,
    pub conversion: Conversion,
    /// 1-based line the placeholder appears on
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// A parsed job script template
///
/// Templates are line oriented shell text. Anything that isn't a placeholder is kept byte for
/// byte, with one exception: `%%` collapses to a single `%`. A `%` that isn't followed by `(` or
/// `%` is ordinary text, so things like `#SBATCH --output=slurm-%j.out` pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(text: &str) -> JobResult<Template> {
        let mut parser = Parser { segments: Vec::new(), literal: String::new() };
        for (index, line) in text.split_inclusive('\n').enumerate() {
            parser.line(line, index + 1)?;
        }
        parser.flush();
        Ok(Template { segments: parser.segments })
    }

    pub fn from_file(path: &Path) -> JobResult<Template> {
        info!("Reading template {}", path.display());
        let text = fs::read_to_string(path).map_err(|err| {
            warn!("Can't read template at path {}: {}", path.display(), err);
            JobError::Config {
                origin: format!("template {}", path.display()),
                reason: err.to_string(),
            }
        })?;
        Template::parse(&text)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(placeholder) => Some(placeholder),
            Segment::Literal(_) => None,
        })
    }

    /// Distinct parameter names in order of first appearance
    pub fn parameter_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for placeholder in self.placeholders() {
            if !names.contains(&placeholder.name.as_str()) {
                names.push(&placeholder.name);
            }
        }
        names
    }

    pub fn references(&self, name: &str) -> bool {
        self.placeholders().any(|placeholder| placeholder.name == name)
    }
}

impl FromStr for Template {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Template::parse(s)
    }
}

struct Parser {
    segments: Vec<Segment>,
    literal: String,
}

impl Parser {
    fn flush(&mut self) {
        if !self.literal.is_empty() {
            self.segments.push(Segment::Literal(std::mem::take(&mut self.literal)));
        }
    }

    fn line(&mut self, line: &str, line_no: usize) -> JobResult<()> {
        let mut rest = line;
        while let Some(pos) = rest.find('%') {
            let offset = line.len() - rest.len() + pos;
            let column = line[..offset].chars().count() + 1;
            self.literal.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            if let Some(tail) = after.strip_prefix('%') {
                self.literal.push('%');
                rest = tail;
                continue;
            }
            let Some(opened) = after.strip_prefix('(') else {
                self.literal.push('%');
                rest = after;
                continue;
            };

            let error =
                |reason: String| JobError::InvalidTemplate { line: line_no, column, reason };
            let close = opened
                .find(')')
                .ok_or_else(|| error("unclosed placeholder, expected ')'".to_string()))?;
            let name = &opened[..close];
            if name.is_empty() {
                return Err(error("placeholder has an empty name".to_string()));
            }
            if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(error(format!("invalid placeholder name '{name}'")));
            }

            let (spec, conversion, used) = parse_format(&opened[close + 1..]).map_err(error)?;
            self.flush();
            self.segments.push(Segment::Placeholder(Placeholder {
                name: name.to_string(),
                spec,
                conversion,
                line: line_no,
            }));
            rest = &opened[close + 1 + used..];
        }
        self.literal.push_str(rest);
        Ok(())
    }
}

/// Read `[flags][width]conversion`, returning how many bytes were consumed
fn parse_format(text: &str) -> Result<(FormatSpec, Conversion, usize), String> {
    let mut spec = FormatSpec::default();
    let mut chars = text.char_indices().peekable();

    while let Some(&(_, c)) = chars.peek() {
        match c {
            '0' => spec.zero_pad = true,
            '-' => spec.left_align = true,
            _ => break,
        }
        chars.next();
    }

    let mut digits = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    if !digits.is_empty() {
        spec.width = digits
            .parse::<usize>()
            .ok()
            .filter(|width| *width <= MAX_WIDTH)
            .ok_or_else(|| format!("width '{digits}' is too large, at most {MAX_WIDTH}"))?;
    }

    match chars.next() {
        Some((i, 'd')) | Some((i, 'i')) => Ok((spec, Conversion::Integer, i + 1)),
        Some((i, 's')) => Ok((spec, Conversion::Text, i + 1)),
        Some((_, c)) if c == '\n' || c == '\r' => {
            Err("placeholder is missing its conversion".to_string())
        }
        Some((_, c)) => Err(format!("unsupported conversion '{c}', expected d or s")),
        None => Err("placeholder is missing its conversion".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(text: &str) -> Segment {
        Segment::Literal(text.to_string())
    }

    #[test]
    fn test_parse_placeholders() {
        let template =
            Template::parse("#SBATCH --nodes=%(nodes)d\nexport WORKDIR=%(cwd)s\n").unwrap();
        let placeholders: Vec<&Placeholder> = template.placeholders().collect();
        assert_eq!(placeholders.len(), 2);
        assert_eq!(placeholders[0].name, "nodes");
        assert_eq!(placeholders[0].conversion, Conversion::Integer);
        assert_eq!(placeholders[0].line, 1);
        assert_eq!(placeholders[1].name, "cwd");
        assert_eq!(placeholders[1].conversion, Conversion::Text);
        assert_eq!(placeholders[1].line, 2);
        assert_eq!(template.segments()[0], literal("#SBATCH --nodes="));
        assert_eq!(template.segments()[2], literal("\nexport WORKDIR="));
    }

    #[test]
    fn test_parse_flags_and_width() {
        let template = Template::parse("%(a)02d %(b)-8s %(c)5i").unwrap();
        let specs: Vec<FormatSpec> = template.placeholders().map(|p| p.spec).collect();
        assert_eq!(specs[0], FormatSpec { zero_pad: true, left_align: false, width: 2 });
        assert_eq!(specs[1], FormatSpec { zero_pad: false, left_align: true, width: 8 });
        assert_eq!(specs[2], FormatSpec { zero_pad: false, left_align: false, width: 5 });
    }

    #[test]
    fn test_percent_literals() {
        let template = Template::parse("#SBATCH --output=slurm-%j.out\ndate +%%Y 100%%\n").unwrap();
        assert_eq!(template.placeholders().count(), 0);
        assert_eq!(
            template.segments(),
            &[literal("#SBATCH --output=slurm-%j.out\ndate +%Y 100%\n")]
        );
    }

    #[test]
    fn test_parameter_names_deduplicated() {
        let template = Template::parse("%(np)d %(nodes)d %(np)04d").unwrap();
        assert_eq!(template.parameter_names(), vec!["np", "nodes"]);
        assert!(template.references("nodes"));
        assert!(!template.references("cwd"));
    }

    #[test]
    fn test_unclosed_placeholder() {
        let err = Template::parse("#!/bin/bash\nexport X=%(cwd\n").unwrap_err();
        match err {
            JobError::InvalidTemplate { line, column, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, 10);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_column_counts_characters() {
        let err = Template::parse("echo 'héllo wörld' %(np\n").unwrap_err();
        assert!(matches!(err, JobError::InvalidTemplate { line: 1, column: 20, .. }));
    }

    #[test]
    fn test_width_limit() {
        let template = Template::parse("%(np)065535d").unwrap();
        assert_eq!(template.placeholders().next().unwrap().spec.width, MAX_WIDTH);

        let err = Template::parse("#!/bin/bash\n%(np)70000d\n").unwrap_err();
        assert!(matches!(err, JobError::InvalidTemplate { line: 2, column: 1, .. }));
        assert!(err.to_string().contains("too large"));
        assert!(Template::parse("%(np)99999999999999999999999d").is_err());
    }

    #[test]
    fn test_bad_conversion() {
        let err = Template::parse("%(np)x").unwrap_err();
        assert!(matches!(err, JobError::InvalidTemplate { line: 1, column: 1, .. }));
        assert!(err.to_string().contains("unsupported conversion 'x'"));

        let err = Template::parse("%(np)\n").unwrap_err();
        assert!(err.to_string().contains("missing its conversion"));
    }

    #[test]
    fn test_bad_names() {
        assert!(matches!(Template::parse("%()d"), Err(JobError::InvalidTemplate { .. })));
        assert!(matches!(Template::parse("%(wall time)d"), Err(JobError::InvalidTemplate { .. })));
    }

    #[test]
    fn test_template_without_trailing_newline() {
        let template: Template = "mpirun -np %(np)d ./wrf.exe".parse().unwrap();
        assert_eq!(template.segments().len(), 3);
        assert_eq!(template.segments()[2], literal(" ./wrf.exe"));
    }
}
