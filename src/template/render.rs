use std::fmt;

use log::info;

use crate::directives::Directives;
use crate::error::{JobError, JobResult};
use crate::params::set::{ParamValue, ParameterSet};
use crate::template::parse::{Conversion, Placeholder, Segment, Template};

/// A template with every placeholder substituted, ready to hand to the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedScript {
    text: String,
}

impl RenderedScript {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Scheduler directive lines of the rendered script
    pub fn directives(&self) -> Directives {
        Directives::parse(&self.text)
    }
}

impl fmt::Display for RenderedScript {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Template {
    pub fn render(&self, params: &ParameterSet) -> JobResult<RenderedScript> {
        render(self, params)
    }
}

/// Substitute `params` into `template`
///
/// Every placeholder is checked for a matching key before anything is formatted, so a missing
/// parameter is always reported as [`JobError::MissingParameter`] even when another value would
/// also fail to format. Pure: no I/O happens here.
pub fn render(template: &Template, params: &ParameterSet) -> JobResult<RenderedScript> {
    if let Some(missing) = template.placeholders().find(|p| !params.contains(&p.name)) {
        return Err(JobError::MissingParameter { name: missing.name.clone() });
    }

    let mut text = String::new();
    for segment in template.segments() {
        match segment {
            Segment::Literal(literal) => text.push_str(literal),
            Segment::Placeholder(placeholder) => {
                let value = params
                    .get(&placeholder.name)
                    .ok_or_else(|| JobError::MissingParameter { name: placeholder.name.clone() })?;
                text.push_str(&format_value(placeholder, value)?);
            }
        }
    }

    let count = template.placeholders().count();
    info!("Rendered job script ({} placeholders, {} bytes)", count, text.len());
    Ok(RenderedScript { text })
}

fn format_value(placeholder: &Placeholder, value: &ParamValue) -> JobResult<String> {
    let body = match placeholder.conversion {
        Conversion::Integer => value
            .as_count()
            .ok_or_else(|| JobError::TypeMismatch {
                name: placeholder.name.clone(),
                expected: Conversion::Integer,
                value: value.to_string(),
            })?
            .to_string(),
        Conversion::Text => value.to_string(),
    };
    Ok(placeholder.spec.pad(body, placeholder.conversion))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::bundled_template;

    fn scenario() -> ParameterSet {
        let mut params = ParameterSet::new();
        params.insert("wall_time_hrs", 4);
        params.insert("nodes", 2);
        params.insert("np", 32);
        params.insert("cwd", "/scratch/job1");
        params
    }

    #[test]
    fn test_render_bundled_scenario() {
        let script = render(&bundled_template().unwrap(), &scenario()).unwrap();
        let text = script.as_str();
        assert!(text.contains("--time=04:00:00"));
        assert!(text.contains("--nodes=2"));
        assert!(text.contains("--ntasks=32"));
        assert!(text.contains("export WORKDIR=/scratch/job1"));
        assert!(text.contains("mpirun -np 32 ./wrf.exe"));
        assert!(!text.contains("%("));
        assert!(text.starts_with("#!/bin/bash\n"));
        assert!(text.contains("# environment modules for the parallel executable\n"));
        assert!(text.contains("--output=slurm-%j.out"));
    }

    #[test]
    fn test_literal_text_preserved() {
        let source =
            "#!/bin/bash\n# comment: ${HOME} {braces} \\{\nexport N=%(nodes)d\necho \"$N\"\n";
        let mut params = ParameterSet::new();
        params.insert("nodes", 7);
        let script = render(&source.parse().unwrap(), &params).unwrap();
        assert_eq!(script.as_str(), source.replace("%(nodes)d", "7"));
    }

    #[test]
    fn test_render_is_idempotent() {
        let template = bundled_template().unwrap();
        let params = scenario();
        assert_eq!(render(&template, &params).unwrap(), render(&template, &params).unwrap());
    }

    #[test]
    fn test_missing_parameter() {
        let mut params = scenario();
        params.remove("np");
        let err = render(&bundled_template().unwrap(), &params).unwrap_err();
        match err {
            JobError::MissingParameter { name } => assert_eq!(name, "np"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_missing_reported_before_mismatch() {
        let mut params = ParameterSet::new();
        params.insert("nodes", "two");
        let template: Template = "%(nodes)d %(np)d".parse().unwrap();
        let result = render(&template, &params);
        assert!(matches!(result, Err(JobError::MissingParameter { name }) if name == "np"));
    }

    #[test]
    fn test_type_mismatch() {
        let template = bundled_template().unwrap();
        let bad_values =
            [ParamValue::Text("two".to_string()), ParamValue::Float(2.5), ParamValue::Int(-1)];
        for bad in bad_values {
            let mut params = scenario();
            params.insert("nodes", bad);
            let err = render(&template, &params).unwrap_err();
            assert!(
                matches!(
                    &err,
                    JobError::TypeMismatch { name, expected: Conversion::Integer, .. }
                        if name == "nodes"
                ),
                "unexpected error {err:?}"
            );
        }
    }

    #[test]
    fn test_integer_strings_accepted() {
        let mut params = ParameterSet::new();
        params.insert("np", "32");
        let script = render(&"-np %(np)d".parse().unwrap(), &params).unwrap();
        assert_eq!(script.as_str(), "-np 32");
    }

    #[test]
    fn test_text_conversion_of_numbers() {
        let mut params = ParameterSet::new();
        params.insert("n", 12);
        params.insert("x", 0.5);
        let script = render(&"%(n)s %(x)s".parse().unwrap(), &params).unwrap();
        assert_eq!(script.as_str(), "12 0.5");
    }

    #[test]
    fn test_width_and_alignment() {
        let mut params = ParameterSet::new();
        params.insert("h", 4);
        params.insert("big", 123);
        params.insert("name", "wrf");
        let source = "[%(h)02d][%(big)02d][%(h)3d][%(h)-3d][%(name)5s][%(name)-5s][%(name)05s]";
        let template: Template = source.parse().unwrap();
        let script = render(&template, &params).unwrap();
        assert_eq!(script.as_str(), "[04][123][  4][4  ][  wrf][wrf  ][  wrf]");
    }

    #[test]
    fn test_empty_template_renders_empty_script() {
        let script = render(&"".parse().unwrap(), &ParameterSet::new()).unwrap();
        assert!(script.is_empty());
    }
}
