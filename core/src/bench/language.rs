use std::collections::HashMap;

use super::testcase::{Dimension, TestCase};
use crate::template::{Template, TemplateError};
use crate::toolchain::Toolchain;

/// Variables available to compile and version templates.
pub const COMPILE_VARS: &[&str] = &["program"];

/// Variables available to run templates.
pub const RUN_VARS: &[&str] = &["program", "test", "args", "iterations", "discs", "pegs"];

/// Immutable descriptor of one benchmarked language.
///
/// Templates are checked when set, so a constructed spec always renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSpec {
    name: String,
    order: i64,
    toolchain: Toolchain,
    compile: Option<Template>,
    run: Template,
    version: Option<Template>,
    clean: Vec<String>,
}

impl LanguageSpec {
    pub fn new(name: impl Into<String>, run: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            name: name.into(),
            order: 0,
            toolchain: Toolchain::NotRequired,
            compile: None,
            run: self::checked(run, RUN_VARS)?,
            version: None,
            clean: Vec::new(),
        })
    }

    pub fn compile(mut self, cmd: &str) -> Result<Self, TemplateError> {
        self.compile = Some(self::checked(cmd, COMPILE_VARS)?);
        Ok(self)
    }

    pub fn version(mut self, cmd: &str) -> Result<Self, TemplateError> {
        self.version = Some(self::checked(cmd, COMPILE_VARS)?);
        Ok(self)
    }

    pub fn clean<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.clean = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    pub fn toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = toolchain;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_order(&self) -> i64 {
        self.order
    }

    pub fn get_toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    pub fn get_clean(&self) -> &[String] {
        &self.clean
    }

    pub fn is_available(&self) -> bool {
        self.toolchain.is_available()
    }

    pub fn is_compile_cmd_defined(&self) -> bool {
        self.compile.is_some()
    }

    pub fn compile_command(&self) -> Result<Option<String>, TemplateError> {
        self.compile
            .as_ref()
            .map(|t| t.render(&self.program_vars()))
            .transpose()
    }

    pub fn version_command(&self) -> Result<Option<String>, TemplateError> {
        self.version
            .as_ref()
            .map(|t| t.render(&self.program_vars()))
            .transpose()
    }

    pub fn run_command(&self, case: &TestCase, dim: Dimension) -> Result<String, TemplateError> {
        let mut vars = case.interp_vars(dim);
        vars.insert("program", self.toolchain.program());
        self.run.render(&vars)
    }

    fn program_vars(&self) -> HashMap<&'static str, String> {
        let mut m = HashMap::new();
        m.insert("program", self.toolchain.program());
        m
    }
}

fn checked(fmt: &str, allowed: &[&str]) -> Result<Template, TemplateError> {
    let t = Template::parse(fmt)?;
    t.check_variables(allowed)?;
    Ok(t)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn renders_commands_with_resolved_program() {
        let lang = LanguageSpec::new("C", "./c_test #{test} #{args}")
            .unwrap()
            .compile("#{program} -O2 sources/c_test.c -o c_test")
            .unwrap()
            .version("#{program} --version")
            .unwrap()
            .clean(["c_test"])
            .order(1)
            .toolchain(Toolchain::Found(PathBuf::from("/usr/bin/gcc")));

        let t = TestCase::new(0, 15, 6, 100000);
        assert_eq!(
            lang.compile_command().unwrap().unwrap(),
            "/usr/bin/gcc -O2 sources/c_test.c -o c_test"
        );
        assert_eq!(
            lang.version_command().unwrap().unwrap(),
            "/usr/bin/gcc --version"
        );
        assert_eq!(
            lang.run_command(&t, Dimension::Cycle).unwrap(),
            "./c_test cycle 100000"
        );
        assert_eq!(
            lang.run_command(&t, Dimension::Hanoi).unwrap(),
            "./c_test hanoi 15 6"
        );
        assert_eq!(lang.get_clean(), ["c_test"]);
        assert!(lang.is_available());
    }

    #[test]
    fn interpreted_language_has_no_compile_step() {
        let lang = LanguageSpec::new("Python", "#{program} sources/python_test.py #{test} #{args}")
            .unwrap()
            .toolchain(Toolchain::NotFound("python3".to_owned()));
        assert!(!lang.is_compile_cmd_defined());
        assert_eq!(lang.compile_command().unwrap(), None);
        assert!(!lang.is_available());
    }

    #[test]
    fn rejects_malformed_templates() {
        assert_eq!(
            LanguageSpec::new("X", "run #{nope}").unwrap_err(),
            TemplateError::UndefinedVar("nope".to_owned(), 6)
        );
        assert_eq!(
            LanguageSpec::new("X", "run #{args").unwrap_err(),
            TemplateError::UnclosedBrace(5)
        );
        // run-only variables are not available at compile time
        let err = LanguageSpec::new("X", "./x")
            .unwrap()
            .compile("cc #{args}")
            .unwrap_err();
        assert_eq!(err, TemplateError::UndefinedVar("args".to_owned(), 5));
    }
}
