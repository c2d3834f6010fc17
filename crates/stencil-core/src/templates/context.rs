//! Per-generation rendering context

use super::casing;
use super::descriptor::TemplateDescriptor;
use super::value::{Value, Variables};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Well-known variable keys mirrored into convenience fields
pub mod keys {
    pub const PROJECT_NAME: &str = "ProjectName";
    pub const PYTHON_VERSION: &str = "PythonVersion";
    pub const INCLUDE_DOCKER: &str = "IncludeDocker";
    pub const DATABASE: &str = "Database";
    pub const INCLUDE_TESTS: &str = "IncludeTests";
    pub const CI_PROVIDER: &str = "CIProvider";
}

/// Descriptive fields of the template being rendered
#[derive(Debug, Clone, Default)]
pub struct TemplateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub language: String,
    pub framework: String,
}

impl From<&TemplateDescriptor> for TemplateInfo {
    fn from(desc: &TemplateDescriptor) -> Self {
        Self {
            name: desc.name.clone(),
            version: desc.version.clone(),
            description: desc.description.clone(),
            language: desc.language.clone(),
            framework: desc.framework.clone(),
        }
    }
}

/// Values visible to templates and conditions during one generation
///
/// Built once per run; casing variants and convenience fields are derived at
/// construction and never change afterwards.
#[derive(Debug, Clone)]
pub struct RenderingContext {
    project_name: String,
    project_name_snake: String,
    project_name_camel: String,
    project_name_pascal: String,
    project_name_kebab: String,
    output_dir: PathBuf,
    variables: Variables,
    template: TemplateInfo,

    python_version: String,
    include_docker: bool,
    database: String,
    include_tests: bool,
    ci_provider: String,
}

impl RenderingContext {
    pub fn new(
        project_name: &str,
        output_dir: impl Into<PathBuf>,
        variables: Variables,
        template: TemplateInfo,
    ) -> Self {
        let string_var = |key: &str| {
            variables
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let bool_var = |key: &str| variables.get(key).and_then(Value::as_bool).unwrap_or(false);

        Self {
            project_name: project_name.to_string(),
            project_name_snake: casing::to_snake(project_name),
            project_name_camel: casing::to_camel(project_name),
            project_name_pascal: casing::to_pascal(project_name),
            project_name_kebab: casing::to_kebab(project_name),
            output_dir: output_dir.into(),
            python_version: string_var(keys::PYTHON_VERSION),
            include_docker: bool_var(keys::INCLUDE_DOCKER),
            database: string_var(keys::DATABASE),
            include_tests: bool_var(keys::INCLUDE_TESTS),
            ci_provider: string_var(keys::CI_PROVIDER),
            variables,
            template,
        }
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn project_name_snake(&self) -> &str {
        &self.project_name_snake
    }

    pub fn project_name_camel(&self) -> &str {
        &self.project_name_camel
    }

    pub fn project_name_pascal(&self) -> &str {
        &self.project_name_pascal
    }

    pub fn project_name_kebab(&self) -> &str {
        &self.project_name_kebab
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn template(&self) -> &TemplateInfo {
        &self.template
    }

    pub fn python_version(&self) -> &str {
        &self.python_version
    }

    pub fn include_docker(&self) -> bool {
        self.include_docker
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn include_tests(&self) -> bool {
        self.include_tests
    }

    pub fn ci_provider(&self) -> &str {
        &self.ci_provider
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }

    /// String variable, empty when absent or not a string
    pub fn get_string(&self, key: &str) -> &str {
        self.get(key).and_then(Value::as_str).unwrap_or_default()
    }

    /// Boolean variable, false when absent or not a boolean
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Integer variable, zero when absent or not an integer
    pub fn get_int(&self, key: &str) -> i64 {
        self.get(key).and_then(Value::as_int).unwrap_or(0)
    }

    /// Template scope: every variable at top level, then the fixed fields
    /// (which win on collision), plus `Variables` and `Template` maps.
    pub(crate) fn to_template_value(&self) -> minijinja::Value {
        use minijinja::Value as J;

        let mut scope: BTreeMap<String, J> = self
            .variables
            .iter()
            .map(|(k, v)| (k.clone(), J::from_serialize(v)))
            .collect();

        let fixed = [
            ("ProjectName", J::from(self.project_name.as_str())),
            ("ProjectNameSnake", J::from(self.project_name_snake.as_str())),
            ("ProjectNameCamel", J::from(self.project_name_camel.as_str())),
            ("ProjectNamePascal", J::from(self.project_name_pascal.as_str())),
            ("ProjectNameKebab", J::from(self.project_name_kebab.as_str())),
            (
                "OutputDir",
                J::from(self.output_dir.to_string_lossy().into_owned()),
            ),
            ("PythonVersion", J::from(self.python_version.as_str())),
            ("IncludeDocker", J::from(self.include_docker)),
            ("Database", J::from(self.database.as_str())),
            ("IncludeTests", J::from(self.include_tests)),
            ("CIProvider", J::from(self.ci_provider.as_str())),
            ("Variables", J::from_serialize(&self.variables)),
        ];
        for (key, value) in fixed {
            scope.insert(key.to_string(), value);
        }

        let template: BTreeMap<&str, &str> = BTreeMap::from([
            ("Name", self.template.name.as_str()),
            ("Version", self.template.version.as_str()),
            ("Description", self.template.description.as_str()),
            ("Language", self.template.language.as_str()),
            ("Framework", self.template.framework.as_str()),
        ]);
        scope.insert("Template".to_string(), J::from_serialize(&template));

        J::from(scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> Variables {
        Variables::from([
            ("IncludeDocker".to_string(), Value::Bool(true)),
            ("IncludeTests".to_string(), Value::from("yes")),
            ("Database".to_string(), Value::from("postgres")),
            ("Workers".to_string(), Value::Int(4)),
        ])
    }

    #[test]
    fn test_casing_variants_computed_once() {
        let ctx = RenderingContext::new("my-api", "/tmp/out", vars(), TemplateInfo::default());
        assert_eq!(ctx.project_name(), "my-api");
        assert_eq!(ctx.project_name_snake(), "my_api");
        assert_eq!(ctx.project_name_camel(), "myApi");
        assert_eq!(ctx.project_name_pascal(), "MyApi");
        assert_eq!(ctx.project_name_kebab(), "my-api");
    }

    #[test]
    fn test_convenience_fields_mirror_variables() {
        let ctx = RenderingContext::new("demo", "demo", vars(), TemplateInfo::default());
        assert!(ctx.include_docker());
        // A non-boolean value never counts as true
        assert!(!ctx.include_tests());
        assert_eq!(ctx.database(), "postgres");
        assert_eq!(ctx.python_version(), "");
        assert_eq!(ctx.ci_provider(), "");
    }

    #[test]
    fn test_typed_accessors() {
        let ctx = RenderingContext::new("demo", "demo", vars(), TemplateInfo::default());
        assert_eq!(ctx.get_int("Workers"), 4);
        assert_eq!(ctx.get_int("Database"), 0);
        assert_eq!(ctx.get_string("Database"), "postgres");
        assert_eq!(ctx.get_string("Missing"), "");
        assert!(ctx.get_bool("IncludeDocker"));
        assert!(!ctx.get_bool("Missing"));
    }
}
