//! Template rendering and static file copying

use super::casing;
use super::context::RenderingContext;
use crate::error::{Result, ScaffoldError};
use minijinja::{Environment, Error as RenderError, ErrorKind, UndefinedBehavior, Value as J};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Suffix marking a source file as a template
pub const TEMPLATE_SUFFIX: &str = ".tmpl";

/// Renders template files against a [`RenderingContext`]
///
/// Templates use Jinja syntax. Besides the built-ins, these transforms are
/// available as filters: `lower`, `upper`, `title`, `snake`, `camel`,
/// `pascal`, `kebab`, `replace`, `trim`, `split`, `join`, `contains`; and as
/// functions: `contains(s, sub)`, `eq(a, b)`, `ne(a, b)`.
///
/// Referencing an undefined variable is an error.
pub struct Renderer {
    env: Environment<'static>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);

        env.add_filter("lower", text_filter("lower", str::to_lowercase));
        env.add_filter("upper", text_filter("upper", str::to_uppercase));
        env.add_filter("title", text_filter("title", casing::to_title));
        env.add_filter("snake", text_filter("snake", casing::to_snake));
        env.add_filter("camel", text_filter("camel", casing::to_camel));
        env.add_filter("pascal", text_filter("pascal", casing::to_pascal));
        env.add_filter("kebab", text_filter("kebab", casing::to_kebab));
        env.add_filter("trim", text_filter("trim", |s| s.trim().to_string()));
        env.add_filter("replace", |value: J, from: String, to: String| {
            expect_str("replace", &value).map(|s| s.replace(&from, &to))
        });
        env.add_filter("split", |value: J, sep: String| {
            expect_str("split", &value)
                .map(|s| s.split(sep.as_str()).map(str::to_string).collect::<Vec<_>>())
        });
        env.add_filter("join", join_values);
        env.add_filter("contains", contains);

        env.add_function("contains", contains);
        env.add_function("eq", |a: J, b: J| a == b);
        env.add_function("ne", |a: J, b: J| a != b);

        Self { env }
    }

    /// True if the file name carries the template suffix
    pub fn should_render(filename: &str) -> bool {
        filename.ends_with(TEMPLATE_SUFFIX)
    }

    /// File name with the template suffix removed, if present
    pub fn output_filename(filename: &str) -> &str {
        filename.strip_suffix(TEMPLATE_SUFFIX).unwrap_or(filename)
    }

    /// Render template source text; `name` identifies it in error messages
    pub fn render_str(&self, name: &str, source: &str, ctx: &RenderingContext) -> Result<String> {
        self.env
            .render_named_str(name, source, ctx.to_template_value())
            .map_err(|err| {
                let message = match err.detail() {
                    Some(detail) => format!("{} (line {})", detail, err.line().unwrap_or(0)),
                    None => err.to_string(),
                };
                if err.kind() == ErrorKind::SyntaxError {
                    ScaffoldError::TemplateSyntax {
                        name: name.to_string(),
                        message,
                    }
                } else {
                    ScaffoldError::TemplateExecution {
                        name: name.to_string(),
                        message,
                    }
                }
            })
    }

    /// Read and render a template file
    pub async fn render(&self, source: &Path, ctx: &RenderingContext) -> Result<String> {
        let content = fs::read_to_string(source)
            .await
            .map_err(|e| ScaffoldError::io(source, e))?;
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.display().to_string());
        self.render_str(&name, &content, ctx)
    }

    /// Render a template file and write the result to `dest`
    pub async fn render_to_file(
        &self,
        source: &Path,
        dest: &Path,
        ctx: &RenderingContext,
        mode: u32,
    ) -> Result<()> {
        let content = self.render(source, ctx).await?;
        write_file(dest, content.as_bytes(), mode).await?;
        debug!("Rendered {} -> {}", source.display(), dest.display());
        Ok(())
    }

    /// Copy a static file to `dest` without rendering
    pub async fn copy_file(&self, source: &Path, dest: &Path, mode: u32) -> Result<()> {
        let content = fs::read(source)
            .await
            .map_err(|e| ScaffoldError::io(source, e))?;
        write_file(dest, &content, mode).await?;
        debug!("Copied {} -> {}", source.display(), dest.display());
        Ok(())
    }
}

/// String view of a filter input; other kinds are a render error
fn expect_str<'a>(op: &str, value: &'a J) -> std::result::Result<&'a str, RenderError> {
    value.as_str().ok_or_else(|| {
        RenderError::new(
            ErrorKind::InvalidOperation,
            format!("{} expects a string, got {} '{}'", op, value.kind(), value),
        )
    })
}

/// Wrap a string transform as a filter that rejects non-string input
fn text_filter(
    op: &'static str,
    transform: fn(&str) -> String,
) -> impl Fn(J) -> std::result::Result<String, RenderError> + Send + Sync + 'static {
    move |value| expect_str(op, &value).map(transform)
}

fn contains(value: J, sub: String) -> std::result::Result<bool, RenderError> {
    expect_str("contains", &value).map(|s| s.contains(&sub))
}

fn join_values(items: J, sep: String) -> std::result::Result<String, RenderError> {
    let parts: Vec<String> = items.try_iter()?.map(|v| v.to_string()).collect();
    Ok(parts.join(&sep))
}

/// Create missing parent directories, write the content and apply the mode
async fn write_file(dest: &Path, content: &[u8], mode: u32) -> Result<()> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ScaffoldError::io(parent, e))?;
        }
    }

    fs::write(dest, content)
        .await
        .map_err(|e| ScaffoldError::io(dest, e))?;

    set_mode(dest, mode).await
}

#[cfg(unix)]
async fn set_mode(dest: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(dest, std::fs::Permissions::from_mode(mode))
        .await
        .map_err(|e| ScaffoldError::io(dest, e))
}

#[cfg(not(unix))]
async fn set_mode(_dest: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::context::TemplateInfo;
    use crate::templates::value::{Value, Variables};
    use tempfile::tempdir;

    fn ctx() -> RenderingContext {
        let vars = Variables::from([
            ("Database".to_string(), Value::from("postgres")),
            ("IncludeDocker".to_string(), Value::Bool(true)),
            ("Port".to_string(), Value::Int(8000)),
            ("Tags".to_string(), Value::from(" api, web ")),
        ]);
        let info = TemplateInfo {
            name: "FastAPI".to_string(),
            version: "1.0.0".to_string(),
            ..Default::default()
        };
        RenderingContext::new("my-api-project", "out", vars, info)
    }

    #[test]
    fn test_should_render_and_output_filename() {
        assert!(Renderer::should_render("main.py.tmpl"));
        assert!(!Renderer::should_render("Dockerfile"));
        assert!(!Renderer::should_render("notes.tmpl.bak"));

        assert_eq!(Renderer::output_filename("main.py.tmpl"), "main.py");
        assert_eq!(Renderer::output_filename("main.py"), "main.py");
        // Already stripped names are left alone
        let once = Renderer::output_filename("a.txt.tmpl");
        assert_eq!(Renderer::output_filename(once), once);
        assert_eq!(Renderer::output_filename("a.tmpl.tmpl"), "a.tmpl");
    }

    #[test]
    fn test_render_project_fields_and_filters() {
        let r = Renderer::new();
        let out = r
            .render_str(
                "t",
                "{{ ProjectName }}|{{ ProjectNameSnake }}|{{ ProjectNamePascal }}|{{ ProjectName | camel }}|{{ Database | upper }}",
                &ctx(),
            )
            .unwrap();
        assert_eq!(out, "my-api-project|my_api_project|MyApiProject|myApiProject|POSTGRES");
    }

    #[test]
    fn test_render_variables_and_template_info() {
        let r = Renderer::new();
        let out = r
            .render_str(
                "t",
                "{{ Variables.Port }} {{ Port }} {{ Template.Name }}@{{ Template.Version }}",
                &ctx(),
            )
            .unwrap();
        assert_eq!(out, "8000 8000 FastAPI@1.0.0");
    }

    #[test]
    fn test_render_string_helpers() {
        let r = Renderer::new();
        let out = r
            .render_str(
                "t",
                "{{ Tags | trim }}|{{ Tags | trim | split(', ') | join('+') }}|{{ Database | replace('post', 'my') }}|{{ 'hello world' | title }}",
                &ctx(),
            )
            .unwrap();
        assert_eq!(out, "api, web|api+web|mygres|Hello World");
    }

    #[test]
    fn test_render_conditionals_and_comparisons() {
        let r = Renderer::new();
        let src = "{% if IncludeDocker %}docker{% endif %} \
                   {% if eq(Database, 'postgres') %}pg{% endif %} \
                   {% if ne(Database, 'sqlite') %}not-sqlite{% endif %} \
                   {% if contains(Database, 'gres') %}gres{% endif %}";
        let out = r.render_str("t", src, &ctx()).unwrap();
        assert_eq!(out, "docker pg not-sqlite gres");
    }

    #[test]
    fn test_render_syntax_error() {
        let r = Renderer::new();
        let err = r.render_str("broken", "{% if %}", &ctx()).unwrap_err();
        assert!(matches!(err, ScaffoldError::TemplateSyntax { .. }), "{err:?}");
    }

    #[test]
    fn test_render_missing_variable_is_execution_error() {
        let r = Renderer::new();
        let err = r.render_str("missing", "{{ NoSuchVar }}", &ctx()).unwrap_err();
        assert!(matches!(err, ScaffoldError::TemplateExecution { .. }), "{err:?}");
    }

    #[test]
    fn test_string_filters_reject_other_kinds() {
        let r = Renderer::new();
        for src in [
            "{{ Port | upper }}",
            "{{ IncludeDocker | upper }}",
            "{{ Port | snake }}",
            "{{ Port | replace('8', '9') }}",
            "{{ IncludeDocker | split(',') }}",
            "{{ contains(Port, '8') }}",
            "{{ Port | contains('8') }}",
        ] {
            let err = r.render_str("typed", src, &ctx()).unwrap_err();
            assert!(
                matches!(err, ScaffoldError::TemplateExecution { .. }),
                "{src}: {err:?}"
            );
        }
        // Explicit conversion is still allowed
        assert_eq!(r.render_str("t", "{{ Port | string | upper }}", &ctx()).unwrap(), "8000");
    }

    #[tokio::test]
    async fn test_render_to_file_creates_parents() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("hello.txt.tmpl");
        std::fs::write(&src, "Hello {{ ProjectNamePascal }}\n").unwrap();

        let dest = dir.path().join("out/nested/hello.txt");
        Renderer::new()
            .render_to_file(&src, &dest, &ctx(), 0o644)
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "Hello MyApiProject\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_copy_file_applies_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let src = dir.path().join("run.sh");
        std::fs::write(&src, "#!/bin/sh\necho {{ untouched }}\n").unwrap();

        let dest = dir.path().join("bin/run.sh");
        Renderer::new().copy_file(&src, &dest, 0o755).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&dest).unwrap(),
            "#!/bin/sh\necho {{ untouched }}\n"
        );
        let mode = std::fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[tokio::test]
    async fn test_copy_missing_source_is_io_error() {
        let dir = tempdir().unwrap();
        let err = Renderer::new()
            .copy_file(&dir.path().join("nope"), &dir.path().join("out"), 0o644)
            .await
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::Io { .. }));
    }
}
