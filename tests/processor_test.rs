use incubator::answers::Answers;
use incubator::builtin;
use incubator::error::Error;
use incubator::manifest::{FileRule, TemplateManifest};
use incubator::processor::{partition_existing, FileAction, Processor, ProcessorOptions};
use incubator::renderer::MiniJinjaRenderer;
use incubator::source::TemplateTree;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use walkdir::WalkDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn manifest_with_rules(rules: Vec<FileRule>) -> TemplateManifest {
    TemplateManifest { name: "fixture".to_string(), files: rules, ..Default::default() }
}

fn rule(src: &str, when: &str) -> FileRule {
    FileRule { src: src.to_string(), always: false, when: Some(when.to_string()) }
}

fn builtin_answers(enable_preview: bool) -> Answers {
    let mut answers = Answers::new();
    answers.insert("project_name", "demo");
    answers.insert("description", "A demo project");
    answers.insert("visibility", "private");
    answers.insert("license", "MIT");
    answers.insert("create_github_repo", false);
    answers.insert("enable_preview", enable_preview);
    answers
}

#[test]
fn test_builtin_render_without_preview() {
    let out = TempDir::new().unwrap();
    let manifest = builtin::manifest();
    let answers = builtin_answers(false);
    let engine = MiniJinjaRenderer::new();
    let processor = Processor::new(&manifest, &answers, &engine, ProcessorOptions::default());

    processor.render_to(&TemplateTree::Embedded, out.path()).unwrap();

    let readme = fs::read_to_string(out.path().join("README.md")).unwrap();
    assert!(readme.starts_with("# demo\n"));
    assert!(readme.contains("A demo project"));
    assert!(out.path().join(".gitignore").exists());
    assert!(out.path().join("LICENSE").exists());
    assert!(out.path().join(".devcontainer/devcontainer.json").exists());
    assert!(!out.path().join("README.md.tmpl").exists());
    assert!(!out.path().join(".incubator/preview/start.sh").exists());
    assert!(!out.path().join(".incubator/preview/config.yaml").exists());
}

#[test]
fn test_builtin_render_with_preview() {
    let out = TempDir::new().unwrap();
    let manifest = builtin::manifest();
    let answers = builtin_answers(true);
    let engine = MiniJinjaRenderer::new();
    let processor = Processor::new(&manifest, &answers, &engine, ProcessorOptions::default());

    processor.render_to(&TemplateTree::Embedded, out.path()).unwrap();

    assert!(out.path().join(".incubator/preview/start.sh").exists());
    let config = fs::read_to_string(out.path().join(".incubator/preview/config.yaml")).unwrap();
    assert!(config.contains("demo"));
    let devcontainer =
        fs::read_to_string(out.path().join(".devcontainer/devcontainer.json")).unwrap();
    assert!(devcontainer.contains("forwardPorts"));
}

#[test]
fn test_license_none_skips_license_file() {
    let out = TempDir::new().unwrap();
    let manifest = builtin::manifest();
    let mut answers = builtin_answers(false);
    answers.insert("license", "none");
    let engine = MiniJinjaRenderer::new();
    let processor = Processor::new(&manifest, &answers, &engine, ProcessorOptions::default());

    let files = processor.list_files(&TemplateTree::Embedded).unwrap();
    assert!(!files.contains(&"LICENSE".to_string()));
    assert!(files.contains(&"README.md".to_string()));
}

#[test]
fn test_list_files_matches_render() {
    for enable_preview in [false, true] {
        let out = TempDir::new().unwrap();
        let manifest = builtin::manifest();
        let answers = builtin_answers(enable_preview);
        let engine = MiniJinjaRenderer::new();
        let processor = Processor::new(&manifest, &answers, &engine, ProcessorOptions::default());

        let listed = processor.list_files(&TemplateTree::Embedded).unwrap();
        let rendered: Vec<String> = processor
            .render_to(&TemplateTree::Embedded, out.path())
            .unwrap()
            .into_iter()
            .map(|f| f.path)
            .collect();
        assert_eq!(listed, rendered);
    }
}

#[test]
fn test_empty_rules_include_everything() {
    let src = TempDir::new().unwrap();
    write(src.path(), "a.txt", "a");
    write(src.path(), "nested/b.txt", "b");
    write(src.path(), "nested/deeper/c.txt", "c");

    let manifest = manifest_with_rules(Vec::new());
    let answers = Answers::new();
    let engine = MiniJinjaRenderer::new();
    let processor = Processor::new(&manifest, &answers, &engine, ProcessorOptions::default());

    let files = processor.list_files(&TemplateTree::Directory(src.path().to_path_buf())).unwrap();
    assert_eq!(files, vec!["a.txt", "nested/b.txt", "nested/deeper/c.txt"]);
}

#[test]
fn test_double_star_rule_follows_flag() {
    let src = TempDir::new().unwrap();
    write(src.path(), "a/one.txt", "1");
    write(src.path(), "a/two/three.txt", "3");
    write(src.path(), "b.txt", "b");
    let tree = TemplateTree::Directory(src.path().to_path_buf());
    let manifest = manifest_with_rules(vec![rule("a/**", "{% if flag %}true{% endif %}")]);
    let engine = MiniJinjaRenderer::new();

    let mut answers = Answers::new();
    answers.insert("flag", false);
    let processor = Processor::new(&manifest, &answers, &engine, ProcessorOptions::default());
    assert_eq!(processor.list_files(&tree).unwrap(), vec!["b.txt"]);

    answers.insert("flag", true);
    let processor = Processor::new(&manifest, &answers, &engine, ProcessorOptions::default());
    assert_eq!(
        processor.list_files(&tree).unwrap(),
        vec!["a/one.txt", "a/two/three.txt", "b.txt"]
    );
}

#[test]
fn test_excluded_directory_excludes_subtree() {
    let src = TempDir::new().unwrap();
    write(src.path(), "docs/guide.md", "g");
    write(src.path(), "docs/api/index.md", "i");
    write(src.path(), "main.rs", "fn main() {}");
    let tree = TemplateTree::Directory(src.path().to_path_buf());
    let manifest = manifest_with_rules(vec![rule("docs", "{% if docs %}true{% endif %}")]);
    let answers = Answers::new();
    let engine = MiniJinjaRenderer::new();
    let processor = Processor::new(&manifest, &answers, &engine, ProcessorOptions::default());

    assert_eq!(processor.list_files(&tree).unwrap(), vec!["main.rs"]);

    let out = TempDir::new().unwrap();
    processor.render_to(&tree, out.path()).unwrap();
    assert!(!out.path().join("docs").exists());
}

#[test]
fn test_path_placeholders_are_expanded() {
    let src = TempDir::new().unwrap();
    write(src.path(), "src/{{project_name}}/lib.rs.tmpl", "// {{ project_name }} {{ missing }}\n");
    write(src.path(), "{{unknown}}.txt", "kept");
    let tree = TemplateTree::Directory(src.path().to_path_buf());
    let manifest = manifest_with_rules(Vec::new());
    let mut answers = Answers::new();
    answers.insert("project_name", "demo");
    let engine = MiniJinjaRenderer::new();
    let processor = Processor::new(&manifest, &answers, &engine, ProcessorOptions::default());

    let out = TempDir::new().unwrap();
    processor.render_to(&tree, out.path()).unwrap();

    let lib = fs::read_to_string(out.path().join("src/demo/lib.rs")).unwrap();
    assert_eq!(lib, "// demo \n");
    assert!(out.path().join("{{unknown}}.txt").exists());
}

#[test]
fn test_expanded_path_cannot_leave_target() {
    let src = TempDir::new().unwrap();
    write(src.path(), "ok.txt", "fine");
    write(src.path(), "{{description}}.txt", "escaped");
    let tree = TemplateTree::Directory(src.path().to_path_buf());
    let manifest = manifest_with_rules(Vec::new());
    let mut answers = Answers::new();
    answers.insert("description", "../../escaped");
    let engine = MiniJinjaRenderer::new();
    let processor = Processor::new(&manifest, &answers, &engine, ProcessorOptions::default());

    let root = TempDir::new().unwrap();
    let out = root.path().join("a/b/project");
    fs::create_dir_all(&out).unwrap();

    let err = processor.render_to(&tree, &out).unwrap_err();
    assert!(matches!(err, Error::ValidationError(_)));
    assert!(err.to_string().contains("{{description}}.txt"));
    assert!(processor.list_files(&tree).is_err());

    let escaped: Vec<_> = WalkDir::new(root.path())
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .collect();
    assert!(escaped.is_empty(), "files were written: {escaped:?}");
}

#[test]
fn test_absolute_expanded_path_is_rejected() {
    let src = TempDir::new().unwrap();
    write(src.path(), "{{project_name}}/x.txt", "x");
    let tree = TemplateTree::Directory(src.path().to_path_buf());
    let manifest = manifest_with_rules(Vec::new());
    let mut answers = Answers::new();
    answers.insert("project_name", "/tmp");
    let engine = MiniJinjaRenderer::new();
    let processor = Processor::new(&manifest, &answers, &engine, ProcessorOptions::default());

    assert!(matches!(processor.plan(&tree), Err(Error::ValidationError(_))));
}

#[test]
fn test_non_template_files_are_copied_verbatim() {
    let src = TempDir::new().unwrap();
    write(src.path(), "raw.txt", "{{ project_name }}");
    let tree = TemplateTree::Directory(src.path().to_path_buf());
    let manifest = manifest_with_rules(Vec::new());
    let mut answers = Answers::new();
    answers.insert("project_name", "demo");
    let engine = MiniJinjaRenderer::new();
    let processor = Processor::new(&manifest, &answers, &engine, ProcessorOptions::default());

    let out = TempDir::new().unwrap();
    processor.render_to(&tree, out.path()).unwrap();
    assert_eq!(fs::read_to_string(out.path().join("raw.txt")).unwrap(), "{{ project_name }}");
}

#[test]
fn test_skip_existing_keeps_files() {
    let out = TempDir::new().unwrap();
    write(out.path(), "README.md", "my readme");
    let manifest = builtin::manifest();
    let answers = builtin_answers(false);
    let engine = MiniJinjaRenderer::new();
    let processor =
        Processor::new(&manifest, &answers, &engine, ProcessorOptions { skip_existing: true });

    let rendered = processor.render_to(&TemplateTree::Embedded, out.path()).unwrap();

    assert_eq!(fs::read_to_string(out.path().join("README.md")).unwrap(), "my readme");
    let readme = rendered.iter().find(|f| f.path == "README.md").unwrap();
    assert_eq!(readme.action, FileAction::Skipped);
    assert!(out.path().join(".gitignore").exists());
}

#[test]
fn test_template_error_carries_path() {
    let src = TempDir::new().unwrap();
    write(src.path(), "ok.txt", "fine");
    write(src.path(), "broken.txt.tmpl", "{% if %}");
    let tree = TemplateTree::Directory(src.path().to_path_buf());
    let manifest = manifest_with_rules(Vec::new());
    let answers = Answers::new();
    let engine = MiniJinjaRenderer::new();
    let processor = Processor::new(&manifest, &answers, &engine, ProcessorOptions::default());

    let out = TempDir::new().unwrap();
    let err = processor.render_to(&tree, out.path()).unwrap_err();
    assert!(err.to_string().contains("broken.txt.tmpl"));
    assert!(!out.path().join("broken.txt").exists());
}

#[test]
fn test_rendering_is_deterministic() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let manifest = builtin::manifest();
    let answers = builtin_answers(true);
    let engine = MiniJinjaRenderer::new();
    let processor = Processor::new(&manifest, &answers, &engine, ProcessorOptions::default());

    processor.render_to(&TemplateTree::Embedded, first.path()).unwrap();
    processor.render_to(&TemplateTree::Embedded, second.path()).unwrap();
    assert!(!dir_diff::is_different(first.path(), second.path()).unwrap());
}

#[test]
fn test_partition_existing() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "README.md", "x");
    let files = vec!["README.md".to_string(), "LICENSE".to_string()];

    let (new_files, existing) = partition_existing(&files, dir.path());
    assert_eq!(new_files, vec!["LICENSE"]);
    assert_eq!(existing, vec!["README.md"]);
}
