use filemerge_core::{
    Config, ExclusionMatcher, ExtensionSet, FileSystemEntry, MergeEngine, Selection, Session,
    build_tree, parse_extensions,
};
use rstest::{fixture, rstest};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const BANNER: &str = "// --------------------------------------------------------------------------\n// (c) Sports Interactive Ltd.\n// --------------------------------------------------------------------------\n";

struct Project {
    _tmp: TempDir,
    root: PathBuf,
}

#[fixture]
fn project() -> Project {
    let tmp = TempDir::new().expect("temp dir");
    let root = tmp.path().join("project");
    let files = [
        ("a.cs", format!("{BANNER}int a;\n")),
        ("b.txt", "not source".to_string()),
        ("node_modules/c.cs", "int c;".to_string()),
        ("api/Controllers/Home.cs", format!("{BANNER}class Home {{}}\n")),
        ("api/appsettings.json", "{ \"x\": 1 }".to_string()),
        ("api/obj/Generated.cs", "// generated".to_string()),
        ("web/src/app.tsx", "export {}".to_string()),
        ("web/app.log/trace.ts", "log".to_string()),
        ("web/.env.local/secret.ts", "secret".to_string()),
    ];
    for (rel, body) in files {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }
    Project { _tmp: tmp, root }
}

fn all_paths(entry: &FileSystemEntry, out: &mut Vec<PathBuf>) {
    out.push(entry.path().to_path_buf());
    for child in entry.children() {
        all_paths(child, out);
    }
}

#[rstest]
fn cs_only_tree_keeps_root_and_matching_file(project: Project) {
    let root = project.root.join("..").join("project");
    let root = root.canonicalize().unwrap();
    fs::remove_dir_all(root.join("api")).unwrap();
    fs::remove_dir_all(root.join("web")).unwrap();

    let exclusions = ExclusionMatcher::with_defaults().unwrap();
    let extensions = parse_extensions(".cs").unwrap();
    let tree = build_tree(&root, &exclusions, &extensions).unwrap().unwrap();

    let mut paths = Vec::new();
    all_paths(&tree, &mut paths);
    assert_eq!(paths, vec![root.clone(), root.join("a.cs")]);
}

#[rstest]
fn excluded_and_pattern_folders_never_appear(project: Project) {
    let exclusions = ExclusionMatcher::with_defaults().unwrap();
    let tree = build_tree(&project.root, &exclusions, &ExtensionSet::default())
        .unwrap()
        .unwrap();

    let mut paths = Vec::new();
    all_paths(&tree, &mut paths);
    for hidden in ["node_modules", "api/obj", "web/app.log", "web/.env.local"] {
        let hidden = project.root.join(hidden);
        assert!(
            paths.iter().all(|p| !p.starts_with(&hidden)),
            "{} leaked into the tree",
            hidden.display()
        );
    }
    assert!(paths.contains(&project.root.join("web/src/app.tsx")));
}

#[rstest]
#[case(".cs")]
#[case("json, tsx")]
#[case("cs;json;ts;tsx")]
fn collected_paths_always_pass_the_build_filter(project: Project, #[case] spec: &str) {
    let exclusions = ExclusionMatcher::with_defaults().unwrap();
    let extensions = parse_extensions(spec).unwrap();
    let tree = build_tree(&project.root, &exclusions, &extensions)
        .unwrap()
        .unwrap();

    let mut selection = Selection::new();
    selection.set_checked(&tree, true);
    if let Some(api) = tree.find(&project.root.join("api")) {
        selection.set_checked(api, false);
    }

    let checked = selection.collect_checked(&tree, &extensions);
    assert!(!checked.is_empty());
    for path in &checked {
        assert!(extensions.is_allowed(path), "{}", path.display());
        assert!(!path.starts_with(project.root.join("api")));
    }
}

#[rstest]
fn session_merges_selection_without_banners(project: Project) {
    let mut session = Session::new(&Config::default()).unwrap();
    session.load(&project.root).unwrap();
    session.check(Path::new("a.cs"), true).unwrap();
    session.check(Path::new("api"), true).unwrap();

    let outcome = session.generate().unwrap();
    assert_eq!(
        outcome.files,
        vec![
            project.root.join("api/Controllers/Home.cs"),
            project.root.join("api/appsettings.json"),
            project.root.join("a.cs"),
        ]
    );
    assert!(!outcome.content.contains("Sports Interactive"));
    assert!(outcome.content.contains("class Home {}"));
    assert!(outcome.content.contains("int a;"));
    assert_eq!(outcome.content.matches("// File: ").count(), 3);
    assert_eq!(outcome.content.matches("// ----------------------\n").count(), 3);

    let home = outcome.content.find("Home.cs").unwrap();
    let a = outcome.content.find("a.cs").unwrap();
    assert!(home < a, "files are merged in tree order");
}

#[rstest]
fn merge_of_deleted_file_fails_without_output(project: Project) {
    let engine = MergeEngine::with_defaults().unwrap();
    let a = project.root.join("a.cs");
    let gone = project.root.join("gone.cs");
    let err = engine.merge(&[a, gone.clone()]).unwrap_err();
    assert!(err.to_string().contains("gone.cs"));
}
