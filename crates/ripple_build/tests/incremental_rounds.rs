//! End-to-end incremental builds driven by a scripted compiler.
//!
//! Sources are small line-based scripts:
//!
//! ```text
//! class core.Greeter          starts a class
//! facade core.GreeterKt       starts a file facade
//! fun greet (I)V              adds a function to the current class
//! super core.Base             adds a supertype to the current class
//! use core.Greeter greet      records a lookup from this file
//! body hello                  changes the class bytes only
//! error                       fails the compilation
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use ripple_build::{
    BuildError, BuildModel, BuildOptions, CancellationToken, CompilationEnvironment, Compiler, ExitCode,
    IncrementalBuild, ModuleFile, ModuleTarget, NeverCancelled, OutputItemsCollector,
};
use ripple_cache::{ChangeInfo, ClassArtifact, ClassMetadata, MemberKind, MemberSignature};
use ripple_common::{FqName, TargetId};
use ripple_config::IncrementalMode;

const TOOL_VERSION: &str = "0.1.0";

#[derive(Default)]
struct ScriptedCompiler {
    invocations: Vec<Vec<String>>,
    cancel: Option<CancellationToken>,
    /// File rewritten once the next compilation has read its sources.
    edit_during_compile: Option<(PathBuf, String)>,
}

impl ScriptedCompiler {
    fn compile_source(
        source: &Path,
        output_dir: &Path,
        env: &mut CompilationEnvironment<'_>,
        collector: &mut OutputItemsCollector,
    ) -> bool {
        let text = fs::read_to_string(source).unwrap();
        let mut classes: Vec<(ClassMetadata, String)> = Vec::new();
        for line in text.lines() {
            let words: Vec<&str> = line.split_whitespace().collect();
            match words.as_slice() {
                ["class", name] => classes.push((ClassMetadata::class(*name), String::new())),
                ["facade", name] => classes.push((ClassMetadata::file_facade(*name), String::new())),
                ["fun", name, descriptor] => {
                    let (metadata, _) = classes.last_mut().unwrap();
                    metadata
                        .members
                        .push(MemberSignature::new(*name, MemberKind::Function, *descriptor));
                }
                ["super", name] => classes.last_mut().unwrap().0.supertypes.push(FqName::new(*name)),
                ["use", scope, name] => env.lookup_tracker.record(source, &FqName::new(*scope), name),
                ["body", rest @ ..] => classes.last_mut().unwrap().1.push_str(&rest.join(" ")),
                ["error"] => return false,
                [] => {}
                other => panic!("unknown script line {other:?}"),
            }
        }
        for (metadata, body) in classes {
            let relative = format!("{}.class", metadata.fq_name.as_str().replace('.', "/"));
            let output = output_dir.join(relative);
            ClassArtifact::write(&output, &metadata, body.as_bytes(), TOOL_VERSION).unwrap();
            collector.add([source], output);
        }
        true
    }
}

impl Compiler for ScriptedCompiler {
    fn compile(
        &mut self,
        module_file: &ModuleFile,
        env: &mut CompilationEnvironment<'_>,
        collector: &mut OutputItemsCollector,
    ) -> ExitCode {
        assert!(module_file.path().exists());
        let mut compiled: Vec<String> = module_file
            .descriptors()
            .iter()
            .flat_map(|d| d.sources.iter().map(|s| file_name(s)))
            .collect();
        compiled.sort();
        self.invocations.push(compiled);

        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        if env.cancellation.is_canceled() {
            return ExitCode::Ok;
        }

        for descriptor in module_file.descriptors() {
            for source in &descriptor.sources {
                if !Self::compile_source(source, &descriptor.output_dir, env, collector) {
                    return ExitCode::CompilationError;
                }
            }
            if let Some((path, content)) = self.edit_during_compile.take() {
                fs::write(path, content).unwrap();
            }
            let mapping = descriptor
                .output_dir
                .join("META-INF")
                .join(format!("{}.module_map", descriptor.name));
            fs::create_dir_all(mapping.parent().unwrap()).unwrap();
            fs::write(&mapping, format!("{:?}", descriptor.sources)).unwrap();
            collector.add(descriptor.sources.iter().cloned(), mapping);
        }
        ExitCode::Ok
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    fn new() -> Self {
        let project = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        project.write("core/Greeter.kt", "class core.Greeter\nfun greet (I)V\nbody hello\n");
        project.write("app/Main.kt", "class app.Main\nfun main ()V\nuse core.Greeter greet\n");
        project.write("app/Other.kt", "class app.Other\nfun other ()V\n");
        project
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn src(&self, relative: &str) -> PathBuf {
        self.root().join("src").join(relative)
    }

    fn out(&self, relative: &str) -> PathBuf {
        self.root().join("out").join(relative)
    }

    fn write(&self, relative: &str, content: &str) {
        let path = self.src(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn target(&self, name: &str, sources: &[&str], dependencies: &[&str]) -> ModuleTarget {
        let mut target = ModuleTarget::new(TargetId::production(name), self.out(name));
        for source in sources {
            target = target.with_source(self.src(source));
        }
        for dependency in dependencies {
            target = target.with_dependency(TargetId::production(*dependency));
        }
        target
    }

    fn model_with(&self, core_sources: &[&str]) -> BuildModel {
        BuildModel::new([
            self.target("core", core_sources, &[]),
            self.target("app", &["app/Main.kt", "app/Other.kt"], &["core"]),
        ])
        .unwrap()
    }

    fn model(&self) -> BuildModel {
        self.model_with(&["core/Greeter.kt"])
    }

    fn options(&self, mode: IncrementalMode) -> BuildOptions {
        BuildOptions::new(mode, self.root().join(".ripple-cache"), TOOL_VERSION)
    }

    fn build(&self, mode: IncrementalMode) -> IncrementalBuild<ScriptedCompiler> {
        IncrementalBuild::new(self.model(), ScriptedCompiler::default(), self.options(mode))
    }
}

fn app() -> TargetId {
    TargetId::production("app")
}

fn tool() -> TargetId {
    TargetId::production("tool")
}

/// `core`, plus `app` and `tool` both depending on it.
fn model_with_tool(project: &Project) -> BuildModel {
    project.write("tool/T.kt", "class tool.T\nfun run ()V\nuse core.Greeter greet\n");
    BuildModel::new([
        project.target("core", &["core/Greeter.kt"], &[]),
        project.target("app", &["app/Main.kt", "app/Other.kt"], &["core"]),
        project.target("tool", &["tool/T.kt"], &["core"]),
    ])
    .unwrap()
}

fn run_targets(build: &mut IncrementalBuild<ScriptedCompiler>, targets: &[TargetId]) -> ripple_build::BuildSummary {
    build.compiler_mut().invocations.clear();
    build.run(targets, &NeverCancelled).unwrap()
}

fn run(build: &mut IncrementalBuild<ScriptedCompiler>) -> ripple_build::BuildSummary {
    build.compiler_mut().invocations.clear();
    build.run(&[app()], &NeverCancelled).unwrap()
}

fn invocations(build: &IncrementalBuild<ScriptedCompiler>) -> Vec<Vec<&str>> {
    build
        .compiler()
        .invocations
        .iter()
        .map(|files| files.iter().map(String::as_str).collect())
        .collect()
}

#[test]
fn first_build_compiles_everything_and_rebuild_is_a_no_op() {
    let project = Project::new();
    let mut build = project.build(IncrementalMode::Experimental);

    let first = run(&mut build);
    assert_eq!(first.rounds, 1);
    assert_eq!(invocations(&build), vec![vec!["Greeter.kt", "Main.kt", "Other.kt"]]);
    assert!(!first.compilation_errors);
    assert!(project.out("core/core/Greeter.class").exists());
    assert!(project.out("app/META-INF/app.module_map").exists());

    let second = run(&mut build);
    assert_eq!(second.rounds, 0);
    assert!(second.compiled.is_empty());
    assert!(invocations(&build).is_empty());
}

#[test]
fn signature_change_recompiles_files_that_looked_it_up() {
    let project = Project::new();
    let mut build = project.build(IncrementalMode::Experimental);
    run(&mut build);

    project.write("core/Greeter.kt", "class core.Greeter\nfun greet (J)V\nbody hello\n");
    let summary = run(&mut build);

    assert_eq!(summary.rounds, 2);
    assert_eq!(invocations(&build), vec![vec!["Greeter.kt"], vec!["Main.kt"]]);
    assert_eq!(
        summary.changes.changes().collect::<Vec<_>>(),
        vec![ChangeInfo::members_changed(FqName::new("core.Greeter"), ["greet"])]
    );

    assert_eq!(run(&mut build).rounds, 0);
}

#[test]
fn body_change_stops_after_one_round() {
    let project = Project::new();
    let mut build = project.build(IncrementalMode::Experimental);
    run(&mut build);

    project.write("core/Greeter.kt", "class core.Greeter\nfun greet (I)V\nbody goodbye\n");
    let summary = run(&mut build);

    assert_eq!(summary.rounds, 1);
    assert_eq!(invocations(&build), vec![vec!["Greeter.kt"]]);
    assert!(summary.changes.is_empty());
}

#[test]
fn removed_source_deletes_its_classes_and_dirties_users() {
    let project = Project::new();
    project.write("core/Helper.kt", "class core.Helper\nfun help ()V\n");
    project.write(
        "app/Main.kt",
        "class app.Main\nfun main ()V\nuse core.Greeter greet\nuse core.Helper help\n",
    );
    let mut build = IncrementalBuild::new(
        project.model_with(&["core/Greeter.kt", "core/Helper.kt"]),
        ScriptedCompiler::default(),
        project.options(IncrementalMode::Experimental),
    );
    run(&mut build);
    assert!(project.out("core/core/Helper.class").exists());

    fs::remove_file(project.src("core/Helper.kt")).unwrap();
    build.set_model(project.model());
    let summary = run(&mut build);

    assert_eq!(summary.removed, BTreeSet::from([project.src("core/Helper.kt")]));
    assert_eq!(invocations(&build), vec![vec![], vec!["Main.kt"]]);
    assert!(!project.out("core/core/Helper.class").exists());
    assert!(project.out("core/core/Greeter.class").exists());
    assert!(project.out("core/META-INF/core.module_map").exists());
    assert_eq!(
        summary.changes.changes().collect::<Vec<_>>(),
        vec![
            ChangeInfo::members_changed(FqName::new("core"), ["Helper"]),
            ChangeInfo::members_changed(FqName::new("core.Helper"), ["help"]),
        ]
    );
}

#[test]
fn compile_errors_persist_nothing() {
    let project = Project::new();
    let mut build = project.build(IncrementalMode::Experimental);
    run(&mut build);

    project.write("core/Greeter.kt", "class core.Greeter\nfun greet (J)V\nerror\n");
    let failed = run(&mut build);
    assert!(failed.compilation_errors);
    assert_eq!(failed.rounds, 1);

    project.write("core/Greeter.kt", "class core.Greeter\nfun greet (J)V\nbody hello\n");
    let fixed = run(&mut build);
    assert!(!fixed.compilation_errors);
    assert_eq!(invocations(&build), vec![vec!["Greeter.kt"], vec!["Main.kt"]]);
}

#[test]
fn cancellation_leaves_caches_untouched() {
    let project = Project::new();
    let mut build = project.build(IncrementalMode::Experimental);
    run(&mut build);

    project.write("core/Greeter.kt", "class core.Greeter\nfun greet (J)V\nbody hello\n");
    let token = CancellationToken::new();
    build.compiler_mut().cancel = Some(token.clone());
    let err = build.run(&[app()], &token).unwrap_err();
    assert!(matches!(err, BuildError::Cancelled));

    let summary = run(&mut build);
    assert_eq!(summary.rounds, 2);
    assert_eq!(invocations(&build), vec![vec!["Greeter.kt"], vec!["Main.kt"]]);
}

#[test]
fn enabled_mode_recompiles_whole_dependent_targets() {
    let project = Project::new();
    let mut build = project.build(IncrementalMode::Enabled);
    run(&mut build);
    assert!(!project.root().join(".ripple-cache/lookups").exists());

    project.write("core/Greeter.kt", "class core.Greeter\nfun greet (J)V\nbody hello\n");
    let summary = run(&mut build);

    assert_eq!(summary.rounds, 2);
    assert_eq!(invocations(&build), vec![vec!["Greeter.kt"], vec!["Main.kt", "Other.kt"]]);
}

#[test]
fn header_change_rebuilds_dependent_targets() {
    let project = Project::new();
    let mut build = project.build(IncrementalMode::Experimental);
    run(&mut build);

    project.write(
        "core/Greeter.kt",
        "class core.Greeter\nsuper core.Base\nfun greet (I)V\nbody hello\n",
    );
    let summary = run(&mut build);

    assert!(summary.changes.proto_changed());
    assert_eq!(invocations(&build), vec![vec!["Greeter.kt"], vec!["Main.kt", "Other.kt"]]);
}

#[test]
fn round_limit_falls_back_to_full_target_rebuild() {
    let project = Project::new();
    let mut build = IncrementalBuild::new(
        project.model(),
        ScriptedCompiler::default(),
        project.options(IncrementalMode::Experimental).with_max_rounds(1),
    );
    run(&mut build);

    project.write("core/Greeter.kt", "class core.Greeter\nfun greet (J)V\nbody hello\n");
    let summary = run(&mut build);

    assert!(summary.full_rebuild);
    assert_eq!(summary.rounds, 2);
    assert_eq!(invocations(&build), vec![vec!["Greeter.kt"], vec!["Main.kt", "Other.kt"]]);
}

#[test]
fn facade_members_propagate_through_the_package_scope() {
    let project = Project::new();
    project.write("core/Util.kt", "facade core.UtilKt\nfun shout (I)V\n");
    project.write("app/Other.kt", "class app.Other\nfun other ()V\nuse core shout\n");
    let mut build = IncrementalBuild::new(
        project.model_with(&["core/Greeter.kt", "core/Util.kt"]),
        ScriptedCompiler::default(),
        project.options(IncrementalMode::Experimental),
    );
    run(&mut build);

    project.write("core/Util.kt", "facade core.UtilKt\nfun shout (J)V\n");
    let summary = run(&mut build);

    assert_eq!(invocations(&build), vec![vec!["Util.kt"], vec!["Other.kt"]]);
    assert_eq!(
        summary.changes.changes().collect::<Vec<_>>(),
        vec![ChangeInfo::members_changed(FqName::new("core"), ["shout"])]
    );
}

#[test]
fn tool_upgrade_discards_caches() {
    let project = Project::new();
    let mut build = project.build(IncrementalMode::Experimental);
    run(&mut build);

    let mut upgraded = IncrementalBuild::new(
        project.model(),
        ScriptedCompiler::default(),
        BuildOptions::new(IncrementalMode::Experimental, project.root().join(".ripple-cache"), "0.2.0"),
    );
    let summary = run(&mut upgraded);
    assert_eq!(summary.rounds, 1);
    assert_eq!(invocations(&upgraded), vec![vec!["Greeter.kt", "Main.kt", "Other.kt"]]);
}

#[test]
fn disabled_mode_always_compiles_everything() {
    let project = Project::new();
    let mut build = project.build(IncrementalMode::Disabled);

    for _ in 0..2 {
        let summary = run(&mut build);
        assert!(summary.full_rebuild);
        assert_eq!(invocations(&build), vec![vec!["Greeter.kt", "Main.kt", "Other.kt"]]);
    }
    assert!(!project.root().join(".ripple-cache/targets").exists());
}

#[test]
fn users_outside_the_build_are_compiled_by_their_next_build() {
    let project = Project::new();
    let mut build = IncrementalBuild::new(
        model_with_tool(&project),
        ScriptedCompiler::default(),
        project.options(IncrementalMode::Experimental),
    );
    run_targets(&mut build, &[app(), tool()]);

    project.write("core/Greeter.kt", "class core.Greeter\nfun greet (J)V\nbody hello\n");
    run_targets(&mut build, &[app()]);
    assert_eq!(invocations(&build), vec![vec!["Greeter.kt"], vec!["Main.kt"]]);

    let summary = run_targets(&mut build, &[tool()]);
    assert_eq!(summary.rounds, 1);
    assert_eq!(invocations(&build), vec![vec!["T.kt"]]);

    assert_eq!(run_targets(&mut build, &[app(), tool()]).rounds, 0);
}

#[test]
fn enabled_mode_dirties_dependent_targets_outside_the_build() {
    let project = Project::new();
    let mut build = IncrementalBuild::new(
        model_with_tool(&project),
        ScriptedCompiler::default(),
        project.options(IncrementalMode::Enabled),
    );
    run_targets(&mut build, &[app(), tool()]);

    project.write("core/Greeter.kt", "class core.Greeter\nfun greet (J)V\nbody hello\n");
    run_targets(&mut build, &[app()]);
    assert_eq!(invocations(&build), vec![vec!["Greeter.kt"], vec!["Main.kt", "Other.kt"]]);

    run_targets(&mut build, &[tool()]);
    assert_eq!(invocations(&build), vec![vec!["T.kt"]]);
}

#[test]
fn header_change_reaches_dependent_targets_outside_the_build() {
    let project = Project::new();
    let mut build = IncrementalBuild::new(
        model_with_tool(&project),
        ScriptedCompiler::default(),
        project.options(IncrementalMode::Experimental),
    );
    run_targets(&mut build, &[app(), tool()]);

    project.write(
        "core/Greeter.kt",
        "class core.Greeter\nsuper core.Base\nfun greet (I)V\nbody hello\n",
    );
    run_targets(&mut build, &[app()]);
    assert_eq!(invocations(&build), vec![vec!["Greeter.kt"], vec!["Main.kt", "Other.kt"]]);

    run_targets(&mut build, &[tool()]);
    assert_eq!(invocations(&build), vec![vec!["T.kt"]]);
}

#[test]
fn edit_during_compilation_is_seen_by_the_next_build() {
    let project = Project::new();
    let mut build = project.build(IncrementalMode::Experimental);
    run(&mut build);

    project.write("core/Greeter.kt", "class core.Greeter\nfun greet (I)V\nbody goodbye\n");
    build.compiler_mut().edit_during_compile = Some((
        project.src("core/Greeter.kt"),
        "class core.Greeter\nfun greet (J)V\nbody goodbye\n".to_string(),
    ));
    let summary = run(&mut build);
    assert_eq!(summary.rounds, 1);
    assert_eq!(invocations(&build), vec![vec!["Greeter.kt"]]);

    let summary = run(&mut build);
    assert_eq!(invocations(&build), vec![vec!["Greeter.kt"], vec!["Main.kt"]]);
    assert_eq!(
        summary.changes.changes().collect::<Vec<_>>(),
        vec![ChangeInfo::members_changed(FqName::new("core.Greeter"), ["greet"])]
    );
}

#[test]
fn new_class_recompiles_files_that_looked_up_its_name() {
    let project = Project::new();
    project.write("app/Other.kt", "class app.Other\nfun other ()V\nuse core Helper\n");
    let mut build = project.build(IncrementalMode::Experimental);
    run(&mut build);

    project.write("core/Helper.kt", "class core.Helper\n");
    build.set_model(project.model_with(&["core/Greeter.kt", "core/Helper.kt"]));
    let summary = run(&mut build);

    assert_eq!(invocations(&build), vec![vec!["Helper.kt"], vec!["Other.kt"]]);
    assert_eq!(
        summary.changes.changes().collect::<Vec<_>>(),
        vec![ChangeInfo::members_changed(FqName::new("core"), ["Helper"])]
    );
}

#[test]
fn removing_a_memberless_class_recompiles_its_users() {
    let project = Project::new();
    project.write("core/Helper.kt", "class core.Helper\n");
    project.write("app/Other.kt", "class app.Other\nfun other ()V\nuse core Helper\n");
    let mut build = IncrementalBuild::new(
        project.model_with(&["core/Greeter.kt", "core/Helper.kt"]),
        ScriptedCompiler::default(),
        project.options(IncrementalMode::Experimental),
    );
    run(&mut build);

    fs::remove_file(project.src("core/Helper.kt")).unwrap();
    build.set_model(project.model());
    run(&mut build);

    assert_eq!(invocations(&build), vec![vec![], vec!["Other.kt"]]);
    assert!(!project.out("core/core/Helper.class").exists());
}

#[test]
fn lock_left_by_a_dead_build_does_not_block() {
    let project = Project::new();
    let mut build = project.build(IncrementalMode::Experimental);
    run(&mut build);

    let stale = project.root().join(".ripple-cache/targets/core/.lock");
    assert!(stale.exists());
    fs::write(&stale, "4194304\n").unwrap();

    project.write("core/Greeter.kt", "class core.Greeter\nfun greet (J)V\nbody hello\n");
    assert_eq!(run(&mut build).rounds, 2);
    assert_eq!(ripple_build::clean(&project.root().join(".ripple-cache")).unwrap(), 2);
}
