use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::tempdir;

use asm_harvester::commands::{
    extract_command, init_corpus_command, runs_command, show_command, ExtractOptions, FunctionSpec,
};
use asm_harvester::sha256_bytes;
use harvest_core::db::{CorpusDb, CorpusLayout, HarvestRunStatus};
use harvest_core::record::FunctionRecord;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("write script");
    let mut perms = fs::metadata(&path).expect("script metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("make script executable");
    path
}

// Each test that stubs a compiler owns a distinct HARVEST_* variable; the
// test threads share the process environment.
#[test]
fn extract_writes_artifacts_and_database_bookkeeping() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().to_string_lossy().to_string();
    init_corpus_command(&root, Some("demo".to_string())).expect("init corpus");

    let gcc = write_script(
        tmp.path(),
        "fake-gcc",
        concat!(
            "#!/bin/sh\n",
            "cat > /dev/null\n",
            "cat <<'EOF'\n",
            "\t.text\n",
            "\t.globl\tscale\n",
            "\t.type\tscale, @function\n",
            "scale:\n",
            "\t.cfi_startproc\n",
            "\tleal\t(%rdi,%rdi), %eax\n",
            "\tret\n",
            "\t.cfi_endproc\n",
            "\t.size\tscale, .-scale\n",
            "EOF\n",
        ),
    );
    std::env::set_var("HARVEST_GCC_X86_64", &gcc);

    let spec_path = tmp.path().join("functions/scale.yaml");
    let spec_yaml = concat!(
        "fname: scale\n",
        "func_def: |\n",
        "  int scale(int x) { return x + x; }\n",
        "path: src/point.c\n",
        "synth_deps: \"\"\n",
    );
    fs::write(&spec_path, spec_yaml).expect("write spec");

    let options = ExtractOptions {
        targets: Some("gcc_x86_O0,gcc_x86_O3".to_string()),
        ..ExtractOptions::default()
    };
    extract_command(&root, &spec_path.to_string_lossy(), &options, false).expect("extract");

    // Record artifacts land under records/<fname>/.
    let layout = CorpusLayout::new(tmp.path());
    let record_json = fs::read_to_string(layout.record_path("scale")).expect("read record.json");
    let record: FunctionRecord = serde_json::from_str(&record_json).expect("parse record.json");
    assert_eq!(record.fname, "scale");
    assert_eq!(record.path, "src/point.c");
    let entry = record
        .synth_asm
        .get("gcc_x86_O0")
        .expect("attempted")
        .as_ref()
        .expect("extracted");
    assert!(entry.body.contains("\tleal\t(%rdi,%rdi), %eax\n"));

    let flat: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(layout.flat_asm_path("scale")).expect("read asm.json"))
            .expect("parse asm.json");
    assert_eq!(flat["target"].as_array().expect("target list").len(), 2);
    assert_eq!(flat["code"].as_array().expect("code list").len(), 2);

    // The corpus database registers the function and the run.
    let db = CorpusDb::open(&layout.db_path).expect("open db");
    let row = db.get_function("scale").expect("get function").expect("registered");
    assert_eq!(row.source_hash, sha256_bytes(spec_yaml.as_bytes()));
    assert_eq!(row.source_path.as_deref(), Some(spec_path.to_string_lossy().as_ref()));

    let runs = db.list_harvest_runs(Some("scale")).expect("list runs");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, HarvestRunStatus::Succeeded);
    assert_eq!(runs[0].n_attempted, 2);
    assert_eq!(runs[0].n_succeeded, 2);
    assert_eq!(runs[0].n_skipped, 0);

    // A second pass skips the completed targets and records another run.
    extract_command(&root, &spec_path.to_string_lossy(), &options, false).expect("re-extract");
    let runs = db.list_harvest_runs(Some("scale")).expect("list runs again");
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[1].n_attempted, 0);
    assert_eq!(runs[1].n_skipped, 2);
    assert_eq!(runs[1].status, HarvestRunStatus::Succeeded);

    // Reporting commands render from the stored state in both modes.
    show_command(&root, "scale", false).expect("show");
    show_command(&root, "scale", true).expect("show --json");
    runs_command(&root, Some("scale"), true).expect("runs --json");

    std::env::remove_var("HARVEST_GCC_X86_64");
}

#[test]
fn extract_accepts_json_specs_without_a_deps_preamble() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().to_string_lossy().to_string();
    init_corpus_command(&root, None).expect("init corpus");

    let clang = write_script(
        tmp.path(),
        "fake-clang",
        concat!(
            "#!/bin/sh\n",
            "cat > /dev/null\n",
            "cat <<'EOF'\n",
            "\t.text\n",
            "\t.globl\ttwice\n",
            "\t.type\ttwice,@function\n",
            "twice:\n",
            "\t.cfi_startproc\n",
            "\taddl\t%edi, %edi\n",
            "\tmovl\t%edi, %eax\n",
            "\tretq\n",
            ".Lfunc_end0:\n",
            "\t.size\ttwice, .Lfunc_end0-twice\n",
            "\t.cfi_endproc\n",
            "EOF\n",
        ),
    );
    std::env::set_var("HARVEST_CLANG", &clang);

    let spec_path = tmp.path().join("functions/twice.json");
    fs::write(
        &spec_path,
        "{\"fname\": \"twice\", \"func_def\": \"int twice(int x) { return 2 * x; }\"}",
    )
    .expect("write spec");

    let options = ExtractOptions {
        targets: Some("clang_x86_O0".to_string()),
        ..ExtractOptions::default()
    };
    extract_command(&root, &spec_path.to_string_lossy(), &options, true).expect("extract");

    let layout = CorpusLayout::new(tmp.path());
    let record: FunctionRecord = serde_json::from_str(
        &fs::read_to_string(layout.record_path("twice")).expect("read record.json"),
    )
    .expect("parse record.json");

    // A spec without synth_deps still harvests the synthetic track.
    assert_eq!(record.synth_deps.as_deref(), Some(""));
    let entry = record
        .synth_asm
        .get("clang_x86_O0")
        .expect("attempted")
        .as_ref()
        .expect("extracted");
    assert!(entry.body.ends_with("\tretq\n\t.cfi_endproc\n"));

    std::env::remove_var("HARVEST_CLANG");
}

#[test]
fn extract_rejects_specs_missing_required_fields() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().to_string_lossy().to_string();
    init_corpus_command(&root, None).expect("init corpus");

    let spec_path = tmp.path().join("functions/broken.yaml");
    fs::write(&spec_path, "fname: \"\"\nfunc_def: \"int f(void) { return 0; }\"\n")
        .expect("write spec");

    let err = extract_command(&root, &spec_path.to_string_lossy(), &ExtractOptions::default(), false)
        .unwrap_err();
    assert!(err.to_string().contains("'fname' is required"), "unexpected error: {err}");
}

#[test]
fn extract_rejects_target_lists_with_no_known_keys() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().to_string_lossy().to_string();
    init_corpus_command(&root, None).expect("init corpus");

    let spec_path = tmp.path().join("functions/scale.yaml");
    fs::write(&spec_path, "fname: scale\nfunc_def: \"int scale(int x) { return x; }\"\n")
        .expect("write spec");

    let options = ExtractOptions {
        targets: Some("no_such_target".to_string()),
        ..ExtractOptions::default()
    };
    let err = extract_command(&root, &spec_path.to_string_lossy(), &options, false).unwrap_err();
    assert!(err.to_string().contains("No known targets"), "unexpected error: {err}");
}

#[test]
fn function_spec_validation_requires_a_definition() {
    let spec = FunctionSpec {
        fname: "scale".to_string(),
        func_def: "  ".to_string(),
        path: None,
        signature: Vec::new(),
        synth_deps: None,
        real_deps: None,
    };
    let err = spec.validate().unwrap_err();
    assert!(err.to_string().contains("'func_def' is required"), "unexpected error: {err}");
}

#[test]
fn show_requires_an_existing_record() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().to_string_lossy().to_string();
    init_corpus_command(&root, None).expect("init corpus");

    let err = show_command(&root, "ghost", false).unwrap_err();
    assert!(err.to_string().contains("No extraction record for 'ghost'"), "unexpected error: {err}");
}
