//! Document-language features: prolog, references, includes, erasure,
//! overrides, and printing round-trips.

use std::path::PathBuf;

use config_schema_core::{Kind, LookupError, ParameterSet, PrintMode, Value};
use config_schema_parser::{parse_document, parse_document_file, ParseError, PathPolicy};

/// Self-cleaning scratch directory for include tests.
struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(name: &str) -> Self {
        let path =
            std::env::temp_dir().join(format!("cs_doc_test_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&path);
        std::fs::create_dir_all(&path).expect("failed to create temp dir");
        Self { path }
    }

    fn write(&self, name: &str, text: &str) -> PathBuf {
        let path = self.path.join(name);
        std::fs::write(&path, text).expect("failed to write fixture");
        path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

#[test]
fn test_prolog_bindings_resolve_but_stay_hidden() {
    let pset = parse_document(
        "
        BEGIN_PROLOG
        standard_threshold: 0.75
        standard_sink: { path: \"out.dat\" level: 2 }
        END_PROLOG
        threshold: @local::standard_threshold
        sink: @local::standard_sink
        ",
    )
    .unwrap();

    assert_eq!(pset.get::<f64>("threshold").unwrap(), 0.75);
    assert_eq!(pset.get::<i32>("sink.level").unwrap(), 2);
    // Unreferenced prolog names never reach the output.
    assert!(!pset.has("standard_threshold"));
    assert!(!pset.has("standard_sink"));
    assert_eq!(pset.len(), 2);
}

#[test]
fn test_local_references_see_earlier_document_bindings() {
    let pset = parse_document("a: 5 b: @local::a").unwrap();
    assert_eq!(pset.get::<i32>("b").unwrap(), 5);

    let err = parse_document("b: @local::missing").unwrap_err();
    assert!(matches!(
        err,
        ParseError::UndefinedReference { kind: "local", ref name, .. } if name == "missing"
    ));
}

#[test]
fn test_table_splice_merges_bindings() {
    let pset = parse_document(
        "
        BEGIN_PROLOG
        defaults: { retries: 3 verbose: false }
        END_PROLOG
        job: {
            @table::defaults
            verbose: true
        }
        ",
    )
    .unwrap();

    assert_eq!(pset.get::<u32>("job.retries").unwrap(), 3);
    // A later binding overrides the spliced one.
    assert!(pset.get::<bool>("job.verbose").unwrap());
}

#[test]
fn test_sequence_splice_extends_elements() {
    let pset = parse_document(
        "
        BEGIN_PROLOG
        base: [ 1, 2 ]
        END_PROLOG
        all: [ 0, @sequence::base, 3 ]
        ",
    )
    .unwrap();
    assert_eq!(pset.get_sequence::<i32>("all").unwrap(), vec![0, 1, 2, 3]);
}

#[test]
fn test_rebinding_overrides_and_erase_removes() {
    let pset = parse_document(
        "
        n: 1
        m: 2
        n: 10
        m: @erase
        table: { a: 1 b: 2 }
        table.a: @erase
        ",
    )
    .unwrap();

    assert_eq!(pset.get::<i32>("n").unwrap(), 10);
    assert!(!pset.has("m"));
    assert!(!pset.has("table.a"));
    assert_eq!(pset.get::<i32>("table.b").unwrap(), 2);
}

#[test]
fn test_dotted_keys_build_nested_tables() {
    let pset = parse_document("a.b.c: 1 a.d: 2").unwrap();
    assert_eq!(pset.get::<i32>("a.b.c").unwrap(), 1);
    assert_eq!(pset.get::<i32>("a.d").unwrap(), 2);
    assert_eq!(pset.len(), 1);
}

#[test]
fn test_nil_parses_and_typed_reads_reject_it() {
    let pset = parse_document("n: @nil").unwrap();
    assert_eq!(pset.get_value("n"), Some(&Value::Nil));
    assert_eq!(
        pset.get::<i32>("n"),
        Err(LookupError::WrongKind {
            key: "n".into(),
            expected: "an int32",
            actual: Kind::Nil,
        })
    );
}

#[test]
fn test_annotations_carry_file_and_line() {
    let dir = TempDir::new("annotations");
    let path = dir.write("job.cfg", "# header\nlabel: nightly\nlevel: 3\n");

    let pset = parse_document_file(&path, &PathPolicy::None).unwrap();
    let annotation = pset.annotation("label").expect("label is annotated");
    assert_eq!(annotation.line, 2);
    assert!(annotation.file.as_deref().unwrap().ends_with("job.cfg"));

    let printed = pset.to_indented_string(0, PrintMode::Annotated);
    assert!(printed.contains("label: nightly  # "));
    assert!(printed.contains("job.cfg:2"));
}

#[test]
fn test_includes_splice_through_the_search_path() {
    let dir = TempDir::new("includes");
    dir.write("common.cfg", "retries: 3\n");
    let top = dir.write(
        "top.cfg",
        "#include \"common.cfg\"\nlabel: nightly\nretries: 5\n",
    );

    // Policy 3: the top document as given, includes through the path.
    let policy = PathPolicy::from_code(3, &dir.path.display().to_string()).unwrap();
    let pset = parse_document_file(&top, &policy).unwrap();
    assert_eq!(pset.get::<String>("label").unwrap(), "nightly");
    // The later binding wins over the included one.
    assert_eq!(pset.get::<i32>("retries").unwrap(), 5);
}

#[test]
fn test_missing_include_reports_the_search_path() {
    let dir = TempDir::new("missing_include");
    let top = dir.write("top.cfg", "#include \"nowhere.cfg\"\n");

    let policy = PathPolicy::from_code(3, &dir.path.display().to_string()).unwrap();
    let err = parse_document_file(&top, &policy).unwrap_err();
    assert!(matches!(err, ParseError::PathLookup { ref path, .. } if path == "nowhere.cfg"));
}

#[test]
fn test_include_cycles_are_rejected() {
    let dir = TempDir::new("cycle");
    dir.write("a.cfg", "#include \"b.cfg\"\n");
    dir.write("b.cfg", "#include \"a.cfg\"\n");
    let top = dir.path.join("a.cfg");

    let policy = PathPolicy::from_code(3, &dir.path.display().to_string()).unwrap();
    let err = parse_document_file(&top, &policy).unwrap_err();
    assert!(matches!(err, ParseError::IncludeCycle { .. }));
}

#[test]
fn test_printed_documents_reparse_to_the_same_set() {
    let pset = parse_document(
        "
        enabled: true
        scale: 2.5
        tags: [ alpha, \"two words\" ]
        output: { path: \"out.dat\" nested: { level: 3 } }
        big: 18446744073709551615
        negative: -42
        ",
    )
    .unwrap();

    let printed = pset.to_indented_string(0, PrintMode::Raw);
    let reparsed = parse_document(&printed).unwrap();
    assert_eq!(pset, reparsed);
}

#[test]
fn test_parse_errors_carry_locations() {
    let err = parse_document("n: [1, 2\nm: 3").unwrap_err();
    let ParseError::Syntax { location, message } = err else {
        panic!("expected a syntax error");
    };
    assert_eq!(location.line, 2);
    assert!(message.contains("expected ',' or ']'"));

    let err = parse_document("n 5").unwrap_err();
    assert!(err.to_string().contains("expected ':'"));

    let err = parse_document("n: 9999999999999999999999").unwrap_err();
    assert!(err.to_string().contains("out of range"));
}

#[test]
fn test_prolog_must_precede_the_body() {
    let err = parse_document("n: 1 BEGIN_PROLOG a: 2 END_PROLOG").unwrap_err();
    assert!(err
        .to_string()
        .contains("prolog blocks must precede the document body"));
}
