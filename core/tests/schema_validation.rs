use config_schema_core::*;

config_table! {
    struct Stage {
        name: Atom<String> = Atom::new(Name::new("name")),
        weight: Atom<f64> = Atom::new(Name::new("weight")).with_default(1.0),
    }
}

config_table! {
    struct Pipeline {
        label: Atom<String> = Atom::new(Name::new("label")),
        stages: Sequence<Table<Stage>> = Sequence::unbounded(Name::new("stages")),
        window: Tuple<(u32, u32)> = Tuple::<(u32, u32)>::new(Name::new("window")).with_default((640, 480)),
        seeds: OptionalSequence<i64> = OptionalSequence::unbounded(Name::new("seeds")),
        archive: OptionalTable<Stage> = OptionalTable::new(Name::new("archive")),
    }
}

fn stage(name: &str, weight: Option<f64>) -> ParameterSet {
    let mut pset = ParameterSet::new();
    pset.insert("name", name);
    if let Some(weight) = weight {
        pset.insert("weight", weight);
    }
    pset
}

#[test]
fn test_sequences_of_tables_validate_per_element() {
    let mut input = ParameterSet::new();
    input.insert("label", "run");
    input.insert(
        "stages",
        vec![
            Value::Table(stage("first", Some(2.0))),
            Value::Table(stage("second", None)),
        ],
    );

    let mut schema = Table::<Pipeline>::new(Name::new("pipeline"));
    schema.validate_parameter_set(&input, &[]).unwrap();

    let stages = schema.value().stages.values();
    assert_eq!(stages.len(), 2);
    assert_eq!(stages[0].name.value(), "first");
    assert_eq!(stages[0].weight.value(), &2.0);
    assert_eq!(stages[1].weight.value(), &1.0);
    assert_eq!(schema.value().window.values(), (640, 480));
    assert_eq!(schema.value().seeds.value(), None);
    assert!(schema.value().archive.value().is_none());
}

#[test]
fn test_optional_table_present() {
    let mut input = ParameterSet::new();
    input.insert("label", "run");
    input.insert("stages", Vec::<Value>::new());
    input.insert("archive", stage("keep", None));

    let mut schema = Table::<Pipeline>::new(Name::new("pipeline"));
    schema.validate_parameter_set(&input, &[]).unwrap();

    let archive = schema.value().archive.value().expect("archive was present");
    assert_eq!(archive.name.value(), "keep");
    assert!(schema.value().archive.parameter_set().is_some());
}

#[test]
fn test_every_problem_reported_once_in_input_order() {
    let mut input = ParameterSet::new();
    input.insert("stages", 5i64); // wrong kind
    input.insert("window", vec![640i64]); // wrong arity
    input.insert("seeds", vec!["x"]); // wrong element type
    input.insert("stray", 1i64); // unmatched

    let mut schema = Table::<Pipeline>::new(Name::new("pipeline"));
    let err = schema.validate_parameter_set(&input, &[]).unwrap_err();
    let ValidateError::Invalid(failure) = err else {
        panic!("expected aggregated validation errors, got {err:?}");
    };

    assert_eq!(
        failure.errors(),
        &[
            ValidationError::TypeMismatch {
                key: "stages".into(),
                expected: "a sequence",
                actual: Kind::Int,
            },
            ValidationError::ArityMismatch {
                key: "window".into(),
                expected: 2,
                actual: 1,
            },
            ValidationError::TypeMismatch {
                key: "seeds[0]".into(),
                expected: "an int64",
                actual: Kind::String,
            },
            ValidationError::MissingKey {
                key: "label".into()
            },
            ValidationError::ExtraKeys {
                keys: vec!["stray".into()]
            },
        ]
    );
}

#[test]
fn test_validation_is_deterministic() {
    let mut input = ParameterSet::new();
    input.insert("window", vec![1i64, 2, 3]);
    input.insert("unknown", false);

    let failure = |schema: &mut Table<Pipeline>| -> Vec<ValidationError> {
        match schema.validate_parameter_set(&input, &[]).unwrap_err() {
            ValidateError::Invalid(failure) => failure.errors().to_vec(),
            other => panic!("unexpected error: {other}"),
        }
    };

    let mut schema = Table::<Pipeline>::new(Name::new("pipeline"));
    let first = failure(&mut schema);
    let second = failure(&mut schema);
    assert_eq!(first, second);
}

config_table! {
    struct BadSiblings {
        a: Atom<i32> = Atom::new(Name::new("n")),
        b: Atom<i32> = Atom::new(Name::new("n")),
    }
}

#[test]
fn test_duplicate_sibling_names_are_schema_errors() {
    let mut schema = Table::<BadSiblings>::new(Name::new("bad"));
    let err = schema
        .validate_parameter_set(&ParameterSet::new(), &[])
        .unwrap_err();
    assert!(matches!(
        err,
        ValidateError::Schema(SchemaError::DuplicateName { ref name, .. }) if name == "n"
    ));
}

config_table! {
    struct InnerOptional {
        retries: OptionalAtom<u32> = OptionalAtom::new(Name::new("retries")),
    }
}

config_table! {
    struct OuterOptional {
        extras: OptionalTable<InnerOptional> = OptionalTable::new(Name::new("extras")),
    }
}

#[test]
fn test_nested_optionals_are_schema_errors() {
    let mut schema = Table::<OuterOptional>::new(Name::new("job"));
    let err = schema
        .validate_parameter_set(&ParameterSet::new(), &[])
        .unwrap_err();
    assert!(matches!(
        err,
        ValidateError::Schema(SchemaError::NestedOptional { ref key }) if key == "job.extras.retries"
    ));
}

config_table! {
    struct Flags {
        verbose: Atom<bool> = Atom::new(Name::new("verbose")).with_default(false),
    }
}

config_table! {
    struct WithFragmentInOptional {
        flags: TableFragment<Flags> = TableFragment::new(),
    }
}

config_table! {
    struct FragmentHolder {
        extras: OptionalTable<WithFragmentInOptional> =
            OptionalTable::new(Name::new("extras")),
    }
}

#[test]
fn test_fragment_under_optional_is_a_schema_error() {
    let mut schema = Table::<FragmentHolder>::new(Name::new("job"));
    let err = schema
        .validate_parameter_set(&ParameterSet::new(), &[])
        .unwrap_err();
    assert!(matches!(
        err,
        ValidateError::Schema(SchemaError::MisplacedFragment { .. })
    ));
}

config_table! {
    struct Grid {
        rows: Sequence<Bounded<i32, 2>> = Sequence::unbounded(Name::new("rows")),
    }
}

#[test]
fn test_bounded_inner_sequences() {
    let mut input = ParameterSet::new();
    input.insert(
        "rows",
        vec![
            Value::from(vec![1i64, 2]),
            Value::from(vec![3i64, 4]),
        ],
    );

    let mut schema = Table::<Grid>::new(Name::new("grid"));
    schema.validate_parameter_set(&input, &[]).unwrap();
    assert_eq!(schema.value().rows.values(), vec![vec![1, 2], vec![3, 4]]);

    let mut bad = ParameterSet::new();
    bad.insert("rows", vec![Value::from(vec![1i64, 2, 3])]);
    let err = schema.validate_parameter_set(&bad, &[]).unwrap_err();
    let ValidateError::Invalid(failure) = err else {
        panic!("expected a validation failure");
    };
    assert_eq!(
        failure.errors(),
        &[ValidationError::ArityMismatch {
            key: "rows[0]".into(),
            expected: 2,
            actual: 3,
        }]
    );
}

#[test]
fn test_round_trip_of_defaulted_schema() {
    config_table! {
        struct Defaults {
            threshold: Atom<f64> = Atom::new(Name::new("threshold")).with_default(0.5),
            label: Atom<String> = Atom::new(Name::new("label")).with_default("base".into()),
            composers: Sequence<String> = Sequence::bounded(Name::new("composers"), 2)
                .with_default(vec!["Mahler".into(), "Elgar".into()]),
        }
    }

    let mut schema = Table::<Defaults>::new(Name::new("defaults"));
    schema.validate_parameter_set(&ParameterSet::new(), &[]).unwrap();

    // Materialize the validated values as a document.
    let mut doc = ParameterSet::new();
    doc.insert("threshold", *schema.value().threshold.value());
    doc.insert("label", schema.value().label.value().clone());
    doc.insert("composers", schema.value().composers.values());
    let text = doc.to_indented_string(0, PrintMode::Raw);

    // A fresh schema validated against the printed values agrees.
    let mut reparsed = ParameterSet::new();
    reparsed.insert("threshold", 0.5f64);
    reparsed.insert("label", "base");
    reparsed.insert("composers", vec!["Mahler", "Elgar"]);
    assert_eq!(doc, reparsed);
    assert!(text.contains("threshold: 0.5"));

    let mut again = Table::<Defaults>::new(Name::new("defaults"));
    again.validate_parameter_set(&reparsed, &[]).unwrap();
    assert_eq!(
        again.value().composers.values(),
        schema.value().composers.values()
    );
}
