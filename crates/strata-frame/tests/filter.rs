use pretty_assertions::assert_eq;
use strata_frame::{Column, ColumnType, Comparator, Error, Filter, Frame};

fn int_frame(values: Vec<i64>) -> Frame {
    Frame::new(vec![("COL1", Column::from(values))])
}

#[test]
fn greater_than_constant() {
    let out = int_frame(vec![1, 2, 3, 4, 5]).filter(&[Filter::new("COL1", ">", 3)]);
    assert_eq!(out, int_frame(vec![4, 5]));
}

#[test]
fn in_with_ints() {
    let out = int_frame(vec![1, 2, 3, 4, 5]).filter(&[Filter::is_in("COL1", [3i64, 5])]);
    assert_eq!(out, int_frame(vec![3, 5]));
}

#[test]
fn in_with_floats_truncates_for_int_columns() {
    let out = int_frame(vec![1, 2, 3, 4, 5]).filter(&[Filter::is_in("COL1", [3.4, 5.1])]);
    assert_eq!(out, int_frame(vec![3, 5]));
}

#[test]
fn multiple_clauses_combine_with_or() {
    let out = int_frame(vec![1, 2, 3, 4, 5]).filter(&[
        Filter::new("COL1", ">", 4),
        Filter::new("COL1", "<", 2),
    ]);
    assert_eq!(out, int_frame(vec![1, 5]));
}

#[test]
fn chained_filter_calls_are_a_conjunction() {
    let out = int_frame(vec![1, 2, 3, 4, 5])
        .filter(&[Filter::new("COL1", ">", 2)])
        .filter(&[Filter::new("COL1", "<", 5)]);
    assert_eq!(out, int_frame(vec![3, 4]));
}

#[test]
fn invert_complements_a_clause() {
    let out = int_frame(vec![1, 2, 3, 4, 5]).filter(&[Filter::new("COL1", ">", 4).invert()]);
    assert_eq!(out, int_frame(vec![1, 2, 3, 4]));
}

#[test]
fn filter_does_not_mutate_the_source() {
    let input = int_frame(vec![1, 2, 3, 4, 5]);
    let _ = input.filter(&[Filter::new("COL1", ">", 3)]);
    assert_eq!(input, int_frame(vec![1, 2, 3, 4, 5]));
}

#[test]
fn int_column_vs_column() {
    let input = Frame::new(vec![
        ("COL1", Column::from(vec![1i64, 2, 3])),
        ("COL2", Column::from(vec![10i64, 1, 10])),
    ]);
    let expected = Frame::new(vec![
        ("COL1", Column::from(vec![1i64, 3])),
        ("COL2", Column::from(vec![10i64, 10])),
    ]);

    let built_in = input.filter(&[Filter::vs_column("COL2", ">", "COL1")]);
    assert_eq!(built_in, expected);

    let custom = input.filter(&[Filter::vs_column(
        "COL2",
        Comparator::IntFn(std::sync::Arc::new(|a, b| a > b)),
        "COL1",
    )]);
    assert_eq!(custom, expected);
}

#[test]
fn bool_column_vs_column() {
    let input = Frame::new(vec![
        ("COL1", Column::from(vec![true, false, false])),
        ("COL2", Column::from(vec![true, true, false])),
    ]);
    let expected = Frame::new(vec![
        ("COL1", Column::from(vec![true, false])),
        ("COL2", Column::from(vec![true, false])),
    ]);

    assert_eq!(input.filter(&[Filter::vs_column("COL1", "=", "COL2")]), expected);
    assert_eq!(
        input.filter(&[Filter::vs_column(
            "COL1",
            Comparator::BoolFn(std::sync::Arc::new(|a, b| a == b)),
            "COL2",
        )]),
        expected
    );
}

#[test]
fn float_column_vs_column() {
    let input = Frame::new(vec![
        ("COL1", Column::from(vec![1.0, 2.0, 3.0])),
        ("COL2", Column::from(vec![10.0, 1.0, 10.0])),
    ]);
    let expected = Frame::new(vec![
        ("COL1", Column::from(vec![2.0])),
        ("COL2", Column::from(vec![1.0])),
    ]);

    assert_eq!(input.filter(&[Filter::vs_column("COL2", "<", "COL1")]), expected);
    assert_eq!(
        input.filter(&[Filter::vs_column(
            "COL2",
            Comparator::FloatFn(std::sync::Arc::new(|a, b| a < b)),
            "COL1",
        )]),
        expected
    );
}

#[test]
fn string_column_vs_column() {
    let input = Frame::new(vec![
        ("COL1", Column::from(vec!["a", "b", "c"])),
        ("COL2", Column::from(vec!["o", "a", "q"])),
    ]);
    let expected = Frame::new(vec![
        ("COL1", Column::from(vec!["b"])),
        ("COL2", Column::from(vec!["a"])),
    ]);

    assert_eq!(input.filter(&[Filter::vs_column("COL2", "<", "COL1")]), expected);
    assert_eq!(
        input.filter(&[Filter::vs_column(
            "COL2",
            Comparator::StrFn(std::sync::Arc::new(|a, b| a < b)),
            "COL1",
        )]),
        expected
    );
}

#[test]
fn enum_column_vs_column_uses_dictionary_order() {
    let dict = ["a", "b", "c", "o", "q"];
    let input = Frame::new(vec![
        (
            "COL1",
            Column::enum_with_values(&dict, &[Some("a"), Some("b"), Some("c")]).unwrap(),
        ),
        (
            "COL2",
            Column::enum_with_values(&dict, &[Some("o"), Some("a"), Some("q")]).unwrap(),
        ),
    ]);
    let expected = Frame::new(vec![
        ("COL1", Column::enum_with_values(&dict, &[Some("b")]).unwrap()),
        ("COL2", Column::enum_with_values(&dict, &[Some("a")]).unwrap()),
    ]);

    assert_eq!(input.filter(&[Filter::vs_column("COL2", "<", "COL1")]), expected);
}

#[test]
fn string_comparisons_treat_null_as_smallest() {
    let values = vec![
        Some("b"),
        Some("c"),
        Some("a"),
        None,
        Some("e"),
        Some("d"),
        None,
    ];
    let input = Frame::new(vec![("COL1", Column::from(values))]);

    let gt = input.filter(&[Filter::new("COL1", ">", "b")]);
    let expected_gt = Frame::new(vec![(
        "COL1",
        Column::from(vec![Some("c"), Some("e"), Some("d")]),
    )]);
    assert_eq!(gt, expected_gt);

    let lt = input.filter(&[Filter::new("COL1", "<", "b")]);
    let expected_lt = Frame::new(vec![("COL1", Column::from(vec![Some("a"), None, None]))]);
    assert_eq!(lt, expected_lt);

    let like = input.filter(&[Filter::new("COL1", "like", "b")]);
    let expected_like = Frame::new(vec![("COL1", Column::from(vec![Some("b")]))]);
    assert_eq!(like, expected_like);

    let is_in = input.filter(&[Filter::is_in("COL1", ["a", "b"])]);
    let expected_in = Frame::new(vec![("COL1", Column::from(vec![Some("b"), Some("a")]))]);
    assert_eq!(is_in, expected_in);
}

#[test]
fn float_comparisons_are_ieee_for_nan() {
    let input = Frame::new(vec![("COL1", Column::from(vec![1.0, f64::NAN, 3.0]))]);

    let lt = input.filter(&[Filter::new("COL1", "<", 10.0)]);
    assert_eq!(lt.len(), 2);
    assert_eq!(lt.float_view("COL1").unwrap().to_vec(), vec![1.0, 3.0]);

    // `!=` is the one comparison an unordered operand satisfies.
    let ne = input.filter(&[Filter::new("COL1", "!=", 1.0)]);
    assert_eq!(ne.len(), 2);
    let kept = ne.float_view("COL1").unwrap().to_vec();
    assert!(kept[0].is_nan());
    assert_eq!(kept[1], 3.0);
}

fn like_fixture() -> Vec<String> {
    let mut values: Vec<String> = [
        "ABC", "AbC", "DEF", "ABCDEF", "abcdef", "FFF", "abc$def", "défåäöΦ",
    ]
    .iter()
    .map(|s| (*s).to_owned())
    .collect();
    // High-cardinality tail so the enum variant exercises its dictionary
    // fast path on a realistically sized dictionary.
    for i in 0..200 {
        values.push(format!("foo{i}bar"));
    }
    values
}

fn like_cases() -> Vec<(&'static str, String, Vec<&'static str>)> {
    vec![
        ("like", ".*EF.*".to_owned(), vec!["DEF", "ABCDEF"]),
        ("like", "%EF%".to_owned(), vec!["DEF", "ABCDEF"]),
        ("like", "AB%".to_owned(), vec!["ABC", "ABCDEF"]),
        ("like", "%F".to_owned(), vec!["DEF", "ABCDEF", "FFF"]),
        ("like", "ABC".to_owned(), vec!["ABC"]),
        ("like", "défåäöΦ".to_owned(), vec!["défåäöΦ"]),
        ("like", "%éfåäöΦ".to_owned(), vec!["défåäöΦ"]),
        ("like", "défå%".to_owned(), vec!["défåäöΦ"]),
        ("like", "%éfåäö%".to_owned(), vec!["défåäöΦ"]),
        ("like", "abc$def".to_owned(), vec![]),
        ("like", regex::escape("abc$def"), vec!["abc$def"]),
        ("like", "%180%".to_owned(), vec!["foo180bar"]),
        ("ilike", ".*ef.*".to_owned(), vec!["DEF", "ABCDEF", "abcdef", "abc$def"]),
        (
            "ilike",
            "ab%".to_owned(),
            vec!["ABC", "AbC", "ABCDEF", "abcdef", "abc$def"],
        ),
        (
            "ilike",
            "%f".to_owned(),
            vec!["DEF", "ABCDEF", "abcdef", "FFF", "abc$def"],
        ),
        ("ilike", "%ef%".to_owned(), vec!["DEF", "ABCDEF", "abcdef", "abc$def"]),
        ("ilike", "défÅäöΦ".to_owned(), vec!["défåäöΦ"]),
        ("ilike", "%éFåäöΦ".to_owned(), vec!["défåäöΦ"]),
        ("ilike", "défå%".to_owned(), vec!["défåäöΦ"]),
        ("ilike", "%éfåäÖ%".to_owned(), vec!["défåäöΦ"]),
        ("ilike", "ABC$def".to_owned(), vec![]),
        ("ilike", regex::escape("abc$DEF"), vec!["abc$def"]),
        ("ilike", "%180%".to_owned(), vec!["foo180bar"]),
    ]
}

#[test]
fn like_and_ilike_on_string_columns() {
    let values = like_fixture();
    let input = Frame::new(vec![("COL1", Column::from(values))]);

    for (comparator, pattern, expected) in like_cases() {
        let out = input.filter(&[Filter::new("COL1", comparator, pattern.as_str())]);
        let got: Vec<Option<std::sync::Arc<str>>> = out.str_view("COL1").unwrap().to_vec();
        let got: Vec<&str> = got.iter().map(|v| v.as_deref().unwrap()).collect();
        assert_eq!(got, expected, "{comparator} {pattern}");
    }
}

#[test]
fn like_and_ilike_on_enum_columns() {
    let values = like_fixture();
    let options: Vec<Option<&str>> = values.iter().map(|s| Some(s.as_str())).collect();
    let input = Frame::new(vec![("COL1", Column::enum_inferred(&options).unwrap())]);

    for (comparator, pattern, expected) in like_cases() {
        let out = input.filter(&[Filter::new("COL1", comparator, pattern.as_str())]);
        let view = out.enum_view("COL1").unwrap();
        let got: Vec<&str> = view.iter().map(|v| v.unwrap()).collect();
        assert_eq!(got, expected, "{comparator} {pattern}");
    }
}

#[test]
fn unknown_column_latches() {
    let out = int_frame(vec![1]).filter(&[Filter::new("MISSING", ">", 0)]);
    assert_eq!(
        out.error(),
        Some(&Error::ColumnNotFound {
            name: "MISSING".to_owned()
        })
    );
}

#[test]
fn unknown_comparator_latches() {
    let out = int_frame(vec![1]).filter(&[Filter::new("COL1", "<>", 0)]);
    assert_eq!(
        out.error(),
        Some(&Error::InvalidComparator {
            name: "<>".to_owned(),
            column_type: ColumnType::Int,
        })
    );
}

#[test]
fn operand_type_mismatch_latches() {
    let out = int_frame(vec![1]).filter(&[Filter::new("COL1", ">", "three")]);
    assert!(matches!(out.error(), Some(Error::TypeMismatch { .. })));
}

#[test]
fn like_is_invalid_for_int_columns() {
    let out = int_frame(vec![1]).filter(&[Filter::new("COL1", "like", "1")]);
    assert!(matches!(out.error(), Some(Error::InvalidComparator { .. })));
}

#[test]
fn relational_comparator_is_invalid_for_bool_columns() {
    let input = Frame::new(vec![("COL1", Column::from(vec![true, false]))]);
    let out = input.filter(&[Filter::new("COL1", "<", true)]);
    assert!(matches!(out.error(), Some(Error::InvalidComparator { .. })));
}
