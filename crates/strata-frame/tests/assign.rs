use pretty_assertions::assert_eq;
use strata_frame::{ApplyFn, Column, ColumnType, Error, Filter, Frame, Instruction};
use std::sync::Arc;

fn base_frame() -> Frame {
    Frame::new(vec![("COL1", Column::from(vec![3i64, 2]))])
}

#[test]
fn broadcast_constants_and_nullary_functions() {
    let input = base_frame();

    let with_const = input.assign(&[Instruction::broadcast(ApplyFn::int_const(3), "COL2")]);
    assert_eq!(with_const.int_view("COL2").unwrap().to_vec(), vec![3, 3]);

    let with_fn = input.assign(&[Instruction::broadcast(
        ApplyFn::Int0(Arc::new(|| 2)),
        "COL2",
    )]);
    assert_eq!(with_fn.int_view("COL2").unwrap().to_vec(), vec![2, 2]);

    let with_float = input.assign(&[Instruction::broadcast(ApplyFn::float_const(3.5), "COL2")]);
    assert_eq!(with_float.float_view("COL2").unwrap().to_vec(), vec![3.5, 3.5]);

    let with_bool = input.assign(&[Instruction::broadcast(ApplyFn::bool_const(false), "COL2")]);
    assert_eq!(with_bool.bool_view("COL2").unwrap().to_vec(), vec![false, false]);

    let with_str = input.assign(&[Instruction::broadcast(ApplyFn::str_const(Some("a")), "COL2")]);
    assert_eq!(
        with_str.str_view("COL2").unwrap().iter().collect::<Vec<_>>(),
        vec![Some("a"), Some("a")]
    );

    let with_null = input.assign(&[Instruction::broadcast(ApplyFn::str_const(None), "COL2")]);
    assert_eq!(
        with_null.str_view("COL2").unwrap().iter().collect::<Vec<_>>(),
        vec![None, None]
    );
}

#[test]
fn unary_int_replaces_in_place() {
    let out = base_frame().assign(&[Instruction::unary(
        ApplyFn::Int1(Arc::new(|a| Ok(2 * a))),
        "COL1",
        "COL1",
    )]);
    assert_eq!(out, Frame::new(vec![("COL1", Column::from(vec![6i64, 4]))]));
}

#[test]
fn unary_string_to_bool_appends_new_column() {
    let input = Frame::new(vec![("COL1", Column::from(vec!["a", "aa", "aaa"]))]);
    let out = input.assign(&[Instruction::unary(
        ApplyFn::StrToBool(Arc::new(|x| Ok(x.is_some_and(|s| s.len() > 2)))),
        "IS_LONG",
        "COL1",
    )]);

    assert_eq!(out.column_names(), vec!["COL1", "IS_LONG"]);
    assert_eq!(
        out.bool_view("IS_LONG").unwrap().to_vec(),
        vec![false, false, true]
    );
}

#[test]
fn to_upper_on_strings_passes_nulls_through() {
    let input = Frame::new(vec![(
        "COL1",
        Column::from(vec![Some("a"), Some("b"), None]),
    )]);
    let expected = Frame::new(vec![(
        "COL1",
        Column::from(vec![Some("A"), Some("B"), None]),
    )]);

    // User function.
    let general = input.assign(&[Instruction::unary(
        ApplyFn::Str1(Arc::new(|x| Ok(x.map(str::to_uppercase)))),
        "COL1",
        "COL1",
    )]);
    assert_eq!(general, expected);

    // Built-in resolved by name.
    let named = input.assign(&[Instruction::unary(ApplyFn::named("to_upper"), "COL1", "COL1")]);
    assert_eq!(named, expected);
}

#[test]
fn named_transform_keeps_enum_columns_dictionary_encoded() {
    let input = Frame::new(vec![(
        "COL1",
        Column::enum_inferred(&[Some("a"), Some("b"), None, Some("a")]).unwrap(),
    )]);

    let named = input.assign(&[Instruction::unary(ApplyFn::named("to_upper"), "COL1", "COL1")]);
    assert_eq!(named.column_type("COL1").unwrap(), ColumnType::Enum);
    assert_eq!(
        named.enum_view("COL1").unwrap().to_vec(),
        vec![Some("A"), Some("B"), None, Some("A")]
    );

    // A general function cannot go through the dictionary, so the result is
    // a plain string column.
    let general = input.assign(&[Instruction::unary(
        ApplyFn::Str1(Arc::new(|x| Ok(x.map(str::to_uppercase)))),
        "COL1",
        "COL1",
    )]);
    assert_eq!(general.column_type("COL1").unwrap(), ColumnType::Str);
    assert_eq!(
        general.str_view("COL1").unwrap().iter().collect::<Vec<_>>(),
        vec![Some("A"), Some("B"), None, Some("A")]
    );
}

#[test]
fn abs_applies_to_int_and_float() {
    let input = Frame::new(vec![
        ("i", Column::from(vec![-3i64, 4])),
        ("f", Column::from(vec![-1.5, 2.5])),
    ]);

    let out = input
        .assign(&[Instruction::unary(ApplyFn::named("abs"), "i", "i")])
        .assign(&[Instruction::unary(ApplyFn::named("abs"), "f", "f")]);
    assert_eq!(out.int_view("i").unwrap().to_vec(), vec![3, 4]);
    assert_eq!(out.float_view("f").unwrap().to_vec(), vec![1.5, 2.5]);
}

#[test]
fn binary_functions_combine_two_columns() {
    let ints = Frame::new(vec![
        ("COL1", Column::from(vec![3i64, 2])),
        ("COL2", Column::from(vec![30i64, 20])),
    ]);
    let out = ints.assign(&[Instruction::binary(
        ApplyFn::Int2(Arc::new(|a, b| Ok(a + b))),
        "COL3",
        "COL1",
        "COL2",
    )]);
    assert_eq!(out.int_view("COL3").unwrap().to_vec(), vec![33, 22]);

    let concat: ApplyFn = ApplyFn::Str2(Arc::new(|a, b| {
        Ok(match (a, b) {
            (Some(a), Some(b)) => Some(format!("{a}{b}")),
            _ => None,
        })
    }));

    let strings = Frame::new(vec![
        ("COL1", Column::from(vec!["a", "b"])),
        ("COL2", Column::from(vec!["x", "y"])),
    ]);
    let out = strings.assign(&[Instruction::binary(concat.clone(), "COL3", "COL1", "COL2")]);
    assert_eq!(
        out.str_view("COL3").unwrap().iter().collect::<Vec<_>>(),
        vec![Some("ax"), Some("by")]
    );

    let enums = Frame::new(vec![
        ("COL1", Column::enum_inferred(&[Some("a"), Some("b")]).unwrap()),
        ("COL2", Column::enum_inferred(&[Some("x"), Some("y")]).unwrap()),
    ]);
    let out = enums.assign(&[Instruction::binary(concat, "COL3", "COL1", "COL2")]);
    assert_eq!(
        out.str_view("COL3").unwrap().iter().collect::<Vec<_>>(),
        vec![Some("ax"), Some("by")]
    );
}

#[test]
fn filtered_assign_zero_fills_rows_outside_the_filter() {
    let plus1 = || ApplyFn::Int1(Arc::new(|a| Ok(a + 1)));
    let input = Frame::new(vec![("COL1", Column::from(vec![3i64, 2, 1]))]);

    // New destination: two chained instructions, both restricted to
    // COL1 > 1; the non-matching row stays at the int zero value.
    let out = input.filtered_assign(
        &[Filter::new("COL1", ">", 1)],
        &[
            Instruction::unary(plus1(), "COL3", "COL1"),
            Instruction::unary(plus1(), "COL3", "COL3"),
        ],
    );
    let expected = Frame::new(vec![
        ("COL1", Column::from(vec![3i64, 2, 1])),
        ("COL3", Column::from(vec![5i64, 4, 0])),
    ]);
    assert_eq!(out, expected);

    // Existing destination: replacement, not preservation.
    let out = input.filtered_assign(
        &[Filter::new("COL1", ">", 1)],
        &[Instruction::unary(plus1(), "COL1", "COL1")],
    );
    assert_eq!(
        out,
        Frame::new(vec![("COL1", Column::from(vec![4i64, 3, 0]))])
    );
}

#[test]
fn copy_column_appends_or_replaces() {
    let input = Frame::new(vec![
        ("COL1", Column::from(vec!["a", "b"])),
        ("COL2", Column::from(vec![3i64, 2])),
    ]);

    let appended = input.copy_column("COL3", "COL2");
    let expected_new = Frame::new(vec![
        ("COL1", Column::from(vec!["a", "b"])),
        ("COL2", Column::from(vec![3i64, 2])),
        ("COL3", Column::from(vec![3i64, 2])),
    ]);
    assert_eq!(appended, expected_new);

    let replaced = input.copy_column("COL1", "COL2");
    let expected_replace = Frame::new(vec![
        ("COL1", Column::from(vec![3i64, 2])),
        ("COL2", Column::from(vec![3i64, 2])),
    ]);
    assert_eq!(replaced, expected_replace);
}

#[test]
fn arity_mismatch_latches() {
    let out = base_frame().assign(&[Instruction::broadcast(
        ApplyFn::Int1(Arc::new(|a| Ok(a))),
        "COL2",
    )]);
    assert!(matches!(out.error(), Some(Error::TransformFailure { .. })));
}

#[test]
fn unknown_function_name_latches() {
    let out = base_frame().assign(&[Instruction::unary(
        ApplyFn::named("reverse"),
        "COL2",
        "COL1",
    )]);
    assert_eq!(
        out.error(),
        Some(&Error::TransformFailure {
            dst: "COL2".to_owned(),
            reason: "unknown function: reverse".to_owned()
        })
    );
}

#[test]
fn function_type_mismatch_latches() {
    let out = base_frame().assign(&[Instruction::unary(
        ApplyFn::Str1(Arc::new(|x| Ok(x.map(str::to_owned)))),
        "COL2",
        "COL1",
    )]);
    assert!(matches!(out.error(), Some(Error::TypeMismatch { .. })));
}

#[test]
fn failing_user_function_latches() {
    let out = base_frame().assign(&[Instruction::unary(
        ApplyFn::Int1(Arc::new(|_| Err("bad row".to_owned()))),
        "COL2",
        "COL1",
    )]);
    assert_eq!(
        out.error(),
        Some(&Error::TransformFailure {
            dst: "COL2".to_owned(),
            reason: "bad row".to_owned()
        })
    );
}
