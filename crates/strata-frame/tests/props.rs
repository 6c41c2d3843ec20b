use proptest::prelude::*;
use strata_frame::{Column, Filter, Frame, SortKey};

fn int_frame(values: &[i64]) -> Frame {
    Frame::new(vec![("v", Column::from(values.to_vec()))])
}

proptest! {
    /// Filtering never grows a frame, and the retained rows are exactly the
    /// ones a naive per-row evaluator keeps, in order.
    #[test]
    fn filter_matches_a_naive_evaluator(
        values in prop::collection::vec(-50i64..50, 0..60),
        threshold in -50i64..50,
    ) {
        let frame = int_frame(&values);
        let out = frame.filter(&[Filter::new("v", ">", threshold)]);

        prop_assert!(out.len() <= frame.len());

        let expected: Vec<i64> = values.iter().copied().filter(|v| *v > threshold).collect();
        prop_assert_eq!(out.int_view("v").unwrap().to_vec(), expected);
    }

    /// OR across clauses in one call equals the union of the per-clause row
    /// sets, order preserved.
    #[test]
    fn clause_or_is_a_union(
        values in prop::collection::vec(-50i64..50, 0..60),
        low in -50i64..0,
        high in 0i64..50,
    ) {
        let frame = int_frame(&values);
        let out = frame.filter(&[
            Filter::new("v", "<", low),
            Filter::new("v", ">", high),
        ]);

        let expected: Vec<i64> = values
            .iter()
            .copied()
            .filter(|v| *v < low || *v > high)
            .collect();
        prop_assert_eq!(out.int_view("v").unwrap().to_vec(), expected);
    }

    /// Rows with equal sort keys keep their original relative order.
    #[test]
    fn sort_is_stable(keys in prop::collection::vec(0i64..5, 0..60)) {
        let payload: Vec<i64> = (0..keys.len() as i64).collect();
        let frame = Frame::new(vec![
            ("k", Column::from(keys.clone())),
            ("p", Column::from(payload)),
        ]);

        let sorted = frame.sort(&[SortKey::asc("k")]);
        let sorted_keys = sorted.int_view("k").unwrap().to_vec();
        let sorted_payload = sorted.int_view("p").unwrap().to_vec();

        for window in sorted_keys.windows(2).zip(sorted_payload.windows(2)) {
            let (k, p) = window;
            prop_assert!(k[0] <= k[1]);
            if k[0] == k[1] {
                // Payload is the original row number, so ties must ascend.
                prop_assert!(p[0] < p[1]);
            }
        }
    }

    /// Reversing every key twice restores the original order.
    #[test]
    fn double_reverse_round_trips(keys in prop::collection::vec(-20i64..20, 0..60)) {
        let frame = int_frame(&keys);
        let twice = frame
            .sort(&[SortKey::desc("v")])
            .sort(&[SortKey::asc("v")]);
        let once = frame.sort(&[SortKey::asc("v")]);
        prop_assert!(once.equals(&twice));
    }

    /// `distinct` is idempotent.
    #[test]
    fn distinct_is_idempotent(
        col1 in prop::collection::vec(0i64..4, 0..60),
    ) {
        let col2: Vec<bool> = col1.iter().map(|v| v % 2 == 0).collect();
        let frame = Frame::new(vec![
            ("a", Column::from(col1)),
            ("b", Column::from(col2)),
        ]);
        let once = frame.distinct();
        let twice = once.distinct();
        prop_assert!(once.equals(&twice));
    }

    /// Slice and select never alter the values of retained rows.
    #[test]
    fn slice_and_select_are_zero_mutation(
        values in prop::collection::vec(-50i64..50, 1..60),
        raw_start in 0usize..60,
        raw_len in 0usize..60,
    ) {
        let start = raw_start % values.len();
        let end = (start + raw_len).min(values.len());
        let frame = Frame::new(vec![
            ("v", Column::from(values.clone())),
            ("w", Column::from(values.iter().map(|v| v * 2).collect::<Vec<i64>>())),
        ]);

        let sliced = frame.slice(start, end);
        prop_assert_eq!(sliced.int_view("v").unwrap().to_vec(), &values[start..end]);

        let selected = frame.select(&["w"]);
        prop_assert_eq!(selected.len(), frame.len());
        prop_assert_eq!(
            selected.int_view("w").unwrap().to_vec(),
            frame.int_view("w").unwrap().to_vec()
        );
    }
}
