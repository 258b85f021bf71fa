//! Property-based tests for the transform contracts.

use proptest::prelude::*;

use tablecast::{
    Column, DefaultColumnSortingTransform, FilterTransform, Frame, QuantileLabelTransform,
    SumTransform, Table, TableSource, Transform, Value, VerticalConcatenateTransform,
};

fn table_with_values(values: &[i64], labels: &[String]) -> Table {
    let frame = Frame::with_columns(vec![
        (
            "label".to_string(),
            Column::Categorical(labels.iter().map(|l| Some(l.clone())).collect()),
        ),
        (
            "value".to_string(),
            Column::Integer(values.iter().map(|&v| Some(v)).collect()),
        ),
    ])
    .unwrap();
    Table::new("prop_table", TableSource::Other, frame)
}

fn labels_strategy(len: usize) -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(prop_oneof!["a", "b", "c"].prop_map(String::from), len)
}

proptest! {
    #[test]
    fn prop_transforms_never_mutate_input(
        values in proptest::collection::vec(-1000i64..1000, 1..50)
    ) {
        let labels = vec!["a".to_string(); values.len()];
        let table = table_with_values(&values, &labels);
        let snapshot = table.clone();

        let _ = SumTransform::new(vec!["value".to_string()], vec!["label".to_string()])
            .apply(&table);
        let _ = FilterTransform::new("value", vec![Value::Int(0)]).apply(&table);
        let _ = DefaultColumnSortingTransform.apply(&table);

        prop_assert_eq!(table, snapshot);
    }

    #[test]
    fn prop_filter_output_is_row_subset(
        values in proptest::collection::vec(-10i64..10, 1..50),
        wanted in proptest::collection::vec(-10i64..10, 1..5)
    ) {
        let labels = vec!["a".to_string(); values.len()];
        let table = table_with_values(&values, &labels);
        let filter_values: Vec<Value> = wanted.iter().map(|&v| Value::Int(v)).collect();

        let result = FilterTransform::new("value", filter_values).apply(&table).unwrap();

        prop_assert!(result.data.height() <= table.data.height());
        let column = result.data.column("value").unwrap();
        for row in 0..result.data.height() {
            match column.get(row) {
                Value::Int(v) => prop_assert!(wanted.contains(&v)),
                other => prop_assert!(false, "unexpected value {:?}", other),
            }
        }
    }

    #[test]
    fn prop_column_sorting_is_idempotent(
        values in proptest::collection::vec(-1000i64..1000, 1..20)
    ) {
        let labels = vec!["a".to_string(); values.len()];
        let table = table_with_values(&values, &labels);

        let once = DefaultColumnSortingTransform.apply(&table).unwrap();
        let twice = DefaultColumnSortingTransform.apply(&once).unwrap();

        prop_assert_eq!(once.data.column_names(), twice.data.column_names());
        prop_assert_eq!(once.data, twice.data);
    }

    #[test]
    fn prop_concatenation_heights_add(
        top in proptest::collection::vec(-100i64..100, 1..20),
        bottom in proptest::collection::vec(-100i64..100, 1..20)
    ) {
        let top_table = table_with_values(&top, &vec!["a".to_string(); top.len()]);
        let bottom_table = table_with_values(&bottom, &vec!["b".to_string(); bottom.len()]);

        let result = VerticalConcatenateTransform::new(bottom_table)
            .apply(&top_table)
            .unwrap();
        prop_assert_eq!(result.data.height(), top.len() + bottom.len());
    }

    #[test]
    fn prop_quantile_labels_come_from_label_set(
        values in proptest::collection::vec(-1000i64..1000, 2..50),
        labels in labels_strategy(3)
    ) {
        let partition = vec!["a".to_string(); values.len()];
        let table = table_with_values(&values, &partition);
        // Distinct label text is not required by the transform; any
        // assigned label must still come from the configured set.
        let transform = QuantileLabelTransform::new(
            "value",
            vec![],
            vec![0.4, 0.8],
            labels.clone(),
            "bucket",
        )
        .unwrap();

        let result = transform.apply(&table).unwrap();
        let bucket = result.data.column("bucket").unwrap();
        for row in 0..result.data.height() {
            match bucket.get(row) {
                Value::Text(label) => prop_assert!(labels.contains(&label)),
                Value::Null => {}
                other => prop_assert!(false, "unexpected label {:?}", other),
            }
        }
    }
}
