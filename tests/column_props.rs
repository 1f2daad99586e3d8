//! Property tests for column references

use excelexport::column::{column_label, label_to_index, ColumnRef, ColumnResolver, MAX_COLUMNS};
use proptest::prelude::*;

proptest! {
    #[test]
    fn label_round_trip(index in 0u32..MAX_COLUMNS) {
        let label = column_label(index);
        prop_assert_eq!(label_to_index(&label).unwrap(), index);
        prop_assert_eq!(label_to_index(&label.to_lowercase()).unwrap(), index);
    }

    #[test]
    fn offsets_shift_with_start_column(start in 0u32..1000, offset in 0u32..1000) {
        let resolver = ColumnResolver::new(&ColumnRef::from(column_label(start))).unwrap();
        prop_assert_eq!(resolver.resolve(&ColumnRef::Offset(offset)).unwrap(), start + offset);
    }

    #[test]
    fn labels_ignore_start_column(start in 0u32..1000, index in 0u32..MAX_COLUMNS) {
        let resolver = ColumnResolver::new(&ColumnRef::Offset(start)).unwrap();
        let label = ColumnRef::from(column_label(index));
        prop_assert_eq!(resolver.resolve(&label).unwrap(), index);
    }

    #[test]
    fn parsed_digits_are_offsets(offset in 0u32..100_000) {
        let parsed: ColumnRef = offset.to_string().parse().unwrap();
        prop_assert_eq!(parsed, ColumnRef::Offset(offset));
    }
}
