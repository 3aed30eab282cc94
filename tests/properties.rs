//! Round-trip properties over generated alignments.

use indexmap::IndexMap;
use proptest::prelude::*;

use charm::{
    from_charmatrix, from_sequence_dict, to_charmatrix, to_sequence_dict, CharacterMatrix,
    CharmError, Column, DataType, MatrixFormat, Table,
};

/// Unique labels, some longer than a strict PHYLIP name.
fn labels_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[A-Za-z][A-Za-z0-9_]{0,15}", 1..6)
        .prop_map(|labels| labels.into_iter().collect())
}

/// `{label: sequence}` mappings of equal-length strings drawn from `symbols`.
fn mapping_strategy(symbols: Vec<char>) -> impl Strategy<Value = IndexMap<String, String>> {
    (labels_strategy(), 1usize..40).prop_flat_map(move |(labels, nchar)| {
        let sequence = prop::collection::vec(prop::sample::select(symbols.clone()), nchar)
            .prop_map(|chars| chars.into_iter().collect::<String>());
        prop::collection::vec(sequence, labels.len()).prop_map(move |sequences| {
            labels
                .iter()
                .cloned()
                .zip(sequences)
                .collect::<IndexMap<String, String>>()
        })
    })
}

/// A data type paired with a mapping over its states, gap and missing symbol.
fn typed_mapping_strategy() -> impl Strategy<Value = (DataType, IndexMap<String, String>)> {
    prop::sample::select(DataType::ALL.to_vec()).prop_flat_map(|data_type| {
        let symbols: Vec<char> = data_type.alphabet().chars().chain(['-', '?']).collect();
        (Just(data_type), mapping_strategy(symbols))
    })
}

fn free_text_mapping() -> impl Strategy<Value = IndexMap<String, String>> {
    mapping_strategy("ACGTNacgtn-?.*01 é".chars().collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_sequence_dict_roundtrip(mapping in free_text_mapping()) {
        let table = from_sequence_dict(&mapping, false).unwrap();
        prop_assert_eq!(table.ncols(), mapping.len());
        let back = to_sequence_dict(&table).unwrap();
        prop_assert_eq!(back.keys().collect::<Vec<_>>(), mapping.keys().collect::<Vec<_>>());
        prop_assert_eq!(back, mapping);
    }

    #[test]
    fn prop_object_then_categorical_reproduces_table(mapping in free_text_mapping()) {
        let table = from_sequence_dict(&mapping, true).unwrap();
        prop_assert_eq!(table.as_object().as_categorical(&[]), table.clone());

        // Extra categories are lost, values are not
        let widened = table.as_categorical(&["X", "Z"]);
        prop_assert_eq!(widened.as_object().as_categorical(&[]).as_object(), table.as_object());
    }

    #[test]
    fn prop_charmatrix_roundtrip((data_type, mapping) in typed_mapping_strategy()) {
        let table = from_sequence_dict(&mapping, true).unwrap();
        let matrix = to_charmatrix(&table, data_type).unwrap();
        prop_assert_eq!(matrix.ntax(), mapping.len());
        prop_assert_eq!(from_charmatrix(&matrix, false), table.as_object());
    }

    #[test]
    fn prop_charmatrix_phylip_reads_back((data_type, mapping) in typed_mapping_strategy()) {
        let matrix = CharacterMatrix::from_dict(data_type, &mapping).unwrap();
        let text = matrix.as_string(MatrixFormat::Phylip);
        let back = CharacterMatrix::from_phylip_str(data_type, &text).unwrap();
        prop_assert_eq!(back, matrix);
    }

    #[test]
    fn prop_missing_cell_blocks_sequence_dict(
        mapping in free_text_mapping(),
        column in any::<prop::sample::Index>(),
        row in any::<prop::sample::Index>(),
    ) {
        let target = column.index(mapping.len());
        let position = row.index(mapping[0].chars().count());
        let table = Table::from_columns(mapping.iter().enumerate().map(|(i, (label, seq))| {
            let mut values: Vec<Option<String>> = seq.chars().map(|c| Some(c.to_string())).collect();
            if i == target {
                values[position] = None;
            }
            (label.clone(), Column::plain(values))
        }))
        .unwrap();

        let is_missing_data = matches!(
            to_sequence_dict(&table),
            Err(CharmError::MissingData { position: p, .. }) if p == position
        );
        prop_assert!(is_missing_data);
    }
}
