//! Round-trip law for the reserved multi-value separator.

use biokg_core::multi_value::{join_multi, split_multi, MULTI_VALUE_SEPARATOR};
use biokg_core::{decode_entity, RawRecord};
use proptest::prelude::*;

/// Elements as they occur in node files: any text without the separator.
fn element_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 ,.:;'()|/_-]{1,24}").unwrap()
}

proptest! {
    #[test]
    fn split_after_join_reproduces_sequence(elements in prop::collection::vec(element_strategy(), 0..12)) {
        let joined = join_multi(&elements);
        prop_assert_eq!(split_multi(&joined), elements);
    }

    #[test]
    fn join_after_split_reproduces_field(elements in prop::collection::vec(element_strategy(), 0..12)) {
        let field = join_multi(&elements);
        prop_assert_eq!(join_multi(&split_multi(&field)), field);
    }

    #[test]
    fn decoded_synonyms_keep_order(elements in prop::collection::vec(element_strategy(), 1..8)) {
        let joined = join_multi(&elements);
        let record = RawRecord::from_pairs(2, [("id", "X:1"), ("all_names", joined.as_str())]);
        let entity = decode_entity(&record).unwrap();
        prop_assert_eq!(entity.all_names, elements);
    }
}

#[test]
fn separator_is_alveolar_click() {
    assert_eq!(MULTI_VALUE_SEPARATOR, 'ǂ');
    assert_eq!(MULTI_VALUE_SEPARATOR as u32, 0x01C2);
}
