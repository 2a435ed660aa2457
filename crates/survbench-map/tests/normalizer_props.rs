use proptest::prelude::*;

use survbench_map::normalize_value;
use survbench_model::{EntityKind, TaxonomyTable};

proptest! {
    /// Normalizing an already-normalized value returns it unchanged, for
    /// any raw string and any entity kind.
    #[test]
    fn normalize_is_idempotent(raw in "[ -~]{0,40}", kind_idx in 0usize..4) {
        let kind = EntityKind::all()[kind_idx];
        let table = TaxonomyTable::new(kind);
        let once = normalize_value(&raw, kind, "sourceX", &table);
        let twice = normalize_value(&once, kind, "sourceX", &table);
        prop_assert_eq!(once, twice);
    }
}
