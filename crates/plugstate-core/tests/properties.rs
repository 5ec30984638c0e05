//! Property-based tests for plugstate-core.
//!
//! Checks value round-trips through the codec, normalization inverses and
//! that no corrupt input can panic the decoder.

use std::sync::Arc;

use plugstate_core::{
    ByteChunk, ParamDescriptor, ParamScale, ParameterTable, PluginVersion, StateCodec,
    get_version_from_chunk,
};
use proptest::prelude::*;

fn ranged_table(ranges: &[(f64, f64)]) -> Arc<ParameterTable> {
    let mut builder = ParameterTable::builder();
    for (i, &(min, span)) in ranges.iter().enumerate() {
        builder.add(ParamDescriptor::new(format!("P{i}"), min, min + span, min));
    }
    Arc::new(builder.build())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Any in-range values survive serialize -> unserialize within 1e-9.
    #[test]
    fn state_round_trip(
        ranges in prop::collection::vec((-1000.0f64..1000.0, 0.001f64..2000.0), 0..32),
        fractions in prop::collection::vec(0.0f64..=1.0, 32),
    ) {
        let table = ranged_table(&ranges);
        let codec = StateCodec::new(Arc::clone(&table));
        let expected: Vec<f64> = ranges
            .iter()
            .zip(&fractions)
            .map(|(&(min, span), &f)| min + f * span)
            .collect();
        table.lock().apply(&expected);

        let mut chunk = ByteChunk::new();
        codec.serialize_with_header(PluginVersion::new(1, 0, 0), &mut chunk).unwrap();
        table.reset_to_defaults();
        codec.unserialize_with_header(&chunk, 0, PluginVersion::new(1, 0, 0)).unwrap();

        for (got, want) in table.snapshot().iter().zip(&expected) {
            prop_assert!((got - want).abs() <= 1e-9, "got {got}, want {want}");
        }
        prop_assert!(codec.compare_state(chunk.as_slice(), 8));
    }

    /// normalize(denormalize(x)) ≈ x for every scale.
    #[test]
    fn normalize_inverse(
        x in 0.01f64..=1.0,
        min in 0.01f64..100.0,
        span in 1.0f64..10000.0,
        scale in 0usize..3,
        exp in 0.5f64..2.0,
    ) {
        let scale = match scale {
            0 => ParamScale::Linear,
            1 => ParamScale::Logarithmic,
            _ => ParamScale::Power(exp),
        };
        let desc = ParamDescriptor::new("X", min, min + span, min).with_scale(scale);
        let back = desc.normalize(desc.denormalize(x));
        prop_assert!((back - x).abs() < 1e-9, "{scale:?}: {x} -> {back}");
    }

    /// Arbitrary bytes either restore cleanly or fail without touching the table.
    #[test]
    fn garbage_never_corrupts(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let table = ranged_table(&[(0.0, 1.0), (0.0, 1.0), (0.0, 1.0)]);
        let codec = StateCodec::new(Arc::clone(&table));
        let before = table.snapshot();
        let chunk = ByteChunk::from(bytes);

        match codec.unserialize_with_header(&chunk, 0, PluginVersion::new(1, 0, 0)) {
            Ok(end) => {
                prop_assert!(end <= chunk.len());
                for v in table.snapshot() {
                    prop_assert!((0.0..=1.0).contains(&v));
                }
            }
            Err(_) => prop_assert_eq!(table.snapshot(), before),
        }
    }

    /// The header probe never moves the cursor unless it found a header.
    #[test]
    fn header_probe_is_safe(bytes in prop::collection::vec(any::<u8>(), 0..16), pos in 0usize..20) {
        let chunk = ByteChunk::from(bytes);
        let (version, next) = get_version_from_chunk(&chunk, pos);
        match version {
            Some(_) => prop_assert_eq!(next, pos + 8),
            None => prop_assert_eq!(next, pos),
        }
    }
}
