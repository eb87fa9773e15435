use bytes::BytesMut;
use focwire_registers::{decode_layout, encode_scalar, Catalog, ScalarType, Value};
use proptest::prelude::*;

fn value_for(ty: ScalarType) -> BoxedStrategy<Value> {
    match ty {
        ScalarType::Byte => (0u8..=255).prop_map(Value::from).boxed(),
        ScalarType::Int32 => any::<i32>().prop_map(Value::from).boxed(),
        ScalarType::Float32 => any::<f32>()
            .prop_filter("NaN never compares equal", |v| !v.is_nan())
            .prop_map(Value::Float)
            .boxed(),
    }
}

fn layout_values(types: Vec<ScalarType>) -> BoxedStrategy<Vec<Value>> {
    types
        .into_iter()
        .map(value_for)
        .collect::<Vec<_>>()
        .boxed()
}

proptest! {
    #[test]
    fn every_builtin_layout_roundtrips(
        (types, values) in prop::sample::select(
            Catalog::builtin()
                .iter()
                .flat_map(|r| [r.read_types.clone(), r.write_types.clone()])
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
        )
        .prop_flat_map(|types| (Just(types.clone()), layout_values(types)))
    ) {
        let mut buf = BytesMut::new();
        for (ty, value) in types.iter().zip(&values) {
            encode_scalar(*ty, value, &mut buf).unwrap();
        }
        prop_assert_eq!(buf.len(), focwire_registers::layout_size(&types));
        prop_assert_eq!(decode_layout(&types, &buf), values);
    }
}
