//! Type descriptor and factory tests

use quantum::{
    DescriptorCategory, IndexKey, TypeDescriptor, Value, ValueKind, convert_value,
    descriptor::DescriptorError,
};

use crate::helpers::*;

#[test]
fn test_register_rejects_duplicate_names() {
    let mut factory = factory();
    let err = factory
        .register(TypeDescriptor::list(INT_LIST, ValueKind::Int))
        .unwrap_err();
    assert_eq!(
        err,
        DescriptorError::DuplicateType {
            name: INT_LIST.to_string()
        }
    );
    assert!(factory.contains(INT_LIST));
}

#[test]
fn test_find_unknown_type() {
    let factory = factory();
    let err = factory.find("Nope").unwrap_err();
    assert!(err.is_not_found());
    let err: quantum::Error = err.into();
    assert!(err.is_not_found());
    assert_eq!(err.module(), "descriptor");
}

#[test]
fn test_instantiate_populates_member_defaults() {
    let factory = factory();
    let scores = factory.instantiate(SCORES).unwrap();

    assert_eq!(scores.get("Count").unwrap(), Value::Int(1));
    assert_eq!(scores.get("Ratio").unwrap(), Value::Float(0.0));
    assert!(scores.get("Label").unwrap().is_null());

    let values = object_member(&scores, "Values");
    assert_eq!(values.type_name(), INT_LIST);
    assert!(values.is_empty());
}

#[test]
fn test_instantiate_assigns_fresh_identities() {
    let factory = factory();
    let a = factory.instantiate(REFERENCEABLE).unwrap();
    let b = factory.instantiate(REFERENCEABLE).unwrap();

    let id_a = a.get("Id").unwrap().as_guid().unwrap();
    let id_b = b.get("Id").unwrap().as_guid().unwrap();
    assert!(!id_a.is_nil());
    assert_ne!(id_a, id_b);
    assert!(Value::from(&a).is_identifiable());
    assert!(!Value::from(factory.instantiate(INT_LIST).unwrap()).is_identifiable());
}

#[test]
fn test_describe_primitives_and_hosts() {
    let factory = factory();
    assert_eq!(
        factory.describe(&Value::Int(3)).category(),
        DescriptorCategory::Primitive
    );
    let list = factory.instantiate(INT_LIST).unwrap();
    assert_eq!(factory.describe(&Value::from(&list)).name(), INT_LIST);
}

#[test]
fn test_member_access_checks_kinds() {
    let factory = factory();
    let scores = factory.instantiate(SCORES).unwrap();

    scores.set("Ratio", 2).unwrap();
    assert_eq!(scores.get("Ratio").unwrap(), Value::Float(2.0));

    let err = scores.set("Count", "many").unwrap_err();
    assert!(err.is_type_error());

    let err = scores.get("Missing").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_object_kinds_accept_implementations() {
    let factory = factory();
    let orphan = factory.instantiate(ORPHAN_PART).unwrap();
    let referenceable = referenceable(&factory, "x");

    assert!(convert_value(Value::from(&orphan), &ValueKind::object(PART)).is_ok());
    let err = convert_value(Value::from(&referenceable), &ValueKind::object(PART)).unwrap_err();
    assert!(err.is_type_error());
}

#[test]
fn test_float_narrowing_rejects_out_of_range() {
    assert!(convert_value(Value::Float(f64::INFINITY), &ValueKind::Int).is_err());
    assert!(convert_value(Value::Float(1e300), &ValueKind::Int).is_err());
    assert_eq!(
        convert_value(Value::Float(-1.4), &ValueKind::Int).unwrap(),
        Value::Int(-1)
    );
}

#[test]
fn test_collection_operations_follow_category() {
    let factory = factory();

    let list = factory
        .new_collection(INT_LIST, vec![Value::Int(1), Value::Int(3)])
        .unwrap();
    let descriptor = list.descriptor();
    descriptor.insert(&list, 1, Value::Int(2)).unwrap();
    assert_eq!(ints(&list), vec![1, 2, 3]);
    assert_eq!(descriptor.remove_at(&list, 0).unwrap(), Value::Int(1));
    assert!(descriptor.remove_at(&list, 5).unwrap_err().is_out_of_range());

    let bag = factory.new_collection(INT_BAG, vec![Value::Int(1)]).unwrap();
    let err = bag.descriptor().insert(&bag, 0, Value::Int(0)).unwrap_err();
    assert!(err.is_unsupported());
    assert!(bag.descriptor().remove_at(&bag, 0).unwrap_err().is_unsupported());

    let set = factory
        .new_collection(TEXT_SET, vec![Value::from("a"), Value::from("a"), Value::from("b")])
        .unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(
        set.descriptor().keys(&set).unwrap(),
        vec![IndexKey::from("a"), IndexKey::from("b")]
    );
}

#[test]
fn test_dictionary_operations() {
    let factory = factory();
    let dict = factory
        .new_dictionary(TEXT_INT_DICT, vec![(IndexKey::from("one"), Value::Int(1))])
        .unwrap();
    let descriptor = dict.descriptor();

    let err = descriptor
        .add_entry(&dict, IndexKey::from("one"), Value::Int(11))
        .unwrap_err();
    assert!(matches!(err, DescriptorError::DuplicateKey { .. }));

    descriptor
        .add_entry(&dict, IndexKey::from("two"), Value::Int(2))
        .unwrap();
    assert_eq!(
        descriptor.get_item(&dict, &IndexKey::from("two")).unwrap(),
        Value::Int(2)
    );
    assert_eq!(
        descriptor.remove_entry(&dict, &IndexKey::from("one")).unwrap(),
        Value::Int(1)
    );
    assert!(
        descriptor
            .get_item(&dict, &IndexKey::from("one"))
            .unwrap_err()
            .is_not_found()
    );

    let err = descriptor
        .add_entry(&dict, IndexKey::Int(3), Value::Int(3))
        .unwrap_err();
    assert!(err.is_type_error());
}

#[test]
fn test_arrays_are_fixed_length() {
    let factory = factory();
    let array = factory
        .new_collection(FLOAT_ARRAY, vec![Value::Int(1), Value::Float(2.5)])
        .unwrap();
    let descriptor = array.descriptor();

    assert_eq!(array.items(), vec![Value::Float(1.0), Value::Float(2.5)]);
    assert!(descriptor.add(&array, Value::Float(3.0)).unwrap_err().is_unsupported());
    descriptor
        .set_item(&array, &IndexKey::Int(0), Value::Int(7))
        .unwrap();
    assert_eq!(array.items()[0], Value::Float(7.0));
}
