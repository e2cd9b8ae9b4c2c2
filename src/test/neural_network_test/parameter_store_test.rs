use super::*;
use std::sync::Arc;
use std::thread;

#[test]
fn get_or_create_returns_the_same_parameter_test() {
    let store = ParameterStore::new(Some(42));
    let first = store
        .get_or_create("w", &[3, 4], &Initializer::default())
        .unwrap();

    // A different initializer is ignored once the parameter exists
    let second = store
        .get_or_create("w", &[3, 4], &Initializer::Constant(9.0))
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(store.len(), 1);
    assert_eq!(store.param_count(), 12);
    assert!(store.contains("w"));
    assert!(!store.contains("b"));
}

#[test]
fn get_or_create_shape_mismatch_test() {
    let store = ParameterStore::new(Some(1));
    store
        .get_or_create("lstm_weight/direction", &[5, 8], &Initializer::default())
        .unwrap();

    let result = store.get_or_create("lstm_weight/direction", &[6, 8], &Initializer::default());
    match result {
        Err(ModelError::ParameterShapeMismatch {
            name,
            expected,
            found,
        }) => {
            assert_eq!(name, "lstm_weight/direction");
            assert_eq!(expected, vec![6, 8]);
            assert_eq!(found, vec![5, 8]);
        }
        other => panic!("expected ParameterShapeMismatch, got {:?}", other.map(|_| ())),
    }

    // Nothing was recreated
    assert_eq!(store.get("lstm_weight/direction").unwrap().shape(), &[5, 8]);
}

#[test]
fn assign_test() {
    let store = ParameterStore::new(Some(1));
    store
        .get_or_create("b", &[3], &Initializer::Constant(0.0))
        .unwrap();

    store.assign("b", Tensor::from_elem(IxDyn(&[3]), 2.0)).unwrap();
    assert!(store.get("b").unwrap().iter().all(|v| *v == 2.0));

    let result = store.assign("b", Tensor::zeros(IxDyn(&[4])));
    assert!(matches!(
        result,
        Err(ModelError::ParameterShapeMismatch { .. })
    ));

    // An absent name is inserted
    store.assign("g", Tensor::ones(IxDyn(&[2]))).unwrap();
    assert_eq!(store.names(), vec!["b".to_string(), "g".to_string()]);
}

#[test]
fn names_follow_creation_order_test() {
    let store = ParameterStore::new(Some(1));
    for name in ["z", "a", "m"] {
        store
            .get_or_create(name, &[2], &Initializer::Constant(1.0))
            .unwrap();
    }

    assert_eq!(store.names(), vec!["z", "a", "m"]);
    let snapshot: Vec<String> = store.snapshot().into_iter().map(|(n, _)| n).collect();
    assert_eq!(snapshot, vec!["z", "a", "m"]);
}

#[test]
fn seeded_stores_are_identical_test() {
    let a = ParameterStore::new(Some(7));
    let b = ParameterStore::new(Some(7));
    assert_eq!(a.get_random_seed(), Some(7));
    assert!(a.is_empty());

    for store in [&a, &b] {
        store
            .get_or_create("w1", &[4, 6], &Initializer::default())
            .unwrap();
        store
            .get_or_create("w2", &[3, 3], &Initializer::default())
            .unwrap();
    }

    assert_eq!(a.get("w1"), b.get("w1"));
    assert_eq!(a.get("w2"), b.get("w2"));
}

#[test]
fn concurrent_first_use_creates_once_test() {
    let store = ParameterStore::new(Some(5));

    let results: Vec<Arc<Tensor>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    store
                        .get_or_create("shared", &[8, 16], &Initializer::default())
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(store.len(), 1);
    for value in &results[1..] {
        assert!(Arc::ptr_eq(&results[0], value));
    }
}

#[test]
fn assign_all_is_all_or_nothing_test() {
    let store = ParameterStore::new(Some(2));
    store
        .get_or_create("kept", &[2], &Initializer::Constant(0.0))
        .unwrap();

    // The second entry has the wrong shape, so neither is written
    let result = store.assign_all(vec![
        ("fresh".to_string(), Tensor::ones(IxDyn(&[3]))),
        ("kept".to_string(), Tensor::ones(IxDyn(&[5]))),
    ]);
    assert!(matches!(
        result,
        Err(ModelError::ParameterShapeMismatch { .. })
    ));
    assert!(!store.contains("fresh"));
    assert!(store.get("kept").unwrap().iter().all(|v| *v == 0.0));

    let created = store
        .assign_all(vec![
            ("fresh".to_string(), Tensor::ones(IxDyn(&[3]))),
            ("kept".to_string(), Tensor::ones(IxDyn(&[2]))),
        ])
        .unwrap();
    assert_eq!(created, 1);
    assert_eq!(store.names(), vec!["kept", "fresh"]);
    assert!(store.get("kept").unwrap().iter().all(|v| *v == 1.0));
}
