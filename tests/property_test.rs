mod common;

use std::sync::Arc;

use common::ns;
use dblang::memory::{ItemGroup, MemoryGroup, MemoryItem, MemoryProperty, MemoryStack};
use dblang::object::DataObject;
use dblang::types::{TypeDecl, TypeRef, TypeRegistry};
use proptest::prelude::*;

/// Chain `T0 <- T1 <- ...`, each level declaring its own public and private keys.
fn build_chain(levels: &[(Vec<String>, Vec<String>)]) -> (TypeRegistry, Vec<TypeRef>) {
    let mut types = TypeRegistry::new();
    let int = types
        .define_type(TypeDecl::new(ns("Core.Int")).bind::<i64>())
        .unwrap();
    let mut chain = Vec::new();
    for (depth, (public, private)) in levels.iter().enumerate() {
        let mut decl = TypeDecl::new(ns(&format!("Chain.T{}", depth)));
        if let Some(parent) = chain.last() {
            decl = decl.parent(*parent);
        }
        for key in public {
            decl = decl.public(MemoryProperty::new(format!("{}_{}", key, depth), int));
        }
        for key in private {
            decl = decl.private(MemoryProperty::new(format!("{}_{}p", key, depth), int));
        }
        chain.push(types.define_type(decl).unwrap());
    }
    (types, chain)
}

fn arb_levels() -> impl Strategy<Value = Vec<(Vec<String>, Vec<String>)>> {
    proptest::collection::vec(
        (
            proptest::collection::hash_set("[a-d]", 0..3).prop_map(|s| s.into_iter().collect()),
            proptest::collection::hash_set("[a-d]", 0..3).prop_map(|s| s.into_iter().collect()),
        ),
        1..5,
    )
}

proptest! {
    #[test]
    fn prop_inheritance_is_monotone(levels in arb_levels()) {
        let (types, chain) = build_chain(&levels);
        for pair in chain.windows(2) {
            let parent = types.concrete(pair[0]).unwrap();
            let child = types.concrete(pair[1]).unwrap();
            for property in parent.public_properties() {
                prop_assert!(child.public_properties().contains(property));
            }
            for property in parent.private_properties() {
                prop_assert!(child.private_properties().contains(property));
            }
            prop_assert!(types.is(pair[1], pair[0]));
            prop_assert!(!types.is(pair[0], pair[1]));
        }
        for t in &chain {
            prop_assert!(types.is(*t, *t));
        }
    }

    #[test]
    fn prop_duplicate_key_always_rejected(key in "[a-z]{1,6}", private_first in any::<bool>()) {
        let mut types = TypeRegistry::new();
        let int = types.define_type(TypeDecl::new(ns("Core.Int")).bind::<i64>()).unwrap();
        let a = MemoryProperty::new(key.clone(), int);
        let b = MemoryProperty::new(key, int);
        let decl = if private_first {
            TypeDecl::new(ns("Dup.T")).private(a).public(b)
        } else {
            TypeDecl::new(ns("Dup.T")).public(a).public(b)
        };
        prop_assert!(types.define_type(decl).is_err());
    }

    #[test]
    fn prop_rejected_set_leaves_item_untouched(initial in any::<i64>()) {
        let mut types = TypeRegistry::new();
        let int = types.define_type(TypeDecl::new(ns("Core.Int")).bind::<i64>()).unwrap();
        let string = types.define_type(TypeDecl::new(ns("Core.String")).bind::<String>()).unwrap();
        let types = Arc::new(types);

        let item = MemoryItem::new(MemoryProperty::new("n", int));
        let value = DataObject::new(&types, int).unwrap();
        value.set_bound(initial).unwrap();
        prop_assert!(item.set(value));

        let wrong = DataObject::new(&types, string).unwrap();
        prop_assert!(!item.set(wrong));
        let stored = item.value().unwrap();
        prop_assert_eq!(*stored.get_bound::<i64>().unwrap().unwrap(), initial);
    }

    #[test]
    fn prop_stack_keys_stay_disjoint(layers in proptest::collection::vec(
        proptest::collection::hash_set("[a-h]", 1..4), 1..6)
    ) {
        let mut types = TypeRegistry::new();
        let int = types.define_type(TypeDecl::new(ns("Core.Int")).bind::<i64>()).unwrap();
        let stack = MemoryStack::new();
        for keys in layers {
            let layer = Arc::new(ItemGroup::fixed(
                keys.iter().map(|k| MemoryProperty::new(k.as_str(), int)),
            ));
            let depth = stack.depth();
            if !stack.push(layer) {
                prop_assert_eq!(stack.depth(), depth);
            }
        }
        let mut names = stack.key_names();
        let total = names.len();
        names.sort();
        names.dedup();
        prop_assert_eq!(names.len(), total);
    }
}
