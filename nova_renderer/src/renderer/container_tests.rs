use crate::renderer::container::ResourceContainer;
use crate::renderer::handle::{tags, Handle};

type Container = ResourceContainer<tags::Buffer, String>;

#[test]
fn test_add_then_get_returns_same_object() {
    let mut c = Container::new();
    let a = c.add("alpha".to_string());
    let b = c.add("beta".to_string());

    assert_eq!(c.get(a), "alpha");
    assert_eq!(c.get(b), "beta");
    assert_eq!(c.len(), 2);
}

#[test]
fn test_handles_are_one_based() {
    let mut c = Container::new();
    let first = c.add("x".to_string());
    assert_eq!(first.raw(), 1);
    assert!(first.is_valid());
    assert!(!Handle::<tags::Buffer>::EMPTY.is_valid());
}

#[test]
fn test_get_mut_mutates_in_place() {
    let mut c = Container::new();
    let h = c.add("old".to_string());
    *c.get_mut(h) = "new".to_string();
    assert_eq!(c.get(h), "new");
}

#[test]
#[should_panic(expected = "use of removed resource slot")]
fn test_get_after_remove_panics() {
    let mut c = Container::new();
    let h = c.add("gone".to_string());
    c.remove(h);
    c.get(h);
}

#[test]
#[should_panic(expected = "out of range")]
fn test_get_never_allocated_panics() {
    let c = Container::new();
    c.get(Handle::from_raw(7));
}

#[test]
#[should_panic(expected = "empty handle")]
fn test_get_empty_handle_panics() {
    let c = Container::new();
    c.get(Handle::EMPTY);
}

#[test]
#[should_panic(expected = "double remove")]
fn test_double_remove_panics() {
    let mut c = Container::new();
    let h = c.add("once".to_string());
    c.remove(h);
    c.remove(h);
}

#[test]
fn test_removed_index_not_reused_before_recycle() {
    let mut c = Container::new();
    let a = c.add("a".to_string());
    c.remove(a);

    // Without a recycle step, the freed index must not be re-issued.
    let b = c.add("b".to_string());
    assert_ne!(a.raw(), b.raw());
}

#[test]
fn test_recycle_makes_index_reusable() {
    let mut c = Container::new();
    let a = c.add("a".to_string());
    c.remove(a);
    c.recycle();

    let b = c.add("b".to_string());
    assert_eq!(a.raw(), b.raw());
    assert_eq!(c.get(b), "b");
}

#[test]
fn test_contains() {
    let mut c = Container::new();
    let h = c.add("here".to_string());
    assert!(c.contains(h));
    assert!(!c.contains(Handle::EMPTY));
    assert!(!c.contains(Handle::from_raw(42)));

    c.remove(h);
    assert!(!c.contains(h));
}

#[test]
fn test_clear_with_visits_every_live_element() {
    let mut c = Container::new();
    c.add("a".to_string());
    let b = c.add("b".to_string());
    c.add("c".to_string());
    c.remove(b);

    let mut seen = Vec::new();
    c.clear_with(|s| seen.push(s));
    seen.sort();
    assert_eq!(seen, vec!["a".to_string(), "c".to_string()]);
    assert!(c.is_empty());
}

#[test]
fn test_grows_to_demand() {
    let mut c = Container::new();
    let handles: Vec<_> = (0..1000).map(|i| c.add(format!("r{}", i))).collect();
    assert_eq!(c.len(), 1000);
    for (i, h) in handles.iter().enumerate() {
        assert_eq!(c.get(*h), &format!("r{}", i));
    }
}

#[test]
fn test_iter_skips_removed() {
    let mut c = Container::new();
    let a = c.add("a".to_string());
    let b = c.add("b".to_string());
    c.remove(a);

    let live: Vec<_> = c.iter().collect();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].0, b);
}
