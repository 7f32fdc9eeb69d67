use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use applied::prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) + Send + Sync + Clone + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |v: &'static str| sink.lock().unwrap().push(v))
    }

    fn sorted(seen: &Arc<Mutex<Vec<&'static str>>>) -> Vec<&'static str> {
        let mut values = seen.lock().unwrap().clone();
        values.sort();
        values
    }

    #[test]
    fn test_add_and_duplicates() {
        let set = AppliedSet::<&str>::with_workers(2).unwrap();

        assert!(set.add("a").unwrap());
        assert!(!set.add("a").unwrap());
        assert!(set.add_all(["b", "c"]).unwrap());
        assert!(!set.add_all(["a", "b"]).unwrap());

        assert_eq!(set.len(), 3);
        assert!(set.contains_all(&["a", "b", "c"]));
        set.close();
    }

    // A filter that rejects reports success; a duplicate the set declines does not
    #[test]
    fn test_add_if() {
        let set = AppliedSet::<&str>::with_workers(1).unwrap();

        assert!(set.add_if("long", |v| v.len() > 3).unwrap());
        assert!(set.add_if("no", |v| v.len() > 3).unwrap());
        assert!(!set.add_if("long", |_| true).unwrap());

        assert!(set.contains(&"long"));
        assert!(!set.contains(&"no"));
        set.close();
    }

    #[test]
    fn test_remove_and_apply() {
        let set = AppliedSet::<&str>::with_workers(2).unwrap();
        set.add_all(["x", "y"]).unwrap();
        let (seen, collect) = recorder();

        assert!(set.remove_and_apply("x", collect.clone()).unwrap());
        // The callback fires even for a value that was not present
        assert!(!set.remove_and_apply("absent", collect.clone()).unwrap());
        assert!(!set.remove_if_and_apply("y", |_| false, collect.clone()).unwrap());
        assert!(set.remove_if_and_apply("y", |v| v.starts_with('y'), collect).unwrap());
        set.close();

        assert!(set.is_empty());
        assert_eq!(sorted(&seen), vec!["absent", "x", "y"]);
    }

    #[test]
    fn test_clear_and_retain() {
        let set = AppliedSet::<&str>::with_workers(2).unwrap();
        set.add_all(["a", "b", "c", "d"]).unwrap();
        let (seen, collect) = recorder();

        assert!(set.retain_all_and_apply(&["a", "c"], collect.clone(), || {}).unwrap());
        set.wait_for_consumers();
        assert_eq!(sorted(&seen), vec!["a", "c"]);
        assert_eq!(set.to_vec().into_iter().collect::<HashSet<_>>(), HashSet::from(["a", "c"]));

        seen.lock().unwrap().clear();
        set.clear_and_apply(collect, || {}).unwrap();
        set.close();

        assert!(set.is_empty());
        assert_eq!(sorted(&seen), vec!["a", "c"]);
    }

    #[test]
    fn test_immutable_set() {
        let set = AppliedSet::of(["a", "b"]).unwrap();
        let (seen, collect) = recorder();

        assert!(set.is_immutable());
        assert_eq!(set.len(), 2);
        assert!(matches!(set.add("c"), Err(AppliedError::Unsupported(_))));
        assert!(matches!(set.remove(&"a"), Err(AppliedError::Unsupported(_))));
        assert!(matches!(set.clear_and_apply(collect.clone(), || {}), Err(AppliedError::Unsupported(_))));
        assert!(matches!(
            set.retain_all_and_apply(&["a"], collect.clone(), || {}),
            Err(AppliedError::Unsupported(_))
        ));
        // Retaining everything removes nothing, so only callbacks are scheduled
        assert!(!set.retain_all_and_apply(&["a", "b"], collect, || {}).unwrap());
        set.close();

        assert_eq!(set.len(), 2);
        assert_eq!(sorted(&seen), vec!["a", "b"]);

        let empty = AppliedSet::<u8>::of([]).unwrap();
        assert!(empty.is_empty());
        assert!(empty.is_immutable());
    }
}
