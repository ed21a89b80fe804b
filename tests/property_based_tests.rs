mod common;

use command_core::{CommandEngine, CommandInstance, RequestContext};
use common::{UncachedParity, UsingRequestCache};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

proptest! {
    /// Property: a command without a cache key never produces a cache hit
    #[test]
    fn uncached_commands_never_hit(value in any::<i64>(), repeats in 1usize..8) {
        let engine = CommandEngine::default();
        let context = RequestContext::new();
        let scope = context.initialize().unwrap();
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..repeats {
            let instance = CommandInstance::new(UncachedParity { value, runs: Arc::clone(&runs) });
            let result = engine.execute_blocking(&instance, Some(&scope)).unwrap();
            prop_assert_eq!(result, value % 2 == 0);
            prop_assert!(!instance.is_response_from_cache());
        }

        prop_assert_eq!(runs.load(Ordering::SeqCst), repeats);
        scope.shutdown().unwrap();
    }

    /// Property: the first invocation of a key misses and every later one hits with the same value
    #[test]
    fn cached_commands_hit_after_first(values in prop::collection::vec(-1000i64..1000, 1..20)) {
        let engine = CommandEngine::default();
        let context = RequestContext::new();
        let scope = context.initialize().unwrap();
        let mut seen = std::collections::HashMap::new();

        for value in values {
            let instance = CommandInstance::new(UsingRequestCache::new(value));
            let result = engine.execute_blocking(&instance, Some(&scope)).unwrap();
            prop_assert_eq!(result, value % 2 == 0);

            match seen.get(&value) {
                Some(previous) => {
                    prop_assert!(instance.is_response_from_cache());
                    prop_assert_eq!(*previous, result);
                }
                None => {
                    prop_assert!(!instance.is_response_from_cache());
                    seen.insert(value, result);
                }
            }
        }

        prop_assert_eq!(scope.cache().len(), seen.len());
        scope.shutdown().unwrap();
    }
}
