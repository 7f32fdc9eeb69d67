//! Demos bundled with the `applied-demo` binary.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::ensure;
use chrono::Utc;
use tracing::info;

use applied_api::{Applied, Container, Demo, DemoClass};

use crate::collection::{AppliedList, AppliedQueue, AppliedSet};
use crate::config::ExecutorConfig;
use crate::date;
use crate::demo::DemoRegistry;
use crate::keyed::KeyedFunctionExecutor;

/// Registry holding every bundled demo, each built with `config`.
pub fn bundled(config: &ExecutorConfig) -> DemoRegistry {
    let mut registry = DemoRegistry::new();

    let c = config.clone();
    registry.register_with(move || KeyedExecutorDemo { config: c.clone() });
    let c = config.clone();
    registry.register_with(move || AppliedQueueDemo { config: c.clone() });
    let c = config.clone();
    registry.register_with(move || AppliedSetDemo { config: c.clone() });
    let c = config.clone();
    registry.register_with(move || AppliedListDemo { config: c.clone() });
    registry.register::<DateUtilsDemo>();

    registry
}

fn collector<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(T) + Send + Sync + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let push = move |value: T| {
        sink.lock().unwrap_or_else(PoisonError::into_inner).push(value);
    };
    (seen, push)
}

fn collected<T: Clone>(seen: &Arc<Mutex<Vec<T>>>) -> Vec<T> {
    seen.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Coalesces one value per letter through a keyed executor.
#[derive(Debug, Default, DemoClass)]
#[demo(name = "keyed-executor", version = 1.1)]
pub struct KeyedExecutorDemo {
    config: ExecutorConfig,
}

impl Demo for KeyedExecutorDemo {
    fn demo(&self) -> anyhow::Result<()> {
        let executor = KeyedFunctionExecutor::with_config(self.config.clone())?;
        let (seen, sink) = collector::<String>();
        let sink = Arc::new(sink);

        for letter in 'a'..='z' {
            let sink = sink.clone();
            let key = letter.to_string();
            executor.process(move |v| sink(v), &key, key.to_uppercase())?;
        }
        executor.close();

        let mut values = collected(&seen);
        values.sort();
        info!(count = values.len(), "processed: {}", values.join(""));
        ensure!(values.len() == 26, "expected 26 values, got {}", values.len());
        Ok(())
    }
}

/// Retains part of a queue and reports the survivors.
#[derive(Debug, Default, DemoClass)]
#[demo(name = "applied-queue", version = 1.2)]
pub struct AppliedQueueDemo {
    config: ExecutorConfig,
}

impl Demo for AppliedQueueDemo {
    fn demo(&self) -> anyhow::Result<()> {
        let queue = AppliedQueue::with_config(self.config.clone())?;
        for value in ["value 1", "value 2", "value 3"] {
            queue.offer(value.to_string());
        }

        let (seen, sink) = collector::<String>();
        let changed = queue.retain_all_and_apply(
            &["value 1".to_string(), "value 3".to_string()],
            sink,
            || info!("retain pass finished"),
        )?;
        queue.wait_for_consumers();

        let head = queue.poll_and_apply(|v| info!("polled {}", v))?;
        queue.close();

        info!(changed, retained = ?collected(&seen), head = ?head, "applied queue");
        ensure!(changed, "retain should have removed \"value 2\"");
        Ok(())
    }
}

/// Adds and removes set members, then shows an immutable set.
#[derive(Debug, Default, DemoClass)]
#[demo(name = "applied-set", version = 1.2)]
pub struct AppliedSetDemo {
    config: ExecutorConfig,
}

impl Demo for AppliedSetDemo {
    fn demo(&self) -> anyhow::Result<()> {
        let set = AppliedSet::with_config(self.config.clone())?;
        set.add_all(["red", "green", "blue"])?;

        let (seen, sink) = collector::<&'static str>();
        let removed = set.remove_and_apply("green", sink)?;
        set.add_if("yellow", |c| c.len() > 4)?;
        set.close();

        info!(removed, removed_values = ?collected(&seen), size = set.len(), "applied set");

        let fixed = AppliedSet::of(["one", "two"])?;
        match fixed.add("three") {
            Ok(_) => anyhow::bail!("immutable set accepted an element"),
            Err(e) => info!("immutable set rejected an element: {}", e),
        }
        Ok(())
    }
}

/// Index-based removal from a list.
#[derive(Debug, Default, DemoClass)]
#[demo(name = "applied-list", version = 1.2)]
pub struct AppliedListDemo {
    config: ExecutorConfig,
}

impl Demo for AppliedListDemo {
    fn demo(&self) -> anyhow::Result<()> {
        let list = AppliedList::with_config(self.config.clone())?;
        list.add_all([1, 2, 4])?;
        list.insert(2, 3)?;

        let (seen, sink) = collector::<i32>();
        let removed = list.remove_at_and_apply(0, sink)?;
        list.consume(|v| info!("element {}", v), || info!("consume pass finished"))?;
        list.close();

        info!(removed, applied = ?collected(&seen), remaining = ?list.to_vec(), "applied list");
        ensure!(list.to_vec() == vec![2, 3, 4], "unexpected list contents");
        Ok(())
    }
}

/// Formats the current time and parses it back.
#[derive(Debug, Default, DemoClass)]
#[demo(name = "date-utils", version = 1.3)]
pub struct DateUtilsDemo;

impl Demo for DateUtilsDemo {
    fn demo(&self) -> anyhow::Result<()> {
        let now = Utc::now();
        let text = date::date_to_string(&now);
        let parsed = date::date_from_string(&text)?;
        info!("now: {} (parsed back as {})", text, parsed);

        let custom = date::date_to_string_with(&now, "%A, %d %B %Y")?;
        info!("custom: {}", custom);

        ensure!(
            (now - parsed).num_milliseconds() == 0,
            "round trip lost precision"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_names() {
        let registry = bundled(&ExecutorConfig::with_workers(2));
        assert_eq!(
            registry.names(),
            vec!["keyed-executor", "applied-queue", "applied-set", "applied-list", "date-utils"]
        );
        assert_eq!(registry.demo_class_version("date-utils").unwrap(), 1.3);
    }

    #[test]
    fn test_every_bundled_demo_runs() {
        let registry = bundled(&ExecutorConfig::with_workers(2));
        for name in registry.names() {
            registry.run_demo(name).unwrap();
        }
    }
}
