use applied_api::{Demo, DemoClass};

// Demo without any attributes
#[derive(DemoClass, Default)]
struct PlainDemo;

// Demo with an explicit version
#[derive(DemoClass, Default)]
#[demo(version = 1.1)]
struct VersionedDemo;

// Demo with a custom registry name
#[derive(DemoClass, Default)]
#[demo(name = "custom-name")]
struct NamedDemo {
    _runs: u32,
}

// Demo with all options
#[derive(DemoClass)]
#[demo(name = "complete", version = 2.5)]
enum CompleteDemo {
    #[allow(dead_code)]
    Fast,
}

// Generic demo
#[derive(DemoClass, Default)]
#[demo(version = 0.5)]
struct GenericDemo<T: Default> {
    _value: T,
}

impl Demo for VersionedDemo {
    fn demo(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_demo_defaults() {
        assert_eq!(PlainDemo::demo_name(), "PlainDemo");
        assert_eq!(PlainDemo::demo_version(), 0.0);
    }

    #[test]
    fn test_versioned_demo() {
        assert_eq!(VersionedDemo::demo_name(), "VersionedDemo");
        assert_eq!(VersionedDemo::demo_version(), 1.1);
        assert!(VersionedDemo.demo().is_ok());
    }

    #[test]
    fn test_named_demo() {
        assert_eq!(NamedDemo::demo_name(), "custom-name");
        assert_eq!(NamedDemo::demo_version(), 0.0);
    }

    #[test]
    fn test_complete_demo() {
        assert_eq!(CompleteDemo::demo_name(), "complete");
        assert_eq!(CompleteDemo::demo_version(), 2.5);
    }

    #[test]
    fn test_generic_demo() {
        assert_eq!(GenericDemo::<String>::demo_name(), "GenericDemo");
        assert_eq!(GenericDemo::<u8>::demo_version(), 0.5);
    }
}
