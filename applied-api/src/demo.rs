//! # Demo Capability
//!
//! A demo is a self-contained program that exercises part of the library. Demos
//! declare a display name and version through [`DemoClass`], usually derived:
//!
//! ```rust
//! use applied_api::{Demo, DemoClass};
//!
//! #[derive(Default, DemoClass)]
//! #[demo(name = "greeting", version = 1.2)]
//! struct GreetingDemo;
//!
//! impl Demo for GreetingDemo {
//!     fn demo(&self) -> anyhow::Result<()> {
//!         tracing::info!("hello");
//!         Ok(())
//!     }
//! }
//!
//! assert_eq!(GreetingDemo::demo_name(), "greeting");
//! assert_eq!(GreetingDemo::demo_version(), 1.2);
//! ```

/// Something that can be run as a demo.
pub trait Demo: Send {
    /// Runs the demo.
    fn demo(&self) -> anyhow::Result<()>;
}

/// Static metadata describing a demo type.
pub trait DemoClass {
    /// Name the demo is registered and selected under.
    fn demo_name() -> &'static str;

    /// Declared version, or `0.0` when the type declares none.
    fn demo_version() -> f64;
}
