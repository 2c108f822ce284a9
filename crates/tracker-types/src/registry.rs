//! Registry trait for self-registering implementations.
//!
//! Each pluggable backend (storage, notifier) provides a Registry struct
//! implementing this trait, tying its configuration name to a factory
//! function.

/// Base trait for implementation registries.
///
/// Every backend module declares the name used to reference it in
/// configuration files and a factory that builds it from its TOML
/// section.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation.
	///
	/// This should match the key used in the TOML configuration, for example
	/// "memory" for storage.implementations.memory.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
