// Public API surface of the bindings module.
pub mod binding;
pub mod constants;
pub mod overrides;
