//! Registry error types.

use engine_component::ComponentTypeId;

/// Errors reported by fallible registry lookups.
///
/// The panicking accessors on [`Registry`](crate::Registry) format these same
/// values into their panic message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The component type was never passed to `register_component`.
    #[error("component type `{name}` ({type_id}) is not registered")]
    Unregistered {
        /// Name of the requested component type.
        name: &'static str,
        /// Its type identifier.
        type_id: ComponentTypeId,
    },

    /// A table exists under this type id but holds a different Rust type.
    #[error("component table {type_id} holds `{stored}`, not `{requested}`")]
    TypeMismatch {
        /// The type identifier both names hash to.
        type_id: ComponentTypeId,
        /// Name of the type stored in the table.
        stored: &'static str,
        /// Name of the type that was requested.
        requested: &'static str,
    },
}
