//! Core [`Component`] trait and its type identity.
//!
//! Every piece of data attached to an entity implements [`Component`]. There
//! is no common base type: a component is any `'static` value, identified by
//! a [`ComponentTypeId`] derived from its type name.
//!
//! ## Type Identity
//!
//! [`ComponentTypeId`] is the FNV-1a 64-bit hash of the component's name.
//! The hash is deterministic across builds and processes, so it can be logged
//! and compared between the transport side and the simulation side.

/// A unique identifier for a component type, derived from its name using the
/// FNV-1a 64-bit hash algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(pub u64);

impl ComponentTypeId {
    /// FNV-1a 64-bit offset basis.
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

    /// FNV-1a 64-bit prime.
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Compute the [`ComponentTypeId`] from a component name.
    ///
    /// # Algorithm (FNV-1a 64-bit)
    ///
    /// ```text
    /// hash = 0xcbf29ce484222325          (offset basis)
    /// for each byte in name.as_bytes():
    ///     hash = hash XOR byte
    ///     hash = hash * 0x00000100000001b3  (prime)
    /// return hash
    /// ```
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// Compute the [`ComponentTypeId`] for a Rust component type `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        T::component_type_id()
    }
}

impl std::fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// The core component trait.
///
/// Implementations usually only need an empty `impl` block; the name defaults
/// to the fully qualified Rust type name.
///
/// # Examples
///
/// ```rust
/// use engine_component::Component;
///
/// #[derive(Debug, Clone)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {}
///
/// assert!(Health::type_name().ends_with("Health"));
/// ```
pub trait Component: 'static {
    /// A human-readable name for this component type.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the [`ComponentTypeId`] for this component.
    fn component_type_id() -> ComponentTypeId {
        ComponentTypeId::from_name(Self::type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Health {
        current: f32,
        max: f32,
    }

    impl Component for Health {}

    #[derive(Debug, Clone)]
    struct Velocity {
        _x: f32,
    }

    impl Component for Velocity {
        fn type_name() -> &'static str {
            "Velocity"
        }
    }

    #[test]
    fn test_component_type_id_is_stable() {
        assert_eq!(Health::component_type_id(), Health::component_type_id());
    }

    #[test]
    fn test_component_type_id_matches_from_name() {
        assert_eq!(
            Velocity::component_type_id(),
            ComponentTypeId::from_name("Velocity")
        );
        assert_eq!(ComponentTypeId::of::<Velocity>(), Velocity::component_type_id());
    }

    #[test]
    fn test_component_type_id_differs_between_types() {
        assert_ne!(Health::component_type_id(), Velocity::component_type_id());
    }

    #[test]
    fn test_default_type_name_is_rust_path() {
        assert!(Health::type_name().ends_with("Health"));
        assert!(Health::type_name().contains("::"));
    }

    #[test]
    fn test_fnv1a_known_vector() {
        // FNV-1a 64-bit of the empty string is the offset basis itself.
        assert_eq!(
            ComponentTypeId::from_name(""),
            ComponentTypeId(0xcbf2_9ce4_8422_2325)
        );
        assert_eq!(
            ComponentTypeId::from_name("a"),
            ComponentTypeId(0xaf63_dc4c_8601_ec8c)
        );
    }

    #[test]
    fn test_display_is_hex() {
        assert_eq!(ComponentTypeId(0xff).to_string(), "0x00000000000000ff");
    }
}
