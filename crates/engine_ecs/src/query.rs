//! Component signatures and the system functions that iterate them.
//!
//! A signature is a tuple of component types, `(T1, …, Tn)` with `n` from 1
//! to 6. Closures become systems through [`SystemFn`] (components only) or
//! [`EntitySystemFn`] (entity id and a [`Commands`] buffer first):
//!
//! ```rust
//! use engine_component::{Component, Entity};
//! use engine_ecs::{Commands, Registry};
//!
//! struct Position { x: f32 }
//! impl Component for Position {}
//! struct Velocity { dx: f32 }
//! impl Component for Velocity {}
//!
//! let mut registry = Registry::new();
//! registry.register_component::<Position>();
//! registry.register_component::<Velocity>();
//!
//! registry.add_system("movement", |pos: &mut Position, vel: &mut Velocity| {
//!     pos.x += vel.dx;
//! });
//! registry.add_entity_system(
//!     "cull",
//!     |entity: Entity, commands: &mut Commands, pos: &mut Position| {
//!         if pos.x > 100.0 {
//!             commands.kill(entity);
//!         }
//!     },
//! );
//! ```

use engine_component::{Component, ComponentTypeId, Entity};

use crate::commands::Commands;
use crate::tables::ComponentTables;

/// An ordered tuple of distinct component types.
pub trait ComponentSet: 'static {
    /// Type identifiers in declaration order.
    fn signature() -> Vec<ComponentTypeId>;

    /// Type names in declaration order.
    fn type_names() -> Vec<&'static str>;
}

/// A closure that can run as a system over the component set `Q`.
///
/// Implemented for every `FnMut(&mut T1, …, &mut Tn)`.
pub trait SystemFn<Q: ComponentSet> {
    /// Invoke the closure for every index where all of `Q` is present.
    /// Returns the number of invocations.
    fn run(&mut self, tables: &mut ComponentTables, commands: &mut Commands) -> usize;
}

/// A closure that runs as a system and also receives the matched entity and
/// the deferred command buffer.
///
/// Implemented for every `FnMut(Entity, &mut Commands, &mut T1, …, &mut Tn)`.
pub trait EntitySystemFn<Q: ComponentSet> {
    /// Invoke the closure for every index where all of `Q` is present.
    /// Returns the number of invocations.
    fn run(&mut self, tables: &mut ComponentTables, commands: &mut Commands) -> usize;
}

// Walks indices `0..bound`, re-reading the bound on every step, and evaluates
// `$call` with each table name rebound to the component at that index.
macro_rules! scan {
    ($tables:ident, [$(($ty:ident, $var:ident)),+], |$entity:ident| $call:expr) => {{
        let [$($var),+] = $tables.disjoint_mut(
            [$($ty::component_type_id()),+],
            [$($ty::type_name()),+],
        );
        $(let $var = ComponentTables::typed::<$ty>($var);)+
        let mut fired = 0usize;
        let mut index = 0usize;
        loop {
            let bound = [$($var.len()),+].into_iter().min().unwrap_or(0);
            if index >= bound {
                break;
            }
            if let ($(Some($var),)+) = ($($var.get_mut(index),)+) {
                let $entity = Entity::from_raw(index as u64);
                $call;
                fired += 1;
            }
            index += 1;
        }
        fired
    }};
}

macro_rules! impl_component_set {
    ($(($ty:ident, $var:ident)),+) => {
        impl<$($ty: Component),+> ComponentSet for ($($ty,)+) {
            fn signature() -> Vec<ComponentTypeId> {
                vec![$($ty::component_type_id()),+]
            }

            fn type_names() -> Vec<&'static str> {
                vec![$($ty::type_name()),+]
            }
        }

        impl<Func, $($ty: Component),+> SystemFn<($($ty,)+)> for Func
        where
            Func: FnMut($(&mut $ty),+),
        {
            fn run(&mut self, tables: &mut ComponentTables, _commands: &mut Commands) -> usize {
                let system = self;
                scan!(tables, [$(($ty, $var)),+], |_entity| system($($var),+))
            }
        }

        impl<Func, $($ty: Component),+> EntitySystemFn<($($ty,)+)> for Func
        where
            Func: FnMut(Entity, &mut Commands, $(&mut $ty),+),
        {
            fn run(&mut self, tables: &mut ComponentTables, commands: &mut Commands) -> usize {
                let system = self;
                scan!(tables, [$(($ty, $var)),+], |entity| system(entity, &mut *commands, $($var),+))
            }
        }
    };
}

impl_component_set!((A, a));
impl_component_set!((A, a), (B, b));
impl_component_set!((A, a), (B, b), (C, c));
impl_component_set!((A, a), (B, b), (C, c), (D, d));
impl_component_set!((A, a), (B, b), (C, c), (D, d), (E, e));
impl_component_set!((A, a), (B, b), (C, c), (D, d), (E, e), (F, f));

#[cfg(test)]
mod tests {
    use super::*;

    struct Health(i32);
    impl Component for Health {}

    struct Armor(i32);
    impl Component for Armor {}

    fn tables() -> ComponentTables {
        let mut tables = ComponentTables::new();
        tables.register::<Health>();
        tables.register::<Armor>();
        tables
    }

    #[test]
    fn test_signature_order_is_declaration_order() {
        assert_eq!(
            <(Health, Armor)>::signature(),
            vec![Health::component_type_id(), Armor::component_type_id()]
        );
        assert_ne!(<(Armor, Health)>::signature(), <(Health, Armor)>::signature());
        assert_eq!(<(Health,)>::type_names(), vec![Health::type_name()]);
    }

    #[test]
    fn test_system_fires_only_where_all_present() {
        let mut tables = tables();
        tables.get_mut::<Health>().unwrap().insert_at(0, Health(10));
        tables.get_mut::<Health>().unwrap().insert_at(1, Health(10));
        tables.get_mut::<Armor>().unwrap().insert_at(1, Armor(3));
        tables.get_mut::<Armor>().unwrap().insert_at(4, Armor(3));

        let mut system = |health: &mut Health, armor: &mut Armor| health.0 += armor.0;
        let fired = SystemFn::<(Health, Armor)>::run(&mut system, &mut tables, &mut Commands::new());

        assert_eq!(fired, 1);
        let health = tables.get::<Health>().unwrap();
        assert_eq!(health.get(0).unwrap().0, 10);
        assert_eq!(health.get(1).unwrap().0, 13);
    }

    #[test]
    fn test_entity_system_sees_matched_entity() {
        let mut tables = tables();
        tables.get_mut::<Health>().unwrap().insert_at(3, Health(0));

        let mut seen = Vec::new();
        let mut commands = Commands::new();
        let mut system = |entity: Entity, commands: &mut Commands, health: &mut Health| {
            seen.push(entity);
            if health.0 <= 0 {
                commands.kill(entity);
            }
        };
        let fired = EntitySystemFn::<(Health,)>::run(&mut system, &mut tables, &mut commands);

        assert_eq!(fired, 1);
        assert_eq!(seen, vec![Entity::from_raw(3)]);
        assert_eq!(commands.len(), 1);
    }

    #[test]
    fn test_empty_tables_never_fire() {
        let mut tables = tables();
        let mut calls = 0;
        let mut system = |_: &mut Health, _: &mut Armor| calls += 1;
        let fired = SystemFn::<(Health, Armor)>::run(&mut system, &mut tables, &mut Commands::new());
        assert_eq!(fired, 0);
        assert_eq!(calls, 0);
    }
}
