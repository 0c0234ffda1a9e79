//! # engine_component
//!
//! The "E" and "C" in ECS: entity identity and per-type component storage.
//!
//! This crate provides:
//!
//! - [`Component`] trait: the marker all attachable data implements.
//! - [`Entity`]: lightweight recyclable entity indices.
//! - [`EntityAllocator`]: index allocator with a free list.
//! - [`SparseArray`]: dense, optionally populated storage for one type.
//! - [`ErasedStorage`]: the type-erased handle the registry stores tables behind.

pub mod component;
pub mod entity;
pub mod sparse;
pub mod storage;

pub use component::{Component, ComponentTypeId};
pub use entity::{Entity, EntityAllocator};
pub use sparse::SparseArray;
pub use storage::ErasedStorage;
