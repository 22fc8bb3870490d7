//! # Store Registry
//!
//! One type-erased store per [`ComponentKind`], built once when the world is
//! constructed and never resized afterwards.

use std::any::type_name;

use super::component::Component;
use super::error::{EcsError, EcsResult};
use super::kind::ComponentKind;
use super::storage::{ErasedStore, Store};
use crate::components::{
    AudioListener, AudioSource, Camera, Collider, Constraint, Light, Renderable, RigidBody,
    Script, Skybox, Transform,
};

/// Runtime map from variant tag to its store.
///
/// Stores are kept in declaration order, so iterating the registry visits
/// Transform first and Camera last.
pub struct StoreRegistry {
    /// Indexed by `ComponentKind::tag()`.
    stores: Vec<Box<dyn ErasedStore>>,
}

impl StoreRegistry {
    /// Registers a store for every variant, each pre-sized for `capacity`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        fn boxed<T: Component>(capacity: usize) -> Box<dyn ErasedStore> {
            Box::new(Store::<T>::with_capacity(capacity))
        }

        let stores = ComponentKind::ALL
            .into_iter()
            .map(|kind| match kind {
                ComponentKind::Transform => boxed::<Transform>(capacity),
                ComponentKind::AudioSource => boxed::<AudioSource>(capacity),
                ComponentKind::AudioListener => boxed::<AudioListener>(capacity),
                ComponentKind::Constraint => boxed::<Constraint>(capacity),
                ComponentKind::Collider => boxed::<Collider>(capacity),
                ComponentKind::RigidBody => boxed::<RigidBody>(capacity),
                ComponentKind::Light => boxed::<Light>(capacity),
                ComponentKind::Renderable => boxed::<Renderable>(capacity),
                ComponentKind::Script => boxed::<Script>(capacity),
                ComponentKind::Skybox => boxed::<Skybox>(capacity),
                ComponentKind::Camera => boxed::<Camera>(capacity),
            })
            .collect();

        Self { stores }
    }

    /// Returns the type-erased store for `kind`.
    #[inline]
    #[must_use]
    pub fn get(&self, kind: ComponentKind) -> Option<&(dyn ErasedStore + 'static)> {
        self.stores.get(kind.tag() as usize).map(|store| &**store)
    }

    /// Returns the type-erased store for `kind`, mutably.
    #[inline]
    pub fn get_mut(&mut self, kind: ComponentKind) -> Option<&mut (dyn ErasedStore + 'static)> {
        self.stores.get_mut(kind.tag() as usize).map(|store| &mut **store)
    }

    /// Returns the typed store for `T`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::StoreNotRegistered`] if no store exists for
    /// `T::KIND`, or [`EcsError::KindMismatch`] if that store holds another
    /// type.
    pub fn store<T: Component>(&self) -> EcsResult<&Store<T>> {
        self.get(T::KIND)
            .ok_or(EcsError::StoreNotRegistered(T::KIND))?
            .as_any()
            .downcast_ref::<Store<T>>()
            .ok_or(EcsError::KindMismatch {
                kind: T::KIND,
                requested: type_name::<T>(),
            })
    }

    /// Returns the typed store for `T`, mutably.
    ///
    /// # Errors
    ///
    /// Same as [`StoreRegistry::store`].
    pub fn store_mut<T: Component>(&mut self) -> EcsResult<&mut Store<T>> {
        self.get_mut(T::KIND)
            .ok_or(EcsError::StoreNotRegistered(T::KIND))?
            .as_any_mut()
            .downcast_mut::<Store<T>>()
            .ok_or(EcsError::KindMismatch {
                kind: T::KIND,
                requested: type_name::<T>(),
            })
    }

    /// Iterates stores in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &(dyn ErasedStore + 'static)> {
        self.stores.iter().map(|store| &**store)
    }

    /// Iterates stores mutably in declaration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (dyn ErasedStore + 'static)> {
        self.stores.iter_mut().map(|store| &mut **store)
    }

    /// Total number of records across all stores.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.stores.iter().map(|store| store.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_has_a_store_in_order() {
        let registry = StoreRegistry::new(4);
        let kinds: Vec<_> = registry.iter().map(|store| store.kind()).collect();
        assert_eq!(kinds, ComponentKind::ALL.to_vec());
        assert_eq!(registry.record_count(), 0);
    }

    #[test]
    fn test_typed_lookup() {
        let mut registry = StoreRegistry::new(4);
        assert!(registry.store::<Light>().is_ok());
        assert_eq!(registry.store_mut::<Camera>().unwrap().kind(), ComponentKind::Camera);
        assert_eq!(
            registry.get(ComponentKind::Skybox).unwrap().kind(),
            ComponentKind::Skybox
        );
    }
}
