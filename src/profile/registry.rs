//! Profile storage keyed by (request type, entity type)

use super::Profile;
use crate::errors::CrudError;
use crate::request::CrudRequest;
use crate::request_config::RequestConfig;
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// All profiles known to an engine
///
/// Several profiles may target the same pair; they are merged in the order
/// they were added.
#[derive(Default)]
pub struct ProfileRegistry {
    profiles: HashMap<(TypeId, TypeId), Box<dyn Any + Send + Sync>>,
}

impl std::fmt::Debug for ProfileRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileRegistry")
            .field("pairs", &self.profiles.len())
            .finish()
    }
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<R, E>(&mut self, profile: Profile<R, E>)
    where
        R: ?Sized + Sync + 'static,
        E: ?Sized + Send + 'static,
    {
        crate::trace_log!(
            "Adding profile for ({}, {})",
            std::any::type_name::<R>(),
            std::any::type_name::<E>()
        );
        let slot = self
            .profiles
            .entry((TypeId::of::<R>(), TypeId::of::<E>()))
            .or_insert_with(|| Box::new(Vec::<Profile<R, E>>::new()));
        if let Some(list) = slot.downcast_mut::<Vec<Profile<R, E>>>() {
            list.push(profile);
        }
    }

    /// Profiles registered for exactly the pair `(R, E)`
    pub fn profiles<R, E>(&self) -> &[Profile<R, E>]
    where
        R: ?Sized + Sync + 'static,
        E: ?Sized + Send + 'static,
    {
        self.profiles
            .get(&(TypeId::of::<R>(), TypeId::of::<E>()))
            .and_then(|slot| slot.downcast_ref::<Vec<Profile<R, E>>>())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Merge every profile along the lineage of `R` and its entity
    pub fn build<R: CrudRequest>(&self) -> Result<RequestConfig<R>, CrudError> {
        super::merge::merge::<R>(self)
    }
}
