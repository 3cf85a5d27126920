use crate::{Connection, Entity, EntityDescriptor, Error, Result};
use std::{
    any::TypeId,
    collections::HashMap,
    sync::{Arc, LazyLock, Mutex, PoisonError, RwLock},
};

type PrimaryKeySlot = Arc<Mutex<Option<Arc<[String]>>>>;

static GLOBAL: LazyLock<Arc<Registry>> = LazyLock::new(Default::default);

/// Process wide metadata: entity descriptors and primary keys discovered from the database.
///
/// Entries are never invalidated. The primary key of a `(connection identity,
/// relation)` pair is looked up once: concurrent resolvers of the same pair wait
/// for the first one and reuse its answer. Failed or empty lookups are not stored.
#[derive(Default)]
pub struct Registry {
    descriptors: RwLock<HashMap<TypeId, Arc<EntityDescriptor>>>,
    primary_keys: Mutex<HashMap<(String, String), PrimaryKeySlot>>,
}

impl Registry {
    pub fn new() -> Self {
        Default::default()
    }

    /// The registry shared by every session that was not given its own.
    pub fn global() -> Arc<Registry> {
        GLOBAL.clone()
    }

    pub fn resolve<E: Entity>(&self) -> Arc<EntityDescriptor> {
        let id = TypeId::of::<E>();
        if let Some(descriptor) = self
            .descriptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
        {
            return descriptor.clone();
        }
        let mut descriptors = self
            .descriptors
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        descriptors
            .entry(id)
            .or_insert_with(|| {
                let descriptor = EntityDescriptor::new::<E>(E::schema());
                log::trace!(
                    "Resolved entity {} on relation {}",
                    descriptor.type_name,
                    descriptor.relation
                );
                Arc::new(descriptor)
            })
            .clone()
    }

    /// Primary key columns of the entity's relation.
    ///
    /// Properties flagged as primary key win without touching the database,
    /// otherwise the connection metadata is asked once per identity and relation.
    pub fn resolve_primary_key(
        &self,
        connection: &mut dyn Connection,
        descriptor: &EntityDescriptor,
    ) -> Result<Arc<[String]>> {
        if !descriptor.explicit_primary_key.is_empty() {
            return Ok(descriptor.explicit_primary_key.clone());
        }
        let key = (
            connection.metadata().identity.clone(),
            descriptor.relation.to_string(),
        );
        let slot = self
            .primary_keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_default()
            .clone();
        let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(primary_key) = slot.as_ref() {
            log::trace!("Primary key of {} from cache", descriptor.relation);
            return Ok(primary_key.clone());
        }
        let columns = connection.primary_keys(descriptor.relation).map_err(|e| {
            Error::sql(
                format!("<primary keys of {}>", descriptor.relation),
                e,
            )
        })?;
        if columns.is_empty() {
            return Err(Error::Schema {
                relation: descriptor.relation.to_string(),
            });
        }
        log::debug!(
            "Primary key of {} is ({})",
            descriptor.relation,
            columns.join(", ")
        );
        let primary_key: Arc<[String]> = columns.into();
        *slot = Some(primary_key.clone());
        Ok(primary_key)
    }

    /// The primary key stored for the pair, if any lookup succeeded.
    pub fn cached_primary_key(&self, identity: &str, relation: &str) -> Option<Arc<[String]>> {
        let slot = self
            .primary_keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(identity.to_string(), relation.to_string()))
            .cloned()?;
        let slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.clone()
    }
}
