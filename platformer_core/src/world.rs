use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Unique identifier for an entity in the world.
///
/// Ids are handed out monotonically starting at 1. `EntityId::NONE` (0) never
/// names a live entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// The reserved "no entity" id.
    pub const NONE: EntityId = EntityId(0);

    /// Get the underlying integer ID (useful for debugging or serialization).
    pub fn to_u32(self) -> u32 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Type-erased view of one component table.
///
/// Every table maps `EntityId` to at most one value of its component type.
/// The world keeps tables behind this trait so it can despawn, count and
/// intersect entities without knowing the concrete component types.
pub trait ComponentTable: Any {
    fn contains(&self, entity: EntityId) -> bool;

    /// Drop the entity's value, returning whether one existed.
    fn remove_entity(&mut self, entity: EntityId) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entity_ids(&self) -> Box<dyn Iterator<Item = EntityId> + '_>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct Table<T> {
    values: HashMap<EntityId, T>,
}

impl<T> Table<T> {
    fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }
}

impl<T: 'static> ComponentTable for Table<T> {
    fn contains(&self, entity: EntityId) -> bool {
        self.values.contains_key(&entity)
    }

    fn remove_entity(&mut self, entity: EntityId) -> bool {
        self.values.remove(&entity).is_some()
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn entity_ids(&self) -> Box<dyn Iterator<Item = EntityId> + '_> {
        Box::new(self.values.keys().copied())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A set of component types that can be intersected by [`World::query_into`].
///
/// Implemented for tuples of one to five component types, e.g.
/// `(Position,)` or `(Position, Velocity, Size)`.
pub trait Query {
    fn type_ids() -> Vec<TypeId>;
}

macro_rules! impl_query {
    ($($name:ident),+) => {
        impl<$($name: 'static),+> Query for ($($name,)+) {
            fn type_ids() -> Vec<TypeId> {
                vec![$(TypeId::of::<$name>()),+]
            }
        }
    };
}

impl_query!(A);
impl_query!(A, B);
impl_query!(A, B, C);
impl_query!(A, B, C, D);
impl_query!(A, B, C, D, E);

/// Entity/component store with one type-erased table per component type.
///
/// - Entities are identified by `EntityId`
/// - Components are indexed by their Rust type (`T: 'static`)
/// - Adding a component of a type the entity already has overwrites it
///
/// Missing entities or components are never an error: lookups return `None`,
/// `false` or an empty result.
pub struct World {
    next_id: u32,
    alive: HashSet<EntityId>,
    storages: HashMap<TypeId, Box<dyn ComponentTable>>,
}

impl World {
    /// Create a new, empty world.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            alive: HashSet::new(),
            storages: HashMap::new(),
        }
    }

    /// Allocate a fresh entity id. Ids are not reused until [`World::clear`].
    pub fn create_entity(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.alive.insert(id);
        id
    }

    /// Remove every component of an entity. The id itself is not recycled.
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        let was_alive = self.alive.remove(&entity);
        let mut removed_any = false;
        for storage in self.storages.values_mut() {
            removed_any |= storage.remove_entity(entity);
        }
        was_alive || removed_any
    }

    /// Check if an entity was created and not despawned since the last clear.
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.alive.contains(&entity)
    }

    /// Number of alive entities.
    pub fn len(&self) -> usize {
        self.alive.len()
    }

    /// Returns true if there are no entities in the world.
    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }

    /// Number of components currently attached to `entity`, across all types.
    pub fn component_count(&self, entity: EntityId) -> usize {
        self.storages
            .values()
            .filter(|storage| storage.contains(entity))
            .count()
    }

    /// Attach a component of type `T`, overwriting any existing one.
    pub fn add<T: 'static>(&mut self, entity: EntityId, component: T) {
        if let Some(table) = self
            .storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Table::<T>::new()))
            .as_any_mut()
            .downcast_mut::<Table<T>>()
        {
            table.values.insert(entity, component);
        }
    }

    /// Remove and return a component of type `T` for an entity, if it exists.
    pub fn remove<T: 'static>(&mut self, entity: EntityId) -> Option<T> {
        self.table_mut::<T>()?.values.remove(&entity)
    }

    /// Get an immutable reference to a component of type `T` for an entity.
    pub fn get<T: 'static>(&self, entity: EntityId) -> Option<&T> {
        self.table::<T>()?.values.get(&entity)
    }

    /// Get a mutable reference to a component of type `T` for an entity.
    pub fn get_mut<T: 'static>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.table_mut::<T>()?.values.get_mut(&entity)
    }

    pub fn has<T: 'static>(&self, entity: EntityId) -> bool {
        self.storages
            .get(&TypeId::of::<T>())
            .is_some_and(|storage| storage.contains(entity))
    }

    /// Iterate over all entities that have a component of type `T`.
    ///
    /// Returns a vector of `(EntityId, &T)` pairs in no particular order.
    pub fn query<T: 'static>(&self) -> Vec<(EntityId, &T)> {
        match self.table::<T>() {
            Some(table) => table.values.iter().map(|(&id, value)| (id, value)).collect(),
            None => Vec::new(),
        }
    }

    /// Fill `out` with every entity holding all component types in `Q`.
    ///
    /// `out` is cleared first. The smallest table drives the scan and the
    /// others are probed for membership; if any table is missing or empty the
    /// result is empty without scanning. Order is unspecified.
    pub fn query_into<Q: Query>(&self, out: &mut Vec<EntityId>) {
        out.clear();

        let mut tables: Vec<&dyn ComponentTable> = Vec::new();
        for type_id in Q::type_ids() {
            match self.storages.get(&type_id) {
                Some(storage) if !storage.is_empty() => tables.push(storage.as_ref()),
                _ => return,
            }
        }

        let Some((driver, smallest)) = tables
            .iter()
            .enumerate()
            .min_by_key(|(_, table)| table.len())
        else {
            return;
        };

        out.extend(smallest.entity_ids().filter(|&id| {
            tables
                .iter()
                .enumerate()
                .all(|(index, table)| index == driver || table.contains(id))
        }));
    }

    /// Owned variant of [`World::query_into`].
    pub fn entities_with<Q: Query>(&self) -> Vec<EntityId> {
        let mut out = Vec::new();
        self.query_into::<Q>(&mut out);
        out
    }

    /// Drop every table and restart id allocation at 1.
    pub fn clear(&mut self) {
        if !self.storages.is_empty() || !self.alive.is_empty() {
            log::debug!(
                "clearing world: {} entities, {} component tables",
                self.alive.len(),
                self.storages.len()
            );
        }
        self.storages.clear();
        self.alive.clear();
        self.next_id = 1;
    }

    fn table<T: 'static>(&self) -> Option<&Table<T>> {
        self.storages
            .get(&TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<Table<T>>()
    }

    fn table_mut<T: 'static>(&mut self) -> Option<&mut Table<T>> {
        self.storages
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<Table<T>>()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
