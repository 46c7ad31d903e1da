//! Insertion ordered storage of field descriptors.
//!
//! Descriptors live in an arena and are addressed by [`FieldId`]. An id stays
//! valid until the descriptor it names is removed, regardless of how many
//! descriptors are added afterwards.

use crate::field::FieldDescriptor;
use crate::types::Location;

/// Stable key of a descriptor inside a [`FieldRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId(usize);

/// The two groups of descriptors kept by an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    /// arrays describing the grid itself
    Geometry,
    /// user arrays attached to points or cells
    Data,
}

#[derive(Debug, Default)]
pub struct FieldRegistry {
    slots: Vec<Option<FieldDescriptor>>,
    geometry: Vec<FieldId>,
    data: Vec<FieldId>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a descriptor at the end of `group`.
    ///
    /// If a descriptor with the same name already exists in the group, the
    /// new one is dropped and the id of the existing descriptor is returned.
    pub fn insert(&mut self, group: Group, field: FieldDescriptor) -> FieldId {
        if let Some(existing) = self.find_in(group, field.name()) {
            return existing;
        }

        let id = FieldId(self.slots.len());
        self.slots.push(Some(field));
        self.group_mut(group).push(id);
        id
    }

    /// look up a name in the data group first, then in the geometry group
    pub fn find(&self, name: &str) -> Option<FieldId> {
        self.find_in(Group::Data, name)
            .or_else(|| self.find_in(Group::Geometry, name))
    }

    pub fn find_in(&self, group: Group, name: &str) -> Option<FieldId> {
        self.group(group)
            .iter()
            .copied()
            .find(|id| self.get(*id).map(|field| field.name() == name).unwrap_or(false))
    }

    pub fn get(&self, id: FieldId) -> Option<&FieldDescriptor> {
        self.slots.get(id.0).and_then(|slot| slot.as_ref())
    }

    pub fn get_mut(&mut self, id: FieldId) -> Option<&mut FieldDescriptor> {
        self.slots.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    pub fn by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.find(name).and_then(|id| self.get(id))
    }

    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut FieldDescriptor> {
        let id = self.find(name)?;
        self.get_mut(id)
    }

    /// remove a descriptor of the data group, returning it if it existed
    pub fn remove_data(&mut self, name: &str) -> Option<FieldDescriptor> {
        let id = self.find_in(Group::Data, name)?;
        self.data.retain(|other| *other != id);
        self.slots.get_mut(id.0).and_then(|slot| slot.take())
    }

    /// ids of a group in insertion order
    pub fn group(&self, group: Group) -> &[FieldId] {
        match group {
            Group::Geometry => &self.geometry,
            Group::Data => &self.data,
        }
    }

    fn group_mut(&mut self, group: Group) -> &mut Vec<FieldId> {
        match group {
            Group::Geometry => &mut self.geometry,
            Group::Data => &mut self.data,
        }
    }

    /// data ids attached to `location`, in insertion order
    pub fn data_at(&self, location: Location) -> Vec<FieldId> {
        self.data
            .iter()
            .copied()
            .filter(|id| self.get(*id).map(|f| f.location() == location).unwrap_or(false))
            .collect()
    }

    /// The order in which arrays are laid out in a file: point data, cell
    /// data, then geometry. Inside each group insertion order is kept.
    pub fn file_order(&self) -> Vec<FieldId> {
        let mut order = self.data_at(Location::Point);
        order.extend(self.data_at(Location::Cell));
        order.extend(self.geometry.iter().copied());
        order
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &FieldDescriptor)> + '_ {
        self.geometry
            .iter()
            .chain(self.data.iter())
            .filter_map(move |id| self.get(*id).map(|field| (*id, field)))
    }

    pub fn len(&self) -> usize {
        self.geometry.len() + self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, location: Location) -> FieldDescriptor {
        let mut field = FieldDescriptor::new(name);
        field.set_location(location);
        field
    }

    #[test]
    fn ids_survive_growth_and_removal() {
        let mut registry = FieldRegistry::new();
        let a = registry.insert(Group::Data, field("a", Location::Cell));
        let b = registry.insert(Group::Data, field("b", Location::Point));

        for i in 0..100 {
            registry.insert(Group::Data, field(&format!("f{i}"), Location::Cell));
        }

        assert!(registry.remove_data("a").is_some());
        assert!(registry.get(a).is_none());
        assert_eq!(registry.get(b).unwrap().name(), "b");
        assert!(registry.remove_data("a").is_none());
    }

    #[test]
    fn duplicate_names_return_existing() {
        let mut registry = FieldRegistry::new();
        let first = registry.insert(Group::Data, field("p", Location::Point));
        let second = registry.insert(Group::Data, field("p", Location::Cell));
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);

        // the same name may live in both groups
        let geometry = registry.insert(Group::Geometry, field("p", Location::Point));
        assert_ne!(first, geometry);
        assert_eq!(registry.find("p"), Some(first));
    }

    #[test]
    fn file_order() {
        let mut registry = FieldRegistry::new();
        let g = registry.insert(Group::Geometry, field("Points", Location::Point));
        let c1 = registry.insert(Group::Data, field("c1", Location::Cell));
        let p1 = registry.insert(Group::Data, field("p1", Location::Point));
        let c2 = registry.insert(Group::Data, field("c2", Location::Cell));
        let p2 = registry.insert(Group::Data, field("p2", Location::Point));

        assert_eq!(registry.file_order(), vec![p1, p2, c1, c2, g]);
    }
}
