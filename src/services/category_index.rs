use std::collections::HashMap;

use crate::models::Channel;

/// Two-way mapping between category names and XStream category ids.
///
/// Ids are `"1"`, `"2"`, ... in the order each group is first seen, so the
/// same channel sequence always produces the same ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryIndex {
    names: Vec<String>,
    id_by_name: HashMap<String, String>,
    name_by_id: HashMap<String, String>,
}

impl CategoryIndex {
    pub fn build(channels: &[Channel]) -> Self {
        let mut index = Self::default();

        for channel in channels {
            if index.id_by_name.contains_key(&channel.group) {
                continue;
            }

            let id = (index.names.len() + 1).to_string();
            index.id_by_name.insert(channel.group.clone(), id.clone());
            index.name_by_id.insert(id, channel.group.clone());
            index.names.push(channel.group.clone());
        }

        index
    }

    pub fn id_of(&self, name: &str) -> Option<&str> {
        self.id_by_name.get(name).map(String::as_str)
    }

    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.name_by_id.get(id).map(String::as_str)
    }

    /// `(id, name)` pairs in id order
    pub fn iter(&self) -> impl Iterator<Item = (String, &str)> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| ((i + 1).to_string(), name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn category_id_of(&self) -> &HashMap<String, String> {
        &self.id_by_name
    }

    pub fn id_to_category(&self) -> &HashMap<String, String> {
        &self.name_by_id
    }
}
