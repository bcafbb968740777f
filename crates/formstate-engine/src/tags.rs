//! Array-list item tags
//!
//! Fields whose data type mentions "array" hold reorderable lists. Each
//! object element gets a stable tag (`<field>.<index>` when first seen) kept
//! in a side table next to the value, so the value itself is never touched.
//! Tags follow their element when a list is committed in a new order.

use formstate_core::FieldValue;
use serde_json::Value;

/// Side table of per-slot item tags
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArrayTags {
    tags: Vec<Option<String>>,
}

impl ArrayTags {
    pub fn new() -> Self {
        ArrayTags::default()
    }

    /// Tag the elements of `items`, which replace `previous`.
    ///
    /// An object element equal to a previously tagged one takes over its
    /// tag (same slot first), so a reordered list keeps its identities.
    /// Remaining objects keep the tag of their slot, then get a fresh
    /// `<name>.<index>`. `force` discards every existing tag. Non-object
    /// elements carry no tag and a non-array value empties the table.
    pub fn tag(&mut self, name: &str, previous: &FieldValue, items: &FieldValue, force: bool) {
        let Some(Value::Array(items)) = items else {
            self.tags.clear();
            return;
        };

        let old_tags = if force {
            Vec::new()
        } else {
            std::mem::take(&mut self.tags)
        };
        let old_items: &[Value] = match previous {
            Some(Value::Array(old)) => old.as_slice(),
            _ => &[],
        };

        let mut taken = vec![false; old_tags.len()];
        let mut tags: Vec<Option<String>> = vec![None; items.len()];
        let free = |j: usize, taken: &[bool]| !taken[j] && old_tags[j].is_some();

        // equal element in the same slot
        for (i, item) in items.iter().enumerate() {
            if item.is_object() && i < old_tags.len() && free(i, &taken) && old_items.get(i) == Some(item) {
                tags[i] = old_tags[i].clone();
                taken[i] = true;
            }
        }

        // equal element that moved
        for (i, item) in items.iter().enumerate() {
            if !item.is_object() || tags[i].is_some() {
                continue;
            }
            let found = (0..old_tags.len()).find(|&j| free(j, &taken) && old_items.get(j) == Some(item));
            if let Some(j) = found {
                tags[i] = old_tags[j].clone();
                taken[j] = true;
            }
        }

        // edited in place
        for (i, item) in items.iter().enumerate() {
            if item.is_object() && tags[i].is_none() && i < old_tags.len() && free(i, &taken) {
                tags[i] = old_tags[i].clone();
                taken[i] = true;
            }
        }

        let mut next = items.len();
        for i in 0..items.len() {
            if !items[i].is_object() || tags[i].is_some() {
                continue;
            }
            let mut tag = format!("{}.{}", name, i);
            while tags.iter().flatten().any(|t| *t == tag) {
                tag = format!("{}.{}", name, next);
                next += 1;
            }
            tags[i] = Some(tag);
        }

        self.tags = tags;
    }

    /// Tag of the element at `index`
    pub fn get(&self, index: usize) -> Option<&str> {
        self.tags.get(index).and_then(|t| t.as_deref())
    }

    /// Carry a tag along when a list collaborator moves an element
    pub fn move_item(&mut self, from: usize, to: usize) {
        if from >= self.tags.len() || to >= self.tags.len() {
            return;
        }
        let tag = self.tags.remove(from);
        self.tags.insert(to, tag);
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Check if a data type denotes an array list
pub fn is_array_type(data_type: &str) -> bool {
    data_type.to_ascii_lowercase().contains("array")
}
