//! Name ↔ [`CandidateId`] bijection produced by anonymization.
//!
//! Persisted verbatim as the `.dict` sidecar file (`spec.md` §6) so a
//! human (or a later run re-reading the artifacts) can map the anonymous
//! consensus ranking back to candidate names.

use std::collections::HashMap;

use kemeny_core::CandidateId;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dictionary {
    names: Vec<String>,
    #[cfg_attr(feature = "serde", serde(skip))]
    by_name: HashMap<String, CandidateId>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `name`, returning its existing id if already known or
    /// assigning it the next contiguous id otherwise.
    pub fn intern(&mut self, name: &str) -> CandidateId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = CandidateId::from_index(self.names.len());
        self.names.push(name.to_string());
        self.by_name.insert(name.to_string(), id);
        id
    }

    pub fn id_of(&self, name: &str) -> Option<CandidateId> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, id: CandidateId) -> Option<&str> {
        self.names.get(id.index()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Rebuild the `by_name` lookup after deserializing (`serde(skip)`
    /// leaves it empty).
    #[cfg(feature = "serde")]
    pub fn reindex(&mut self) {
        self.by_name.clear();
        for (i, n) in self.names.iter().enumerate() {
            self.by_name.insert(n.clone(), CandidateId::from_index(i));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable_and_contiguous() {
        let mut d = Dictionary::new();
        let a = d.intern("Alice");
        let b = d.intern("Bob");
        let a_again = d.intern("Alice");
        assert_eq!(a, a_again);
        assert_ne!(a, b);
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn round_trips_name_and_id() {
        let mut d = Dictionary::new();
        let id = d.intern("Carol");
        assert_eq!(d.name_of(id), Some("Carol"));
        assert_eq!(d.id_of("Carol"), Some(id));
    }
}
