use crate::PointId;

/// Points changed during one poll pass, in first-change order without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    ids: Vec<PointId>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id`; returns false if it was already recorded this pass.
    pub fn mark(&mut self, id: PointId) -> bool {
        if self.ids.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn contains(&self, id: PointId) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> &[PointId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_once_in_order() {
        let mut set = ChangeSet::new();
        assert!(set.mark(PointId(4)));
        assert!(set.mark(PointId(1)));
        assert!(!set.mark(PointId(4)));
        assert_eq!(set.ids(), &[PointId(4), PointId(1)]);
        set.clear();
        assert!(set.is_empty());
    }
}
