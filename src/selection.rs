//! Per-category symbol selections and the flattened symbol list derived from
//! them.
//!
//! A category that has never been answered has no entry. A category answered
//! with "none" has an empty entry. The two are kept apart so the wizard can
//! tell an explicit "nothing happened here" from a step not yet visited.

use std::collections::{BTreeMap, HashSet};

use crate::catalog::AttackMethod;
use crate::error::ValidationError;
use crate::models::{Category, SymbolSelection};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySelections {
    entries: BTreeMap<Category, Vec<SymbolSelection>>,
}

impl CategorySelections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole selection set for `category`.
    ///
    /// Every symbol must belong to `category`; physical symbols must each be a
    /// known attack method. Repeated ids keep their first occurrence.
    pub fn replace(
        &mut self,
        category: Category,
        selections: Vec<SymbolSelection>,
    ) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(selections.len());
        for selection in selections {
            if selection.category != category {
                return Err(ValidationError::CategoryMismatch {
                    id: selection.id,
                    expected: category,
                    actual: selection.category,
                });
            }
            if category == Category::Physical
                && AttackMethod::from_symbol_id(&selection.id).is_none()
            {
                return Err(ValidationError::UnknownAttackMethod(selection.id));
            }
            if seen.insert(selection.id.clone()) {
                kept.push(selection);
            }
        }
        self.entries.insert(category, kept);
        Ok(())
    }

    /// Records an explicit "none" for `category`. Returns true when the
    /// category held no symbols before, which is when the wizard moves on by
    /// itself.
    pub fn confirm_none(&mut self, category: Category) -> bool {
        let previous = self.entries.insert(category, Vec::new());
        previous.map_or(true, |symbols| symbols.is_empty())
    }

    pub fn remove(&mut self, category: Category) {
        self.entries.remove(&category);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_visited(&self, category: Category) -> bool {
        self.entries.contains_key(&category)
    }

    pub fn get(&self, category: Category) -> &[SymbolSelection] {
        self.entries
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Union of all categories in category order, first id wins.
    pub fn flatten(&self) -> Vec<SymbolSelection> {
        let mut seen = HashSet::new();
        self.entries
            .values()
            .flatten()
            .filter(|selection| seen.insert(selection.id.as_str()))
            .cloned()
            .collect()
    }

    pub fn has_physical(&self) -> bool {
        !self.get(Category::Physical).is_empty()
    }

    /// One method per physical symbol.
    pub fn attack_methods(&self) -> Vec<AttackMethod> {
        self.get(Category::Physical)
            .iter()
            .filter_map(|selection| AttackMethod::from_symbol_id(&selection.id))
            .collect()
    }

    pub fn set_attack_methods(&mut self, methods: &[AttackMethod]) {
        let mut selections: Vec<SymbolSelection> = Vec::with_capacity(methods.len());
        for method in methods {
            let selection = method.to_selection();
            if !selections.iter().any(|existing| existing.id == selection.id) {
                selections.push(selection);
            }
        }
        self.entries.insert(Category::Physical, selections);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(id: &str, category: Category) -> SymbolSelection {
        SymbolSelection {
            id: id.to_string(),
            label: id.to_string(),
            category,
        }
    }

    #[test]
    fn flattens_physical_before_verbal() {
        let mut selections = CategorySelections::new();
        selections
            .replace(Category::Verbal, vec![symbol("mock", Category::Verbal)])
            .unwrap();
        selections
            .replace(Category::Physical, vec![symbol("hit", Category::Physical)])
            .unwrap();

        let ids: Vec<String> = selections.flatten().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["hit", "mock"]);
    }

    #[test]
    fn replace_swaps_the_whole_category() {
        let mut selections = CategorySelections::new();
        selections
            .replace(
                Category::Social,
                vec![symbol("exclude", Category::Social), symbol("rumor", Category::Social)],
            )
            .unwrap();
        selections
            .replace(Category::Social, vec![symbol("ignore", Category::Social)])
            .unwrap();
        assert_eq!(selections.get(Category::Social), &[symbol("ignore", Category::Social)]);
    }

    #[test]
    fn rejects_symbols_from_another_category() {
        let mut selections = CategorySelections::new();
        let result = selections.replace(Category::Verbal, vec![symbol("hit", Category::Physical)]);
        assert!(matches!(result, Err(ValidationError::CategoryMismatch { .. })));
        assert!(!selections.is_visited(Category::Verbal));
    }

    #[test]
    fn physical_symbols_must_be_attack_methods() {
        let mut selections = CategorySelections::new();
        let result = selections.replace(Category::Physical, vec![symbol("bite", Category::Physical)]);
        assert_eq!(result, Err(ValidationError::UnknownAttackMethod("bite".to_string())));
    }

    #[test]
    fn none_is_distinct_from_unvisited() {
        let mut selections = CategorySelections::new();
        assert!(!selections.is_visited(Category::Cyber));
        assert!(selections.confirm_none(Category::Cyber));
        assert!(selections.is_visited(Category::Cyber));
        assert!(selections.get(Category::Cyber).is_empty());
    }

    #[test]
    fn none_after_a_selection_does_not_report_fresh() {
        let mut selections = CategorySelections::new();
        selections
            .replace(Category::Cyber, vec![symbol("photo", Category::Cyber)])
            .unwrap();
        assert!(!selections.confirm_none(Category::Cyber));
        assert!(selections.flatten().is_empty());
    }

    #[test]
    fn methods_and_physical_symbols_stay_one_to_one() {
        let mut selections = CategorySelections::new();
        selections.set_attack_methods(&[
            AttackMethod::Frapper,
            AttackMethod::Tirer,
            AttackMethod::Frapper,
        ]);
        assert_eq!(
            selections.attack_methods(),
            vec![AttackMethod::Frapper, AttackMethod::Tirer]
        );
        assert_eq!(selections.get(Category::Physical).len(), 2);
    }
}
