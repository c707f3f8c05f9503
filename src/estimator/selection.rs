use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Default and minimum page count
pub const DEFAULT_PAGES: i64 = 1;

/// The five stepper steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    ProjectType,
    Pages,
    Features,
    Timeline,
    Complexity,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectType => "project_type",
            Self::Pages => "pages",
            Self::Features => "features",
            Self::Timeline => "timeline",
            Self::Complexity => "complexity",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User choices across the five steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub project_type_id: Option<i64>,
    pub pages: i64,
    pub feature_ids: BTreeSet<i64>,
    pub timeline_id: Option<i64>,
    pub complexity_id: Option<i64>,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            project_type_id: None,
            pages: DEFAULT_PAGES,
            feature_ids: BTreeSet::new(),
            timeline_id: None,
            complexity_id: None,
        }
    }
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_project_type(&mut self, id: i64) {
        self.project_type_id = Some(id);
    }

    /// Set the page count, clamped to at least one page
    pub fn set_pages(&mut self, pages: i64) {
        self.pages = pages.max(DEFAULT_PAGES);
    }

    pub fn set_timeline(&mut self, id: i64) {
        self.timeline_id = Some(id);
    }

    pub fn set_complexity(&mut self, id: i64) {
        self.complexity_id = Some(id);
    }

    pub fn add_feature(&mut self, id: i64) {
        self.feature_ids.insert(id);
    }

    pub fn remove_feature(&mut self, id: i64) {
        self.feature_ids.remove(&id);
    }

    /// Flip a feature on or off; returns whether it is now selected
    pub fn toggle_feature(&mut self, id: i64) -> bool {
        if self.feature_ids.remove(&id) {
            false
        } else {
            self.feature_ids.insert(id);
            true
        }
    }

    pub fn set_features<I: IntoIterator<Item = i64>>(&mut self, ids: I) {
        self.feature_ids = ids.into_iter().collect();
    }

    /// Required steps that are still unset
    pub fn missing_steps(&self) -> Vec<Step> {
        let mut missing = Vec::new();
        if self.project_type_id.is_none() {
            missing.push(Step::ProjectType);
        }
        if self.timeline_id.is_none() {
            missing.push(Step::Timeline);
        }
        if self.complexity_id.is_none() {
            missing.push(Step::Complexity);
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_steps().is_empty()
    }

    /// Progress counter (0-5): one per slot holding a non-empty, non-default value
    pub fn completed_steps(&self) -> u8 {
        [
            self.project_type_id.is_some(),
            self.pages != DEFAULT_PAGES,
            !self.feature_ids.is_empty(),
            self.timeline_id.is_some(),
            self.complexity_id.is_some(),
        ]
        .iter()
        .filter(|done| **done)
        .count() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_are_clamped() {
        let mut selection = Selection::new();
        selection.set_pages(0);
        assert_eq!(selection.pages, 1);
        selection.set_pages(-3);
        assert_eq!(selection.pages, 1);
        selection.set_pages(12);
        assert_eq!(selection.pages, 12);
    }

    #[test]
    fn test_completed_steps_counts_non_default_slots() {
        let mut selection = Selection::new();
        assert_eq!(selection.completed_steps(), 0);

        selection.set_project_type(1);
        selection.set_timeline(2);
        assert_eq!(selection.completed_steps(), 2);

        selection.set_pages(1);
        assert_eq!(selection.completed_steps(), 2);

        selection.set_pages(5);
        selection.add_feature(9);
        selection.set_complexity(3);
        assert_eq!(selection.completed_steps(), 5);
    }

    #[test]
    fn test_missing_steps() {
        let mut selection = Selection::new();
        selection.set_project_type(1);
        assert_eq!(selection.missing_steps(), vec![Step::Timeline, Step::Complexity]);
        assert!(!selection.is_complete());

        selection.set_timeline(2);
        selection.set_complexity(3);
        assert!(selection.is_complete());
    }

    #[test]
    fn test_toggle_feature() {
        let mut selection = Selection::new();
        assert!(selection.toggle_feature(4));
        assert!(selection.feature_ids.contains(&4));
        assert!(!selection.toggle_feature(4));
        assert!(selection.feature_ids.is_empty());
    }
}
