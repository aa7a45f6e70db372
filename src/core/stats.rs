use super::issue::{IssueReport, IssueStatus, IssueStore};
use super::types::IssueCategory;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: IssueCategory,
    pub count: usize,
}

/// Dashboard counters over the current issue list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueStats {
    pub total: usize,
    pub new: usize,
    pub in_progress: usize,
    pub resolved: usize,
    /// In order of first appearance in the list.
    pub by_category: Vec<CategoryCount>,
    /// Resolved share of all issues, `0.0` when there are none.
    pub resolution_rate: f64,
    /// Most reported category; ties go to the one seen first.
    pub top_category: Option<IssueCategory>,
}

impl IssueStats {
    pub fn from_issues(issues: &[IssueReport]) -> Self {
        let count_status = |status: IssueStatus| issues.iter().filter(|i| i.status == status).count();

        let mut by_category: Vec<CategoryCount> = Vec::new();
        for issue in issues {
            match by_category.iter_mut().find(|c| c.category == issue.category) {
                Some(entry) => entry.count += 1,
                None => by_category.push(CategoryCount { category: issue.category, count: 1 }),
            }
        }

        let top_category = by_category
            .iter()
            .fold(None::<&CategoryCount>, |best, c| match best {
                Some(b) if b.count >= c.count => Some(b),
                _ => Some(c),
            })
            .map(|c| c.category);

        let total = issues.len();
        let resolved = count_status(IssueStatus::Resolved);
        Self {
            total,
            new: count_status(IssueStatus::New),
            in_progress: count_status(IssueStatus::InProgress),
            resolved,
            by_category,
            resolution_rate: if total == 0 { 0.0 } else { resolved as f64 / total as f64 },
            top_category,
        }
    }

    pub async fn collect(store: &dyn IssueStore) -> Self {
        Self::from_issues(&store.list().await)
    }

    pub fn count_for(&self, category: IssueCategory) -> usize {
        self.by_category.iter().find(|c| c.category == category).map_or(0, |c| c.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::issue::{InMemoryIssueStore, sample_issues};

    #[test]
    fn counts_sample_issues() {
        let stats = IssueStats::from_issues(&sample_issues());
        assert_eq!(stats.total, 10);
        assert_eq!((stats.new, stats.in_progress, stats.resolved), (5, 2, 3));
        assert_eq!(stats.new + stats.in_progress + stats.resolved, stats.total);
        assert!((stats.resolution_rate - 0.3).abs() < 1e-9);

        assert_eq!(stats.by_category.len(), 6);
        assert_eq!(stats.by_category[0].category, IssueCategory::RoadMaintenance);
        assert_eq!(stats.count_for(IssueCategory::Sanitation), 2);
        assert_eq!(stats.count_for(IssueCategory::NoiseComplaint), 1);
        assert_eq!(stats.by_category.iter().map(|c| c.count).sum::<usize>(), 10);
    }

    #[test]
    fn tied_top_category_goes_to_first_seen() {
        let stats = IssueStats::from_issues(&sample_issues());
        assert_eq!(stats.top_category, Some(IssueCategory::RoadMaintenance));
    }

    #[test]
    fn empty_list_has_no_top_category() {
        let stats = IssueStats::from_issues(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.resolution_rate, 0.0);
        assert_eq!(stats.top_category, None);
        assert!(stats.by_category.is_empty());
    }

    #[tokio::test]
    async fn collects_from_store_after_updates() {
        let store = InMemoryIssueStore::seeded();
        store.update_status("CIV-001", IssueStatus::Resolved).await.unwrap();
        let extra = IssueReport::submit(
            IssueCategory::Sanitation,
            "Public trash can on Oak Ave is overflowing and has not been collected for days.",
            None,
        )
        .unwrap();
        store.insert(extra).await.unwrap();

        let stats = IssueStats::collect(&store).await;
        assert_eq!(stats.total, 11);
        assert_eq!(stats.resolved, 4);
        assert_eq!(stats.top_category, Some(IssueCategory::Sanitation));
        assert_eq!(stats.by_category[0].category, IssueCategory::Sanitation);
    }
}
