//! Execution planner - collects the resources to converge

use crate::resource::{BoxedResource, Resource};

/// An ordered list of resources to converge
#[derive(Debug, Default)]
pub struct ExecutionPlan {
    /// Resources, applied in insertion order
    pub resources: Vec<BoxedResource>,
}

impl ExecutionPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource to the plan
    pub fn add_resource(&mut self, resource: BoxedResource) {
        self.resources.push(resource);
    }

    /// Filter plan to only include resources matching a predicate
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&dyn Resource) -> bool,
    {
        Self {
            resources: self
                .resources
                .into_iter()
                .filter(|r| predicate(r.as_ref()))
                .collect(),
        }
    }

    /// Filter plan to only include resources matching a target pattern
    ///
    /// Target format: "type", "type.name", or a fragment of a resource id
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let (resource_type, name) = parse_target(t);
                self.filter(|r| matches_filter(r, resource_type.as_deref(), name.as_deref()))
            }
        }
    }

    /// Total number of resources in the plan
    pub fn total_resources(&self) -> usize {
        self.resources.len()
    }

    /// Check if plan is empty
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Parse a target string like "type.name" into (type, name)
fn parse_target(target: &str) -> (Option<String>, Option<String>) {
    match target.split_once('.') {
        None => (Some(target.to_string()), None),
        Some((resource_type, name)) if !name.contains('.') => {
            (Some(resource_type.to_string()), Some(name.to_string()))
        }
        Some(_) => (None, Some(target.to_string())),
    }
}

/// Check if a resource matches the filter criteria
///
/// A lone word that is not a resource type is matched against ids instead,
/// so `apply Notepad` works as well as `apply application.Notepad`.
fn matches_filter(
    resource: &dyn Resource,
    resource_type: Option<&str>,
    name: Option<&str>,
) -> bool {
    match (resource_type, name) {
        (Some(rt), None) => {
            resource.resource_type().starts_with(rt) || resource.id().contains(rt)
        }
        (Some(rt), Some(n)) => {
            resource.resource_type().starts_with(rt) && resource.id().contains(n)
        }
        (None, Some(n)) => resource.id().contains(n),
        (None, None) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ApplyContext;
    use crate::diff::DriftReport;
    use crate::types::{ApplyResult, Ensure};
    use anyhow::Result;

    #[derive(Debug)]
    struct Named(&'static str);

    impl Resource for Named {
        fn id(&self) -> String {
            self.0.to_string()
        }

        fn description(&self) -> String {
            format!("Named {}", self.0)
        }

        fn resource_type(&self) -> &'static str {
            "application"
        }

        fn drift(&self) -> Result<DriftReport> {
            Ok(DriftReport::new(Ensure::Present, Ensure::Present))
        }

        fn set(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
            Ok(ApplyResult::NoChange)
        }
    }

    fn plan() -> ExecutionPlan {
        let mut plan = ExecutionPlan::new();
        plan.add_resource(Box::new(Named("Sales/Notepad")));
        plan.add_resource(Box::new(Named("Sales/Calculator")));
        plan.add_resource(Box::new(Named("Finance/Notepad")));
        plan
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(
            parse_target("application"),
            (Some("application".to_string()), None)
        );
        assert_eq!(
            parse_target("application.Notepad"),
            (Some("application".to_string()), Some("Notepad".to_string()))
        );
        assert_eq!(parse_target("a.b.c"), (None, Some("a.b.c".to_string())));
    }

    #[test]
    fn test_filter_by_type_keeps_everything() {
        assert_eq!(plan().filter_by_target(Some("application")).total_resources(), 3);
    }

    #[test]
    fn test_filter_by_type_and_name() {
        let filtered = plan().filter_by_target(Some("application.Notepad"));
        assert_eq!(filtered.total_resources(), 2);
    }

    #[test]
    fn test_filter_by_bare_id_fragment() {
        let filtered = plan().filter_by_target(Some("Finance/"));
        assert_eq!(filtered.total_resources(), 1);
        assert_eq!(filtered.resources[0].id(), "Finance/Notepad");
    }
}
