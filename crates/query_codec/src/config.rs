use shared::domain::{Pagination, Scope, SortSpec};
pub use shared::domain::{UNGROUPED_GROUP_ID, UNGROUPED_GROUP_NAME};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UngroupedGroup {
    pub id: String,
    pub name: String,
}

impl Default for UngroupedGroup {
    fn default() -> Self {
        Self {
            id: UNGROUPED_GROUP_ID.into(),
            name: UNGROUPED_GROUP_NAME.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentDefaults {
    pub in_progress: Pagination,
    pub pending: Pagination,
    pub list: Pagination,
}

impl Default for DeploymentDefaults {
    fn default() -> Self {
        Self {
            in_progress: Pagination {
                page: 1,
                per_page: 10,
            },
            pending: Pagination {
                page: 1,
                per_page: 10,
            },
            list: Pagination::default(),
        }
    }
}

/// Defaults the codec compares against when deciding what to omit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecConfig {
    pub page_defaults: Pagination,
    pub sort_default: Option<SortSpec>,
    pub deployments: DeploymentDefaults,
    pub ungrouped: UngroupedGroup,
}

impl CodecConfig {
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.page_defaults.per_page = per_page;
        self.deployments.list.per_page = per_page;
        self
    }

    pub fn with_sort_default(mut self, sort: SortSpec) -> Self {
        self.sort_default = Some(sort);
        self
    }
}

/// Ordered attribute-name sets per scope, used to place bare legacy query keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteringAttributes {
    entries: Vec<(Scope, Vec<String>)>,
}

impl FilteringAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope<I, S>(mut self, scope: Scope, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .push((scope, attributes.into_iter().map(Into::into).collect()));
        self
    }

    /// First scope listing `attribute`.
    pub fn scope_of(&self, attribute: &str) -> Option<Scope> {
        self.entries
            .iter()
            .find(|(_, names)| names.iter().any(|name| name == attribute))
            .map(|(scope, _)| *scope)
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .flat_map(|(_, names)| names.iter().map(String::as_str))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
