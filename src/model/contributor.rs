use serde::Serialize;

/// Shortlog aggregation: one author and their commit count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitContributor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub commits: u32,
}
