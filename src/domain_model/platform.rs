use serde::Deserialize;

/// Deployment flavour. Destructive administrative operations only run on `Dev`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Dev,
    #[default]
    Prod,
}
