use crate::cache::{Cache, SharedCacheKey};
use crate::config::Config;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A named configuration. Switching contexts switches which API we talk to.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Context {
    pub name: ContextName,
    pub config: Config,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ContextName(String);

impl ContextName {
    pub fn current(cache: &Cache) -> Result<ContextName, crate::Error> {
        cache.read(&SharedCacheKey::current_context())
    }
}

impl Context {
    /// The context currently in use, with environment overrides applied to its config.
    pub fn current(cache: &Cache) -> Result<Context, crate::Error> {
        let name = ContextName::current(cache)?;
        let mut context: Context = cache.read(&name)?;

        context.config = context.config.with_env_overrides();

        Ok(context)
    }
}

impl From<String> for ContextName {
    fn from(value: String) -> Self {
        ContextName(value)
    }
}

impl From<&str> for ContextName {
    fn from(value: &str) -> Self {
        ContextName(value.to_string())
    }
}

impl From<ContextName> for String {
    fn from(value: ContextName) -> Self {
        value.0
    }
}

impl Display for ContextName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
