//! CLI command implementations.

pub(crate) mod languages;
pub(crate) mod update;

pub(crate) use languages::LanguagesArgs;
pub(crate) use update::UpdateArgs;
