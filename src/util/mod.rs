pub(crate) mod abbrev;
pub(crate) mod escape;
