pub(crate) mod catalog;
pub(crate) mod input;
