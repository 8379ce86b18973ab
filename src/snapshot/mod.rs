pub(crate) mod document;
pub(crate) mod index;
pub(crate) mod model;
