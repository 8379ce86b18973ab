pub(crate) mod visibility;
