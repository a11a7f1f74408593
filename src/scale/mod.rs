pub(crate) mod map_key;
pub(crate) mod range;
