pub(crate) mod change_set;
pub(crate) mod keyed;
