pub(crate) mod accessor;
pub(crate) mod filter;
pub(crate) mod path;
pub(crate) mod property;
pub(crate) mod set;
