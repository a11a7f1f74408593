pub(crate) mod bar;
pub(crate) mod line;
