pub(crate) mod cull;
pub(crate) mod engine;
pub(crate) mod recording;
pub(crate) mod retained;
pub(crate) mod surface;
