pub(crate) mod canvas;
pub(crate) mod compositor;
pub(crate) mod frame;
pub(crate) mod layout;
pub(crate) mod state;
pub(crate) mod text;
