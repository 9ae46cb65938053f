pub(crate) mod common;

mod listing;
mod routing;
