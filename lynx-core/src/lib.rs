mod accessor;
mod as_value;
pub mod coercion;
mod config;
mod connection;
mod data_source;
mod descriptor;
mod error;
#[cfg(test)]
mod mock;
mod registry;
mod session;
mod sql_writer;
mod util;
mod value;
mod vendor;

pub use ::anyhow::{self, Context};
pub use accessor::*;
pub use as_value::*;
pub use config::*;
pub use connection::*;
pub use data_source::*;
pub use descriptor::*;
pub use error::*;
pub use registry::*;
pub use session::*;
pub use sql_writer::*;
pub use util::*;
pub use value::*;
pub use vendor::*;
