//! Local tools the demos offer to the model.

mod error;
mod toolbox;
mod traits;
mod weather;

pub use error::{Result, ToolError};
pub use toolbox::ToolBox;
pub use traits::{Tool, ToolSpec, to_tool_definition};
pub use weather::{LOOKUP_WEATHER, LookupWeatherTool};
