#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::needless_pass_by_value)]

pub mod error;
pub mod hooks;
pub mod html;
pub mod markup;
pub mod module;
pub mod options;
pub mod plugin;
pub mod registry;
pub mod shims;

pub use error::Error;
pub use hooks::{
    BodyRewrite, BuildCommand, HookResult, LoadResult, Plugin, PluginContainer, PluginContext,
    PluginEnforce, PluginError, ResolveIdResult, ResolvedConfig, ServerContext, ServerOptions,
    TransformResult,
};
pub use options::{MatchPattern, MicroAppOptions};
pub use plugin::{CapturedConfig, MicroAppPlugin, PLUGIN_NAME};
pub use registry::{DeferredHook, LifecycleHandles, LifecycleName, Props, SandboxRegistry};
